//! Keep-alive task.
//!
//! With a non-zero `MaxPingTime` the server expects a `Ping` at least that
//! often; the task sends one every half interval. With `MaxPingTime == 0` the
//! server sends no protocol pings, so the task probes the transport every half
//! [`SessionConfig::stall_interval`](crate::SessionConfig::stall_interval) and
//! faults the session once a whole window passes with no inbound activity.

use std::sync::Arc;
use std::time::Duration;

use bpc_protocol::ClientMessage;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::Session;
use crate::error::{Error, Result};

/// Lower bound on the tick period so a tiny interval cannot spin.
const MIN_PERIOD: Duration = Duration::from_millis(10);

impl Session {
	pub(super) async fn run_keepalive(self: Arc<Self>, max_ping_time: u32) {
		if max_ping_time == 0 {
			self.watch_for_stall().await;
		} else {
			self.send_pings(Duration::from_millis(u64::from(max_ping_time))).await;
		}
	}

	async fn send_pings(self: Arc<Self>, max_ping_time: Duration) {
		let period = (max_ping_time / 2).max(MIN_PERIOD);
		let mut ticker = interval_at(Instant::now() + period, period);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
		tracing::debug!(?period, "Keep-alive pings started");

		loop {
			tokio::select! {
				biased;
				_ = self.shutdown.cancelled() => return,
				_ = ticker.tick() => {}
			}

			let sent = tokio::select! {
				biased;
				_ = self.shutdown.cancelled() => return,
				sent = self.transmit(ClientMessage::ping()) => sent,
			};
			// The reply future is dropped; the Ok is consumed by correlation.
			match sent {
				Ok(_) => {}
				// Session is closing or already faulted by the failed send.
				Err(e) if e.is_connector() => return,
				Err(e) => self.report(e),
			}
		}
	}

	async fn watch_for_stall(self: Arc<Self>) {
		let window = self.config.stall_interval;
		let period = (window / 2).max(MIN_PERIOD);
		let mut ticker = interval_at(Instant::now() + period, period);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
		tracing::debug!(?window, "Server disabled pings; watching for stalls");

		loop {
			tokio::select! {
				biased;
				_ = self.shutdown.cancelled() => return,
				_ = ticker.tick() => {}
			}

			let idle = self.last_activity.lock().elapsed();
			if idle >= window {
				self.fault(&format!("no inbound activity for {idle:?}"));
				return;
			}

			let probed = tokio::select! {
				biased;
				_ = self.shutdown.cancelled() => return,
				probed = self.probe() => probed,
			};
			if let Err(e) = probed {
				self.fault(&e.to_string());
				return;
			}
		}
	}

	async fn probe(&self) -> Result<()> {
		match self.sender.lock().await.as_mut() {
			Some(sender) => sender.probe().await,
			None => Err(Error::Connector("transport is closed".to_string())),
		}
	}
}
