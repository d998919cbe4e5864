//! Session manager: one connect-to-disconnect lifetime of a server connection.
//!
//! A [`Session`] owns everything scoped to one connection:
//! - the request ID counter (starts at 1, 0 is reserved for pushes)
//! - the correlation table of pending requests
//! - the device registry
//! - the inbound dispatch and keep-alive tasks
//!
//! # Message Flow
//!
//! 1. Caller invokes [`Session::send_request`]
//! 2. Session assigns the next ID and registers a pending entry
//! 3. Request is encoded and written to the transport
//! 4. Dispatch task decodes the reply batch and resolves the entry by ID
//! 5. Caller receives the reply, or the mapped [`Error`]
//!
//! Reconnecting never reuses a session; callers create a new one.

mod dispatch;
mod keepalive;
mod pending;
mod registry;

pub use registry::{DeviceDescriptor, DeviceRegistry};

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};

use bpc_protocol::{ClientMessage, ServerInfo, ServerMessage, encode};
use parking_lot::Mutex;
use tokio::sync::{Mutex as TokioMutex, broadcast};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::channel::SessionLike;
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::events::SessionEvent;
use crate::state::{AtomicState, SessionState};
use crate::transport::{BoxFuture, Connector, TransportSender};
use pending::{PendingReply, PendingTable};

/// One session with a device-control server.
pub struct Session {
	/// Handle to this session for teardown tasks spawned from `&self`.
	me: Weak<Session>,
	config: SessionConfig,
	state: AtomicState,
	/// Last assigned request ID.
	last_id: AtomicU32,
	pending: PendingTable,
	registry: DeviceRegistry,
	/// Outbound half of the transport; `None` before open and after close.
	sender: TokioMutex<Option<Box<dyn TransportSender>>>,
	events: broadcast::Sender<SessionEvent>,
	server_info: Mutex<Option<ServerInfo>>,
	/// Time of the most recent inbound frame or liveness signal.
	last_activity: Mutex<Instant>,
	/// Cancels the background tasks.
	shutdown: CancellationToken,
	/// Cancelled once teardown has finished.
	closed: CancellationToken,
	tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Session {
	/// Creates a session in the `Disconnected` state.
	pub fn new(config: SessionConfig, events: broadcast::Sender<SessionEvent>) -> Arc<Self> {
		Arc::new_cyclic(|me| Self {
			me: me.clone(),
			config,
			state: AtomicState::new(SessionState::Disconnected),
			last_id: AtomicU32::new(0),
			pending: PendingTable::default(),
			registry: DeviceRegistry::new(),
			sender: TokioMutex::new(None),
			events,
			server_info: Mutex::new(None),
			last_activity: Mutex::new(Instant::now()),
			shutdown: CancellationToken::new(),
			closed: CancellationToken::new(),
			tasks: Mutex::new(Vec::new()),
		})
	}

	/// Opens the transport, performs the handshake, and loads the device list.
	///
	/// On success the session is `Ready`. A session can be opened once.
	///
	/// # Errors
	///
	/// Returns [`Error::Connector`] if the transport cannot be opened, the
	/// server rejects the handshake, or the connection drops before it completes.
	pub async fn open(self: &Arc<Self>, connector: &dyn Connector) -> Result<()> {
		if !self
			.state
			.transition(SessionState::Disconnected, SessionState::Connecting)
		{
			return Err(Error::Connector(format!(
				"session cannot be opened while {}",
				self.state()
			)));
		}

		tracing::debug!(address = %connector.address(), "Opening transport");
		let parts = match connector.connect().await {
			Ok(parts) => parts,
			Err(e) => {
				self.state
					.transition(SessionState::Connecting, SessionState::Faulted);
				self.closed.cancel();
				return Err(e);
			}
		};

		*self.sender.lock().await = Some(parts.sender);
		if !self
			.state
			.transition(SessionState::Connecting, SessionState::Handshaking)
		{
			// Closed while the transport was opening.
			if let Some(mut sender) = self.sender.lock().await.take() {
				let _ = sender.close().await;
			}
			return Err(Error::Connector("connection aborted".to_string()));
		}

		self.touch();
		let session = Arc::clone(self);
		self.spawn_task(session.run_dispatch(parts.inbound));

		let info = self.handshake().await?;
		let max_ping_time = info.max_ping_time;
		tracing::info!(
			server = %info.server_name,
			version = info.message_version,
			max_ping_time,
			"Handshake complete"
		);
		*self.server_info.lock() = Some(info);

		if !self
			.state
			.transition(SessionState::Handshaking, SessionState::Ready)
		{
			return Err(Error::Connector(
				"session closed during handshake".to_string(),
			));
		}

		let session = Arc::clone(self);
		self.spawn_task(session.run_keepalive(max_ping_time));

		if let Err(e) = self.load_device_list().await {
			self.teardown(SessionState::Faulted).await;
			return Err(e);
		}
		Ok(())
	}

	async fn handshake(self: &Arc<Self>) -> Result<ServerInfo> {
		let request = ClientMessage::request_server_info(
			self.config.client_name.clone(),
			self.config.message_version,
		);
		let reason = match self.send_request(request).await {
			Ok(ServerMessage::ServerInfo(info)) => return Ok(info),
			Ok(other) => format!("expected ServerInfo, got {}", other.kind()),
			Err(e) => format!("handshake failed: {e}"),
		};

		tracing::error!("{}", reason);
		self.teardown(SessionState::Faulted).await;
		Err(Error::Connector(reason))
	}

	/// Populates the registry from `RequestDeviceList` without raising
	/// device-added events.
	async fn load_device_list(&self) -> Result<()> {
		match self
			.send_request(ClientMessage::request_device_list())
			.await
		{
			Ok(ServerMessage::DeviceList(list)) => {
				for info in list.devices {
					if let Err(e) = self.registry.add(info.into()) {
						self.report(e);
					}
				}
				tracing::debug!(devices = self.registry.len(), "Device list loaded");
				Ok(())
			}
			Ok(other) => {
				self.report(Error::Message(format!(
					"expected DeviceList, got {}",
					other.kind()
				)));
				Ok(())
			}
			Err(e) if e.is_connector() => Err(e),
			Err(e) => {
				self.report(e);
				Ok(())
			}
		}
	}

	/// Sends a request and waits for its reply.
	///
	/// Server `Error` replies come back as the matching [`Error`] kind.
	pub async fn send_request(&self, message: ClientMessage) -> Result<ServerMessage> {
		self.transmit(message).await?.await
	}

	/// Registers and writes a request; the returned future yields its reply.
	async fn transmit(&self, mut message: ClientMessage) -> Result<PendingReply> {
		self.ensure_accepting(message.kind())?;

		let id = self.next_id();
		message.set_id(id);
		let text = encode(&message)?;

		let reply = self.pending.register(id);
		// Teardown flips the state before flushing the table, so an entry
		// registered here is either seen by this check or by the flush.
		if let Err(e) = self.ensure_accepting(message.kind()) {
			self.pending.remove(id);
			return Err(e);
		}

		tracing::debug!(id, kind = message.kind(), "Sending request");
		let sent = match self.sender.lock().await.as_mut() {
			Some(sender) => sender.send(text).await,
			None => Err(Error::Connector("transport is closed".to_string())),
		};
		if let Err(e) = sent {
			self.pending.remove(id);
			tracing::error!(id, "Failed to send request: {}", e);
			// The transport is unusable; nothing else will notice until the reader does.
			self.fault(&e.to_string());
			return Err(e);
		}

		Ok(reply)
	}

	fn ensure_accepting(&self, kind: &str) -> Result<()> {
		let state = self.state();
		if state.accepts_requests() {
			Ok(())
		} else {
			Err(Error::Connector(format!(
				"cannot send {kind}: session is {state}"
			)))
		}
	}

	fn next_id(&self) -> u32 {
		self.last_id.fetch_add(1, Ordering::SeqCst) + 1
	}

	/// Disconnects and waits for teardown to finish. Safe to call repeatedly.
	pub async fn close(&self) {
		self.teardown(SessionState::Disconnected).await;
	}

	/// Tears the session down: stop tasks, fail pending requests, close the
	/// transport, in that order.
	///
	/// Only the first caller performs the work; later callers wait for it.
	async fn teardown(&self, terminal: SessionState) {
		let Some(previous) = self.state.begin_teardown() else {
			if self.state() == SessionState::Closing {
				self.closed.cancelled().await;
			}
			return;
		};
		tracing::debug!(from = %previous, to = %terminal, "Tearing down session");

		self.shutdown.cancel();
		let tasks = std::mem::take(&mut *self.tasks.lock());
		for task in tasks {
			let _ = task.await;
		}

		let flushed = self.pending.fail_all(&Error::Connector(
			"session closed while the request was outstanding".to_string(),
		));
		if flushed > 0 {
			tracing::debug!(flushed, "Failed outstanding requests");
		}

		let sender = self.sender.lock().await.take();
		if let Some(mut sender) = sender {
			if let Err(e) = sender.close().await {
				tracing::debug!("Transport close failed: {}", e);
			}
		}

		self.state.finish(terminal);
		self.closed.cancel();

		if terminal == SessionState::Faulted && previous == SessionState::Ready {
			self.emit(SessionEvent::ServerDisconnected);
		}
	}

	/// Starts teardown to `Faulted` without waiting for it.
	///
	/// Runs on its own task so a background task calling this can exit and be joined.
	fn fault(&self, reason: &str) {
		if !self.state().is_live() {
			return;
		}
		let Some(session) = self.me.upgrade() else {
			return;
		};
		tracing::warn!(reason, "Session faulted");
		tokio::spawn(async move { session.teardown(SessionState::Faulted).await });
	}

	fn spawn_task<F>(&self, task: F)
	where
		F: Future<Output = ()> + Send + 'static,
	{
		self.tasks.lock().push(tokio::spawn(task));
	}

	fn touch(&self) {
		*self.last_activity.lock() = Instant::now();
	}

	fn emit(&self, event: SessionEvent) {
		let _ = self.events.send(event);
	}

	/// Surfaces a failure detected outside any caller's request.
	fn report(&self, error: Error) {
		tracing::warn!(kind = ?error.kind(), "{}", error);
		self.emit(SessionEvent::ErrorReceived(error));
	}

	pub fn state(&self) -> SessionState {
		self.state.get()
	}

	pub fn is_ready(&self) -> bool {
		self.state() == SessionState::Ready
	}

	/// Server details from the handshake.
	pub fn server_info(&self) -> Option<ServerInfo> {
		self.server_info.lock().clone()
	}

	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	/// Devices currently known to the session.
	pub fn registry(&self) -> &DeviceRegistry {
		&self.registry
	}

	/// Number of requests still waiting for a reply.
	pub fn pending_requests(&self) -> usize {
		self.pending.len()
	}

	/// Tears the session down to `Disconnected` without waiting.
	///
	/// For owners going away without an async context; prefer [`close`](Self::close).
	/// Background tasks are cancelled but not joined, and outstanding requests
	/// fail immediately. The transport is dropped unless a send holds it, in
	/// which case it goes with the last reference to the session.
	pub fn abort(&self) {
		let Some(previous) = self.state.begin_teardown() else {
			return;
		};
		tracing::debug!(from = %previous, "Aborting session");

		self.shutdown.cancel();
		self.tasks.lock().clear();

		self.pending.fail_all(&Error::Connector(
			"session aborted while the request was outstanding".to_string(),
		));

		match self.sender.try_lock() {
			Ok(mut sender) => drop(sender.take()),
			Err(_) => tracing::debug!("Transport busy during abort; dropping it later"),
		}

		self.state.finish(SessionState::Disconnected);
		self.closed.cancel();
	}

	/// Waits until teardown has finished.
	pub async fn closed(&self) {
		self.closed.cancelled().await
	}
}

impl SessionLike for Session {
	fn send_request(&self, message: ClientMessage) -> BoxFuture<'_, Result<ServerMessage>> {
		Box::pin(Session::send_request(self, message))
	}

	fn device(&self, index: u32) -> Option<DeviceDescriptor> {
		self.registry.get(index)
	}
}

#[cfg(test)]
mod tests;
