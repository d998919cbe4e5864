//! Inbound dispatch: frames from the transport to pending requests, the
//! device registry, and application events.

use std::sync::Arc;

use bpc_protocol::{Inbound, PUSH_ID, ServerMessage, decode};
use tokio::sync::mpsc;

use super::{DeviceDescriptor, Session};
use crate::error::Error;
use crate::events::SessionEvent;
use crate::transport::TransportEvent;

impl Session {
	/// Reads transport events until the session shuts down or the connection ends.
	pub(super) async fn run_dispatch(
		self: Arc<Self>,
		mut inbound: mpsc::UnboundedReceiver<TransportEvent>,
	) {
		loop {
			let event = tokio::select! {
				biased;
				_ = self.shutdown.cancelled() => return,
				event = inbound.recv() => event,
			};

			match event {
				Some(TransportEvent::Text(text)) => {
					self.touch();
					self.dispatch_frame(&text);
				}
				Some(TransportEvent::Alive) => self.touch(),
				Some(TransportEvent::Closed) | None => {
					self.fault("server closed the connection");
					return;
				}
				Some(TransportEvent::Failed(reason)) => {
					tracing::error!("Transport read error: {}", reason);
					self.fault(&reason);
					return;
				}
			}
		}
	}

	/// Handles one inbound frame. Never fails; problems become error events.
	pub(super) fn dispatch_frame(&self, text: &str) {
		let batch = match decode(text) {
			Ok(batch) => batch,
			Err(e) => {
				self.report(Error::Message(format!("undecodable frame: {e}")));
				return;
			}
		};

		for entry in batch {
			match entry {
				Inbound::Message(message) => self.dispatch_message(message),
				Inbound::Unrecognized { raw, reason } => {
					self.report(Error::Message(format!(
						"unrecognized message {raw}: {reason}"
					)));
				}
			}
		}
	}

	fn dispatch_message(&self, message: ServerMessage) {
		tracing::debug!(id = message.id(), kind = message.kind(), "Dispatching message");

		if let ServerMessage::Error(error) = &message {
			let error = Error::from_protocol(error);
			if error.is_timeout() {
				self.emit(SessionEvent::PingTimeout);
			}
			self.report(error);
		}

		let id = message.id();
		if id == PUSH_ID {
			self.dispatch_push(message);
			return;
		}

		let result = match message {
			ServerMessage::Error(error) => Err(Error::from_protocol(&error)),
			reply => Ok(reply),
		};
		if !self.pending.resolve(id, result) {
			self.report(Error::Message(format!(
				"received reply with non-matching id {id}"
			)));
		}
	}

	fn dispatch_push(&self, message: ServerMessage) {
		match message {
			ServerMessage::DeviceAdded(info) => {
				let device = DeviceDescriptor::from(info);
				match self.registry.add(device.clone()) {
					Ok(()) => {
						tracing::info!(device_index = device.index, name = %device.name, "Device added");
						self.emit(SessionEvent::DeviceAdded(device));
					}
					Err(e) => self.report(e),
				}
			}
			ServerMessage::DeviceRemoved(removed) => {
				match self.registry.remove(removed.device_index) {
					Ok(device) => {
						tracing::info!(device_index = device.index, name = %device.name, "Device removed");
						self.emit(SessionEvent::DeviceRemoved(device));
					}
					Err(e) => self.report(e),
				}
			}
			ServerMessage::ScanningFinished(_) => self.emit(SessionEvent::ScanningFinished),
			ServerMessage::RawReading(reading) => self.emit(SessionEvent::RawReading {
				device_index: reading.device_index,
				endpoint: reading.endpoint,
				data: reading.data,
			}),
			// Already surfaced by the caller.
			ServerMessage::Error(_) => {}
			other => self.report(Error::Message(format!(
				"unexpected {} with id 0",
				other.kind()
			))),
		}
	}
}
