//! Channel: request proxy scoped to one device.
//!
//! Device proxies never hold the session directly. Each proxy builds its
//! messages with its own device index and sends them through a [`Channel`],
//! which forwards them unchanged over the [`SessionLike`] seam so proxies can
//! be tested without a transport.

use std::sync::Arc;

use bpc_protocol::{ClientMessage, ServerMessage};

use crate::error::Result;
use crate::session::DeviceDescriptor;
use crate::transport::BoxFuture;

/// What a device proxy needs from its session.
pub trait SessionLike: Send + Sync {
	/// Sends a request and awaits the correlated reply.
	fn send_request(&self, message: ClientMessage) -> BoxFuture<'_, Result<ServerMessage>>;

	/// Current descriptor for a device index, if the device is still known.
	fn device(&self, index: u32) -> Option<DeviceDescriptor>;
}

/// Sends requests on behalf of one device.
#[derive(Clone)]
pub struct Channel {
	device_index: u32,
	session: Arc<dyn SessionLike>,
}

impl Channel {
	pub fn new(device_index: u32, session: Arc<dyn SessionLike>) -> Self {
		Self {
			device_index,
			session,
		}
	}

	/// Sends a request and returns the reply message.
	pub async fn send(&self, message: ClientMessage) -> Result<ServerMessage> {
		self.session.send_request(message).await
	}

	/// Sends a request whose reply carries nothing but `Ok`.
	pub async fn send_no_result(&self, message: ClientMessage) -> Result<()> {
		self.send(message).await.map(|_| ())
	}

	pub fn device_index(&self) -> u32 {
		self.device_index
	}

	/// Descriptor of the device as the session currently knows it.
	pub fn descriptor(&self) -> Option<DeviceDescriptor> {
		self.session.device(self.device_index)
	}
}

impl std::fmt::Debug for Channel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Channel")
			.field("device_index", &self.device_index)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use bpc_protocol::DeviceCommand;
	use parking_lot::Mutex;

	use super::*;

	#[derive(Default)]
	struct Recorder {
		sent: Mutex<Vec<ClientMessage>>,
	}

	impl SessionLike for Recorder {
		fn send_request(&self, message: ClientMessage) -> BoxFuture<'_, Result<ServerMessage>> {
			self.sent.lock().push(message);
			Box::pin(async { Ok(ServerMessage::ok(1)) })
		}

		fn device(&self, _index: u32) -> Option<DeviceDescriptor> {
			None
		}
	}

	#[tokio::test]
	async fn send_forwards_message_unchanged() {
		let recorder = Arc::new(Recorder::default());
		let channel = Channel::new(3, recorder.clone());
		let message = ClientMessage::StopDeviceCmd(DeviceCommand {
			id: 0,
			device_index: 8,
		});

		channel.send_no_result(message.clone()).await.unwrap();

		assert_eq!(*recorder.sent.lock(), vec![message]);
		assert_eq!(channel.device_index(), 3);
		assert!(channel.descriptor().is_none());
	}
}
