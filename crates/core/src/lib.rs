//! bpc: async client for device-control servers
//!
//! Connect a [`Client`] to a server, then drive the [`Device`]s it reports.
//!
//! ```ignore
//! let client = Client::websocket("ws://127.0.0.1:12345", SessionConfig::new("my-app"));
//! let mut events = client.events();
//! client.connect().await?;
//! client.start_scanning().await?;
//!
//! while let Ok(event) = events.recv().await {
//!     if let SessionEvent::DeviceAdded(descriptor) = event {
//!         if let Some(device) = client.device(descriptor.index) {
//!             device.vibrate(0.5).await?;
//!         }
//!     }
//! }
//! ```
//!
//! Events are delivered through a broadcast channel owned by the client, so a
//! receiver keeps working across `disconnect`/`connect` cycles.

mod client;
mod device;

pub use bpc_protocol::{MessageAttributes, ServerInfo, kinds};
pub use bpc_runtime::{
	Connector, DEFAULT_CLIENT_NAME, DeviceDescriptor, Error, ErrorKind, MemoryConnector,
	MemoryListener, MemoryPeer, Result, SessionConfig, SessionEvent, SessionState,
	WebSocketConnector, memory,
};
pub use client::Client;
pub use device::Device;

/// Wire-level message types, for callers that build requests by hand.
pub mod protocol {
	pub use bpc_protocol::*;
}
