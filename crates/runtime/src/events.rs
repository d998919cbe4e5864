//! Events pushed to the application.

use crate::error::Error;
use crate::session::DeviceDescriptor;

/// Capacity of the event broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Something the server pushed, or the session detected, outside any request.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
	/// A device was announced after the initial device list.
	DeviceAdded(DeviceDescriptor),
	/// A device went away; carries the descriptor it had.
	DeviceRemoved(DeviceDescriptor),
	/// The server finished a scan.
	ScanningFinished,
	/// Data pushed from a subscribed raw endpoint.
	RawReading {
		device_index: u32,
		endpoint: String,
		data: Vec<u8>,
	},
	/// The server reported a keep-alive violation.
	PingTimeout,
	/// A server error, or a protocol/device problem detected while dispatching.
	ErrorReceived(Error),
	/// A ready session lost its connection.
	ServerDisconnected,
}
