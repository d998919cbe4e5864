//! [`Device`] proxy for one server-side device.

mod actuators;
mod raw;
mod sensors;

use std::sync::Arc;

use bpc_protocol::MessageAttributes;
use bpc_runtime::{Channel, DeviceDescriptor, SessionLike};

/// Handle for sending commands to one device.
///
/// Cheap to clone. Holds a snapshot of the device's descriptor taken when the
/// handle was created; commands go through the session that reported it and
/// fail with a connector error once that session is gone.
#[derive(Debug, Clone)]
pub struct Device {
	descriptor: DeviceDescriptor,
	channel: Channel,
}

impl Device {
	pub fn new(descriptor: DeviceDescriptor, session: Arc<dyn SessionLike>) -> Self {
		let channel = Channel::new(descriptor.index, session);
		Self {
			descriptor,
			channel,
		}
	}

	pub fn index(&self) -> u32 {
		self.descriptor.index
	}

	pub fn name(&self) -> &str {
		&self.descriptor.name
	}

	pub fn descriptor(&self) -> &DeviceDescriptor {
		&self.descriptor
	}

	/// Returns true if the device advertises the command kind (see [`crate::kinds`]).
	pub fn allows(&self, kind: &str) -> bool {
		self.descriptor.allows(kind)
	}

	pub fn attributes(&self, kind: &str) -> Option<&MessageAttributes> {
		self.descriptor.attributes(kind)
	}

	/// Returns false once the session no longer knows this device.
	pub fn is_present(&self) -> bool {
		self.channel.descriptor().is_some()
	}

	fn channel(&self) -> &Channel {
		&self.channel
	}

	/// Builds one entry per feature of `kind`, indexed from 0.
	fn each_feature<T>(&self, kind: &str, entry: impl Fn(u32) -> T) -> Vec<T> {
		(0..self.descriptor.feature_count(kind)).map(entry).collect()
	}
}

impl PartialEq for Device {
	fn eq(&self, other: &Self) -> bool {
		self.index() == other.index()
	}
}
