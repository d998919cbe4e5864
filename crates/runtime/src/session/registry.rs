//! Device registry keyed by device index.
//!
//! Backed by [`DashMap`] so lookups from device proxies never contend with the
//! dispatch task. Only the owning session mutates it.

use std::collections::HashMap;

use bpc_protocol::{DeviceInfo, MessageAttributes};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::{Error, Result};

/// Client-side record of a connected device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
	/// Server-assigned index, stable while the device stays connected.
	pub index: u32,
	pub name: String,
	/// Supported command kinds and their feature metadata.
	pub capabilities: HashMap<String, MessageAttributes>,
}

impl DeviceDescriptor {
	/// Returns the metadata for a command kind, if advertised.
	pub fn attributes(&self, kind: &str) -> Option<&MessageAttributes> {
		self.capabilities.get(kind)
	}

	/// Returns true if the device advertises the command kind.
	pub fn allows(&self, kind: &str) -> bool {
		self.capabilities.contains_key(kind)
	}

	/// Number of features for a command kind.
	///
	/// Unadvertised kinds (or kinds without a count) count as one feature so
	/// the command is still sent and the server gets to reject it.
	pub fn feature_count(&self, kind: &str) -> u32 {
		self.attributes(kind)
			.and_then(|a| a.feature_count)
			.unwrap_or(1)
	}
}

impl From<DeviceInfo> for DeviceDescriptor {
	fn from(info: DeviceInfo) -> Self {
		Self {
			index: info.device_index,
			name: info.device_name,
			capabilities: info.device_messages,
		}
	}
}

/// Devices currently known to a session.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
	devices: DashMap<u32, DeviceDescriptor>,
}

impl DeviceRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a device; an index that is already present is left untouched.
	pub(crate) fn add(&self, device: DeviceDescriptor) -> Result<()> {
		match self.devices.entry(device.index) {
			Entry::Occupied(existing) => Err(Error::Device(format!(
				"duplicate device index {} ({:?} already registered as {:?})",
				device.index,
				device.name,
				existing.get().name
			))),
			Entry::Vacant(slot) => {
				slot.insert(device);
				Ok(())
			}
		}
	}

	/// Removes a device and returns the descriptor it had.
	pub(crate) fn remove(&self, index: u32) -> Result<DeviceDescriptor> {
		self.devices
			.remove(&index)
			.map(|(_, device)| device)
			.ok_or_else(|| {
				Error::Device(format!("cannot remove device index {index}, device not found"))
			})
	}

	pub fn get(&self, index: u32) -> Option<DeviceDescriptor> {
		self.devices.get(&index).map(|d| d.value().clone())
	}

	pub fn contains(&self, index: u32) -> bool {
		self.devices.contains_key(&index)
	}

	/// Snapshot of all devices, ordered by index.
	pub fn list(&self) -> Vec<DeviceDescriptor> {
		let mut devices: Vec<_> = self.devices.iter().map(|d| d.value().clone()).collect();
		devices.sort_by_key(|d| d.index);
		devices
	}

	pub fn len(&self) -> usize {
		self.devices.len()
	}

	pub fn is_empty(&self) -> bool {
		self.devices.is_empty()
	}
}
