//! Device descriptions and per-feature command entries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Command kind names as they appear in a device's advertised message map.
pub mod kinds {
	pub const VIBRATE_CMD: &str = "VibrateCmd";
	pub const ROTATE_CMD: &str = "RotateCmd";
	pub const LINEAR_CMD: &str = "LinearCmd";
	pub const STOP_DEVICE_CMD: &str = "StopDeviceCmd";
	pub const BATTERY_LEVEL_CMD: &str = "BatteryLevelCmd";
	pub const RSSI_LEVEL_CMD: &str = "RSSILevelCmd";
	pub const RAW_READ_CMD: &str = "RawReadCmd";
	pub const RAW_WRITE_CMD: &str = "RawWriteCmd";
	pub const RAW_SUBSCRIBE_CMD: &str = "RawSubscribeCmd";
	pub const RAW_UNSUBSCRIBE_CMD: &str = "RawUnsubscribeCmd";
}

/// Feature metadata for one command kind supported by a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageAttributes {
	/// Number of independently addressable features (motors, axes, ...).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub feature_count: Option<u32>,
	/// Discrete step count per feature.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub step_count: Option<Vec<u32>>,
	/// Raw endpoints reachable through this command.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub endpoints: Option<Vec<String>>,
	/// Maximum movement duration per feature, in milliseconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_duration: Option<Vec<u32>>,
}

/// A device as announced by `DeviceAdded` or listed in `DeviceList`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceInfo {
	#[serde(default)]
	pub id: u32,
	pub device_index: u32,
	pub device_name: String,
	/// Supported command kinds keyed by name (see [`kinds`]).
	#[serde(default)]
	pub device_messages: HashMap<String, MessageAttributes>,
}

/// Speed for a single vibration feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VibrateSpeed {
	pub index: u32,
	/// 0.0 to 1.0
	pub speed: f64,
}

/// Speed and direction for a single rotation feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RotationSpeed {
	pub index: u32,
	pub speed: f64,
	pub clockwise: bool,
}

/// Target position and travel time for a single linear axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LinearVector {
	pub index: u32,
	/// Travel time in milliseconds.
	pub duration: u32,
	/// 0.0 to 1.0
	pub position: f64,
}
