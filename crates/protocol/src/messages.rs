//! Message vocabulary.
//!
//! [`ClientMessage`] covers everything a client may send and [`ServerMessage`]
//! everything a server may send back. Both are externally tagged, so serde
//! produces the `{"Kind": {...}}` envelope shape directly.

use serde::{Deserialize, Serialize};

use crate::device::{DeviceInfo, LinearVector, RotationSpeed, VibrateSpeed};
use crate::error_code::ErrorCode;

/// Payload for messages that carry nothing but their ID.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bare {
	#[serde(default)]
	pub id: u32,
}

/// Payload for commands addressed to a device with no further arguments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceCommand {
	#[serde(default)]
	pub id: u32,
	pub device_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestServerInfo {
	#[serde(default)]
	pub id: u32,
	pub client_name: String,
	pub message_version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerInfo {
	#[serde(default)]
	pub id: u32,
	#[serde(default)]
	pub server_name: String,
	#[serde(default)]
	pub message_version: u32,
	/// Keep-alive interval in milliseconds; 0 disables protocol pings.
	#[serde(default)]
	pub max_ping_time: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorMessage {
	#[serde(default)]
	pub id: u32,
	pub error_message: String,
	pub error_code: ErrorCode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceList {
	#[serde(default)]
	pub id: u32,
	#[serde(default)]
	pub devices: Vec<DeviceInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceRemoved {
	#[serde(default)]
	pub id: u32,
	pub device_index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VibrateCmd {
	#[serde(default)]
	pub id: u32,
	pub device_index: u32,
	pub speeds: Vec<VibrateSpeed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RotateCmd {
	#[serde(default)]
	pub id: u32,
	pub device_index: u32,
	pub rotations: Vec<RotationSpeed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LinearCmd {
	#[serde(default)]
	pub id: u32,
	pub device_index: u32,
	pub vectors: Vec<LinearVector>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatteryLevelReading {
	#[serde(default)]
	pub id: u32,
	pub device_index: u32,
	/// 0.0 to 1.0
	pub battery_level: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RssiLevelReading {
	#[serde(default)]
	pub id: u32,
	pub device_index: u32,
	#[serde(rename = "RSSILevel")]
	pub rssi_level: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawWriteCmd {
	#[serde(default)]
	pub id: u32,
	pub device_index: u32,
	pub endpoint: String,
	pub data: Vec<u8>,
	pub write_with_response: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawReadCmd {
	#[serde(default)]
	pub id: u32,
	pub device_index: u32,
	pub endpoint: String,
	pub expected_length: u32,
	pub wait_for_data: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawReading {
	#[serde(default)]
	pub id: u32,
	pub device_index: u32,
	pub endpoint: String,
	pub data: Vec<u8>,
}

/// Payload for raw subscribe/unsubscribe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawEndpointCmd {
	#[serde(default)]
	pub id: u32,
	pub device_index: u32,
	pub endpoint: String,
}

/// Message sent from the client to the server.
///
/// The `Id` of every variant is left at 0 by the constructors and assigned by
/// the session when the message is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
	Ping(Bare),
	RequestServerInfo(RequestServerInfo),
	StartScanning(Bare),
	StopScanning(Bare),
	RequestDeviceList(Bare),
	StopDeviceCmd(DeviceCommand),
	StopAllDevices(Bare),
	VibrateCmd(VibrateCmd),
	RotateCmd(RotateCmd),
	LinearCmd(LinearCmd),
	BatteryLevelCmd(DeviceCommand),
	#[serde(rename = "RSSILevelCmd")]
	RssiLevelCmd(DeviceCommand),
	RawWriteCmd(RawWriteCmd),
	RawReadCmd(RawReadCmd),
	RawSubscribeCmd(RawEndpointCmd),
	RawUnsubscribeCmd(RawEndpointCmd),
}

macro_rules! client_payload {
	($msg:expr, $p:ident => $body:expr) => {
		match $msg {
			ClientMessage::Ping($p) => $body,
			ClientMessage::RequestServerInfo($p) => $body,
			ClientMessage::StartScanning($p) => $body,
			ClientMessage::StopScanning($p) => $body,
			ClientMessage::RequestDeviceList($p) => $body,
			ClientMessage::StopDeviceCmd($p) => $body,
			ClientMessage::StopAllDevices($p) => $body,
			ClientMessage::VibrateCmd($p) => $body,
			ClientMessage::RotateCmd($p) => $body,
			ClientMessage::LinearCmd($p) => $body,
			ClientMessage::BatteryLevelCmd($p) => $body,
			ClientMessage::RssiLevelCmd($p) => $body,
			ClientMessage::RawWriteCmd($p) => $body,
			ClientMessage::RawReadCmd($p) => $body,
			ClientMessage::RawSubscribeCmd($p) => $body,
			ClientMessage::RawUnsubscribeCmd($p) => $body,
		}
	};
}

impl ClientMessage {
	pub fn ping() -> Self {
		ClientMessage::Ping(Bare::default())
	}

	pub fn request_server_info(client_name: impl Into<String>, message_version: u32) -> Self {
		ClientMessage::RequestServerInfo(RequestServerInfo {
			id: 0,
			client_name: client_name.into(),
			message_version,
		})
	}

	pub fn start_scanning() -> Self {
		ClientMessage::StartScanning(Bare::default())
	}

	pub fn stop_scanning() -> Self {
		ClientMessage::StopScanning(Bare::default())
	}

	pub fn request_device_list() -> Self {
		ClientMessage::RequestDeviceList(Bare::default())
	}

	pub fn stop_all_devices() -> Self {
		ClientMessage::StopAllDevices(Bare::default())
	}

	/// Returns the message ID (0 until assigned).
	pub fn id(&self) -> u32 {
		client_payload!(self, p => p.id)
	}

	pub fn set_id(&mut self, id: u32) {
		client_payload!(self, p => p.id = id)
	}

	/// Returns the envelope key this message is sent under.
	pub fn kind(&self) -> &'static str {
		match self {
			ClientMessage::Ping(_) => "Ping",
			ClientMessage::RequestServerInfo(_) => "RequestServerInfo",
			ClientMessage::StartScanning(_) => "StartScanning",
			ClientMessage::StopScanning(_) => "StopScanning",
			ClientMessage::RequestDeviceList(_) => "RequestDeviceList",
			ClientMessage::StopDeviceCmd(_) => "StopDeviceCmd",
			ClientMessage::StopAllDevices(_) => "StopAllDevices",
			ClientMessage::VibrateCmd(_) => "VibrateCmd",
			ClientMessage::RotateCmd(_) => "RotateCmd",
			ClientMessage::LinearCmd(_) => "LinearCmd",
			ClientMessage::BatteryLevelCmd(_) => "BatteryLevelCmd",
			ClientMessage::RssiLevelCmd(_) => "RSSILevelCmd",
			ClientMessage::RawWriteCmd(_) => "RawWriteCmd",
			ClientMessage::RawReadCmd(_) => "RawReadCmd",
			ClientMessage::RawSubscribeCmd(_) => "RawSubscribeCmd",
			ClientMessage::RawUnsubscribeCmd(_) => "RawUnsubscribeCmd",
		}
	}
}

/// Message sent from the server to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
	Ok(Bare),
	Error(ErrorMessage),
	ServerInfo(ServerInfo),
	ScanningFinished(Bare),
	DeviceList(DeviceList),
	DeviceAdded(DeviceInfo),
	DeviceRemoved(DeviceRemoved),
	BatteryLevelReading(BatteryLevelReading),
	#[serde(rename = "RSSILevelReading")]
	RssiLevelReading(RssiLevelReading),
	RawReading(RawReading),
}

impl ServerMessage {
	/// Builds an `Ok` reply for the given request ID.
	pub fn ok(id: u32) -> Self {
		ServerMessage::Ok(Bare { id })
	}

	/// Builds an `Error` message.
	pub fn error(id: u32, error_code: ErrorCode, error_message: impl Into<String>) -> Self {
		ServerMessage::Error(ErrorMessage {
			id,
			error_message: error_message.into(),
			error_code,
		})
	}

	/// Returns the message ID; 0 marks a server-initiated push.
	pub fn id(&self) -> u32 {
		match self {
			ServerMessage::Ok(m) => m.id,
			ServerMessage::Error(m) => m.id,
			ServerMessage::ServerInfo(m) => m.id,
			ServerMessage::ScanningFinished(m) => m.id,
			ServerMessage::DeviceList(m) => m.id,
			ServerMessage::DeviceAdded(m) => m.id,
			ServerMessage::DeviceRemoved(m) => m.id,
			ServerMessage::BatteryLevelReading(m) => m.id,
			ServerMessage::RssiLevelReading(m) => m.id,
			ServerMessage::RawReading(m) => m.id,
		}
	}

	pub fn kind(&self) -> &'static str {
		match self {
			ServerMessage::Ok(_) => "Ok",
			ServerMessage::Error(_) => "Error",
			ServerMessage::ServerInfo(_) => "ServerInfo",
			ServerMessage::ScanningFinished(_) => "ScanningFinished",
			ServerMessage::DeviceList(_) => "DeviceList",
			ServerMessage::DeviceAdded(_) => "DeviceAdded",
			ServerMessage::DeviceRemoved(_) => "DeviceRemoved",
			ServerMessage::BatteryLevelReading(_) => "BatteryLevelReading",
			ServerMessage::RssiLevelReading(_) => "RSSILevelReading",
			ServerMessage::RawReading(_) => "RawReading",
		}
	}
}
