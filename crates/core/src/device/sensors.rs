//! Read queries: battery and signal strength.

use bpc_protocol::{ClientMessage, DeviceCommand, ServerMessage};
use bpc_runtime::{Error, Result};

use super::Device;

impl Device {
	/// Battery level from 0.0 to 1.0.
	pub async fn battery_level(&self) -> Result<f64> {
		let request = ClientMessage::BatteryLevelCmd(self.command());
		match self.channel().send(request).await? {
			ServerMessage::BatteryLevelReading(reading) => Ok(reading.battery_level),
			other => Err(unexpected_reply("BatteryLevelReading", &other)),
		}
	}

	/// Received signal strength in dBm.
	pub async fn rssi_level(&self) -> Result<i32> {
		let request = ClientMessage::RssiLevelCmd(self.command());
		match self.channel().send(request).await? {
			ServerMessage::RssiLevelReading(reading) => Ok(reading.rssi_level),
			other => Err(unexpected_reply("RSSILevelReading", &other)),
		}
	}

	fn command(&self) -> DeviceCommand {
		DeviceCommand {
			id: 0,
			device_index: self.index(),
		}
	}
}

pub(super) fn unexpected_reply(expected: &str, got: &ServerMessage) -> Error {
	Error::Device(format!("expected {expected}, got {}", got.kind()))
}
