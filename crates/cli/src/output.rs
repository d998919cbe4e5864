//! Printing command results as text or JSON.

use bpc::Device;
use clap::ValueEnum;
use serde::Serialize;

use crate::error::Result;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// One line per item
	#[default]
	Text,
	/// A single JSON document on stdout
	Json,
}

/// Printable view of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
	pub index: u32,
	pub name: String,
	/// Supported command kinds, sorted.
	pub commands: Vec<String>,
}

impl From<&Device> for DeviceSummary {
	fn from(device: &Device) -> Self {
		let mut commands: Vec<String> = device.descriptor().capabilities.keys().cloned().collect();
		commands.sort();
		Self {
			index: device.index(),
			name: device.name().to_string(),
			commands,
		}
	}
}

pub fn print_devices(devices: &[DeviceSummary], format: OutputFormat) -> Result<()> {
	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string_pretty(devices)?),
		OutputFormat::Text if devices.is_empty() => println!("no devices"),
		OutputFormat::Text => {
			for device in devices {
				println!("{:>3}  {}  [{}]", device.index, device.name, device.commands.join(", "));
			}
		}
	}
	Ok(())
}

pub fn print_battery(index: u32, level: f64, format: OutputFormat) -> Result<()> {
	#[derive(Serialize)]
	struct Battery {
		index: u32,
		level: f64,
	}

	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string(&Battery { index, level })?),
		OutputFormat::Text => println!("device {index}: {:.0}%", level * 100.0),
	}
	Ok(())
}

/// Confirms a command that produces no data.
pub fn print_done(message: &str, format: OutputFormat) -> Result<()> {
	match format {
		OutputFormat::Json => println!("{}", serde_json::json!({ "ok": true, "message": message })),
		OutputFormat::Text => println!("{message}"),
	}
	Ok(())
}
