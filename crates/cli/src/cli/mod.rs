
use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:12345";

/// Control devices through a device-control server.
#[derive(Parser, Debug)]
#[command(name = "bpc")]
#[command(about = "Device-control client - scan, list, and drive devices")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Server WebSocket URL
	#[arg(long, global = true, env = "BPC_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
	pub url: String,

	/// Client name announced during the handshake
	#[arg(long, global = true, default_value = bpc::DEFAULT_CLIENT_NAME)]
	pub name: String,

	/// Output format
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// List devices the server already knows about.
	Devices,
	/// Scan for new devices.
	Scan(ScanArgs),
	/// Vibrate a device for a while, then stop it.
	Vibrate(VibrateArgs),
	/// Stop one device, or every device.
	Stop(StopArgs),
	/// Read a device's battery level.
	Battery(DeviceArg),
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
	/// How long to scan before stopping.
	#[arg(long, default_value_t = 10)]
	pub seconds: u64,
}

#[derive(Args, Debug, Clone)]
pub struct VibrateArgs {
	/// Device index.
	#[arg(short, long)]
	pub device: u32,

	/// Speed from 0.0 to 1.0, applied to every motor.
	#[arg(short, long, value_parser = parse_unit)]
	pub speed: f64,

	/// How long to vibrate before stopping.
	#[arg(long, default_value_t = 1000)]
	pub duration_ms: u64,
}

#[derive(Args, Debug, Clone)]
pub struct StopArgs {
	/// Device index; omit to stop all devices.
	#[arg(short, long)]
	pub device: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct DeviceArg {
	/// Device index.
	#[arg(short, long)]
	pub device: u32,
}

/// Parses a value in `0.0..=1.0`.
fn parse_unit(s: &str) -> Result<f64, String> {
	let value: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
	if (0.0..=1.0).contains(&value) {
		Ok(value)
	} else {
		Err(format!("{value} is outside 0.0..=1.0"))
	}
}
