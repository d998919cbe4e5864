//! Subcommand implementations. Each opens one session and closes it on the way out.

use std::time::Duration;

use anyhow::Context;
use bpc::{Client, Device, SessionConfig, SessionEvent};
use tokio::sync::broadcast::error::RecvError;

use crate::cli::{Cli, Commands, DeviceArg, ScanArgs, StopArgs, VibrateArgs};
use crate::error::{CliError, Result};
use crate::output::{self, DeviceSummary, OutputFormat};

pub async fn dispatch(cli: Cli) -> Result<()> {
	let client = Client::websocket(&cli.url, SessionConfig::new(&cli.name));
	client
		.connect()
		.await
		.with_context(|| format!("failed to connect to {}", cli.url))?;

	let result = run(&client, cli.command, cli.format).await;
	client.disconnect().await;
	result
}

async fn run(client: &Client, command: Commands, format: OutputFormat) -> Result<()> {
	match command {
		Commands::Devices => list(client, format),
		Commands::Scan(args) => scan(client, args, format).await,
		Commands::Vibrate(args) => vibrate(client, args, format).await,
		Commands::Stop(args) => stop(client, args, format).await,
		Commands::Battery(args) => battery(client, args, format).await,
	}
}

fn list(client: &Client, format: OutputFormat) -> Result<()> {
	let devices: Vec<DeviceSummary> = client.devices().iter().map(DeviceSummary::from).collect();
	output::print_devices(&devices, format)
}

async fn scan(client: &Client, args: ScanArgs, format: OutputFormat) -> Result<()> {
	let mut events = client.events();
	client.start_scanning().await?;
	tracing::info!(seconds = args.seconds, "Scanning");

	let deadline = tokio::time::sleep(Duration::from_secs(args.seconds));
	tokio::pin!(deadline);
	let mut finished = false;
	while !finished {
		tokio::select! {
			_ = &mut deadline => break,
			event = events.recv() => match event {
				Ok(SessionEvent::DeviceAdded(device)) => {
					tracing::info!(index = device.index, name = %device.name, "Found device");
				}
				Ok(SessionEvent::ScanningFinished) => finished = true,
				Ok(SessionEvent::ServerDisconnected) | Err(RecvError::Closed) => {
					return Err(bpc::Error::Connector("server disconnected during scan".into()).into());
				}
				Ok(_) | Err(RecvError::Lagged(_)) => {}
			},
		}
	}

	if !finished {
		client.stop_scanning().await?;
	}
	list(client, format)
}

async fn vibrate(client: &Client, args: VibrateArgs, format: OutputFormat) -> Result<()> {
	let device = find(client, args.device)?;
	device.vibrate(args.speed).await?;
	tokio::time::sleep(Duration::from_millis(args.duration_ms)).await;
	device.stop().await?;
	output::print_done(
		&format!("vibrated {} at {} for {}ms", device.name(), args.speed, args.duration_ms),
		format,
	)
}

async fn stop(client: &Client, args: StopArgs, format: OutputFormat) -> Result<()> {
	match args.device {
		Some(index) => {
			let device = find(client, index)?;
			device.stop().await?;
			output::print_done(&format!("stopped {}", device.name()), format)
		}
		None => {
			client.stop_all_devices().await?;
			output::print_done("stopped all devices", format)
		}
	}
}

async fn battery(client: &Client, args: DeviceArg, format: OutputFormat) -> Result<()> {
	let device = find(client, args.device)?;
	let level = device.battery_level().await?;
	output::print_battery(device.index(), level, format)
}

fn find(client: &Client, index: u32) -> Result<Device> {
	client.device(index).ok_or(CliError::DeviceNotFound(index))
}
