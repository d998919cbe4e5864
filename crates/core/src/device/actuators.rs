//! Output commands: vibrate, rotate, linear, stop.
//!
//! Each command has three forms: a scalar applied to every feature the device
//! advertises for that command, a slice addressed by position, and explicit
//! `(feature index, value)` pairs.

use bpc_protocol::{
	ClientMessage, DeviceCommand, LinearCmd, LinearVector, RotateCmd, RotationSpeed, VibrateCmd,
	VibrateSpeed, kinds,
};
use bpc_runtime::Result;

use super::Device;

fn by_position<T: Copy>(values: &[T]) -> impl Iterator<Item = (u32, T)> + '_ {
	(0u32..).zip(values.iter().copied())
}

impl Device {
	/// Vibrates every motor at `speed` (0.0 to 1.0).
	pub async fn vibrate(&self, speed: f64) -> Result<()> {
		let speeds = self.each_feature(kinds::VIBRATE_CMD, |index| VibrateSpeed { index, speed });
		self.send_vibrate(speeds).await
	}

	/// Vibrates motor `i` at `speeds[i]`.
	pub async fn vibrate_each(&self, speeds: &[f64]) -> Result<()> {
		self.vibrate_features(by_position(speeds)).await
	}

	/// Vibrates the given motors only.
	pub async fn vibrate_features(
		&self,
		speeds: impl IntoIterator<Item = (u32, f64)>,
	) -> Result<()> {
		let speeds = speeds
			.into_iter()
			.map(|(index, speed)| VibrateSpeed { index, speed })
			.collect();
		self.send_vibrate(speeds).await
	}

	async fn send_vibrate(&self, speeds: Vec<VibrateSpeed>) -> Result<()> {
		tracing::debug!(device_index = self.index(), features = speeds.len(), "Vibrate");
		self.channel()
			.send_no_result(ClientMessage::VibrateCmd(VibrateCmd {
				id: 0,
				device_index: self.index(),
				speeds,
			}))
			.await
	}

	/// Rotates every rotator at `speed` in one direction.
	pub async fn rotate(&self, speed: f64, clockwise: bool) -> Result<()> {
		let rotations = self.each_feature(kinds::ROTATE_CMD, |index| RotationSpeed {
			index,
			speed,
			clockwise,
		});
		self.send_rotate(rotations).await
	}

	/// Rotates rotator `i` with `rotations[i]` as `(speed, clockwise)`.
	pub async fn rotate_each(&self, rotations: &[(f64, bool)]) -> Result<()> {
		self.rotate_features(by_position(rotations)).await
	}

	pub async fn rotate_features(
		&self,
		rotations: impl IntoIterator<Item = (u32, (f64, bool))>,
	) -> Result<()> {
		let rotations = rotations
			.into_iter()
			.map(|(index, (speed, clockwise))| RotationSpeed {
				index,
				speed,
				clockwise,
			})
			.collect();
		self.send_rotate(rotations).await
	}

	async fn send_rotate(&self, rotations: Vec<RotationSpeed>) -> Result<()> {
		self.channel()
			.send_no_result(ClientMessage::RotateCmd(RotateCmd {
				id: 0,
				device_index: self.index(),
				rotations,
			}))
			.await
	}

	/// Moves every linear actuator to `position` (0.0 to 1.0) over `duration_ms`.
	pub async fn linear(&self, duration_ms: u32, position: f64) -> Result<()> {
		let vectors = self.each_feature(kinds::LINEAR_CMD, |index| LinearVector {
			index,
			duration: duration_ms,
			position,
		});
		self.send_linear(vectors).await
	}

	/// Moves actuator `i` with `vectors[i]` as `(duration_ms, position)`.
	pub async fn linear_each(&self, vectors: &[(u32, f64)]) -> Result<()> {
		self.linear_features(by_position(vectors)).await
	}

	pub async fn linear_features(
		&self,
		vectors: impl IntoIterator<Item = (u32, (u32, f64))>,
	) -> Result<()> {
		let vectors = vectors
			.into_iter()
			.map(|(index, (duration, position))| LinearVector {
				index,
				duration,
				position,
			})
			.collect();
		self.send_linear(vectors).await
	}

	async fn send_linear(&self, vectors: Vec<LinearVector>) -> Result<()> {
		self.channel()
			.send_no_result(ClientMessage::LinearCmd(LinearCmd {
				id: 0,
				device_index: self.index(),
				vectors,
			}))
			.await
	}

	/// Stops all output on this device.
	pub async fn stop(&self) -> Result<()> {
		self.channel()
			.send_no_result(ClientMessage::StopDeviceCmd(DeviceCommand {
				id: 0,
				device_index: self.index(),
			}))
			.await
	}
}
