//! Session configuration.

use std::time::Duration;

use bpc_protocol::MESSAGE_VERSION;
use serde::{Deserialize, Serialize};

/// Default name announced to the server during the handshake.
pub const DEFAULT_CLIENT_NAME: &str = "bpc";

/// Stall-detection window used when the server disables protocol pings.
///
/// The keep-alive task probes the transport every half window and faults the
/// session if nothing at all arrived for a whole window.
pub const DEFAULT_STALL_INTERVAL: Duration = Duration::from_secs(20);

/// Per-session settings.
///
/// Deserializable so front ends can load it from a file; absent fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
	/// Name sent in `RequestServerInfo`.
	pub client_name: String,
	/// Protocol version sent in `RequestServerInfo`.
	pub message_version: u32,
	/// Stall-detection window for servers that negotiate `MaxPingTime == 0`.
	#[serde(rename = "stall_interval_ms", with = "duration_ms")]
	pub stall_interval: Duration,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			client_name: DEFAULT_CLIENT_NAME.to_string(),
			message_version: MESSAGE_VERSION,
			stall_interval: DEFAULT_STALL_INTERVAL,
		}
	}
}

impl SessionConfig {
	pub fn new(client_name: impl Into<String>) -> Self {
		Self {
			client_name: client_name.into(),
			..Self::default()
		}
	}

	pub fn with_stall_interval(mut self, interval: Duration) -> Self {
		self.stall_interval = interval;
		self
	}

	pub fn with_message_version(mut self, version: u32) -> Self {
		self.message_version = version;
		self
	}
}

mod duration_ms {
	use std::time::Duration;

	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u64(value.as_millis() as u64)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		Ok(Duration::from_millis(u64::deserialize(deserializer)?))
	}
}
