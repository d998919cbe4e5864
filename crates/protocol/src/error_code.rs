//! Numeric error codes carried by `Error` messages.

use serde::{Deserialize, Serialize};

/// Error class reported by the server in an `Error` message.
///
/// Encoded on the wire as an integer. Codes this client does not recognize
/// decode as [`ErrorCode::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub enum ErrorCode {
	/// Unclassified failure.
	Unknown,
	/// Handshake or connector failure.
	Init,
	/// Keep-alive violation.
	Ping,
	/// Malformed or unmatched message.
	Message,
	/// Device-specific failure.
	Device,
}

impl From<i64> for ErrorCode {
	fn from(code: i64) -> Self {
		match code {
			1 => ErrorCode::Init,
			2 => ErrorCode::Ping,
			3 => ErrorCode::Message,
			4 => ErrorCode::Device,
			_ => ErrorCode::Unknown,
		}
	}
}

impl From<u8> for ErrorCode {
	fn from(code: u8) -> Self {
		ErrorCode::from(i64::from(code))
	}
}

impl From<ErrorCode> for u8 {
	fn from(code: ErrorCode) -> Self {
		match code {
			ErrorCode::Unknown => 0,
			ErrorCode::Init => 1,
			ErrorCode::Ping => 2,
			ErrorCode::Message => 3,
			ErrorCode::Device => 4,
		}
	}
}
