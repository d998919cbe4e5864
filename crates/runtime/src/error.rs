//! Error taxonomy for the session runtime.
//!
//! Every failure, whether reported by the server or detected locally, lands in
//! one of five kinds that mirror the protocol's error codes. Errors are
//! `Clone` so they can be delivered through the event channel as well as
//! returned from calls.

use bpc_protocol::{CodecError, ErrorCode, ErrorMessage};
use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure category, 1:1 with [`ErrorCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Handshake, transport, or teardown failure (protocol code `init`).
	Connector,
	/// Keep-alive violation.
	Ping,
	/// Malformed or unmatched message.
	Message,
	/// Device-specific failure.
	Device,
	/// Unclassified.
	Unknown,
}

/// Errors surfaced by sessions and devices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	/// Transport could not be opened, written, or closed, or the session ended
	/// while the request was outstanding.
	#[error("Connector error: {0}")]
	Connector(String),

	/// Server reported a keep-alive violation.
	#[error("Ping error: {0}")]
	Ping(String),

	/// Malformed, unexpected, or unmatched message.
	#[error("Message error: {0}")]
	Message(String),

	/// Device command failed or the device is not known.
	#[error("Device error: {0}")]
	Device(String),

	/// Server reported an unclassified error.
	#[error("Unknown error: {0}")]
	Unknown(String),
}

impl Error {
	/// Builds the error matching a server `Error` message.
	pub fn from_protocol(error: &ErrorMessage) -> Self {
		let message = error.error_message.clone();
		match error.error_code {
			ErrorCode::Init => Error::Connector(message),
			ErrorCode::Ping => Error::Ping(message),
			ErrorCode::Message => Error::Message(message),
			ErrorCode::Device => Error::Device(message),
			ErrorCode::Unknown => Error::Unknown(message),
		}
	}

	/// Returns the failure category.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::Connector(_) => ErrorKind::Connector,
			Error::Ping(_) => ErrorKind::Ping,
			Error::Message(_) => ErrorKind::Message,
			Error::Device(_) => ErrorKind::Device,
			Error::Unknown(_) => ErrorKind::Unknown,
		}
	}

	/// Returns true if this is a keep-alive timeout.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Ping(_))
	}

	/// Returns true if the session is gone and the call cannot succeed on it.
	pub fn is_connector(&self) -> bool {
		matches!(self, Error::Connector(_))
	}
}

impl From<CodecError> for Error {
	fn from(e: CodecError) -> Self {
		Error::Message(e.to_string())
	}
}

impl From<serde_json::Error> for Error {
	fn from(e: serde_json::Error) -> Self {
		Error::Message(e.to_string())
	}
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
	fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
		Error::Connector(e.to_string())
	}
}
