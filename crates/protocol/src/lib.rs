//! Wire types for the device-control protocol.
//!
//! This crate contains the serde-serializable message vocabulary exchanged
//! with a device-control server, plus the JSON codec that frames it. These
//! types are the "protocol layer": the shapes of data as they appear on the
//! wire, with no session behavior attached.
//!
//! # Wire format
//!
//! Every frame is a JSON array of envelopes. Each envelope is an object with
//! exactly one key naming the message kind:
//!
//! ```text
//! [{"RequestServerInfo": {"Id": 1, "ClientName": "bpc", "MessageVersion": 2}}]
//! [{"ServerInfo": {"Id": 1, "ServerName": "srv", "MessageVersion": 2, "MaxPingTime": 1000}}]
//! ```
//!
//! Messages with `Id == 0` are server-initiated pushes and never correlate
//! to a client request.

pub mod codec;
pub mod device;
pub mod error_code;
pub mod messages;

pub use codec::{CodecError, Inbound, decode, encode, encode_batch};
pub use device::*;
pub use error_code::ErrorCode;
pub use messages::*;

/// Message ID reserved for server-initiated push notifications.
pub const PUSH_ID: u32 = 0;

/// Protocol message version this client speaks.
pub const MESSAGE_VERSION: u32 = 2;
