//! JSON framing for protocol messages.
//!
//! Outbound frames carry a single envelope wrapped in a one-element array.
//! Inbound frames may batch any number of envelopes. Envelopes that do not
//! match a known [`ServerMessage`] shape are kept as [`Inbound::Unrecognized`]
//! so one bad entry does not discard the rest of the batch.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::messages::{ClientMessage, ServerMessage};

#[derive(Debug, Error)]
pub enum CodecError {
	#[error("invalid JSON frame: {0}")]
	Json(#[from] serde_json::Error),

	#[error("expected a JSON array of messages, got {0}")]
	NotABatch(&'static str),
}

/// One decoded entry of an inbound batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
	Message(ServerMessage),
	/// Envelope that did not decode (unknown kind or bad fields).
	Unrecognized { raw: Value, reason: String },
}

/// Encodes a client message as a one-element batch.
pub fn encode(message: &ClientMessage) -> Result<String, CodecError> {
	encode_batch(std::slice::from_ref(message))
}

/// Encodes any slice of envelopes as a batch frame.
///
/// Used by in-process servers and tests to produce inbound frames.
pub fn encode_batch<T: Serialize>(messages: &[T]) -> Result<String, CodecError> {
	Ok(serde_json::to_string(messages)?)
}

/// Decodes an inbound frame into its envelopes, preserving order.
pub fn decode(text: &str) -> Result<Vec<Inbound>, CodecError> {
	let frame: Value = serde_json::from_str(text)?;
	let entries = match frame {
		Value::Array(entries) => entries,
		other => return Err(CodecError::NotABatch(json_type_name(&other))),
	};

	Ok(entries
		.into_iter()
		.map(|raw| match serde_json::from_value::<ServerMessage>(raw.clone()) {
			Ok(message) => Inbound::Message(message),
			Err(e) => Inbound::Unrecognized {
				raw,
				reason: e.to_string(),
			},
		})
		.collect())
}

fn json_type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error_code::ErrorCode;

	#[test]
	fn encode_wraps_single_envelope_in_array() {
		let mut ping = ClientMessage::ping();
		ping.set_id(9);
		assert_eq!(encode(&ping).unwrap(), r#"[{"Ping":{"Id":9}}]"#);
	}

	#[test]
	fn decode_preserves_batch_order() {
		let frame = r#"[
			{"Ok": {"Id": 3}},
			{"Error": {"Id": 4, "ErrorMessage": "bad", "ErrorCode": 3}},
			{"ScanningFinished": {"Id": 0}}
		]"#;
		let decoded = decode(frame).unwrap();

		assert_eq!(decoded.len(), 3);
		assert_eq!(decoded[0], Inbound::Message(ServerMessage::ok(3)));
		assert_eq!(
			decoded[1],
			Inbound::Message(ServerMessage::error(4, ErrorCode::Message, "bad"))
		);
		match &decoded[2] {
			Inbound::Message(msg) => assert_eq!(msg.kind(), "ScanningFinished"),
			other => panic!("Expected ScanningFinished, got {other:?}"),
		}
	}

	#[test]
	fn unknown_kind_does_not_poison_batch() {
		let frame = r#"[{"FutureThing": {"Id": 0}}, {"Ok": {"Id": 1}}]"#;
		let decoded = decode(frame).unwrap();

		assert!(matches!(decoded[0], Inbound::Unrecognized { .. }));
		assert_eq!(decoded[1], Inbound::Message(ServerMessage::ok(1)));
	}

	#[test]
	fn error_with_wide_code_still_decodes() {
		let frame = r#"[{"Error": {"Id": 6, "ErrorMessage": "odd", "ErrorCode": 999}}]"#;
		let decoded = decode(frame).unwrap();

		assert_eq!(
			decoded[0],
			Inbound::Message(ServerMessage::error(6, ErrorCode::Unknown, "odd"))
		);
	}

	#[test]
	fn non_array_frame_is_rejected() {
		let err = decode(r#"{"Ok": {"Id": 1}}"#).unwrap_err();
		assert!(matches!(err, CodecError::NotABatch("object")));

		let err = decode("not json").unwrap_err();
		assert!(matches!(err, CodecError::Json(_)));
	}
}
