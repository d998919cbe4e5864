//! Raw endpoint access.

use std::time::Duration;

use bpc_protocol::{ClientMessage, RawEndpointCmd, RawReadCmd, RawWriteCmd, ServerMessage};
use bpc_runtime::{Error, Result};

use super::Device;
use super::sensors::unexpected_reply;

impl Device {
	/// Reads from an endpoint, giving up after `timeout`.
	///
	/// A timed-out request stays outstanding; a late reply is discarded.
	pub async fn raw_read(
		&self,
		endpoint: &str,
		expected_length: u32,
		timeout: Duration,
	) -> Result<Vec<u8>> {
		let request = ClientMessage::RawReadCmd(RawReadCmd {
			id: 0,
			device_index: self.index(),
			endpoint: endpoint.to_string(),
			expected_length,
			wait_for_data: false,
		});

		match tokio::time::timeout(timeout, self.channel().send(request)).await {
			Ok(reply) => match reply? {
				ServerMessage::RawReading(reading) => Ok(reading.data),
				other => Err(unexpected_reply("RawReading", &other)),
			},
			Err(_) => Err(Error::Device(format!(
				"no reply from endpoint {endpoint} within {timeout:?}"
			))),
		}
	}

	pub async fn raw_write(
		&self,
		endpoint: &str,
		data: &[u8],
		write_with_response: bool,
	) -> Result<()> {
		self.channel()
			.send_no_result(ClientMessage::RawWriteCmd(RawWriteCmd {
				id: 0,
				device_index: self.index(),
				endpoint: endpoint.to_string(),
				data: data.to_vec(),
				write_with_response,
			}))
			.await
	}

	/// Asks the server to forward endpoint notifications as `RawReading` pushes.
	pub async fn raw_subscribe(&self, endpoint: &str) -> Result<()> {
		self.channel()
			.send_no_result(ClientMessage::RawSubscribeCmd(self.endpoint(endpoint)))
			.await
	}

	pub async fn raw_unsubscribe(&self, endpoint: &str) -> Result<()> {
		self.channel()
			.send_no_result(ClientMessage::RawUnsubscribeCmd(self.endpoint(endpoint)))
			.await
	}

	fn endpoint(&self, endpoint: &str) -> RawEndpointCmd {
		RawEndpointCmd {
			id: 0,
			device_index: self.index(),
			endpoint: endpoint.to_string(),
		}
	}
}
