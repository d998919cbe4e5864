//! In-process transport.
//!
//! [`memory()`] returns a connector and a listener. Every `connect` on the
//! connector delivers a fresh [`MemoryPeer`] to the listener; the peer plays
//! the server side of that connection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bpc_protocol::{ClientMessage, ServerMessage, encode_batch};
use tokio::sync::mpsc;

use super::{BoxFuture, Connector, TransportEvent, TransportParts, TransportSender};
use crate::error::{Error, Result};

/// Creates a connected connector/listener pair.
pub fn memory() -> (MemoryConnector, MemoryListener) {
	let (accept_tx, accept_rx) = mpsc::unbounded_channel();
	(
		MemoryConnector { accept_tx },
		MemoryListener { accept_rx },
	)
}

/// Client side: opens in-process connections.
#[derive(Clone)]
pub struct MemoryConnector {
	accept_tx: mpsc::UnboundedSender<MemoryPeer>,
}

impl Connector for MemoryConnector {
	fn connect(&self) -> BoxFuture<'_, Result<TransportParts>> {
		Box::pin(async move {
			let (to_server, from_client) = mpsc::unbounded_channel();
			let (to_client, inbound) = mpsc::unbounded_channel();
			let answer_probes = Arc::new(AtomicBool::new(true));

			let peer = MemoryPeer {
				incoming: from_client,
				outgoing: to_client.clone(),
				answer_probes: Arc::clone(&answer_probes),
				closed: false,
			};
			self.accept_tx
				.send(peer)
				.map_err(|_| Error::Connector("memory listener is gone".to_string()))?;

			Ok(TransportParts {
				sender: Box::new(MemorySender {
					outgoing: Some(to_server),
					loopback: to_client,
					answer_probes,
				}),
				inbound,
			})
		})
	}

	fn address(&self) -> String {
		"memory".to_string()
	}
}

/// Server side: accepts in-process connections.
pub struct MemoryListener {
	accept_rx: mpsc::UnboundedReceiver<MemoryPeer>,
}

impl MemoryListener {
	/// Waits for the next connection. Returns `None` once every connector is dropped.
	pub async fn accept(&mut self) -> Option<MemoryPeer> {
		self.accept_rx.recv().await
	}
}

/// Server end of one in-process connection.
///
/// Dropping the peer closes the connection from the server side.
pub struct MemoryPeer {
	incoming: mpsc::UnboundedReceiver<String>,
	outgoing: mpsc::UnboundedSender<TransportEvent>,
	answer_probes: Arc<AtomicBool>,
	closed: bool,
}

impl MemoryPeer {
	/// Receives the next raw frame; `None` once the client closed.
	pub async fn recv(&mut self) -> Option<String> {
		self.incoming.recv().await
	}

	/// Receives and decodes the next client frame.
	///
	/// # Panics
	///
	/// Panics if the frame is not a single-envelope client batch.
	pub async fn recv_message(&mut self) -> Option<ClientMessage> {
		let text = self.recv().await?;
		let mut batch: Vec<ClientMessage> =
			serde_json::from_str(&text).unwrap_or_else(|e| panic!("bad client frame {text}: {e}"));
		assert_eq!(batch.len(), 1, "client frames carry one message: {text}");
		batch.pop()
	}

	/// Sends a batch of server messages as one frame.
	pub fn send(&self, messages: &[ServerMessage]) -> Result<()> {
		let text = encode_batch(messages)?;
		self.send_raw(text)
	}

	/// Sends an arbitrary text frame.
	pub fn send_raw(&self, text: impl Into<String>) -> Result<()> {
		self.outgoing
			.send(TransportEvent::Text(text.into()))
			.map_err(|_| Error::Connector("memory client is gone".to_string()))
	}

	/// Stops answering liveness probes, simulating a stalled link.
	pub fn stop_answering_probes(&self) {
		self.answer_probes.store(false, Ordering::SeqCst);
	}

	/// Stops accepting client frames while the inbound side stays open,
	/// so the next client write fails.
	pub fn refuse_frames(&mut self) {
		self.incoming.close();
	}

	/// Closes the connection from the server side.
	pub fn close(mut self) {
		self.shutdown(TransportEvent::Closed);
	}

	/// Fails the connection with a read error.
	pub fn fail(mut self, reason: impl Into<String>) {
		self.shutdown(TransportEvent::Failed(reason.into()));
	}

	fn shutdown(&mut self, event: TransportEvent) {
		if !self.closed {
			self.closed = true;
			let _ = self.outgoing.send(event);
		}
	}
}

impl Drop for MemoryPeer {
	fn drop(&mut self) {
		self.shutdown(TransportEvent::Closed);
	}
}

struct MemorySender {
	outgoing: Option<mpsc::UnboundedSender<String>>,
	loopback: mpsc::UnboundedSender<TransportEvent>,
	answer_probes: Arc<AtomicBool>,
}

impl TransportSender for MemorySender {
	fn send(&mut self, text: String) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			let outgoing = self
				.outgoing
				.as_ref()
				.ok_or_else(|| Error::Connector("memory transport is closed".to_string()))?;
			outgoing
				.send(text)
				.map_err(|_| Error::Connector("memory peer is gone".to_string()))
		})
	}

	fn probe(&mut self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			if self.outgoing.is_none() {
				return Err(Error::Connector("memory transport is closed".to_string()));
			}
			if self.answer_probes.load(Ordering::SeqCst) {
				let _ = self.loopback.send(TransportEvent::Alive);
			}
			Ok(())
		})
	}

	fn close(&mut self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			self.outgoing = None;
			Ok(())
		})
	}
}
