//! WebSocket transport over `tokio-tungstenite`.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::{BoxFuture, Connector, TransportEvent, TransportParts, TransportSender};
use crate::error::{Error, Result};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to a server at a `ws://` or `wss://` URL.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
	url: String,
}

impl WebSocketConnector {
	pub fn new(url: impl Into<String>) -> Self {
		Self { url: url.into() }
	}
}

impl Connector for WebSocketConnector {
	fn connect(&self) -> BoxFuture<'_, Result<TransportParts>> {
		Box::pin(async move {
			let (socket, _response) = connect_async(self.url.as_str())
				.await
				.map_err(|e| Error::Connector(format!("failed to connect to {}: {e}", self.url)))?;
			tracing::debug!(url = %self.url, "WebSocket connected");

			let (sink, stream) = socket.split();
			let (tx, inbound) = mpsc::unbounded_channel();
			let reader = tokio::spawn(read_loop(stream, tx));

			Ok(TransportParts {
				sender: Box::new(WebSocketSender { sink, reader }),
				inbound,
			})
		})
	}

	fn address(&self) -> String {
		self.url.clone()
	}
}

/// Forwards frames to the session until the socket ends or the session stops listening.
async fn read_loop(mut stream: SplitStream<Socket>, tx: mpsc::UnboundedSender<TransportEvent>) {
	while let Some(frame) = stream.next().await {
		let event = match frame {
			Ok(Message::Text(text)) => TransportEvent::Text(text),
			Ok(Message::Binary(bytes)) => {
				TransportEvent::Text(String::from_utf8_lossy(&bytes).into_owned())
			}
			Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => TransportEvent::Alive,
			Ok(Message::Close(frame)) => {
				tracing::debug!(?frame, "WebSocket closed by server");
				let _ = tx.send(TransportEvent::Closed);
				return;
			}
			Ok(Message::Frame(_)) => continue,
			Err(e) => {
				tracing::error!("WebSocket read error: {}", e);
				let _ = tx.send(TransportEvent::Failed(e.to_string()));
				return;
			}
		};
		if tx.send(event).is_err() {
			return;
		}
	}
	let _ = tx.send(TransportEvent::Closed);
}

struct WebSocketSender {
	sink: SplitSink<Socket, Message>,
	reader: JoinHandle<()>,
}

impl TransportSender for WebSocketSender {
	fn send(&mut self, text: String) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move { Ok(self.sink.send(Message::Text(text)).await?) })
	}

	fn probe(&mut self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move { Ok(self.sink.send(Message::Ping(Vec::new())).await?) })
	}

	fn close(&mut self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			self.sink.send(Message::Close(None)).await?;
			self.sink.close().await?;
			Ok(())
		})
	}
}

impl Drop for WebSocketSender {
	fn drop(&mut self) {
		self.reader.abort();
	}
}
