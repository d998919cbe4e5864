//! Message-framed duplex transports.
//!
//! A [`Connector`] opens a connection and hands back [`TransportParts`]: a
//! [`TransportSender`] for outbound text frames and an unbounded channel of
//! [`TransportEvent`]s fed by a reader owned by the transport. The session
//! never touches sockets directly.
//!
//! Two implementations ship with the crate:
//! - [`websocket::WebSocketConnector`] for a remote server
//! - [`memory::MemoryConnector`] for an in-process server (and tests)

pub mod memory;
pub mod websocket;

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::error::Result;

/// Boxed future returned by transport trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Something read from the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
	/// A complete text frame.
	Text(String),
	/// Transport-level liveness signal (e.g. a WebSocket pong).
	Alive,
	/// The peer closed the connection.
	Closed,
	/// The connection failed; no further events follow.
	Failed(String),
}

/// Outbound half of an open connection.
pub trait TransportSender: Send {
	/// Sends one text frame.
	fn send(&mut self, text: String) -> BoxFuture<'_, Result<()>>;

	/// Sends a transport-level liveness probe; the answer arrives as
	/// [`TransportEvent::Alive`].
	fn probe(&mut self) -> BoxFuture<'_, Result<()>>;

	/// Closes the connection.
	fn close(&mut self) -> BoxFuture<'_, Result<()>>;
}

/// An open connection split into its outbound and inbound halves.
pub struct TransportParts {
	pub sender: Box<dyn TransportSender>,
	pub inbound: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Opens connections to a server.
///
/// A connector may be used for any number of sequential connections; each
/// call to [`connect`](Self::connect) yields an independent connection.
pub trait Connector: Send + Sync {
	fn connect(&self) -> BoxFuture<'_, Result<TransportParts>>;

	/// Human-readable address for logs.
	fn address(&self) -> String;
}
