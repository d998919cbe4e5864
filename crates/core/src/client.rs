//! [`Client`] facade over one session at a time.

use std::sync::Arc;

use bpc_protocol::{ClientMessage, ServerInfo};
use bpc_runtime::{
	Connector, EVENT_CHANNEL_CAPACITY, Error, Result, Session, SessionConfig, SessionEvent,
	SessionState, WebSocketConnector,
};
use parking_lot::Mutex;
use tokio::sync::{Mutex as TokioMutex, broadcast};

use crate::Device;

/// Application entry point.
///
/// Each [`connect`](Self::connect) starts a fresh session with its own request
/// IDs and device registry. The event channel belongs to the client and
/// outlives sessions.
pub struct Client {
	config: SessionConfig,
	connector: Arc<dyn Connector>,
	events: broadcast::Sender<SessionEvent>,
	session: Mutex<Option<Arc<Session>>>,
	/// Serializes `connect` calls.
	connecting: TokioMutex<()>,
}

impl Client {
	pub fn new(config: SessionConfig, connector: impl Connector + 'static) -> Self {
		let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
		Self {
			config,
			connector: Arc::new(connector),
			events,
			session: Mutex::new(None),
			connecting: TokioMutex::new(()),
		}
	}

	/// Client for a WebSocket server such as `ws://127.0.0.1:12345`.
	pub fn websocket(url: impl Into<String>, config: SessionConfig) -> Self {
		Self::new(config, WebSocketConnector::new(url))
	}

	/// Connects, handshakes, and loads the device list.
	///
	/// # Errors
	///
	/// Returns [`Error::Connector`] if a session is already active or the
	/// connection or handshake fails. A failed attempt leaves the client
	/// `Faulted`; calling `connect` again retries.
	pub async fn connect(&self) -> Result<()> {
		let _guard = self.connecting.lock().await;

		let session = {
			let mut slot = self.session.lock();
			if let Some(current) = slot.as_ref() {
				let state = current.state();
				if state.is_live() || state == SessionState::Closing {
					return Err(Error::Connector(format!("already connected ({state})")));
				}
			}
			let session = Session::new(self.config.clone(), self.events.clone());
			*slot = Some(Arc::clone(&session));
			session
		};

		tracing::info!(address = %self.connector.address(), "Connecting");
		session.open(self.connector.as_ref()).await
	}

	/// Closes the current session. Does nothing if not connected.
	pub async fn disconnect(&self) {
		let session = self.session.lock().clone();
		if let Some(session) = session {
			session.close().await;
		}
	}

	pub async fn start_scanning(&self) -> Result<()> {
		self.request(ClientMessage::start_scanning()).await
	}

	pub async fn stop_scanning(&self) -> Result<()> {
		self.request(ClientMessage::stop_scanning()).await
	}

	/// Stops every device the server controls.
	pub async fn stop_all_devices(&self) -> Result<()> {
		self.request(ClientMessage::stop_all_devices()).await
	}

	async fn request(&self, message: ClientMessage) -> Result<()> {
		self.current()?.send_request(message).await.map(|_| ())
	}

	fn current(&self) -> Result<Arc<Session>> {
		self.session
			.lock()
			.clone()
			.ok_or_else(|| Error::Connector("not connected".to_string()))
	}

	/// Devices currently connected, ordered by index.
	pub fn devices(&self) -> Vec<Device> {
		let Ok(session) = self.current() else {
			return Vec::new();
		};
		session
			.registry()
			.list()
			.into_iter()
			.map(|descriptor| Device::new(descriptor, session.clone()))
			.collect()
	}

	pub fn device(&self, index: u32) -> Option<Device> {
		let session = self.current().ok()?;
		let descriptor = session.registry().get(index)?;
		Some(Device::new(descriptor, session))
	}

	/// Subscribes to session events.
	pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
		self.events.subscribe()
	}

	pub fn state(&self) -> SessionState {
		self.session
			.lock()
			.as_ref()
			.map_or(SessionState::Disconnected, |s| s.state())
	}

	pub fn is_connected(&self) -> bool {
		self.state() == SessionState::Ready
	}

	/// Server details from the current session's handshake.
	pub fn server_info(&self) -> Option<ServerInfo> {
		self.session.lock().as_ref().and_then(|s| s.server_info())
	}

	/// Requests of the current session still waiting for a reply.
	///
	/// Includes requests whose callers gave up waiting; those leave when the
	/// late reply arrives or the session ends.
	pub fn pending_requests(&self) -> usize {
		self.session
			.lock()
			.as_ref()
			.map_or(0, |s| s.pending_requests())
	}
}

/// Dropping the client aborts its session: outstanding requests and device
/// handles fail with a connector error instead of waiting on a dead link.
impl Drop for Client {
	fn drop(&mut self) {
		if let Some(session) = self.session.get_mut().take() {
			session.abort();
		}
	}
}

impl std::fmt::Debug for Client {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Client")
			.field("address", &self.connector.address())
			.field("state", &self.state())
			.finish_non_exhaustive()
	}
}
