//! Session lifecycle state.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a session.
///
/// ```text
/// Disconnected -> Connecting -> Handshaking -> Ready -> Closing -> Disconnected
///                      |             |           |
///                      +-------------+-----------+-> Faulted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionState {
	Disconnected = 0,
	Connecting = 1,
	Handshaking = 2,
	Ready = 3,
	Closing = 4,
	Faulted = 5,
}

impl SessionState {
	/// Returns true while requests may be sent.
	pub fn accepts_requests(self) -> bool {
		matches!(self, SessionState::Handshaking | SessionState::Ready)
	}

	/// Returns true while the transport is (or is being) opened and not yet torn down.
	pub fn is_live(self) -> bool {
		matches!(
			self,
			SessionState::Connecting | SessionState::Handshaking | SessionState::Ready
		)
	}

	fn from_u8(value: u8) -> Self {
		match value {
			0 => SessionState::Disconnected,
			1 => SessionState::Connecting,
			2 => SessionState::Handshaking,
			3 => SessionState::Ready,
			4 => SessionState::Closing,
			_ => SessionState::Faulted,
		}
	}
}

impl fmt::Display for SessionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			SessionState::Disconnected => "disconnected",
			SessionState::Connecting => "connecting",
			SessionState::Handshaking => "handshaking",
			SessionState::Ready => "ready",
			SessionState::Closing => "closing",
			SessionState::Faulted => "faulted",
		};
		f.write_str(name)
	}
}

/// Atomic holder for [`SessionState`] with compare-and-set transitions.
#[derive(Debug)]
pub struct AtomicState(AtomicU8);

impl AtomicState {
	pub fn new(state: SessionState) -> Self {
		Self(AtomicU8::new(state as u8))
	}

	pub fn get(&self) -> SessionState {
		SessionState::from_u8(self.0.load(Ordering::SeqCst))
	}

	/// Moves `from -> to` only if the current state is `from`.
	pub fn transition(&self, from: SessionState, to: SessionState) -> bool {
		let moved = self
			.0
			.compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
			.is_ok();
		if moved {
			tracing::debug!(%from, %to, "Session state changed");
		}
		moved
	}

	/// Moves any live state to `Closing`.
	///
	/// Returns the state that was left, or `None` if the session was already
	/// closing or terminal. Exactly one caller wins per session.
	pub fn begin_teardown(&self) -> Option<SessionState> {
		let mut current = self.get();
		while current.is_live() {
			if self.transition(current, SessionState::Closing) {
				return Some(current);
			}
			current = self.get();
		}
		None
	}

	/// Sets a terminal state after teardown.
	pub fn finish(&self, to: SessionState) {
		self.transition(SessionState::Closing, to);
	}
}
