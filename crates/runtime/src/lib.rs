//! bpc runtime: session lifecycle, request correlation, and transports
//!
//! This crate provides the machinery between the typed protocol messages of
//! `bpc-protocol` and the application-facing client:
//!
//! - **Transport**: message-framed duplex connections over WebSocket or in memory
//! - **Session**: handshake, ID assignment, reply correlation, keep-alive, teardown
//! - **Registry**: devices known to a session, keyed by server-assigned index
//! - **Channel**: per-device request proxy behind the [`SessionLike`] seam
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   bpc-rs    │  Client facade, device proxies
//! └──────┬──────┘
//!        │ Channel / SessionLike
//! ┌──────▼──────┐
//! │ bpc-runtime │  This crate
//! │  ┌────────┐ │
//! │  │Session │ │  Correlation, dispatch, keep-alive
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Trans  │ │  WebSocket / memory
//! │  └────────┘ │
//! └─────────────┘
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod events;
pub mod session;
pub mod state;
pub mod transport;

pub use channel::{Channel, SessionLike};
pub use config::{DEFAULT_CLIENT_NAME, DEFAULT_STALL_INTERVAL, SessionConfig};
pub use error::{Error, ErrorKind, Result};
pub use events::{EVENT_CHANNEL_CAPACITY, SessionEvent};
pub use session::{DeviceDescriptor, DeviceRegistry, Session};
pub use state::SessionState;
pub use transport::memory::{MemoryConnector, MemoryListener, MemoryPeer, memory};
pub use transport::websocket::WebSocketConnector;
pub use transport::{BoxFuture, Connector, TransportEvent, TransportParts, TransportSender};
