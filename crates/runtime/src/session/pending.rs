//! Correlation table: pending requests keyed by message ID.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bpc_protocol::ServerMessage;
use dashmap::DashMap;
use tokio::sync::oneshot;

use crate::error::{Error, Result};

type Slot = oneshot::Sender<Result<ServerMessage>>;

/// Outstanding requests awaiting a reply.
///
/// Every entry is fulfilled exactly once: by [`resolve`](Self::resolve) when
/// its reply arrives, or by [`fail_all`](Self::fail_all) at teardown. A
/// caller that stops waiting leaves its entry in place; the eventual reply
/// still resolves it and is discarded.
#[derive(Debug, Default)]
pub(crate) struct PendingTable {
	entries: DashMap<u32, Slot>,
}

impl PendingTable {
	/// Registers an ID and returns the future for its reply.
	pub fn register(&self, id: u32) -> PendingReply {
		let (tx, rx) = oneshot::channel();
		let previous = self.entries.insert(id, tx);
		debug_assert!(previous.is_none(), "request id {id} reused while pending");
		PendingReply { rx }
	}

	/// Fulfils the entry for `id`. Returns false if no such entry exists.
	pub fn resolve(&self, id: u32, result: Result<ServerMessage>) -> bool {
		match self.entries.remove(&id) {
			Some((_, slot)) => {
				if slot.send(result).is_err() {
					tracing::debug!(id, "Reply arrived after caller stopped waiting");
				}
				true
			}
			None => false,
		}
	}

	/// Drops the entry for `id` without fulfilling it.
	pub fn remove(&self, id: u32) {
		self.entries.remove(&id);
	}

	/// Fails every outstanding entry and returns how many there were.
	pub fn fail_all(&self, error: &Error) -> usize {
		let ids: Vec<u32> = self.entries.iter().map(|e| *e.key()).collect();
		ids.into_iter()
			.filter(|id| self.resolve(*id, Err(error.clone())))
			.count()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}
}

/// Future resolving to the reply of one request.
#[derive(Debug)]
pub struct PendingReply {
	rx: oneshot::Receiver<Result<ServerMessage>>,
}

impl Future for PendingReply {
	type Output = Result<ServerMessage>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		Pin::new(&mut self.rx).poll(cx).map(|result| {
			result
				.map_err(|_| Error::Connector("session dropped the request".to_string()))
				.and_then(|r| r)
		})
	}
}
