//! Correlation of outstanding request ids to waiting callers.

use std::collections::HashMap;

use tokio::sync::oneshot;

use crate::error::StatusError;
use crate::status::Status;
use crate::transport::{Output, RequestId};
use crate::{Error, Result};

/// Everything the transport reported about one finished request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
	/// The finished request.
	pub id: RequestId,
	/// Outcome.
	pub status: Status,
	/// Failure explanation; empty on success.
	pub message: String,
	/// Failure location; empty on success.
	pub location: String,
	/// Payload, if the operation produces one.
	pub output: Output,
}

impl Completion {
	/// Splits the completion into its payload or its failure.
	///
	/// # Errors
	///
	/// The status, message, and location for any non-success status.
	pub fn into_output(self) -> std::result::Result<Output, StatusError> {
		if self.status.is_success() {
			Ok(self.output)
		} else {
			Err(StatusError::new(self.status, self.message, self.location))
		}
	}
}

/// Receiving half handed to the caller that registered a request.
pub(crate) type Waiter = oneshot::Receiver<Result<Completion>>;

/// Outstanding requests keyed by transport-assigned id.
///
/// Every entry receives exactly one value: either its completion or, at
/// teardown, [`Error::Destroyed`]. Entries are removed as they are fulfilled.
#[derive(Debug, Default)]
pub(crate) struct PendingTable {
	entries: HashMap<RequestId, oneshot::Sender<Result<Completion>>>,
}

impl PendingTable {
	/// Registers a waiter for `id`.
	///
	/// A transport that hands out an id which is still outstanding is broken;
	/// the existing waiter keeps the entry and the new request is refused.
	pub fn register(&mut self, id: RequestId) -> std::result::Result<Waiter, StatusError> {
		if self.entries.contains_key(&id) {
			tracing::warn!(%id, "replicant.pending.duplicate_id");
			return Err(StatusError::new(
				Status::Internal,
				format!("transport reused outstanding request id {id}"),
				here!(),
			));
		}
		let (tx, rx) = oneshot::channel();
		self.entries.insert(id, tx);
		tracing::trace!(%id, pending = self.entries.len(), "replicant.pending.registered");
		Ok(rx)
	}

	/// Delivers `completion` to its waiter and removes the entry.
	///
	/// Returns the completion back when no waiter is registered for its id.
	pub fn fulfil(&mut self, completion: Completion) -> std::result::Result<(), Completion> {
		let Some(tx) = self.entries.remove(&completion.id) else {
			return Err(completion);
		};
		let id = completion.id;
		if tx.send(Ok(completion)).is_err() {
			tracing::trace!(%id, "replicant.pending.waiter_gone");
		}
		Ok(())
	}

	/// Fails every outstanding entry with [`Error::Destroyed`] and empties the
	/// table. Returns how many entries were failed.
	pub fn fail_all(&mut self) -> usize {
		let failed = self.entries.len();
		for (_, tx) in self.entries.drain() {
			let _ = tx.send(Err(Error::Destroyed));
		}
		failed
	}

	/// Number of outstanding entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}
}
