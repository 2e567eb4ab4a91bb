//! Channel for failures that belong to no caller.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::StatusError;

/// Creates a sink buffering up to `capacity` errors.
pub(crate) fn channel(capacity: usize) -> (ErrorSink, UnsolicitedErrors) {
	let (tx, rx) = mpsc::channel(capacity);
	(ErrorSink { tx }, UnsolicitedErrors { rx })
}

/// Writing half, owned by the client's locked state.
#[derive(Debug)]
pub(crate) struct ErrorSink {
	tx: mpsc::Sender<StatusError>,
}

impl ErrorSink {
	/// Publishes without blocking. When the buffer is full the new error is
	/// dropped.
	pub fn publish(&self, err: StatusError) {
		match self.tx.try_send(err) {
			Ok(()) => {}
			Err(TrySendError::Full(err)) => {
				tracing::warn!(status = %err.status, message = %err.message, "replicant.unsolicited.dropped");
			}
			Err(TrySendError::Closed(err)) => {
				tracing::debug!(status = %err.status, "replicant.unsolicited.no_receiver");
			}
		}
	}
}

/// Transport failures not attributable to any outstanding request.
///
/// Returned by [`Client::open`](crate::Client::open). The stream ends once
/// the client has been closed and every buffered error has been received.
/// What to do with these errors (log, alert, abort) is up to the owner.
#[derive(Debug)]
pub struct UnsolicitedErrors {
	rx: mpsc::Receiver<StatusError>,
}

impl UnsolicitedErrors {
	/// Waits for the next error. `None` after the client closed.
	pub async fn recv(&mut self) -> Option<StatusError> {
		self.rx.recv().await
	}

	/// Returns a buffered error without waiting.
	pub fn try_recv(&mut self) -> Option<StatusError> {
		self.rx.try_recv().ok()
	}

	/// Blocking variant of [`Self::recv`] for non-async threads.
	///
	/// # Panics
	///
	/// Panics when called from within an async runtime.
	pub fn blocking_recv(&mut self) -> Option<StatusError> {
		self.rx.blocking_recv()
	}

	/// Returns true once the client closed the sink. Buffered errors may
	/// still be pending.
	pub fn is_closed(&self) -> bool {
		self.rx.is_closed()
	}
}
