//! Lock-guarded transport, pending table, and error sink.
//!
//! The transport and the pending table are only ever touched together under
//! one lock, so the set of ids the transport considers outstanding and the
//! set of registered waiters cannot disagree.

use std::ops::ControlFlow;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::StatusError;
use crate::pending::{Completion, PendingTable, Waiter};
use crate::sink::ErrorSink;
use crate::status::Status;
use crate::transport::{Drained, Operation, RequestId, Transport};
use crate::{Error, Result};

struct State<T> {
	/// `None` once released.
	transport: Option<T>,
	pending: PendingTable,
	/// `None` once closed.
	sink: Option<ErrorSink>,
}

/// Shared between the client handles and the driver thread.
pub(crate) struct Engine<T> {
	state: Mutex<State<T>>,
}

impl<T: Transport> Engine<T> {
	pub fn new(transport: T, sink: ErrorSink) -> Self {
		Self {
			state: Mutex::new(State {
				transport: Some(transport),
				pending: PendingTable::default(),
				sink: Some(sink),
			}),
		}
	}

	/// Submits `op` and registers a waiter for its completion.
	///
	/// A synchronous rejection is returned directly and leaves no entry behind.
	pub fn submit(&self, op: Operation) -> Result<(RequestId, Waiter)> {
		let mut state = self.state.lock();
		let State { transport, pending, .. } = &mut *state;
		let Some(transport) = transport.as_mut() else {
			return Err(Error::Closed);
		};

		let name = op.name();
		let id = match transport.submit(op) {
			Ok(id) => id,
			Err(status) => {
				let err = transport.last_error(status);
				tracing::debug!(op = name, status = %err.status, message = %err.message, "replicant.submit.rejected");
				return Err(err.into());
			}
		};
		let waiter = pending.register(id)?;
		tracing::trace!(op = name, %id, "replicant.submit");
		Ok((id, waiter))
	}

	/// Drains at most one completion and routes it.
	///
	/// Breaks once the transport has been released.
	pub fn drain_step(&self) -> ControlFlow<()> {
		let mut state = self.state.lock();
		let State { transport, pending, sink } = &mut *state;
		let Some(transport) = transport.as_mut() else {
			return ControlFlow::Break(());
		};

		match transport.drain_one(Duration::ZERO) {
			Drained::Nothing(status) if status.is_idle() => {}
			Drained::Nothing(status) => {
				let err = transport.last_error(status);
				tracing::debug!(status = %err.status, message = %err.message, "replicant.driver.transport_error");
				publish(sink.as_ref(), err);
			}
			Drained::Completed { id, status, output } => {
				let (message, location) = if status.is_success() {
					(String::new(), String::new())
				} else {
					(transport.last_error_message().to_string(), transport.last_error_location().to_string())
				};
				let completion = Completion {
					id,
					status,
					message,
					location,
					output,
				};
				match pending.fulfil(completion) {
					Ok(()) => tracing::trace!(%id, %status, pending = pending.len(), "replicant.driver.delivered"),
					Err(stray) => {
						tracing::warn!(id = %stray.id, status = %stray.status, "replicant.driver.stray_completion");
						publish(
							sink.as_ref(),
							StatusError::new(
								Status::Internal,
								format!("completion for unknown request {} ({})", stray.id, stray.status),
								here!(),
							),
						);
					}
				}
			}
		}
		ControlFlow::Continue(())
	}

	/// Releases the transport, fails every outstanding request with
	/// [`Error::Destroyed`], and closes the error sink.
	///
	/// Returns the number of failed requests, or `None` if already released.
	pub fn release(&self) -> Option<usize> {
		let mut state = self.state.lock();
		let transport = state.transport.take()?;
		drop(transport);
		let failed = state.pending.fail_all();
		state.sink = None;
		Some(failed)
	}

	/// Returns true once [`Self::release`] has run.
	pub fn is_released(&self) -> bool {
		self.state.lock().transport.is_none()
	}

	/// Number of requests awaiting a completion.
	pub fn outstanding(&self) -> usize {
		self.state.lock().pending.len()
	}
}

fn publish(sink: Option<&ErrorSink>, err: StatusError) {
	if let Some(sink) = sink {
		sink.publish(err);
	}
}
