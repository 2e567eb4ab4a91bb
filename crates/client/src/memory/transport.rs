use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use super::cluster::{CompletionOrder, MemoryCluster};
use crate::status::Status;
use crate::transport::{Activity, Drained, Operation, Output, RequestId, Transport};

/// Result of a request, waiting to be drained.
#[derive(Debug)]
pub(super) struct Finished {
	pub id: RequestId,
	pub status: Status,
	pub message: String,
	pub location: String,
	pub output: Output,
}

/// Transport-level failure not tied to any request.
#[derive(Debug)]
pub(super) struct Failure {
	pub status: Status,
	pub message: String,
	pub location: String,
}

#[derive(Default)]
struct Queue {
	ready: VecDeque<Finished>,
	/// Held back while the cluster is paused.
	parked: Vec<Finished>,
	failures: VecDeque<Failure>,
}

impl Queue {
	fn has_work(&self) -> bool {
		!self.ready.is_empty() || !self.failures.is_empty()
	}
}

/// Per-transport delivery queue shared between the cluster and the
/// transport's two halves. Lock order is cluster state, then link.
pub(super) struct Link {
	queue: Mutex<Queue>,
	wake: Condvar,
	order: CompletionOrder,
}

impl Link {
	pub(super) fn new(order: CompletionOrder) -> Self {
		Self {
			queue: Mutex::new(Queue::default()),
			wake: Condvar::new(),
			order,
		}
	}

	pub(super) fn deliver(&self, finished: Finished, paused: bool) {
		let mut queue = self.queue.lock();
		if paused {
			queue.parked.push(finished);
		} else {
			queue.ready.push_back(finished);
			self.wake.notify_all();
		}
	}

	pub(super) fn release_parked(&self) {
		let mut queue = self.queue.lock();
		if queue.parked.is_empty() {
			return;
		}
		let parked = std::mem::take(&mut queue.parked);
		queue.ready.extend(parked);
		self.wake.notify_all();
	}

	pub(super) fn fail(&self, failure: Failure) {
		self.queue.lock().failures.push_back(failure);
		self.wake.notify_all();
	}
}

/// Transport connected to a [`MemoryCluster`].
pub struct MemoryTransport {
	cluster: MemoryCluster,
	link: Arc<Link>,
	next_id: u64,
	last_message: String,
	last_location: String,
}

impl std::fmt::Debug for MemoryTransport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MemoryTransport")
			.field("next_id", &self.next_id)
			.field("last_message", &self.last_message)
			.finish_non_exhaustive()
	}
}

impl MemoryTransport {
	pub(super) fn new(cluster: MemoryCluster, link: Arc<Link>) -> Self {
		Self {
			cluster,
			link,
			next_id: 1,
			last_message: String::new(),
			last_location: String::new(),
		}
	}

	fn set_error(&mut self, message: impl Into<String>, location: impl Into<String>) {
		self.last_message = message.into();
		self.last_location = location.into();
	}
}

impl Transport for MemoryTransport {
	type Activity = MemoryActivity;

	fn activity(&self) -> MemoryActivity {
		MemoryActivity {
			link: Arc::clone(&self.link),
		}
	}

	fn submit(&mut self, op: Operation) -> Result<RequestId, Status> {
		let inner = Arc::clone(&self.cluster.inner);
		let mut state = inner.state.lock();
		if let Some(status) = state.rejects() {
			self.set_error(format!("cluster refused {}", op.name()), here!());
			return Err(status);
		}

		let id = RequestId(self.next_id);
		self.next_id += 1;
		let finished = state.execute(id, op);
		self.link.deliver(finished, state.is_paused());
		Ok(id)
	}

	fn drain_one(&mut self, timeout: Duration) -> Drained {
		let mut queue = self.link.queue.lock();
		if !queue.has_work() && !timeout.is_zero() {
			let _ = self.link.wake.wait_for(&mut queue, timeout);
		}

		if let Some(failure) = queue.failures.pop_front() {
			drop(queue);
			self.set_error(failure.message, failure.location);
			return Drained::Nothing(failure.status);
		}

		let next = match self.link.order {
			CompletionOrder::Fifo => queue.ready.pop_front(),
			CompletionOrder::Lifo => queue.ready.pop_back(),
		};
		match next {
			Some(finished) => {
				drop(queue);
				self.set_error(finished.message, finished.location);
				Drained::Completed {
					id: finished.id,
					status: finished.status,
					output: finished.output,
				}
			}
			None if queue.parked.is_empty() => {
				drop(queue);
				self.set_error("no outstanding operations to process", here!());
				Drained::Nothing(Status::NonePending)
			}
			None => {
				drop(queue);
				self.set_error("operation timed out", here!());
				Drained::Nothing(Status::Timeout)
			}
		}
	}

	fn last_error_message(&self) -> &str {
		&self.last_message
	}

	fn last_error_location(&self) -> &str {
		&self.last_location
	}
}

impl Drop for MemoryTransport {
	fn drop(&mut self) {
		self.cluster.note_released();
		tracing::trace!(next_id = self.next_id, "replicant.memory.released");
	}
}

/// Waits for a [`MemoryTransport`] to have something to drain.
#[derive(Clone)]
pub struct MemoryActivity {
	link: Arc<Link>,
}

impl std::fmt::Debug for MemoryActivity {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MemoryActivity").finish_non_exhaustive()
	}
}

impl Activity for MemoryActivity {
	fn block_until_activity(&mut self, timeout: Duration) {
		let mut queue = self.link.queue.lock();
		if !queue.has_work() {
			let _ = self.link.wake.wait_for(&mut queue, timeout);
		}
	}
}
