use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::panic::panic_message;
use crate::token::StopSignal;

/// How a supervised thread ended, as observed by one joiner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadExit {
	/// The thread body returned normally.
	Finished,
	/// The thread body panicked with the given message.
	Panicked(String),
	/// Another caller joined the thread first.
	AlreadyJoined,
}

/// Join coordination state for the thread handle.
///
/// Only one caller becomes the leader that owns the [`JoinHandle`]; others
/// wait on the condvar until the leader transitions to `Done`.
enum JoinState {
	/// Thread handle is still owned; first joiner takes it.
	Handle(JoinHandle<()>),
	/// A caller is currently blocked in [`JoinHandle::join`].
	Joining,
	/// Thread has been joined.
	Done,
}

/// Set by the thread on its way out, including while unwinding.
#[derive(Default)]
struct ExitLatch {
	exited: Mutex<bool>,
	cond: Condvar,
}

struct ExitGuard(Arc<ExitLatch>);

impl Drop for ExitGuard {
	fn drop(&mut self) {
		*self.0.exited.lock() = true;
		self.0.cond.notify_all();
	}
}

/// A dedicated named OS thread driven by a [`StopSignal`].
///
/// The body receives a clone of the signal and is expected to poll it. Joining
/// is safe from any number of threads; exactly one of them observes the real
/// exit and the rest get [`ThreadExit::AlreadyJoined`].
pub struct SupervisedThread {
	name: String,
	stop: StopSignal,
	state: Mutex<JoinState>,
	joined: Condvar,
	latch: Arc<ExitLatch>,
}

impl std::fmt::Debug for SupervisedThread {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SupervisedThread")
			.field("name", &self.name)
			.field("generation", &self.stop.generation())
			.field("stopped", &self.stop.is_stopped())
			.field("finished", &self.is_finished())
			.finish()
	}
}

impl SupervisedThread {
	/// Spawns `body` on a new thread called `name`.
	pub fn spawn<F>(name: impl Into<String>, body: F) -> std::io::Result<Self>
	where
		F: FnOnce(StopSignal) + Send + 'static,
	{
		let name = name.into();
		let stop = StopSignal::new();
		let latch = Arc::new(ExitLatch::default());

		let thread_stop = stop.clone();
		let guard = ExitGuard(Arc::clone(&latch));
		tracing::trace!(thread = %name, generation = stop.generation(), "worker.spawn_thread");
		let handle = std::thread::Builder::new().name(name.clone()).spawn(move || {
			let _guard = guard;
			body(thread_stop);
		})?;

		Ok(Self {
			name,
			stop,
			state: Mutex::new(JoinState::Handle(handle)),
			joined: Condvar::new(),
			latch,
		})
	}

	/// Returns the thread name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns the stop signal shared with the thread body.
	pub fn stop_signal(&self) -> &StopSignal {
		&self.stop
	}

	/// Returns true once the thread body has returned or unwound.
	pub fn is_finished(&self) -> bool {
		*self.latch.exited.lock()
	}

	/// Signals the body to stop and waits for the thread to exit.
	pub fn stop_and_join(&self) -> ThreadExit {
		self.stop.stop();
		self.join()
	}

	/// Waits for the thread to exit.
	pub fn join(&self) -> ThreadExit {
		let handle = {
			let mut state = self.state.lock();
			loop {
				match std::mem::replace(&mut *state, JoinState::Joining) {
					JoinState::Handle(h) => break h,
					JoinState::Joining => self.joined.wait(&mut state),
					JoinState::Done => {
						*state = JoinState::Done;
						return ThreadExit::AlreadyJoined;
					}
				}
			}
		};

		let exit = match handle.join() {
			Ok(()) => ThreadExit::Finished,
			Err(payload) => ThreadExit::Panicked(panic_message(payload.as_ref())),
		};
		tracing::debug!(thread = %self.name, generation = self.stop.generation(), exit = ?exit, "worker.thread.joined");

		*self.state.lock() = JoinState::Done;
		self.joined.notify_all();
		exit
	}

	/// Waits up to `timeout` for the thread to exit, then joins it.
	///
	/// Returns `None` if the thread is still running at the deadline.
	pub fn join_timeout(&self, timeout: Duration) -> Option<ThreadExit> {
		let deadline = Instant::now() + timeout;
		{
			let mut exited = self.latch.exited.lock();
			while !*exited {
				if self.latch.cond.wait_until(&mut exited, deadline).timed_out() {
					if !*exited {
						return None;
					}
					break;
				}
			}
		}
		Some(self.join())
	}
}

impl Drop for SupervisedThread {
	fn drop(&mut self) {
		// Never block in drop; an unjoined thread is told to stop and detached.
		if matches!(&*self.state.get_mut(), JoinState::Handle(_)) {
			self.stop.stop();
			tracing::debug!(thread = %self.name, generation = self.stop.generation(), "worker.thread.detached");
		}
	}
}
