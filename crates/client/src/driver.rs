//! The background loop that owns every transport interaction after open.

use std::sync::Arc;
use std::time::Duration;

use replicant_worker::StopSignal;

use crate::engine::Engine;
use crate::transport::{Activity, Transport};

/// Name of the driver thread.
pub const DRIVER_THREAD_NAME: &str = "replicant-driver";

/// Runs until `stop` is signalled or the transport is released.
///
/// Each iteration waits for socket activity without the lock, then drains
/// and routes at most one completion under it. `poll_timeout` bounds how
/// long a stop request can go unnoticed.
pub(crate) fn run<T: Transport>(engine: Arc<Engine<T>>, mut activity: T::Activity, stop: StopSignal, poll_timeout: Duration) {
	let _guard = ReleaseOnPanic(&*engine);
	tracing::debug!(generation = stop.generation(), poll_ms = poll_timeout.as_millis() as u64, "replicant.driver.started");

	let mut steps = 0u64;
	while !stop.is_stopped() {
		activity.block_until_activity(poll_timeout);
		if engine.drain_step().is_break() {
			break;
		}
		steps = steps.wrapping_add(1);
	}

	tracing::debug!(generation = stop.generation(), steps, "replicant.driver.stopped");
}

/// Callers must never wait on a driver that is gone: if the loop unwinds,
/// release everything it was responsible for.
struct ReleaseOnPanic<'a, T: Transport>(&'a Engine<T>);

impl<T: Transport> Drop for ReleaseOnPanic<'_, T> {
	fn drop(&mut self) {
		if std::thread::panicking() {
			let failed = self.0.release();
			tracing::error!(failed = failed.unwrap_or(0), "replicant.driver.panicked");
		}
	}
}
