use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Monotonic generation clock for supervised threads.
///
/// Every signal gets a generation so log lines from a replaced driver can be
/// told apart from its successor.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(0);

fn next_generation() -> u64 {
	NEXT_GENERATION.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
}

/// Cloneable stop signal for a background loop.
///
/// Checking the signal never blocks, so a loop can poll it once per
/// iteration between its own bounded waits.
#[derive(Debug, Clone)]
pub struct StopSignal {
	generation: u64,
	cancel: CancellationToken,
}

impl StopSignal {
	/// Creates a signal in a fresh generation.
	pub fn new() -> Self {
		Self {
			generation: next_generation(),
			cancel: CancellationToken::new(),
		}
	}

	/// Returns the generation this signal belongs to.
	pub const fn generation(&self) -> u64 {
		self.generation
	}

	/// Returns true once [`Self::stop`] was called on any clone.
	pub fn is_stopped(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Requests the loop to stop. Repeated calls are no-ops.
	pub fn stop(&self) {
		self.cancel.cancel();
	}
}

impl Default for StopSignal {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stop_is_visible_through_clones() {
		let signal = StopSignal::new();
		let clone = signal.clone();
		assert!(!clone.is_stopped());
		signal.stop();
		signal.stop();
		assert!(clone.is_stopped());
		assert_eq!(signal.generation(), clone.generation());
	}

	#[test]
	fn generations_increase() {
		let a = StopSignal::new();
		let b = StopSignal::new();
		assert!(b.generation() > a.generation());
	}
}
