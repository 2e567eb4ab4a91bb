/// Replicated object hosted by a [`MemoryCluster`](super::MemoryCluster).
///
/// Calls run while the cluster is locked, one at a time, in submission
/// order.
pub trait MemoryObject: Send + 'static {
	/// Invokes `function`. Returns `None` when the object has no such
	/// function.
	fn call(&mut self, function: &str, input: &[u8]) -> Option<Vec<u8>>;

	/// Serializes the object's state.
	fn backup(&self) -> Vec<u8> {
		Vec::new()
	}

	/// Replaces the object's state with one produced by [`Self::backup`].
	///
	/// # Errors
	///
	/// A description of why `state` is unusable.
	fn restore(&mut self, state: &[u8]) -> Result<(), String> {
		let _ = state;
		Ok(())
	}
}

/// Library path of the built-in [`Echo`] object.
pub const ECHO_LIBRARY: &str = "echo";

/// Stateless object whose `echo` function returns its input.
#[derive(Debug, Default, Clone, Copy)]
pub struct Echo;

impl MemoryObject for Echo {
	fn call(&mut self, function: &str, input: &[u8]) -> Option<Vec<u8>> {
		(function == "echo").then(|| input.to_vec())
	}
}
