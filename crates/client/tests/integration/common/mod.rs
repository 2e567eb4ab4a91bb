//! Common utilities for client integration tests.

use std::time::Duration;

use replicant_client::memory::{ECHO_LIBRARY, MemoryCluster, MemoryObject, MemoryTransport};
use replicant_client::{Client, ClientConfig, UnsolicitedErrors};

/// Library path of [`Counter`].
pub const COUNTER_LIBRARY: &str = "counter";

/// Short enough that stop requests are noticed quickly.
pub const POLL: Duration = Duration::from_millis(10);

/// Counts `incr` calls and returns the running total as little-endian bytes.
#[derive(Debug, Default)]
pub struct Counter(u64);

impl MemoryObject for Counter {
	fn call(&mut self, function: &str, _input: &[u8]) -> Option<Vec<u8>> {
		match function {
			"incr" => {
				self.0 += 1;
				Some(self.0.to_le_bytes().to_vec())
			}
			"get" => Some(self.0.to_le_bytes().to_vec()),
			_ => None,
		}
	}

	fn backup(&self) -> Vec<u8> {
		self.0.to_le_bytes().to_vec()
	}

	fn restore(&mut self, state: &[u8]) -> Result<(), String> {
		let bytes: [u8; 8] = state.try_into().map_err(|_| format!("expected 8 bytes, got {}", state.len()))?;
		self.0 = u64::from_le_bytes(bytes);
		Ok(())
	}
}

/// Cluster with an `echo` object and the counter library registered.
pub fn cluster() -> MemoryCluster {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
	MemoryCluster::new()
		.with_library(COUNTER_LIBRARY, Counter::default)
		.with_object("echo", ECHO_LIBRARY)
}

pub fn config() -> ClientConfig {
	ClientConfig::default().poll_timeout(POLL)
}

pub fn open(cluster: &MemoryCluster) -> (Client<MemoryTransport>, UnsolicitedErrors) {
	Client::open(&config(), cluster).expect("client should open")
}

pub fn decode(bytes: &[u8]) -> u64 {
	u64::from_le_bytes(bytes.try_into().expect("8-byte counter"))
}
