//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::connection::{ConnectionString, DEFAULT_PORT};
use crate::{Error, Result};

/// How long the driver waits for socket activity before re-checking its stop
/// signal.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(250);

/// Longest accepted poll timeout. Teardown waits up to one poll timeout for
/// the driver to notice the stop signal.
pub const MAX_POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// Default buffer size of the unsolicited error channel.
pub const DEFAULT_ERROR_CAPACITY: usize = 16;

/// Configuration for [`Client::open`](crate::Client::open).
///
/// Deserializable from TOML:
///
/// ```toml
/// connection = "10.0.0.1:1982,10.0.0.2:1982"
/// poll_timeout_ms = 100
/// error_capacity = 64
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
	/// Bootstrap servers, see [`ConnectionString`].
	pub connection: String,
	/// Driver poll timeout.
	#[serde(rename = "poll_timeout_ms", deserialize_with = "duration_from_millis")]
	pub poll_timeout: Duration,
	/// Number of unsolicited errors buffered before new ones are dropped.
	pub error_capacity: usize,
}

fn duration_from_millis<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<Duration, D::Error> {
	u64::deserialize(de).map(Duration::from_millis)
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			connection: format!("127.0.0.1:{DEFAULT_PORT}"),
			poll_timeout: DEFAULT_POLL_TIMEOUT,
			error_capacity: DEFAULT_ERROR_CAPACITY,
		}
	}
}

impl ClientConfig {
	/// Create a configuration for the given connection string.
	pub fn new(connection: impl Into<String>) -> Self {
		Self {
			connection: connection.into(),
			..Self::default()
		}
	}

	/// Set the driver poll timeout.
	#[must_use]
	pub fn poll_timeout(mut self, timeout: Duration) -> Self {
		self.poll_timeout = timeout;
		self
	}

	/// Set the unsolicited error buffer size.
	#[must_use]
	pub fn error_capacity(mut self, capacity: usize) -> Self {
		self.error_capacity = capacity;
		self
	}

	/// Parses and validates a TOML document.
	///
	/// # Errors
	///
	/// [`Error::Config`] for malformed TOML, unknown keys, or values rejected
	/// by [`Self::validate`].
	pub fn from_toml_str(input: &str) -> Result<Self> {
		let config: Self = toml::from_str(input).map_err(|e| Error::Config(e.to_string()))?;
		config.validate()?;
		Ok(config)
	}

	/// Checks value ranges and the connection string.
	///
	/// # Errors
	///
	/// [`Error::Config`] for out-of-range values, [`Error::InvalidConnection`]
	/// for a malformed connection string.
	pub fn validate(&self) -> Result<()> {
		if self.poll_timeout.is_zero() || self.poll_timeout > MAX_POLL_TIMEOUT {
			return Err(Error::Config(format!(
				"poll timeout must be between 1ms and {}ms, got {}ms",
				MAX_POLL_TIMEOUT.as_millis(),
				self.poll_timeout.as_millis()
			)));
		}
		if self.error_capacity == 0 {
			return Err(Error::Config("error capacity must be non-zero".into()));
		}
		self.connection_string().map(|_| ())
	}

	/// Parses [`Self::connection`].
	///
	/// # Errors
	///
	/// [`Error::InvalidConnection`] for a malformed connection string.
	pub fn connection_string(&self) -> Result<ConnectionString> {
		ConnectionString::parse(&self.connection)
	}
}
