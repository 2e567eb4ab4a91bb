use std::io;

use crate::status::Status;

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A non-success status with the transport's explanation.
///
/// `location` names where in the transport the failure was detected; it is
/// empty when the transport does not track locations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {message}")]
pub struct StatusError {
	/// Failure kind.
	pub status: Status,
	/// Human-readable explanation.
	pub message: String,
	/// Source location reported by the transport.
	pub location: String,
}

impl StatusError {
	/// Creates a status error.
	pub fn new(status: Status, message: impl Into<String>, location: impl Into<String>) -> Self {
		Self {
			status,
			message: message.into(),
			location: location.into(),
		}
	}
}

/// Possible errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The transport rejected the request or completed it with a failure.
	#[error(transparent)]
	Status(#[from] StatusError),
	/// The client was torn down while this request was outstanding.
	#[error("client destroyed while the request was outstanding")]
	Destroyed,
	/// The client was closed before the request was submitted.
	#[error("client closed")]
	Closed,
	/// The connection string could not be parsed.
	#[error("invalid connection string {input:?}: {reason}")]
	InvalidConnection {
		/// The rejected input.
		input: String,
		/// What is wrong with it.
		reason: String,
	},
	/// The transport could not be created.
	#[error("could not create transport: {0}")]
	Connect(StatusError),
	/// The client configuration is invalid.
	#[error("invalid configuration: {0}")]
	Config(String),
	/// The driver thread could not be started.
	#[error("could not start driver thread: {0}")]
	Spawn(#[from] io::Error),
}

impl Error {
	/// Returns the transport status for [`Error::Status`] and [`Error::Connect`].
	pub fn status(&self) -> Option<Status> {
		match self {
			Self::Status(err) | Self::Connect(err) => Some(err.status),
			_ => None,
		}
	}
}
