//! The transport contract the correlation engine drives.
//!
//! A transport is a single-threaded, poll-driven handle: requests are
//! submitted without blocking and identified by a [`RequestId`], and their
//! completions are drained one at a time. Nothing here is required to be
//! `Sync`; the client serializes every call behind one lock.
//!
//! Waiting for socket activity is split off into [`Activity`] so the driver
//! can block on it without holding the lock. The client hands the activity
//! half to its driver thread and never calls it anywhere else.

use std::fmt;
use std::time::Duration;

use crate::connection::ConnectionString;
use crate::error::StatusError;
use crate::status::Status;

/// Transport-assigned identifier of an outstanding request.
///
/// Unique among outstanding requests; may be reused once its completion has
/// been drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "req#{}", self.0)
	}
}

bitflags::bitflags! {
	/// Delivery semantics for [`Operation::Call`].
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct CallFlags: u32 {
		/// The call may be executed more than once without harm.
		const IDEMPOTENT = 1;
		/// Retry across server failures until the outcome is known.
		const ROBUST = 2;
	}
}

/// A request to the replicated object service.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Operation {
	/// Liveness probe through the replicated log.
	Poke,
	/// Cluster-wide unique number.
	GenerateUniqueNumber,
	/// Invoke `function` on `object` with an opaque payload.
	Call {
		/// Target object.
		object: String,
		/// Function exported by the object.
		function: String,
		/// Opaque argument bytes.
		input: Vec<u8>,
		/// Delivery semantics.
		flags: CallFlags,
	},
	/// Instantiate `object` from the library at `library`.
	NewObject {
		/// Name of the new object.
		object: String,
		/// Library path the object is loaded from.
		library: String,
	},
	/// Remove `object`.
	DelObject {
		/// Object to remove.
		object: String,
	},
	/// Snapshot the state of `object`.
	BackupObject {
		/// Object to snapshot.
		object: String,
	},
	/// Recreate `object` from a snapshot.
	RestoreObject {
		/// Name of the restored object.
		object: String,
		/// Bytes previously returned by a backup.
		backup: Vec<u8>,
	},
	/// Names of all objects.
	ListObjects,
	/// Fail `object` and have the cluster repair it from its last state.
	KillObject {
		/// Object to kill.
		object: String,
	},
}

impl Operation {
	/// Short name for logs.
	pub const fn name(&self) -> &'static str {
		match self {
			Self::Poke => "poke",
			Self::GenerateUniqueNumber => "generate_unique_number",
			Self::Call { .. } => "call",
			Self::NewObject { .. } => "new_object",
			Self::DelObject { .. } => "del_object",
			Self::BackupObject { .. } => "backup_object",
			Self::RestoreObject { .. } => "restore_object",
			Self::ListObjects => "list_objects",
			Self::KillObject { .. } => "kill_object",
		}
	}
}

/// Payload produced by a completed request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Output {
	/// The operation produces nothing.
	#[default]
	None,
	/// Raw bytes (call output, object backup).
	Bytes(Vec<u8>),
	/// A number (unique number generation).
	Number(u64),
	/// A list of names (object listing).
	Names(Vec<String>),
}

/// Outcome of one [`Transport::drain_one`] step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drained {
	/// A request finished with `status`.
	Completed {
		/// The finished request.
		id: RequestId,
		/// Its outcome.
		status: Status,
		/// Its payload; [`Output::None`] on failure.
		output: Output,
	},
	/// Nothing finished. Idle statuses ([`Status::is_idle`]) are normal; any
	/// other status is a transport-level failure described by the
	/// `last_error_*` accessors.
	Nothing(Status),
}

/// The socket-wait half of a transport.
pub trait Activity: Send + 'static {
	/// Blocks until the transport may have work or `timeout` elapses.
	///
	/// May return early, or immediately when there is nothing to wait on.
	fn block_until_activity(&mut self, timeout: Duration);
}

/// A live, non-thread-safe connection to the service.
///
/// Dropping the transport releases it.
pub trait Transport: Send + 'static {
	/// Socket-wait half handed to the driver thread.
	type Activity: Activity;

	/// Returns the socket-wait half of this transport.
	fn activity(&self) -> Self::Activity;

	/// Submits a request without blocking.
	///
	/// On rejection the returned status and the `last_error_*` accessors
	/// describe why; no completion will ever be reported for it.
	fn submit(&mut self, op: Operation) -> Result<RequestId, Status>;

	/// Reports at most one finished request, waiting up to `timeout`.
	fn drain_one(&mut self, timeout: Duration) -> Drained;

	/// Message describing the most recent failure.
	fn last_error_message(&self) -> &str;

	/// Location where the most recent failure was detected.
	fn last_error_location(&self) -> &str;

	/// Captures the most recent failure as a structured error.
	fn last_error(&self, status: Status) -> StatusError {
		StatusError::new(status, self.last_error_message(), self.last_error_location())
	}
}

/// Creates transports from connection strings.
pub trait Connector {
	/// Transport produced by this connector.
	type Transport: Transport;

	/// Establishes a transport to the cluster named by `conn`.
	fn connect(&self, conn: &ConnectionString) -> Result<Self::Transport, StatusError>;
}
