//! Return codes reported by the service and its transport.

use std::fmt;

/// Status of a request or of one driver loop step.
///
/// Codes occupy `[5120, 5376)` and match the service's native client, so
/// they can be logged and compared across language bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Status {
	/// The operation completed.
	Success = 5120,
	/// The operation may or may not have happened.
	Maybe = 5121,
	/// A system error; consult `errno`.
	SeeErrno = 5122,
	/// The client connected to a different cluster.
	ClusterJump = 5123,
	/// No server in the cluster could be reached.
	CommFailed = 5124,
	/// The named object does not exist.
	ObjNotFound = 5184,
	/// An object with that name already exists.
	ObjExist = 5185,
	/// The object has no such function.
	FuncNotFound = 5186,
	/// The object has no such condition.
	CondNotFound = 5187,
	/// The condition was destroyed while being waited on.
	CondDestroyed = 5188,
	/// A server behaved abnormally.
	ServerError = 5248,
	/// The loop step timed out.
	Timeout = 5312,
	/// The loop step was interrupted by a signal.
	Interrupted = 5313,
	/// No request is outstanding.
	NonePending = 5314,
	/// Internal invariant violated.
	Internal = 5373,
	/// An unexpected exception inside the transport.
	Exception = 5374,
	/// Uninitialized status.
	Garbage = 5375,
}

impl Status {
	/// Every status, in code order.
	pub const ALL: [Self; 17] = [
		Self::Success,
		Self::Maybe,
		Self::SeeErrno,
		Self::ClusterJump,
		Self::CommFailed,
		Self::ObjNotFound,
		Self::ObjExist,
		Self::FuncNotFound,
		Self::CondNotFound,
		Self::CondDestroyed,
		Self::ServerError,
		Self::Timeout,
		Self::Interrupted,
		Self::NonePending,
		Self::Internal,
		Self::Exception,
		Self::Garbage,
	];

	/// Numeric code.
	pub const fn code(self) -> u32 {
		self as u32
	}

	/// Looks up a status by numeric code.
	pub fn from_code(code: u32) -> Option<Self> {
		Self::ALL.into_iter().find(|s| s.code() == code)
	}

	/// Symbolic name, e.g. `REPLICANT_OBJ_NOT_FOUND`.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Success => "REPLICANT_SUCCESS",
			Self::Maybe => "REPLICANT_MAYBE",
			Self::SeeErrno => "REPLICANT_SEE_ERRNO",
			Self::ClusterJump => "REPLICANT_CLUSTER_JUMP",
			Self::CommFailed => "REPLICANT_COMM_FAILED",
			Self::ObjNotFound => "REPLICANT_OBJ_NOT_FOUND",
			Self::ObjExist => "REPLICANT_OBJ_EXIST",
			Self::FuncNotFound => "REPLICANT_FUNC_NOT_FOUND",
			Self::CondNotFound => "REPLICANT_COND_NOT_FOUND",
			Self::CondDestroyed => "REPLICANT_COND_DESTROYED",
			Self::ServerError => "REPLICANT_SERVER_ERROR",
			Self::Timeout => "REPLICANT_TIMEOUT",
			Self::Interrupted => "REPLICANT_INTERRUPTED",
			Self::NonePending => "REPLICANT_NONE_PENDING",
			Self::Internal => "REPLICANT_INTERNAL",
			Self::Exception => "REPLICANT_EXCEPTION",
			Self::Garbage => "REPLICANT_GARBAGE",
		}
	}

	/// Returns true for [`Status::Success`].
	pub const fn is_success(self) -> bool {
		matches!(self, Self::Success)
	}

	/// Returns true for loop outcomes that mean "nothing completed" rather
	/// than an error: timeout, interruption, or nothing outstanding.
	pub const fn is_idle(self) -> bool {
		matches!(self, Self::Timeout | Self::Interrupted | Self::NonePending)
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
