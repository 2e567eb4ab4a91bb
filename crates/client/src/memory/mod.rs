//! In-process replicated object service.
//!
//! [`MemoryCluster`] implements [`Connector`](crate::Connector) and hands out
//! [`MemoryTransport`]s that obey the full transport contract, including
//! last-error accessors and idle statuses. It also exposes controls that real
//! deployments only produce by accident: held-back or reordered completions,
//! rejected submissions, transport failures, and completions for ids nobody
//! asked about.

mod cluster;
mod object;
mod transport;

pub use cluster::{CompletionOrder, MemoryCluster};
pub use object::{ECHO_LIBRARY, Echo, MemoryObject};
pub use transport::{MemoryActivity, MemoryTransport};
