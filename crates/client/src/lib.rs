//! Thread-safe client for the Replicant replicated object service.
//!
//! The underlying transport is a single-threaded, poll-driven handle. A
//! [`Client`] wraps it so any number of tasks and threads can issue calls
//! concurrently: submissions and drains are serialized behind one lock, a
//! dedicated driver thread routes every completion to the caller that is
//! waiting for it, and transport errors that belong to no caller surface on
//! the [`UnsolicitedErrors`] stream.
//!
//! ```no_run
//! # async fn demo() -> replicant_client::Result<()> {
//! use replicant_client::memory::{ECHO_LIBRARY, MemoryCluster};
//! use replicant_client::{CallFlags, Client, ClientConfig};
//!
//! let cluster = MemoryCluster::new().with_object("echo", ECHO_LIBRARY);
//! let (client, _errors) = Client::open(&ClientConfig::default(), &cluster)?;
//! let out = client.call("echo", "echo", b"hello world", CallFlags::empty()).await?;
//! assert_eq!(out, b"hello world");
//! client.close();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

/// Expands to the `file:line` of the call site.
macro_rules! here {
	() => {
		concat!(file!(), ":", line!())
	};
}

mod blocking;
mod client;
mod config;
mod connection;
mod driver;
mod engine;
mod error;
mod pending;
mod sink;
mod status;
mod transport;

#[cfg(feature = "memory")]
pub mod memory;

pub use blocking::BlockingClient;
pub use client::{Client, Ticket};
pub use config::{ClientConfig, DEFAULT_ERROR_CAPACITY, DEFAULT_POLL_TIMEOUT, MAX_POLL_TIMEOUT};
pub use connection::{ConnectionString, DEFAULT_PORT, Host};
pub use driver::DRIVER_THREAD_NAME;
pub use error::{Error, Result, StatusError};
pub use pending::Completion;
pub use sink::UnsolicitedErrors;
pub use status::Status;
pub use transport::{Activity, CallFlags, Connector, Drained, Operation, Output, RequestId, Transport};
