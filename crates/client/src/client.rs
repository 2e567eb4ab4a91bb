//! Public client handle and call facade.

use std::sync::Arc;

use replicant_worker::{SupervisedThread, ThreadExit};

use crate::config::ClientConfig;
use crate::connection::ConnectionString;
use crate::driver::{self, DRIVER_THREAD_NAME};
use crate::engine::Engine;
use crate::error::StatusError;
use crate::pending::{Completion, Waiter};
use crate::sink::{self, UnsolicitedErrors};
use crate::status::Status;
use crate::transport::{CallFlags, Connector, Operation, Output, RequestId, Transport};
use crate::{BlockingClient, Error, Result};

/// Thread-safe handle to a replicated object service.
///
/// Cloning is cheap; all clones share one transport and one driver thread.
/// Any number of tasks and threads may issue calls concurrently. Each call
/// waits for its own completion and imposes no timeout; wrap calls in
/// `tokio::time::timeout` when an upper bound is needed.
///
/// The transport is released by [`Client::close`], or when the last clone is
/// dropped. Dropping is only a fallback: it runs whenever the last clone
/// happens to go away and may block for up to one poll timeout while the
/// driver stops, so prefer closing explicitly.
pub struct Client<T: Transport> {
	inner: Arc<ClientInner<T>>,
}

struct ClientInner<T: Transport> {
	engine: Arc<Engine<T>>,
	driver: SupervisedThread,
	connection: ConnectionString,
}

impl<T: Transport> Clone for Client<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T: Transport> std::fmt::Debug for Client<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Client")
			.field("driver", &self.inner.driver)
			.field("outstanding", &self.outstanding())
			.field("closed", &self.is_closed())
			.finish()
	}
}

impl<T: Transport> Client<T> {
	/// Connects to the cluster and starts the driver thread.
	///
	/// Returns the client together with the stream of unsolicited transport
	/// errors. Nothing is left running if this fails.
	///
	/// # Errors
	///
	/// - [`Error::Config`] or [`Error::InvalidConnection`] for a bad `config`.
	/// - [`Error::Connect`] when `connector` cannot create a transport.
	/// - [`Error::Spawn`] when the driver thread cannot be started.
	pub fn open<C>(config: &ClientConfig, connector: &C) -> Result<(Self, UnsolicitedErrors)>
	where
		C: Connector<Transport = T>,
	{
		config.validate()?;
		let conn = config.connection_string()?;
		let transport = connector.connect(&conn).map_err(Error::Connect)?;
		let activity = transport.activity();

		let (sink, errors) = sink::channel(config.error_capacity);
		let engine = Arc::new(Engine::new(transport, sink));
		let driver_engine = Arc::clone(&engine);
		let poll_timeout = config.poll_timeout;
		let driver = SupervisedThread::spawn(DRIVER_THREAD_NAME, move |stop| driver::run(driver_engine, activity, stop, poll_timeout))?;
		tracing::debug!(connection = %conn, "replicant.client.opened");

		let inner = Arc::new(ClientInner {
			engine,
			driver,
			connection: conn,
		});
		Ok((Self { inner }, errors))
	}

	/// Stops the driver, releases the transport, fails outstanding requests
	/// with [`Error::Destroyed`], and closes the unsolicited error stream.
	///
	/// Blocks for at most about one poll timeout. Calling it again, from any
	/// clone, is a no-op. Later calls fail with [`Error::Closed`].
	pub fn close(&self) {
		self.inner.close();
	}

	/// Bootstrap servers the client was opened with.
	pub fn connection(&self) -> &ConnectionString {
		&self.inner.connection
	}

	/// Returns true once the transport has been released.
	pub fn is_closed(&self) -> bool {
		self.inner.engine.is_released()
	}

	/// Number of requests awaiting a completion.
	pub fn outstanding(&self) -> usize {
		self.inner.engine.outstanding()
	}

	/// Submits `op` and returns a ticket for its completion without waiting.
	///
	/// # Errors
	///
	/// - [`Error::Closed`] after [`Self::close`].
	/// - [`Error::Status`] when the transport rejects the request; nothing is
	///   left outstanding in that case.
	pub fn submit(&self, op: Operation) -> Result<Ticket> {
		let (id, waiter) = self.inner.engine.submit(op)?;
		Ok(Ticket { id, waiter })
	}

	/// Blocking view of this client for threads outside an async runtime.
	pub fn blocking(&self) -> BlockingClient<'_, T> {
		BlockingClient::new(self)
	}

	/// Invokes `function` on `object` and returns its output.
	pub async fn call(&self, object: &str, function: &str, input: &[u8], flags: CallFlags) -> Result<Vec<u8>> {
		bytes(self.submit(call_op(object, function, input, flags))?.wait().await?)
	}

	/// Round-trips through the replicated log; succeeds while the cluster is
	/// live.
	pub async fn poke(&self) -> Result<()> {
		unit(self.submit(Operation::Poke)?.wait().await?)
	}

	/// Returns a number no other call to this cluster will return.
	pub async fn generate_unique_number(&self) -> Result<u64> {
		number(self.submit(Operation::GenerateUniqueNumber)?.wait().await?)
	}

	/// Creates `object` from the library at `library`.
	pub async fn new_object(&self, object: &str, library: &str) -> Result<()> {
		unit(self.submit(new_object_op(object, library))?.wait().await?)
	}

	/// Deletes `object`.
	pub async fn del_object(&self, object: &str) -> Result<()> {
		unit(self.submit(del_object_op(object))?.wait().await?)
	}

	/// Returns a snapshot of `object` for [`Self::restore_object`].
	pub async fn backup_object(&self, object: &str) -> Result<Vec<u8>> {
		bytes(self.submit(backup_object_op(object))?.wait().await?)
	}

	/// Recreates `object` from a snapshot.
	pub async fn restore_object(&self, object: &str, backup: &[u8]) -> Result<()> {
		unit(self.submit(restore_object_op(object, backup))?.wait().await?)
	}

	/// Lists object names.
	pub async fn list_objects(&self) -> Result<Vec<String>> {
		names(self.submit(Operation::ListObjects)?.wait().await?)
	}

	/// Fails `object` on the cluster, which then repairs it.
	pub async fn kill_object(&self, object: &str) -> Result<()> {
		unit(self.submit(kill_object_op(object))?.wait().await?)
	}
}

impl<T: Transport> ClientInner<T> {
	fn close(&self) {
		match self.driver.stop_and_join() {
			ThreadExit::Finished | ThreadExit::AlreadyJoined => {}
			ThreadExit::Panicked(msg) => tracing::error!(panic = %msg, "replicant.client.driver_panicked"),
		}
		if let Some(failed) = self.engine.release() {
			tracing::debug!(failed, "replicant.client.closed");
		}
	}
}

impl<T: Transport> Drop for ClientInner<T> {
	fn drop(&mut self) {
		self.close();
	}
}

/// Handle to one submitted request.
///
/// Dropping a ticket abandons interest in the result; the request itself is
/// not cancelled.
#[derive(Debug)]
#[must_use = "a ticket does nothing unless waited on"]
pub struct Ticket {
	id: RequestId,
	waiter: Waiter,
}

impl Ticket {
	/// Transport-assigned id of the request.
	pub fn id(&self) -> RequestId {
		self.id
	}

	/// Waits for the completion record.
	///
	/// # Errors
	///
	/// [`Error::Destroyed`] when the client is torn down first. A failed
	/// request is still `Ok`; see [`Completion::into_output`].
	pub async fn wait(self) -> Result<Completion> {
		self.waiter.await.map_err(|_| Error::Destroyed)?
	}

	/// Blocking variant of [`Self::wait`].
	///
	/// # Panics
	///
	/// Panics when called from within an async runtime.
	pub fn wait_blocking(self) -> Result<Completion> {
		self.waiter.blocking_recv().map_err(|_| Error::Destroyed)?
	}
}

pub(crate) fn call_op(object: &str, function: &str, input: &[u8], flags: CallFlags) -> Operation {
	Operation::Call {
		object: object.to_string(),
		function: function.to_string(),
		input: input.to_vec(),
		flags,
	}
}

pub(crate) fn new_object_op(object: &str, library: &str) -> Operation {
	Operation::NewObject {
		object: object.to_string(),
		library: library.to_string(),
	}
}

pub(crate) fn del_object_op(object: &str) -> Operation {
	Operation::DelObject { object: object.to_string() }
}

pub(crate) fn backup_object_op(object: &str) -> Operation {
	Operation::BackupObject { object: object.to_string() }
}

pub(crate) fn restore_object_op(object: &str, backup: &[u8]) -> Operation {
	Operation::RestoreObject {
		object: object.to_string(),
		backup: backup.to_vec(),
	}
}

pub(crate) fn kill_object_op(object: &str) -> Operation {
	Operation::KillObject { object: object.to_string() }
}

fn unexpected(id: RequestId, output: &Output, expected: &str) -> Error {
	Error::Status(StatusError::new(
		Status::Internal,
		format!("{id} completed with {output:?}, expected {expected}"),
		here!(),
	))
}

pub(crate) fn unit(completion: Completion) -> Result<()> {
	let id = completion.id;
	match completion.into_output()? {
		Output::None => Ok(()),
		other => Err(unexpected(id, &other, "no output")),
	}
}

pub(crate) fn bytes(completion: Completion) -> Result<Vec<u8>> {
	let id = completion.id;
	match completion.into_output()? {
		Output::Bytes(bytes) => Ok(bytes),
		Output::None => Ok(Vec::new()),
		other => Err(unexpected(id, &other, "bytes")),
	}
}

pub(crate) fn number(completion: Completion) -> Result<u64> {
	let id = completion.id;
	match completion.into_output()? {
		Output::Number(n) => Ok(n),
		other => Err(unexpected(id, &other, "a number")),
	}
}

pub(crate) fn names(completion: Completion) -> Result<Vec<String>> {
	let id = completion.id;
	match completion.into_output()? {
		Output::Names(names) => Ok(names),
		Output::None => Ok(Vec::new()),
		other => Err(unexpected(id, &other, "names")),
	}
}
