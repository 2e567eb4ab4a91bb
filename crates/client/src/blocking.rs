//! Call facade for plain OS threads.

use crate::client::{
	backup_object_op, bytes, call_op, del_object_op, kill_object_op, names, new_object_op, number, restore_object_op, unit,
};
use crate::transport::{CallFlags, Operation, Transport};
use crate::{Client, Result};

/// Blocking view of a [`Client`], obtained with [`Client::blocking`].
///
/// Each method parks the calling thread until its completion arrives. Do not
/// use from inside an async runtime; the waits panic there.
#[derive(Debug)]
pub struct BlockingClient<'a, T: Transport> {
	client: &'a Client<T>,
}

impl<'a, T: Transport> BlockingClient<'a, T> {
	pub(crate) fn new(client: &'a Client<T>) -> Self {
		Self { client }
	}

	/// See [`Client::call`].
	pub fn call(&self, object: &str, function: &str, input: &[u8], flags: CallFlags) -> Result<Vec<u8>> {
		bytes(self.client.submit(call_op(object, function, input, flags))?.wait_blocking()?)
	}

	/// See [`Client::poke`].
	pub fn poke(&self) -> Result<()> {
		unit(self.client.submit(Operation::Poke)?.wait_blocking()?)
	}

	/// See [`Client::generate_unique_number`].
	pub fn generate_unique_number(&self) -> Result<u64> {
		number(self.client.submit(Operation::GenerateUniqueNumber)?.wait_blocking()?)
	}

	/// See [`Client::new_object`].
	pub fn new_object(&self, object: &str, library: &str) -> Result<()> {
		unit(self.client.submit(new_object_op(object, library))?.wait_blocking()?)
	}

	/// See [`Client::del_object`].
	pub fn del_object(&self, object: &str) -> Result<()> {
		unit(self.client.submit(del_object_op(object))?.wait_blocking()?)
	}

	/// See [`Client::backup_object`].
	pub fn backup_object(&self, object: &str) -> Result<Vec<u8>> {
		bytes(self.client.submit(backup_object_op(object))?.wait_blocking()?)
	}

	/// See [`Client::restore_object`].
	pub fn restore_object(&self, object: &str, backup: &[u8]) -> Result<()> {
		unit(self.client.submit(restore_object_op(object, backup))?.wait_blocking()?)
	}

	/// See [`Client::list_objects`].
	pub fn list_objects(&self) -> Result<Vec<String>> {
		names(self.client.submit(Operation::ListObjects)?.wait_blocking()?)
	}

	/// See [`Client::kill_object`].
	pub fn kill_object(&self, object: &str) -> Result<()> {
		unit(self.client.submit(kill_object_op(object))?.wait_blocking()?)
	}
}
