use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::object::{ECHO_LIBRARY, Echo, MemoryObject};
use super::transport::{Failure, Finished, Link, MemoryTransport};
use crate::connection::ConnectionString;
use crate::error::StatusError;
use crate::status::Status;
use crate::transport::{Connector, Operation, Output, RequestId};

type Factory = Arc<dyn Fn() -> Box<dyn MemoryObject> + Send + Sync>;

/// Order in which ready completions are drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionOrder {
	/// Oldest ready completion first.
	#[default]
	Fifo,
	/// Newest ready completion first.
	Lifo,
}

struct Hosted {
	library: String,
	object: Box<dyn MemoryObject>,
}

pub(super) struct ClusterState {
	objects: BTreeMap<String, Hosted>,
	libraries: HashMap<String, Factory>,
	next_unique: u64,
	order: CompletionOrder,
	paused: bool,
	reject: Option<Status>,
	refuse: Option<Status>,
	links: Vec<Weak<Link>>,
}

pub(super) struct ClusterInner {
	pub(super) state: Mutex<ClusterState>,
	released: AtomicUsize,
}

/// In-process replicated object service.
///
/// Requests execute immediately when submitted; their completions are then
/// queued on the submitting transport and drained like network replies.
/// Cloning yields another handle to the same cluster, which tests use to
/// steer delivery and inject faults while a client owns the transport.
#[derive(Clone)]
pub struct MemoryCluster {
	pub(super) inner: Arc<ClusterInner>,
}

impl std::fmt::Debug for MemoryCluster {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.inner.state.lock();
		f.debug_struct("MemoryCluster")
			.field("objects", &state.objects.keys().collect::<Vec<_>>())
			.field("order", &state.order)
			.field("paused", &state.paused)
			.finish_non_exhaustive()
	}
}

impl Default for MemoryCluster {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryCluster {
	/// Creates an empty cluster that knows the [`Echo`] library.
	pub fn new() -> Self {
		let cluster = Self {
			inner: Arc::new(ClusterInner {
				state: Mutex::new(ClusterState {
					objects: BTreeMap::new(),
					libraries: HashMap::new(),
					next_unique: 1,
					order: CompletionOrder::default(),
					paused: false,
					reject: None,
					refuse: None,
					links: Vec::new(),
				}),
				released: AtomicUsize::new(0),
			}),
		};
		cluster.with_library(ECHO_LIBRARY, || Echo)
	}

	/// Registers a library that `new_object` and `restore_object` can load.
	#[must_use]
	pub fn with_library<O, F>(self, path: impl Into<String>, factory: F) -> Self
	where
		O: MemoryObject,
		F: Fn() -> O + Send + Sync + 'static,
	{
		let factory: Factory = Arc::new(move || Box::new(factory()) as Box<dyn MemoryObject>);
		self.inner.state.lock().libraries.insert(path.into(), factory);
		self
	}

	/// Creates `name` from a registered library.
	///
	/// # Panics
	///
	/// Panics if `library` has not been registered.
	#[must_use]
	pub fn with_object(self, name: impl Into<String>, library: &str) -> Self {
		{
			let mut state = self.inner.state.lock();
			let object = state.instantiate(library).unwrap_or_else(|| panic!("library {library:?} is not registered"));
			state.objects.insert(
				name.into(),
				Hosted {
					library: library.to_string(),
					object,
				},
			);
		}
		self
	}

	/// Sets the order in which transports connected afterwards drain
	/// completions.
	#[must_use]
	pub fn with_order(self, order: CompletionOrder) -> Self {
		self.inner.state.lock().order = order;
		self
	}

	/// Holds back completions of requests submitted from now on.
	pub fn pause(&self) {
		self.inner.state.lock().paused = true;
	}

	/// Releases every held completion and stops holding new ones.
	pub fn resume(&self) {
		let mut state = self.inner.state.lock();
		state.paused = false;
		for link in state.live_links() {
			link.release_parked();
		}
	}

	/// Makes every submission fail synchronously with `status`, or accept
	/// submissions again with `None`.
	pub fn reject_submissions(&self, status: Option<Status>) {
		self.inner.state.lock().reject = status;
	}

	/// Makes connection attempts fail with `status`, or succeed again with
	/// `None`.
	pub fn refuse_connections(&self, status: Option<Status>) {
		self.inner.state.lock().refuse = status;
	}

	/// Reports a transport-level failure on every connected transport.
	pub fn inject_failure(&self, status: Status, message: impl Into<String>) {
		let message = message.into();
		let mut state = self.inner.state.lock();
		for link in state.live_links() {
			link.fail(Failure {
				status,
				message: message.clone(),
				location: here!().to_string(),
			});
		}
	}

	/// Reports a completion for `id` on every connected transport, whether
	/// or not such a request is outstanding.
	pub fn inject_stray_completion(&self, id: RequestId) {
		let mut state = self.inner.state.lock();
		for link in state.live_links() {
			link.deliver(
				Finished {
					id,
					status: Status::Success,
					message: String::new(),
					location: String::new(),
					output: Output::None,
				},
				false,
			);
		}
	}

	/// Number of transports from this cluster that have been dropped.
	pub fn released_transports(&self) -> usize {
		self.inner.released.load(Ordering::SeqCst)
	}

	/// Names of the objects currently hosted.
	pub fn object_names(&self) -> Vec<String> {
		self.inner.state.lock().objects.keys().cloned().collect()
	}

	pub(super) fn note_released(&self) {
		self.inner.released.fetch_add(1, Ordering::SeqCst);
	}
}

impl Connector for MemoryCluster {
	type Transport = MemoryTransport;

	fn connect(&self, conn: &ConnectionString) -> Result<MemoryTransport, StatusError> {
		let mut state = self.inner.state.lock();
		if let Some(status) = state.refuse {
			return Err(StatusError::new(status, format!("could not connect to {conn}"), here!()));
		}
		let link = Arc::new(Link::new(state.order));
		state.links.retain(|l| l.strong_count() > 0);
		state.links.push(Arc::downgrade(&link));
		tracing::debug!(connection = %conn, order = ?state.order, "replicant.memory.connected");
		Ok(MemoryTransport::new(self.clone(), link))
	}
}

impl ClusterState {
	pub(super) fn rejects(&self) -> Option<Status> {
		self.reject
	}

	pub(super) fn is_paused(&self) -> bool {
		self.paused
	}

	fn live_links(&mut self) -> Vec<Arc<Link>> {
		self.links.retain(|l| l.strong_count() > 0);
		self.links.iter().filter_map(Weak::upgrade).collect()
	}

	fn instantiate(&self, library: &str) -> Option<Box<dyn MemoryObject>> {
		self.libraries.get(library).map(|factory| factory())
	}

	/// Applies `op` to the cluster state.
	pub(super) fn execute(&mut self, id: RequestId, op: Operation) -> Finished {
		let result = match op {
			Operation::Poke => Ok(Output::None),
			Operation::GenerateUniqueNumber => {
				let n = self.next_unique;
				self.next_unique += 1;
				Ok(Output::Number(n))
			}
			Operation::Call { object, function, input, .. } => match self.objects.get_mut(&object) {
				None => Err((Status::ObjNotFound, format!("object {object:?} not found"))),
				Some(hosted) => match hosted.object.call(&function, &input) {
					Some(output) => Ok(Output::Bytes(output)),
					None => Err((Status::FuncNotFound, format!("object {object:?} has no function {function:?}"))),
				},
			},
			Operation::NewObject { object, library } => self.create(object, &library, None),
			Operation::DelObject { object } => match self.objects.remove(&object) {
				Some(_) => Ok(Output::None),
				None => Err((Status::ObjNotFound, format!("object {object:?} not found"))),
			},
			Operation::BackupObject { object } => match self.objects.get(&object) {
				Some(hosted) => Ok(Output::Bytes(encode_backup(&hosted.library, &hosted.object.backup()))),
				None => Err((Status::ObjNotFound, format!("object {object:?} not found"))),
			},
			Operation::RestoreObject { object, backup } => match decode_backup(&backup) {
				Some((library, state)) => self.create(object, library, Some(state)),
				None => Err((Status::ServerError, "malformed backup".to_string())),
			},
			Operation::ListObjects => Ok(Output::Names(self.objects.keys().cloned().collect())),
			Operation::KillObject { object } => self.repair(&object),
		};

		match result {
			Ok(output) => Finished {
				id,
				status: Status::Success,
				message: String::new(),
				location: String::new(),
				output,
			},
			Err((status, message)) => Finished {
				id,
				status,
				message,
				location: here!().to_string(),
				output: Output::None,
			},
		}
	}

	/// Replaces a killed object with a fresh instance restored from its own
	/// state.
	fn repair(&mut self, object: &str) -> Result<Output, (Status, String)> {
		let Some(hosted) = self.objects.get(object) else {
			return Err((Status::ObjNotFound, format!("object {object:?} not found")));
		};
		let state = hosted.object.backup();
		let library = hosted.library.clone();
		let Some(mut instance) = self.instantiate(&library) else {
			return Err((Status::ServerError, format!("no library at {library:?}")));
		};
		instance
			.restore(&state)
			.map_err(|reason| (Status::ServerError, format!("cannot repair {object:?}: {reason}")))?;
		tracing::warn!(object, library = %library, "replicant.memory.object_killed");
		self.objects.insert(
			object.to_string(),
			Hosted {
				library,
				object: instance,
			},
		);
		Ok(Output::None)
	}

	fn create(&mut self, object: String, library: &str, state: Option<&[u8]>) -> Result<Output, (Status, String)> {
		if self.objects.contains_key(&object) {
			return Err((Status::ObjExist, format!("object {object:?} already exists")));
		}
		let Some(mut instance) = self.instantiate(library) else {
			return Err((Status::ServerError, format!("no library at {library:?}")));
		};
		if let Some(state) = state {
			instance
				.restore(state)
				.map_err(|reason| (Status::ServerError, format!("cannot restore {object:?}: {reason}")))?;
		}
		self.objects.insert(
			object,
			Hosted {
				library: library.to_string(),
				object: instance,
			},
		);
		Ok(Output::None)
	}
}

/// Backups are the library path, a NUL byte, then the object state.
fn encode_backup(library: &str, state: &[u8]) -> Vec<u8> {
	let mut out = Vec::with_capacity(library.len() + 1 + state.len());
	out.extend_from_slice(library.as_bytes());
	out.push(0);
	out.extend_from_slice(state);
	out
}

fn decode_backup(backup: &[u8]) -> Option<(&str, &[u8])> {
	let nul = backup.iter().position(|b| *b == 0)?;
	let library = std::str::from_utf8(&backup[..nul]).ok()?;
	Some((library, &backup[nul + 1..]))
}
