use crate::{dom::Document, readiness::Readiness, resolver::Resolver, state::StateStore, Result};
use core::{cell::RefCell, fmt, future::Future};
use futures::task::{LocalSpawn, LocalSpawnExt};
use std::rc::Rc;

/// The id of the subtree the swap framework replaced most recently.
///
/// Clones share the same designation.
#[derive(Debug, Clone, Default)]
pub struct SwapTarget(Rc<RefCell<Option<String>>>);

impl SwapTarget {
	/// Used while nothing has been swapped yet, and after history restoration.
	pub const DEFAULT: &'static str = "main";

	pub fn set(&self, id: Option<String>) {
		*self.0.borrow_mut() = id.filter(|id| !id.is_empty());
	}

	#[must_use]
	pub fn id(&self) -> String {
		self.0.borrow().clone().unwrap_or_else(|| Self::DEFAULT.to_owned())
	}
}

/// Everything the factory and conductor need from their surroundings.
#[derive(Clone)]
pub struct Host {
	pub document: Rc<dyn Document>,
	pub readiness: Rc<dyn Readiness>,
	pub resolver: Rc<dyn Resolver>,
	pub spawner: Rc<dyn LocalSpawn>,
	pub store: StateStore,
	pub swap_target: SwapTarget,
}

impl fmt::Debug for Host {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Host").field("store", &self.store).field("swap_target", &self.swap_target).finish()
	}
}

impl Host {
	/// With a fresh [`StateStore`] and [`SwapTarget`].
	#[must_use]
	pub fn new(document: Rc<dyn Document>, readiness: Rc<dyn Readiness>, resolver: Rc<dyn Resolver>, spawner: Rc<dyn LocalSpawn>) -> Self {
		Self {
			document,
			readiness,
			resolver,
			spawner,
			store: StateStore::new(),
			swap_target: SwapTarget::default(),
		}
	}

	/// # Errors
	///
	/// Iff the spawner refuses the task, e.g. because its executor shut down.
	pub fn spawn(&self, task: impl Future<Output = ()> + 'static) -> Result<()> {
		Ok(self.spawner.spawn_local(task)?)
	}
}
