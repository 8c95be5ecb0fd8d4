//! The component factory: finds placeholders in the swap target, loads their components and unmounts what a swap replaced.
//!
//! Reconciliation is two coarse passes keyed on subtree membership, not a diff:
//!
//! 1. [`Lifecycle::unmount`] tears down every tracked instance whose anchor is inside the swap target (it's about to be rebuilt)
//!    or no longer anywhere in the document (it's orphaned). Instances elsewhere in the document are left alone.
//! 2. [`Lifecycle::mount`] loads a fresh instance for each placeholder inside the swap target.

use crate::{
	component::{Base, Component},
	config::Config,
	dom::ElementData,
	host::Host,
	strategy, Error, Result,
};
use core::cell::{Cell, RefCell};
use futures::future::join_all;
use std::rc::Rc;
use tracing::{debug, error, instrument, trace, warn};

/// Something that (re)attaches itself to the page on every swap.
pub trait Lifecycle {
	fn mount(&self);
	fn unmount(&self);

	fn refresh(&self) {
		self.unmount();
		self.mount();
	}
}

/// A tracked, mounted instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
	/// The component name from the placeholder.
	pub name: String,
	/// `#{id}` of the placeholder.
	pub selector: String,
}

type Instance = Rc<RefCell<Box<dyn Component>>>;

struct Loaded {
	entry: Entry,
	/// The placeholder's `id`.
	id: String,
	instance: Instance,
}

struct Inner {
	extension: String,
	config: Config,
	host: Host,
	/// In mount order.
	loaded: RefCell<Vec<Loaded>>,
	in_flight: Cell<usize>,
}

/// Cheap to clone. Clones share their tracked instances.
#[derive(Clone)]
pub struct Factory {
	inner: Rc<Inner>,
}

impl core::fmt::Debug for Factory {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Factory")
			.field("extension", &self.inner.extension)
			.field("loaded", &self.loaded())
			.field("in_flight", &self.inner.in_flight.get())
			.finish()
	}
}

impl Factory {
	/// Nothing is loaded until the first [`Lifecycle::mount`].
	#[must_use]
	pub fn new(extension: &str, config: Config, host: Host) -> Self {
		Self {
			inner: Rc::new(Inner {
				extension: extension.to_owned(),
				config,
				host,
				loaded: RefCell::default(),
				in_flight: Cell::new(0),
			}),
		}
	}

	#[must_use]
	pub fn host(&self) -> &Host {
		&self.inner.host
	}

	#[must_use]
	pub fn config(&self) -> &Config {
		&self.inner.config
	}

	/// `data-{extension}`, which names the component on a placeholder.
	#[must_use]
	pub fn placeholder_attribute(&self) -> String {
		format!("data-{}", self.inner.extension)
	}

	/// The tracked instances, in mount order.
	#[must_use]
	pub fn loaded(&self) -> Vec<Entry> {
		self.inner.loaded.borrow().iter().map(|loaded| loaded.entry.clone()).collect()
	}

	/// How many loads are waiting on their strategies or imports.
	#[must_use]
	pub fn in_flight(&self) -> usize {
		self.inner.in_flight.get()
	}

	/// Runs `f` on the tracked instance anchored at `selector`, if any.
	///
	/// `f` may call back into the factory. [`None`] while that instance is itself busy, e.g. when called from its own `mount`.
	pub fn with_instance<R>(&self, selector: &str, f: impl FnOnce(&mut dyn Component) -> R) -> Option<R> {
		let instance = self.inner.loaded.borrow().iter().find(|loaded| loaded.entry.selector == selector).map(|loaded| Rc::clone(&loaded.instance))?;
		let mut instance = instance.try_borrow_mut().ok()?;
		Some(f(&mut **instance))
	}

	/// Schedules loading the component `placeholder` names.
	///
	/// The load waits for the placeholder's `data-load` strategies, imports version `data-version` (default `1`),
	/// then constructs, mounts and tracks the instance. It isn't cancelled if the placeholder disappears meanwhile.
	///
	/// # Errors
	///
	/// [`Error::MissingIdentity`] if the placeholder has no `id`, as it could never be unmounted.
	/// [`Error::Spawn`] if the load couldn't be scheduled.
	#[instrument(skip(self, placeholder), fields(id = ?placeholder.id()))]
	pub fn lazyload(&self, placeholder: &ElementData) -> Result<()> {
		let name = placeholder.attribute(&self.placeholder_attribute()).unwrap_or_default().to_owned();
		let id = match placeholder.id() {
			Some(id) => id.to_owned(),
			None => return Err(Error::MissingIdentity { component: name }),
		};
		let selector = format!("#{}", id);
		let version = placeholder.attribute("data-version").unwrap_or("1").to_owned();
		let host = &self.inner.host;
		let waits = strategy::load_strategies(placeholder.attribute("data-load"), Some(&selector), &*host.document, &*host.readiness);

		let inner = Rc::clone(&self.inner);
		let task = async move {
			join_all(waits).await;
			let url = inner.config.module_url(&name, &version);
			let imported = inner.host.resolver.import(&name, &version, &url).await;
			inner.in_flight.set(inner.in_flight.get() - 1);

			let constructor = match imported {
				Ok(constructor) => constructor,
				Err(error) => return error!("Failed to load {:?} for {}: {}", name, selector, error),
			};
			let base = Base::new(Some(selector.clone()), Rc::clone(&inner.host.document), inner.host.store.clone());
			let mut instance = constructor(base);
			instance.mount();
			instance.base_mut().set_mounted(true);
			debug!("Mounted {:?} at {}.", name, selector);
			inner.loaded.borrow_mut().push(Loaded {
				entry: Entry { name, selector },
				id,
				instance: Rc::new(RefCell::new(instance)),
			});
		};

		self.inner.in_flight.set(self.inner.in_flight.get() + 1);
		host.spawn(task).map_err(|error| {
			self.inner.in_flight.set(self.inner.in_flight.get() - 1);
			error
		})
	}
}

impl Lifecycle for Factory {
	/// Loads every placeholder inside the swap target. Placeholders elsewhere stay as they are.
	#[instrument(skip(self))]
	fn mount(&self) {
		let host = &self.inner.host;
		let target = host.swap_target.id();
		if !host.document.has_id(&target) {
			return trace!("Swap target #{} not found; nothing to mount.", target);
		}

		let selector = format!("[{}]", self.placeholder_attribute());
		for placeholder in host.document.query_all(Some(&target), &selector) {
			match self.lazyload(&placeholder) {
				Ok(()) => (),
				Err(error @ Error::MissingIdentity { .. }) => warn!("{}. Skipping.", error),
				Err(error) => error!("{}", error),
			}
		}
	}

	#[instrument(skip(self))]
	fn unmount(&self) {
		let host = &self.inner.host;
		let target = host.swap_target.id();
		if !host.document.has_id(&target) {
			return trace!("Swap target #{} not found; nothing to unmount.", target);
		}

		let torn_down = {
			let mut loaded = self.inner.loaded.borrow_mut();
			let mut torn_down = Vec::new();
			for i in (0..loaded.len()).rev() {
				let id = &loaded[i].id;
				let in_target = host.document.contains_id(&target, id);
				if in_target || !host.document.has_id(id) {
					trace!(in_target, "Tearing down #{}.", id);
					torn_down.push(loaded.remove(i));
				} else {
					trace!("Keeping #{} outside the swap target.", id);
				}
			}
			torn_down
		};

		for loaded in torn_down {
			let mut instance = match loaded.instance.try_borrow_mut() {
				Ok(instance) => instance,
				Err(_) => {
					error!("{:?} at {} refreshed the factory from inside its own lifecycle; it can't be unmounted.", loaded.entry.name, loaded.entry.selector);
					continue;
				}
			};
			instance.unmount();
			instance.base_mut().set_mounted(false);
			debug!("Unmounted {:?} at {}.", loaded.entry.name, loaded.entry.selector);
		}
	}
}
