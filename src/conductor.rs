//! Conductors: named singletons that come and go with a selector instead of a placeholder.
//!
//! Every [`Lifecycle::mount`] re-evaluates all registrations. There are meant to be few of them.

use crate::{
	component::{Base, Component},
	config::Config,
	factory::Lifecycle,
	host::Host,
	strategy, Error, Result,
};
use core::cell::RefCell;
use futures::future::join_all;
use hashbrown::{HashMap, HashSet};
use serde::Deserialize;
use std::rc::Rc;
use tracing::{debug, error, instrument, trace, warn};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Registration {
	/// Unique. Also the module name.
	pub conductor: String,
	/// Loaded and mounted only while this matches. [`None`] loads once, right away, and never unmounts.
	#[serde(default)]
	pub selector: Option<String>,
	#[serde(default = "Registration::default_strategy")]
	pub strategy: Option<String>,
	#[serde(default = "Registration::default_version")]
	pub version: u32,
}

impl Registration {
	#[must_use]
	pub fn new(conductor: &str) -> Self {
		Self {
			conductor: conductor.to_owned(),
			selector: None,
			strategy: Self::default_strategy(),
			version: Self::default_version(),
		}
	}

	#[must_use]
	pub fn selector(mut self, selector: &str) -> Self {
		self.selector = Some(selector.to_owned());
		self
	}

	#[must_use]
	pub fn strategy(mut self, strategy: &str) -> Self {
		self.strategy = Some(strategy.to_owned());
		self
	}

	#[must_use]
	pub fn version(mut self, version: u32) -> Self {
		self.version = version;
		self
	}

	#[allow(clippy::unnecessary_wraps)]
	fn default_strategy() -> Option<String> {
		Some("eager".to_owned())
	}

	fn default_version() -> u32 {
		1
	}
}

type Instance = Rc<RefCell<Box<dyn Component>>>;

struct Inner {
	config: Config,
	host: Host,
	registered: RefCell<Vec<Registration>>,
	/// At most one per conductor name.
	loaded: RefCell<HashMap<String, Instance>>,
	loading: RefCell<HashSet<String>>,
}

/// Cheap to clone. Clones share their registry.
#[derive(Clone)]
pub struct Conductor {
	inner: Rc<Inner>,
}

impl core::fmt::Debug for Conductor {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Conductor")
			.field("registered", &self.inner.registered.borrow())
			.field("loading", &self.inner.loading.borrow())
			.finish()
	}
}

impl Conductor {
	/// Registers every conductor listed in `config`.
	#[must_use]
	pub fn new(config: Config, host: Host) -> Self {
		let conductors = config.conductors.clone();
		let conductor = Self {
			inner: Rc::new(Inner {
				config,
				host,
				registered: RefCell::default(),
				loaded: RefCell::default(),
				loading: RefCell::default(),
			}),
		};
		for registration in conductors {
			if let Err(error) = conductor.register(registration) {
				error!("{}", error);
			}
		}
		conductor
	}

	#[must_use]
	pub fn host(&self) -> &Host {
		&self.inner.host
	}

	#[must_use]
	pub fn registered(&self) -> Vec<Registration> {
		self.inner.registered.borrow().clone()
	}

	#[must_use]
	pub fn is_loaded(&self, conductor: &str) -> bool {
		self.inner.loaded.borrow().contains_key(conductor)
	}

	/// [`None`] if not loaded, or while that conductor is busy in one of its own lifecycle methods.
	#[must_use]
	pub fn is_mounted(&self, conductor: &str) -> Option<bool> {
		let instance = self.instance(conductor)?;
		let mounted = instance.try_borrow().ok()?.is_mounted();
		Some(mounted)
	}

	/// Runs `f` on the loaded conductor `conductor`, if any.
	///
	/// [`None`] while that conductor is busy in one of its own lifecycle methods.
	pub fn with_instance<R>(&self, conductor: &str, f: impl FnOnce(&mut dyn Component) -> R) -> Option<R> {
		let instance = self.instance(conductor)?;
		let mut instance = instance.try_borrow_mut().ok()?;
		Some(f(&mut **instance))
	}

	fn instance(&self, conductor: &str) -> Option<Instance> {
		self.inner.loaded.borrow().get(conductor).cloned()
	}

	/// Adds `registration` and evaluates it right away, so it loads even if its selector already matches.
	///
	/// Registering a name twice is ignored.
	///
	/// # Errors
	///
	/// [`Error::UnsupportedSelector`] if the document can't evaluate the registration's selector, which would never match.
	#[instrument(skip(self), fields(conductor = %registration.conductor))]
	pub fn register(&self, registration: Registration) -> Result<()> {
		if let Some(selector) = &registration.selector {
			if !self.inner.host.document.supports(selector) {
				return Err(Error::UnsupportedSelector {
					conductor: registration.conductor,
					selector: selector.clone(),
				});
			}
		}
		if self.inner.registered.borrow().iter().any(|r| r.conductor == registration.conductor) {
			warn!("Conductor {:?} is already registered.", registration.conductor);
			return Ok(());
		}
		self.inner.registered.borrow_mut().push(registration.clone());
		self.life_cycle(&registration);
		Ok(())
	}

	/// Loads, mounts, refreshes or unmounts one conductor depending on whether its selector matches now.
	pub fn life_cycle(&self, registration: &Registration) {
		let document = &self.inner.host.document;
		let name = &registration.conductor;

		if let Some(instance) = self.instance(name) {
			let selector = match &registration.selector {
				Some(selector) => selector,
				None => return,
			};
			let mut instance = match instance.try_borrow_mut() {
				Ok(instance) => instance,
				Err(_) => return trace!("Conductor {:?} is busy; leaving it be.", name),
			};
			if document.matches(selector) {
				if instance.is_mounted() {
					trace!("Refreshing conductor {:?}.", name);
					instance.refresh();
				} else {
					debug!("Remounting conductor {:?}.", name);
					instance.mount();
					instance.base_mut().set_mounted(true);
				}
			} else if instance.is_mounted() {
				debug!("Unmounting conductor {:?}.", name);
				instance.unmount();
				instance.base_mut().set_mounted(false);
			}
		} else if self.inner.loading.borrow().contains(name) {
			trace!("Conductor {:?} is still loading.", name);
		} else {
			match &registration.selector {
				Some(selector) if !document.matches(selector) => trace!("Conductor {:?} not needed yet.", name),
				_ => self.lazyload(registration),
			}
		}
	}

	fn lazyload(&self, registration: &Registration) {
		let host = &self.inner.host;
		let waits = strategy::load_strategies(registration.strategy.as_deref(), registration.selector.as_deref(), &*host.document, &*host.readiness);
		let registration = registration.clone();
		let conductor = registration.conductor.clone();
		self.inner.loading.borrow_mut().insert(conductor.clone());

		let inner = Rc::clone(&self.inner);
		let task = async move {
			join_all(waits).await;
			let name = registration.conductor;
			let version = registration.version.to_string();
			let url = inner.config.module_url(&name, &version);
			let imported = inner.host.resolver.import(&name, &version, &url).await;
			inner.loading.borrow_mut().remove(&name);

			let constructor = match imported {
				Ok(constructor) => constructor,
				Err(error) => return error!("Failed to load conductor {:?}: {}", name, error),
			};
			let base = Base::new(registration.selector, Rc::clone(&inner.host.document), inner.host.store.clone());
			let mut instance = constructor(base);
			instance.mount();
			instance.base_mut().set_mounted(true);
			debug!("Mounted conductor {:?}.", name);
			inner.loaded.borrow_mut().insert(name, Rc::new(RefCell::new(instance)));
		};

		if let Err(error) = host.spawn(task) {
			self.inner.loading.borrow_mut().remove(&conductor);
			error!("Failed to schedule conductor {:?}: {}", conductor, error);
		}
	}

	/// The swap framework settled new content into the element with id `target_id`.
	pub fn settled(&self, target_id: &str) {
		self.inner.host.swap_target.set(Some(target_id.to_owned()));
		self.mount();
	}

	/// The swap framework restored a page from history.
	pub fn history_restored(&self) {
		self.inner.host.swap_target.set(None);
		self.mount();
	}
}

impl Lifecycle for Conductor {
	/// Re-evaluates every registration.
	#[instrument(skip(self))]
	fn mount(&self) {
		for registration in self.registered() {
			self.life_cycle(&registration);
		}
	}

	/// Conductors only unmount when their selector stops matching.
	fn unmount(&self) {}
}
