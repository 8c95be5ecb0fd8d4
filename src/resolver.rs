//! How a component name turns into something that can be instantiated.

use crate::{
	component::{Base, Component},
	Error, Result,
};
use core::cell::RefCell;
use futures::future::{self, FutureExt, LocalBoxFuture};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::debug;

/// Builds an unmounted instance anchored as described by the given [`Base`].
pub type Constructor = Rc<dyn Fn(Base) -> Box<dyn Component>>;

pub trait Resolver {
	/// Fetches the module for component `name` at `version`.
	///
	/// `url` is where the configuration says the module lives. Resolvers that don't fetch anything may ignore it.
	fn import(&self, name: &str, version: &str, url: &str) -> LocalBoxFuture<'static, Result<Constructor>>;
}

/// A fixed set of components compiled into the binary.
///
/// Clones share the same definitions.
#[derive(Clone, Default)]
pub struct Registry {
	modules: Rc<RefCell<HashMap<String, Constructor>>>,
	imports: Rc<RefCell<Vec<String>>>,
}

impl Registry {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes `constructor` available as `name`, replacing any earlier definition.
	pub fn define<C, F>(&self, name: &str, constructor: F) -> &Self
	where
		C: Component + 'static,
		F: Fn(Base) -> C + 'static,
	{
		let constructor: Constructor = Rc::new(move |base| Box::new(constructor(base)) as Box<dyn Component>);
		self.modules.borrow_mut().insert(name.to_owned(), constructor);
		self
	}

	/// The URLs of all imports so far, in order.
	#[must_use]
	pub fn imports(&self) -> Vec<String> {
		self.imports.borrow().clone()
	}
}

impl Resolver for Registry {
	fn import(&self, name: &str, version: &str, url: &str) -> LocalBoxFuture<'static, Result<Constructor>> {
		debug!(name, version, url, "Importing.");
		self.imports.borrow_mut().push(url.to_owned());
		let module = self.modules.borrow().get(name).cloned().ok_or_else(|| Error::UnknownComponent { name: name.to_owned() });
		future::ready(module).boxed_local()
	}
}
