use crate::{
	dom::Document,
	state::{Map, Scope, State, StateStore},
	Error, Result,
};
use core::{any, fmt};
use serde_json::Value;
use std::rc::Rc;
use tracing::{error, trace};

/// What every component carries: its anchor, options, lifecycle flag and state.
pub struct Base {
	selector: Option<String>,
	mounted: bool,
	options: Map,
	state: State,
	document: Rc<dyn Document>,
}

impl fmt::Debug for Base {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Base")
			.field("selector", &self.selector)
			.field("mounted", &self.mounted)
			.field("options", &self.options)
			.field("state", &self.state)
			.finish()
	}
}

impl Base {
	#[must_use]
	pub fn new(selector: Option<String>, document: Rc<dyn Document>, store: StateStore) -> Self {
		Self {
			selector,
			mounted: false,
			options: Map::new(),
			state: State::new(store),
			document,
		}
	}

	/// The anchor element's selector, `#{id}` for placeholders. Conductors may have none.
	#[must_use]
	pub fn selector(&self) -> Option<&str> {
		self.selector.as_deref()
	}

	#[must_use]
	pub fn anchor_id(&self) -> Option<&str> {
		self.selector.as_deref().and_then(|selector| selector.strip_prefix('#'))
	}

	#[must_use]
	pub fn is_mounted(&self) -> bool {
		self.mounted
	}

	pub fn set_mounted(&mut self, mounted: bool) {
		self.mounted = mounted;
	}

	#[must_use]
	pub fn document(&self) -> &Rc<dyn Document> {
		&self.document
	}

	#[must_use]
	pub fn state(&self) -> &State {
		&self.state
	}

	pub fn state_mut(&mut self) -> &mut State {
		&mut self.state
	}

	/// The options resolved so far.
	#[must_use]
	pub fn options(&self) -> &Map {
		&self.options
	}

	/// Merges, in increasing priority, the options resolved so far, `defaults` and the anchor's `data-options` JSON object.
	///
	/// # Errors
	///
	/// Iff `data-options` is present but not a JSON object. The options are left unchanged in that case.
	pub fn resolve_options(&mut self, defaults: Map) -> Result<&Map> {
		let from_attribute = match self.selector.as_deref() {
			Some(selector) => match self.document.attribute(selector, "data-options") {
				Some(json) => serde_json::from_str::<Map>(&json).map_err(|source| {
					#[cfg(feature = "dangerous-logging")]
					error!("Malformed options {:?} on {}: {}", json, selector, source);
					#[cfg(not(feature = "dangerous-logging"))]
					error!("Malformed options on {}: {}", selector, source);
					Error::Options {
						selector: selector.to_owned(),
						source,
					}
				})?,
				None => Map::new(),
			},
			None => Map::new(),
		};

		self.options.extend(defaults);
		self.options.extend(from_attribute);
		trace!(selector = ?self.selector, "Options resolved.");
		Ok(&self.options)
	}

	/// A single option, after [`Base::resolve_options`].
	#[must_use]
	pub fn option(&self, key: &str) -> Option<&Value> {
		self.options.get(key)
	}
}

/// A lazily loaded unit of behaviour bound to one anchor element.
///
/// Constructing an implementor must not touch the page: the factory calls [`Component::mount`] once it's registered.
pub trait Component {
	fn base(&self) -> &Base;
	fn base_mut(&mut self) -> &mut Base;

	fn mount(&mut self) {}

	/// Must release everything `mount` acquired (listeners, timers, injected markup) before returning.
	fn unmount(&mut self) {}

	fn refresh(&mut self) {
		self.unmount();
		self.mount();
	}

	/// Receives the effective change set of each [`Component::set_state`] call.
	fn state_change(&mut self, _changes: &Map) {}

	/// The key of this type's [`Scope::Component`] bucket.
	///
	/// Defaults to the fully qualified type name, so only instances of the same type share a bucket.
	fn type_name(&self) -> &'static str {
		any::type_name::<Self>()
	}

	fn is_mounted(&self) -> bool {
		self.base().is_mounted()
	}

	fn set_state(&mut self, scope: Scope, changes: Map) {
		let component = self.type_name();
		let delta = self.base_mut().state_mut().set(component, scope, changes);
		self.state_change(&delta);
	}

	fn get_state(&self, scope: Scope, defaults: Map) -> Map {
		self.base().state().get(self.type_name(), scope, defaults)
	}

	fn destroy_state(&mut self, scope: Scope) {
		let component = self.type_name();
		self.base_mut().state_mut().destroy(component, scope);
	}
}
