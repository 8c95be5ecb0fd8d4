//! Local, per-component and global state with minimal change sets.

use core::cell::RefCell;
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::trace;

pub use serde_json::{Map as JsonMap, Value};

pub type Map = JsonMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
	/// Private to one instance.
	Local,
	/// Shared by every instance of one component type, across unmounts.
	Component,
	/// Shared by everything using the same [`StateStore`].
	Global,
}

impl Default for Scope {
	fn default() -> Self {
		Self::Local
	}
}

#[derive(Debug, Default)]
struct Shared {
	components: HashMap<String, Map>,
	global: Map,
}

/// The component and global scopes.
///
/// Clones share the same state. Instances only see each other's shared state if they were created against the same store.
#[derive(Debug, Clone, Default)]
pub struct StateStore(Rc<RefCell<Shared>>);

impl StateStore {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// A snapshot of the bucket for component type `component`. Empty if never written.
	#[must_use]
	pub fn component(&self, component: &str) -> Map {
		self.0.borrow().components.get(component).cloned().unwrap_or_default()
	}

	#[must_use]
	pub fn global(&self) -> Map {
		self.0.borrow().global.clone()
	}
}

/// One instance's view of the three scopes.
#[derive(Debug, Default)]
pub struct State {
	local: Map,
	store: StateStore,
}

impl State {
	#[must_use]
	pub fn new(store: StateStore) -> Self {
		Self { local: Map::new(), store }
	}

	#[must_use]
	pub fn store(&self) -> &StateStore {
		&self.store
	}

	/// Applies `changes` to `scope` and returns what actually changed. See [`merge`].
	///
	/// `component` names the bucket used for [`Scope::Component`].
	pub fn set(&mut self, component: &str, scope: Scope, changes: Map) -> Map {
		let delta = match scope {
			Scope::Local => merge(&mut self.local, changes),
			Scope::Component => {
				let mut shared = self.store.0.borrow_mut();
				merge(shared.components.entry(component.to_owned()).or_default(), changes)
			}
			Scope::Global => merge(&mut self.store.0.borrow_mut().global, changes),
		};
		trace!(?scope, changed = delta.len(), "State set.");
		delta
	}

	/// `defaults`, overridden by whatever `scope` holds.
	#[must_use]
	pub fn get(&self, component: &str, scope: Scope, defaults: Map) -> Map {
		let mut result = defaults;
		let mut overlay = |map: &Map| {
			for (key, value) in map {
				result.insert(key.clone(), value.clone());
			}
		};
		match scope {
			Scope::Local => overlay(&self.local),
			Scope::Component => {
				if let Some(bucket) = self.store.0.borrow().components.get(component) {
					overlay(bucket);
				}
			}
			Scope::Global => overlay(&self.store.0.borrow().global),
		}
		result
	}

	pub fn destroy(&mut self, component: &str, scope: Scope) {
		match scope {
			Scope::Local => self.local = Map::new(),
			Scope::Component => {
				if let Some(bucket) = self.store.0.borrow_mut().components.get_mut(component) {
					bucket.clear();
				}
			}
			Scope::Global => self.store.0.borrow_mut().global = Map::new(),
		}
	}
}

/// Merges `changes` into `target`, returning the change set.
///
/// - Arrays replace arrays wholesale, but only if the length or at least one element differs.
/// - Objects merge one level deep into an existing object, and only differing keys are reported.
///   Over a non-object, the whole new object counts as changed.
/// - Anything else replaces the old value iff it differs.
///
/// Empty arrays and objects are dropped from the change set, as they carry no effective change.
pub fn merge(target: &mut Map, changes: Map) -> Map {
	let mut delta = Map::new();
	for (key, new) in changes {
		let change = match (target.get(&key), &new) {
			(Some(Value::Array(old)), Value::Array(new_items)) => {
				(old.len() != new_items.len() || old.iter().zip(new_items).any(|(a, b)| a != b)).then(|| new.clone())
			}
			(_, Value::Array(_)) => Some(new.clone()),
			(Some(Value::Object(old)), Value::Object(new_fields)) => Some(Value::Object(
				new_fields
					.iter()
					.filter(|(field, value)| old.get(*field) != Some(*value))
					.map(|(field, value)| (field.clone(), value.clone()))
					.collect(),
			)),
			(_, Value::Object(_)) => Some(new.clone()),
			(old, new) => (old != Some(new)).then(|| new.clone()),
		};

		if let Some(change) = change {
			let merged = match (target.get(&key), &change) {
				(Some(Value::Object(old)), Value::Object(fields)) => {
					let mut merged = old.clone();
					merged.extend(fields.clone());
					Value::Object(merged)
				}
				_ => change.clone(),
			};
			target.insert(key.clone(), merged);
			delta.insert(key, change);
		}
	}

	delta
		.into_iter()
		.filter(|(_, change)| match change {
			Value::Array(items) => !items.is_empty(),
			Value::Object(fields) => !fields.is_empty(),
			_ => true,
		})
		.collect()
}
