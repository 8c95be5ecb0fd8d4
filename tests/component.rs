mod common;

use booster_dom::{dom::memory::MemoryDocument, state::Value, Base, Component, Error, Map, Scope, StateStore};
use serde_json::json;
use std::rc::Rc;

fn map(value: Value) -> Map {
	match value {
		Value::Object(map) => map,
		_ => unreachable!(),
	}
}

#[derive(Debug)]
struct Foo {
	base: Base,
	changes: Vec<Map>,
}

impl Component for Foo {
	fn base(&self) -> &Base {
		&self.base
	}

	fn base_mut(&mut self) -> &mut Base {
		&mut self.base
	}

	fn state_change(&mut self, changes: &Map) {
		self.changes.push(changes.clone());
	}
}

#[derive(Debug)]
struct Bar {
	base: Base,
}

impl Component for Bar {
	fn base(&self) -> &Base {
		&self.base
	}

	fn base_mut(&mut self) -> &mut Base {
		&mut self.base
	}
}

struct Renamed {
	base: Base,
}

impl Component for Renamed {
	fn base(&self) -> &Base {
		&self.base
	}

	fn base_mut(&mut self) -> &mut Base {
		&mut self.base
	}

	fn type_name(&self) -> &'static str {
		"Foo"
	}
}

fn base(document: &Rc<MemoryDocument>, store: &StateStore, selector: &str) -> Base {
	Base::new(Some(selector.to_owned()), document.clone(), store.clone())
}

#[test]
fn component_state_is_shared_by_type() {
	common::init_logging();
	let document = Rc::new(MemoryDocument::new());
	let store = StateStore::new();
	let mut first = Foo {
		base: base(&document, &store, "#a"),
		changes: Vec::new(),
	};
	let second = Foo {
		base: base(&document, &store, "#b"),
		changes: Vec::new(),
	};
	let other = Bar {
		base: base(&document, &store, "#c"),
	};

	first.set_state(Scope::Component, map(json!({"open": true})));
	first.set_state(Scope::Component, map(json!({"open": true, "count": 1})));
	assert_eq!(first.changes, [map(json!({"open": true})), map(json!({"count": 1}))]);

	assert_eq!(Value::Object(second.get_state(Scope::Component, Map::new())), json!({"open": true, "count": 1}));
	assert_eq!(Value::Object(second.get_state(Scope::Local, Map::new())), json!({}));
	assert_eq!(Value::Object(other.get_state(Scope::Component, map(json!({"open": false})))), json!({"open": false}));
	assert_eq!(Value::Object(store.component(first.type_name())), json!({"open": true, "count": 1}));
}

#[test]
fn component_state_outlives_instances() {
	let document = Rc::new(MemoryDocument::new());
	let store = StateStore::new();
	{
		let mut renamed = Renamed {
			base: base(&document, &store, "#a"),
		};
		renamed.set_state(Scope::Component, map(json!({"seen": 1})));
		renamed.set_state(Scope::Global, map(json!({"theme": "dark"})));
	}

	let fresh = Renamed {
		base: base(&document, &store, "#a"),
	};
	assert_eq!(Value::Object(fresh.get_state(Scope::Component, Map::new())), json!({"seen": 1}));
	assert_eq!(Value::Object(store.component("Foo")), json!({"seen": 1}));

	let mut bar = Bar {
		base: base(&document, &store, "#b"),
	};
	assert_eq!(Value::Object(bar.get_state(Scope::Global, Map::new())), json!({"theme": "dark"}));
	bar.destroy_state(Scope::Global);
	assert!(fresh.get_state(Scope::Global, Map::new()).is_empty());
}

#[test]
fn unchanged_state_is_not_reported() {
	let document = Rc::new(MemoryDocument::new());
	let mut foo = Foo {
		base: base(&document, &StateStore::new(), "#a"),
		changes: Vec::new(),
	};
	foo.set_state(Scope::Local, map(json!({"items": [1, 2]})));
	foo.set_state(Scope::Local, map(json!({"items": [1, 2]})));
	foo.set_state(Scope::Local, map(json!({"items": []})));
	assert_eq!(foo.changes, [map(json!({"items": [1, 2]})), Map::new(), Map::new()]);
	assert_eq!(Value::Object(foo.get_state(Scope::Local, Map::new())), json!({"items": []}));
}

#[test]
fn options_come_from_the_anchor() {
	let document = Rc::new(MemoryDocument::parse(
		r#"<div id="a" data-options='{"delay": 5, "label": "hi"}'></div><div id="b" data-options="nope"></div>"#,
	));
	let store = StateStore::new();

	let mut a = base(&document, &store, "#a");
	let options = a.resolve_options(map(json!({"delay": 1, "loop": false}))).unwrap();
	assert_eq!(Value::Object(options.clone()), json!({"delay": 5, "label": "hi", "loop": false}));
	assert_eq!(a.option("label"), Some(&json!("hi")));

	let mut b = base(&document, &store, "#b");
	match b.resolve_options(Map::new()) {
		Err(Error::Options { selector, .. }) => assert_eq!(selector, "#b"),
		other => panic!("expected an options error, got {:?}", other),
	}
	assert!(b.options().is_empty());

	let mut detached = Base::new(None, document, store);
	assert_eq!(Value::Object(detached.resolve_options(map(json!({"x": 1}))).unwrap().clone()), json!({"x": 1}));
	assert_eq!(detached.anchor_id(), None);
	assert_eq!(a.anchor_id(), Some("a"));
}
