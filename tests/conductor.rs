mod common;

use booster_dom::{Base, Component, Conductor, Config, Error, Lifecycle, Registration};
use common::{Harness, ORIGIN};
use std::{cell::RefCell, rc::Rc};

#[test]
fn loads_once_the_selector_matches() {
	let mut h = Harness::new(r#"<main id="main"></main>"#);
	let log = h.record("menu");
	let conductor = Conductor::new(h.config(), h.host.clone());

	conductor.register(Registration::new("menu").selector("#missing")).unwrap();
	h.run();
	assert!(!conductor.is_loaded("menu"));
	assert_eq!(conductor.is_mounted("menu"), None);
	assert!(h.registry.imports().is_empty());

	h.document.append_html(Some("main"), r#"<div id="missing"></div>"#);
	conductor.settled("main");
	conductor.settled("main");
	h.run();
	assert!(conductor.is_loaded("menu"));
	assert_eq!(conductor.is_mounted("menu"), Some(true));

	conductor.settled("main");
	h.run();
	assert_eq!(h.registry.imports(), [format!("{}/scripts/boosts/menu.js?v=1", ORIGIN)]);
	assert_eq!(log.count("create"), 1);
}

#[test]
fn follows_its_selector() {
	let mut h = Harness::new(r#"<main id="main"><nav id="nav"></nav></main>"#);
	let log = h.record("menu");
	let conductor = Conductor::new(h.config(), h.host.clone());
	conductor.register(Registration::new("menu").selector("#nav").version(2)).unwrap();
	h.run();
	assert_eq!(conductor.is_mounted("menu"), Some(true));
	assert_eq!(log.count("mount"), 1);

	// Still there: refreshed.
	conductor.settled("main");
	assert_eq!(log.count("unmount"), 1);
	assert_eq!(log.count("mount"), 2);

	h.document.remove("nav");
	conductor.history_restored();
	assert_eq!(conductor.is_mounted("menu"), Some(false));
	assert_eq!(log.count("unmount"), 2);

	// Gone stays gone.
	conductor.settled("main");
	assert_eq!(log.count("unmount"), 2);

	h.document.append_html(Some("main"), r#"<nav id="nav"></nav>"#);
	conductor.settled("main");
	assert_eq!(conductor.is_mounted("menu"), Some(true));
	assert_eq!(log.count("mount"), 3);
	assert_eq!(log.count("create"), 1);
	assert_eq!(h.registry.imports(), [format!("{}/scripts/boosts/menu.js?v=2", ORIGIN)]);
}

#[test]
fn without_selector_loads_right_away() {
	let mut h = Harness::new(r#"<main id="main"></main>"#);
	let log = h.record("analytics");
	let conductor = Conductor::new(h.config(), h.host.clone());
	conductor.register(Registration::new("analytics")).unwrap();
	h.run();
	assert_eq!(conductor.is_mounted("analytics"), Some(true));

	h.document.remove("main");
	conductor.settled("main");
	conductor.history_restored();
	h.run();
	assert_eq!(conductor.is_mounted("analytics"), Some(true));
	assert_eq!(log.count("mount"), 1);
	assert_eq!(log.count("unmount"), 0);
}

#[test]
fn strategies_delay_loading() {
	let mut h = Harness::new(r#"<main id="main"></main>"#);
	let log = h.record("chat");
	let conductor = Conductor::new(h.config(), h.host.clone());
	conductor.register(Registration::new("chat").strategy("idle")).unwrap();
	h.run();
	assert!(!conductor.is_loaded("chat"));

	// Still loading, so not requested again.
	conductor.mount();
	h.run();
	assert_eq!(h.readiness.go_idle(), 1);
	h.run();
	assert!(conductor.is_loaded("chat"));
	assert_eq!(log.count("create"), 1);
}

#[test]
fn duplicates_are_ignored() {
	let mut h = Harness::new(r#"<main id="main"></main>"#);
	h.record("menu");
	let conductor = Conductor::new(h.config(), h.host.clone());
	conductor.register(Registration::new("menu")).unwrap();
	conductor.register(Registration::new("menu").selector("#other")).unwrap();
	h.run();
	assert_eq!(conductor.registered(), [Registration::new("menu")]);
	assert_eq!(h.registry.imports().len(), 1);
}

#[test]
fn configured_conductors() {
	let mut h = Harness::new(r#"<main id="main"><nav id="nav"></nav></main>"#);
	let log = h.record("menu");
	let mut config = Config::new(ORIGIN);
	config.apply_json(r##"{"conductors": [{"conductor": "menu", "selector": "#nav"}, {"conductor": "footer", "selector": "#footer"}]}"##).unwrap();

	let conductor = Conductor::new(config, h.host.clone());
	h.run();
	assert_eq!(conductor.registered().len(), 2);
	assert!(conductor.is_loaded("menu"));
	assert!(!conductor.is_loaded("footer"));
	assert_eq!(log.count("mount"), 1);
}

#[test]
fn failed_imports_can_be_retried() {
	let mut h = Harness::new(r#"<main id="main"></main>"#);
	let conductor = Conductor::new(h.config(), h.host.clone());
	conductor.register(Registration::new("late")).unwrap();
	h.run();
	assert!(!conductor.is_loaded("late"));

	let log = h.record("late");
	conductor.mount();
	h.run();
	assert!(conductor.is_loaded("late"));
	assert_eq!(log.count("create"), 1);
	assert_eq!(h.registry.imports().len(), 2);
}

#[test]
fn combinator_selectors() {
	let mut h = Harness::new(r#"<main id="main"><nav id="n" class="menu"></nav></main>"#);
	h.record("menu");
	let conductor = Conductor::new(h.config(), h.host.clone());
	conductor.register(Registration::new("menu").selector("main > .menu")).unwrap();
	h.run();
	assert_eq!(conductor.is_mounted("menu"), Some(true));

	h.document.set_inner_html("main", r#"<div><nav class="menu"></nav></div>"#);
	conductor.settled("main");
	assert_eq!(conductor.is_mounted("menu"), Some(false));
}

#[test]
fn unsupported_selectors_are_rejected() {
	let mut h = Harness::new(r#"<main id="main"></main><nav class="menu"></nav>"#);
	h.record("menu");
	let conductor = Conductor::new(h.config(), h.host.clone());
	match conductor.register(Registration::new("menu").selector("main + .menu")) {
		Err(Error::UnsupportedSelector { conductor, selector }) => {
			assert_eq!(conductor, "menu");
			assert_eq!(selector, "main + .menu");
		}
		other => panic!("expected an unsupported selector, got {:?}", other),
	}
	h.run();
	assert!(conductor.registered().is_empty());
	assert!(h.registry.imports().is_empty());
}

#[test]
fn visible_without_selector_loads_right_away() {
	let mut h = Harness::new(r#"<main id="main"></main>"#);
	h.record("tracker");
	let conductor = Conductor::new(h.config(), h.host.clone());
	conductor.register(Registration::new("tracker").strategy("visible")).unwrap();
	h.run();
	assert!(conductor.is_loaded("tracker"));
	assert!(h.readiness.observed().is_empty());
}

/// Looks itself up through the conductor whenever it's refreshed.
struct Curious {
	base: Base,
	conductor: Rc<RefCell<Option<Conductor>>>,
	seen: Rc<RefCell<Vec<Option<bool>>>>,
}

impl Component for Curious {
	fn base(&self) -> &Base {
		&self.base
	}

	fn base_mut(&mut self) -> &mut Base {
		&mut self.base
	}

	fn refresh(&mut self) {
		if let Some(conductor) = self.conductor.borrow().as_ref() {
			self.seen.borrow_mut().push(conductor.is_mounted("curious"));
			self.seen.borrow_mut().push(conductor.with_instance("curious", |instance| instance.is_mounted()));
			conductor.mount();
		}
	}
}

#[test]
fn conductors_may_call_back_in() {
	let mut h = Harness::new(r#"<main id="main"><nav id="nav"></nav></main>"#);
	let handle = Rc::new(RefCell::new(None));
	let seen = Rc::new(RefCell::new(Vec::new()));
	{
		let (handle, seen) = (Rc::clone(&handle), Rc::clone(&seen));
		h.registry.define("curious", move |base| Curious {
			base,
			conductor: Rc::clone(&handle),
			seen: Rc::clone(&seen),
		});
	}

	let conductor = Conductor::new(h.config(), h.host.clone());
	*handle.borrow_mut() = Some(conductor.clone());
	conductor.register(Registration::new("curious").selector("#nav")).unwrap();
	h.run();

	conductor.settled("main");
	assert_eq!(*seen.borrow(), [None, None]);
	assert_eq!(conductor.is_mounted("curious"), Some(true));
	assert_eq!(conductor.with_instance("curious", |instance| instance.is_mounted()), Some(true));

	// Break the cycle through the registry.
	handle.borrow_mut().take();
}
