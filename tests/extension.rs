mod common;

use booster_dom::{Extension, Factory};
use common::Harness;

const PAGE: &str = r#"<main id="main"><div id="a" data-booster="widget">server</div></main>"#;

fn setup() -> (Harness, common::Log, Extension<Factory>) {
	let h = Harness::new(PAGE);
	let log = h.record("widget");
	let factory = Factory::new("booster", h.config(), h.host.clone());
	let extension = Extension::new("booster", factory, h.host.clone());
	(h, log, extension)
}

#[test]
fn navigation_round_trip() {
	let (mut h, log, extension) = setup();
	extension.init();
	h.run();
	assert_eq!(log.count("mount"), 1);
	assert_eq!(extension.cache().current()["a"], r#"<div id="a" data-booster="widget">server</div>"#);

	// The component rewrites its own markup.
	h.document.set_inner_html("a", "mutated");

	extension.before_swap(r#"<html><body><main id="main"><div id="b" data-booster="widget">fresh</div></main></body></html>"#);
	assert!(extension.cache().pending().contains_key("b"));

	// The swap framework snapshots the outgoing page.
	let mut snapshot = h.document.html();
	extension.history_item_created(&mut snapshot);
	assert_eq!(snapshot, PAGE);
	assert!(extension.cache().pending().is_empty());
	assert!(extension.cache().current().contains_key("a"));
	assert!(extension.cache().current().contains_key("b"));

	h.document.set_inner_html("main", r#"<div id="b" data-booster="widget">fresh</div>"#);
	extension.after_settle("main");
	h.run();
	assert_eq!(log.of(0, "unmount"), 1);
	assert_eq!(log.count("create"), 2);
	assert_eq!(extension.lifecycle().loaded().len(), 1);

	// Back, restored from the framework's own cache: instances are left alone.
	h.document.set_inner_html("main", r#"<div id="a" data-booster="widget">server</div>"#);
	extension.history_cache_hit();
	extension.history_restore(Some(&snapshot));
	h.run();
	assert_eq!(log.count("create"), 2);

	// Restored from the server: everything in the default target is rebuilt.
	extension.history_restore(None);
	h.run();
	assert_eq!(log.count("create"), 3);
	assert_eq!(extension.lifecycle().loaded()[0].selector, "#a");
}

#[test]
fn swaps_into_other_targets() {
	let mut h = Harness::new(r#"<aside id="side"></aside><main id="main"><div id="a" data-booster="widget"></div></main>"#);
	let log = h.record("widget");
	let factory = Factory::new("booster", h.config(), h.host.clone());
	let extension = Extension::new("booster", factory, h.host.clone());
	extension.init();
	h.run();

	h.document.set_inner_html("side", r#"<div id="s" data-booster="widget"></div>"#);
	extension.after_settle("side");
	h.run();
	assert_eq!(log.count("create"), 2);
	assert_eq!(log.count("unmount"), 0);
	assert_eq!(h.host.swap_target.id(), "side");

	extension.history_restore(None);
	assert_eq!(h.host.swap_target.id(), "main");
}

#[test]
fn empty_history_items_are_ignored() {
	let (_h, _log, extension) = setup();
	extension.init();
	let mut content = String::new();
	extension.history_item_created(&mut content);
	assert!(content.is_empty());
	assert!(extension.cache().current().contains_key("a"));
}
