//! Bindings to the `htmx` global.

use super::{document::WebDocument, readiness::WebReadiness, resolver::ScriptResolver, WebSpawner};
use crate::{
	conductor::Conductor,
	config::Config,
	extension::Extension,
	factory::{Factory, Lifecycle},
	host::Host,
};
use js_sys::{Function, Object, Reflect};
use std::rc::Rc;
use tracing::{error, info, instrument, trace};
use wasm_bindgen::{closure::Closure, prelude::*, JsCast, JsValue};

#[wasm_bindgen]
extern "C" {
	#[wasm_bindgen(catch, js_namespace = htmx, js_name = defineExtension)]
	fn define_extension(name: &str, extension: &Object) -> Result<(), JsValue>;

	#[wasm_bindgen(catch, js_namespace = htmx, js_name = on)]
	fn on(event: &str, handler: &Function) -> Result<(), JsValue>;
}

/// Follows `path` through nested properties. Missing links yield `undefined`.
fn get(value: &JsValue, path: &[&str]) -> JsValue {
	path.iter().fold(value.clone(), |value, key| {
		if value.is_object() {
			Reflect::get(&value, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
		} else {
			JsValue::UNDEFINED
		}
	})
}

fn target_id(event: &JsValue) -> Option<String> {
	get(event, &["target", "id"]).as_string()
}

/// Registers `extension` with `htmx.defineExtension`.
///
/// The callbacks live as long as the page.
#[instrument(skip(extension))]
pub fn install<L: Lifecycle + 'static>(name: &str, extension: Rc<Extension<L>>) -> Result<(), JsValue> {
	let definition = Object::new();

	let initialize = {
		let extension = Rc::clone(&extension);
		Closure::wrap(Box::new(move |_api: JsValue| init(&extension)) as Box<dyn FnMut(JsValue)>)
	};
	Reflect::set(&definition, &JsValue::from_str("init"), &initialize.into_js_value())?;

	let handle = Closure::wrap(Box::new(move |name: String, event: JsValue| {
		on_event(&extension, &name, &event);
		true
	}) as Box<dyn FnMut(String, JsValue) -> bool>);
	Reflect::set(&definition, &JsValue::from_str("onEvent"), &handle.into_js_value())?;

	define_extension(name, &definition)
}

/// Mounts right away. Seeds the history cache once the document is parsed, so it sees server markup.
fn init<L: Lifecycle + 'static>(extension: &Rc<Extension<L>>) {
	extension.mount();

	let document = match WebDocument::current() {
		Some(document) => document,
		None => return error!("No document to seed the history cache from."),
	};
	let extension = Rc::clone(extension);
	when_parsed(document.inner(), move || extension.seed_cache());
}

/// Runs `f` now if `document` is parsed already (`readyState` past `"loading"`), otherwise on `DOMContentLoaded`.
pub fn when_parsed(document: &web_sys::Document, f: impl FnOnce() + 'static) {
	if document.ready_state() != "loading" {
		return f();
	}

	let callback = Closure::once_into_js(f);
	if let Err(error) = document.add_event_listener_with_callback("DOMContentLoaded", callback.unchecked_ref()) {
		error!("Failed to wait for DOMContentLoaded: {:?}", error);
	}
}

fn on_event<L: Lifecycle>(extension: &Extension<L>, name: &str, event: &JsValue) {
	match name {
		"htmx:beforeSwap" => {
			if let Some(response) = get(event, &["detail", "xhr", "response"]).as_string() {
				extension.before_swap(&response);
			}
		}
		"htmx:afterSettle" => match target_id(event) {
			Some(id) => extension.after_settle(&id),
			None => trace!("Settled target has no id."),
		},
		"htmx:historyItemCreated" => {
			let item = get(event, &["detail", "item"]);
			if let Some(mut content) = get(&item, &["content"]).as_string() {
				extension.history_item_created(&mut content);
				if let Err(error) = Reflect::set(&item, &JsValue::from_str("content"), &JsValue::from_str(&content)) {
					error!("Failed to rewrite the history item: {:?}", error);
				}
			}
		}
		"htmx:historyCacheHit" => extension.history_cache_hit(),
		"htmx:historyRestore" => {
			let content = get(event, &["detail", "item", "content"]).as_string();
			extension.history_restore(content.as_deref());
		}
		_ => (),
	}
}

/// Subscribes `conductor` to `htmx:afterSettle` and `htmx:historyRestore`.
pub fn install_conductor(conductor: &Conductor) -> Result<(), JsValue> {
	let settled = {
		let conductor = conductor.clone();
		Closure::wrap(Box::new(move |event: JsValue| match target_id(&event) {
			Some(id) => conductor.settled(&id),
			None => conductor.mount(),
		}) as Box<dyn FnMut(JsValue)>)
	};
	on("htmx:afterSettle", settled.into_js_value().unchecked_ref())?;

	let restored = {
		let conductor = conductor.clone();
		Closure::wrap(Box::new(move |_event: JsValue| conductor.history_restored()) as Box<dyn FnMut(JsValue)>)
	};
	on("htmx:historyRestore", restored.into_js_value().unchecked_ref())
}

/// A [`Host`] on the current page, with the [`Config`] from its `<meta name="{extension}-config">`.
pub fn host(extension: &str) -> Result<(Config, Host), JsValue> {
	let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
	let document = WebDocument::current().ok_or_else(|| JsValue::from_str("no document"))?;
	let readiness = WebReadiness::new().ok_or_else(|| JsValue::from_str("no document"))?;
	let origin = window.location().origin()?;
	let config = Config::from_document(&document, extension, &origin).map_err(|error| JsValue::from_str(&error.to_string()))?;
	let host = Host::new(Rc::new(document), Rc::new(readiness), Rc::new(ScriptResolver::new()), Rc::new(WebSpawner));
	Ok((config, host))
}

/// Sets up a [`Factory`] as the htmx extension `name`.
pub fn boot(name: &str) -> Result<Rc<Extension<Factory>>, JsValue> {
	let (config, host) = host(name)?;
	let factory = Factory::new(name, config, host.clone());
	let extension = Rc::new(Extension::new(name, factory, host));
	install(name, Rc::clone(&extension))?;
	info!("Booted extension {:?}.", name);
	Ok(extension)
}

/// Sets up a [`Conductor`] with the conductors configured for `extension`.
pub fn boot_conductor(extension: &str) -> Result<Conductor, JsValue> {
	let (config, host) = host(extension)?;
	let conductor = Conductor::new(config, host);
	install_conductor(&conductor)?;
	info!("Booted conductor for {:?}.", extension);
	Ok(conductor)
}
