use crate::readiness::Readiness;
use core::cell::RefCell;
use futures::{
	channel::oneshot,
	future::{self, FutureExt, LocalBoxFuture},
};
use js_sys::{Array, Function, Reflect};
use std::rc::Rc;
use tracing::{error, trace};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{AddEventListenerOptions, EventTarget, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit, Window};

/// Milliseconds to wait where `requestIdleCallback` isn't available.
pub const IDLE_FALLBACK_DELAY: i32 = 200;

/// [`Readiness`] through the browser's own events and observers.
#[derive(Debug, Clone)]
pub struct WebReadiness {
	window: Window,
	document: web_sys::Document,
}

fn ready() -> LocalBoxFuture<'static, ()> {
	future::ready(()).boxed_local()
}

/// A one-shot JS callback and the future it resolves. The callback frees itself when called.
fn once() -> (JsValue, LocalBoxFuture<'static, ()>) {
	let (sender, receiver) = oneshot::channel::<()>();
	let callback = Closure::once_into_js(move || {
		sender.send(()).ok();
	});
	(callback, receiver.map(drop).boxed_local())
}

fn listen_once(target: &EventTarget, event: &str) -> LocalBoxFuture<'static, ()> {
	let (callback, resolved) = once();
	let mut options = AddEventListenerOptions::new();
	options.once(true);
	match target.add_event_listener_with_callback_and_add_event_listener_options(event, callback.unchecked_ref(), &options) {
		Ok(()) => resolved,
		Err(error) => {
			error!("Failed to listen for {:?}: {:?}", event, error);
			ready()
		}
	}
}

impl WebReadiness {
	#[must_use]
	pub fn new() -> Option<Self> {
		let window = web_sys::window()?;
		let document = window.document()?;
		Some(Self { window, document })
	}
}

impl Readiness for WebReadiness {
	fn event(&self, topic: &str) -> LocalBoxFuture<'static, ()> {
		match self.document.body() {
			Some(body) => listen_once(&body, topic),
			None => ready(),
		}
	}

	fn idle(&self) -> LocalBoxFuture<'static, ()> {
		let (callback, resolved) = once();
		let callback: &Function = callback.unchecked_ref();
		let scheduled = if Reflect::has(&self.window, &JsValue::from_str("requestIdleCallback")).unwrap_or(false) {
			self.window.request_idle_callback(callback).map(drop)
		} else {
			self.window.set_timeout_with_callback_and_timeout_and_arguments_0(callback, IDLE_FALLBACK_DELAY).map(drop)
		};
		match scheduled {
			Ok(()) => resolved,
			Err(error) => {
				error!("Failed to wait for idle: {:?}", error);
				ready()
			}
		}
	}

	fn media(&self, query: &str) -> LocalBoxFuture<'static, ()> {
		match self.window.match_media(query) {
			Ok(Some(list)) if list.matches() => ready(),
			Ok(Some(list)) => listen_once(&list, "change"),
			Ok(None) => ready(),
			Err(error) => {
				error!("Invalid media query {:?}: {:?}", query, error);
				ready()
			}
		}
	}

	fn visible(&self, selector: &str, root_margin: &str) -> LocalBoxFuture<'static, ()> {
		let element = match self.document.query_selector(selector) {
			Ok(Some(element)) => element,
			_ => return ready(),
		};

		let (sender, receiver) = oneshot::channel::<()>();
		let sender = Rc::new(RefCell::new(Some(sender)));
		let callback = Closure::wrap(Box::new(move |entries: Array, observer: IntersectionObserver| {
			let intersecting = entries.get(0).dyn_into::<IntersectionObserverEntry>().map_or(false, |entry| entry.is_intersecting());
			if intersecting {
				observer.disconnect();
				if let Some(sender) = sender.borrow_mut().take() {
					sender.send(()).ok();
				}
			}
		}) as Box<dyn FnMut(Array, IntersectionObserver)>);

		let mut options = IntersectionObserverInit::new();
		options.root_margin(root_margin);
		let observer = match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options) {
			Ok(observer) => observer,
			Err(error) => {
				error!("Failed to observe {:?} with root margin {:?}: {:?}", selector, root_margin, error);
				return ready();
			}
		};
		observer.observe(&element);
		trace!("Observing {:?}.", selector);

		async move {
			receiver.await.ok();
			// Disconnected by now, so nothing calls back into the dropped closure.
			drop(observer);
			drop(callback);
		}
		.boxed_local()
	}
}
