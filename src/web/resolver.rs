use crate::{
	component::{Base, Component},
	resolver::{Constructor, Resolver},
	Error, Result,
};
use futures::future::{FutureExt, LocalBoxFuture};
use js_sys::{Array, Function, Promise, Reflect};
use std::rc::Rc;
use tracing::{debug, error};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

/// Resolves components through a dynamic `import()` of the configured module URL.
///
/// The module's default export must be a class taking the anchor selector, with `mount()` and `unmount()` methods.
#[derive(Debug, Clone)]
pub struct ScriptResolver {
	import: Function,
}

impl Default for ScriptResolver {
	fn default() -> Self {
		Self::new()
	}
}

impl ScriptResolver {
	#[must_use]
	pub fn new() -> Self {
		Self {
			import: Function::new_with_args("url", "return import(url)"),
		}
	}
}

impl Resolver for ScriptResolver {
	fn import(&self, name: &str, version: &str, url: &str) -> LocalBoxFuture<'static, Result<Constructor>> {
		debug!(name, version, url, "Importing script.");
		let promise = self.import.call1(&JsValue::NULL, &JsValue::from_str(url));
		let url = url.to_owned();
		async move {
			let failed = |error: JsValue| Error::Import {
				url: url.clone(),
				reason: format!("{:?}", error),
			};
			let module = JsFuture::from(Promise::resolve(&promise.map_err(failed)?)).await.map_err(failed)?;
			let class = Reflect::get(&module, &JsValue::from_str("default"))
				.ok()
				.and_then(|class| class.dyn_into::<Function>().ok())
				.ok_or_else(|| Error::Import {
					url: url.clone(),
					reason: "the module has no default export class".to_owned(),
				})?;
			let constructor: Constructor = Rc::new(move |base| Box::new(JsComponent::new(&class, base)) as Box<dyn Component>);
			Ok::<_, Error>(constructor)
		}
		.boxed_local()
	}
}

/// A component implemented as a JavaScript class.
///
/// JavaScript components conventionally mount themselves from their constructor, so the first [`Component::mount`] only flags the instance as mounted.
#[derive(Debug)]
pub struct JsComponent {
	base: Base,
	instance: JsValue,
	mounted_by_constructor: bool,
}

impl JsComponent {
	#[must_use]
	pub fn new(class: &Function, base: Base) -> Self {
		let selector = base.selector().map_or(JsValue::NULL, JsValue::from_str);
		let instance = Reflect::construct(class, &Array::of1(&selector)).unwrap_or_else(|error| {
			error!("Constructing a component for {:?} threw: {:?}", base.selector(), error);
			JsValue::UNDEFINED
		});
		Self {
			base,
			instance,
			mounted_by_constructor: true,
		}
	}

	/// The JavaScript instance.
	#[must_use]
	pub fn instance(&self) -> &JsValue {
		&self.instance
	}

	fn call(&self, method: &str) {
		let function = match Reflect::get(&self.instance, &JsValue::from_str(method)).ok().and_then(|f| f.dyn_into::<Function>().ok()) {
			Some(function) => function,
			None => return,
		};
		if let Err(error) = function.call0(&self.instance) {
			error!("`{}()` of {:?} threw: {:?}", method, self.base.selector(), error);
		}
	}

	fn flag(&self, mounted: bool) {
		Reflect::set(&self.instance, &JsValue::from_str("mounted"), &JsValue::from_bool(mounted)).ok();
	}
}

impl Component for JsComponent {
	fn base(&self) -> &Base {
		&self.base
	}

	fn base_mut(&mut self) -> &mut Base {
		&mut self.base
	}

	fn mount(&mut self) {
		if !core::mem::replace(&mut self.mounted_by_constructor, false) {
			self.call("mount");
		}
		self.flag(true);
	}

	fn unmount(&mut self) {
		self.call("unmount");
		self.flag(false);
	}

	fn refresh(&mut self) {
		self.call("refresh");
	}
}
