//! Browser implementations of the host capabilities, and the htmx glue.

mod document;
pub mod htmx;
mod readiness;
mod resolver;

pub use document::WebDocument;
pub use readiness::{WebReadiness, IDLE_FALLBACK_DELAY};
pub use resolver::{JsComponent, ScriptResolver};

use futures::{
	future::LocalFutureObj,
	task::{LocalSpawn, SpawnError},
};

/// Runs tasks on the browser's microtask queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSpawner;

impl LocalSpawn for WebSpawner {
	fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
		wasm_bindgen_futures::spawn_local(future);
		Ok(())
	}
}
