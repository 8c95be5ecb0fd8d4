#![doc(html_root_url = "https://docs.rs/booster-dom/0.0.3")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod component;
pub mod conductor;
pub mod config;
pub mod dom;
mod error;
pub mod extension;
pub mod factory;
pub mod history;
pub mod host;
pub mod readiness;
pub mod resolver;
pub mod state;
pub mod strategy;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use component::{Base, Component};
pub use conductor::{Conductor, Registration};
pub use config::Config;
pub use error::{Error, Result};
pub use extension::Extension;
pub use factory::{Factory, Lifecycle};
pub use host::Host;
pub use state::{Map, Scope, StateStore};

/// The extension name used when none is given: placeholders are `[data-booster]`, configuration is `<meta name="booster-config">`.
pub const DEFAULT_EXTENSION: &str = "booster";
