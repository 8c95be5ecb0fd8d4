use thiserror::Error;

/// Everything that can go wrong while loading or configuring a component.
///
/// None of these are fatal to the page: the factory and conductor log them and carry on with the remaining components.
#[derive(Debug, Error)]
pub enum Error {
	/// A placeholder without an `id` can't be tracked for unmounting, so it's never loaded.
	#[error("an instance of {component:?} doesn't have an ID attribute")]
	MissingIdentity { component: String },

	#[error("malformed `data-options` JSON on {selector:?}: {source}")]
	Options {
		selector: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("malformed configuration JSON: {0}")]
	Config(#[source] serde_json::Error),

	#[error("conductor {conductor:?} has a selector the document can't evaluate: {selector:?}")]
	UnsupportedSelector { conductor: String, selector: String },

	#[error("no module named {name:?} is available")]
	UnknownComponent { name: String },

	#[error("failed to import {url:?}: {reason}")]
	Import { url: String, reason: String },

	#[error("failed to spawn a load task: {0}")]
	Spawn(#[from] futures::task::SpawnError),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
