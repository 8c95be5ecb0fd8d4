use crate::{conductor::Registration, dom::Document, Error, Result};
use serde::Deserialize;
use tracing::{debug, instrument};

pub const DEFAULT_BASE_PATH: &str = "scripts/boosts";

/// Where component modules are fetched from, plus any conductors declared up front.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
	pub origin: String,
	pub base_path: String,
	#[serde(default)]
	pub conductors: Vec<Registration>,
}

/// The subset of [`Config`] a `<meta>` tag may override. Missing keys keep their current value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Overrides {
	origin: Option<String>,
	base_path: Option<String>,
	conductors: Option<Vec<Registration>>,
}

impl Config {
	#[must_use]
	pub fn new(origin: impl Into<String>) -> Self {
		Self {
			origin: origin.into(),
			base_path: DEFAULT_BASE_PATH.to_owned(),
			conductors: Vec::new(),
		}
	}

	/// Reads `<meta name="{extension}-config" content="{…}">` from `document` on top of [`Config::new`].
	///
	/// # Errors
	///
	/// Iff the meta tag's `content` isn't a JSON object of the expected shape.
	#[instrument(skip(document))]
	pub fn from_document(document: &dyn Document, extension: &str, origin: &str) -> Result<Self> {
		let mut config = Self::new(origin);
		let selector = format!("meta[name=\"{}-config\"]", extension);
		if let Some(content) = document.attribute(&selector, "content") {
			debug!("Found configuration meta tag.");
			config.apply_json(&content)?;
		}
		Ok(config.normalized())
	}

	/// Overlays the keys present in `json`.
	///
	/// # Errors
	///
	/// Iff `json` doesn't parse.
	pub fn apply_json(&mut self, json: &str) -> Result<()> {
		let overrides: Overrides = serde_json::from_str(json).map_err(Error::Config)?;
		if let Some(origin) = overrides.origin {
			self.origin = origin;
		}
		if let Some(base_path) = overrides.base_path {
			self.base_path = base_path;
		}
		if let Some(conductors) = overrides.conductors {
			self.conductors = conductors;
		}
		Ok(())
	}

	/// Trims one leading and one trailing `/` from the base path.
	#[must_use]
	pub fn normalized(mut self) -> Self {
		let trimmed = self.base_path.strip_prefix('/').unwrap_or(&self.base_path);
		let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
		self.base_path = trimmed.to_owned();
		self
	}

	#[must_use]
	pub fn module_url(&self, name: &str, version: &str) -> String {
		format!("{}/{}/{}.js?v={}", self.origin, self.base_path, name, version)
	}
}
