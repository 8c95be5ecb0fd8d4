//! The slice of the DOM this crate reads and rewrites.
//!
//! Everything is addressed through CSS selectors and element ids rather than node handles,
//! so the same reconciliation code runs against the browser (`web::WebDocument`, wasm32 only)
//! and against [`memory::MemoryDocument`] when there is no browser around.

pub mod memory;

/// A detached copy of an element's identity, attributes and markup, taken at query time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
	/// Lowercase.
	pub tag: String,
	pub attributes: Vec<(String, String)>,
	/// The element's own serialized markup, as with [***outerHTML***](https://developer.mozilla.org/en-US/docs/Web/API/Element/outerHTML).
	pub outer_html: String,
}

impl ElementData {
	#[must_use]
	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
	}

	/// Empty ids count as absent.
	#[must_use]
	pub fn id(&self) -> Option<&str> {
		self.attribute("id").filter(|id| !id.is_empty())
	}
}

pub trait Document {
	/// Whether an element with this `id` exists anywhere in the document.
	fn has_id(&self, id: &str) -> bool;

	/// Whether anything in the document matches `selector`.
	fn matches(&self, selector: &str) -> bool;

	/// Whether a *descendant* of the element with id `root_id` matches `selector`.
	/// The selector is still matched against the whole document, so `main .menu` finds `.menu` inside a `#main` root.
	///
	/// `false` if there is no such root.
	fn contains(&self, root_id: &str, selector: &str) -> bool;

	/// Whether the element with id `id` is a descendant of the element with id `root_id`.
	///
	/// Unlike [`Document::contains`], this works for ids that aren't valid CSS identifiers.
	fn contains_id(&self, root_id: &str, id: &str) -> bool;

	/// Whether `selector` can be evaluated at all. Unsupported selectors match nothing.
	fn supports(&self, selector: &str) -> bool;

	/// All elements matching `selector` in document order, optionally limited to descendants of `root_id`.
	///
	/// A missing root yields nothing.
	fn query_all(&self, root_id: Option<&str>, selector: &str) -> Vec<ElementData>;

	/// The attribute `name` of the first element matching `selector`.
	fn attribute(&self, selector: &str, name: &str) -> Option<String>;

	/// Parses a detached HTML document, as with [***DOMParser***](https://developer.mozilla.org/en-US/docs/Web/API/DOMParser).
	fn parse(&self, html: &str) -> Box<dyn ParsedDocument>;
}

/// A detached document that may be rewritten and serialized again.
pub trait ParsedDocument: Document {
	/// Replaces the element with id `id` by `html`. Returns whether such an element was found.
	fn replace_outer_html(&mut self, id: &str, html: &str) -> bool;

	/// The serialized content of the document's body.
	fn body_inner_html(&self) -> String;
}
