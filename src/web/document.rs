use crate::dom::{memory::MemoryDocument, Document, ElementData, ParsedDocument};
use tracing::error;
use wasm_bindgen::JsCast;
use web_sys::{DomParser, Element, Node, NodeList, SupportedType};

/// A [***Document***](https://developer.mozilla.org/en-US/docs/Web/API/Document), live or parsed.
#[derive(Debug, Clone)]
pub struct WebDocument(web_sys::Document);

impl WebDocument {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self(document)
	}

	/// `window.document`.
	#[must_use]
	pub fn current() -> Option<Self> {
		web_sys::window()?.document().map(Self)
	}

	#[must_use]
	pub fn inner(&self) -> &web_sys::Document {
		&self.0
	}

	fn query(&self, root_id: Option<&str>, selector: &str) -> Option<NodeList> {
		let list = match root_id {
			Some(id) => self.0.get_element_by_id(id)?.query_selector_all(selector),
			None => self.0.query_selector_all(selector),
		};
		list.map_err(|error| error!("Invalid selector {:?}: {:?}", selector, error)).ok()
	}

	fn first(&self, selector: &str) -> Option<Element> {
		self.0.query_selector(selector).map_err(|error| error!("Invalid selector {:?}: {:?}", selector, error)).ok().flatten()
	}
}

fn element_data(element: &Element) -> ElementData {
	let attributes = element
		.get_attribute_names()
		.iter()
		.filter_map(|name| name.as_string())
		.filter_map(|name| element.get_attribute(&name).map(|value| (name, value)))
		.collect();
	ElementData {
		tag: element.tag_name().to_ascii_lowercase(),
		attributes,
		outer_html: element.outer_html(),
	}
}

impl Document for WebDocument {
	fn has_id(&self, id: &str) -> bool {
		self.0.get_element_by_id(id).is_some()
	}

	fn matches(&self, selector: &str) -> bool {
		self.first(selector).is_some()
	}

	fn contains(&self, root_id: &str, selector: &str) -> bool {
		self.0
			.get_element_by_id(root_id)
			.and_then(|root| root.query_selector(selector).map_err(|error| error!("Invalid selector {:?}: {:?}", selector, error)).ok().flatten())
			.is_some()
	}

	fn contains_id(&self, root_id: &str, id: &str) -> bool {
		match (self.0.get_element_by_id(root_id), self.0.get_element_by_id(id)) {
			(Some(root), Some(element)) => {
				let element: &Node = &element;
				!root.is_same_node(Some(element)) && root.contains(Some(element))
			}
			_ => false,
		}
	}

	fn supports(&self, selector: &str) -> bool {
		self.0.query_selector(selector).is_ok()
	}

	fn query_all(&self, root_id: Option<&str>, selector: &str) -> Vec<ElementData> {
		let list = match self.query(root_id, selector) {
			Some(list) => list,
			None => return Vec::new(),
		};
		(0..list.length())
			.filter_map(|i| list.item(i))
			.filter_map(|node| node.dyn_into::<Element>().ok())
			.map(|element| element_data(&element))
			.collect()
	}

	fn attribute(&self, selector: &str, name: &str) -> Option<String> {
		self.first(selector)?.get_attribute(name)
	}

	/// Falls back to [`MemoryDocument`] if the browser refuses to parse.
	fn parse(&self, html: &str) -> Box<dyn ParsedDocument> {
		match DomParser::new().and_then(|parser| parser.parse_from_string(html, SupportedType::TextHtml)) {
			Ok(document) => Box::new(Self(document)),
			Err(error) => {
				error!("`DOMParser` failed: {:?}", error);
				Box::new(MemoryDocument::parse(html))
			}
		}
	}
}

impl ParsedDocument for WebDocument {
	fn replace_outer_html(&mut self, id: &str, html: &str) -> bool {
		match self.0.get_element_by_id(id) {
			Some(element) => {
				element.set_outer_html(html);
				true
			}
			None => false,
		}
	}

	fn body_inner_html(&self) -> String {
		self.0.body().map(|body| body.inner_html()).unwrap_or_default()
	}
}
