//! An in-memory [`Document`] for headless hosts and tests.

mod markup;
mod selector;

pub use markup::{Element, Node};
pub use selector::Selector;

use super::{Document, ElementData, ParsedDocument};
use core::cell::RefCell;
use tracing::warn;

/// A document held as a plain element tree.
///
/// Mutation goes through `&self` so a live document can be shared (`Rc<MemoryDocument>`) between the reconciler and whatever plays the part of the swap framework.
#[derive(Debug, Default)]
pub struct MemoryDocument {
	nodes: RefCell<Vec<Node>>,
}

impl MemoryDocument {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn parse(html: &str) -> Self {
		Self {
			nodes: RefCell::new(markup::parse(html)),
		}
	}

	/// The whole document, serialized.
	#[must_use]
	pub fn html(&self) -> String {
		markup::serialize(&self.nodes.borrow())
	}

	#[must_use]
	pub fn outer_html(&self, id: &str) -> Option<String> {
		markup::find_by_id(&self.nodes.borrow(), id).map(Element::outer_html)
	}

	/// Replaces the children of the element with id `id`. Returns whether it exists.
	pub fn set_inner_html(&self, id: &str, html: &str) -> bool {
		match markup::find_by_id_mut(&mut self.nodes.borrow_mut(), id) {
			Some(element) => {
				element.children = markup::parse(html);
				true
			}
			None => false,
		}
	}

	/// Appends `html` to the element with id `parent_id`, or to the top level.
	pub fn append_html(&self, parent_id: Option<&str>, html: &str) -> bool {
		let mut nodes = self.nodes.borrow_mut();
		match parent_id {
			None => {
				nodes.extend(markup::parse(html));
				true
			}
			Some(id) => match markup::find_by_id_mut(&mut nodes, id) {
				Some(element) => {
					element.children.extend(markup::parse(html));
					true
				}
				None => false,
			},
		}
	}

	pub fn set_attribute(&self, id: &str, name: &str, value: &str) -> bool {
		match markup::find_by_id_mut(&mut self.nodes.borrow_mut(), id) {
			Some(element) => {
				element.set_attribute(name, value);
				true
			}
			None => false,
		}
	}

	pub fn remove(&self, id: &str) -> bool {
		markup::replace_by_id(&mut self.nodes.borrow_mut(), id, Vec::new())
	}

	fn select(&self, root_id: Option<&str>, selector: &str, first: bool) -> Vec<ElementData> {
		let selector = match Selector::parse(selector) {
			Some(selector) => selector,
			None => {
				warn!("Unsupported selector {:?}; matching nothing.", selector);
				return Vec::new();
			}
		};

		let nodes = self.nodes.borrow();
		let root = match root_id {
			Some(id) => match markup::find_by_id(&nodes, id) {
				Some(root) => Some(root),
				None => return Vec::new(),
			},
			None => None,
		};

		let mut found = Vec::new();
		markup::walk(&nodes, &mut Vec::new(), &mut |element, ancestors| {
			if first && !found.is_empty() {
				return;
			}
			let in_scope = root.map_or(true, |root| ancestors.iter().any(|ancestor| core::ptr::eq(*ancestor, root)));
			if in_scope && selector.matches(element, ancestors) {
				found.push(element.to_data());
			}
		});
		found
	}
}

impl Document for MemoryDocument {
	fn has_id(&self, id: &str) -> bool {
		markup::find_by_id(&self.nodes.borrow(), id).is_some()
	}

	fn matches(&self, selector: &str) -> bool {
		!self.select(None, selector, true).is_empty()
	}

	fn contains(&self, root_id: &str, selector: &str) -> bool {
		!self.select(Some(root_id), selector, true).is_empty()
	}

	fn contains_id(&self, root_id: &str, id: &str) -> bool {
		let nodes = self.nodes.borrow();
		markup::find_by_id(&nodes, root_id).map_or(false, |root| markup::find_by_id(&root.children, id).is_some())
	}

	fn supports(&self, selector: &str) -> bool {
		Selector::parse(selector).is_some()
	}

	fn query_all(&self, root_id: Option<&str>, selector: &str) -> Vec<ElementData> {
		self.select(root_id, selector, false)
	}

	fn attribute(&self, selector: &str, name: &str) -> Option<String> {
		self.select(None, selector, true).into_iter().next().and_then(|element| element.attribute(name).map(str::to_owned))
	}

	fn parse(&self, html: &str) -> Box<dyn ParsedDocument> {
		Box::new(Self::parse(html))
	}
}

impl ParsedDocument for MemoryDocument {
	fn replace_outer_html(&mut self, id: &str, html: &str) -> bool {
		markup::replace_by_id(self.nodes.get_mut(), id, markup::parse(html))
	}

	/// The children of the first `<body>` if there is one, otherwise everything.
	fn body_inner_html(&self) -> String {
		let nodes = self.nodes.borrow();
		let mut elements = Vec::new();
		markup::descendants(&nodes, &mut elements);
		match elements.into_iter().find(|element| element.tag == "body") {
			Some(body) => body.inner_html(),
			None => markup::serialize(&nodes),
		}
	}
}
