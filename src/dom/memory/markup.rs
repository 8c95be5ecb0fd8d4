//! A forgiving HTML reader and writer, good for the markup servers send over the wire.
//!
//! This is a small part of the HTML5 tree construction algorithm: start tags imply the end tags of open `<p>`, `<li>`, `<dt>`/`<dd>`
//! and `<option>` elements the way browsers do, but there's no foster parenting, no implied `<html>`/`<body>` and only a handful of
//! named character references. Mismatched end tags close everything up to the nearest matching open element and are otherwise ignored.

use crate::dom::ElementData;

const VOID: &[&str] = &["area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr"];
const RAW_TEXT: &[&str] = &["script", "style"];

/// Start tags that close an open `<p>`.
const CLOSES_P: &[&str] = &[
	"address", "article", "aside", "blockquote", "details", "dialog", "div", "dl", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3",
	"h4", "h5", "h6", "header", "hgroup", "hr", "li", "main", "menu", "nav", "ol", "p", "pre", "section", "table", "ul", "dd", "dt",
];

/// Elements an implied end tag doesn't reach past.
const SCOPE: &[&str] = &["applet", "button", "caption", "html", "marquee", "object", "table", "td", "template", "th"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
	Element(Element),
	Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
	pub tag: String,
	pub attributes: Vec<(String, String)>,
	pub children: Vec<Node>,
}

impl Element {
	#[must_use]
	pub fn new(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into(),
			attributes: Vec::new(),
			children: Vec::new(),
		}
	}

	#[must_use]
	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
	}

	#[must_use]
	pub fn id(&self) -> Option<&str> {
		self.attribute("id").filter(|id| !id.is_empty())
	}

	#[must_use]
	pub fn has_class(&self, class: &str) -> bool {
		self.attribute("class").map_or(false, |classes| classes.split_ascii_whitespace().any(|c| c == class))
	}

	pub fn set_attribute(&mut self, name: &str, value: &str) {
		match self.attributes.iter_mut().find(|(n, _)| n == name) {
			Some((_, v)) => *v = value.to_owned(),
			None => self.attributes.push((name.to_owned(), value.to_owned())),
		}
	}

	#[must_use]
	pub fn outer_html(&self) -> String {
		let mut out = String::new();
		self.write_outer(&mut out);
		out
	}

	#[must_use]
	pub fn inner_html(&self) -> String {
		let mut out = String::new();
		self.write_inner(&mut out);
		out
	}

	#[must_use]
	pub fn to_data(&self) -> ElementData {
		ElementData {
			tag: self.tag.clone(),
			attributes: self.attributes.clone(),
			outer_html: self.outer_html(),
		}
	}

	fn write_outer(&self, out: &mut String) {
		out.push('<');
		out.push_str(&self.tag);
		for (name, value) in &self.attributes {
			out.push(' ');
			out.push_str(name);
			out.push_str("=\"");
			escape_attribute(value, out);
			out.push('"');
		}
		out.push('>');
		if VOID.contains(&self.tag.as_str()) {
			return;
		}
		self.write_inner(out);
		out.push_str("</");
		out.push_str(&self.tag);
		out.push('>');
	}

	fn write_inner(&self, out: &mut String) {
		let raw = RAW_TEXT.contains(&self.tag.as_str());
		for child in &self.children {
			match child {
				Node::Element(element) => element.write_outer(out),
				Node::Text(text) if raw => out.push_str(text),
				Node::Text(text) => escape_text(text, out),
			}
		}
	}
}

#[must_use]
pub fn serialize(nodes: &[Node]) -> String {
	let mut out = String::new();
	for node in nodes {
		match node {
			Node::Element(element) => element.write_outer(&mut out),
			Node::Text(text) => escape_text(text, &mut out),
		}
	}
	out
}

#[must_use]
pub fn parse(html: &str) -> Vec<Node> {
	let mut parser = Parser {
		input: html,
		pos: 0,
		open: vec![Element::default()],
	};
	parser.run();
	parser.finish()
}

/// Elements in document order (pre-order).
pub fn descendants<'a>(nodes: &'a [Node], out: &mut Vec<&'a Element>) {
	for node in nodes {
		if let Node::Element(element) = node {
			out.push(element);
			descendants(&element.children, out);
		}
	}
}

/// Like [`descendants`], but also passes each element's ancestors, outermost first.
pub fn walk<'a>(nodes: &'a [Node], ancestors: &mut Vec<&'a Element>, visit: &mut impl FnMut(&'a Element, &[&'a Element])) {
	for node in nodes {
		if let Node::Element(element) = node {
			visit(element, ancestors);
			ancestors.push(element);
			walk(&element.children, ancestors, visit);
			ancestors.pop();
		}
	}
}

#[must_use]
pub fn find_by_id<'a>(nodes: &'a [Node], id: &str) -> Option<&'a Element> {
	for node in nodes {
		if let Node::Element(element) = node {
			if element.id() == Some(id) {
				return Some(element);
			}
			if let Some(found) = find_by_id(&element.children, id) {
				return Some(found);
			}
		}
	}
	None
}

pub fn find_by_id_mut<'a>(nodes: &'a mut [Node], id: &str) -> Option<&'a mut Element> {
	for node in nodes {
		if let Node::Element(element) = node {
			if element.id() == Some(id) {
				return Some(element);
			}
			if let Some(found) = find_by_id_mut(&mut element.children, id) {
				return Some(found);
			}
		}
	}
	None
}

/// Splices `replacement` in place of the first element with id `id`.
pub fn replace_by_id(nodes: &mut Vec<Node>, id: &str, replacement: Vec<Node>) -> bool {
	let mut replacement = Some(replacement);
	replace_by_id_inner(nodes, id, &mut replacement)
}

fn replace_by_id_inner(nodes: &mut Vec<Node>, id: &str, replacement: &mut Option<Vec<Node>>) -> bool {
	if let Some(i) = nodes.iter().position(|node| matches!(node, Node::Element(element) if element.id() == Some(id))) {
		nodes.splice(i..=i, replacement.take().unwrap_or_default());
		return true;
	}
	nodes.iter_mut().any(|node| match node {
		Node::Element(element) => replace_by_id_inner(&mut element.children, id, replacement),
		Node::Text(_) => false,
	})
}

struct Parser<'a> {
	input: &'a str,
	pos: usize,
	/// Index 0 is a nameless sentinel collecting the top level.
	open: Vec<Element>,
}

impl<'a> Parser<'a> {
	fn rest(&self) -> &'a str {
		let input = self.input;
		&input[self.pos..]
	}

	fn take_while(&mut self, f: impl Fn(char) -> bool) -> &'a str {
		let rest = self.rest();
		let end = rest.find(|c: char| !f(c)).unwrap_or_else(|| rest.len());
		self.pos += end;
		&rest[..end]
	}

	fn skip_whitespace(&mut self) {
		self.take_while(char::is_whitespace);
	}

	fn run(&mut self) {
		while self.pos < self.input.len() {
			let rest = self.rest();
			if rest.starts_with("<!--") {
				self.pos += rest.find("-->").map_or(rest.len(), |end| end + 3);
			} else if rest.starts_with("</") {
				let (name, consumed) = match rest.find('>') {
					Some(end) => (&rest[2..end], end + 1),
					None => (&rest[2..], rest.len()),
				};
				self.close(&name.trim().to_ascii_lowercase());
				self.pos += consumed;
			} else if rest.starts_with("<!") || rest.starts_with("<?") {
				self.pos += rest.find('>').map_or(rest.len(), |end| end + 1);
			} else if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
				self.open_tag();
			} else {
				let end = rest.char_indices().skip(1).find(|&(_, c)| c == '<').map_or(rest.len(), |(end, _)| end);
				self.push(Node::Text(decode(&rest[..end])));
				self.pos += end;
			}
		}
	}

	fn open_tag(&mut self) {
		self.pos += 1;
		let tag = self.take_while(|c| !c.is_whitespace() && c != '>' && c != '/').to_ascii_lowercase();
		let mut element = Element::new(tag);
		let mut self_closing = false;

		loop {
			self.skip_whitespace();
			let rest = self.rest();
			if rest.is_empty() {
				break;
			} else if rest.starts_with("/>") {
				self.pos += 2;
				self_closing = true;
				break;
			} else if rest.starts_with('>') {
				self.pos += 1;
				break;
			} else if rest.starts_with('/') || rest.starts_with('=') {
				self.pos += 1;
				continue;
			}

			let name = self.take_while(|c| !c.is_whitespace() && c != '=' && c != '>' && c != '/').to_ascii_lowercase();
			self.skip_whitespace();
			let value = if self.rest().starts_with('=') {
				self.pos += 1;
				self.skip_whitespace();
				self.attribute_value()
			} else {
				String::new()
			};
			if element.attribute(&name).is_none() {
				element.attributes.push((name, value));
			}
		}

		self.imply_end_tags(&element.tag);

		if self_closing || VOID.contains(&element.tag.as_str()) {
			self.push(Node::Element(element));
			return;
		}

		if RAW_TEXT.contains(&element.tag.as_str()) {
			let close = format!("</{}", element.tag);
			let rest = self.rest();
			let end = rest.to_ascii_lowercase().find(&close).unwrap_or_else(|| rest.len());
			if end > 0 {
				element.children.push(Node::Text(rest[..end].to_owned()));
			}
			self.pos += end;
		}
		self.open.push(element);
	}

	fn attribute_value(&mut self) -> String {
		let rest = self.rest();
		match rest.chars().next() {
			Some(quote @ '"') | Some(quote @ '\'') => {
				let body = &rest[1..];
				let end = body.find(quote).unwrap_or_else(|| body.len());
				self.pos += 1 + end + usize::from(end < body.len());
				decode(&body[..end])
			}
			_ => decode(self.take_while(|c| !c.is_whitespace() && c != '>')),
		}
	}

	/// Closes what a `tag` start tag implicitly ends.
	fn imply_end_tags(&mut self, tag: &str) {
		if CLOSES_P.contains(&tag) {
			self.close_in_scope(&["p"], SCOPE);
		}
		match tag {
			"li" => self.close_in_scope(&["li"], &["ol", "ul"]),
			"dt" | "dd" => self.close_in_scope(&["dt", "dd"], &["dl"]),
			"option" => self.close_in_scope(&["option"], &["select", "datalist", "optgroup"]),
			_ => (),
		}
	}

	/// Closes the innermost open element named in `tags`, unless a `boundaries` (or [`SCOPE`]) element is in the way.
	fn close_in_scope(&mut self, tags: &[&str], boundaries: &[&str]) {
		for index in (1..self.open.len()).rev() {
			let open = self.open[index].tag.as_str();
			if tags.contains(&open) {
				return self.close_from(index);
			}
			if boundaries.contains(&open) || SCOPE.contains(&open) {
				return;
			}
		}
	}

	fn close(&mut self, tag: &str) {
		if let Some(index) = self.open.iter().rposition(|element| element.tag == tag).filter(|&index| index > 0) {
			self.close_from(index);
		}
	}

	fn close_from(&mut self, index: usize) {
		let mut closed = self.open.split_off(index);
		while let Some(element) = closed.pop() {
			match closed.last_mut() {
				Some(parent) => parent.children.push(Node::Element(element)),
				None => self.push(Node::Element(element)),
			}
		}
	}

	fn push(&mut self, node: Node) {
		if let Some(parent) = self.open.last_mut() {
			if let (Node::Text(text), Some(Node::Text(previous))) = (&node, parent.children.last_mut()) {
				previous.push_str(text);
				return;
			}
			parent.children.push(node);
		}
	}

	fn finish(mut self) -> Vec<Node> {
		self.close_from(1);
		self.open.pop().map(|root| root.children).unwrap_or_default()
	}
}

#[must_use]
pub fn decode(text: &str) -> String {
	if !text.contains('&') {
		return text.to_owned();
	}

	let mut out = String::with_capacity(text.len());
	let mut rest = text;
	while let Some(i) = rest.find('&') {
		out.push_str(&rest[..i]);
		rest = &rest[i..];
		let reference = rest
			.find(';')
			.filter(|&end| end <= 10)
			.and_then(|end| character_reference(&rest[1..end]).map(|c| (c, end)));
		match reference {
			Some((c, end)) => {
				out.push(c);
				rest = &rest[end + 1..];
			}
			None => {
				out.push('&');
				rest = &rest[1..];
			}
		}
	}
	out.push_str(rest);
	out
}

fn character_reference(name: &str) -> Option<char> {
	match name {
		"amp" => Some('&'),
		"lt" => Some('<'),
		"gt" => Some('>'),
		"quot" => Some('"'),
		"apos" => Some('\''),
		"nbsp" => Some('\u{a0}'),
		_ => {
			let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
				u32::from_str_radix(hex, 16).ok()
			} else {
				name.strip_prefix('#').and_then(|decimal| decimal.parse().ok())
			};
			code.and_then(char::from_u32)
		}
	}
}

fn escape_text(text: &str, out: &mut String) {
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			c => out.push(c),
		}
	}
}

fn escape_attribute(value: &str, out: &mut String) {
	for c in value.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'"' => out.push_str("&quot;"),
			c => out.push(c),
		}
	}
}
