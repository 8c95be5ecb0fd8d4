//! CSS selector lists with descendant and child combinators.
//!
//! Supported compounds: `tag`, `*`, `#id`, `.class`, `[attr]`, `[attr=value]`, `[attr="value"]` and `:not(…)` of those.
//! They combine with whitespace and `>`, and lists are comma-separated. Sibling combinators and other pseudo-classes aren't supported.

use super::markup::Element;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector(Vec<Complex>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
	Descendant,
	Child,
}

/// The subject compound, then each further compound to its left with the combinator joining it, right to left.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
	subject: Compound,
	ancestors: Vec<(Combinator, Compound)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
	tag: Option<String>,
	conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
	Id(String),
	Class(String),
	Attribute { name: String, value: Option<String> },
	Not(Compound),
}

impl Selector {
	/// [`None`] if `selector` uses anything outside the supported subset.
	#[must_use]
	pub fn parse(selector: &str) -> Option<Self> {
		let complexes = split_top_level(selector)
			.into_iter()
			.map(|part| Cursor { input: part.trim(), pos: 0 }.complex())
			.collect::<Option<Vec<_>>>()?;
		Some(Self(complexes))
	}

	/// `ancestors` runs from the outermost element down to `element`'s parent.
	#[must_use]
	pub fn matches(&self, element: &Element, ancestors: &[&Element]) -> bool {
		self.0.iter().any(|complex| complex.subject.matches(element) && matches_ancestors(&complex.ancestors, ancestors))
	}
}

fn matches_ancestors(parts: &[(Combinator, Compound)], ancestors: &[&Element]) -> bool {
	match parts.split_first() {
		None => true,
		Some(((Combinator::Child, compound), rest)) => match ancestors.split_last() {
			Some((parent, above)) => compound.matches(parent) && matches_ancestors(rest, above),
			None => false,
		},
		Some(((Combinator::Descendant, compound), rest)) => {
			(0..ancestors.len()).rev().any(|i| compound.matches(ancestors[i]) && matches_ancestors(rest, &ancestors[..i]))
		}
	}
}

impl Compound {
	fn matches(&self, element: &Element) -> bool {
		self.tag.as_deref().map_or(true, |tag| element.tag.eq_ignore_ascii_case(tag))
			&& self.conditions.iter().all(|condition| match condition {
				Condition::Id(id) => element.id() == Some(id.as_str()),
				Condition::Class(class) => element.has_class(class),
				Condition::Attribute { name, value: None } => element.attribute(name).is_some(),
				Condition::Attribute { name, value: Some(value) } => element.attribute(name) == Some(value.as_str()),
				Condition::Not(inner) => !inner.matches(element),
			})
	}
}

fn split_top_level(selector: &str) -> Vec<&str> {
	let mut parts = Vec::new();
	let mut depth = 0_i32;
	let mut quote = None;
	let mut start = 0;
	for (i, c) in selector.char_indices() {
		match (quote, c) {
			(Some(q), c) if c == q => quote = None,
			(Some(_), _) => (),
			(None, '"') | (None, '\'') => quote = Some(c),
			(None, '(') | (None, '[') => depth += 1,
			(None, ')') | (None, ']') => depth -= 1,
			(None, ',') if depth == 0 => {
				parts.push(&selector[start..i]);
				start = i + 1;
			}
			_ => (),
		}
	}
	parts.push(&selector[start..]);
	parts
}

struct Cursor<'a> {
	input: &'a str,
	pos: usize,
}

impl<'a> Cursor<'a> {
	fn rest(&self) -> &'a str {
		let input = self.input;
		&input[self.pos..]
	}

	fn eat(&mut self, c: char) -> bool {
		let eaten = self.rest().starts_with(c);
		if eaten {
			self.pos += c.len_utf8();
		}
		eaten
	}

	fn skip_whitespace(&mut self) {
		let rest = self.rest();
		self.pos += rest.len() - rest.trim_start().len();
	}

	/// A CSS identifier, which can't start with a digit or with `-` and a digit.
	fn ident(&mut self) -> Option<&'a str> {
		let rest = self.rest();
		let end = rest.find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_')).unwrap_or_else(|| rest.len());
		let ident = &rest[..end];
		let digit_start = ident.trim_start_matches('-').starts_with(|c: char| c.is_ascii_digit()) && ident.len() - ident.trim_start_matches('-').len() <= 1;
		if ident.is_empty() || digit_start {
			return None;
		}
		self.pos += end;
		Some(ident)
	}

	fn complex(&mut self) -> Option<Complex> {
		let mut compounds = vec![self.compound()?];
		let mut combinators = Vec::new();
		loop {
			let before = self.pos;
			self.skip_whitespace();
			if self.rest().is_empty() {
				break;
			}
			let combinator = if self.eat('>') {
				self.skip_whitespace();
				Combinator::Child
			} else if self.pos > before && !self.rest().starts_with(|c| c == '+' || c == '~') {
				Combinator::Descendant
			} else {
				return None;
			};
			combinators.push(combinator);
			compounds.push(self.compound()?);
		}

		let subject = compounds.pop()?;
		let ancestors = combinators.into_iter().rev().zip(compounds.into_iter().rev()).collect();
		Some(Complex { subject, ancestors })
	}

	fn value(&mut self) -> Option<String> {
		let rest = self.rest();
		match rest.chars().next()? {
			quote @ '"' | quote @ '\'' => {
				let body = &rest[1..];
				let end = body.find(quote)?;
				self.pos += end + 2;
				Some(body[..end].to_owned())
			}
			_ => self.ident().map(str::to_owned),
		}
	}

	fn compound(&mut self) -> Option<Compound> {
		let mut compound = Compound::default();
		let universal = self.eat('*');
		if !universal && self.rest().starts_with(|c: char| c.is_alphabetic() || c == '-' || c == '_') {
			compound.tag = Some(self.ident()?.to_ascii_lowercase());
		}

		loop {
			if self.eat('#') {
				compound.conditions.push(Condition::Id(self.ident()?.to_owned()));
			} else if self.eat('.') {
				compound.conditions.push(Condition::Class(self.ident()?.to_owned()));
			} else if self.eat('[') {
				self.skip_whitespace();
				let name = self.ident()?.to_ascii_lowercase();
				self.skip_whitespace();
				let value = if self.eat('=') {
					self.skip_whitespace();
					Some(self.value()?)
				} else {
					None
				};
				self.skip_whitespace();
				if !self.eat(']') {
					return None;
				}
				compound.conditions.push(Condition::Attribute { name, value });
			} else if self.rest().starts_with(":not(") {
				self.pos += ":not(".len();
				self.skip_whitespace();
				let inner = self.compound()?;
				self.skip_whitespace();
				if !self.eat(')') {
					return None;
				}
				compound.conditions.push(Condition::Not(inner));
			} else {
				break;
			}
		}

		(universal || compound.tag.is_some() || !compound.conditions.is_empty()).then(|| compound)
	}
}
