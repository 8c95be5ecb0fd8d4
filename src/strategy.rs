//! Load strategies: the preconditions a placeholder declares in its `data-load` attribute.
//!
//! Strategies are separated by `|` and all of them must resolve before the component is imported,
//! e.g. `idle | visible (0px 0px 200px 0px) | media (min-width: 1024px)`.
//! `immediate` and `eager` mean "don't wait" and contribute nothing.

use crate::{dom::Document, readiness::Readiness};
use futures::future::{self, FutureExt, LocalBoxFuture};
use tracing::{trace, warn};

pub const DEFAULT_ROOT_MARGIN: &str = "0px 0px 0px 0px";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
	/// `event (topic)`. [`None`] if no topic was given.
	Event(Option<String>),
	Idle,
	/// `media (query)`, keeping the parentheses as part of the query.
	Media(String),
	/// `visible` or `visible (root margin)`.
	Visible { root_margin: String },
}

/// The text between the first `(` and a trailing `)`, trimmed.
fn argument(requirement: &str) -> Option<&str> {
	let start = requirement.find('(')? + 1;
	let inner = &requirement[start..];
	let inner = inner.strip_suffix(')').unwrap_or(inner).trim();
	(!inner.is_empty()).then(|| inner)
}

/// Unknown strategies are skipped with a warning.
#[must_use]
pub fn parse(strategy: &str) -> Vec<Requirement> {
	strategy
		.split('|')
		.map(str::trim)
		.filter(|requirement| !requirement.is_empty() && *requirement != "immediate" && *requirement != "eager")
		.filter_map(|requirement| {
			if requirement.starts_with("event") {
				Some(Requirement::Event(argument(requirement).map(str::to_owned)))
			} else if requirement == "idle" {
				Some(Requirement::Idle)
			} else if let Some(rest) = requirement.strip_prefix("media") {
				let query = rest.find('(').map_or(rest, |start| &rest[start..]).trim();
				Some(Requirement::Media(query.to_owned()))
			} else if requirement.starts_with("visible") {
				Some(Requirement::Visible {
					root_margin: argument(requirement).unwrap_or(DEFAULT_ROOT_MARGIN).to_owned(),
				})
			} else {
				warn!("Unknown load strategy {:?}; ignoring it.", requirement);
				None
			}
		})
		.collect()
}

/// One future per requirement in `strategy`. Await all of them (e.g. with [`futures::future::join_all`]) before loading.
///
/// `selector` locates the element `visible` observes. Requirements that can't be waited on resolve immediately,
/// so a missing element never holds up a load.
#[must_use]
pub fn load_strategies(strategy: Option<&str>, selector: Option<&str>, document: &dyn Document, readiness: &dyn Readiness) -> Vec<LocalBoxFuture<'static, ()>> {
	let requirements = match strategy {
		Some(strategy) => parse(strategy),
		None => return Vec::new(),
	};

	requirements
		.into_iter()
		.map(|requirement| match requirement {
			Requirement::Event(Some(topic)) => readiness.event(&topic),
			Requirement::Event(None) => {
				warn!("`event` strategy without a topic on {:?}; not waiting.", selector);
				future::ready(()).boxed_local()
			}
			Requirement::Idle => readiness.idle(),
			Requirement::Media(query) if query.is_empty() => future::ready(()).boxed_local(),
			Requirement::Media(query) => readiness.media(&query),
			Requirement::Visible { root_margin } => match selector {
				Some(selector) if document.matches(selector) => readiness.visible(selector, &root_margin),
				_ => {
					trace!("Nothing to observe for {:?}; visible immediately.", selector);
					future::ready(()).boxed_local()
				}
			},
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{dom::memory::MemoryDocument, readiness::ManualReadiness};
	use futures::future::join_all;

	#[test]
	fn composite() {
		assert_eq!(
			parse("idle | visible (0px 0px 200px 0px) | media (only screen and (min-width:768px)) | event (htmx:afterSettle)"),
			vec![
				Requirement::Idle,
				Requirement::Visible {
					root_margin: "0px 0px 200px 0px".to_owned()
				},
				Requirement::Media("(only screen and (min-width:768px))".to_owned()),
				Requirement::Event(Some("htmx:afterSettle".to_owned())),
			]
		);
	}

	#[test]
	fn no_waiting() {
		assert!(parse("immediate").is_empty());
		assert!(parse(" eager | immediate ").is_empty());
		assert!(parse("").is_empty());
		assert!(parse("teleport").is_empty());
	}

	#[test]
	fn defaults() {
		assert_eq!(parse("event"), vec![Requirement::Event(None)]);
		assert_eq!(parse("event()"), vec![Requirement::Event(None)]);
		assert_eq!(
			parse("visible"),
			vec![Requirement::Visible {
				root_margin: DEFAULT_ROOT_MARGIN.to_owned()
			}]
		);
	}

	#[test]
	fn fail_open() {
		let document = MemoryDocument::parse(r#"<div id="a"></div>"#);
		let readiness = ManualReadiness::new();
		let ready = |strategy: &str, selector: Option<&str>| join_all(load_strategies(Some(strategy), selector, &document, &readiness)).now_or_never().is_some();

		assert!(ready("event", Some("#a")));
		assert!(ready("event ()", Some("#a")));
		assert!(ready("visible", None));
		assert!(ready("visible", Some("#missing")));
		assert!(ready("media", None));
		assert_eq!(readiness.pending(), 0);

		assert!(!ready("visible", Some("#a")));
		assert_eq!(readiness.observed(), vec![("#a".to_owned(), DEFAULT_ROOT_MARGIN.to_owned())]);

		readiness.set_media("(hover: hover)", true);
		assert!(ready("media (hover: hover) | immediate", None));
		assert!(!ready("media (hover: hover) | idle", None));
		assert!(load_strategies(None, Some("#a"), &document, &readiness).is_empty());
	}
}
