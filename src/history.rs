//! Keeps marked fragments intact across back/forward navigation.
//!
//! The swap framework snapshots the live page into a history entry, by which point components may have rewritten their markup.
//! Restoring that snapshot would hand them their own output as input. This cache remembers each marked element's markup
//! as it arrived from the server and writes it back into history entries before they're stored.
//!
//! - `current` holds the markup to write into the next history entry.
//! - `pending` holds markup captured from a response that's being swapped in. It's promoted when the *next* entry is created,
//!   since that entry is the one that'll contain the response's elements.

use crate::dom::{Document, ParsedDocument};
use hashbrown::HashMap;
use tracing::{debug, instrument, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
	Current,
	Pending,
}

#[derive(Debug, Default)]
pub struct HistoryCache {
	extension: String,
	current: HashMap<String, String>,
	pending: HashMap<String, String>,
	hit: bool,
}

impl HistoryCache {
	#[must_use]
	pub fn new(extension: &str) -> Self {
		Self {
			extension: extension.to_owned(),
			..Self::default()
		}
	}

	/// Placeholders and `[hx-history-preserve]` elements, unless they opt out with `data-reset="false"`.
	#[must_use]
	pub fn marker_selector(&self) -> String {
		format!(
			"[data-{0}]:not([data-reset=\"false\"]), [hx-history-preserve]:not([data-reset=\"false\"])",
			self.extension
		)
	}

	#[must_use]
	pub fn current(&self) -> &HashMap<String, String> {
		&self.current
	}

	#[must_use]
	pub fn pending(&self) -> &HashMap<String, String> {
		&self.pending
	}

	/// Records the markup of every marked element with an `id` in `document`. Returns how many were recorded.
	#[instrument(skip(self, document))]
	pub fn capture<D: Document + ?Sized>(&mut self, document: &D, slot: Slot) -> usize {
		let selector = self.marker_selector();
		let store = match slot {
			Slot::Current => &mut self.current,
			Slot::Pending => &mut self.pending,
		};
		let mut count = 0;
		for marker in document.query_all(None, &selector) {
			if let Some(id) = marker.id() {
				#[cfg(feature = "dangerous-logging")]
				trace!("Captured #{}: {}", id, marker.outer_html);
				#[cfg(not(feature = "dangerous-logging"))]
				trace!("Captured #{}.", id);
				store.insert(id.to_owned(), marker.outer_html.clone());
				count += 1;
			}
		}
		count
	}

	/// Writes the cached markup of each `current` entry over the same-id element in `content`.
	#[must_use]
	pub fn rewind(&self, content: &str, parser: &dyn Document) -> String {
		let mut parsed: Box<dyn ParsedDocument> = parser.parse(content);
		let mut rewound = 0;
		for (id, html) in &self.current {
			if parsed.replace_outer_html(id, html) {
				rewound += 1;
			}
		}
		trace!(rewound, "Rewound history content.");
		parsed.body_inner_html()
	}

	/// Drops `current` entries without a live element, then promotes `pending`.
	#[instrument(skip(self, live))]
	pub fn rotate<D: Document + ?Sized>(&mut self, live: &D) {
		let before = self.current.len();
		self.current.retain(|id, _| live.has_id(id));
		let pruned = before - self.current.len();
		let promoted = self.pending.len();
		self.current.extend(self.pending.drain());
		debug!(pruned, promoted, "Rotated history cache.");
	}

	/// Rewinds `content` in place and rotates, unless `content` is empty.
	pub fn history_item_created<D: Document + ?Sized>(&mut self, content: &mut String, live: &D, parser: &dyn Document) {
		if content.is_empty() {
			return;
		}
		*content = self.rewind(content, parser);
		self.rotate(live);
	}

	pub fn set_hit(&mut self) {
		self.hit = true;
	}

	/// Whether the last restore was served from the swap framework's own cache. Resets the flag.
	pub fn take_hit(&mut self) -> bool {
		core::mem::replace(&mut self.hit, false)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dom::memory::MemoryDocument;

	#[test]
	fn capture_respects_opt_out_and_ids() {
		let document = MemoryDocument::parse(
			r#"<main id="main">
				<div id="a" data-booster="x">1</div>
				<div id="b" data-booster="y" data-reset="false">2</div>
				<div data-booster="z">3</div>
				<p id="c" hx-history-preserve>4</p>
			</main>"#,
		);
		let mut cache = HistoryCache::new("booster");
		assert_eq!(cache.capture(&document, Slot::Pending), 2);
		assert!(cache.current().is_empty());
		assert_eq!(cache.pending()["a"], r#"<div id="a" data-booster="x">1</div>"#);
		assert!(cache.pending().contains_key("c"));
		assert!(!cache.pending().contains_key("b"));
	}

	#[test]
	fn rotation_prunes_and_promotes() {
		let live = MemoryDocument::parse(r#"<div id="b"></div>"#);
		let mut cache = HistoryCache::new("booster");
		cache.current.insert("a".to_owned(), r#"<div id="a">1</div>"#.to_owned());
		cache.current.insert("b".to_owned(), r#"<div id="b">2</div>"#.to_owned());
		cache.pending.insert("n".to_owned(), r#"<div id="n">3</div>"#.to_owned());
		cache.rotate(&live);
		assert!(!cache.current().contains_key("a"));
		assert!(cache.current().contains_key("b"));
		assert!(cache.current().contains_key("n"));
		assert!(cache.pending().is_empty());
	}

	#[test]
	fn rewinds_mutated_fragments() {
		let live = MemoryDocument::new();
		let mut cache = HistoryCache::new("booster");
		cache.current.insert("a".to_owned(), r#"<div id="a" data-booster="x">pristine</div>"#.to_owned());
		let mut content = r#"<main id="main"><div id="a" data-booster="x">mutated</div><p>kept</p></main>"#.to_owned();
		cache.history_item_created(&mut content, &live, &live);
		assert_eq!(content, r#"<main id="main"><div id="a" data-booster="x">pristine</div><p>kept</p></main>"#);
		// `a` isn't live, so it's pruned for the next entry.
		assert!(cache.current().is_empty());
	}

	#[test]
	fn empty_content_is_left_alone() {
		let live = MemoryDocument::new();
		let mut cache = HistoryCache::new("booster");
		cache.pending.insert("n".to_owned(), String::new());
		let mut content = String::new();
		cache.history_item_created(&mut content, &live, &live);
		assert!(content.is_empty());
		assert_eq!(cache.pending().len(), 1);
	}

	#[test]
	fn hit_flag_resets() {
		let mut cache = HistoryCache::new("booster");
		assert!(!cache.take_hit());
		cache.set_hit();
		assert!(cache.take_hit());
		assert!(!cache.take_hit());
	}
}
