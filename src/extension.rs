//! Routes the swap framework's events into a [`Lifecycle`] and the [`HistoryCache`].
//!
//! | Event                      | Method                                   |
//! |----------------------------|------------------------------------------|
//! | extension initialised      | [`Extension::mount`], [`Extension::seed_cache`] (once the document is parsed) |
//! | `htmx:beforeSwap`          | [`Extension::before_swap`]               |
//! | `htmx:afterSettle`         | [`Extension::after_settle`]              |
//! | `htmx:historyItemCreated`  | [`Extension::history_item_created`]      |
//! | `htmx:historyCacheHit`     | [`Extension::history_cache_hit`]         |
//! | `htmx:historyRestore`      | [`Extension::history_restore`]           |

use crate::{
	factory::{Factory, Lifecycle},
	history::{HistoryCache, Slot},
	host::Host,
};
use core::cell::{Ref, RefCell};
use tracing::{debug, instrument};

#[derive(Debug)]
pub struct Extension<L = Factory> {
	name: String,
	lifecycle: L,
	host: Host,
	cache: RefCell<HistoryCache>,
}

impl<L: Lifecycle> Extension<L> {
	#[must_use]
	pub fn new(name: &str, lifecycle: L, host: Host) -> Self {
		Self {
			name: name.to_owned(),
			lifecycle,
			host,
			cache: RefCell::new(HistoryCache::new(name)),
		}
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[must_use]
	pub fn lifecycle(&self) -> &L {
		&self.lifecycle
	}

	#[must_use]
	pub fn cache(&self) -> Ref<'_, HistoryCache> {
		self.cache.borrow()
	}

	/// [`Extension::mount`] and [`Extension::seed_cache`], for hosts whose document is already complete.
	pub fn init(&self) {
		self.mount();
		self.seed_cache();
	}

	pub fn mount(&self) {
		self.lifecycle.mount();
	}

	/// Caches the markup of marked elements before scripts get to change them.
	pub fn seed_cache(&self) {
		let count = self.cache.borrow_mut().capture(&*self.host.document, Slot::Current);
		debug!(count, "Seeded history cache.");
	}

	/// Remembers the incoming markup of marked elements in `response`, for the history entry after next.
	#[instrument(skip(self, response))]
	pub fn before_swap(&self, response: &str) {
		let incoming = self.host.document.parse(response);
		self.cache.borrow_mut().capture(&*incoming, Slot::Pending);
	}

	#[instrument(skip(self))]
	pub fn after_settle(&self, target_id: &str) {
		self.host.swap_target.set(Some(target_id.to_owned()));
		self.lifecycle.refresh();
	}

	/// Rewrites `content`, the serialized page about to be stored as a history entry, with the cached markup.
	#[instrument(skip(self, content))]
	pub fn history_item_created(&self, content: &mut String) {
		let document = &*self.host.document;
		self.cache.borrow_mut().history_item_created(content, document, document);
	}

	pub fn history_cache_hit(&self) {
		self.cache.borrow_mut().set_hit();
	}

	/// Refreshes everything unless the framework restored from its own cache, then re-seeds the cache from `content`.
	#[instrument(skip(self, content))]
	pub fn history_restore(&self, content: Option<&str>) {
		self.host.swap_target.set(None);

		let hit = self.cache.borrow_mut().take_hit();
		if !hit {
			self.lifecycle.refresh();
		}

		if let Some(content) = content.filter(|content| !content.is_empty()) {
			let restored = self.host.document.parse(content);
			self.cache.borrow_mut().capture(&*restored, Slot::Current);
		}
	}
}
