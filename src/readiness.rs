//! The host events load strategies wait on.

use core::cell::RefCell;
use futures::{
	channel::oneshot,
	future::{self, FutureExt, LocalBoxFuture},
};
use hashbrown::HashMap;
use tracing::trace;

/// Each future resolves exactly once and never fails.
pub trait Readiness {
	/// The next `topic` event dispatched on the document body.
	fn event(&self, topic: &str) -> LocalBoxFuture<'static, ()>;

	/// The next idle period of the host.
	fn idle(&self) -> LocalBoxFuture<'static, ()>;

	/// Immediately if `query` matches already, otherwise its next change.
	fn media(&self, query: &str) -> LocalBoxFuture<'static, ()>;

	/// The first time the element matching `selector` intersects the viewport, grown by `root_margin`.
	fn visible(&self, selector: &str, root_margin: &str) -> LocalBoxFuture<'static, ()>;
}

type Waiter = oneshot::Sender<()>;

fn waiter() -> (Waiter, LocalBoxFuture<'static, ()>) {
	let (sender, receiver) = oneshot::channel();
	// A dropped sender resolves as well.
	(sender, receiver.map(drop).boxed_local())
}

fn release<K>(waiters: &RefCell<Vec<(K, Waiter)>>, mut wakes: impl FnMut(&K) -> bool) -> usize {
	let (ready, waiting): (Vec<_>, Vec<_>) = waiters.take().into_iter().partition(|(key, _)| wakes(key));
	*waiters.borrow_mut() = waiting;
	let count = ready.len();
	for (_, sender) in ready {
		sender.send(()).ok();
	}
	count
}

/// [`Readiness`] driven by explicit calls, for hosts without a browser and for tests.
///
/// Every trigger method returns how many waiters it released.
#[derive(Debug, Default)]
pub struct ManualReadiness {
	events: RefCell<Vec<(String, Waiter)>>,
	idle: RefCell<Vec<((), Waiter)>>,
	media: RefCell<HashMap<String, bool>>,
	media_changes: RefCell<Vec<(String, Waiter)>>,
	visible: RefCell<Vec<((String, String), Waiter)>>,
}

impl ManualReadiness {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn dispatch(&self, topic: &str) -> usize {
		trace!("Dispatching {:?}.", topic);
		release(&self.events, |t| t == topic)
	}

	pub fn go_idle(&self) -> usize {
		release(&self.idle, |_| true)
	}

	/// Records whether `query` matches, releasing waiters if that changed.
	pub fn set_media(&self, query: &str, matches: bool) -> usize {
		let previous = self.media.borrow_mut().insert(query.to_owned(), matches).unwrap_or(false);
		if previous == matches {
			return 0;
		}
		release(&self.media_changes, |q| q == query)
	}

	pub fn intersect(&self, selector: &str) -> usize {
		release(&self.visible, |(s, _)| s == selector)
	}

	/// `(selector, root margin)` of each element still being observed.
	#[must_use]
	pub fn observed(&self) -> Vec<(String, String)> {
		self.visible.borrow().iter().map(|(key, _)| key.clone()).collect()
	}

	#[must_use]
	pub fn pending(&self) -> usize {
		self.events.borrow().len() + self.idle.borrow().len() + self.media_changes.borrow().len() + self.visible.borrow().len()
	}
}

impl Readiness for ManualReadiness {
	fn event(&self, topic: &str) -> LocalBoxFuture<'static, ()> {
		let (sender, ready) = waiter();
		self.events.borrow_mut().push((topic.to_owned(), sender));
		ready
	}

	fn idle(&self) -> LocalBoxFuture<'static, ()> {
		let (sender, ready) = waiter();
		self.idle.borrow_mut().push(((), sender));
		ready
	}

	fn media(&self, query: &str) -> LocalBoxFuture<'static, ()> {
		if self.media.borrow().get(query).copied().unwrap_or(false) {
			return future::ready(()).boxed_local();
		}
		let (sender, ready) = waiter();
		self.media_changes.borrow_mut().push((query.to_owned(), sender));
		ready
	}

	fn visible(&self, selector: &str, root_margin: &str) -> LocalBoxFuture<'static, ()> {
		let (sender, ready) = waiter();
		self.visible.borrow_mut().push(((selector.to_owned(), root_margin.to_owned()), sender));
		ready
	}
}
