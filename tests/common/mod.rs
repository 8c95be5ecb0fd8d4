#![allow(dead_code)]

use booster_dom::{
	dom::memory::MemoryDocument,
	readiness::ManualReadiness,
	resolver::Registry,
	Base, Component, Config, Host,
};
use futures::executor::LocalPool;
use std::{cell::RefCell, rc::Rc};
use tracing_subscriber::EnvFilter;

pub const ORIGIN: &str = "https://example.com";

pub fn init_logging() {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_test_writer()
		.try_init()
		.ok();
}

/// What a recorder did, as `(instance number, event)`.
#[derive(Debug, Clone, Default)]
pub struct Log(Rc<RefCell<Vec<(usize, &'static str)>>>);

impl Log {
	pub fn push(&self, instance: usize, event: &'static str) {
		self.0.borrow_mut().push((instance, event));
	}

	pub fn count(&self, event: &str) -> usize {
		self.0.borrow().iter().filter(|(_, e)| *e == event).count()
	}

	pub fn of(&self, instance: usize, event: &str) -> usize {
		self.0.borrow().iter().filter(|(i, e)| *i == instance && *e == event).count()
	}
}

pub struct Recorder {
	base: Base,
	number: usize,
	log: Log,
}

impl Component for Recorder {
	fn base(&self) -> &Base {
		&self.base
	}

	fn base_mut(&mut self) -> &mut Base {
		&mut self.base
	}

	fn mount(&mut self) {
		self.log.push(self.number, "mount");
	}

	fn unmount(&mut self) {
		self.log.push(self.number, "unmount");
	}
}

pub struct Harness {
	pub pool: LocalPool,
	pub document: Rc<MemoryDocument>,
	pub readiness: Rc<ManualReadiness>,
	pub registry: Registry,
	pub host: Host,
}

impl Harness {
	pub fn new(html: &str) -> Self {
		init_logging();
		let pool = LocalPool::new();
		let document = Rc::new(MemoryDocument::parse(html));
		let readiness = Rc::new(ManualReadiness::new());
		let registry = Registry::new();
		let host = Host::new(document.clone(), readiness.clone(), Rc::new(registry.clone()), Rc::new(pool.spawner()));
		Self {
			pool,
			document,
			readiness,
			registry,
			host,
		}
	}

	pub fn config(&self) -> Config {
		Config::new(ORIGIN)
	}

	/// Defines `name` as a [`Recorder`]. Instances are numbered from 0 in construction order.
	pub fn record(&self, name: &str) -> Log {
		let log = Log::default();
		let created = Rc::new(RefCell::new(0));
		let records = log.clone();
		self.registry.define(name, move |base| {
			let mut created = created.borrow_mut();
			let number = *created;
			*created += 1;
			records.push(number, "create");
			Recorder {
				base,
				number,
				log: records.clone(),
			}
		});
		log
	}

	pub fn run(&mut self) {
		self.pool.run_until_stalled();
	}
}
