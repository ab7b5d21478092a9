//! `FilmAdded` notifications: the append-ordered log and listener registry.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use filmreg_types::{FilmRecord, Position};
use parking_lot::RwLock;
use rustc_hash::FxHashMap as HashMap;
use serde::{Deserialize, Serialize};

/// Emitted once for every successful append.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilmAdded {
	pub position: Position,
	pub name: String,
	pub rating: u8,
	pub review: String,
}

impl FilmAdded {
	pub(crate) fn new(position: Position, record: &FilmRecord) -> Self {
		Self {
			position,
			name: record.name().to_owned(),
			rating: record.rating(),
			review: record.review().to_owned(),
		}
	}
}

/// Append-ordered record of every `FilmAdded` emitted by one registry.
///
/// Entry `i` describes the append that assigned position `i`.
#[derive(Debug, Default)]
pub(crate) struct EventLog {
	entries: Vec<FilmAdded>,
}

impl EventLog {
	pub(crate) fn push(&mut self, event: FilmAdded) {
		debug_assert_eq!(event.position, Position::from_index(self.entries.len()));
		self.entries.push(event);
	}

	pub(crate) fn since(&self, from: Position) -> &[FilmAdded] {
		let start = from.index().unwrap_or(usize::MAX).min(self.entries.len());
		&self.entries[start..]
	}
}

/// Handle returned by [`FilmRegistry::subscribe`](crate::FilmRegistry::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ListenerFn = Arc<dyn Fn(&FilmAdded) + Send + Sync>;

/// Registered listeners, called in registration order.
#[derive(Default)]
pub(crate) struct Listeners {
	next_id: AtomicU64,
	by_id: RwLock<HashMap<ListenerId, ListenerFn>>,
	order: RwLock<Vec<ListenerId>>,
}

impl Listeners {
	pub(crate) fn add(&self, listener: ListenerFn) -> ListenerId {
		let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
		self.by_id.write().insert(id, listener);
		self.order.write().push(id);
		id
	}

	pub(crate) fn remove(&self, id: ListenerId) -> bool {
		let removed = self.by_id.write().remove(&id).is_some();
		if removed {
			self.order.write().retain(|other| *other != id);
		}
		removed
	}

	pub(crate) fn len(&self) -> usize {
		self.by_id.read().len()
	}

	/// Calls every listener with `event`.
	///
	/// The listener table is copied out first so no lock is held while user
	/// code runs.
	pub(crate) fn dispatch(&self, event: &FilmAdded) {
		let current: Vec<ListenerFn> = {
			let by_id = self.by_id.read();
			self.order
				.read()
				.iter()
				.filter_map(|id| by_id.get(id).cloned())
				.collect()
		};
		for listener in current {
			listener(event);
		}
	}
}

impl std::fmt::Debug for Listeners {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Listeners").field("count", &self.len()).finish()
	}
}

#[cfg(test)]
mod tests {
	use parking_lot::Mutex;

	use super::*;

	fn event(position: u64) -> FilmAdded {
		FilmAdded {
			position: Position(position),
			name: format!("film {position}"),
			rating: 3,
			review: String::new(),
		}
	}

	#[test]
	fn log_since_clamps() {
		let mut log = EventLog::default();
		log.push(event(0));
		log.push(event(1));
		assert_eq!(log.since(Position(0)).len(), 2);
		assert_eq!(log.since(Position(1)), &[event(1)]);
		assert!(log.since(Position(2)).is_empty());
		assert!(log.since(Position(u64::MAX)).is_empty());
	}

	#[test]
	fn listeners_run_in_registration_order() {
		let seen = Arc::new(Mutex::new(Vec::new()));
		let listeners = Listeners::default();
		for tag in ["a", "b", "c"] {
			let seen = seen.clone();
			listeners.add(Arc::new(move |ev: &FilmAdded| seen.lock().push((tag, ev.position))));
		}
		listeners.dispatch(&event(4));
		assert_eq!(
			*seen.lock(),
			vec![("a", Position(4)), ("b", Position(4)), ("c", Position(4))]
		);
	}

	#[test]
	fn removed_listener_stops_receiving() {
		let hits = Arc::new(AtomicU64::new(0));
		let listeners = Listeners::default();
		let counter = hits.clone();
		let id = listeners.add(Arc::new(move |_: &FilmAdded| {
			counter.fetch_add(1, Ordering::SeqCst);
		}));
		listeners.dispatch(&event(0));
		assert!(listeners.remove(id));
		assert!(!listeners.remove(id));
		listeners.dispatch(&event(1));
		assert_eq!(hits.load(Ordering::SeqCst), 1);
		assert_eq!(listeners.len(), 0);
	}
}
