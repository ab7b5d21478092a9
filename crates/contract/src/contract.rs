//! The registry contract: sole owner and mutator of film storage.

use std::sync::Arc;

use filmreg_types::{FilmRecord, Position, Rating};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{RegistryError, Result};
use crate::events::{EventLog, FilmAdded, ListenerId, Listeners};
use crate::storage::FilmStore;

/// How [`FilmRegistry::film`] answers for a position that was never assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadMode {
	/// Fail with [`RegistryError::UnknownPosition`].
	#[default]
	#[serde(rename = "error")]
	Strict,
	/// Return [`FilmRecord::zeroed`], like an uninitialised ledger slot.
	#[serde(rename = "zero")]
	ZeroDefault,
}

/// Every record of one registry, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
	pub films: Vec<FilmRecord>,
}

#[derive(Debug, Default)]
struct State {
	store: FilmStore,
	log: EventLog,
}

/// Append-only film registry.
///
/// Mutations are applied atomically under a write lock, so concurrent callers
/// are serialized into one total order and readers always see a fully
/// committed state. Listeners run after the write lock is released but while
/// the append-order lock is still held, which keeps delivery in position
/// order. Listeners must not call [`FilmRegistry::add_film`] on the same
/// registry.
#[derive(Debug, Default)]
pub struct FilmRegistry {
	state: RwLock<State>,
	append_order: Mutex<()>,
	listeners: Listeners,
	read_mode: ReadMode,
}

impl FilmRegistry {
	/// Creates an empty registry in [`ReadMode::Strict`].
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_read_mode(mut self, read_mode: ReadMode) -> Self {
		self.read_mode = read_mode;
		self
	}

	pub fn read_mode(&self) -> ReadMode {
		self.read_mode
	}

	/// Rebuilds a registry from `snapshot`, re-validating every rating.
	///
	/// The event log is rebuilt with one entry per record. Listeners are not
	/// called: restoring replays no appends.
	///
	/// # Errors
	///
	/// Returns [`RegistryError::Validation`] for the first record whose
	/// rating falls outside `1..=5`.
	pub fn restore(snapshot: RegistrySnapshot, read_mode: ReadMode) -> Result<Self> {
		let mut state = State::default();
		for record in snapshot.films {
			record.checked_rating()?;
			let (position, stored) = state.store.push(record);
			state.log.push(FilmAdded::new(position, stored));
		}
		debug!(count = state.store.len(), "registry restored");
		Ok(Self {
			state: RwLock::new(state),
			read_mode,
			..Self::default()
		})
	}

	/// Validates and appends a film, then emits [`FilmAdded`].
	///
	/// Returns the emitted event; it carries the assigned position.
	///
	/// # Errors
	///
	/// Returns [`RegistryError::Validation`] if `rating` is outside `1..=5`.
	/// Storage, the event log and listeners are untouched in that case.
	pub fn add_film(
		&self,
		name: impl Into<String>,
		rating: u8,
		review: impl Into<String>,
	) -> Result<FilmAdded> {
		let rating = Rating::new(rating).inspect_err(|err| {
			debug!(value = err.value, "film rejected: {err}");
		})?;
		let record = FilmRecord::new(name, rating, review);

		let _order = self.append_order.lock();
		let event = {
			let mut guard = self.state.write();
			let state = &mut *guard;
			let (position, stored) = state.store.push(record);
			let event = FilmAdded::new(position, stored);
			state.log.push(event.clone());
			event
		};
		debug!(position = event.position.0, rating = event.rating, name = %event.name, "film added");

		self.listeners.dispatch(&event);
		Ok(event)
	}

	/// Number of successful appends so far.
	pub fn film_count(&self) -> u64 {
		self.state.read().store.len()
	}

	/// Reads the record at `position`.
	///
	/// # Errors
	///
	/// In [`ReadMode::Strict`], returns [`RegistryError::UnknownPosition`] for
	/// an unassigned position. [`ReadMode::ZeroDefault`] never fails.
	pub fn film(&self, position: Position) -> Result<FilmRecord> {
		let state = self.state.read();
		if let Some(record) = state.store.get(position) {
			return Ok(record.clone());
		}
		trace!(position = position.0, mode = ?self.read_mode, "read of unassigned position");
		match self.read_mode {
			ReadMode::Strict => Err(RegistryError::UnknownPosition {
				position,
				count: state.store.len(),
			}),
			ReadMode::ZeroDefault => Ok(FilmRecord::zeroed()),
		}
	}

	/// Every record in insertion order, position 0 first.
	pub fn all_films(&self) -> Vec<FilmRecord> {
		self.state.read().store.records().to_vec()
	}

	/// Logged events starting at `from`; empty if `from` is past the end.
	pub fn events_since(&self, from: Position) -> Vec<FilmAdded> {
		self.state.read().log.since(from).to_vec()
	}

	/// Registers `listener` for every later successful append.
	pub fn subscribe<F>(&self, listener: F) -> ListenerId
	where
		F: Fn(&FilmAdded) + Send + Sync + 'static,
	{
		self.listeners.add(Arc::new(listener))
	}

	/// Removes a listener. Returns `false` if it was not registered.
	pub fn unsubscribe(&self, id: ListenerId) -> bool {
		self.listeners.remove(id)
	}

	/// Copies out every record.
	pub fn snapshot(&self) -> RegistrySnapshot {
		RegistrySnapshot {
			films: self.all_films(),
		}
	}
}
