//! Film registry contract.
//!
//! The registry is an append-only list of [`FilmRecord`]s guarded by a single
//! validation rule: ratings must lie in `1..=5`. All access goes through
//! [`FilmRegistry`]:
//!
//! * [`FilmRegistry::add_film`] validates, appends and emits [`FilmAdded`]
//! * [`FilmRegistry::film_count`] returns the collection length
//! * [`FilmRegistry::film`] reads one record by [`Position`]
//! * [`FilmRegistry::all_films`] returns every record in insertion order
//!
//! Successful appends are recorded in an event log and delivered to
//! registered listeners exactly once, in append order. Rejected calls leave
//! no trace in storage, the log, or listeners.

pub mod contract;
pub mod error;
pub mod events;
mod storage;

pub use contract::{FilmRegistry, ReadMode, RegistrySnapshot};
pub use error::{RegistryError, Result};
pub use events::{FilmAdded, ListenerId};
pub use filmreg_types::{FilmRecord, Position, Rating, RatingError};
