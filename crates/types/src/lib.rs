//! Core types for the film registry: ratings, film records and identifiers.

/// Caller and deployment identifiers.
pub mod ids;
/// Film records as stored by the registry.
pub mod film;
/// Validated star ratings.
pub mod rating;

pub use film::FilmRecord;
pub use ids::{Account, AccountError, DeploymentId, Position};
pub use rating::{MAX_RATING, MIN_RATING, Rating, RatingError};
