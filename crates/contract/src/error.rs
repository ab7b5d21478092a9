use filmreg_types::{Position, RatingError};

/// Errors surfaced by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	/// The rating was outside `1..=5`; nothing was stored and no event fired.
	#[error(transparent)]
	Validation(#[from] RatingError),

	/// A read named a position that was never assigned.
	#[error("no film at position {position} (count {count})")]
	UnknownPosition { position: Position, count: u64 },
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
