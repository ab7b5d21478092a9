use crate::error::{ClientError, Result};

/// Form input for a new film, checked before anything is submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilmDraft {
	pub name: String,
	/// `None` and `Some(0)` both mean no star was picked.
	pub rating: Option<u8>,
	pub review: String,
}

impl FilmDraft {
	pub fn new(name: impl Into<String>, rating: u8, review: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			rating: Some(rating),
			review: review.into(),
		}
	}

	/// Returns the rating to submit.
	///
	/// Only presence is checked here. Out-of-range values are sent as-is and
	/// left to the registry to reject.
	///
	/// # Errors
	///
	/// [`ClientError::EmptyName`] if the name is blank,
	/// [`ClientError::MissingRating`] if no rating was picked.
	pub fn validate(&self) -> Result<u8> {
		if self.name.trim().is_empty() {
			return Err(ClientError::EmptyName);
		}
		match self.rating {
			None | Some(0) => Err(ClientError::MissingRating),
			Some(rating) => Ok(rating),
		}
	}
}
