use serde::{Deserialize, Serialize};

use crate::rating::{Rating, RatingError};

/// A single film entry: name, star rating and free-form review.
///
/// Records built through [`FilmRecord::new`] always carry a rating in `1..=5`.
/// The only other constructor is [`FilmRecord::zeroed`], the all-default value
/// returned for unassigned positions when the registry runs in parity mode.
///
/// The rating is kept as a plain `u8` so the zeroed record can travel over the
/// wire unchanged; use [`FilmRecord::checked_rating`] to get a [`Rating`] back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilmRecord {
	name: String,
	rating: u8,
	review: String,
}

impl FilmRecord {
	pub fn new(name: impl Into<String>, rating: Rating, review: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			rating: rating.get(),
			review: review.into(),
		}
	}

	/// Empty name, rating 0, empty review.
	#[must_use]
	pub fn zeroed() -> Self {
		Self::default()
	}

	#[inline]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[inline]
	pub fn rating(&self) -> u8 {
		self.rating
	}

	#[inline]
	pub fn review(&self) -> &str {
		&self.review
	}

	/// Re-checks the stored rating.
	///
	/// Fails for zeroed records and for records decoded from untrusted bytes.
	pub fn checked_rating(&self) -> Result<Rating, RatingError> {
		Rating::new(self.rating)
	}

	pub fn is_zeroed(&self) -> bool {
		*self == Self::default()
	}
}
