use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest accepted star rating.
pub const MIN_RATING: u8 = 1;

/// Highest accepted star rating.
pub const MAX_RATING: u8 = 5;

/// Raised when a rating falls outside `MIN_RATING..=MAX_RATING`.
///
/// The display string is the reason reported back to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Rating must be between 1 and 5")]
pub struct RatingError {
	/// The rejected value.
	pub value: u8,
}

/// A star rating in `1..=5`.
///
/// The only way to obtain one is through [`Rating::new`] (or the equivalent
/// `TryFrom<u8>`), so every `Rating` in memory satisfies the range invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
	/// Validates `value` against the accepted range.
	pub const fn new(value: u8) -> Result<Self, RatingError> {
		if value < MIN_RATING || value > MAX_RATING {
			return Err(RatingError { value });
		}
		Ok(Self(value))
	}

	/// Returns the raw star count.
	#[inline]
	pub const fn get(self) -> u8 {
		self.0
	}

	/// Human label shown next to the stars.
	pub const fn label(self) -> &'static str {
		match self.0 {
			1 => "Not Good",
			2 => "Could Be Better",
			3 => "It's Okay",
			4 => "Pretty Good",
			_ => "Loved It!",
		}
	}

	/// Every valid rating, lowest first.
	pub fn all() -> impl Iterator<Item = Self> {
		(MIN_RATING..=MAX_RATING).map(Self)
	}
}

impl TryFrom<u8> for Rating {
	type Error = RatingError;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}

impl From<Rating> for u8 {
	fn from(rating: Rating) -> Self {
		rating.0
	}
}

impl fmt::Display for Rating {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.0, MAX_RATING)
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case(1, "Not Good")]
	#[case(2, "Could Be Better")]
	#[case(3, "It's Okay")]
	#[case(4, "Pretty Good")]
	#[case(5, "Loved It!")]
	fn accepts_in_range(#[case] value: u8, #[case] label: &str) {
		let rating = Rating::new(value).unwrap();
		assert_eq!(rating.get(), value);
		assert_eq!(rating.label(), label);
	}

	#[rstest]
	#[case(0)]
	#[case(6)]
	#[case(u8::MAX)]
	fn rejects_out_of_range(#[case] value: u8) {
		let err = Rating::new(value).unwrap_err();
		assert_eq!(err.value, value);
		assert_eq!(err.to_string(), "Rating must be between 1 and 5");
	}

	#[test]
	fn all_lists_five_ratings_in_order() {
		let values: Vec<u8> = Rating::all().map(Rating::get).collect();
		assert_eq!(values, vec![1, 2, 3, 4, 5]);
	}

	#[test]
	fn deserialize_revalidates() {
		let bytes = postcard::to_allocvec(&7u8).unwrap();
		assert!(postcard::from_bytes::<Rating>(&bytes).is_err());

		let bytes = postcard::to_allocvec(&Rating::new(4).unwrap()).unwrap();
		assert_eq!(postcard::from_bytes::<Rating>(&bytes).unwrap().get(), 4);
	}

	proptest! {
		#[test]
		fn prop_new_matches_range(value in any::<u8>()) {
			prop_assert_eq!(Rating::new(value).is_ok(), (1..=5).contains(&value));
		}
	}
}
