use std::fmt;

use filmreg_types::{FilmRecord, Position, Rating};

/// One film with the position it was stored at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
	pub position: Position,
	pub film: FilmRecord,
}

impl fmt::Display for CatalogEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let rating = self.film.rating();
		let stars = "*".repeat(rating as usize);
		write!(f, "{} {} [{stars:<5}]", self.position, self.film.name())?;
		if let Ok(rating) = Rating::new(rating) {
			write!(f, " {}", rating.label())?;
		}
		if !self.film.review().is_empty() {
			write!(f, ": {}", self.film.review())?;
		}
		Ok(())
	}
}

/// Client-side view of the full collection, as last fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
	entries: Vec<CatalogEntry>,
}

impl Catalog {
	/// Numbers `films` by index; the registry returns them in position order.
	pub fn from_films(films: Vec<FilmRecord>) -> Self {
		let entries = films
			.into_iter()
			.enumerate()
			.map(|(index, film)| CatalogEntry {
				position: Position::from_index(index),
				film,
			})
			.collect();
		Self { entries }
	}

	pub fn entries(&self) -> &[CatalogEntry] {
		&self.entries
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Mean star rating, or `None` for an empty catalog.
	pub fn average_rating(&self) -> Option<f64> {
		if self.entries.is_empty() {
			return None;
		}
		let total: u64 = self.entries.iter().map(|e| u64::from(e.film.rating())).sum();
		Some(total as f64 / self.entries.len() as f64)
	}

	/// Average formatted to one decimal, `"0"` when empty. Exact halves round
	/// up, so 4.25 shows as `"4.3"`.
	pub fn average_display(&self) -> String {
		let Some(avg) = self.average_rating() else {
			return "0".to_owned();
		};
		// x.25 and x.75 are the only averages that sit exactly on a tie.
		let quarters = avg * 4.0;
		if quarters.fract() == 0.0 && quarters % 2.0 == 1.0 {
			return format!("{:.1}", (avg * 10.0).ceil() / 10.0);
		}
		format!("{avg:.1}")
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	fn film(name: &str, rating: u8, review: &str) -> FilmRecord {
		FilmRecord::new(name, Rating::new(rating).unwrap(), review)
	}

	#[test]
	fn empty_catalog_average() {
		let catalog = Catalog::default();
		assert!(catalog.is_empty());
		assert_eq!(catalog.average_rating(), None);
		assert_eq!(catalog.average_display(), "0");
	}

	fn rated(ratings: &[u8]) -> Catalog {
		Catalog::from_films(ratings.iter().map(|&r| film("f", r, "")).collect())
	}

	#[test]
	fn average_rounds_to_one_decimal() {
		let catalog = Catalog::from_films(vec![film("a", 5, ""), film("b", 4, ""), film("c", 4, "")]);
		assert_eq!(catalog.len(), 3);
		assert_eq!(catalog.average_display(), "4.3");
		assert_eq!(catalog.entries()[2].position, Position(2));
	}

	#[rstest]
	#[case(&[4, 4, 4, 5], "4.3")]
	#[case(&[1, 1, 1, 2], "1.3")]
	#[case(&[3, 3, 3, 4], "3.3")]
	#[case(&[5, 5, 5, 4], "4.8")]
	#[case(&[2, 3], "2.5")]
	#[case(&[5, 5, 5, 5, 5, 5, 5, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4], "4.3")]
	fn average_ties_round_up(#[case] ratings: &[u8], #[case] shown: &str) {
		assert_eq!(rated(ratings).average_display(), shown);
	}

	#[test]
	fn entry_display() {
		let catalog = Catalog::from_films(vec![film("Inception", 5, "Amazing visuals and story"), film("Cats", 1, "")]);
		assert_eq!(
			catalog.entries()[0].to_string(),
			"#0 Inception [*****] Loved It!: Amazing visuals and story"
		);
		assert_eq!(catalog.entries()[1].to_string(), "#1 Cats [*    ] Not Good");
	}
}
