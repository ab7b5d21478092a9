use filmreg_types::{FilmRecord, Position};

/// Append-only arena of film records keyed by insertion index.
///
/// Only the contract holds one; records are never updated or removed.
#[derive(Debug, Default)]
pub(crate) struct FilmStore {
	records: Vec<FilmRecord>,
}

impl FilmStore {
	/// Appends `record` and returns the position it was assigned.
	pub(crate) fn push(&mut self, record: FilmRecord) -> (Position, &FilmRecord) {
		let position = Position::from_index(self.records.len());
		self.records.push(record);
		(position, &self.records[self.records.len() - 1])
	}

	pub(crate) fn get(&self, position: Position) -> Option<&FilmRecord> {
		self.records.get(position.index()?)
	}

	pub(crate) fn len(&self) -> u64 {
		self.records.len() as u64
	}

	pub(crate) fn records(&self) -> &[FilmRecord] {
		&self.records
	}
}
