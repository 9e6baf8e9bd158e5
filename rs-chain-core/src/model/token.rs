/// A word, or the boundary of a discrete input sequence.
///
/// Models trained with `ChainModel::train_sequence` work on tokens instead of
/// bare words: every sequence is padded with `order` boundaries in front and
/// one after. The all-boundary context therefore leads to the first words of
/// the sequences, and reaching a boundary ends a generated sequence.
///
/// The boundary is its own variant, so no word of the corpus can collide with it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token<W> {
	Boundary,
	Word(W),
}

impl<W> Token<W> {
	/// Returns the word, or `None` for a boundary.
	pub fn word(&self) -> Option<&W> {
		match self {
			Token::Boundary => None,
			Token::Word(word) => Some(word),
		}
	}

	pub fn is_boundary(&self) -> bool {
		matches!(self, Token::Boundary)
	}
}
