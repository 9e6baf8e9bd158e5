use rand::Rng;
use rand::seq::IndexedRandom;

/// Multiset of the words observed right after one context.
///
/// Conceptually, this is the set of outgoing edges of a node in the Markov
/// chain. Followers are stored as they were observed, duplicates included, so
/// a word seen `k` times has weight `k`.
///
/// ## Responsibilities:
/// - Accumulate followers during training
/// - Pick the next word by uniform sampling over the stored list
/// - Merge with the followers of the same context from another model
///
/// ## Invariants
/// - A `Followers` owned by a `ChainModel` is never empty
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Followers<W> {
	/// Observed followers, in observation order.
	/// Example: ["cat", "dog", "cat"]
	words: Vec<W>,
}

impl<W> Followers<W> {
	/// Creates a multiset holding a single observation.
	pub(crate) fn with_first(word: W) -> Self {
		Self { words: vec![word] }
	}

	/// Records one more occurrence of `word`.
	pub(crate) fn push(&mut self, word: W) {
		self.words.push(word);
	}

	/// Total number of observations, duplicates included.
	pub fn len(&self) -> usize {
		self.words.len()
	}

	pub fn is_empty(&self) -> bool {
		self.words.is_empty()
	}

	/// Iterates over every observation, duplicates included.
	pub fn iter(&self) -> impl Iterator<Item=&W> {
		self.words.iter()
	}

	pub fn as_slice(&self) -> &[W] {
		&self.words
	}

	/// Picks a follower at random.
	///
	/// The index is drawn uniformly over the stored list, which makes the
	/// probability of a word proportional to its number of occurrences.
	///
	/// Returns `None` if there is nothing to choose from.
	pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&W> {
		self.words.choose(rng)
	}
}

impl<W: PartialEq> Followers<W> {
	/// Multiplicity of `word` in the multiset.
	pub fn count(&self, word: &W) -> usize {
		self.words.iter().filter(|w| *w == word).count()
	}

	pub fn contains(&self, word: &W) -> bool {
		self.words.contains(word)
	}
}

impl<W: Clone> Followers<W> {
	/// Appends every observation of `other`.
	///
	/// Used to combine partial models trained on different chunks of a corpus.
	pub(crate) fn merge(&mut self, other: &Self) {
		self.words.extend(other.words.iter().cloned());
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn keeps_duplicates() {
		let mut followers = Followers::with_first("cat");
		followers.push("dog");
		followers.push("cat");

		assert_eq!(followers.len(), 3);
		assert_eq!(followers.count(&"cat"), 2);
		assert_eq!(followers.count(&"dog"), 1);
		assert_eq!(followers.count(&"bird"), 0);
	}

	#[test]
	fn choose_is_weighted_by_occurrences() {
		let mut followers = Followers::with_first("rare");
		for _ in 0..9 {
			followers.push("common");
		}

		let mut rng = StdRng::seed_from_u64(7);
		let common = (0..10_000)
			.filter(|_| followers.choose(&mut rng) == Some(&"common"))
			.count();

		// Expected 9000
		assert!((8_500..=9_500).contains(&common), "common={common}");
	}

	#[test]
	fn merge_appends_observations() {
		let mut left = Followers::with_first("a".to_owned());
		let mut right = Followers::with_first("a".to_owned());
		right.push("b".to_owned());

		left.merge(&right);

		assert_eq!(left.as_slice(), ["a", "a", "b"]);
	}
}
