use std::hash::Hash;
use std::iter;
use std::sync::mpsc;
use std::thread;

use indexmap::IndexMap;
use log::debug;

use super::followers::Followers;
use super::token::Token;
use crate::error::ChainError;

/// Number of chunks per CPU used by `train_parallel`.
const CHUNK_FACTOR: usize = 8;

/// Word-level Markov chain of a fixed order.
///
/// The `ChainModel` maps every context (a run of `order` consecutive words)
/// seen in the training data to the multiset of words that followed it.
///
/// # Responsibilities
/// - Build the model from token sequences, additively across calls
/// - Expose the followers of a given context
/// - Expose the contexts themselves, for seed selection
/// - Merge with another model of the same order
///
/// # Invariants
/// - `order` is always >= 1 and never changes
/// - Every key holds exactly `order` words
/// - Every key maps to a non-empty `Followers`
/// - Keys keep their first-seen order, so a seeded random source yields the
///   same walk on every run
#[derive(Clone, Debug)]
pub struct ChainModel<W = String> {
	/// Number of preceding words forming a context
	order: usize, // must be >= 1

	/// Mapping from a context to the words observed after it
	contexts: IndexMap<Vec<W>, Followers<W>>,
}

impl<W> ChainModel<W> {
	/// Creates an empty model of order `order`.
	///
	/// # Errors
	/// Returns `ChainError::InvalidOrder` if `order == 0`.
	pub fn new(order: usize) -> Result<Self, ChainError> {
		if order == 0 {
			return Err(ChainError::InvalidOrder(order));
		}
		Ok(Self { order, contexts: IndexMap::new() })
	}

	/// Returns the fixed context length.
	pub fn order(&self) -> usize {
		self.order
	}

	/// Number of distinct contexts.
	pub fn len(&self) -> usize {
		self.contexts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.contexts.is_empty()
	}

	/// Iterates over the known contexts, in first-seen order.
	pub fn contexts(&self) -> impl Iterator<Item=&[W]> {
		self.contexts.keys().map(Vec::as_slice)
	}

	/// Returns the context stored at `index` (first-seen order).
	pub fn context_at(&self, index: usize) -> Option<&[W]> {
		self.contexts.get_index(index).map(|(context, _)| context.as_slice())
	}
}

/// Two models are equal when they share the order and hold the same
/// followers, in the same observation order, for every context.
impl<W: Eq + Hash> PartialEq for ChainModel<W> {
	fn eq(&self, other: &Self) -> bool {
		self.order == other.order && self.contexts == other.contexts
	}
}

impl<W: Eq + Hash> Eq for ChainModel<W> {}

impl<W: Eq + Hash + Clone> ChainModel<W> {
	/// Trains the model on a sequence of words.
	///
	/// Every window of `order + 1` consecutive tokens records its last token
	/// as a follower of the first `order` tokens.
	///
	/// # Notes
	/// - Statistics accumulate across calls.
	/// - Sequences shorter than `order + 1` are ignored (no window can be formed).
	/// - The last `order` tokens never become contexts, since nothing follows them.
	pub fn train(&mut self, tokens: &[W]) {
		if tokens.len() <= self.order {
			// Too short, no window to record
			debug!("train: {} tokens, order {}: nothing to record", tokens.len(), self.order);
			return;
		}

		for window in tokens.windows(self.order + 1) {
			let (context, follower) = window.split_at(self.order);
			self.record(context, &follower[0]);
		}

		debug!(
			"train: {} tokens, order {}: {} contexts",
			tokens.len(),
			self.order,
			self.contexts.len()
		);
	}

	/// Records one observation of `follower` after `context`.
	fn record(&mut self, context: &[W], follower: &W) {
		// Only allocate a key the first time a context is seen
		match self.contexts.get_mut(context) {
			Some(followers) => followers.push(follower.clone()),
			None => {
				self.contexts.insert(context.to_vec(), Followers::with_first(follower.clone()));
			}
		}
	}

	/// Returns the followers recorded for `context`.
	///
	/// - `Ok(Some(_))` if the context was seen during training
	/// - `Ok(None)` if it was never seen
	///
	/// Reading has no side effect: repeated calls return equal results.
	///
	/// # Errors
	/// Returns `ChainError::InvalidContext` if `context` does not hold exactly
	/// `order` words.
	pub fn followers_of(&self, context: &[W]) -> Result<Option<&Followers<W>>, ChainError> {
		if context.len() != self.order {
			return Err(ChainError::InvalidContext {
				operation: "followers_of",
				order: self.order,
				got: context.len(),
			});
		}
		Ok(self.contexts.get(context))
	}

	/// Merges another model into this one.
	///
	/// # Notes
	/// - Both models must have the same order.
	/// - Followers of matching contexts are concatenated; new contexts are cloned.
	///
	/// # Errors
	/// Returns `ChainError::OrderMismatch` if the orders differ.
	pub fn merge(&mut self, other: &Self) -> Result<(), ChainError> {
		if self.order != other.order {
			return Err(ChainError::OrderMismatch { left: self.order, right: other.order });
		}

		for (context, followers) in &other.contexts {
			if let Some(existing) = self.contexts.get_mut(context) {
				existing.merge(followers);
			} else {
				self.contexts.insert(context.clone(), followers.clone());
			}
		}

		Ok(())
	}
}

impl<W: Eq + Hash + Clone> ChainModel<Token<W>> {
	/// Trains the model on one discrete sequence of words.
	///
	/// The sequence is padded with `order` boundaries in front and one
	/// boundary after it before training, so:
	/// - the all-boundary context records the first word of every sequence
	/// - the context made of the last words records the closing boundary
	///
	/// An empty sequence records a boundary right after the start context.
	pub fn train_sequence(&mut self, words: &[W]) {
		let padded: Vec<Token<W>> = iter::repeat_n(Token::Boundary, self.order)
			.chain(words.iter().cloned().map(Token::Word))
			.chain(iter::once(Token::Boundary))
			.collect();
		self.train(&padded);
	}

	/// Context every generated sequence starts from: `order` boundaries.
	pub fn start_context(&self) -> Vec<Token<W>> {
		vec![Token::Boundary; self.order]
	}
}

impl<W: Eq + Hash + Clone + Send + Sync> ChainModel<W> {
	/// Trains the model on several threads.
	///
	/// # Behavior
	/// - Inputs with fewer windows than chunks are trained on the calling
	///   thread.
	/// - Splits the windows into chunks (based on CPU cores * factor).
	/// - Each chunk is extended by `order` tokens, so windows straddling a
	///   chunk boundary are counted exactly once.
	/// - Trains a partial model per chunk on scoped threads.
	/// - Merges the partial models back in chunk order.
	///
	/// The resulting model is equal to the one `train` would build.
	///
	/// # Errors
	/// Only fails if a merge fails, which cannot happen since every partial
	/// model shares this model's order.
	pub fn train_parallel(&mut self, tokens: &[W]) -> Result<(), ChainError> {
		let windows = tokens.len().saturating_sub(self.order);
		if windows == 0 {
			debug!("train_parallel: {} tokens, order {}: nothing to record", tokens.len(), self.order);
			return Ok(());
		}

		let chunks = num_cpus::get() * CHUNK_FACTOR;
		if windows < chunks {
			// Not worth a thread per chunk
			self.train(tokens);
			return Ok(());
		}
		let chunk_size = windows.div_ceil(chunks);
		let order = self.order;

		let (tx, rx) = mpsc::channel();
		thread::scope(|scope| {
			for (index, start) in (0..windows).step_by(chunk_size).enumerate() {
				let tx = tx.clone();
				let end = (start + chunk_size).min(windows) + order;
				let chunk = &tokens[start..end];

				scope.spawn(move || {
					let mut partial = ChainModel { order, contexts: IndexMap::new() };
					partial.train(chunk);
					// The receiver outlives the scope
					let _ = tx.send((index, partial));
				});
			}
		});
		drop(tx);

		let mut partials: Vec<(usize, ChainModel<W>)> = rx.iter().collect();
		partials.sort_by_key(|(index, _)| *index);

		debug!("train_parallel: merging {} partial models", partials.len());
		for (_, partial) in &partials {
			self.merge(partial)?;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn words(text: &str) -> Vec<String> {
		text.split_whitespace().map(str::to_owned).collect()
	}

	#[test]
	fn rejects_order_zero() {
		assert_eq!(ChainModel::<String>::new(0), Err(ChainError::InvalidOrder(0)));
	}

	#[test]
	fn order_one_records_every_pair() {
		let mut model = ChainModel::new(1).unwrap();
		model.train(&words("a b a c"));

		assert_eq!(model.order(), 1);
		assert_eq!(model.len(), 2);

		let after_a = model.followers_of(&words("a")).unwrap().unwrap();
		assert_eq!(after_a.as_slice(), ["b", "c"]);
		let after_b = model.followers_of(&words("b")).unwrap().unwrap();
		assert_eq!(after_b.as_slice(), ["a"]);

		// Last token of the corpus: nothing follows it
		assert_eq!(model.followers_of(&words("c")).unwrap(), None);
	}

	#[test]
	fn order_two_records_every_window() {
		let mut model = ChainModel::new(2).unwrap();
		model.train(&words("x y z x y w"));

		assert_eq!(model.len(), 3);
		assert_eq!(model.followers_of(&words("x y")).unwrap().unwrap().as_slice(), ["z", "w"]);
		assert_eq!(model.followers_of(&words("y z")).unwrap().unwrap().as_slice(), ["x"]);
		assert_eq!(model.followers_of(&words("z x")).unwrap().unwrap().as_slice(), ["y"]);
		assert_eq!(model.followers_of(&words("y w")).unwrap(), None);
	}

	#[test]
	fn short_input_is_a_no_op() {
		let mut model = ChainModel::new(3).unwrap();
		model.train(&words("too short"));
		model.train(&words("still too short"));
		model.train(&[]);

		assert!(model.is_empty());
	}

	#[test]
	fn training_is_additive() {
		let mut model = ChainModel::new(1).unwrap();
		model.train(&words("the cat"));
		model.train(&words("the dog"));
		model.train(&words("the cat"));

		let followers = model.followers_of(&words("the")).unwrap().unwrap();
		assert_eq!(followers.len(), 3);
		assert_eq!(followers.count(&"cat".to_owned()), 2);
		assert_eq!(followers.count(&"dog".to_owned()), 1);
	}

	#[test]
	fn wrong_context_length_is_rejected() {
		let mut model = ChainModel::new(2).unwrap();
		model.train(&words("x y z"));

		let err = model.followers_of(&words("x")).unwrap_err();
		assert_eq!(err, ChainError::InvalidContext { operation: "followers_of", order: 2, got: 1 });
		assert!(model.followers_of(&words("x y z")).is_err());
	}

	#[test]
	fn reads_have_no_side_effect() {
		let mut model = ChainModel::new(1).unwrap();
		model.train(&words("a b a c"));
		let before = model.clone();

		let first = model.followers_of(&words("a")).unwrap().cloned();
		let second = model.followers_of(&words("a")).unwrap().cloned();
		let _ = model.followers_of(&words("unknown"));

		assert_eq!(first, second);
		assert_eq!(model, before);
	}

	#[test]
	fn contexts_keep_first_seen_order() {
		let mut model = ChainModel::new(1).unwrap();
		model.train(&words("c b a b c"));

		let contexts: Vec<&[String]> = model.contexts().collect();
		assert_eq!(contexts, [words("c"), words("b"), words("a")]);
		assert_eq!(model.context_at(2), Some(words("a").as_slice()));
		assert_eq!(model.context_at(3), None);
	}

	#[test]
	fn merge_sums_followers() {
		let mut left = ChainModel::new(1).unwrap();
		left.train(&words("a b"));
		let mut right = ChainModel::new(1).unwrap();
		right.train(&words("a c d"));

		left.merge(&right).unwrap();

		assert_eq!(left.followers_of(&words("a")).unwrap().unwrap().as_slice(), ["b", "c"]);
		assert_eq!(left.followers_of(&words("c")).unwrap().unwrap().as_slice(), ["d"]);
	}

	#[test]
	fn merge_rejects_other_order() {
		let mut left = ChainModel::<String>::new(1).unwrap();
		let right = ChainModel::<String>::new(2).unwrap();

		assert_eq!(left.merge(&right), Err(ChainError::OrderMismatch { left: 1, right: 2 }));
	}

	#[test]
	fn parallel_training_matches_serial_training() {
		let corpus: Vec<String> = (0..5_000).map(|i| format!("w{}", (i * 7 + i / 3) % 41)).collect();

		for order in 1..=4 {
			let mut serial = ChainModel::new(order).unwrap();
			serial.train(&corpus);
			let mut parallel = ChainModel::new(order).unwrap();
			parallel.train_parallel(&corpus).unwrap();

			assert_eq!(serial, parallel, "order={order}");
			assert!(serial.contexts().eq(parallel.contexts()), "order={order}");
		}
	}

	#[test]
	fn parallel_training_on_short_input() {
		let mut model = ChainModel::new(2).unwrap();
		model.train_parallel(&words("a b")).unwrap();
		assert!(model.is_empty());

		model.train_parallel(&words("a b c")).unwrap();
		assert_eq!(model.len(), 1);
	}

	#[test]
	fn parallel_training_on_small_input_stays_serial() {
		let corpus = words("a b a c a b");
		let mut serial = ChainModel::new(1).unwrap();
		serial.train(&corpus);

		let mut parallel = ChainModel::new(1).unwrap();
		parallel.train_parallel(&corpus).unwrap();
		parallel.train_parallel(&corpus).unwrap();
		serial.train(&corpus);

		assert_eq!(serial, parallel);
		assert_eq!(parallel.followers_of(&words("a")).unwrap().unwrap().len(), 6);
	}

	#[test]
	fn sequence_padding_of_order_two() {
		let mut model = ChainModel::new(2).unwrap();
		model.train_sequence(&[1, 1, 1, 2, 2, 2, 3, 3, 3]);

		use Token::{Boundary as B, Word as W};
		let expected = [
			([B, B], vec![W(1)]),
			([B, W(1)], vec![W(1)]),
			([W(1), W(1)], vec![W(1), W(2)]),
			([W(1), W(2)], vec![W(2)]),
			([W(2), W(2)], vec![W(2), W(3)]),
			([W(2), W(3)], vec![W(3)]),
			([W(3), W(3)], vec![W(3), B]),
		];

		assert_eq!(model.len(), expected.len());
		for (context, followers) in expected {
			assert_eq!(model.followers_of(&context).unwrap().unwrap().as_slice(), followers, "{context:?}");
		}
	}

	#[test]
	fn sequence_padding_of_order_three() {
		let mut model = ChainModel::new(3).unwrap();
		model.train_sequence(&[1, 1, 1, 2, 2, 2, 3, 3, 3]);

		use Token::{Boundary as B, Word as W};
		let expected = [
			([B, B, B], W(1)),
			([B, B, W(1)], W(1)),
			([B, W(1), W(1)], W(1)),
			([W(1), W(1), W(1)], W(2)),
			([W(1), W(1), W(2)], W(2)),
			([W(1), W(2), W(2)], W(2)),
			([W(2), W(2), W(2)], W(3)),
			([W(2), W(2), W(3)], W(3)),
			([W(2), W(3), W(3)], W(3)),
			([W(3), W(3), W(3)], B),
		];

		assert_eq!(model.len(), expected.len());
		assert_eq!(model.context_at(0), Some(model.start_context().as_slice()));
		for (context, follower) in expected {
			assert_eq!(model.followers_of(&context).unwrap().unwrap().as_slice(), [follower], "{context:?}");
		}
	}

	#[test]
	fn empty_sequence_records_a_boundary() {
		let mut model = ChainModel::<Token<String>>::new(1).unwrap();
		model.train_sequence(&[]);

		let followers = model.followers_of(&model.start_context()).unwrap().unwrap();
		assert_eq!(followers.as_slice(), [Token::Boundary]);
	}

	#[test]
	fn generic_over_word_type() {
		let mut model = ChainModel::new(2).unwrap();
		model.train(&[1, 1, 1, 2, 2, 2, 3, 3, 3]);

		assert_eq!(model.followers_of(&[1, 1]).unwrap().unwrap().as_slice(), [1, 2]);
		assert_eq!(model.followers_of(&[3, 3]).unwrap().unwrap().as_slice(), [3]);
	}
}
