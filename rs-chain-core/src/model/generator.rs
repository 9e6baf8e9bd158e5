use std::hash::Hash;

use log::debug;
use rand::Rng;
use rand::rngs::ThreadRng;
use rand::seq::IndexedRandom;

use crate::error::ChainError;
use crate::model::chain_model::ChainModel;
use crate::model::token::Token;

/// Characters marking the end of a sentence.
const SENTENCE_END: [char; 5] = ['.', '!', '?', '"', '\''];

/// Shortest sentence run accepted by `generate_sentences`.
const MIN_SENTENCE_WORDS: usize = 4;

/// Number of attempts made by `generate_sentences` before giving up.
const MAX_SENTENCE_TRIES: usize = 100;

/// Strategy used to select the starting context of a walk.
///
/// # Variants
/// - `Random`: pick one of the model's contexts uniformly at random.
/// - `Custom(words)`: start from the given words; they must hold exactly
///   `order` words.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartSeed<W> {
	Random,
	Custom(Vec<W>),
}

/// Random walk over a trained `ChainModel`.
///
/// # Responsibilities
/// - Select a starting context
/// - Extend the output one sampled follower at a time, sliding the context
/// - Stop early on a dead end
///
/// The generator only borrows the model and owns its random source. It keeps
/// no state between calls besides that source.
#[derive(Debug)]
pub struct Generator<'m, W = String, R = ThreadRng> {
	model: &'m ChainModel<W>,
	rng: R,
}

impl<'m, W> Generator<'m, W, ThreadRng> {
	/// Creates a generator drawing from the thread-local random source.
	pub fn new(model: &'m ChainModel<W>) -> Self {
		Self { model, rng: rand::rng() }
	}
}

impl<'m, W, R> Generator<'m, W, R>
where
	W: Eq + Hash + Clone,
	R: Rng,
{
	/// Creates a generator with an injected random source.
	///
	/// Combined with a seeded generator (ex. `StdRng::seed_from_u64`), the
	/// output is reproducible.
	pub fn with_rng(model: &'m ChainModel<W>, rng: R) -> Self {
		Self { model, rng }
	}

	/// Returns the model this generator walks over.
	pub fn model(&self) -> &'m ChainModel<W> {
		self.model
	}

	/// Generates up to `length` words, starting from a random context.
	///
	/// # Returns
	/// - `Ok(words)` with exactly `length` words, or fewer if a dead end was
	///   reached. The first `order` words are the starting context.
	///
	/// # Errors
	/// Returns `ChainError::EmptyModel` if the model has no context.
	pub fn generate(&mut self, length: usize) -> Result<Vec<W>, ChainError> {
		self.generate_with(&StartSeed::Random, length)
	}

	/// Generates up to `length` words, starting from `start_seed`.
	///
	/// # Behavior
	/// - `length == 0` returns an empty sequence without looking at the model.
	/// - The starting context is emitted first, cut to `length` if needed.
	/// - Each following word is drawn from the followers of the last `order`
	///   words emitted.
	/// - A context without followers ends the walk (short output, not an error).
	///   A custom seed unknown to the model ends it right away.
	///
	/// # Errors
	/// - `ChainError::EmptyModel` if a random seed is requested from an empty model.
	/// - `ChainError::InvalidContext` if a custom seed does not hold `order` words.
	pub fn generate_with(&mut self, start_seed: &StartSeed<W>, length: usize) -> Result<Vec<W>, ChainError> {
		if length == 0 {
			return Ok(Vec::new());
		}

		let mut output = match start_seed {
			StartSeed::Random => self.random_seed("generate")?,
			StartSeed::Custom(words) => {
				if words.len() != self.model.order() {
					return Err(ChainError::InvalidContext {
						operation: "generate",
						order: self.model.order(),
						got: words.len(),
					});
				}
				words.clone()
			}
		};
		output.truncate(length);

		self.extend(&mut output, length)?;
		Ok(output)
	}

	/// Picks a context uniformly among all the model's contexts.
	fn random_seed(&mut self, operation: &'static str) -> Result<Vec<W>, ChainError> {
		let empty = ChainError::EmptyModel { operation, order: self.model.order() };
		if self.model.is_empty() {
			return Err(empty);
		}

		let index = self.rng.random_range(0..self.model.len());
		self.model.context_at(index).map(<[W]>::to_vec).ok_or(empty)
	}

	/// Extends `output` until it holds `length` words or a dead end is reached.
	fn extend(&mut self, output: &mut Vec<W>, length: usize) -> Result<(), ChainError> {
		let model = self.model;
		let order = model.order();

		while output.len() < length {
			let context = &output[output.len() - order..];
			let next = match model.followers_of(context)? {
				Some(followers) => followers.choose(&mut self.rng),
				None => None,
			};

			match next {
				Some(word) => output.push(word.clone()),
				None => {
					debug!("generate: dead end after {} of {} words", output.len(), length);
					break;
				}
			}
		}

		Ok(())
	}
}

impl<'m, W, R> Generator<'m, W, R>
where
	W: Eq + Hash + Clone + AsRef<str>,
	R: Rng,
{
	/// Generates text that (hopefully) reads as complete sentences.
	///
	/// # Behavior
	/// - Starts from a context whose last word ends with a period, so the
	///   first generated word is likely the start of a sentence.
	/// - Walks up to `length` words after that context; the context itself is
	///   not part of the output.
	/// - Drops the dangling words after the last sentence end
	///   (`.`, `!`, `?`, `"`, `'`).
	/// - Retries while fewer than 4 words remain; after 100 attempts the last
	///   attempt is returned as is.
	///
	/// `length == 0` returns an empty sequence without looking at the model.
	///
	/// # Errors
	/// - `ChainError::EmptyModel` if the model has no context.
	/// - `ChainError::NoSentenceStart` if no context ends with a period.
	pub fn generate_sentences(&mut self, length: usize) -> Result<Vec<W>, ChainError> {
		let model = self.model;
		let order = model.order();

		if length == 0 {
			return Ok(Vec::new());
		}
		if model.is_empty() {
			return Err(ChainError::EmptyModel { operation: "generate_sentences", order });
		}

		let starts: Vec<&[W]> = model
			.contexts()
			.filter(|context| context.last().is_some_and(|word| word.as_ref().ends_with('.')))
			.collect();
		if starts.is_empty() {
			return Err(ChainError::NoSentenceStart { operation: "generate_sentences", order });
		}

		let mut chain = Vec::new();
		for attempt in 1..=MAX_SENTENCE_TRIES {
			// Should not fail, `starts` is not empty
			let Some(start) = starts.choose(&mut self.rng) else { break };

			let mut output = start.to_vec();
			self.extend(&mut output, length.saturating_add(order))?;
			chain = output.split_off(order);

			if let Some(last_end) = chain.iter().rposition(|word| Self::ends_sentence(word)) {
				chain.truncate(last_end + 1);
			} else {
				chain.clear();
			}

			if chain.len() >= MIN_SENTENCE_WORDS {
				return Ok(chain);
			}
			debug!("generate_sentences: attempt {attempt} kept only {} words", chain.len());
		}

		Ok(chain)
	}

	fn ends_sentence(word: &W) -> bool {
		word.as_ref().ends_with(SENTENCE_END)
	}
}

impl<'m, W, R> Generator<'m, Token<W>, R>
where
	W: Eq + Hash + Clone,
	R: Rng,
{
	/// Generates one sequence from a model trained with `train_sequence`.
	///
	/// # Behavior
	/// - Starts from the all-boundary context, so the first word is the first
	///   word of some training sequence.
	/// - Stops when a boundary is drawn (end of a training sequence), or once
	///   `max_size` words have been generated.
	/// - Boundaries are never part of the output.
	/// - `max_size == Some(0)` returns an empty sequence without looking at the model.
	///
	/// # Errors
	/// - `ChainError::EmptyModel` if the model has no context.
	/// - `ChainError::NoSequenceStart` if the model was never trained on a sequence.
	pub fn generate_sequence(&mut self, max_size: Option<usize>) -> Result<Vec<W>, ChainError> {
		let model = self.model;
		let order = model.order();

		if max_size == Some(0) {
			return Ok(Vec::new());
		}
		if model.is_empty() {
			return Err(ChainError::EmptyModel { operation: "generate_sequence", order });
		}

		let mut context = model.start_context();
		if model.followers_of(&context)?.is_none() {
			return Err(ChainError::NoSequenceStart { operation: "generate_sequence", order });
		}

		let mut sequence = Vec::new();
		loop {
			let next = match model.followers_of(&context)? {
				Some(followers) => followers.choose(&mut self.rng),
				None => None,
			};

			let word = match next {
				Some(Token::Word(word)) => word,
				Some(Token::Boundary) => break,
				None => {
					// Only reachable when plain `train` was mixed in
					debug!("generate_sequence: dead end after {} words", sequence.len());
					break;
				}
			};

			sequence.push(word.clone());
			if max_size.is_some_and(|max| sequence.len() >= max) {
				break;
			}

			// Slide the context
			context.rotate_left(1);
			context[order - 1] = Token::Word(word.clone());
		}

		Ok(sequence)
	}
}
