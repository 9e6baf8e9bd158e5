//! Word-level Markov chain text generation library.
//!
//! This crate provides:
//! - A fixed-order word model learned from a token sequence
//! - Bounded random walks over that model, with an injectable random source
//! - Sentence-aware generation
//! - Small I/O helpers to tokenize a corpus and format the output
//!
//! Typical use: build a `ChainModel`, `train` it once, then call a
//! `Generator` as many times as needed.

/// Error type shared by the model and the generator.
pub mod error;

/// Word model and generation logic.
pub mod model;

/// I/O utilities (corpus loading, tokenizing, output formatting).
pub mod io;

pub use error::ChainError;
pub use model::chain_model::ChainModel;
pub use model::followers::Followers;
pub use model::generator::{Generator, StartSeed};
pub use model::token::Token;

/// Builds a word model of order `order` from a raw corpus.
///
/// # Errors
/// Returns `ChainError::InvalidOrder` if `order == 0`.
pub fn build_word_model(corpus: &str, order: usize) -> Result<ChainModel, ChainError> {
	let mut model = ChainModel::new(order)?;
	model.train(&io::split_words(corpus));
	Ok(model)
}

/// Builds a model from `corpus` and generates up to `length` words from it.
///
/// # Errors
/// - `ChainError::InvalidOrder` if `order == 0`
/// - `ChainError::EmptyModel` if the corpus holds `order` words or fewer
pub fn generate_words(corpus: &str, order: usize, length: usize) -> Result<Vec<String>, ChainError> {
	let model = build_word_model(corpus, order)?;
	Generator::new(&model).generate(length)
}

/// Builds a sequence model of order `order`, one sequence per non-empty line.
///
/// Generation from such a model starts at the beginning of a line and stops
/// at the end of one (see `Generator::generate_sequence`).
///
/// # Errors
/// Returns `ChainError::InvalidOrder` if `order == 0`.
pub fn build_sequence_model(corpus: &str, order: usize) -> Result<ChainModel<Token<String>>, ChainError> {
	let mut model = ChainModel::new(order)?;
	for sequence in io::split_sequences(corpus) {
		model.train_sequence(&sequence);
	}
	Ok(model)
}
