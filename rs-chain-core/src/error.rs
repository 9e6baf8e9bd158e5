/// Errors raised by the chain model and the generator.
///
/// Every variant carries the name of the failing operation and the model
/// order, so a caller can tell whether the training data was simply too small.
///
/// A walk that reaches a dead end is not an error: the generator returns the
/// shorter sequence it has produced so far.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
	#[error("order must be >= 1, got {0}")]
	InvalidOrder(usize),

	#[error("{operation}: model of order {order} has no trained contexts (train it on at least {} tokens)", .order + 1)]
	EmptyModel { operation: &'static str, order: usize },

	#[error("{operation}: context has {got} words, model of order {order} expects {order}")]
	InvalidContext { operation: &'static str, order: usize, got: usize },

	#[error("merge: order mismatch (self={left}, other={right})")]
	OrderMismatch { left: usize, right: usize },

	#[error("{operation}: no context of the model of order {order} ends a sentence")]
	NoSentenceStart { operation: &'static str, order: usize },

	#[error("{operation}: model of order {order} was not trained on sequences (no start context)")]
	NoSequenceStart { operation: &'static str, order: usize },
}
