//! Top-level module for the word chain.
//!
//! This module provides:
//! - A fixed-order word model (`ChainModel`)
//! - The follower multiset of one context (`Followers`)
//! - A random walk over a trained model (`Generator`)
//! - Sequence boundaries for models of discrete sequences (`Token`)

/// Fixed-order Markov chain over words (`order >= 1`).
///
/// Handles token ingestion (serial or parallel), follower lookup,
/// and model merging.
pub mod chain_model;

/// Multiset of the words observed after one context.
///
/// Keeps duplicates, so uniform sampling is weighted by frequency.
pub mod followers;

/// Random walk over a `ChainModel`.
///
/// Exposes seed selection, bounded generation with an injectable random
/// source, and sentence-aware generation.
pub mod generator;

/// Word-or-boundary token used by sequence models.
pub mod token;
