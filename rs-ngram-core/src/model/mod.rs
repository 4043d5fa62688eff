//! Top-level module for the n-gram language model system.
//!
//! This crate provides a fixed-order word n-gram model, including:
//! - N-gram extraction and frequency training (`NGramModel`)
//! - Maximum-likelihood and Laplace-smoothed probability tables
//! - Internal per-prefix transition bookkeeping (`State`)
//! - Generation configuration (`GenerationInput`)
//! - A random-walk sequence generator (`Generator`)
//! - Perplexity evaluation of probability sequences (`evaluator`)

/// Fixed-order n-gram model (`n >= 1`).
///
/// Handles token ingestion, transition counting, probability table
/// derivation (raw and smoothed), and model merging.
pub mod ngram_model;

/// Random-walk sequence generation over a trained model.
///
/// Exposes seed selection, candidate sampling and bounded-length walks
/// with a caller-supplied random source.
pub mod generator;

/// Generation parameter structure (`GenerationInput`).
///
/// Stores the length bound, the start-seed strategy and the candidate
/// sampling strategy used by `Generator`.
pub mod generation_input;

/// Perplexity evaluation of per-token probability sequences.
///
/// Also hosts the smoothed lookup bridging a trained model to the
/// evaluation metric.
pub mod evaluator;

/// Internal representation of a single n-gram state (prefix).
///
/// Tracks outgoing transitions and supports random continuation sampling.
/// This module is not exposed publicly.
mod state;
