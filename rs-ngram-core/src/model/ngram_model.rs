use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use rand::Rng;

use serde::{Deserialize, Serialize};
use crate::io::{build_output_path, read_file};
use crate::tokenizer;
use super::state::State;

/// An n-gram: a contiguous window of exactly `n` tokens from a corpus.
///
/// Two n-grams are equal iff all positions match. Immutable once produced.
pub type NGram = Vec<String>;

/// A trained table mapping each observed n-gram to its probability in `(0, 1]`.
pub type ProbabilityTable = HashMap<NGram, f64>;

/// Produces every contiguous window of length `n` over `tokens`,
/// in left-to-right corpus order, duplicates included.
///
/// Returns an empty sequence when `tokens.len() < n` or `n == 0`;
/// short corpora are not an error, they simply yield nothing to count.
pub fn extract_ngrams(tokens: &[String], n: usize) -> Vec<NGram> {
	if n == 0 || tokens.len() < n {
		return Vec::new();
	}
	tokens.windows(n).map(<[String]>::to_vec).collect()
}

/// Represents an n-gram language model over word tokens.
///
/// The `NGramModel` stores states for prefixes of length `n-1`
/// and derives conditional next-token probabilities from the
/// transition counts accumulated while scanning a corpus.
///
/// # Responsibilities
/// - Build the n-gram model from a token sequence in one synchronized scan
/// - Accumulate transition counts for each prefix state
/// - Derive maximum-likelihood and Laplace-smoothed probability tables
/// - Expose candidate continuations for a prefix (generation support)
/// - Merge with another n-gram model of the same order `n`
///
/// # Invariants
/// - `n` is always >= 1
/// - Each state in `states` corresponds to a unique prefix of length `n-1`
///   (for `n == 1` the single prefix is the empty sequence)
/// - All state transitions have occurrence counts >= 1
/// - A prefix's context count is the sum of its transition counts, so the
///   n-gram counts and the context counts always come from the same scan
///   and summing n-gram counts sharing a prefix equals that prefix's
///   context count
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NGramModel {
	/// The order of the model (number of tokens in the n-gram)
	n: usize, // must be >= 1

	/// Mapping from a prefix (length n-1) to its corresponding state
	states: BTreeMap<Vec<String>, State>,

	/// Total number of tokens ingested, across all `add_tokens` calls
	total_tokens: usize,
}

impl NGramModel {
	/// Creates a new, empty n-gram model of order `n`.
	///
	/// # Errors
	/// Returns an error if `n < 1`.
	pub fn new(n: usize) -> Result<Self, String> {
		if n < 1 {
			return Err("n must be >= 1".to_owned());
		}
		Ok(Self { n, states: BTreeMap::new(), total_tokens: 0 })
	}

	/// Creates a model of order `n` and trains it on a token sequence.
	///
	/// A single scan produces both the n-gram counts and the context
	/// counts, so the two can never disagree about which corpus they
	/// were derived from.
	///
	/// # Errors
	/// Returns an error if `n < 1`.
	pub fn from_tokens(tokens: &[String], n: usize) -> Result<Self, String> {
		let mut model = Self::new(n)?;
		model.add_tokens(tokens);
		Ok(model)
	}

	/// Loads a model from a corpus file, with a binary cache and
	/// multithreaded construction.
	///
	/// # Parameters
	/// - `filepath`: Input text file, one sentence per line.
	/// - `n`: Order of the model.
	///
	/// # Returns
	/// - `Ok(NGramModel)`: The trained (or cache-loaded) model.
	/// - `Err(...)`: If file I/O or (de)serialization fails, or `n < 1`.
	///
	/// # Behavior
	/// - Checks for a sibling `.bin` file and loads it via `postcard`
	///   when it holds a model of the requested order; a cache with a
	///   different order is rebuilt and overwritten.
	/// - Otherwise splits the lines into chunks (CPU cores * factor),
	///   trains partial models on threads, merges them, and serializes
	///   the result for future fast loading.
	///
	/// # Notes
	/// - Lines are tokenized with [`tokenizer::tokenize`] (whitespace
	///   split, case preserved).
	/// - N-gram windows never span a line break: each line is ingested
	///   as its own token sequence.
	/// - Uses MPSC channels to collect partial models from threads.
	/// - `unwrap()` on `NGramModel::new` inside threads is safe because
	///   `n` was already validated.
	pub fn from_file<P: AsRef<Path>>(filepath: P, n: usize) -> Result<Self, Box<dyn std::error::Error>> {
		let binary_data_path = build_output_path(&filepath, "bin")?;
		if binary_data_path.exists() {
			let bytes = std::fs::read(&binary_data_path)?;
			let model: Self = postcard::from_bytes(&bytes)?;
			if model.n == n {
				return Ok(model);
			}
			// Stale cache for another order, fall through and rebuild
		}
		Self::read_corpus_file(&filepath, binary_data_path, n)
	}

	/// Reads a corpus file, trains partial models in parallel, merges them,
	/// and serializes the final model.
	///
	/// Counting is a commutative, associative accumulation, so the merge
	/// order of the partial models cannot change the result.
	fn read_corpus_file<PF, PB>(filename: PF, binary_data_path: PB, n: usize) -> Result<Self, Box<dyn std::error::Error>>
	where
		PF: AsRef<Path>,
		PB: AsRef<Path>,
	{
		let mut final_model = Self::new(n)?;

		let lines = read_file(&filename)?;
		if !lines.is_empty() {
			let cpus = num_cpus::get();
			let factor = 8;
			let chunks = cpus * factor;
			let chunk_size = ((lines.len() + chunks - 1) / chunks).max(1);

			let (tx, rx) = mpsc::channel();
			for chunk in lines.chunks(chunk_size) {
				let tx = tx.clone();
				let chunk: Vec<String> = chunk.to_vec();

				thread::spawn(move || {
					let mut partial_model = NGramModel::new(n).unwrap();
					for line in chunk {
						partial_model.add_tokens(&tokenizer::tokenize(&line));
					}
					tx.send(partial_model).expect("Failed to send from thread");
				});
			}
			drop(tx);

			for partial_model in rx.iter() {
				final_model.merge(&partial_model)?;
			}
		}

		let bytes = postcard::to_stdvec(&final_model)?;
		std::fs::write(binary_data_path, bytes)?;

		Ok(final_model)
	}

	/// Adds a token sequence to the model.
	///
	/// Scans every contiguous window of length `n` and updates the state
	/// of the window's prefix with the window's final token.
	///
	/// # Notes
	/// - Sequences shorter than `n` contribute no n-grams (not an error).
	/// - For `n == 1` every token is a transition of the empty prefix,
	///   so the empty prefix's context count equals the token total.
	pub fn add_tokens(&mut self, tokens: &[String]) {
		self.total_tokens += tokens.len();
		if tokens.len() < self.n {
			// Sequence too short, no n-grams to count
			return;
		}

		for window in tokens.windows(self.n) {
			let prefix = &window[..self.n - 1];
			let next_token = &window[self.n - 1];

			// Get or create the state for this prefix
			let state = self.states.entry(prefix.to_vec()).or_insert_with(|| State::new(prefix));
			state.add_transition(next_token);
		}
	}

	/// The order `n` of this model.
	pub fn order(&self) -> usize {
		self.n
	}

	/// Total number of tokens ingested so far.
	pub fn total_tokens(&self) -> usize {
		self.total_tokens
	}

	/// Number of distinct n-grams observed.
	pub fn len(&self) -> usize {
		self.states.values().map(State::distinct).sum()
	}

	/// `true` if no n-gram has been observed yet.
	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Raw frequency of an observed n-gram (0 if unseen or of a wrong length).
	pub fn ngram_count(&self, ngram: &[String]) -> usize {
		if ngram.len() != self.n {
			return 0;
		}
		let (next_token, prefix) = match ngram.split_last() {
			Some(split) => split,
			None => return 0,
		};
		self.states
			.get(prefix)
			.map(|state| state.transition_count(next_token))
			.unwrap_or(0)
	}

	/// Context count of an (n-1)-token prefix (0 if unseen).
	///
	/// Counts the prefix occurrences that were followed by a token; the
	/// sum of the n-gram counts sharing the prefix equals this value.
	pub fn context_count(&self, prefix: &[String]) -> usize {
		self.states.get(prefix).map(State::count).unwrap_or(0)
	}

	/// Iterates over the observed contexts as `(prefix, context count)` pairs.
	pub fn contexts(&self) -> impl Iterator<Item = (&[String], usize)> {
		self.states.iter().map(|(prefix, state)| (prefix.as_slice(), state.count()))
	}

	/// The candidate set of a prefix: every distinct continuation token
	/// observed after it, in token order. Empty if the prefix is unknown.
	pub fn continuations(&self, prefix: &[String]) -> Vec<&str> {
		self.states
			.get(prefix)
			.map(|state| state.transitions().map(|(token, _)| token).collect())
			.unwrap_or_default()
	}

	/// Internal state lookup for the generator.
	pub(crate) fn state(&self, prefix: &[String]) -> Option<&State> {
		self.states.get(prefix)
	}

	/// Derives the maximum-likelihood probability table.
	///
	/// # Behavior
	/// - For `n > 1`: probability of an n-gram is its count divided by
	///   the context count of its prefix.
	/// - For `n == 1`: the prefix is empty and its context count is the
	///   total token count, so unigram probabilities degrade to
	///   count / total tokens through the same formula.
	///
	/// # Notes
	/// - Every entry lies in `(0, 1]`.
	/// - The denominator cannot be zero: a state only exists once it has
	///   at least one transition, and both counts come from the same scan.
	/// - Repeated training on the same corpus yields identical tables,
	///   counting is a pure multiset accumulation.
	pub fn probabilities(&self) -> ProbabilityTable {
		let mut table = ProbabilityTable::new();
		for (prefix, state) in &self.states {
			let context_count = state.count();
			for (next_token, occurrence) in state.transitions() {
				let mut ngram = prefix.clone();
				ngram.push(next_token.to_owned());
				table.insert(ngram, occurrence as f64 / context_count as f64);
			}
		}
		table
	}

	/// Derives the add-one (Laplace) smoothed probability table.
	///
	/// Each observed n-gram with raw count `c` receives
	/// `(c + 1) / (context count + V)` where `V` is the caller-supplied
	/// vocabulary size.
	///
	/// # Notes
	/// - Only observed n-grams receive entries. The mass reserved for
	///   unseen continuations is deliberately not materialized, so the
	///   per-context sums fall short of 1. This is the documented
	///   smoothing approximation, do not renormalize it away. Unseen
	///   continuations are reachable through [`Self::smoothed_probability`].
	/// - `V` must be at least the number of distinct continuations
	///   possible under any prefix, or entries may exceed their nominal
	///   bound. That adequacy is a caller obligation, not a runtime check.
	///
	/// # Errors
	/// Returns an error if `vocabulary_size < 1`.
	pub fn smoothed_probabilities(&self, vocabulary_size: usize) -> Result<ProbabilityTable, String> {
		if vocabulary_size < 1 {
			return Err("vocabulary size must be >= 1".to_owned());
		}

		let mut table = ProbabilityTable::new();
		for (prefix, state) in &self.states {
			let denominator = (state.count() + vocabulary_size) as f64;
			for (next_token, occurrence) in state.transitions() {
				let mut ngram = prefix.clone();
				ngram.push(next_token.to_owned());
				table.insert(ngram, (occurrence + 1) as f64 / denominator);
			}
		}
		Ok(table)
	}

	/// Laplace-smoothed probability of a single n-gram, observed or not.
	///
	/// This is the lookup evaluation runs on: observed n-grams get the
	/// table value `(c + 1) / (context count + V)`; unseen continuations
	/// get the reserved-mass fallback `1 / (context count + V)`, which
	/// degrades to `1 / V` when the prefix itself was never observed.
	///
	/// # Errors
	/// Returns an error if `vocabulary_size < 1` or if `ngram` does not
	/// have exactly `n` tokens.
	pub fn smoothed_probability(&self, ngram: &[String], vocabulary_size: usize) -> Result<f64, String> {
		if vocabulary_size < 1 {
			return Err("vocabulary size must be >= 1".to_owned());
		}
		if ngram.len() != self.n {
			return Err(format!("expected an n-gram of {} tokens, got {}", self.n, ngram.len()));
		}

		let prefix = &ngram[..self.n - 1];
		let count = self.ngram_count(ngram);
		let denominator = (self.context_count(prefix) + vocabulary_size) as f64;
		Ok((count + 1) as f64 / denominator)
	}

	/// Picks a uniformly random n-gram among the distinct observed ones.
	///
	/// Useful for starting a generation sequence.
	/// Returns `None` if the model is empty.
	pub fn random_ngram<R: Rng>(&self, rng: &mut R) -> Option<NGram> {
		let total = self.len();
		if total == 0 {
			return None;
		}

		let mut index = rng.random_range(0..total);
		for (prefix, state) in &self.states {
			if index < state.distinct() {
				// Should not panic, index is within this state's continuations
				let next_token = state.nth_continuation(index)?;
				let mut ngram = prefix.clone();
				ngram.push(next_token.to_owned());
				return Some(ngram);
			}
			index -= state.distinct();
		}

		// Unreachable: index < total and the distinct counts sum to total
		None
	}

	/// Merges another n-gram model into this one.
	///
	/// # Notes
	/// - Both models must have the same order `n`.
	/// - Occurrence counts for matching states and transitions are summed.
	/// - Merging is commutative and associative, which is what makes
	///   sharded parallel training equivalent to a single scan.
	///
	/// # Errors
	/// Returns an error if the model orders do not match.
	pub fn merge(&mut self, other: &Self) -> Result<(), String> {
		if self.n != other.n {
			return Err("N mismatch".to_owned());
		}

		for (key, state) in &other.states {
			if let Some(existing) = self.states.get_mut(key) {
				existing.merge(state)?;
			} else {
				self.states.insert(key.clone(), state.clone());
			}
		}
		self.total_tokens += other.total_tokens;

		Ok(())
	}
}
