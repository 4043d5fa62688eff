use std::collections::BTreeMap;

use rand::Rng;

use serde::{Deserialize, Serialize};


/// Represents a state in an n-gram model.
///
/// A `State` corresponds to a fixed (n-1)-token prefix (`key`) and stores
/// all observed transitions from this prefix to the next token.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations. The total weight of the
/// outgoing edges is the context count of the prefix: every counted
/// occurrence of the prefix is an occurrence followed by some token.
///
/// ## Responsibilities:
/// - Accumulate transition occurrences during training
/// - Sample the next token, uniformly or weighted by occurrences
/// - Merge with another state having the same key (parallel training support)
///
/// ## Invariants
/// - All transitions belong to the same `key`
/// - Each transition occurrence count is strictly positive
///
/// Transitions are kept in a `BTreeMap` so that iteration order is fixed,
/// which makes sampling with a seeded random source reproducible across runs.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct State {
	/// Identifier of the state ((n-1)-token prefix).
	key: Vec<String>,
	/// Outgoing transitions indexed by the next token.
	/// The value represents how many times this transition was observed.
	/// Example: { "love" => 2, "hate" => 1 }
	transitions: BTreeMap<String, usize>
}

impl State {
	/// Creates a new empty state for the given prefix.
	pub(crate) fn new(key: &[String]) -> Self {
		Self {
			key: key.to_vec(),
			transitions: BTreeMap::new(),
		}
	}

	/// Records an occurrence of a transition toward `next_token`.
	///
	/// - If the transition already exists, its occurrence count is increased.
	/// - Otherwise, a new transition is created with an initial count of 1.
	pub(crate) fn add_transition(&mut self, next_token: &str) {
		*self.transitions.entry(next_token.to_owned()).or_insert(0) += 1;
	}

	/// Total number of observed occurrences of this prefix.
	///
	/// This is the context count used as the conditional-probability
	/// denominator: the sum of all transition occurrences.
	pub(crate) fn count(&self) -> usize {
		self.transitions.values().sum()
	}

	/// Number of occurrences of the transition toward `next_token` (0 if unseen).
	pub(crate) fn transition_count(&self, next_token: &str) -> usize {
		self.transitions.get(next_token).copied().unwrap_or(0)
	}

	/// Number of distinct continuations observed from this prefix.
	pub(crate) fn distinct(&self) -> usize {
		self.transitions.len()
	}

	/// Iterates over `(next_token, occurrences)` pairs in token order.
	pub(crate) fn transitions(&self) -> impl Iterator<Item = (&str, usize)> {
		self.transitions.iter().map(|(token, occurrence)| (token.as_str(), *occurrence))
	}

	/// The distinct continuation at position `index` in token order.
	///
	/// Used for uniform sampling across all observed n-grams of a model.
	pub(crate) fn nth_continuation(&self, index: usize) -> Option<&str> {
		self.transitions.keys().nth(index).map(String::as_str)
	}

	/// Samples the next token uniformly among distinct continuations.
	///
	/// Every observed continuation has the same selection probability,
	/// regardless of how often it was observed.
	///
	/// Returns `None` if the state has no transitions.
	pub(crate) fn choose_uniform<R: Rng>(&self, rng: &mut R) -> Option<&str> {
		if self.transitions.is_empty() {
			return None;
		}
		let index = rng.random_range(0..self.transitions.len());
		self.nth_continuation(index)
	}

	/// Samples the next token using weighted random sampling.
	///
	/// The probability of selecting a token is proportional to its
	/// occurrence count.
	///
	/// This method performs:
	/// - an O(n) scan over the transitions
	/// - a cumulative subtraction to select a bucket
	///
	/// Returns `None` if the state has no transitions.
	pub(crate) fn choose_weighted<R: Rng>(&self, rng: &mut R) -> Option<&str> {
		if self.transitions.is_empty() {
			return None;
		}

		let total = self.count();
		if total == 0 {
			// Should not happen due to invariants, but kept for safety
			return None;
		}

		// Randomly select a token
		let mut r = rng.random_range(0..total);

		let mut fallback: Option<&str> = None;
		for (next_token, occurrence) in &self.transitions {
			if r < *occurrence {
				return Some(next_token);
			}
			r -= occurrence;
			fallback = Some(next_token);
		}

		// Fallback: should not happen, but kept for safety.
		fallback
	}

	/// Merges another state into this one.
	///
	/// Both states must represent the same prefix (`key`).
	/// Transition occurrence counts are summed.
	///
	/// This method is intended for parallel training,
	/// where multiple partial models are combined into a single one.
	///
	/// # Errors
	/// Returns an error if the state keys do not match.
	pub(crate) fn merge(&mut self, other: &Self) -> Result<(), String> {
		if self.key != other.key {
			return Err("Key mismatch".to_owned());
		}

		for (next_token, occurrence) in &other.transitions {
			*self.transitions.entry(next_token.clone()).or_insert(0) += *occurrence;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn prefix(tokens: &[&str]) -> Vec<String> {
		tokens.iter().map(|t| (*t).to_owned()).collect()
	}

	#[test]
	fn transitions_accumulate() {
		let mut state = State::new(&prefix(&["I"]));
		state.add_transition("love");
		state.add_transition("love");
		state.add_transition("hate");

		assert_eq!(state.count(), 3);
		assert_eq!(state.distinct(), 2);
		assert_eq!(state.transition_count("love"), 2);
		assert_eq!(state.transition_count("hate"), 1);
		assert_eq!(state.transition_count("unknown"), 0);
	}

	#[test]
	fn uniform_sampling_only_returns_observed_continuations() {
		let mut state = State::new(&prefix(&["I"]));
		state.add_transition("love");
		state.add_transition("love");
		state.add_transition("hate");

		let mut rng = StdRng::seed_from_u64(7);
		for _ in 0..50 {
			let next = state.choose_uniform(&mut rng).unwrap();
			assert!(next == "love" || next == "hate");
		}
	}

	#[test]
	fn weighted_sampling_respects_single_transition() {
		let mut state = State::new(&prefix(&["the"]));
		state.add_transition("end");

		let mut rng = StdRng::seed_from_u64(0);
		for _ in 0..10 {
			assert_eq!(state.choose_weighted(&mut rng), Some("end"));
		}
	}

	#[test]
	fn sampling_empty_state_returns_none() {
		let state = State::new(&prefix(&["alone"]));
		let mut rng = StdRng::seed_from_u64(1);
		assert_eq!(state.choose_uniform(&mut rng), None);
		assert_eq!(state.choose_weighted(&mut rng), None);
	}

	#[test]
	fn merge_sums_occurrences() {
		let mut left = State::new(&prefix(&["I"]));
		left.add_transition("love");

		let mut right = State::new(&prefix(&["I"]));
		right.add_transition("love");
		right.add_transition("code");

		left.merge(&right).unwrap();
		assert_eq!(left.transition_count("love"), 2);
		assert_eq!(left.transition_count("code"), 1);
		assert_eq!(left.count(), 3);
	}

	#[test]
	fn merge_rejects_key_mismatch() {
		let mut left = State::new(&prefix(&["I"]));
		let right = State::new(&prefix(&["you"]));
		assert!(left.merge(&right).is_err());
	}
}
