use rand::Rng;

use super::generation_input::{GenerationInput, Sampling, StartSeed};
use super::ngram_model::NGramModel;

/// Random-walk sequence generator over a trained n-gram model.
///
/// # Responsibilities
/// - Seed the walk (random observed n-gram, or caller-provided tokens)
/// - Look up the candidate set of the current context through the model's
///   per-prefix index (O(candidates) per step, not O(table size))
/// - Sample continuations until the length bound or a context with no
///   learned continuation is reached
///
/// The generator borrows the model read-only: one trained model can back
/// any number of concurrent generations, each owning its random source.
#[derive(Debug)]
pub struct Generator<'a> {
	model: &'a NGramModel,
}

impl<'a> Generator<'a> {
	/// Creates a generator over a trained model.
	pub fn new(model: &'a NGramModel) -> Self {
		Self { model }
	}

	/// Generates a token sequence by random walk.
	///
	/// # Parameters
	/// - `input`: Length bound, start-seed strategy and sampling strategy.
	/// - `rng`: Caller-owned random source. Seed it for reproducible output;
	///   distinct sources make concurrent generations independent.
	///
	/// # Returns
	/// - `Ok(Vec<String>)`: The accumulated sequence. With a random seed its
	///   length is in `[n, max_length]` inclusive; it stops short of
	///   `max_length` when a context has no learned continuation, which is
	///   a normal stopping condition.
	/// - `Err(String)`: If `max_length < n`, if a custom seed is shorter
	///   than `n - 1` tokens, or if the model is empty and a random start
	///   n-gram cannot be drawn.
	///
	/// # Behavior
	/// 1. Seed the sequence: `StartSeed::Random` draws a uniformly random
	///    observed n-gram; `StartSeed::Custom` copies the caller's tokens.
	/// 2. Until `max_length` tokens are accumulated: form the context from
	///    the last `n - 1` tokens, fetch its candidate set, stop early if
	///    it is empty, otherwise sample one candidate and append its final
	///    token.
	///
	/// # Notes
	/// - `Sampling::Uniform` draws uniformly among distinct candidates;
	///   `Sampling::Weighted` draws proportionally to observation counts.
	/// - A custom seed's tokens count toward `max_length`.
	pub fn generate<R: Rng>(&self, input: &GenerationInput, rng: &mut R) -> Result<Vec<String>, String> {
		let n = self.model.order();
		if input.max_length < n {
			return Err(format!("max_length must be >= n, got {} < {}", input.max_length, n));
		}

		let mut sequence: Vec<String> = match &input.start_seed {
			StartSeed::Random => self
				.model
				.random_ngram(rng)
				.ok_or_else(|| "no n-gram available to start generation".to_owned())?,
			StartSeed::Custom(tokens) => {
				if tokens.len() < n - 1 {
					return Err(format!(
						"custom seed must contain at least {} tokens, got {}",
						n - 1,
						tokens.len()
					));
				}
				tokens.clone()
			}
		};

		while sequence.len() < input.max_length {
			let context = &sequence[sequence.len() - (n - 1)..];
			let next_token = match self.model.state(context) {
				Some(state) => match input.sampling {
					Sampling::Uniform => state.choose_uniform(rng),
					Sampling::Weighted => state.choose_weighted(rng),
				},
				None => None,
			};

			match next_token {
				Some(token) => sequence.push(token.to_owned()),
				// The walk reached a context with no learned continuation
				None => break,
			}
		}

		Ok(sequence)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tokenizer::tokenize;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn trained(corpus: &str, n: usize) -> NGramModel {
		NGramModel::from_tokens(&tokenize(corpus), n).unwrap()
	}

	#[test]
	fn generated_length_stays_within_bounds() {
		let model = trained("the cat sat on the mat and the cat slept on the mat", 2);
		let generator = Generator::new(&model);
		let input = GenerationInput::new(8);

		let mut rng = StdRng::seed_from_u64(42);
		for _ in 0..100 {
			let sequence = generator.generate(&input, &mut rng).unwrap();
			assert!(sequence.len() >= 2 && sequence.len() <= 8);
		}
	}

	#[test]
	fn walk_terminates_early_without_continuation() {
		// "c" is never followed by anything, every walk dies there
		let model = trained("a b c", 2);
		let generator = Generator::new(&model);
		let input = GenerationInput::new(50);

		let mut rng = StdRng::seed_from_u64(3);
		for _ in 0..20 {
			let sequence = generator.generate(&input, &mut rng).unwrap();
			assert!(sequence.len() <= 3);
			assert_eq!(sequence.last().map(String::as_str), Some("c"));
		}
	}

	#[test]
	fn custom_seed_drives_a_deterministic_chain() {
		let model = trained("a b c d e", 2);
		let generator = Generator::new(&model);
		let input = GenerationInput {
			max_length: 5,
			start_seed: StartSeed::Custom(vec!["a".to_owned()]),
			sampling: Sampling::Uniform,
		};

		let mut rng = StdRng::seed_from_u64(0);
		let sequence = generator.generate(&input, &mut rng).unwrap();
		assert_eq!(sequence, vec!["a", "b", "c", "d", "e"]);
	}

	#[test]
	fn custom_seed_must_cover_a_context() {
		let model = trained("a b c d", 3);
		let generator = Generator::new(&model);
		let input = GenerationInput {
			max_length: 10,
			start_seed: StartSeed::Custom(vec!["a".to_owned()]),
			sampling: Sampling::Uniform,
		};

		let mut rng = StdRng::seed_from_u64(0);
		assert!(generator.generate(&input, &mut rng).is_err());
	}

	#[test]
	fn same_seed_reproduces_the_same_sequence() {
		let model = trained("the cat sat on the mat and the cat slept on the mat", 2);
		let generator = Generator::new(&model);
		let input = GenerationInput::new(12);

		let mut first_rng = StdRng::seed_from_u64(1234);
		let mut second_rng = StdRng::seed_from_u64(1234);
		let first = generator.generate(&input, &mut first_rng).unwrap();
		let second = generator.generate(&input, &mut second_rng).unwrap();
		assert_eq!(first, second);
	}

	#[test]
	fn weighted_sampling_generates_observed_tokens_only() {
		let model = trained("the cat sat on the mat and the cat slept", 2);
		let generator = Generator::new(&model);
		let input = GenerationInput {
			max_length: 10,
			start_seed: StartSeed::Random,
			sampling: Sampling::Weighted,
		};

		let mut rng = StdRng::seed_from_u64(99);
		let sequence = generator.generate(&input, &mut rng).unwrap();
		let vocabulary = tokenize("the cat sat on the mat and the cat slept");
		for token in &sequence {
			assert!(vocabulary.contains(token));
		}
	}

	#[test]
	fn empty_model_cannot_start_a_random_walk() {
		let model = NGramModel::new(2).unwrap();
		let generator = Generator::new(&model);
		let input = GenerationInput::new(10);

		let mut rng = StdRng::seed_from_u64(0);
		let error = generator.generate(&input, &mut rng).unwrap_err();
		assert!(error.contains("no n-gram available"));
	}

	#[test]
	fn max_length_below_order_is_rejected() {
		let model = trained("a b c d", 3);
		let generator = Generator::new(&model);
		let input = GenerationInput::new(2);

		let mut rng = StdRng::seed_from_u64(0);
		assert!(generator.generate(&input, &mut rng).is_err());
	}

	#[test]
	fn unigram_generation_walks_to_the_bound() {
		let model = trained("a b a b a", 1);
		let generator = Generator::new(&model);
		let input = GenerationInput::new(6);

		let mut rng = StdRng::seed_from_u64(5);
		let sequence = generator.generate(&input, &mut rng).unwrap();
		// Every token is a continuation of the empty context, no early stop
		assert_eq!(sequence.len(), 6);
	}
}
