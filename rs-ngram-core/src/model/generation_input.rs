/// Strategy used to select the starting seed when generating a sequence.
///
/// This enum controls how the initial tokens are chosen before the walk begins.
///
/// # Variants
/// - `Random`: seed with a uniformly random n-gram observed by the model.
/// - `Custom(Vec<String>)`: use the provided tokens as the initial sequence;
///   at least `n - 1` tokens are required so a first context can be formed.
#[derive(Clone, Debug, PartialEq)]
pub enum StartSeed {
	Random,
	Custom(Vec<String>),
}

/// Strategy used to sample the next token among a context's candidates.
///
/// # Variants
/// - `Uniform`: every distinct observed continuation is equally likely.
/// - `Weighted`: continuations are drawn proportionally to how often they
///   were observed after the context.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sampling {
	Uniform,
	Weighted,
}

/// Input parameters for generating a sequence from a trained model.
///
/// # Responsibilities
/// - Track the length bound (`max_length`, inclusive, in tokens)
/// - Track the start-seed strategy (`start_seed`)
/// - Track the candidate sampling strategy (`sampling`)
///
/// # Invariants
/// - `max_length` must be >= the model order `n` (checked at generation time,
///   the input does not know `n`)
pub struct GenerationInput {
	/// Maximum length of the generated sequence, in tokens (inclusive).
	pub max_length: usize,

	/// How the initial tokens are chosen.
	pub start_seed: StartSeed,

	/// How the next token is sampled among a context's candidates.
	pub sampling: Sampling,
}

impl GenerationInput {
	/// Creates a `GenerationInput` bounded by `max_length` tokens,
	/// with a random start seed and uniform candidate sampling.
	pub fn new(max_length: usize) -> Self {
		Self {
			max_length,
			start_seed: StartSeed::Random,
			sampling: Sampling::Uniform,
		}
	}
}
