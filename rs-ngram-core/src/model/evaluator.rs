use super::ngram_model::{NGramModel, extract_ngrams};

/// Computes the perplexity of a per-token probability sequence.
///
/// Perplexity is `2^(-(1/n) * sum(log2 p_i))`: the exponential of the
/// average negative log-probability. Lower is better; a sequence of `1.0`
/// probabilities scores exactly `1.0`, and probabilities approaching `0`
/// drive the score toward infinity.
///
/// # Parameters
/// - `probabilities`: Ordered, non-empty per-token probabilities, each
///   required to lie in `(0, 1]`.
///
/// # Errors
/// Returns an error if the sequence is empty, or if any value is not in
/// `(0, 1]` (including NaN). The first offending index is reported; values
/// are never silently clamped.
pub fn perplexity(probabilities: &[f64]) -> Result<f64, String> {
	if probabilities.is_empty() {
		return Err("empty probability sequence".to_owned());
	}
	for (index, p) in probabilities.iter().enumerate() {
		if !(*p > 0.0 && *p <= 1.0) {
			return Err(format!(
				"invalid probability at index {}: {} must be in (0, 1]",
				index, p
			));
		}
	}

	let n = probabilities.len() as f64;
	let log_sum: f64 = probabilities.iter().map(|p| p.log2()).sum();
	Ok((-log_sum / n).exp2())
}

/// Looks up the smoothed probability of every n-gram window of an
/// evaluation sequence.
///
/// This is the bridge between training and evaluation: each window gets
/// its Laplace-smoothed table value, and windows the model never observed
/// get the documented reserved-mass fallback instead of an error.
///
/// A sequence shorter than the model order yields an empty vector.
///
/// # Errors
/// Returns an error if `vocabulary_size < 1`.
pub fn sequence_probabilities(
	model: &NGramModel,
	tokens: &[String],
	vocabulary_size: usize,
) -> Result<Vec<f64>, String> {
	extract_ngrams(tokens, model.order())
		.iter()
		.map(|ngram| model.smoothed_probability(ngram, vocabulary_size))
		.collect()
}

/// Scores a held-out token sequence against a trained model.
///
/// Composes [`sequence_probabilities`] and [`perplexity`]: an evaluation
/// sequence shorter than the model order produces no windows and therefore
/// the empty-sequence error.
pub fn evaluate(
	model: &NGramModel,
	tokens: &[String],
	vocabulary_size: usize,
) -> Result<f64, String> {
	perplexity(&sequence_probabilities(model, tokens, vocabulary_size)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tokenizer::{tokenize, vocabulary_size};
	use float_cmp::approx_eq;

	#[test]
	fn certain_sequence_scores_one() {
		let score = perplexity(&[1.0, 1.0, 1.0]).unwrap();
		assert!(approx_eq!(f64, score, 1.0, epsilon = 1e-9));
	}

	#[test]
	fn small_probability_drives_the_score_up() {
		let score = perplexity(&[0.001]).unwrap();
		assert!(approx_eq!(f64, score, 1000.0, epsilon = 1e-6));
	}

	#[test]
	fn uniform_quarter_sequence_scores_four() {
		let score = perplexity(&[0.25, 0.25, 0.25, 0.25]).unwrap();
		assert!(approx_eq!(f64, score, 4.0, epsilon = 1e-9));
	}

	#[test]
	fn empty_sequence_is_rejected() {
		let error = perplexity(&[]).unwrap_err();
		assert!(error.contains("empty probability sequence"));
	}

	#[test]
	fn zero_probability_is_rejected() {
		let error = perplexity(&[0.0, 0.5]).unwrap_err();
		assert!(error.contains("index 0"));
	}

	#[test]
	fn probability_above_one_is_rejected() {
		let error = perplexity(&[1.5, 0.2]).unwrap_err();
		assert!(error.contains("index 0"));
	}

	#[test]
	fn nan_probability_is_rejected() {
		assert!(perplexity(&[0.5, f64::NAN]).is_err());
	}

	#[test]
	fn first_violation_is_reported() {
		let error = perplexity(&[0.5, -0.1, 2.0]).unwrap_err();
		assert!(error.contains("index 1"));
	}

	#[test]
	fn held_out_sequence_gets_fallback_probabilities() {
		let training = tokenize("I love NLP and I love coding");
		let v = vocabulary_size(&training);
		let model = NGramModel::from_tokens(&training, 2).unwrap();

		// "love Rust" was never observed; the lookup must not error
		let held_out = tokenize("I love Rust");
		let probabilities = sequence_probabilities(&model, &held_out, v).unwrap();
		assert_eq!(probabilities.len(), 2);
		// ("I","love"): (2+1)/(2+6); ("love","Rust") unseen: 1/(2+6)
		assert!(approx_eq!(f64, probabilities[0], 0.375, epsilon = 1e-12));
		assert!(approx_eq!(f64, probabilities[1], 0.125, epsilon = 1e-12));

		let score = evaluate(&model, &held_out, v).unwrap();
		assert!(score > 1.0);
	}

	#[test]
	fn evaluation_shorter_than_order_is_an_empty_sequence() {
		let training = tokenize("I love NLP and I love coding");
		let model = NGramModel::from_tokens(&training, 2).unwrap();

		let error = evaluate(&model, &tokenize("I"), 6).unwrap_err();
		assert!(error.contains("empty probability sequence"));
	}

	#[test]
	fn training_sequence_scores_better_than_noise() {
		let training = tokenize("the cat sat on the mat and the cat slept on the mat");
		let v = vocabulary_size(&training);
		let model = NGramModel::from_tokens(&training, 2).unwrap();

		let on_training = evaluate(&model, &training, v).unwrap();
		let on_noise = evaluate(&model, &tokenize("purple quantum biscuits dance"), v).unwrap();
		assert!(on_training < on_noise);
	}
}
