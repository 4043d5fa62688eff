use std::collections::HashSet;

/// Splits raw text into owned word tokens on whitespace.
///
/// Case and punctuation are preserved: `"Python."` and `"python"` are two
/// distinct tokens. Use [`tokenize_normalized`] for a case-folded pipeline.
/// Whichever variant a caller picks must be kept constant for one pipeline
/// run, since token equality is exact string match.
pub fn tokenize(text: &str) -> Vec<String> {
	text.split_whitespace().map(str::to_owned).collect()
}

/// Splits raw text into lowercased tokens with punctuation trimmed.
///
/// - Lowercases every token.
/// - Trims leading and trailing non-alphanumeric characters.
/// - Drops tokens that become empty after trimming.
pub fn tokenize_normalized(text: &str) -> Vec<String> {
	text.split_whitespace()
		.map(|word| {
			word.trim_matches(|c: char| !c.is_alphanumeric())
				.to_lowercase()
		})
		.filter(|word| !word.is_empty())
		.collect()
}

/// Counts the distinct tokens in a sequence.
///
/// This is the conventional vocabulary size `V` supplied to the Laplace
/// smoothing operations. The model never recomputes it internally; callers
/// own the value and must keep it consistent across a pipeline run.
pub fn vocabulary_size(tokens: &[String]) -> usize {
	tokens.iter().collect::<HashSet<_>>().len()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tokenize_preserves_case_and_punctuation() {
		let tokens = tokenize("I love coding in Python. Amazing!");
		assert_eq!(tokens, vec!["I", "love", "coding", "in", "Python.", "Amazing!"]);
	}

	#[test]
	fn tokenize_empty_text() {
		assert!(tokenize("").is_empty());
		assert!(tokenize("   \n\t ").is_empty());
	}

	#[test]
	fn tokenize_normalized_folds_case_and_trims() {
		let tokens = tokenize_normalized("I love coding in Python. Amazing!");
		assert_eq!(tokens, vec!["i", "love", "coding", "in", "python", "amazing"]);
	}

	#[test]
	fn tokenize_normalized_drops_pure_punctuation() {
		let tokens = tokenize_normalized("well -- yes");
		assert_eq!(tokens, vec!["well", "yes"]);
	}

	#[test]
	fn vocabulary_counts_distinct_tokens() {
		let tokens = tokenize("I love NLP and I love coding");
		assert_eq!(vocabulary_size(&tokens), 6);
	}
}
