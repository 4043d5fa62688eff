use rand::SeedableRng;
use rand::rngs::StdRng;
use rs_ngram_core::model::evaluator;
use rs_ngram_core::model::generation_input::{GenerationInput, Sampling, StartSeed};
use rs_ngram_core::model::generator::Generator;
use rs_ngram_core::model::ngram_model::NGramModel;
use rs_ngram_core::tokenizer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Input corpus
    let corpus = "I love natural language processing and I love coding in Python. \
        Natural language processing is amazing.";

    // Tokenize the corpus (whitespace split, case preserved) and take the
    // distinct-token count as the smoothing vocabulary size
    let tokens = tokenizer::tokenize(corpus);
    let vocabulary_size = tokenizer::vocabulary_size(&tokens);

    // Train a bigram model (n = 2)
    // One scan produces both the n-gram counts and the context counts
    let model = NGramModel::from_tokens(&tokens, 2)?;
    println!("Trained {} distinct bigrams over {} tokens", model.len(), model.total_tokens());

    // Maximum-likelihood probabilities: count(ngram) / count(prefix)
    println!("\nN-Gram Probabilities:");
    for (ngram, probability) in model.probabilities() {
        println!("{:?}: {:.4}", ngram, probability);
    }

    // Laplace-smoothed probabilities: (count + 1) / (count(prefix) + V)
    // Only observed n-grams get entries; unseen continuations keep their
    // reserved mass and surface through smoothed lookups instead
    println!("\nSmoothed N-Gram Probabilities (V = {}):", vocabulary_size);
    for (ngram, probability) in model.smoothed_probabilities(vocabulary_size)? {
        println!("{:?}: {:.4}", ngram, probability);
    }

    // Generate sentences by random walk over the learned continuations
    // The random source is caller-owned: seed it for reproducible output
    let generator = Generator::new(&model);
    let mut rng = StdRng::seed_from_u64(42);

    let mut input = GenerationInput::new(20);

    // Start seed can be set to
    // 'Random' to start from a uniformly random observed n-gram
    // 'Custom' to start from caller-provided tokens
    input.start_seed = StartSeed::Random;

    // 'Uniform' picks among distinct continuations with equal probability;
    // 'Weighted' picks proportionally to observation counts
    input.sampling = Sampling::Uniform;

    println!("\nGenerated Sentences:");
    for i in 0..5 {
        let sequence = generator.generate(&input, &mut rng)?;
        println!("{}: {}", i + 1, sequence.join(" "));
    }

    // Asking for fewer tokens than the model order is a parameter error
    match generator.generate(&GenerationInput::new(1), &mut rng) {
        Ok(_) => println!("Should not happen"),
        Err(_) => println!("\nmax_length 1 is invalid for a bigram model"),
    }

    // Score a held-out sentence: unseen continuations fall back to the
    // reserved smoothing mass instead of failing the lookup
    let held_out = tokenizer::tokenize("I love coding in Rust");
    let score = evaluator::evaluate(&model, &held_out, vocabulary_size)?;
    println!("\nPerplexity of {:?}: {:.4}", held_out.join(" "), score);

    // Invalid probability sequences are rejected, never clamped
    match evaluator::perplexity(&[0.5, 1.5]) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Rejected: {}", e),
    }

    Ok(())
}
