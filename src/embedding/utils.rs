use std::collections::HashSet;
use std::io;
use std::path::Path;
use std::sync::LazyLock;

use tokenizers::{Tokenizer, TruncationParams, TruncationStrategy};

/// Loads `tokenizer.json` from a model directory (or an explicit file path).
pub fn load_tokenizer(model_path: &Path) -> io::Result<Tokenizer> {
    let tokenizer_path = if model_path.is_dir() {
        model_path.join("tokenizer.json")
    } else {
        model_path.to_path_buf()
    };

    Tokenizer::from_file(&tokenizer_path).map_err(io::Error::other)
}

/// Loads a tokenizer that truncates to `max_len` tokens.
///
/// Pair inputs (premise, hypothesis) are trimmed longest-first so a long
/// evidence snippet never pushes the claim out of the window.
pub fn load_tokenizer_with_truncation(model_path: &Path, max_len: usize) -> io::Result<Tokenizer> {
    let mut tokenizer = load_tokenizer(model_path)?;

    let truncation = TruncationParams {
        max_length: max_len,
        strategy: TruncationStrategy::LongestFirst,
        ..Default::default()
    };

    tokenizer
        .with_truncation(Some(truncation))
        .map_err(|e| io::Error::other(format!("Failed to configure truncation: {}", e)))?;

    Ok(tokenizer)
}

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "have", "has",
        "had", "do", "does", "did", "will", "would", "could", "should", "may", "might", "must",
        "shall", "can", "to", "of", "in", "for", "on", "with", "at", "by", "from", "as", "into",
        "through", "during", "before", "after", "above", "below", "between", "under", "again",
        "then", "once", "here", "there", "when", "where", "why", "how", "all", "each", "few",
        "more", "most", "other", "some", "such", "nor", "only", "own", "same", "so", "than",
        "too", "very", "just", "and", "but", "if", "or", "because", "until", "while", "what",
        "which", "who", "whom", "this", "that", "these", "those", "am", "it", "its", "he", "she",
        "they", "his", "her", "their",
    ]
    .into_iter()
    .collect()
});

/// Words that flip the polarity of a statement.
pub const NEGATIONS: &[&str] = &["not", "no", "never", "none", "neither", "cannot"];

/// Lowercased alphanumeric words of `text`, in order.
pub fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// [`words`] minus stop words and negations.
pub fn content_words(text: &str) -> Vec<String> {
    words(text)
        .into_iter()
        .filter(|w| !STOP_WORDS.contains(w.as_str()) && !NEGATIONS.contains(&w.as_str()))
        .collect()
}
