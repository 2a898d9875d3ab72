use unicode_segmentation::UnicodeSegmentation;

/// Splits input text into ordered atomic claims.
pub trait ClaimExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Vec<String>;
}

/// One claim per Unicode sentence.
#[derive(Debug, Clone, Copy)]
pub struct SentenceClaimExtractor {
    max_claims: usize,
}

impl SentenceClaimExtractor {
    pub fn new(max_claims: usize) -> Self {
        Self { max_claims }
    }
}

impl ClaimExtractor for SentenceClaimExtractor {
    fn extract(&self, text: &str) -> Vec<String> {
        text.unicode_sentences()
            .map(str::trim)
            .filter(|s| s.chars().any(char::is_alphanumeric))
            .take(self.max_claims)
            .map(str::to_string)
            .collect()
    }
}
