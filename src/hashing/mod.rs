//! Request fingerprints and log-safe text previews.
//!
//! A fingerprint is the full 32-byte BLAKE3 digest of the normalized request text.
//! The full digest is used (not a truncated `u64`) because a collision would serve
//! one user's verdict for another user's text.

use serde::{Deserialize, Serialize};

use crate::constants::PREVIEW_CHARS;

/// How request text is normalized before fingerprinting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationPolicy {
    /// Byte-exact text.
    Exact,
    /// Trim and collapse runs of whitespace to a single space.
    #[default]
    Whitespace,
    /// Whitespace normalization plus lowercasing.
    Casefold,
}

impl NormalizationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalizationPolicy::Exact => "exact",
            NormalizationPolicy::Whitespace => "whitespace",
            NormalizationPolicy::Casefold => "casefold",
        }
    }
}

impl std::str::FromStr for NormalizationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(NormalizationPolicy::Exact),
            "whitespace" => Ok(NormalizationPolicy::Whitespace),
            "casefold" => Ok(NormalizationPolicy::Casefold),
            other => Err(format!(
                "unknown normalization policy '{}' (expected exact, whitespace or casefold)",
                other
            )),
        }
    }
}

impl std::fmt::Display for NormalizationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applies `policy` to `text`.
pub fn normalize_text(text: &str, policy: NormalizationPolicy) -> String {
    match policy {
        NormalizationPolicy::Exact => text.to_string(),
        NormalizationPolicy::Whitespace => collapse_whitespace(text),
        NormalizationPolicy::Casefold => collapse_whitespace(text).to_lowercase(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cache fingerprint of `text` under `policy`.
#[inline]
pub fn fingerprint(text: &str, policy: NormalizationPolicy) -> [u8; 32] {
    *blake3::hash(normalize_text(text, policy).as_bytes()).as_bytes()
}

/// Returns at most [`PREVIEW_CHARS`] characters of `text`, cut on a char boundary.
pub fn preview(text: &str) -> String {
    preview_n(text, PREVIEW_CHARS)
}

/// Returns at most `max_chars` characters of `text`, with `...` appended when cut.
pub fn preview_n(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_fingerprint_determinism() {
        let text = "Albert Einstein was born in 1879.";

        let a = fingerprint(text, NormalizationPolicy::Exact);
        let b = fingerprint(text, NormalizationPolicy::Exact);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_exact_distinguishes_whitespace() {
        let a = fingerprint("Einstein  was born.", NormalizationPolicy::Exact);
        let b = fingerprint("Einstein was born.", NormalizationPolicy::Exact);
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_whitespace_policy() {
        let a = fingerprint("  Einstein \n was\tborn. ", NormalizationPolicy::Whitespace);
        let b = fingerprint("Einstein was born.", NormalizationPolicy::Whitespace);
        assert_eq!(a, b);

        let c = fingerprint("einstein was born.", NormalizationPolicy::Whitespace);
        assert_ne!(a, c);
    }

    #[test]
    fn test_fingerprint_casefold_policy() {
        let a = fingerprint("EINSTEIN  was Born.", NormalizationPolicy::Casefold);
        let b = fingerprint("einstein was born.", NormalizationPolicy::Casefold);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_uniqueness() {
        let texts = [
            "Albert Einstein was born in 1879.",
            "Albert Einstein was born in 1990.",
            "Python was created by Guido van Rossum.",
            "Mount Everest is the highest mountain.",
        ];

        let hashes: HashSet<_> = texts
            .iter()
            .map(|t| fingerprint(t, NormalizationPolicy::Whitespace))
            .collect();
        assert_eq!(hashes.len(), texts.len());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "exact".parse::<NormalizationPolicy>(),
            Ok(NormalizationPolicy::Exact)
        );
        assert_eq!(
            " CaseFold ".parse::<NormalizationPolicy>(),
            Ok(NormalizationPolicy::Casefold)
        );
        assert!("fuzzy".parse::<NormalizationPolicy>().is_err());
    }

    #[test]
    fn test_preview_short_text_unchanged() {
        assert_eq!(preview("short claim"), "short claim");
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let text = "a".repeat(PREVIEW_CHARS + 10);
        let p = preview(&text);
        assert_eq!(p.len(), PREVIEW_CHARS + 3);
        assert!(p.ends_with("..."));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let text = "Ünïcödé ".repeat(20);
        let p = preview_n(&text, 5);
        assert_eq!(p, "Ünïcö...");
    }
}
