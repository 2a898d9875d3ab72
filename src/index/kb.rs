use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{IndexError, IndexResult};

/// One fact in the knowledge base. Position `i` pairs with vector `i` in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseEntry {
    pub snippet: String,
    pub source: String,
}

impl KnowledgeBaseEntry {
    pub fn new(snippet: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            snippet: snippet.into(),
            source: source.into(),
        }
    }
}

/// Snippet count for one knowledge-base source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicCount {
    pub source: String,
    pub snippets: usize,
}

/// Snippet metadata, parallel to the vector index.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeBaseEntry>,
}

impl KnowledgeBase {
    pub fn new(entries: Vec<KnowledgeBaseEntry>) -> Self {
        Self { entries }
    }

    /// Reads the JSON array of `{snippet, source}` records.
    pub fn load<P: AsRef<Path>>(path: P) -> IndexResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let entries: Vec<KnowledgeBaseEntry> =
            serde_json::from_str(&raw).map_err(|e| IndexError::Metadata {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        info!(path = %path.display(), snippets = entries.len(), "Snippet metadata loaded");
        Ok(Self { entries })
    }

    /// Entry for an index id; `None` for sentinels and out-of-range ids.
    pub fn get(&self, id: i64) -> Option<&KnowledgeBaseEntry> {
        usize::try_from(id).ok().and_then(|i| self.entries.get(i))
    }

    pub fn entries(&self) -> &[KnowledgeBaseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct sources with their snippet counts, sorted by source.
    pub fn topics(&self) -> Vec<TopicCount> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.source.as_str()).or_default() += 1;
        }

        counts
            .into_iter()
            .map(|(source, snippets)| TopicCount {
                source: source.to_string(),
                snippets,
            })
            .collect()
    }
}
