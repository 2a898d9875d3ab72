//! Knowledge-base artifacts: the vector index and its parallel snippet metadata.

pub mod error;
pub mod flat;
pub mod kb;

#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use error::{IndexError, IndexResult};
pub use flat::{FlatIpIndex, INDEX_FORMAT_VERSION};
pub use kb::{KnowledgeBase, KnowledgeBaseEntry, TopicCount};

#[cfg(any(test, feature = "mock"))]
pub use mock::ScriptedIndex;

use serde::Serialize;

/// One search hit. `id == -1` marks a padding slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub score: f32,
    pub id: i64,
}

impl Neighbor {
    pub const SENTINEL_ID: i64 = -1;

    pub fn sentinel() -> Self {
        Self {
            score: f32::MIN,
            id: Self::SENTINEL_ID,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.id == Self::SENTINEL_ID
    }
}

/// Nearest-neighbour search over stored embeddings.
pub trait VectorIndex: Send + Sync {
    /// Exactly `k` results, best first; missing slots are [`Neighbor::sentinel`].
    fn search(&self, query: &[f32], k: usize) -> IndexResult<Vec<Neighbor>>;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    fn dim(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
