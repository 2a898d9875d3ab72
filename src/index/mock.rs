//! Scripted index for tests: returns fixed neighbours regardless of the query.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::error::{IndexError, IndexResult};
use super::{Neighbor, VectorIndex};

#[derive(Debug)]
pub struct ScriptedIndex {
    dim: usize,
    len: usize,
    neighbors: Vec<Neighbor>,
    fail: bool,
    searches: AtomicUsize,
}

impl ScriptedIndex {
    /// Always answers with `neighbors` (truncated or padded to `k`).
    pub fn new(dim: usize, len: usize, neighbors: Vec<Neighbor>) -> Self {
        Self {
            dim,
            len,
            neighbors,
            fail: false,
            searches: AtomicUsize::new(0),
        }
    }

    /// Every search fails.
    pub fn failing(dim: usize) -> Self {
        Self {
            fail: true,
            ..Self::new(dim, 0, Vec::new())
        }
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

impl VectorIndex for ScriptedIndex {
    fn search(&self, query: &[f32], k: usize) -> IndexResult<Vec<Neighbor>> {
        self.searches.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(IndexError::Serialization("scripted search failure".to_string()));
        }
        if query.len() != self.dim {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }

        let mut out: Vec<Neighbor> = self.neighbors.iter().take(k).copied().collect();
        out.resize(k, Neighbor::sentinel());
        Ok(out)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn dim(&self) -> usize {
        self.dim
    }
}
