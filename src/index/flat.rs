//! Exact inner-product index over half-precision vectors.
//!
//! On disk the index is one `rkyv` archive: a format version, the dimension,
//! and all vectors as little-endian f16 bytes in id order. The file is
//! memory-mapped and validated once at open; vectors are then held in memory.

use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use half::f16;
use memmap2::Mmap;
use rkyv::rancor::Error as RkyvError;
use rkyv::{Archive, Deserialize, Serialize};
use tracing::{debug, info};

use super::error::{IndexError, IndexResult};
use super::{Neighbor, VectorIndex};

pub const INDEX_FORMAT_VERSION: u32 = 1;

const F16_BYTES: usize = 2;

#[derive(Archive, Deserialize, Serialize, Debug, PartialEq, Clone)]
struct IndexFile {
    version: u32,
    dim: u32,
    /// Little-endian f16, `dim` values per vector.
    vectors: Vec<u8>,
}

/// Brute-force inner-product search, the equivalent of FAISS `IndexFlatIP`.
#[derive(Debug, Clone)]
pub struct FlatIpIndex {
    dim: usize,
    vectors: Vec<f16>,
}

impl FlatIpIndex {
    /// Builds an index from f32 vectors; each must have length `dim`.
    pub fn from_vectors(dim: usize, vectors: &[Vec<f32>]) -> IndexResult<Self> {
        if dim == 0 {
            return Err(IndexError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }

        let mut flat = Vec::with_capacity(dim * vectors.len());
        for v in vectors {
            if v.len() != dim {
                return Err(IndexError::DimensionMismatch {
                    expected: dim,
                    actual: v.len(),
                });
            }
            flat.extend(v.iter().map(|&x| f16::from_f32(x)));
        }

        Ok(Self { dim, vectors: flat })
    }

    /// Memory-maps and validates an index written by [`write_to`](Self::write_to).
    pub fn open<P: AsRef<Path>>(path: P) -> IndexResult<Self> {
        let path = path.as_ref();
        let io_err = |source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        // SAFETY: the mapping is read-only and dropped before this function returns;
        // the index file is not rewritten while the service runs.
        let mmap = unsafe { Mmap::map(&file) }.map_err(io_err)?;

        let archived = rkyv::access::<ArchivedIndexFile, RkyvError>(&mmap[..]).map_err(|e| {
            IndexError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        let version = archived.version.to_native();
        if version != INDEX_FORMAT_VERSION {
            return Err(IndexError::UnsupportedVersion {
                found: version,
                expected: INDEX_FORMAT_VERSION,
            });
        }

        let dim = archived.dim.to_native() as usize;
        let bytes = archived.vectors.as_slice();
        if dim == 0 || bytes.len() % (dim * F16_BYTES) != 0 {
            return Err(IndexError::Corrupt {
                path: path.to_path_buf(),
                reason: format!(
                    "{} vector bytes do not divide into {}-d f16 vectors",
                    bytes.len(),
                    dim
                ),
            });
        }

        let vectors: Vec<f16> = bytes
            .chunks_exact(F16_BYTES)
            .map(|c| f16::from_le_bytes([c[0], c[1]]))
            .collect();

        let index = Self { dim, vectors };
        info!(
            path = %path.display(),
            dim,
            vectors = index.len(),
            "Vector index loaded"
        );
        Ok(index)
    }

    /// Serializes the index to `path` (write to temp, then rename).
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> IndexResult<()> {
        let path = path.as_ref();
        let io_err = |source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = IndexFile {
            version: INDEX_FORMAT_VERSION,
            dim: self.dim as u32,
            vectors: self.vectors.iter().flat_map(|v| v.to_le_bytes()).collect(),
        };
        let bytes = rkyv::to_bytes::<RkyvError>(&file)
            .map_err(|e| IndexError::Serialization(e.to_string()))?;

        let temp_path = path.with_extension("tmp");
        {
            let mut out = File::create(&temp_path).map_err(io_err)?;
            out.write_all(&bytes).map_err(io_err)?;
            out.sync_all().map_err(io_err)?;
        }
        fs::rename(&temp_path, path).map_err(io_err)?;

        debug!(path = %path.display(), bytes = bytes.len(), "Vector index written");
        Ok(())
    }

    fn vector(&self, id: usize) -> &[f16] {
        &self.vectors[id * self.dim..(id + 1) * self.dim]
    }
}

fn inner_product(query: &[f32], stored: &[f16]) -> f32 {
    query
        .iter()
        .zip(stored)
        .map(|(q, s)| q * s.to_f32())
        .sum()
}

impl VectorIndex for FlatIpIndex {
    fn search(&self, query: &[f32], k: usize) -> IndexResult<Vec<Neighbor>> {
        if query.len() != self.dim {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }

        let mut scored: Vec<Neighbor> = (0..self.len())
            .map(|id| Neighbor {
                score: inner_product(query, self.vector(id)),
                id: id as i64,
            })
            .collect();

        // Descending score, lower id first on ties.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        scored.truncate(k);
        scored.resize(k, Neighbor::sentinel());

        Ok(scored)
    }

    fn len(&self) -> usize {
        self.vectors.len() / self.dim
    }

    fn dim(&self) -> usize {
        self.dim
    }
}
