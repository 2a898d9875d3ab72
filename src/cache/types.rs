use serde::Serialize;

use crate::hashing::NormalizationPolicy;

pub const VERITY_STATUS_HEADER: &str = "X-Verity-Status";
pub const VERITY_STATUS_HEALTHY: &str = "healthy";
pub const VERITY_STATUS_NOT_READY: &str = "not_ready";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    #[inline]
    pub fn as_header_value(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheStatus::Hit)
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_header_value())
    }
}

/// Cache statistics reported by `/api/v1/cache-info`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheInfo {
    pub entries: u64,
    pub ttl_secs: u64,
    pub capacity: u64,
    pub hits: u64,
    pub misses: u64,
    pub normalization: NormalizationPolicy,
}
