//! Ambient configuration knobs (`SPEC_FULL.md` Configuration section).
//!
//! Neither struct reads from a file or environment on its own — a
//! deployment's own config layer constructs these the same way it builds
//! every other typed config fragment and passes them to
//! [`crate::cache::BatchInfoCache::with_recency_limit`] and
//! [`crate::backend::AuthoritativeBackend::with_page_config`].

use serde::{Deserialize, Serialize};

/// Tunables for the batch info cache's recency sorted sets (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// `T`: the number of most-recent keys retained per recency set
    /// before older entries are trimmed.
    pub recency_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            recency_limit: crate::cache::batch_info::DEFAULT_RECENCY_LIMIT,
        }
    }
}

/// Tunables for the authoritative backend's range-scan pagination (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// The page size applied when a caller does not specify one.
    pub default_max_results: usize,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            default_max_results: crate::backend::DEFAULT_MAX_RESULTS,
        }
    }
}
