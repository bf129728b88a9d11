//! Generation Cache
//!
//! Injectable key-value store for completed generations. Purely a
//! performance layer: the orchestrator behaves identically without one.

use std::time::Duration;

use mini_moka::sync::Cache;
use sha2::{Digest, Sha256};

use super::plan::GenerationOutcome;

/// Storage for completed generation outcomes.
pub trait GenerationCache: Send + Sync {
    fn get(&self, key: &str) -> Option<GenerationOutcome>;
    fn insert(&self, key: String, outcome: GenerationOutcome);
}

/// In-memory cache with a fixed TTL and capacity.
pub struct MokaGenerationCache {
    cache: Cache<String, GenerationOutcome>,
}

impl MokaGenerationCache {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl GenerationCache for MokaGenerationCache {
    fn get(&self, key: &str) -> Option<GenerationOutcome> {
        // Keys are stored as `Arc<String>`, which only borrows as `String`
        self.cache.get(&key.to_string())
    }

    fn insert(&self, key: String, outcome: GenerationOutcome) {
        self.cache.insert(key, outcome);
    }
}

/// Trim, lower-case and collapse internal whitespace.
pub fn normalize_prompt(prompt: &str) -> String {
    prompt
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cache key for a prompt sent to `model`.
pub fn cache_key(model: &str, prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    hasher.update([0u8]);
    hasher.update(normalize_prompt(prompt).as_bytes());
    format!("{:x}", hasher.finalize())
}
