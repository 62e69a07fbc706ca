use crate::types::{AnalysisResult, CacheKey};
use std::collections::HashMap;

/// Manages caching of computed summaries
#[derive(Clone)]
pub struct CacheManager {
    cache: HashMap<CacheKey, AnalysisResult>,
}

impl CacheManager {
    /// Create a new cache manager
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Store a summary in the cache
    pub fn store(&mut self, key: CacheKey, result: AnalysisResult) {
        self.cache.insert(key, result);
    }

    /// Retrieve a summary from the cache
    pub fn get(&self, key: &CacheKey) -> Option<&AnalysisResult> {
        self.cache.get(key)
    }

    /// Clear the cache
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}
