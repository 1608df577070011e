//! Compiled regex cache - patterns come from persisted logic trees and repeat on every submission

use crate::config;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

/// Upper bound on cached patterns; the cache is flushed when reached
const MAX_CACHED_PATTERNS: usize = 4096;

/// Global regex cache with fast hashing (ahash). Invalid patterns are cached as `None`.
static REGEX_CACHE: Lazy<RwLock<AHashMap<String, Option<Arc<Regex>>>>> = Lazy::new(|| {
    let map = AHashMap::with_capacity(256);
    RwLock::new(map)
});

/// Compile a user-supplied pattern
pub fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .size_limit(config::current().regex_size_limit)
        .build()
}

/// Get or compile a pattern, using the cache for repeated patterns
#[inline]
pub fn compiled_regex(pattern: &str) -> Option<Arc<Regex>> {
    // Fast path: check read lock first
    {
        let cache = REGEX_CACHE.read();
        if let Some(entry) = cache.get(pattern) {
            return entry.clone();
        }
    }

    // Slow path: compile and cache
    let compiled = compile(pattern).ok().map(Arc::new);

    {
        let mut cache = REGEX_CACHE.write();
        if cache.len() >= MAX_CACHED_PATTERNS {
            cache.clear();
        }
        cache.insert(pattern.to_string(), compiled.clone());
    }

    compiled
}

/// Clear the regex cache
pub fn clear_cache() {
    let mut cache = REGEX_CACHE.write();
    cache.clear();
}

/// Number of cached patterns
pub fn cache_size() -> usize {
    let cache = REGEX_CACHE.read();
    cache.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_hit_returns_same_regex() {
        let pattern = "^cache-hit-[0-9]+$";
        let first = compiled_regex(pattern).unwrap();
        let second = compiled_regex(pattern).unwrap();
        assert!(Arc::ptr_eq(&first, &second) || first.as_str() == second.as_str());
        assert!(first.is_match("cache-hit-42"));
    }

    #[test]
    fn test_invalid_pattern_is_cached_as_none() {
        assert!(compiled_regex("(unclosed").is_none());
        assert!(compiled_regex("(unclosed").is_none());
    }

    #[test]
    fn test_cache_records_patterns() {
        compiled_regex("^size-probe$");
        assert!(cache_size() >= 1);
    }

    #[test]
    fn test_compile_reports_error() {
        assert!(compile("[").is_err());
        assert!(compile("a+b").is_ok());
    }
}
