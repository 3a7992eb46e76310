//! Memoized punctuation-stripped token forms.
//!
//! A token whose stripped form is empty (e.g. `"!!"`, `":)"`) cannot be found with
//! space-boundary matching, so the scorer falls back to raw substring counting for it.
//! Stripping is cheap but runs once per `(token, call)`; the cache makes it once per token.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Append-only `raw token → stripped token` cache.
///
/// Entries are never evicted or overwritten. Concurrent callers may compute the same
/// entry twice; both compute the same value, so the race is harmless.
#[derive(Debug, Default)]
pub struct PunctuationCache {
    stripped: RwLock<HashMap<String, String>>,
}

impl PunctuationCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stripped form of `token`, computing and caching it on first use.
    pub fn stripped(&self, token: &str) -> String {
        if let Some(hit) = self.stripped.read().get(token) {
            return hit.clone();
        }
        let value = strip_punctuation(token);
        self.stripped
            .write()
            .entry(token.to_string())
            .or_insert(value)
            .clone()
    }

    /// Whether `token` consists only of punctuation (and whitespace).
    pub fn is_symbolic(&self, token: &str) -> bool {
        self.stripped(token).is_empty()
    }

    /// Number of cached tokens.
    pub fn len(&self) -> usize {
        self.stripped.read().len()
    }

    /// Whether nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.stripped.read().is_empty()
    }
}

/// Remove ASCII punctuation, then trim surrounding whitespace.
pub fn strip_punctuation(token: &str) -> String {
    let kept: String = token.chars().filter(|c| !c.is_ascii_punctuation()).collect();
    kept.trim().to_string()
}
