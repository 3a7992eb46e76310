//! Process-lifetime lexicon cache.
//!
//! Holds the realized [`Lexicon`] and the [`PunctuationCache`] for one [`LexiconSource`].
//! The lexicon is built lazily, at most once per generation, and shared as an `Arc` so
//! scoring never holds the lock. Invalidation drops the lexicon only; stripped token
//! forms do not depend on weights and are kept.

use crate::lexicon::{Lexicon, LexiconSource};
use crate::punctuation::PunctuationCache;
use crate::Error;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lazily built, invalidatable lexicon plus punctuation cache.
#[derive(Debug)]
pub struct LexiconCache<S> {
    source: S,
    lexicon: RwLock<Option<Arc<Lexicon>>>,
    punctuation: PunctuationCache,
    builds: AtomicU64,
}

impl<S: LexiconSource> LexiconCache<S> {
    /// Wrap a source. Nothing is loaded until first use.
    pub fn new(source: S) -> Self {
        Self {
            source,
            lexicon: RwLock::new(None),
            punctuation: PunctuationCache::new(),
            builds: AtomicU64::new(0),
        }
    }

    /// Current lexicon, building it from the source if missing.
    pub fn lexicon(&self) -> Result<Arc<Lexicon>, Error> {
        if let Some(lexicon) = self.lexicon.read().as_ref() {
            return Ok(lexicon.clone());
        }

        let mut slot = self.lexicon.write();
        // Another caller may have built it while we waited.
        if let Some(lexicon) = slot.as_ref() {
            return Ok(lexicon.clone());
        }
        let built = Arc::new(self.build()?);
        *slot = Some(built.clone());
        Ok(built)
    }

    /// Drop the current lexicon; the next access rebuilds it.
    pub fn invalidate(&self) {
        if self.lexicon.write().take().is_some() {
            debug!("sentiment token cache invalidated");
        }
    }

    /// Rebuild immediately from the source.
    ///
    /// On failure the previous lexicon is left in place.
    pub fn rebuild(&self) -> Result<Arc<Lexicon>, Error> {
        let built = Arc::new(self.build()?);
        *self.lexicon.write() = Some(built.clone());
        Ok(built)
    }

    /// Whether a lexicon is currently cached.
    pub fn is_loaded(&self) -> bool {
        self.lexicon.read().is_some()
    }

    /// How many times the lexicon has been built from the source.
    pub fn build_count(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }

    /// Shared punctuation-stripped token cache.
    pub fn punctuation(&self) -> &PunctuationCache {
        &self.punctuation
    }

    fn build(&self) -> Result<Lexicon, Error> {
        let lexicon = Lexicon::from_source(&self.source)?;

        let empty_tokens = lexicon
            .sources()
            .filter(|(_, tokens)| tokens.contains_key(""))
            .count();
        if empty_tokens > 0 {
            warn!(
                sources = empty_tokens,
                "lexicon contains empty tokens; they will never match"
            );
        }

        self.builds.fetch_add(1, Ordering::Relaxed);
        info!(
            sources = lexicon.num_sources(),
            tokens = lexicon.num_tokens(),
            "sentiment token cache built"
        );
        Ok(lexicon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{MemoryLexiconSource, TokenEntry};

    struct FailingSource;

    impl LexiconSource for FailingSource {
        fn sources(&self) -> Result<Vec<String>, Error> {
            Err(Error::LexiconSource("connection refused".into()))
        }
        fn entries(&self, _source: &str) -> Result<Vec<TokenEntry>, Error> {
            Ok(Vec::new())
        }
    }

    fn source() -> MemoryLexiconSource {
        MemoryLexiconSource::new(vec![TokenEntry::new("Lex1", "good", "pos", 1.0)]).unwrap()
    }

    #[test]
    fn builds_once_and_reuses() {
        let cache = LexiconCache::new(source());
        assert!(!cache.is_loaded());
        let a = cache.lexicon().unwrap();
        let b = cache.lexicon().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.build_count(), 1);
    }

    #[test]
    fn invalidate_triggers_rebuild_on_next_access() {
        let cache = LexiconCache::new(source());
        let a = cache.lexicon().unwrap();
        cache.punctuation().stripped("!!");
        cache.invalidate();
        assert!(!cache.is_loaded());
        let b = cache.lexicon().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.build_count(), 2);
        assert_eq!(cache.punctuation().len(), 1);
    }

    #[test]
    fn source_failure_is_reported_and_not_cached() {
        let cache = LexiconCache::new(FailingSource);
        assert!(matches!(cache.lexicon(), Err(Error::LexiconSource(_))));
        assert!(!cache.is_loaded());
        assert_eq!(cache.build_count(), 0);
    }

    #[test]
    fn concurrent_first_access_builds_once() {
        let cache = Arc::new(LexiconCache::new(source()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || cache.lexicon().map(|l| l.num_tokens()))
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap().unwrap(), 1);
        }
        assert_eq!(cache.build_count(), 1);
    }
}
