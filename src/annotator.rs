//! Annotate and resolve entrypoints over a shared [`LexiconCache`].

use crate::cache::LexiconCache;
use crate::config::AnnotatorConfig;
use crate::envelope::{build_envelope, Envelope};
use crate::lexicon::LexiconSource;
use crate::resolve::{fetch_annotations, FlatScores, RecordNode};
use crate::score::score;
use crate::Error;
use std::sync::Arc;
use tracing::{debug, warn};

/// Sentiment annotator: scores content into envelopes and reads them back from records.
///
/// Cheap to clone; clones share the same cache.
#[derive(Debug)]
pub struct SentimentAnnotator<S> {
    config: AnnotatorConfig,
    cache: Arc<LexiconCache<S>>,
}

impl<S> Clone for SentimentAnnotator<S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<S: LexiconSource> SentimentAnnotator<S> {
    /// Annotator with default configuration over a fresh cache for `source`.
    pub fn new(source: S) -> Self {
        Self::with_cache(Arc::new(LexiconCache::new(source)), AnnotatorConfig::default())
    }

    /// Annotator over an existing (possibly shared) cache.
    pub fn with_cache(cache: Arc<LexiconCache<S>>, config: AnnotatorConfig) -> Self {
        Self { config, cache }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: AnnotatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// Underlying cache, for invalidation after lexicon updates.
    pub fn cache(&self) -> &Arc<LexiconCache<S>> {
        &self.cache
    }

    /// Score `content` and wrap it for `field_name`.
    ///
    /// Never fails: if the lexicon cannot be loaded the error is logged and an empty
    /// envelope is returned. Skipped fields also yield an empty envelope.
    pub fn annotate(&self, content: Option<&str>, field_name: Option<&str>) -> Envelope {
        match self.try_annotate(content, field_name) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(error = %err, field = ?field_name, "sentiment annotation skipped");
                Envelope::new()
            }
        }
    }

    /// Like [`SentimentAnnotator::annotate`], but surfaces lexicon-source failures.
    pub fn try_annotate(
        &self,
        content: Option<&str>,
        field_name: Option<&str>,
    ) -> Result<Envelope, Error> {
        if self.config.is_skipped(field_name) {
            debug!(field = ?field_name, "field skipped for sentiment scoring");
            return Ok(Envelope::new());
        }
        let lexicon = self.cache.lexicon()?;
        let scores = score(content, &lexicon, self.cache.punctuation());
        Ok(build_envelope(scores, field_name))
    }

    /// Every `source_label` output name the current lexicon can produce.
    pub fn annotation_fields(&self) -> Result<Vec<String>, Error> {
        Ok(self.cache.lexicon()?.annotation_fields())
    }

    /// Find and flatten a stored annotation in `record`, using the configured priorities
    /// when `preferred_field` is `None`.
    pub fn fetch_annotations<'a, N: RecordNode<'a>>(
        &self,
        record: N,
        preferred_field: Option<&str>,
    ) -> Option<FlatScores> {
        fetch_annotations(record, preferred_field, self.config.field_priorities.as_slice())
    }
}
