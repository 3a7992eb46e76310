//! `sentlex`: lexicon-based sentiment token scoring.
//!
//! Two halves:
//! - **scoring**: match a lexicon of weighted tokens against free text and accumulate
//!   per-source, per-label scores, wrapped in a keyed annotation envelope.
//! - **resolution**: find a previously stored envelope inside an arbitrarily nested record,
//!   preferring fields in a configured priority order.
//!
//! Scope:
//! - In-memory lexicon, loaded once per cache generation from a caller-provided source
//! - Deterministic scoring (additive accumulation, sorted sources)
//! - Whole-word matching on space boundaries; punctuation-only tokens match as substrings
//!
//! Non-goals:
//! - Tokenization, stemming, or any NLP beyond lowercasing and trimming
//! - Learning or inferring token weights
//! - Persisting the lexicon (the [`LexiconSource`] is external)

pub mod annotator;
pub mod cache;
pub mod config;
pub mod envelope;
pub mod lexicon;
pub mod punctuation;
pub mod resolve;
pub mod score;

pub use annotator::SentimentAnnotator;
pub use cache::LexiconCache;
pub use config::AnnotatorConfig;
pub use envelope::{
    annotation_key, build_envelope, envelope_to_json, Envelope, ANNOTATION_BASE,
};
pub use error::Error;
pub use lexicon::{Lexicon, LexiconSource, MemoryLexiconSource, TokenEntry};
pub use punctuation::PunctuationCache;
pub use resolve::{
    fetch_annotations, FlatScores, GraphRef, NodeId, NodeKind, RecordGraph, RecordNode,
};
pub use score::{score, ScoreResult};

mod error {
    /// Errors for lexicon loading and configuration.
    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        /// The external lexicon source failed to enumerate sources or tokens.
        #[error("lexicon source failed: {0}")]
        LexiconSource(String),
        /// A lexicon row could not be accepted.
        #[error("invalid lexicon entry: {0}")]
        InvalidEntry(&'static str),
        /// Lexicon rows or configuration were not valid JSON.
        #[error("invalid json: {0}")]
        Json(#[from] serde_json::Error),
    }
}
