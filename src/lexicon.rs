//! Weighted token lexicon and the source seam it is loaded through.
//!
//! A lexicon maps `source → token → label → score`. Sources are whatever vendor
//! dictionaries the caller stores; the crate only sees them through [`LexiconSource`]
//! and realizes them once into an in-memory [`Lexicon`].

use crate::Error;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

/// Label → score weights carried by one token.
pub type LabelScores = BTreeMap<String, f64>;

/// Token → label weights for one source.
pub type TokenTable = BTreeMap<String, LabelScores>;

/// One weighted `(source, token, label)` row as stored by a lexicon source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenEntry {
    /// Name of the dictionary that contributed the row.
    pub source: String,
    /// Word or phrase; lowercased when realized into a [`Lexicon`].
    pub token: String,
    /// Sentiment category, e.g. `"positive"`.
    pub label: String,
    /// Signed weight added per match.
    pub score: f64,
}

impl TokenEntry {
    fn check_score(&self) -> Result<(), Error> {
        if self.score.is_finite() {
            Ok(())
        } else {
            Err(Error::InvalidEntry("score must be finite"))
        }
    }

    /// Convenience constructor.
    pub fn new(source: &str, token: &str, label: &str, score: f64) -> Self {
        Self {
            source: source.to_string(),
            token: token.to_string(),
            label: label.to_string(),
            score,
        }
    }
}

/// External supplier of lexicon rows.
///
/// Implementations typically sit on top of a database table; the crate consumes a source
/// once per cache generation (see [`crate::LexiconCache`]).
pub trait LexiconSource {
    /// Distinct source names.
    fn sources(&self) -> Result<Vec<String>, Error>;

    /// All rows belonging to `source`.
    fn entries(&self, source: &str) -> Result<Vec<TokenEntry>, Error>;
}

/// Realized `source → token → label → score` mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lexicon {
    sources: BTreeMap<String, TokenTable>,
}

impl Lexicon {
    /// Create an empty lexicon.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from rows, in order. A later row for the same `(source, token, label)` wins.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = TokenEntry>,
    {
        let mut lexicon = Self::new();
        for entry in entries {
            lexicon.insert(&entry.source, &entry.token, &entry.label, entry.score);
        }
        lexicon
    }

    /// Realize a lexicon from an external source.
    ///
    /// Every enumerated source gets a table, even one without rows, so scoring output
    /// always carries a key per source. Rows with a non-finite score are rejected.
    pub fn from_source<S: LexiconSource + ?Sized>(source: &S) -> Result<Self, Error> {
        let mut names = source.sources()?;
        names.sort();
        names.dedup();

        let mut lexicon = Self::new();
        for name in names {
            lexicon.sources.entry(name.clone()).or_default();
            for entry in source.entries(&name)? {
                entry.check_score()?;
                lexicon.insert(&name, &entry.token, &entry.label, entry.score);
            }
        }
        Ok(lexicon)
    }

    /// Add (or overwrite) one weight. The token is lowercased.
    pub fn insert(&mut self, source: &str, token: &str, label: &str, score: f64) {
        self.sources
            .entry(source.to_string())
            .or_default()
            .entry(token.to_lowercase())
            .or_default()
            .insert(label.to_string(), score);
    }

    /// Iterate `(source, token table)` in source-name order.
    pub fn sources(&self) -> impl Iterator<Item = (&str, &TokenTable)> + '_ {
        self.sources.iter().map(|(name, table)| (name.as_str(), table))
    }

    /// Token table for one source.
    pub fn tokens(&self, source: &str) -> Option<&TokenTable> {
        self.sources.get(source)
    }

    /// Number of sources.
    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }

    /// Number of `(source, token)` pairs.
    pub fn num_tokens(&self) -> usize {
        self.sources.values().map(|t| t.len()).sum()
    }

    /// Whether the lexicon has no sources at all.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Every `source_label` name (lowercased) this lexicon can produce.
    ///
    /// Sources in name order, labels sorted and de-duplicated per source. Callers use this
    /// to declare output columns ahead of scoring.
    pub fn annotation_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        for (source, tokens) in &self.sources {
            let labels: BTreeSet<&str> = tokens
                .values()
                .flat_map(|labels| labels.keys().map(|l| l.as_str()))
                .collect();
            for label in labels {
                fields.push(format!("{source}_{label}").to_lowercase());
            }
        }
        fields
    }
}

/// In-memory [`LexiconSource`] over a list of rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryLexiconSource {
    entries: Vec<TokenEntry>,
}

impl MemoryLexiconSource {
    /// Create a source, rejecting rows with an empty token or a non-finite score.
    pub fn new(entries: Vec<TokenEntry>) -> Result<Self, Error> {
        for entry in &entries {
            if entry.token.is_empty() {
                return Err(Error::InvalidEntry("token must not be empty"));
            }
            entry.check_score()?;
        }
        Ok(Self { entries })
    }

    /// Load rows from a JSON array of `{source, token, label, score}` objects.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let entries: Vec<TokenEntry> = serde_json::from_reader(reader)?;
        Self::new(entries)
    }

    /// Load rows from a JSON string (see [`MemoryLexiconSource::from_json_reader`]).
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let entries: Vec<TokenEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LexiconSource for MemoryLexiconSource {
    fn sources(&self) -> Result<Vec<String>, Error> {
        let names: BTreeSet<&str> = self.entries.iter().map(|e| e.source.as_str()).collect();
        Ok(names.into_iter().map(str::to_string).collect())
    }

    fn entries(&self, source: &str) -> Result<Vec<TokenEntry>, Error> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.source == source)
            .cloned()
            .collect())
    }
}
