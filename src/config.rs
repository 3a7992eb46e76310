//! Annotator configuration.
//!
//! # JSON shape
//!
//! ```json
//! {
//!   "skip_fields": ["url"],
//!   "field_priorities": ["text", "caption", "title"]
//! }
//! ```
//!
//! Omitted fields take their defaults.

use crate::Error;
use serde::{Deserialize, Serialize};

/// Field names whose content is never scored.
pub const DEFAULT_SKIP_FIELDS: &[&str] = &["url"];

/// Order in which annotated fields are preferred when resolving a record.
pub const DEFAULT_FIELD_PRIORITIES: &[&str] = &[
    "text",
    "caption",
    "fullText",
    "full_text",
    "post",
    "comment",
    "description",
    "title",
    "name",
    "place",
    "location",
];

/// Skip set and field-priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatorConfig {
    /// Fields that `annotate` returns an empty envelope for.
    #[serde(default = "default_skip_fields")]
    pub skip_fields: Vec<String>,

    /// Candidate fields tried, in order, when no preferred field is given.
    #[serde(default = "default_field_priorities")]
    pub field_priorities: Vec<String>,
}

fn default_skip_fields() -> Vec<String> {
    DEFAULT_SKIP_FIELDS.iter().map(|s| s.to_string()).collect()
}

fn default_field_priorities() -> Vec<String> {
    DEFAULT_FIELD_PRIORITIES.iter().map(|s| s.to_string()).collect()
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            skip_fields: default_skip_fields(),
            field_priorities: default_field_priorities(),
        }
    }
}

impl AnnotatorConfig {
    /// Parse from JSON; missing keys fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replace the skip set.
    pub fn with_skip_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the field-priority order.
    pub fn with_field_priorities<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_priorities = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Whether content of `field_name` is skipped.
    pub fn is_skipped(&self, field_name: Option<&str>) -> bool {
        field_name.is_some_and(|f| self.skip_fields.iter().any(|s| s == f))
    }
}
