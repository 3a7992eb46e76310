//! Keyed annotation envelopes.

use crate::score::ScoreResult;
use crate::Error;
use std::collections::BTreeMap;

/// Key prefix of every sentiment annotation stored on a record.
pub const ANNOTATION_BASE: &str = "pdk_sentiment_scores";

/// `annotation key → scores`. One key when built, empty when the field was skipped.
pub type Envelope = BTreeMap<String, ScoreResult>;

/// `"pdk_sentiment_scores"` or `"pdk_sentiment_scores_<field>"`.
pub fn annotation_key(field_name: Option<&str>) -> String {
    match field_name {
        Some(field) => format!("{ANNOTATION_BASE}_{field}"),
        None => ANNOTATION_BASE.to_string(),
    }
}

/// Wrap `scores` under the annotation key for `field_name`.
pub fn build_envelope(scores: ScoreResult, field_name: Option<&str>) -> Envelope {
    let mut envelope = Envelope::new();
    envelope.insert(annotation_key(field_name), scores);
    envelope
}

/// JSON object form of an envelope, ready to merge into a stored record.
///
/// JSON has no representation for non-finite numbers, so any such score is an error
/// rather than a silent `null`.
pub fn envelope_to_json(envelope: &Envelope) -> Result<serde_json::Value, Error> {
    let non_finite = envelope
        .values()
        .flat_map(|scores| scores.values())
        .flat_map(|labels| labels.values())
        .any(|score| !score.is_finite());
    if non_finite {
        return Err(Error::InvalidEntry("score must be finite"));
    }
    Ok(serde_json::to_value(envelope)?)
}
