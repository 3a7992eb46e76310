//! Token matching and weighted label scoring.
//!
//! Matching is deliberately simple: content is lowercased and trimmed, and a token
//! matches where it is delimited by single spaces or the ends of the content. Tokens
//! made only of punctuation (emoticons, `"!!"`) additionally match anywhere as raw
//! substrings.

use crate::lexicon::Lexicon;
use crate::punctuation::PunctuationCache;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// `source key → label → accumulated score`.
pub type ScoreResult = BTreeMap<String, BTreeMap<String, f64>>;

static NON_ALNUM_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("static slug pattern"));

/// Score `content` against every token of every source in `lexicon`.
///
/// `None` scores like the empty string. Each source appears in the output, keyed by
/// [`source_key`], even when nothing matched. If two source names share a key, the
/// later source in name order wins.
pub fn score(
    content: Option<&str>,
    lexicon: &Lexicon,
    punctuation: &PunctuationCache,
) -> ScoreResult {
    let content = content.unwrap_or("").to_lowercase();
    let content = content.trim();

    let mut scores = ScoreResult::new();
    for (source, tokens) in lexicon.sources() {
        let mut source_scores: BTreeMap<String, f64> = BTreeMap::new();

        for (token, labels) in tokens {
            if token.is_empty() || token.len() > content.len() {
                continue;
            }

            let mut count = boundary_count(content, token);
            if punctuation.is_symbolic(token) {
                count += content.matches(token.as_str()).count();
            }
            if count == 0 {
                continue;
            }

            for (label, weight) in labels {
                *source_scores.entry(label.clone()).or_insert(0.0) += count as f64 * weight;
            }
        }

        scores.insert(source_key(source), source_scores);
    }
    scores
}

/// Whole-word occurrences of `token` in already-normalized `content`.
///
/// Exact equality counts once. Otherwise a leading `token + " "`, a trailing
/// `" " + token` and each non-overlapping interior `" " + token + " "` count once each.
/// Empty tokens never match.
pub fn boundary_count(content: &str, token: &str) -> usize {
    if token.is_empty() || token.len() > content.len() {
        return 0;
    }
    if content == token {
        return 1;
    }

    let mut count = 0;
    if content.starts_with(token) && content[token.len()..].starts_with(' ') {
        count += 1;
    }
    if content.ends_with(token) && content[..content.len() - token.len()].ends_with(' ') {
        count += 1;
    }
    let padded = format!(" {token} ");
    count += content.matches(padded.as_str()).count();
    count
}

/// Output key for a source name: lowercased, each run of non-alphanumeric characters
/// collapsed to `_`, no leading or trailing `_`.
pub fn source_key(source: &str) -> String {
    let lowered = source.to_lowercase();
    NON_ALNUM_RUN
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}
