//! Call-text sentiment and the per-caller danger ranking.
//!
//! Every row's `Call_Text` is scored to a polarity `p` in `[-1, 1]` and
//! classified Positive if `p > 0.1`, Negative if `p < -0.1`, and Neutral
//! otherwise; exactly 0.1 is Neutral. For each caller only the single
//! most negative call is retained; the retained calls, most negative
//! first, form the danger list.

#![allow(clippy::module_name_repetitions)]

pub mod lexicon;

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use callnet_core::{CallTable, ErrorCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub use lexicon::{LexiconError, LexiconScorer};

/// Polarity above which a call is Positive.
pub const POSITIVE_THRESHOLD: f64 = 0.1;
/// Polarity below which a call is Negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.1;

/// Anything that maps free text to a polarity in `[-1, 1]`.
pub trait PolarityScorer {
    fn polarity(&self, text: &str) -> f64;
}

/// Sentiment ranking parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// Length of the danger list. Default: 20.
    pub top_n: usize,
    /// Extra `word,polarity` CSV merged over the built-in lexicon.
    pub extra_lexicon: Option<PathBuf>,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            top_n: 20,
            extra_lexicon: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SentimentError {
    #[error("input has no Call_Text column")]
    MissingCallText,
}

impl SentimentError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingCallText => ErrorCode::MissingCallText,
        }
    }
}

/// Three-way polarity class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SentimentClass {
    Positive,
    Neutral,
    Negative,
}

impl SentimentClass {
    /// Positive iff `p > 0.1`, Negative iff `p < -0.1`, Neutral otherwise.
    #[must_use]
    pub fn classify(polarity: f64) -> Self {
        if polarity > POSITIVE_THRESHOLD {
            Self::Positive
        } else if polarity < NEGATIVE_THRESHOLD {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative",
        }
    }
}

impl fmt::Display for SentimentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scored input row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCall {
    pub line: u64,
    pub caller_id: String,
    pub polarity: f64,
    pub sentiment: SentimentClass,
}

/// A caller's most negative call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DangerRecord {
    pub polarity: f64,
    pub caller_id: String,
    pub call_text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassCounts {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

/// Scored rows plus the danger list.
#[derive(Debug, Clone, Serialize)]
pub struct SentimentReport {
    pub calls: Vec<ScoredCall>,
    pub danger: Vec<DangerRecord>,
}

impl SentimentReport {
    #[must_use]
    pub fn counts(&self) -> ClassCounts {
        let mut counts = ClassCounts::default();
        for call in &self.calls {
            match call.sentiment {
                SentimentClass::Positive => counts.positive += 1,
                SentimentClass::Neutral => counts.neutral += 1,
                SentimentClass::Negative => counts.negative += 1,
            }
        }
        counts
    }
}

/// Keep each caller's most negative record, then sort ascending.
///
/// Ties within a caller keep the first record seen; ties across callers
/// keep caller first-appearance order. The result is truncated to `top_n`.
#[must_use]
pub fn rank_danger<I, S, T>(records: I, top_n: usize) -> Vec<DangerRecord>
where
    I: IntoIterator<Item = (S, f64, T)>,
    S: Into<String>,
    T: Into<String>,
{
    let mut kept: Vec<DangerRecord> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();

    for (caller, polarity, text) in records {
        let caller = caller.into();
        match position.get(&caller) {
            Some(&i) => {
                if polarity < kept[i].polarity {
                    kept[i].polarity = polarity;
                    kept[i].call_text = text.into();
                }
            }
            None => {
                position.insert(caller.clone(), kept.len());
                kept.push(DangerRecord {
                    polarity,
                    caller_id: caller,
                    call_text: text.into(),
                });
            }
        }
    }

    kept.sort_by(|a, b| a.polarity.total_cmp(&b.polarity));
    kept.truncate(top_n);
    kept
}

/// Score every row of `table` and build the danger list.
///
/// Empty call text scores 0.
///
/// # Errors
///
/// Returns [`SentimentError::MissingCallText`] when the table was loaded
/// without a `Call_Text` column.
#[instrument(skip(table, scorer), fields(rows = table.len()))]
pub fn analyze_sentiment<P: PolarityScorer + ?Sized>(
    table: &CallTable,
    scorer: &P,
    top_n: usize,
) -> Result<SentimentReport, SentimentError> {
    if !table.has_call_text {
        return Err(SentimentError::MissingCallText);
    }

    let mut calls = Vec::with_capacity(table.len());
    let mut texts = Vec::with_capacity(table.len());
    for record in table {
        let text = record.call_text.as_deref().unwrap_or("");
        let polarity = if text.is_empty() {
            0.0
        } else {
            scorer.polarity(text)
        };
        calls.push(ScoredCall {
            line: record.line,
            caller_id: record.caller_id.clone(),
            polarity,
            sentiment: SentimentClass::classify(polarity),
        });
        texts.push((record.caller_id.as_str(), polarity, text));
    }

    let danger = rank_danger(texts, top_n);
    debug!(scored = calls.len(), danger = danger.len(), "sentiment scored");

    Ok(SentimentReport { calls, danger })
}
