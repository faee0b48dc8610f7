//! Lexicon-based polarity scoring.
//!
//! # Scoring
//!
//! Text is lowercased and split into words; `.`, `!`, `?`, `;` and `,`
//! end a clause. Every word found in the lexicon contributes its polarity,
//! scaled by any modifiers that precede it in the same clause:
//!
//! - intensifiers multiply it (`very` ×1.3, `extremely` ×1.5, ...);
//! - negators (`not`, `never`, any `*n't`, ...) multiply it by −0.5.
//!
//! Modifiers apply to the next scored word only. The text's polarity is the
//! mean of all contributions, clamped to `[-1, 1]`; text with no scored
//! words is neutral (0).
//!
//! # Extra lexicon
//!
//! [`LexiconScorer::with_extra_lexicon`] loads `word,polarity` rows from a
//! headerless CSV file (`#` starts a comment line). Entries override the
//! built-in lexicon.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use callnet_core::ErrorCode;
use csv::ReaderBuilder;
use tracing::{debug, instrument};

use super::PolarityScorer;

/// Built-in word polarities.
const BASE_LEXICON: &[(&str, f64)] = &[
    // Positive
    ("good", 0.7),
    ("great", 0.8),
    ("excellent", 1.0),
    ("amazing", 0.6),
    ("wonderful", 1.0),
    ("fantastic", 0.4),
    ("awesome", 1.0),
    ("nice", 0.6),
    ("fine", 0.4),
    ("happy", 0.8),
    ("glad", 0.5),
    ("pleased", 0.5),
    ("love", 0.5),
    ("lovely", 0.5),
    ("like", 0.2),
    ("thanks", 0.2),
    ("thank", 0.2),
    ("grateful", 0.6),
    ("kind", 0.6),
    ("helpful", 0.5),
    ("safe", 0.5),
    ("calm", 0.3),
    ("okay", 0.5),
    ("ok", 0.5),
    ("well", 0.2),
    ("best", 1.0),
    ("better", 0.5),
    ("perfect", 1.0),
    ("beautiful", 0.85),
    ("friendly", 0.4),
    ("welcome", 0.8),
    ("congratulations", 0.8),
    ("success", 0.3),
    ("successful", 0.75),
    ("enjoy", 0.4),
    ("fun", 0.3),
    ("interesting", 0.5),
    ("sure", 0.5),
    ("right", 0.29),
    ("correct", 0.4),
    ("easy", 0.43),
    ("positive", 0.23),
    ("polite", 0.4),
    ("relieved", 0.4),
    ("hope", 0.3),
    ("peaceful", 0.5),
    ("secure", 0.4),
    ("reliable", 0.5),
    ("honest", 0.6),
    ("trust", 0.4),
    // Negative
    ("bad", -0.7),
    ("terrible", -1.0),
    ("awful", -1.0),
    ("horrible", -1.0),
    ("worst", -1.0),
    ("worse", -0.4),
    ("poor", -0.4),
    ("sad", -0.5),
    ("unhappy", -0.6),
    ("angry", -0.5),
    ("mad", -0.6),
    ("furious", -0.8),
    ("hate", -0.8),
    ("hateful", -0.8),
    ("stupid", -0.8),
    ("idiot", -0.8),
    ("ugly", -0.7),
    ("wrong", -0.5),
    ("evil", -1.0),
    ("cruel", -0.8),
    ("nasty", -0.8),
    ("rude", -0.6),
    ("annoying", -0.6),
    ("scared", -0.5),
    ("afraid", -0.6),
    ("fear", -0.6),
    ("panic", -0.6),
    ("dangerous", -0.6),
    ("danger", -0.6),
    ("threat", -0.6),
    ("threaten", -0.7),
    ("threatening", -0.7),
    ("kill", -0.8),
    ("killed", -0.8),
    ("murder", -0.9),
    ("die", -0.7),
    ("dead", -0.2),
    ("death", -0.6),
    ("hurt", -0.6),
    ("harm", -0.6),
    ("destroy", -0.7),
    ("bomb", -0.7),
    ("explode", -0.7),
    ("explosive", -0.7),
    ("attack", -0.6),
    ("shoot", -0.7),
    ("gun", -0.4),
    ("weapon", -0.5),
    ("hostage", -0.7),
    ("ransom", -0.6),
    ("revenge", -0.6),
    ("regret", -0.5),
    ("sorry", -0.5),
    ("suffer", -0.6),
    ("pain", -0.5),
    ("violent", -0.8),
    ("crazy", -0.6),
    ("disgusting", -1.0),
    ("pathetic", -1.0),
    ("useless", -0.5),
    ("fake", -0.5),
    ("false", -0.4),
    ("hoax", -0.5),
    ("warning", -0.3),
    ("emergency", -0.4),
    ("urgent", -0.2),
];

/// Words that scale the next scored word.
const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("so", 1.2),
    ("too", 1.2),
    ("extremely", 1.5),
    ("absolutely", 1.5),
    ("totally", 1.4),
    ("completely", 1.4),
    ("incredibly", 1.5),
    ("highly", 1.3),
    ("quite", 1.1),
    ("pretty", 1.1),
    ("slightly", 0.6),
    ("somewhat", 0.7),
    ("barely", 0.5),
];

/// Words that flip and damp the next scored word.
const NEGATORS: &[&str] = &[
    "not", "no", "never", "none", "nobody", "nothing", "neither", "nor", "cannot", "without",
];

/// Multiplier applied by a negator.
const NEGATION: f64 = -0.5;

/// Errors raised while loading an extra lexicon file.
#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error("cannot read lexicon {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed lexicon row: {0}")]
    Csv(#[from] csv::Error),

    #[error("lexicon line {line}: polarity `{value}` for `{word}` is not a number in [-1, 1]")]
    InvalidPolarity {
        line: u64,
        word: String,
        value: String,
    },
}

impl LexiconError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } => ErrorCode::InputNotFound,
            Self::Csv(_) | Self::InvalidPolarity { .. } => ErrorCode::LexiconParseError,
        }
    }
}

/// Polarity scorer backed by a word lexicon.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    words: HashMap<String, f64>,
    intensifiers: HashMap<&'static str, f64>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self {
            words: BASE_LEXICON
                .iter()
                .map(|&(w, p)| (w.to_string(), p))
                .collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        }
    }
}

impl LexiconScorer {
    /// Scorer with the built-in lexicon only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or override entries from a `word,polarity` CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`LexiconError`] if the file cannot be read or a row is
    /// malformed.
    #[instrument(skip(self))]
    pub fn with_extra_lexicon(mut self, path: &Path) -> Result<Self, LexiconError> {
        let bytes = std::fs::read(path).map_err(|source| LexiconError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let added = self.extend_from_csv(&bytes)?;
        debug!(added, total = self.words.len(), "extra lexicon loaded");
        Ok(self)
    }

    fn extend_from_csv(&mut self, bytes: &[u8]) -> Result<usize, LexiconError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(bytes);

        let mut added = 0;
        for row in reader.records() {
            let row = row?;
            let line = row.position().map_or(0, csv::Position::line);
            let word = row.get(0).unwrap_or("").to_lowercase();
            if word.is_empty() {
                continue;
            }
            let raw = row.get(1).unwrap_or("");
            let polarity = raw
                .parse::<f64>()
                .ok()
                .filter(|p| p.is_finite() && (-1.0..=1.0).contains(p))
                .ok_or_else(|| LexiconError::InvalidPolarity {
                    line,
                    word: word.clone(),
                    value: raw.to_string(),
                })?;
            self.words.insert(word, polarity);
            added += 1;
        }
        Ok(added)
    }

    /// Polarity of a single word, if the lexicon knows it.
    #[must_use]
    pub fn word_polarity(&self, word: &str) -> Option<f64> {
        self.words.get(&word.to_lowercase()).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn is_negator(word: &str) -> bool {
    NEGATORS.iter().any(|n| *n == word) || word.ends_with("n't")
}

impl PolarityScorer for LexiconScorer {
    #[allow(clippy::cast_precision_loss)]
    fn polarity(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase().replace('\u{2019}', "'");
        let mut scores: Vec<f64> = Vec::new();

        for clause in lowered.split(['.', '!', '?', ';', ',']) {
            let mut modifier = 1.0;
            let words = clause
                .split(|c: char| !(c.is_alphanumeric() || c == '\''))
                .map(|w| w.trim_matches('\''))
                .filter(|w| !w.is_empty());

            for word in words {
                if let Some(&p) = self.words.get(word) {
                    scores.push(p * modifier);
                    modifier = 1.0;
                } else if let Some(&m) = self.intensifiers.get(word) {
                    modifier *= m;
                } else if is_negator(word) {
                    modifier *= NEGATION;
                }
            }
        }

        if scores.is_empty() {
            return 0.0;
        }
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        mean.clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn neutral_text_scores_zero() {
        let s = LexiconScorer::new();
        assert!(approx(s.polarity("meet me at the station at noon"), 0.0));
        assert!(approx(s.polarity(""), 0.0));
    }

    #[test]
    fn mean_of_scored_words() {
        let s = LexiconScorer::new();
        // good 0.7, bad -0.7
        assert!(approx(s.polarity("good and bad"), 0.0));
        assert!(approx(s.polarity("Good, great!"), 0.75));
    }

    #[test]
    fn intensifier_scales_next_word() {
        let s = LexiconScorer::new();
        assert!(approx(s.polarity("very good"), 0.7 * 1.3));
    }

    #[test]
    fn negation_flips_and_damps() {
        let s = LexiconScorer::new();
        assert!(approx(s.polarity("not good"), -0.35));
        assert!(approx(s.polarity("this isn't good"), -0.35));
        assert!(approx(s.polarity("I don’t hate you"), 0.4));
    }

    #[test]
    fn modifiers_reset_at_clause_end() {
        let s = LexiconScorer::new();
        assert!(approx(s.polarity("not now. good"), 0.7));
    }

    #[test]
    fn result_is_clamped() {
        let s = LexiconScorer::new();
        let p = s.polarity("extremely excellent");
        assert!(approx(p, 1.0));
        let p = s.polarity("absolutely terrible");
        assert!(approx(p, -1.0));
    }

    #[test]
    fn threat_language_is_negative() {
        let s = LexiconScorer::new();
        assert!(s.polarity("there is a bomb, everyone will die") < -0.1);
    }

    #[test]
    fn extra_lexicon_overrides_and_extends() {
        let mut s = LexiconScorer::new();
        let added = s
            .extend_from_csv(b"# custom words\nsnitch,-0.9\nGood, 0.1\n")
            .expect("valid lexicon");
        assert_eq!(added, 2);
        assert_eq!(s.word_polarity("snitch"), Some(-0.9));
        assert_eq!(s.word_polarity("good"), Some(0.1));
    }

    #[test]
    fn extra_lexicon_rejects_out_of_range() {
        let mut s = LexiconScorer::new();
        let err = s.extend_from_csv(b"boom,-3\n").expect_err("out of range");
        assert!(matches!(err, LexiconError::InvalidPolarity { line: 1, .. }));
        assert_eq!(err.error_code(), ErrorCode::LexiconParseError);
    }

    #[test]
    fn missing_lexicon_file() {
        let err = LexiconScorer::new()
            .with_extra_lexicon(Path::new("/no/such/lexicon.csv"))
            .expect_err("missing");
        assert_eq!(err.error_code(), ErrorCode::InputNotFound);
    }
}
