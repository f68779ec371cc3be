//! Lexical sentiment scoring
//!
//! A small, fixed lexicon tuned for how students describe worries. Tokens are
//! scored with integer weights, negations flip the polarity of the next
//! sentiment-bearing token and intensifiers scale its magnitude. The sum is
//! normalized by token count and clamped into [-1, 1].

use crate::types::SentimentResult;

/// Tokens after a negation that may still be flipped by it
const NEGATION_WINDOW: usize = 3;
/// Upper bound for stacked intensifiers
const MAX_INTENSITY: f64 = 4.0;

const POSITIVE: &[(&str, f64)] = &[
    ("good", 2.0),
    ("great", 3.0),
    ("happy", 3.0),
    ("calm", 2.0),
    ("relaxed", 2.0),
    ("fine", 1.0),
    ("okay", 1.0),
    ("ok", 1.0),
    ("confident", 2.0),
    ("excited", 2.0),
    ("grateful", 3.0),
    ("hopeful", 2.0),
    ("love", 3.0),
    ("enjoy", 2.0),
    ("enjoying", 2.0),
    ("peaceful", 2.0),
    ("motivated", 2.0),
    ("productive", 2.0),
    ("proud", 2.0),
    ("better", 1.0),
    ("well", 1.0),
    ("manageable", 1.0),
    ("supported", 2.0),
    ("rested", 2.0),
    ("balanced", 2.0),
    ("fun", 2.0),
    ("glad", 2.0),
    ("content", 2.0),
    ("ready", 1.0),
    ("thankful", 2.0),
];

const NEGATIVE: &[(&str, f64)] = &[
    ("bad", 2.0),
    ("sad", 2.0),
    ("stressed", 2.0),
    ("stress", 2.0),
    ("stressful", 2.0),
    ("anxious", 3.0),
    ("anxiety", 3.0),
    ("worried", 2.0),
    ("worry", 2.0),
    ("worrying", 2.0),
    ("scared", 2.0),
    ("afraid", 2.0),
    ("fear", 2.0),
    ("panic", 3.0),
    ("overwhelmed", 3.0),
    ("overwhelming", 3.0),
    ("exhausted", 3.0),
    ("tired", 2.0),
    ("alone", 2.0),
    ("lonely", 3.0),
    ("isolated", 3.0),
    ("hopeless", 3.0),
    ("helpless", 3.0),
    ("worthless", 3.0),
    ("terrible", 3.0),
    ("awful", 3.0),
    ("horrible", 3.0),
    ("angry", 2.0),
    ("frustrated", 2.0),
    ("upset", 2.0),
    ("fail", 2.0),
    ("failing", 3.0),
    ("failed", 2.0),
    ("failure", 3.0),
    ("behind", 1.0),
    ("pressure", 2.0),
    ("deadline", 1.0),
    ("deadlines", 1.0),
    ("hate", 3.0),
    ("cry", 2.0),
    ("crying", 2.0),
    ("depressed", 3.0),
    ("miserable", 3.0),
    ("nervous", 2.0),
    ("sick", 2.0),
    ("struggling", 2.0),
    ("struggle", 2.0),
    ("hard", 1.0),
    ("difficult", 1.0),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nothing", "nobody", "neither", "nor", "without", "hardly",
    "barely", "cannot", "can't", "cant", "don't", "dont", "doesn't", "doesnt", "didn't",
    "didnt", "isn't", "isnt", "wasn't", "wasnt", "aren't", "arent", "won't", "wont",
    "shouldn't", "couldn't", "wouldn't", "haven't", "hasn't",
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.5),
    ("really", 1.5),
    ("extremely", 2.0),
    ("super", 1.5),
    ("so", 1.3),
    ("too", 1.3),
    ("totally", 1.5),
    ("completely", 1.8),
    ("absolutely", 1.8),
    ("incredibly", 1.8),
    ("constantly", 1.5),
    ("always", 1.3),
    ("deeply", 1.5),
];

fn lookup(table: &[(&str, f64)], token: &str) -> Option<f64> {
    table.iter().find(|(word, _)| *word == token).map(|(_, w)| *w)
}

/// Polarity of a single token, if it carries any
fn token_polarity(token: &str) -> Option<f64> {
    lookup(POSITIVE, token).or_else(|| lookup(NEGATIVE, token).map(|w| -w))
}

/// Lowercase words; apostrophes are kept inside words ("can't")
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '’'))
        .map(|t| t.trim_matches(|c: char| c == '\'' || c == '’').replace('’', "'").to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Stateless sentiment scorer over the built-in lexicon
#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Score a piece of free text
    pub fn analyze(&self, text: &str) -> SentimentResult {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return SentimentResult::default();
        }

        let mut sum = 0.0;
        let mut matched = 0;
        // Tokens remaining in which a pending negation still applies
        let mut negation_left = 0usize;
        let mut multiplier = 1.0;

        for token in &tokens {
            if NEGATIONS.contains(&token.as_str()) {
                negation_left = NEGATION_WINDOW;
                continue;
            }
            if let Some(scale) = lookup(INTENSIFIERS, token) {
                multiplier = (multiplier * scale).min(MAX_INTENSITY);
                continue;
            }

            if let Some(polarity) = token_polarity(token) {
                let mut value = polarity * multiplier;
                if negation_left > 0 {
                    value = -value;
                }
                sum += value;
                matched += 1;
                negation_left = 0;
                multiplier = 1.0;
            } else {
                negation_left = negation_left.saturating_sub(1);
                multiplier = 1.0;
            }
        }

        let score = sum / tokens.len() as f64;
        let score = if score.is_finite() {
            score.clamp(-1.0, 1.0)
        } else {
            0.0
        };

        SentimentResult {
            score,
            token_count: tokens.len(),
            matched_tokens: matched,
        }
    }
}

/// Score free text with the default analyzer
pub fn analyze_sentiment(text: &str) -> SentimentResult {
    SentimentAnalyzer.analyze(text)
}
