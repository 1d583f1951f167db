//! Lexicon toxicity classifier adapter
//!
//! Each lexicon term carries a weight per label. A text's score for a label
//! is the noisy-OR of the weights of the distinct terms it contains:
//! `1 - Π(1 - w)`. Terms are matched on lowercase word boundaries and may
//! span several words.

use std::collections::{BTreeSet, HashMap};

use application::{error::ApplicationError, ports::ToxicityClassifierPort};
use async_trait::async_trait;
use domain::{LabelScores, ToxicityLabel};
use tracing::{debug, instrument};

use crate::config::ToxicityModelFamily;

use domain::ToxicityLabel::{
    IdentityAttack as IDENTITY, Insult as INSULT, Obscene as OBSCENE, SevereToxicity as SEVERE,
    SexualExplicit as SEXUAL, Threat as THREAT, Toxicity as TOXIC,
};

/// Weight multiplier for identity-sensitive terms in the unbiased family
const UNBIASED_IDENTITY_FACTOR: f64 = 0.5;

struct Term {
    phrase: &'static str,
    weights: &'static [(ToxicityLabel, f64)],
    /// Terms that also appear in benign discussion of identity groups
    identity_sensitive: bool,
}

const fn term(phrase: &'static str, weights: &'static [(ToxicityLabel, f64)]) -> Term {
    Term {
        phrase,
        weights,
        identity_sensitive: false,
    }
}

const fn identity_term(phrase: &'static str, weights: &'static [(ToxicityLabel, f64)]) -> Term {
    Term {
        phrase,
        weights,
        identity_sensitive: true,
    }
}

static ENGLISH: &[Term] = &[
    term("idiot", &[(TOXIC, 0.85), (INSULT, 0.8)]),
    term("idiots", &[(TOXIC, 0.85), (INSULT, 0.8)]),
    term("moron", &[(TOXIC, 0.85), (INSULT, 0.8)]),
    term("stupid", &[(TOXIC, 0.7), (INSULT, 0.6)]),
    term("dumb", &[(TOXIC, 0.6), (INSULT, 0.5)]),
    term("loser", &[(TOXIC, 0.6), (INSULT, 0.55)]),
    term("pathetic", &[(TOXIC, 0.5), (INSULT, 0.45)]),
    term("worthless", &[(TOXIC, 0.6), (INSULT, 0.55)]),
    term("ugly", &[(TOXIC, 0.5), (INSULT, 0.45)]),
    term("shut up", &[(TOXIC, 0.6), (INSULT, 0.3)]),
    term("hate you", &[(TOXIC, 0.75), (INSULT, 0.4)]),
    term("kill you", &[(TOXIC, 0.9), (THREAT, 0.85), (SEVERE, 0.3)]),
    term("i will kill", &[(TOXIC, 0.9), (THREAT, 0.9), (SEVERE, 0.4)]),
    term("hurt you", &[(TOXIC, 0.7), (THREAT, 0.7)]),
    term("beat you up", &[(TOXIC, 0.7), (THREAT, 0.7)]),
    term("go die", &[(TOXIC, 0.85), (THREAT, 0.5), (SEVERE, 0.4)]),
    term("die", &[(TOXIC, 0.4), (THREAT, 0.3)]),
    term("fuck", &[(TOXIC, 0.9), (OBSCENE, 0.9), (SEVERE, 0.4)]),
    term("fucking", &[(TOXIC, 0.85), (OBSCENE, 0.85), (SEVERE, 0.3)]),
    term("shit", &[(TOXIC, 0.7), (OBSCENE, 0.75)]),
    term("bitch", &[(TOXIC, 0.85), (OBSCENE, 0.7), (INSULT, 0.7)]),
    term("bastard", &[(TOXIC, 0.8), (OBSCENE, 0.5), (INSULT, 0.7)]),
    term("asshole", &[(TOXIC, 0.9), (OBSCENE, 0.8), (INSULT, 0.8)]),
    term("damn", &[(TOXIC, 0.3), (OBSCENE, 0.3)]),
    term("crap", &[(TOXIC, 0.35), (OBSCENE, 0.35)]),
    term("porn", &[(TOXIC, 0.4), (OBSCENE, 0.5), (SEXUAL, 0.8)]),
    term("naked", &[(SEXUAL, 0.5)]),
    term("nude", &[(SEXUAL, 0.5)]),
    term("dick", &[(TOXIC, 0.7), (OBSCENE, 0.7), (SEXUAL, 0.5), (INSULT, 0.5)]),
    term("slut", &[(TOXIC, 0.85), (OBSCENE, 0.6), (SEXUAL, 0.7), (INSULT, 0.8)]),
    term("subhuman", &[(TOXIC, 0.85), (SEVERE, 0.5), (IDENTITY, 0.8), (INSULT, 0.7)]),
    term("vermin", &[(TOXIC, 0.7), (IDENTITY, 0.6), (INSULT, 0.6)]),
    term("go back to your country", &[(TOXIC, 0.75), (IDENTITY, 0.8)]),
    identity_term("your kind", &[(TOXIC, 0.4), (IDENTITY, 0.45)]),
    identity_term("people like you", &[(TOXIC, 0.4), (IDENTITY, 0.4)]),
    identity_term("terrorist", &[(TOXIC, 0.5), (IDENTITY, 0.4)]),
    identity_term("terrorists", &[(TOXIC, 0.5), (IDENTITY, 0.4)]),
];

static MULTILINGUAL: &[Term] = &[
    term("idiota", &[(TOXIC, 0.85), (INSULT, 0.8)]),
    term("estúpido", &[(TOXIC, 0.7), (INSULT, 0.6)]),
    term("mierda", &[(TOXIC, 0.7), (OBSCENE, 0.75)]),
    term("puta", &[(TOXIC, 0.85), (OBSCENE, 0.7), (SEXUAL, 0.4), (INSULT, 0.75)]),
    term("imbécile", &[(TOXIC, 0.8), (INSULT, 0.75)]),
    term("connard", &[(TOXIC, 0.9), (OBSCENE, 0.6), (INSULT, 0.85)]),
    term("merde", &[(TOXIC, 0.7), (OBSCENE, 0.75)]),
    term("dummkopf", &[(TOXIC, 0.75), (INSULT, 0.7)]),
    term("scheiße", &[(TOXIC, 0.7), (OBSCENE, 0.7)]),
    term("arschloch", &[(TOXIC, 0.9), (OBSCENE, 0.75), (INSULT, 0.85)]),
];

/// Weighted-lexicon stand-in for a toxicity model
pub struct LexiconToxicityClassifier {
    family: ToxicityModelFamily,
    lexicon: HashMap<String, Vec<(ToxicityLabel, f64)>>,
    max_phrase_words: usize,
}

impl std::fmt::Debug for LexiconToxicityClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LexiconToxicityClassifier")
            .field("family", &self.family)
            .field("terms", &self.lexicon.len())
            .finish()
    }
}

impl LexiconToxicityClassifier {
    pub fn new(family: ToxicityModelFamily) -> Self {
        let multilingual: &[Term] = if family == ToxicityModelFamily::Multilingual {
            MULTILINGUAL
        } else {
            &[]
        };

        let mut lexicon = HashMap::new();
        for term in ENGLISH.iter().chain(multilingual) {
            let factor = if term.identity_sensitive && family == ToxicityModelFamily::Unbiased {
                UNBIASED_IDENTITY_FACTOR
            } else {
                1.0
            };
            let weights = term
                .weights
                .iter()
                .map(|(label, weight)| (*label, weight * factor))
                .collect();
            lexicon.insert(term.phrase.to_string(), weights);
        }
        let max_phrase_words = lexicon
            .keys()
            .map(|phrase| phrase.split(' ').count())
            .max()
            .unwrap_or(1);

        Self {
            family,
            lexicon,
            max_phrase_words,
        }
    }

    pub const fn family(&self) -> ToxicityModelFamily {
        self.family
    }

    /// Scores for every label, zero when nothing matched
    pub fn score_text(&self, text: &str) -> LabelScores {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|w| !w.is_empty())
            .collect();

        let mut matched: BTreeSet<&str> = BTreeSet::new();
        for n in 1..=self.max_phrase_words.min(words.len()) {
            for window in words.windows(n) {
                let phrase = window.join(" ");
                if let Some((key, _)) = self.lexicon.get_key_value(&phrase) {
                    matched.insert(key.as_str());
                }
            }
        }

        let mut keep_probability: HashMap<ToxicityLabel, f64> = HashMap::new();
        for phrase in matched {
            for (label, weight) in &self.lexicon[phrase] {
                *keep_probability.entry(*label).or_insert(1.0) *= 1.0 - weight;
            }
        }

        ToxicityLabel::all()
            .iter()
            .map(|label| {
                let score = keep_probability.get(label).map_or(0.0, |keep| 1.0 - keep);
                (*label, round4(score))
            })
            .collect()
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[async_trait]
impl ToxicityClassifierPort for LexiconToxicityClassifier {
    #[instrument(skip(self, texts), fields(inputs = texts.len()))]
    async fn score(&self, texts: &[String]) -> Result<Vec<LabelScores>, ApplicationError> {
        let scores: Vec<LabelScores> = texts.iter().map(|text| self.score_text(text)).collect();
        debug!(inputs = scores.len(), "Toxicity scored");
        Ok(scores)
    }

    fn model_name(&self) -> String {
        format!("lexicon-{}", self.family)
    }
}
