//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete detection backends.

mod gazetteer_ner;
mod lexicon_toxicity;
mod regex_pattern_recognizer;
mod rule_policy_guard;
mod word_list_profanity;

pub use gazetteer_ner::{GazetteerConfig, GazetteerNerAdapter};
pub use lexicon_toxicity::LexiconToxicityClassifier;
pub use regex_pattern_recognizer::RegexPatternRecognizer;
pub use rule_policy_guard::RulePolicyGuard;
pub use word_list_profanity::WordListProfanityFilter;
