//! Word-list profanity filter adapter
//!
//! Matches a built-in list plus configured extra words as whole words,
//! ignoring ASCII case.

use aho_corasick::{AhoCorasick, MatchKind};
use application::{
    error::ApplicationError,
    ports::{ProfanityFilterPort, ProfanityHit},
};

const BUILTIN_WORDS: &[&str] = &[
    "arse",
    "arsehole",
    "ass",
    "asshole",
    "bastard",
    "bitch",
    "bitches",
    "bollocks",
    "bullshit",
    "crap",
    "cunt",
    "damn",
    "dick",
    "dickhead",
    "douche",
    "fuck",
    "fucked",
    "fucker",
    "fucking",
    "goddamn",
    "hell",
    "jackass",
    "motherfucker",
    "piss",
    "pissed",
    "prick",
    "shit",
    "shitty",
    "slut",
    "twat",
    "wanker",
    "whore",
];

/// Profanity filter over a fixed word list
pub struct WordListProfanityFilter {
    words: Vec<String>,
    matcher: AhoCorasick,
}

impl std::fmt::Debug for WordListProfanityFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordListProfanityFilter")
            .field("words", &self.words.len())
            .finish()
    }
}

impl WordListProfanityFilter {
    /// Build the filter from the built-in list and `extra_words`
    ///
    /// Extra words are trimmed and lowercased; blanks and duplicates are
    /// dropped.
    pub fn new(extra_words: &[String]) -> Result<Self, ApplicationError> {
        let mut words: Vec<String> = BUILTIN_WORDS.iter().map(ToString::to_string).collect();
        words.extend(
            extra_words
                .iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty()),
        );
        words.sort();
        words.dedup();

        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(&words)
            .map_err(|e| {
                ApplicationError::Configuration(format!("Failed to build profanity list: {e}"))
            })?;

        tracing::debug!(words = words.len(), "Profanity list loaded");
        Ok(Self { words, matcher })
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl ProfanityFilterPort for WordListProfanityFilter {
    fn find_profanity(&self, text: &str) -> Vec<ProfanityHit> {
        self.matcher
            .find_iter(text)
            .filter(|m| {
                let before = text[..m.start()].chars().next_back();
                let after = text[m.end()..].chars().next();
                !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
            })
            .map(|m| ProfanityHit {
                token: text[m.start()..m.end()].to_string(),
                start: m.start(),
                end: m.end(),
            })
            .collect()
    }

    fn word_count(&self) -> usize {
        self.words.len()
    }
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn hits_are_whole_words_on_char_boundaries(text in "\\PC{0,80}") {
            let filter = WordListProfanityFilter::new(&[]).unwrap();
            for hit in filter.find_profanity(&text) {
                prop_assert!(text.is_char_boundary(hit.start));
                prop_assert!(text.is_char_boundary(hit.end));
                prop_assert_eq!(&text[hit.start..hit.end], hit.token.as_str());
                prop_assert!(!text[..hit.start].chars().next_back().is_some_and(is_word_char));
                prop_assert!(!text[hit.end..].chars().next().is_some_and(is_word_char));
            }
        }
    }
}
