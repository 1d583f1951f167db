//! Profanity filter port

#[cfg(test)]
use mockall::automock;

/// A profane token found in text, in byte offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfanityHit {
    pub token: String,
    pub start: usize,
    pub end: usize,
}

/// Port for word-list profanity detection
#[cfg_attr(test, automock)]
pub trait ProfanityFilterPort: Send + Sync {
    /// Find all profane tokens, ordered by position and non-overlapping
    fn find_profanity(&self, text: &str) -> Vec<ProfanityHit>;

    /// Number of words in the active list
    fn word_count(&self) -> usize;
}
