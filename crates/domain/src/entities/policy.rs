//! Policy moderation entities

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Category reported when the guard flags text without naming a category
pub const UNSPECIFIED_CATEGORY: &str = "UNSPECIFIED";

/// Replacement text for the `filter` action
pub const FILTERED_TEXT: &str = "[REQUEST REDACTED DUE TO SAFETY POLICY]";

/// Replacement text for the `reask` action
pub const REASK_TEXT: &str = "I can\u{2019}t help with that. Could you rephrase your request safely?";

/// What happens to text the guard classifies as unsafe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum PolicyAction {
    /// Withhold the text entirely
    #[default]
    Refrain,
    /// Replace the text with a fixed redaction notice
    Filter,
    /// Replace the text with a request to rephrase
    Reask,
}

impl PolicyAction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Refrain => "refrain",
            Self::Filter => "filter",
            Self::Reask => "reask",
        }
    }

    /// Replacement text and reason for unsafe content
    #[must_use]
    pub const fn apply(&self) -> (&'static str, &'static str) {
        match self {
            Self::Refrain => ("", "Blocked"),
            Self::Filter => (FILTERED_TEXT, "Filtered"),
            Self::Reask => (REASK_TEXT, "Re-asked"),
        }
    }
}

impl std::fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "refrain" => Ok(Self::Refrain),
            "filter" => Ok(Self::Filter),
            "reask" => Ok(Self::Reask),
            _ => Err(DomainError::invalid_option("policy action", s)),
        }
    }
}

impl TryFrom<String> for PolicyAction {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Verdict extracted from a guard model's raw output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    Safe,
    Unsafe { categories: Vec<String> },
}

impl GuardVerdict {
    /// Parse the first non-empty line of guard output.
    ///
    /// `SAFE...` is safe; `UNSAFE[:] a, b; c` lists categories. Anything else,
    /// including empty output, is treated as unsafe with an unspecified category.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        const UNSAFE: &str = "UNSAFE";

        let line = raw.trim().lines().next().unwrap_or_default().trim();

        if line
            .get(..4)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("SAFE"))
        {
            return Self::Safe;
        }

        let rest = line
            .get(..UNSAFE.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(UNSAFE))
            .and_then(|_| line.get(UNSAFE.len()..));

        let categories = if let Some(rest) = rest {
            rest.trim_start()
                .trim_start_matches(':')
                .split([';', ','])
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(ToString::to_string)
                .collect()
        } else {
            Vec::new()
        };

        Self::Unsafe {
            categories: if categories.is_empty() {
                vec![UNSPECIFIED_CATEGORY.to_string()]
            } else {
                categories
            },
        }
    }

    #[must_use]
    pub const fn is_unsafe(&self) -> bool {
        matches!(self, Self::Unsafe { .. })
    }

    #[must_use]
    pub fn categories(&self) -> &[String] {
        match self {
            Self::Safe => &[],
            Self::Unsafe { categories } => categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_safe() {
        assert_eq!(GuardVerdict::parse("SAFE"), GuardVerdict::Safe);
        assert_eq!(GuardVerdict::parse("  safe\nextra"), GuardVerdict::Safe);
    }

    #[test]
    fn parses_unsafe_categories() {
        let verdict = GuardVerdict::parse("UNSAFE: VIOLENCE, HATE; DRUGS\nignored");
        assert_eq!(verdict.categories(), ["VIOLENCE", "HATE", "DRUGS"]);
    }

    #[test]
    fn parses_unsafe_without_colon() {
        let verdict = GuardVerdict::parse("unsafe self-harm");
        assert_eq!(verdict.categories(), ["self-harm"]);
    }

    #[test]
    fn unsafe_without_categories_is_unspecified() {
        let verdict = GuardVerdict::parse("UNSAFE:");
        assert_eq!(verdict.categories(), [UNSPECIFIED_CATEGORY]);
    }

    #[test]
    fn unrecognised_output_is_conservatively_unsafe() {
        assert!(GuardVerdict::parse("I am not sure").is_unsafe());
        assert!(GuardVerdict::parse("").is_unsafe());
    }

    #[test]
    fn actions_map_to_replacements() {
        assert_eq!(PolicyAction::Refrain.apply(), ("", "Blocked"));
        assert_eq!(PolicyAction::Filter.apply().1, "Filtered");
        assert_eq!(PolicyAction::Reask.apply().0, REASK_TEXT);
        assert_eq!("FILTER".parse::<PolicyAction>().unwrap(), PolicyAction::Filter);
        assert!("block".parse::<PolicyAction>().is_err());
    }
}
