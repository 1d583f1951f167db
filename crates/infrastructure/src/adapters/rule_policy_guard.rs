//! Rule-based policy guard adapter
//!
//! Flags content when it contains a trigger phrase from one of the policy
//! categories and answers in the guard output format (`SAFE` or
//! `UNSAFE: A, B`). Extra rules can be loaded from a TOML file:
//!
//! ```toml
//! [[rule]]
//! category = "FRAUD/PRIVACY"
//! terms = ["phishing kit", "carding"]
//! ```
//!
//! Rules for an existing category extend it.

use std::path::Path;

use aho_corasick::{AhoCorasick, MatchKind};
use application::{
    error::ApplicationError,
    ports::{GuardPrompt, PolicyGuardPort},
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument};

const BUILTIN_RULES: &[(&str, &[&str])] = &[
    (
        "HATE/HARASSMENT",
        &[
            "subhuman",
            "vermin",
            "should be exterminated",
            "go back to your country",
            "kill yourself",
        ],
    ),
    (
        "SEXUAL",
        &["explicit sex", "nude photos", "sexual content involving", "child porn"],
    ),
    (
        "VIOLENCE/WEAPONS",
        &[
            "build a bomb",
            "make a bomb",
            "pipe bomb",
            "untraceable gun",
            "3d printed gun",
            "kill someone",
            "how to kill",
            "mass shooting",
        ],
    ),
    (
        "SELF-HARM",
        &[
            "end my life",
            "kill myself",
            "suicide method",
            "hurt myself",
            "self harm",
            "self-harm",
        ],
    ),
    (
        "CRIME/ILLEGAL",
        &[
            "hotwire a car",
            "break into a house",
            "pick a lock",
            "launder money",
            "money laundering",
            "shoplift",
        ],
    ),
    (
        "DRUGS",
        &[
            "cook meth",
            "make meth",
            "synthesize fentanyl",
            "buy cocaine",
            "grow cannabis illegally",
        ],
    ),
    (
        "FRAUD/PRIVACY",
        &[
            "phishing email",
            "steal credit card",
            "stolen credit card",
            "fake id",
            "dox",
            "doxx",
            "identity theft",
        ],
    ),
];

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default, rename = "rule")]
    rules: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize)]
struct RuleEntry {
    category: String,
    terms: Vec<String>,
}

/// Keyword stand-in for a guard model
pub struct RulePolicyGuard {
    categories: Vec<String>,
    /// Category index for each matcher pattern
    pattern_categories: Vec<usize>,
    matcher: AhoCorasick,
    source: String,
}

impl std::fmt::Debug for RulePolicyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RulePolicyGuard")
            .field("categories", &self.categories)
            .field("terms", &self.pattern_categories.len())
            .field("source", &self.source)
            .finish()
    }
}

impl RulePolicyGuard {
    /// Built-in rules, extended from `rules_path` when given
    ///
    /// A configured path that cannot be read or parsed is an error.
    pub fn load(rules_path: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut rules: Vec<(String, Vec<String>)> = BUILTIN_RULES
            .iter()
            .map(|(category, terms)| {
                (
                    (*category).to_string(),
                    terms.iter().map(ToString::to_string).collect(),
                )
            })
            .collect();

        let source = match rules_path {
            Some(path) => {
                let extra = read_rules_file(path)?;
                info!(path = %path.display(), rules = extra.len(), "Loaded policy rules file");
                for entry in extra {
                    let category = entry.category.trim().to_uppercase();
                    let terms = entry.terms.into_iter().map(|t| t.trim().to_lowercase());
                    match rules.iter_mut().find(|(name, _)| *name == category) {
                        Some((_, existing)) => existing.extend(terms),
                        None => rules.push((category, terms.collect())),
                    }
                }
                format!("builtin+{}", path.display())
            },
            None => "builtin".to_string(),
        };

        Self::from_rules(rules, source)
    }

    fn from_rules(
        rules: Vec<(String, Vec<String>)>,
        source: String,
    ) -> Result<Self, ApplicationError> {
        let mut categories = Vec::with_capacity(rules.len());
        let mut patterns = Vec::new();
        let mut pattern_categories = Vec::new();
        for (index, (category, terms)) in rules.into_iter().enumerate() {
            categories.push(category);
            for term in terms.into_iter().filter(|t| !t.is_empty()) {
                patterns.push(term);
                pattern_categories.push(index);
            }
        }

        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(&patterns)
            .map_err(|e| {
                ApplicationError::Configuration(format!("Failed to build policy rules: {e}"))
            })?;

        Ok(Self {
            categories,
            pattern_categories,
            matcher,
            source,
        })
    }

    /// Categories whose rules match `content`, in rule order
    pub fn matched_categories(&self, content: &str) -> Vec<&str> {
        let mut hit = vec![false; self.categories.len()];
        for m in self.matcher.find_iter(content) {
            let before = content[..m.start()].chars().next_back();
            let after = content[m.end()..].chars().next();
            if before.is_some_and(char::is_alphanumeric) || after.is_some_and(char::is_alphanumeric)
            {
                continue;
            }
            hit[self.pattern_categories[m.pattern().as_usize()]] = true;
        }
        self.categories
            .iter()
            .zip(hit)
            .filter_map(|(category, hit)| hit.then_some(category.as_str()))
            .collect()
    }
}

fn read_rules_file(path: &Path) -> Result<Vec<RuleEntry>, ApplicationError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ApplicationError::Configuration(format!(
            "Cannot read policy rules {}: {e}",
            path.display()
        ))
    })?;
    let file: RulesFile = toml::from_str(&raw).map_err(|e| {
        ApplicationError::Configuration(format!(
            "Invalid policy rules {}: {e}",
            path.display()
        ))
    })?;
    Ok(file.rules)
}

#[async_trait]
impl PolicyGuardPort for RulePolicyGuard {
    /// Rules match the wrapped content only, never the policy text in the prompt
    #[instrument(skip(self, input), fields(content_len = input.content.len()))]
    async fn classify(&self, input: &GuardPrompt) -> Result<String, ApplicationError> {
        let categories = self.matched_categories(&input.content);
        debug!(?categories, "Policy rules evaluated");
        if categories.is_empty() {
            Ok("SAFE".to_string())
        } else {
            Ok(format!("UNSAFE: {}", categories.join(", ")))
        }
    }

    fn model_name(&self) -> String {
        format!("policy-rules ({})", self.source)
    }
}
