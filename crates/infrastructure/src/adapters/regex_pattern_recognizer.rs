//! Regex pattern recognizer adapter
//!
//! Finds structured identifiers with regular expressions. Candidates for
//! card numbers, IBANs, IP addresses and SSNs must also pass a checksum or
//! structural check. A context word (e.g. "ssn", "passport") within a few
//! words of a match raises its score, which lets weak patterns such as bare
//! nine digit numbers clear the default threshold only when the surrounding
//! text supports them.

use std::net::IpAddr;

use application::{error::ApplicationError, ports::PatternRecognizerPort};
use async_trait::async_trait;
use domain::{DetectedSpan, EntitySource};
use regex::Regex;
use tracing::{debug, instrument};

/// Score added when a context word is found near a match
const CONTEXT_BOOST: f64 = 0.35;
/// Floor for boosted scores
const CONTEXT_MIN_SCORE: f64 = 0.4;
/// Words inspected on each side of a match
const CONTEXT_WINDOW_WORDS: usize = 5;

const SUPPORTED_LANGUAGES: &[&str] = &["en"];

/// Structural check applied to a raw match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    None,
    Luhn,
    IpAddress,
    Iban,
    UsSsn,
}

struct PatternDef {
    entity: &'static str,
    name: &'static str,
    pattern: &'static str,
    score: f64,
    check: Check,
}

static PATTERNS: &[PatternDef] = &[
    PatternDef {
        entity: "EMAIL_ADDRESS",
        name: "email",
        pattern: r"\b[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}\b",
        score: 1.0,
        check: Check::None,
    },
    PatternDef {
        entity: "PHONE_NUMBER",
        name: "phone",
        pattern: r"(?:\+[0-9]{1,3}[\s.\-]?)?(?:\([0-9]{3}\)|\b[0-9]{3})[\s.\-]?[0-9]{3}[\s.\-]?[0-9]{4}\b",
        score: 0.4,
        check: Check::None,
    },
    PatternDef {
        entity: "CREDIT_CARD",
        name: "credit_card",
        pattern: r"\b(?:[0-9][ \-]?){12,18}[0-9]\b",
        score: 1.0,
        check: Check::Luhn,
    },
    PatternDef {
        entity: "US_SSN",
        name: "ssn_delimited",
        pattern: r"\b[0-9]{3}[\- .][0-9]{2}[\- .][0-9]{4}\b",
        score: 0.5,
        check: Check::UsSsn,
    },
    PatternDef {
        entity: "US_SSN",
        name: "ssn_bare",
        pattern: r"\b[0-9]{9}\b",
        score: 0.05,
        check: Check::UsSsn,
    },
    PatternDef {
        entity: "US_PASSPORT",
        name: "passport_numeric",
        pattern: r"\b[0-9]{9}\b",
        score: 0.05,
        check: Check::None,
    },
    PatternDef {
        entity: "US_PASSPORT",
        name: "passport_next_gen",
        pattern: r"\b[A-Z][0-9]{8}\b",
        score: 0.1,
        check: Check::None,
    },
    PatternDef {
        entity: "IP_ADDRESS",
        name: "ipv4",
        pattern: r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b",
        score: 0.6,
        check: Check::IpAddress,
    },
    PatternDef {
        entity: "IP_ADDRESS",
        name: "ipv6",
        pattern: r"(?i)[0-9a-f]{0,4}(?::[0-9a-f]{0,4}){2,7}",
        score: 0.6,
        check: Check::IpAddress,
    },
    PatternDef {
        entity: "IBAN_CODE",
        name: "iban",
        pattern: r"\b[A-Z]{2}[0-9]{2}(?: ?[A-Z0-9]{4}){2,7}(?: ?[A-Z0-9]{1,3})?\b",
        score: 1.0,
        check: Check::Iban,
    },
    PatternDef {
        entity: "IN_AADHAAR",
        name: "aadhaar",
        pattern: r"\b[0-9]{4}\s?[0-9]{4}\s?[0-9]{4}\b",
        score: 0.5,
        check: Check::None,
    },
    PatternDef {
        entity: "IN_PAN",
        name: "pan",
        pattern: r"\b[A-Z]{5}[0-9]{4}[A-Z]\b",
        score: 0.6,
        check: Check::None,
    },
    PatternDef {
        entity: "IN_PASSPORT",
        name: "in_passport",
        pattern: r"\b[A-PR-WY][1-9][0-9]{6}\b",
        score: 0.5,
        check: Check::None,
    },
];

fn context_words(entity: &str) -> &'static [&'static str] {
    match entity {
        "EMAIL_ADDRESS" => &["email", "mail", "e-mail"],
        "PHONE_NUMBER" => &[
            "phone", "number", "telephone", "tel", "cell", "cellphone", "mobile", "call", "fax",
        ],
        "CREDIT_CARD" => &["credit", "card", "visa", "mastercard", "amex", "debit", "cc"],
        "US_SSN" => &["social", "security", "ssn", "ssns", "ssid"],
        "US_PASSPORT" | "IN_PASSPORT" => &["passport", "travel", "document"],
        "IP_ADDRESS" => &["ip", "ipv4", "ipv6", "address"],
        "IBAN_CODE" => &["iban", "bank", "account", "transfer"],
        "IN_AADHAAR" => &["aadhaar", "uidai", "uid"],
        "IN_PAN" => &["pan", "permanent", "income", "tax"],
        _ => &[],
    }
}

struct CompiledPattern {
    def: &'static PatternDef,
    regex: Regex,
}

/// Pattern recognizer backed by compiled regular expressions
pub struct RegexPatternRecognizer {
    patterns: Vec<CompiledPattern>,
    language_model: String,
}

impl std::fmt::Debug for RegexPatternRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegexPatternRecognizer")
            .field("patterns", &self.patterns.len())
            .field("language_model", &self.language_model)
            .finish()
    }
}

impl RegexPatternRecognizer {
    /// Compile the built-in patterns
    ///
    /// `language_model` is the configured linguistic model name and is only
    /// used for reporting.
    pub fn new(language_model: impl Into<String>) -> Result<Self, ApplicationError> {
        let patterns = PATTERNS
            .iter()
            .map(|def| {
                Regex::new(def.pattern)
                    .map(|regex| CompiledPattern { def, regex })
                    .map_err(|e| {
                        ApplicationError::Configuration(format!(
                            "Invalid pattern '{}': {e}",
                            def.name
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            patterns,
            language_model: language_model.into(),
        })
    }

    /// Configured linguistic model name
    pub fn language_model(&self) -> &str {
        &self.language_model
    }

    /// Synchronous core of [`PatternRecognizerPort::analyze`]
    pub fn find(&self, text: &str, entities: &[String]) -> Vec<DetectedSpan> {
        let mut spans = Vec::new();
        for compiled in &self.patterns {
            let def = compiled.def;
            if !entities.iter().any(|e| e == def.entity) {
                continue;
            }
            for m in compiled.regex.find_iter(text) {
                let Some((end, score)) = evaluate(def, text, m.start(), m.end()) else {
                    continue;
                };
                let score = if has_context(text, m.start(), end, context_words(def.entity)) {
                    (score + CONTEXT_BOOST).clamp(CONTEXT_MIN_SCORE, 1.0)
                } else {
                    score
                };
                spans.push(DetectedSpan::new(
                    def.entity,
                    m.start(),
                    end,
                    score,
                    EntitySource::Pattern,
                ));
            }
        }
        dedup_same_type(spans)
    }
}

#[async_trait]
impl PatternRecognizerPort for RegexPatternRecognizer {
    #[instrument(skip(self, text, entities), fields(text_len = text.len()))]
    async fn analyze(
        &self,
        text: &str,
        language: &str,
        entities: &[String],
    ) -> Result<Vec<DetectedSpan>, ApplicationError> {
        if !SUPPORTED_LANGUAGES.contains(&language) {
            return Err(ApplicationError::InvalidOperation(format!(
                "Unsupported language: {language}"
            )));
        }
        let spans = self.find(text, entities);
        debug!(count = spans.len(), "Pattern candidates found");
        Ok(spans)
    }

    fn supported_languages(&self) -> Vec<String> {
        SUPPORTED_LANGUAGES.iter().map(ToString::to_string).collect()
    }

    fn supported_entities(&self) -> Vec<String> {
        let mut entities: Vec<String> = Vec::new();
        for def in PATTERNS {
            if !entities.iter().any(|e| e == def.entity) {
                entities.push(def.entity.to_string());
            }
        }
        entities
    }
}

/// Apply the pattern's check to `text[start..end]`. Returns the accepted end
/// offset and base score, or `None` when the candidate is rejected.
fn evaluate(def: &PatternDef, text: &str, start: usize, end: usize) -> Option<(usize, f64)> {
    let candidate = &text[start..end];
    match def.check {
        Check::None => Some((end, def.score)),
        Check::Luhn => luhn_valid(candidate).then_some((end, def.score)),
        Check::UsSsn => ssn_plausible(candidate).then_some((end, def.score)),
        Check::IpAddress => {
            let preceded_by_address_char = text[..start]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_ascii_hexdigit() || c == ':' || c == '.');
            let trimmed = candidate.trim_end_matches(':');
            (!preceded_by_address_char && trimmed.parse::<IpAddr>().is_ok())
                .then_some((start + trimmed.len(), def.score))
        },
        Check::Iban => iban_prefix_len(candidate).map(|len| (start + len, def.score)),
    }
}

fn digits_of(candidate: &str) -> Vec<u32> {
    candidate.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn luhn_valid(candidate: &str) -> bool {
    let digits = digits_of(candidate);
    if !(13..=19).contains(&digits.len()) {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Area, group and serial rules for US social security numbers, plus
/// consistent delimiters
fn ssn_plausible(candidate: &str) -> bool {
    let delimiters: Vec<char> = candidate.chars().filter(|c| !c.is_ascii_digit()).collect();
    if delimiters.len() == 2 && delimiters[0] != delimiters[1] {
        return false;
    }
    let digits: String = candidate.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 9 {
        return false;
    }
    let (area, rest) = digits.split_at(3);
    let (group, serial) = rest.split_at(2);
    let all_same = digits.chars().all(|c| Some(c) == digits.chars().next());
    !(area == "000" || area == "666" || area.starts_with('9') || group == "00" || serial == "0000" || all_same)
}

/// Length of the longest prefix of `candidate` that is a valid IBAN. Trailing
/// space separated groups are dropped one at a time, since the pattern can
/// swallow an uppercase word that follows the number.
fn iban_prefix_len(candidate: &str) -> Option<usize> {
    let mut current = candidate;
    loop {
        if iban_valid(current) {
            return Some(current.len());
        }
        let cut = current.rfind(' ')?;
        current = &current[..cut];
    }
}

fn iban_valid(candidate: &str) -> bool {
    let compact: String = candidate.chars().filter(|c| !c.is_whitespace()).collect();
    if !(15..=34).contains(&compact.len()) {
        return false;
    }
    let (head, tail) = compact.split_at(4);
    let mut remainder: u32 = 0;
    for c in tail.chars().chain(head.chars()) {
        let Some(value) = c.to_digit(36) else {
            return false;
        };
        remainder = if value >= 10 {
            (remainder * 100 + value) % 97
        } else {
            (remainder * 10 + value) % 97
        };
    }
    remainder == 1
}

fn has_context(text: &str, start: usize, end: usize, words: &[&str]) -> bool {
    if words.is_empty() {
        return false;
    }
    let before = text[..start].split_whitespace().rev().take(CONTEXT_WINDOW_WORDS);
    let after = text[end..].split_whitespace().take(CONTEXT_WINDOW_WORDS);
    before.chain(after).any(|token| {
        let token = token
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        words.contains(&token.as_str())
    })
}

/// Keep one span per (type, start, end), preferring the higher score
fn dedup_same_type(mut spans: Vec<DetectedSpan>) -> Vec<DetectedSpan> {
    spans.sort_by(|a, b| {
        (a.start, a.end, &a.entity_type)
            .cmp(&(b.start, b.end, &b.entity_type))
            .then(b.score.total_cmp(&a.score))
    });
    spans.dedup_by(|later, earlier| {
        later.start == earlier.start
            && later.end == earlier.end
            && later.entity_type == earlier.entity_type
    });
    spans
}
