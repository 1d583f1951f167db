//! Security configuration: API keys.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Security configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Accepted API keys. An empty list disables the key gate.
    ///
    /// Usually supplied through `<SERVICE>_API_KEYS` as a comma separated
    /// list; never serialized.
    #[serde(default, skip_serializing)]
    pub api_keys: Vec<SecretString>,

    /// Keys shorter than this are reported at startup
    #[serde(default = "default_min_key_length")]
    pub min_key_length: usize,
}

const fn default_min_key_length() -> usize {
    16
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            min_key_length: default_min_key_length(),
        }
    }
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("api_keys", &format!("[{} redacted]", self.api_keys.len()))
            .field("min_key_length", &self.min_key_length)
            .finish()
    }
}

impl SecurityConfig {
    /// Check if the configuration has any API keys configured
    #[must_use]
    pub fn has_api_keys(&self) -> bool {
        !self.api_keys.is_empty()
    }

    /// Number of keys shorter than `min_key_length` characters
    #[must_use]
    pub fn count_short_keys(&self) -> usize {
        self.api_keys
            .iter()
            .filter(|key| key.expose_secret().chars().count() < self.min_key_length)
            .count()
    }

    /// Split a comma separated key list, dropping blanks
    #[must_use]
    pub fn parse_key_list(raw: &str) -> Vec<SecretString> {
        raw.split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| SecretString::from(key.to_owned()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_list_is_trimmed_and_blanks_dropped() {
        let keys = SecurityConfig::parse_key_list(" alpha , ,beta,,");
        let exposed: Vec<&str> = keys.iter().map(ExposeSecret::expose_secret).collect();
        assert_eq!(exposed, ["alpha", "beta"]);
        assert!(SecurityConfig::parse_key_list("  ").is_empty());
    }

    #[test]
    fn short_keys_are_counted() {
        let config = SecurityConfig {
            api_keys: SecurityConfig::parse_key_list("short,0123456789abcdef"),
            ..SecurityConfig::default()
        };
        assert!(config.has_api_keys());
        assert_eq!(config.count_short_keys(), 1);
    }

    #[test]
    fn debug_hides_key_material() {
        let config = SecurityConfig {
            api_keys: SecurityConfig::parse_key_list("very-secret-key"),
            ..SecurityConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("very-secret-key"));
        assert!(rendered.contains("[1 redacted]"));
    }
}
