//! Flat environment variable names read by earlier deployments
//!
//! Each variable overrides the matching structured setting when it is set to
//! a non-blank value. Only the variables of the running service are read.

use std::{collections::HashMap, path::PathBuf, str::FromStr};

use domain::DomainError;

use super::{AppConfig, ConfigLoadError, SecurityConfig, ServiceKind, ToxicityModelFamily};

pub(super) fn apply<F>(
    config: &mut AppConfig,
    service: ServiceKind,
    lookup: &F,
) -> Result<(), ConfigLoadError>
where
    F: Fn(&str) -> Option<String>,
{
    let env = LegacyEnv { lookup };

    if let Some(raw) = env.get(service.api_keys_var()) {
        config.security.api_keys = SecurityConfig::parse_key_list(&raw);
    }
    if let Some(origins) = env.list("CORS_ALLOWED_ORIGINS") {
        config.server.allowed_origins = origins;
    }
    if let Some(host) = env.get("HOST") {
        config.server.host = host;
    }
    if let Some(port) = env.parsed::<u16>("PORT")? {
        config.server.port = port;
    }

    match service {
        ServiceKind::Pii => apply_pii(config, &env),
        ServiceKind::Toxicity => apply_toxicity(config, &env),
        ServiceKind::Policy => apply_policy(config, &env),
    }
}

fn apply_pii<F>(config: &mut AppConfig, env: &LegacyEnv<'_, F>) -> Result<(), ConfigLoadError>
where
    F: Fn(&str) -> Option<String>,
{
    let pii = &mut config.pii;
    if let Some(language) = env.get("PRESIDIO_LANGUAGE") {
        pii.language = language;
    }
    if let Some(model) = env.get("SPACY_MODEL") {
        pii.language_model = model;
    }
    if let Some(dir) = env.get("GLINER_LOCAL_DIR") {
        pii.semantic_model_dir = Some(PathBuf::from(dir));
    }
    if let Some(model) = env.get("GLINER_MODEL") {
        pii.semantic_model = model;
    }
    if let Some(threshold) = env.parsed::<f64>("GLINER_THRESHOLD")? {
        pii.semantic_threshold = threshold;
    }
    if let Some(labels) = env.list("GLINER_LABELS") {
        pii.semantic_labels = labels;
    }
    if let Some(offline) = env.get("HF_HUB_OFFLINE") {
        pii.offline = matches!(offline.to_lowercase().as_str(), "1" | "true" | "yes");
    }
    if let Some(entities) = env.list("ENTITIES") {
        pii.entities = entities;
    }
    if let Some(thresholds) = env.json::<HashMap<String, f64>>("ENTITY_THRESHOLDS")? {
        pii.entity_thresholds = thresholds;
    }
    if let Some(placeholders) = env.json::<HashMap<String, String>>("PLACEHOLDERS")? {
        pii.placeholders = placeholders;
    }
    Ok(())
}

fn apply_toxicity<F>(config: &mut AppConfig, env: &LegacyEnv<'_, F>) -> Result<(), ConfigLoadError>
where
    F: Fn(&str) -> Option<String>,
{
    let tox = &mut config.toxicity;
    if let Some(model) = env.get("DETOXIFY_MODEL") {
        tox.model = ToxicityModelFamily::from(model);
    }
    if let Some(threshold) = env.parsed::<f64>("DETOXIFY_THRESHOLD")? {
        tox.threshold = threshold;
    }
    if let Some(labels) = env.list("DETOXIFY_LABELS") {
        tox.labels = labels
            .iter()
            .map(|label| label.parse())
            .collect::<Result<_, DomainError>>()
            .map_err(|e| ConfigLoadError::invalid_env("DETOXIFY_LABELS", e))?;
    }
    if let Some(mode) = env.option("TOX_MODE")? {
        tox.mode = mode;
    }
    if let Some(action) = env.option("ACTION_ON_FAIL")? {
        tox.action = action;
    }
    if let Some(enabled) = env.get("PROFANITY_ENABLED") {
        tox.profanity_enabled = matches!(enabled.as_str(), "1" | "true" | "True");
    }
    if let Some(action) = env.option("PROFANITY_ACTION")? {
        tox.profanity_action = action;
    }
    if let Some(words) = env.list("PROFANITY_EXTRA_WORDS") {
        tox.profanity_extra_words = words.into_iter().map(|w| w.to_lowercase()).collect();
    }
    Ok(())
}

fn apply_policy<F>(config: &mut AppConfig, env: &LegacyEnv<'_, F>) -> Result<(), ConfigLoadError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(action) = env.option("POLICY_ACTION_ON_FAIL")? {
        config.policy.action = action;
    }
    if let Some(path) = env.get("POLICY_RULES_PATH") {
        config.policy.rules_path = Some(PathBuf::from(path));
    }
    Ok(())
}

struct LegacyEnv<'a, F> {
    lookup: &'a F,
}

impl<F> LegacyEnv<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed value, `None` when unset or blank
    fn get(&self, var: &str) -> Option<String> {
        (self.lookup)(var)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn list(&self, var: &str) -> Option<Vec<String>> {
        self.get(var).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    fn parsed<T>(&self, var: &str) -> Result<Option<T>, ConfigLoadError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(var)
            .map(|raw| raw.parse().map_err(|e| ConfigLoadError::invalid_env(var, e)))
            .transpose()
    }

    /// Option enums reject unknown values with the domain's message
    fn option<T>(&self, var: &str) -> Result<Option<T>, ConfigLoadError>
    where
        T: FromStr<Err = DomainError>,
    {
        self.parsed(var)
    }

    fn json<T>(&self, var: &str) -> Result<Option<T>, ConfigLoadError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.get(var)
            .map(|raw| {
                serde_json::from_str(&raw)
                    .map_err(|e| ConfigLoadError::invalid_env(var, format!("expected a JSON object: {e}")))
            })
            .transpose()
    }
}
