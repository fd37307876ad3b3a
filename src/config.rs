//! Runtime settings
//!
//! Built once in `main` from the environment (after `.env` is loaded) and
//! passed down explicitly.

use crate::error::OrchestrationError;
use crate::Result;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 300;
const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub llm: LlmSettings,
    /// `None` disables the per-stage timeout
    pub stage_timeout: Option<Duration>,
    pub enable_audit_log: bool,
    pub port: u16,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            stage_timeout: Some(Duration::from_secs(DEFAULT_STAGE_TIMEOUT_SECS)),
            enable_audit_log: true,
            port: DEFAULT_PORT,
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let llm = LlmSettings {
            api_key: get("GROQ_API_KEY"),
            base_url: get("GROQ_BASE_URL").unwrap_or(defaults.llm.base_url),
            model: get("LLM_MODEL").unwrap_or(defaults.llm.model),
            temperature: parse_or("LLM_TEMPERATURE", get("LLM_TEMPERATURE"), 0.0)?,
        };

        let timeout_secs: u64 = parse_or(
            "STAGE_TIMEOUT_SECS",
            get("STAGE_TIMEOUT_SECS"),
            DEFAULT_STAGE_TIMEOUT_SECS,
        )?;

        let enable_audit_log = match get("ENABLE_AUDIT_LOG") {
            Some(v) => parse_bool("ENABLE_AUDIT_LOG", &v)?,
            None => defaults.enable_audit_log,
        };

        let port = parse_or(
            "PORT",
            get("PORT").or_else(|| get("API_PORT")),
            DEFAULT_PORT,
        )?;

        let log_filter = get("RUST_LOG")
            .or_else(|| get("LOG_LEVEL").map(|level| level.to_lowercase()))
            .unwrap_or(defaults.log_filter);

        Ok(Self {
            llm,
            stage_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            enable_audit_log,
            port,
            log_filter,
        })
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        Some(raw) => raw.trim().parse().map_err(|_| {
            OrchestrationError::ConfigError(format!("{} has invalid value '{}'", key, raw))
        }),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(OrchestrationError::ConfigError(format!(
            "{} has invalid value '{}'",
            key, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.stage_timeout, Some(Duration::from_secs(300)));
        assert!(settings.llm.api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let settings = settings_from(&[
            ("GROQ_API_KEY", "gsk_test"),
            ("LLM_MODEL", "mixtral-8x7b-32768"),
            ("LLM_TEMPERATURE", "0.2"),
            ("STAGE_TIMEOUT_SECS", "0"),
            ("ENABLE_AUDIT_LOG", "false"),
            ("API_PORT", "9100"),
            ("LOG_LEVEL", "DEBUG"),
        ])
        .unwrap();

        assert_eq!(settings.llm.api_key.as_deref(), Some("gsk_test"));
        assert_eq!(settings.llm.model, "mixtral-8x7b-32768");
        assert!(settings.stage_timeout.is_none());
        assert!(!settings.enable_audit_log);
        assert_eq!(settings.port, 9100);
        assert_eq!(settings.log_filter, "debug");
    }

    #[test]
    fn test_invalid_values() {
        let err = settings_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, OrchestrationError::ConfigError(_)));

        let err = settings_from(&[("ENABLE_AUDIT_LOG", "maybe")]).unwrap_err();
        assert!(matches!(err, OrchestrationError::ConfigError(_)));
    }
}
