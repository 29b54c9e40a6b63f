use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::{LlmSettings, DEFAULT_MODEL};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub anthropic_api_key: String,
    pub llm: LlmSettings,
    /// Without a key, video search returns no results.
    pub youtube_api_key: Option<String>,
    pub use_mock_videos: bool,
    pub port: u16,
    pub rust_log: String,
    /// How long the referral confirmation shows before navigating home.
    pub redirect_delay: Duration,
    pub session_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            llm: LlmSettings {
                model: optional_env("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout: Duration::from_secs(parse_number("LLM_TIMEOUT_SECS", 120)?),
            },
            youtube_api_key: optional_env("YOUTUBE_API_KEY"),
            use_mock_videos: optional_env("USE_MOCK_VIDEOS")
                .map(|v| parse_flag(&v))
                .transpose()
                .context("USE_MOCK_VIDEOS must be true or false")?
                .unwrap_or(false),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            redirect_delay: Duration::from_millis(
                parse_number(
                    "REDIRECT_DELAY_MS",
                    crate::redirect::DEFAULT_REDIRECT_DELAY.as_millis() as u64,
                )?,
            ),
            session_ttl: Duration::from_secs(parse_number("SESSION_TTL_SECS", 86_400)?),
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/pathway_test".to_string(),
            redis_url: "redis://localhost".to_string(),
            anthropic_api_key: "test-key".to_string(),
            llm: LlmSettings::default(),
            youtube_api_key: None,
            use_mock_videos: true,
            port: 0,
            rust_log: "debug".to_string(),
            redirect_delay: crate::redirect::DEFAULT_REDIRECT_DELAY,
            session_ttl: Duration::from_secs(3600),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are the same thing.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("'{other}' is not a boolean"),
    }
}

fn parse_number(key: &str, default: u64) -> Result<u64> {
    match optional_env(key) {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a non-negative integer")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(parse_flag("1").unwrap());
        assert!(!parse_flag("off").unwrap());
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn test_parse_number_defaults_when_unset() {
        assert_eq!(
            parse_number("PATHWAY_TEST_SURELY_UNSET_VARIABLE", 1500).unwrap(),
            1500
        );
    }
}
