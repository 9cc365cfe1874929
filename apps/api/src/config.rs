use anyhow::{Context, Result};

use crate::llm_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Application configuration loaded from environment variables.
/// Fails at startup if the generation backend credentials are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub llm_timeout_secs: u64,
    pub llm_max_retries: u32,
    /// Upper bound on tool-call rounds per agent turn.
    pub agent_max_rounds: usize,
    /// Number of most recent conversation turns fed back to the model.
    pub history_window: usize,
    pub response_language: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: env_or("GEMINI_MODEL", DEFAULT_MODEL),
            gemini_base_url: env_or("GEMINI_BASE_URL", DEFAULT_BASE_URL),
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 120)?,
            llm_max_retries: parse_env("LLM_MAX_RETRIES", 3)?,
            agent_max_rounds: at_least_one("AGENT_MAX_ROUNDS", parse_env("AGENT_MAX_ROUNDS", 5)?)?,
            history_window: parse_env("HISTORY_WINDOW", 20)?,
            response_language: env_or("RESPONSE_LANGUAGE", "English"),
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    let value = std::env::var(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))?;
    if value.trim().is_empty() {
        anyhow::bail!("Required environment variable '{key}' is empty");
    }
    Ok(value)
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

/// Loop bounds must allow at least one iteration.
fn at_least_one(key: &str, value: usize) -> Result<usize> {
    if value == 0 {
        anyhow::bail!("Environment variable '{key}' must be at least 1");
    }
    Ok(value)
}

#[cfg(test)]
impl Config {
    /// Configuration used by unit tests; never reads the environment.
    pub fn for_tests() -> Self {
        Config {
            gemini_api_key: "test-key".to_string(),
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_base_url: DEFAULT_BASE_URL.to_string(),
            llm_timeout_secs: 5,
            llm_max_retries: 1,
            agent_max_rounds: 3,
            history_window: 20,
            response_language: "English".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
