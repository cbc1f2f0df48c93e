//! ============================================================================
//! Configuration - Explicit startup configuration for all clients
//! ============================================================================
//! Built once from the environment (after `.env` loading by the binary) and
//! handed to each client. Parsing goes through a lookup function so tests can
//! supply values without touching the process environment.
//! ============================================================================

use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::completion::{ModelConfig, RetryPolicy};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_MODEL: &str = "mixtral-8x7b-32768";
pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_RELAY_MODEL: &str = "microsoft/mai-ds-r1:free";
pub const DEFAULT_RELAY_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_TABLE: &str = "jolie_bot_memory";
pub const DEFAULT_MAX_TOKENS: u32 = 300;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Store credentials missing: set SUPABASE_API_TOKEN and SUPABASE_PROJECT_ID (or SUPABASE_URL)")]
    MissingStoreCredentials,

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },

    #[error("Unknown backend variant: {0} (expected 'primary' or 'relay')")]
    UnknownVariant(String),
}

/// Which behavior profile the server runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendVariant {
    /// Full pipeline with profile memory
    Primary,
    /// Persona-only passthrough to the provider
    Relay,
}

impl FromStr for BackendVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "primary" => Ok(BackendVariant::Primary),
            "relay" | "openrouter" => Ok(BackendVariant::Relay),
            _ => Err(ConfigError::UnknownVariant(s.to_string())),
        }
    }
}

/// Remote memory store location and credentials
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Collection URL, e.g. https://<project>.supabase.co/rest/v1/<table>
    pub rest_url: String,
    pub api_token: String,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_token = get("SUPABASE_API_TOKEN")
            .or_else(|| get("SUPABASE_KEY"))
            .ok_or(ConfigError::MissingStoreCredentials)?;
        let table = get("SUPABASE_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string());

        let rest_url = if let Some(project_id) = get("SUPABASE_PROJECT_ID") {
            format!("https://{}.supabase.co/rest/v1/{}", project_id, table)
        } else if let Some(base) = get("SUPABASE_URL") {
            format!("{}/rest/v1/{}", base.trim_end_matches('/'), table)
        } else {
            return Err(ConfigError::MissingStoreCredentials);
        };

        Ok(Self { rest_url, api_token })
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct JolieConfig {
    pub variant: BackendVariant,
    pub bind_addr: String,
    pub model: ModelConfig,
    pub retry: RetryPolicy,
    /// Always present for the primary variant
    pub store: Option<StoreConfig>,
}

impl JolieConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let variant = get("JOLIE_VARIANT")
            .map(|v| v.parse::<BackendVariant>())
            .transpose()?
            .unwrap_or(BackendVariant::Primary);

        let (default_model, default_base) = match variant {
            BackendVariant::Primary => (DEFAULT_MODEL, DEFAULT_API_BASE),
            BackendVariant::Relay => (DEFAULT_RELAY_MODEL, DEFAULT_RELAY_API_BASE),
        };

        let mut api_key = get("LLM_API_KEY");
        let mut model = get("LLM_MODEL");
        if variant == BackendVariant::Relay {
            api_key = api_key.or_else(|| get("OPENROUTER_API_KEY"));
            model = model.or_else(|| get("MODEL"));
        }
        let api_key = api_key.unwrap_or_else(|| {
            warn!("No completion API key configured (LLM_API_KEY)");
            String::new()
        });

        let model = ModelConfig {
            api_key,
            model: model.unwrap_or_else(|| default_model.to_string()),
            api_base: get("LLM_API_BASE")
                .unwrap_or_else(|| default_base.to_string())
                .trim_end_matches('/')
                .to_string(),
            max_tokens: parse_or(&get, "LLM_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            exclude_reasoning: variant == BackendVariant::Relay,
        };

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            attempts: parse_or(&get, "LLM_RETRIES", defaults.attempts)?.max(1),
            delay: Duration::from_secs(parse_or(
                &get,
                "LLM_RETRY_DELAY_SECS",
                defaults.delay.as_secs(),
            )?),
            request_timeout: Duration::from_secs(parse_or(
                &get,
                "LLM_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
        };

        let store = match variant {
            BackendVariant::Primary => Some(StoreConfig::from_lookup(&lookup)?),
            BackendVariant::Relay => StoreConfig::from_lookup(&lookup).ok(),
        };

        Ok(Self {
            variant,
            bind_addr: get("JOLIE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            model,
            retry,
            store,
        })
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}
