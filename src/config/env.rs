use crate::utils::error::{Result, SentimentError};
use std::str::FromStr;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const DEEPGRAM_API_KEY: &str = "DEEPGRAM_API_KEY";
pub const HOST: &str = "HOST";
pub const PORT: &str = "PORT";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const MAX_TOKENS: &str = "SENTIMENT_MAX_TOKENS";
pub const TEMPERATURE: &str = "SENTIMENT_TEMPERATURE";
pub const UPSTREAM_TIMEOUT_SECS: &str = "UPSTREAM_TIMEOUT_SECS";
pub const CORS_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";
pub const MAX_BODY_BYTES: &str = "MAX_BODY_BYTES";

/// Values read from the process environment. Unset and empty variables are
/// both treated as absent.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub openai_api_key: Option<String>,
    pub deepgram_api_key: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub openai_base_url: Option<String>,
    pub openai_model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub upstream_timeout_secs: Option<u64>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub max_body_bytes: Option<usize>,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            openai_api_key: get(OPENAI_API_KEY),
            deepgram_api_key: get(DEEPGRAM_API_KEY),
            host: get(HOST),
            port: parse_var(PORT, get(PORT))?,
            openai_base_url: get(OPENAI_BASE_URL),
            openai_model: get(OPENAI_MODEL),
            max_tokens: parse_var(MAX_TOKENS, get(MAX_TOKENS))?,
            temperature: parse_var(TEMPERATURE, get(TEMPERATURE))?,
            upstream_timeout_secs: parse_var(UPSTREAM_TIMEOUT_SECS, get(UPSTREAM_TIMEOUT_SECS))?,
            cors_allowed_origins: get(CORS_ALLOWED_ORIGINS).map(|v| split_list(&v)),
            max_body_bytes: parse_var(MAX_BODY_BYTES, get(MAX_BODY_BYTES))?,
        })
    }
}

fn parse_var<T>(name: &str, raw: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|e| SentimentError::InvalidConfigValueError {
                field: name.to_string(),
                value: value.clone(),
                reason: e.to_string(),
            })
    })
    .transpose()
}

pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
