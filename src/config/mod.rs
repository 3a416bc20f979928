#[cfg(feature = "cli")]
pub mod cli;
pub mod env;
pub mod toml_config;

use crate::adapters::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use env::EnvConfig;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use toml_config::FileConfig;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_TOKENS: u32 = 200;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:3000",
    "https://sentiment-aura.vercel.app",
    "https://sentiment-aura-sigma.vercel.app",
    "https://sentiment-aura-*.vercel.app",
    "https://*.vercel.app",
];

/// Load a `.env` file into the process environment; variables that are
/// already set win. The binary calls this before parsing arguments so flags
/// backed by environment variables see `.env` values too.
pub fn load_dotenv(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => dotenv::from_path(path).ok().map(|_| path.to_path_buf()),
        None => dotenv::dotenv().ok(),
    }
}

/// Values given on the command line; they win over every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config_path: Option<PathBuf>,
}

/// Process-wide settings, loaded once at startup and never mutated.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub openai_api_key: String,
    pub deepgram_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub upstream_timeout_secs: u64,
    pub cors_allowed_origins: Vec<String>,
    pub max_body_bytes: usize,
}

impl AppConfig {
    /// Load `.env`, the optional TOML file and the environment, then apply
    /// the overrides.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        load_dotenv(None);

        let file = match &overrides.config_path {
            Some(path) => {
                tracing::debug!("Loading configuration file {}", path.display());
                Some(FileConfig::from_file(path)?)
            }
            None => None,
        };

        let config = Self::from_sources(file.unwrap_or_default(), EnvConfig::from_env()?, overrides)?;
        config.validate()?;
        Ok(config)
    }

    /// Merge the sources, lowest precedence first: defaults, file, env,
    /// overrides.
    pub fn from_sources(
        file: FileConfig,
        env: EnvConfig,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let api_key = env.openai_api_key.or(file.upstream.api_key);
        let openai_api_key =
            validation::validate_required_field(env::OPENAI_API_KEY, &api_key)?.clone();

        Ok(Self {
            host: overrides
                .host
                .clone()
                .or(env.host)
                .or(file.server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides
                .port
                .or(env.port)
                .or(file.server.port)
                .unwrap_or(DEFAULT_PORT),
            openai_api_key,
            deepgram_api_key: env.deepgram_api_key.or(file.upstream.speech_api_key),
            openai_base_url: env
                .openai_base_url
                .or(file.upstream.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            openai_model: env
                .openai_model
                .or(file.upstream.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: env
                .max_tokens
                .or(file.analysis.max_tokens)
                .unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: env
                .temperature
                .or(file.analysis.temperature)
                .unwrap_or(DEFAULT_TEMPERATURE),
            upstream_timeout_secs: env
                .upstream_timeout_secs
                .or(file.upstream.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            cors_allowed_origins: env
                .cors_allowed_origins
                .or(file.cors.allowed_origins)
                .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect()),
            max_body_bytes: env
                .max_body_bytes
                .or(file.server.max_body_bytes)
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
        })
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn speech_configured(&self) -> bool {
        self.deepgram_api_key.is_some()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("openai_api_key", &"<redacted>")
            .field(
                "deepgram_api_key",
                &self.deepgram_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

impl ConfigProvider for AppConfig {
    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string(env::OPENAI_API_KEY, &self.openai_api_key)?;
        validation::validate_non_empty_string("host", &self.host)?;
        validation::validate_positive_number("port", self.port as usize, 1)?;
        validation::validate_url("openai_base_url", &self.openai_base_url)?;
        validation::validate_non_empty_string("openai_model", &self.openai_model)?;
        validation::validate_range("max_tokens", self.max_tokens, 1, 4096)?;
        validation::validate_range("temperature", self.temperature, 0.0, 2.0)?;
        validation::validate_range("upstream_timeout_secs", self.upstream_timeout_secs, 1, 600)?;
        validation::validate_positive_number("max_body_bytes", self.max_body_bytes, 1)?;
        for origin in &self.cors_allowed_origins {
            validation::validate_non_empty_string("cors_allowed_origins", origin)?;
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }
}
