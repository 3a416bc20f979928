pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::OpenAiClient;
pub use app::{build_router, start_server};
pub use config::{AppConfig, ConfigOverrides};
pub use crate::core::pipeline::SentimentPipeline;
pub use domain::model::{AnalysisRequest, AnalysisResult, CompletionRequest, Sentiment};
pub use domain::ports::{CompletionClient, CompletionError, ConfigProvider};
pub use utils::error::{ErrorBody, Result, SentimentError};
