use crate::domain::model::CompletionRequest;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Completion API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Completion API returned no content")]
    EmptyReply,

    #[error("API key is not a valid header value")]
    InvalidApiKey,
}

/// The one external capability the service depends on: turn a prompt pair
/// into the model's raw text reply.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// Sampling knobs the pipeline reads when it is built.
pub trait ConfigProvider: Send + Sync {
    fn max_tokens(&self) -> u32;
    fn temperature(&self) -> f32;
}
