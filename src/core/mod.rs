pub mod pipeline;

pub use crate::domain::model::{AnalysisRequest, AnalysisResult, CompletionRequest, Sentiment};
pub use crate::domain::ports::{CompletionClient, CompletionError, ConfigProvider};
pub use crate::utils::error::Result;
