use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentimentError {
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    /// `field` names the reply field that failed coercion; `None` means the
    /// reply was not usable JSON at all.
    #[error("Upstream format error: {message}")]
    UpstreamFormatError {
        field: Option<&'static str>,
        message: String,
    },

    #[error("Internal error: {message}")]
    InternalError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Client,
    Upstream,
    Internal,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// JSON payload returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
}

impl SentimentError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn upstream_format(message: impl Into<String>) -> Self {
        Self::UpstreamFormatError {
            field: None,
            message: message.into(),
        }
    }

    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::UpstreamFormatError {
            field: Some(field),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ValidationError { .. } => ErrorCategory::Client,
            Self::UpstreamFormatError { .. } => ErrorCategory::Upstream,
            Self::InternalError { .. } | Self::IoError(_) => ErrorCategory::Internal,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Client => ErrorSeverity::Low,
            ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Internal => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::Client => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message that is safe to show to a caller. Upstream payloads and
    /// transport details never appear here.
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ValidationError { message } => message.clone(),
            Self::UpstreamFormatError { field: None, .. } => {
                "Upstream response was not valid JSON".to_string()
            }
            Self::UpstreamFormatError {
                field: Some(field), ..
            } => format!("Upstream response contained an invalid {} field", field),
            Self::InternalError { .. } | Self::IoError(_) => "Internal server error".to_string(),
            Self::ConfigError { message } => format!("Configuration error: {}", message),
            Self::MissingConfigError { field } => {
                format!("Missing required configuration: {}", field)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid configuration for {}: {}", field, reason)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ValidationError { .. } => "Send a JSON body with a non-empty \"text\" field",
            Self::UpstreamFormatError { .. } => {
                "The language model returned an unexpected reply; try the request again"
            }
            Self::InternalError { .. } | Self::IoError(_) => {
                "Check the server logs and the upstream API status"
            }
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Fix the configuration file or environment variables and restart"
            }
            Self::MissingConfigError { .. } => {
                "Set the missing variable in the environment or in a .env file"
            }
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let error = match self.category() {
            ErrorCategory::Client => "Validation error",
            _ => "Internal server error",
        };
        ErrorBody {
            error: error.to_string(),
            detail: self.user_friendly_message(),
        }
    }
}

impl IntoResponse for SentimentError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_body())).into_response()
    }
}

pub type Result<T> = std::result::Result<T, SentimentError>;
