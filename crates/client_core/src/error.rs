use shared::error::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiRequestError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed JSON response: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    #[error("invalid API base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("unsupported API base url scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),
    #[error(transparent)]
    Validation(#[from] DomainError),
}

impl ApiRequestError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiRequestError>;
