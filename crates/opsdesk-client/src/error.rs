use reqwest::StatusCode;
use thiserror::Error;

use opsdesk_types::validate::ValidationErrors;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected locally; no request was sent.
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("server returned {status}: {message}")]
    Http { status: StatusCode, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("not logged in")]
    NotAuthenticated,
}

impl From<ValidationErrors> for ClientError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }
}
