//! Error types for the SignDev client

use signdev_pdf::PdfError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Input rejected locally; no request was issued
    #[error("{0}")]
    Validation(String),

    #[error("Request failed with status {status}: {}", message.as_deref().unwrap_or("no message"))]
    Api {
        status: u16,
        message: Option<String>,
    },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid share payload: {0}")]
    Decode(String),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Message the server attached to a rejected request, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Api {
                message: Some(m), ..
            } if !m.is_empty() => Some(m),
            _ => None,
        }
    }

    /// Server message when present, otherwise the call site's fallback
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            ClientError::Validation(msg) => msg.clone(),
            _ => self
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string()),
        }
    }

    /// Server message when present, otherwise this error's own description
    pub fn describe(&self) -> String {
        self.server_message()
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string())
    }
}
