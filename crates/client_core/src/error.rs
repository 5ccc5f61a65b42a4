use std::time::Duration;

use shared::error::ApiException;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("{0}")]
    Transport(String),
    #[error(transparent)]
    Server(#[from] ApiException),
    #[error("request failed with status code {status}")]
    Status { status: u16 },
}

impl DirectoryError {
    /// The one line shown to the user: the server's own message when it sent
    /// one, otherwise the transport description, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        let message = match self {
            DirectoryError::Server(err) => err.message.clone(),
            other => other.to_string(),
        };
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DirectoryError::Timeout(_))
    }
}
