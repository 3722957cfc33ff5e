use thiserror::Error;

/// Failures surfaced by the crew client. Application code carries these
/// inside `anyhow::Error` and downcasts where the kind matters.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend reported job {0} failed: {1}")]
    Backend(String, String),

    #[error("Timed out waiting for job {0}")]
    Timeout(String),

    #[error("Still waiting on the previous response. Use /cancel to stop waiting.")]
    Busy,
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> ClientError {
        return ClientError::Transport(err.to_string());
    }
}
