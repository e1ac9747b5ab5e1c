use thiserror::Error;

/// Everything that can go wrong during one exchange with the remote model.
///
/// The chat widget shows the same fallback sentence for all of these; the
/// variants exist so logs can tell them apart.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote service error {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("invalid capability request: {0}")]
    InvalidCapability(String),
}

impl SessionError {
    /// Short label used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Transport(_) => "transport",
            SessionError::Remote { .. } => "remote",
            SessionError::MalformedResponse(_) => "malformed_response",
            SessionError::InvalidCapability(_) => "invalid_capability",
        }
    }
}
