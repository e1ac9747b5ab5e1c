pub mod gemini;

pub use gemini::GeminiSession;

use async_trait::async_trait;

use crate::capability::{CapabilityResponse, ModelReply};
use crate::error::SessionError;

/// A stateful dialogue with a remote model.
///
/// Implementations keep their own conversation context; each call continues
/// the same dialogue.
#[async_trait]
pub trait ChatSession: Send {
    async fn send_message(&mut self, text: &str) -> Result<ModelReply, SessionError>;

    async fn send_capability_response(
        &mut self,
        response: CapabilityResponse,
    ) -> Result<ModelReply, SessionError>;
}
