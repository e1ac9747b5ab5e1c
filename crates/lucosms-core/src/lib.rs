pub mod ai;
pub mod capability;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod navigation;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use ai::{ChatSession, GeminiSession};
pub use capability::{CapabilityCall, CapabilityDeclaration, CapabilityResponse, ModelReply, SectionId};
pub use config::Config;
pub use error::SessionError;
pub use navigation::{navigate_to_section, NavigationOutcome, PageSurface, ScrollRequest};
pub use session::{Assistant, Exchange, Settled};
pub use state::{ChatMessage, ChatRole, Transcript};
