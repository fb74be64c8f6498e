//! Provider-agnostic chat adapter.

mod adapter;
mod error;
mod gemini;
mod normalize;
mod provider;
mod registry;
mod types;

pub use adapter::{ChatAdapter, ChatBackend};
pub use error::{ChatError, LLMError};
pub use gemini::GeminiProvider;
pub use normalize::{extract_text, extract_usage, normalize};
pub use provider::LLMProvider;
pub use registry::ProviderRegistry;
pub use types::{ChatReply, ChatRequest, GenerateRequest, Message, Role, TokenUsage};
