//! OpenAI - Chat Completions client
//!
//! `POST {base}/chat/completions` with bearer auth. The same wire format is
//! reused by the Codex session client.

/// Client implementation
pub mod provider;
/// Wire types
pub mod types;


pub use provider::OpenAiClient;
pub use types::DEFAULT_BASE_URL;
