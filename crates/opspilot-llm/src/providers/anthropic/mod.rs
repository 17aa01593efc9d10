//! Anthropic - Claude Messages API client
//!
//! `POST {base}/v1/messages` with `x-api-key` and `anthropic-version`
//! headers. The system instruction travels in its own field, separate from
//! the message list, and `max_tokens` is always sent.

/// Client implementation
pub mod provider;
/// Wire types
pub mod types;

#[cfg(test)]
mod tests;

pub use provider::AnthropicClient;
pub use types::{API_VERSION, DEFAULT_BASE_URL};
