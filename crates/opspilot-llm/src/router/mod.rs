//! Router - single-shot planning pipeline
//!
//! `plan(intent, context, evidence)` runs, in order: blank-intent check,
//! sanitization, JSON encoding, prompt assembly, redaction, provider lookup,
//! credential resolution and finally the provider call.
//!
//! # Module Structure
//!
//! - `config`: `RouterConfig`
//! - `prompt`: system instruction and user prompt layout
//! - `router_impl`: `Router`

mod config;
mod prompt;
mod router_impl;


pub use config::{RouterConfig, DEFAULT_TIMEOUT_SECS};
pub use prompt::{build_user_prompt, OUTPUT_CONTRACT, SYSTEM_PROMPT};
pub use router_impl::Router;
