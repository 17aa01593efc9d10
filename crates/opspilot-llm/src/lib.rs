//! Opspilot LLM - Planning Gateway
//!
//! This crate turns an operator intent plus collected context and evidence
//! into a model completion:
//! - Auth: credential profile store, Codex session and third-party importers,
//!   explicit → environment → store resolution
//! - Sanitize: control-character stripping and injection signature filtering
//! - Redact: regex scrubbing of the assembled prompt
//! - Providers: OpenAI, Anthropic and Codex (ChatGPT session) clients
//! - Router: the single-shot `plan` pipeline

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod env;
pub mod error;
pub mod providers;
pub mod redact;
pub mod router;
pub mod sanitize;
pub mod util;

pub use auth::{
    AuthProfile, AuthProfiles, CredentialResolver, CredentialSource, NativeImporter,
    ProfileStore, ResolvedCredential, TolerantImporter, UnverifiedTokenClaims,
};
pub use env::{AuthEnv, Clock, EnvSource, FileSystem};
pub use error::{Error, Result};
pub use providers::{CompletionClient, CompletionRequest, ProviderKind};
pub use redact::{redact, Redactor};
pub use router::{Router, RouterConfig};
pub use sanitize::{detect, sanitize, sanitize_value};
