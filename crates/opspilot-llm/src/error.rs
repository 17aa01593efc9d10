//! Error types for opspilot-llm

use thiserror::Error;

/// Planning gateway error type
#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied an unusable argument (e.g. blank intent)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Provider or credential not configured
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// Provider name has no client
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// No stored profile matched the lookup
    #[error("no auth profile found for provider {provider} (profile: {})", .profile_id.as_deref().unwrap_or("<default>"))]
    ProfileNotFound {
        /// Provider the lookup was made for
        provider: String,
        /// Explicit profile id, if one was requested
        profile_id: Option<String>,
    },

    /// Selected credential is past its expiry
    #[error("auth profile {profile_id} expired at {expired_at}; re-run the provider login and import again")]
    TokenExpired {
        /// Profile id
        profile_id: String,
        /// Expiry timestamp (RFC 3339)
        expired_at: String,
    },

    /// Selected profile holds a blank access token
    #[error("auth profile {0} has a blank access token")]
    BlankToken(String),

    /// Imported credential carries no access token
    #[error("no usable access token in {0}")]
    NoUsableToken(String),

    /// Context or evidence could not be serialized
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Non-2xx provider response
    #[error("api error ({status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// 2xx provider response without content
    #[error("empty response from {0}")]
    EmptyResponse(String),

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Caller cancelled the request
    #[error("request cancelled")]
    Cancelled,

    /// Filesystem error
    #[error("io error on {path}: {message}")]
    Io {
        /// File involved
        path: String,
        /// Underlying error text
        message: String,
    },

    /// Malformed credential file
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// File involved
        path: String,
        /// Underlying error text
        message: String,
    },
}

impl Error {
    pub(crate) fn io(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn parse(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
