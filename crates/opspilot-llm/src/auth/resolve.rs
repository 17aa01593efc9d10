//! Credential resolution
//!
//! Precedence, first hit wins:
//! 1. `explicit_api_key` from the router configuration
//! 2. the provider's token environment variable
//! 3. the profile store, read fresh on every call
//!
//! Tiers 1 and 2 let ephemeral CI credentials override a cached local
//! session without editing the store.

use super::store::ProfileStore;
use crate::env::AuthEnv;
use crate::error::{Error, Result};
use crate::providers::ProviderKind;
use crate::router::RouterConfig;
use crate::util::{mask_api_key, non_blank};
use std::fmt;
use tracing::debug;

/// Environment override for the stored profile id
pub const PROFILE_ID_ENV: &str = "OPSPILOT_AUTH_PROFILE";

/// Where a resolved credential came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// `explicit_api_key` in the configuration
    Explicit,
    /// A provider token environment variable
    Environment(&'static str),
    /// A stored profile
    Profile(String),
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => f.write_str("explicit"),
            Self::Environment(var) => write!(f, "env:{var}"),
            Self::Profile(id) => write!(f, "profile:{id}"),
        }
    }
}

/// A usable credential
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    /// Token or API key
    pub token: String,
    /// Account the token belongs to, when known
    pub account_id: Option<String>,
    /// Where it came from
    pub source: CredentialSource,
}

// SECURITY: Custom Debug implementation to mask the token
impl fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredential")
            .field("token", &mask_api_key(&self.token))
            .field("account_id", &self.account_id)
            .field("source", &self.source)
            .finish()
    }
}

/// Resolves the credential to present to a provider
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    auth_env: AuthEnv,
}

impl CredentialResolver {
    /// Create a resolver
    #[must_use]
    pub fn new(auth_env: AuthEnv) -> Self {
        Self { auth_env }
    }

    /// Resolve for the configured provider
    pub fn resolve(&self, config: &RouterConfig) -> Result<ResolvedCredential> {
        let provider: ProviderKind = config.provider.parse()?;
        self.resolve_for(provider, config)
    }

    /// Resolve for `provider` using `config`'s explicit key, profile id and store path
    pub fn resolve_for(
        &self,
        provider: ProviderKind,
        config: &RouterConfig,
    ) -> Result<ResolvedCredential> {
        if let Some(key) = non_blank(config.explicit_api_key.as_deref()) {
            debug!(provider = %provider, "using explicit credential");
            return Ok(ResolvedCredential {
                token: key.to_string(),
                account_id: None,
                source: CredentialSource::Explicit,
            });
        }

        let var = provider.token_env_var();
        if let Some(token) = self.auth_env.env.non_blank_var(var) {
            debug!(provider = %provider, var, "using credential from environment");
            return Ok(ResolvedCredential {
                token,
                account_id: None,
                source: CredentialSource::Environment(var),
            });
        }

        self.resolve_from_store(provider, config)
    }

    fn resolve_from_store(
        &self,
        provider: ProviderKind,
        config: &RouterConfig,
    ) -> Result<ResolvedCredential> {
        let store = match &config.auth_store_path {
            Some(path) => ProfileStore::with_fs(path.clone(), self.auth_env.fs.clone()),
            None => ProfileStore::from_env(&self.auth_env)?,
        };

        let profile_id = non_blank(config.auth_profile_id.as_deref())
            .map(str::to_string)
            .or_else(|| self.auth_env.env.non_blank_var(PROFILE_ID_ENV));

        debug!(
            provider = %provider,
            store = %store.path().display(),
            profile = profile_id.as_deref().unwrap_or("<default>"),
            "resolving credential from profile store"
        );

        let profiles = store.load()?;
        let profile = profiles
            .select(provider.as_str(), profile_id.as_deref())
            .ok_or_else(|| Error::ProfileNotFound {
                provider: provider.to_string(),
                profile_id: profile_id.clone(),
            })?;

        let token = profile
            .usable_access_token()
            .ok_or_else(|| Error::BlankToken(profile.id.clone()))?;

        if profile.is_expired(self.auth_env.clock.now()) {
            return Err(Error::TokenExpired {
                profile_id: profile.id.clone(),
                expired_at: profile
                    .expires_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_default(),
            });
        }

        Ok(ResolvedCredential {
            token: token.to_string(),
            account_id: profile.account_id.clone(),
            source: CredentialSource::Profile(profile.id.clone()),
        })
    }
}
