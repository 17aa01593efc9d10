//! Credential profiles
//!
//! An [`AuthProfile`] is one stored credential for one provider. The
//! persisted [`AuthProfiles`] document keeps them in insertion order next to
//! a per-provider default pointer.
//!
//! Defaults are not checked against the profile list: a default naming a
//! removed or never-imported profile is kept as written and simply fails to
//! resolve later.

use crate::error::{Error, Result};
use crate::util::mask_optional;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A stored credential for one provider
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthProfile {
    /// Unique profile id, conventionally `{provider}:{account}`
    pub id: String,
    /// Provider name (e.g. `openai-codex`)
    pub provider: String,
    /// Account identity, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Bearer/access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Refresh token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry; `None` never expires
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::expiry::deserialize_optional"
    )]
    pub expires_at: Option<DateTime<Utc>>,
    /// Where the profile came from
    #[serde(default)]
    pub source: String,
}

// SECURITY: tokens never reach logs through Debug
impl fmt::Debug for AuthProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthProfile")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("account_id", &self.account_id)
            .field("access_token", &mask_optional(self.access_token.as_deref()))
            .field("refresh_token", &mask_optional(self.refresh_token.as_deref()))
            .field("expires_at", &self.expires_at)
            .field("source", &self.source)
            .finish()
    }
}

impl AuthProfile {
    /// Create a profile with only id and provider set
    #[must_use]
    pub fn new(id: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            account_id: None,
            access_token: None,
            refresh_token: None,
            expires_at: None,
            source: String::new(),
        }
    }

    /// Set the access token
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the refresh token
    #[must_use]
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    /// Set the account id
    #[must_use]
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Set the expiry
    #[must_use]
    pub fn with_expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Set the provenance tag
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Expired iff an expiry is set and `at` is strictly after it
    #[must_use]
    pub fn is_expired(&self, at: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| at > expires)
    }

    /// Access token, if present and not blank
    #[must_use]
    pub fn usable_access_token(&self) -> Option<&str> {
        crate::util::non_blank(self.access_token.as_deref())
    }

    /// Whether the profile carries any credential material at all
    #[must_use]
    pub fn has_credential_material(&self) -> bool {
        crate::util::non_blank(self.access_token.as_deref()).is_some()
            || crate::util::non_blank(self.refresh_token.as_deref()).is_some()
            || self.expires_at.is_some()
    }
}

/// Deterministic profile id: `{provider}:{account_id}` or `{provider}:default`
#[must_use]
pub fn profile_id_for(provider: &str, account_id: Option<&str>) -> String {
    match crate::util::non_blank(account_id) {
        Some(account) => format!("{provider}:{account}"),
        None => format!("{provider}:default"),
    }
}

/// The persisted profile document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthProfiles {
    /// provider → default profile id
    #[serde(default, deserialize_with = "null_as_default")]
    pub defaults: BTreeMap<String, String>,
    /// Profiles in insertion order
    #[serde(default, deserialize_with = "null_as_default")]
    pub profiles: Vec<AuthProfile>,
}

impl AuthProfiles {
    /// Empty document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by id.
    ///
    /// Replacement keeps the original position; new ids are appended.
    pub fn upsert(&mut self, profile: AuthProfile) -> Result<()> {
        if profile.id.trim().is_empty() {
            return Err(Error::InvalidInput("auth profile id is required".to_string()));
        }

        match self.profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
        Ok(())
    }

    /// Pick the profile for `provider`.
    ///
    /// 1. A non-blank `preferred_id` must match exactly; no fallback.
    /// 2. Otherwise the provider's default, if it names an existing profile.
    /// 3. Otherwise the first profile of that provider in store order.
    #[must_use]
    pub fn select(&self, provider: &str, preferred_id: Option<&str>) -> Option<&AuthProfile> {
        if let Some(id) = crate::util::non_blank(preferred_id) {
            return self.get(id);
        }

        if let Some(default) = self.defaults.get(provider).and_then(|id| self.get(id)) {
            return Some(default);
        }

        self.profiles.iter().find(|p| p.provider == provider)
    }

    /// Profile by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AuthProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Point `provider`'s default at `profile_id`
    pub fn set_default(&mut self, provider: impl Into<String>, profile_id: impl Into<String>) {
        self.defaults.insert(provider.into(), profile_id.into());
    }

    /// Remove a profile and any default pointing at it
    pub fn remove(&mut self, id: &str) -> Option<AuthProfile> {
        let index = self.profiles.iter().position(|p| p.id == id)?;
        self.defaults.retain(|_, default| default != id);
        Some(self.profiles.remove(index))
    }

    /// Whether the document holds no profiles
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn profile(id: &str, provider: &str, token: &str) -> AuthProfile {
        AuthProfile::new(id, provider).with_access_token(token)
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut store = AuthProfiles::new();
        store.upsert(profile("a", "openai", "one")).unwrap();
        store.upsert(profile("b", "openai", "two")).unwrap();
        store.upsert(profile("a", "openai", "three")).unwrap();

        assert_eq!(store.profiles.len(), 2);
        assert_eq!(store.profiles[0].id, "a");
        assert_eq!(store.profiles[0].access_token.as_deref(), Some("three"));
        assert_eq!(store.profiles[1].id, "b");
    }

    #[test]
    fn test_upsert_requires_id() {
        let mut store = AuthProfiles::new();
        let err = store.upsert(profile("  ", "openai", "tok")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_select_preferred_id_has_no_fallback() {
        let mut store = AuthProfiles::new();
        store.upsert(profile("openai:a", "openai", "one")).unwrap();

        assert_eq!(
            store.select("openai", Some("openai:a")).map(|p| p.id.as_str()),
            Some("openai:a")
        );
        assert!(store.select("openai", Some("openai:missing")).is_none());
    }

    #[test]
    fn test_select_uses_default_then_first_match() {
        let mut store = AuthProfiles::new();
        store.upsert(profile("anthropic:x", "anthropic", "x")).unwrap();
        store.upsert(profile("openai:first", "openai", "1")).unwrap();
        store.upsert(profile("openai:second", "openai", "2")).unwrap();

        // no default → first matching provider in insertion order
        assert_eq!(store.select("openai", None).unwrap().id, "openai:first");

        store.set_default("openai", "openai:second");
        assert_eq!(store.select("openai", None).unwrap().id, "openai:second");

        // dangling default falls through to first match
        store.set_default("openai", "openai:gone");
        assert_eq!(store.select("openai", Some("")).unwrap().id, "openai:first");

        assert!(store.select("gemini", None).is_none());
    }

    #[test]
    fn test_remove_clears_defaults() {
        let mut store = AuthProfiles::new();
        store.upsert(profile("openai:a", "openai", "1")).unwrap();
        store.set_default("openai", "openai:a");

        let removed = store.remove("openai:a").unwrap();
        assert_eq!(removed.id, "openai:a");
        assert!(store.defaults.is_empty());
        assert!(store.remove("openai:a").is_none());
    }

    #[test]
    fn test_is_expired_strictly_after() {
        let expires = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let p = profile("a", "openai", "t").with_expires_at(expires);

        assert!(!p.is_expired(expires));
        assert!(!p.is_expired(expires - Duration::seconds(1)));
        assert!(p.is_expired(expires + Duration::seconds(1)));
        assert!(!profile("b", "openai", "t").is_expired(Utc::now()));
    }

    #[test]
    fn test_profile_id_for() {
        assert_eq!(profile_id_for("openai-codex", Some("acct-1")), "openai-codex:acct-1");
        assert_eq!(profile_id_for("openai-codex", Some(" ")), "openai-codex:default");
        assert_eq!(profile_id_for("openai-codex", None), "openai-codex:default");
    }

    #[test]
    fn test_deserialize_tolerates_nulls_and_zero_time() {
        let json = r#"{
            "defaults": null,
            "profiles": [{
                "id": "openai:a",
                "provider": "openai",
                "access_token": "tok",
                "expires_at": "0001-01-01T00:00:00Z",
                "source": "manual"
            }]
        }"#;

        let store: AuthProfiles = serde_json::from_str(json).unwrap();
        assert!(store.defaults.is_empty());
        assert_eq!(store.profiles[0].expires_at, None);
        assert!(!store.profiles[0].is_expired(Utc::now()));
    }

    #[test]
    fn test_debug_masks_tokens() {
        let p = profile("a", "openai", "sk-1234567890abcdefghij").with_refresh_token("rt_secret_value_123");
        let debug = format!("{p:?}");
        assert!(!debug.contains("1234567890"));
        assert!(!debug.contains("secret_value"));
        assert!(debug.contains("sk-1...ghij"));
    }
}
