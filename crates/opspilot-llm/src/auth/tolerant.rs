//! Tolerant credential importer for third-party agent exports
//!
//! Third-party agent runtimes write credentials in several layouts and with
//! inconsistent field names. This importer classifies the document first
//! ([`classify_export`]) and only then decodes it, so each accepted layout is
//! an explicit [`ExportShape`] variant:
//!
//! - `Native`: this crate's own `{"profiles": [...]}` store document
//! - `List`: a JSON array of credential objects
//! - `Keyed`: an object mapping arbitrary keys to credential objects
//!   (also `{"profiles": {...}}` wrappers around such a map)
//! - `Single`: one credential object, recognized by its `provider` field

use super::expiry::resolve_expiry;
use super::profile::{profile_id_for, AuthProfile, AuthProfiles};
use crate::env::{AuthEnv, FileSystem};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Provider assumed when the caller does not name one
pub const DEFAULT_PROVIDER: &str = "openai-codex";

/// Environment override pointing at a single agent directory
pub const AGENT_DIR_ENV: &str = "OPENCLAW_AGENT_DIR";

/// Environment override for the runtime's state root
pub const STATE_DIR_ENV: &str = "OPENCLAW_STATE_DIR";

const STATE_DIR: &str = ".openclaw";
const AGENTS_DIR: &str = "agents";
const AGENT_SUBDIR: &str = "agent";
const PROFILES_FILE: &str = "auth-profiles.json";
const LEGACY_DIR: &str = "credentials";
const LEGACY_FILE: &str = "oauth.json";

const ACCESS_KEYS: &[&str] = &["access", "access_token", "accessToken", "key"];
const REFRESH_KEYS: &[&str] = &["refresh", "refresh_token", "refreshToken"];
const ACCOUNT_KEYS: &[&str] = &["account_id", "accountId", "email"];
const EXPIRES_KEYS: &[&str] = &["expires", "expires_at", "expiresAt"];
const EXPIRES_IN_KEY: &str = "expires_in";

// ============================================================================
// Shape classification
// ============================================================================

/// A credential object read with field-name tolerance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LooseCredential {
    /// Explicit `id`
    pub id: Option<String>,
    /// `provider`
    pub provider: Option<String>,
    /// Access token under any accepted alias
    pub access_token: Option<String>,
    /// Refresh token under any accepted alias
    pub refresh_token: Option<String>,
    /// Account identity under any accepted alias
    pub account_id: Option<String>,
    /// Absolute expiry, undecoded
    pub expires: Option<Value>,
    /// Relative expiry in seconds, undecoded
    pub expires_in: Option<Value>,
}

impl LooseCredential {
    /// Read a credential object
    #[must_use]
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            id: first_string(obj, &["id"]),
            provider: first_string(obj, &["provider"]),
            access_token: first_string(obj, ACCESS_KEYS),
            refresh_token: first_string(obj, REFRESH_KEYS),
            account_id: first_string(obj, ACCOUNT_KEYS),
            expires: EXPIRES_KEYS
                .iter()
                .find_map(|k| obj.get(*k).filter(|v| !v.is_null()))
                .cloned(),
            expires_in: obj.get(EXPIRES_IN_KEY).filter(|v| !v.is_null()).cloned(),
        }
    }
}

/// Layout of a credential export
#[derive(Debug, Clone, PartialEq)]
pub enum ExportShape {
    /// This crate's own store document
    Native(AuthProfiles),
    /// Array of credential objects
    List(Vec<LooseCredential>),
    /// Map of key → credential object, in document order
    Keyed(Vec<(String, LooseCredential)>),
    /// One top-level credential object
    Single(LooseCredential),
}

/// Decide which layout `value` is in.
///
/// Checked in order: native store document (must contain at least one
/// profile with credential material), array, single object with `provider`,
/// object with a `profiles` array or map, then plain keyed map.
pub fn classify_export(value: &Value) -> std::result::Result<ExportShape, String> {
    if let Some(native) = as_native(value) {
        return Ok(ExportShape::Native(native));
    }

    match value {
        Value::Array(items) => Ok(ExportShape::List(list_of(items))),
        Value::Object(obj) if obj.contains_key("provider") => {
            Ok(ExportShape::Single(LooseCredential::from_object(obj)))
        }
        Value::Object(obj) => match obj.get("profiles") {
            Some(Value::Array(items)) => Ok(ExportShape::List(list_of(items))),
            Some(Value::Object(inner)) => Ok(ExportShape::Keyed(keyed_of(inner))),
            _ => Ok(ExportShape::Keyed(keyed_of(obj))),
        },
        other => Err(format!(
            "expected a JSON object or array, found {}",
            json_kind(other)
        )),
    }
}

fn as_native(value: &Value) -> Option<AuthProfiles> {
    if !value.get("profiles").is_some_and(Value::is_array) {
        return None;
    }
    let native: AuthProfiles = serde_json::from_value(value.clone()).ok()?;
    native
        .profiles
        .iter()
        .any(AuthProfile::has_credential_material)
        .then_some(native)
}

fn list_of(items: &[Value]) -> Vec<LooseCredential> {
    items
        .iter()
        .filter_map(Value::as_object)
        .map(LooseCredential::from_object)
        .collect()
}

fn keyed_of(obj: &Map<String, Value>) -> Vec<(String, LooseCredential)> {
    obj.iter()
        .filter_map(|(k, v)| v.as_object().map(|o| (k.clone(), LooseCredential::from_object(o))))
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Default path discovery
// ============================================================================

/// Locate a credential export.
///
/// 1. `$OPENCLAW_AGENT_DIR/auth-profiles.json`
/// 2. Under `$OPENCLAW_STATE_DIR`: the most recently modified
///    `agents/*/agent/auth-profiles.json`, else `credentials/oauth.json`
/// 3. The same search under `~/.openclaw`
pub fn discover_export_path(auth_env: &AuthEnv) -> Result<PathBuf> {
    let fs = auth_env.fs.as_ref();

    if let Some(dir) = auth_env.env.non_blank_var(AGENT_DIR_ENV) {
        let candidate = PathBuf::from(dir).join(PROFILES_FILE);
        if fs.is_file(&candidate) {
            return Ok(candidate);
        }
        debug!(path = %candidate.display(), "agent dir override has no credential file");
    }

    let roots = auth_env
        .env
        .non_blank_var(STATE_DIR_ENV)
        .map(PathBuf::from)
        .into_iter()
        .chain(auth_env.env.home_dir().map(|h| h.join(STATE_DIR)));

    for root in roots {
        if let Some(found) = search_state_root(fs, &root) {
            return Ok(found);
        }
    }

    Err(Error::NotConfigured(format!(
        "no third-party credential export found (set {AGENT_DIR_ENV} or {STATE_DIR_ENV}, or pass a path)"
    )))
}

fn search_state_root(fs: &dyn FileSystem, root: &Path) -> Option<PathBuf> {
    let newest_agent = fs
        .read_dir(&root.join(AGENTS_DIR))
        .unwrap_or_default()
        .into_iter()
        .map(|agent| agent.join(AGENT_SUBDIR).join(PROFILES_FILE))
        .filter(|candidate| fs.is_file(candidate))
        .filter_map(|candidate| fs.modified(&candidate).ok().map(|m| (m, candidate)))
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, path)| path);

    if newest_agent.is_some() {
        return newest_agent;
    }

    let legacy = root.join(LEGACY_DIR).join(LEGACY_FILE);
    fs.is_file(&legacy).then_some(legacy)
}

// ============================================================================
// Importer
// ============================================================================

/// Importer for third-party credential exports
#[derive(Debug, Clone)]
pub struct TolerantImporter {
    auth_env: AuthEnv,
}

impl TolerantImporter {
    /// Create an importer
    #[must_use]
    pub fn new(auth_env: AuthEnv) -> Self {
        Self { auth_env }
    }

    /// Import the credential for `provider` from `path` (discovered when `None`).
    ///
    /// A non-blank `preferred_id` must match a credential id exactly.
    pub fn import(
        &self,
        path: Option<&Path>,
        provider: &str,
        preferred_id: Option<&str>,
    ) -> Result<AuthProfile> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => discover_export_path(&self.auth_env)?,
        };

        debug!(path = %path.display(), provider, "importing third-party credentials");

        let content = self
            .auth_env
            .fs
            .read_to_string(&path)
            .map_err(|e| Error::io(&path, e))?;

        let profile = self.parse(&content, &path, provider, preferred_id)?;
        info!(
            profile = %profile.id,
            provider = %profile.provider,
            expires_at = ?profile.expires_at,
            "imported third-party credentials"
        );
        Ok(profile)
    }

    /// Select and validate a credential from file contents
    pub fn parse(
        &self,
        content: &str,
        origin: &Path,
        provider: &str,
        preferred_id: Option<&str>,
    ) -> Result<AuthProfile> {
        let value: Value = serde_json::from_str(content).map_err(|e| Error::parse(origin, e))?;
        let shape = classify_export(&value).map_err(|e| Error::parse(origin, e))?;
        let now = self.auth_env.clock.now();
        let source = format!("tolerant-import:{}", origin.display());

        let candidates = normalize(shape, provider, now, &source);
        debug!(count = candidates.len(), "decoded credential candidates");

        let preferred = crate::util::non_blank(preferred_id);
        let (selected, expiry) = match preferred {
            Some(id) => candidates.into_iter().find(|(p, _)| p.id == id),
            None => candidates.into_iter().find(|(p, _)| p.provider == provider),
        }
        .ok_or_else(|| Error::ProfileNotFound {
            provider: provider.to_string(),
            profile_id: preferred.map(str::to_string),
        })?;

        if selected.usable_access_token().is_none() {
            return Err(Error::NoUsableToken(format!(
                "profile {} in {}",
                selected.id,
                origin.display()
            )));
        }

        // unreadable expiry must not pass as "never expires"
        let expires_at = expiry
            .map_err(|e| Error::parse(origin, format!("profile {}: {e}", selected.id)))?;
        let selected = AuthProfile {
            expires_at,
            ..selected
        };

        if selected.is_expired(now) {
            return Err(Error::TokenExpired {
                profile_id: selected.id.clone(),
                expired_at: selected
                    .expires_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_default(),
            });
        }

        Ok(selected)
    }
}

/// A candidate profile and its decoded expiry
type Candidate = (AuthProfile, std::result::Result<Option<DateTime<Utc>>, String>);

/// Turn any shape into profiles, in document order
fn normalize(
    shape: ExportShape,
    provider: &str,
    now: DateTime<Utc>,
    source: &str,
) -> Vec<Candidate> {
    match shape {
        ExportShape::Native(native) => native
            .profiles
            .into_iter()
            .map(|mut p| {
                if p.source.is_empty() {
                    p.source = source.to_string();
                }
                let expiry = Ok(p.expires_at);
                (p, expiry)
            })
            .collect(),
        ExportShape::List(items) => items
            .into_iter()
            .map(|c| to_profile(c, None, provider, now, source))
            .collect(),
        ExportShape::Keyed(entries) => entries
            .into_iter()
            .map(|(key, c)| to_profile(c, Some(&key), provider, now, source))
            .collect(),
        ExportShape::Single(c) => vec![to_profile(c, None, provider, now, source)],
    }
}

/// Build a profile from a loose credential.
///
/// Missing provider: the key's `provider:` prefix, else the requested
/// provider. Missing id: a `provider:name` key, else the synthesized id.
fn to_profile(
    cred: LooseCredential,
    key: Option<&str>,
    requested_provider: &str,
    now: DateTime<Utc>,
    source: &str,
) -> Candidate {
    let prefixed_key = key.filter(|k| k.contains(':'));

    let provider = cred
        .provider
        .clone()
        .or_else(|| {
            prefixed_key
                .and_then(|k| k.split(':').next())
                .filter(|p| !p.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| requested_provider.to_string());

    let id = cred
        .id
        .clone()
        .or_else(|| prefixed_key.map(str::to_string))
        .unwrap_or_else(|| profile_id_for(&provider, cred.account_id.as_deref()));

    let mut profile = AuthProfile::new(id, provider).with_source(source);
    profile.access_token = cred.access_token;
    profile.refresh_token = cred.refresh_token;
    profile.account_id = cred.account_id;
    let expiry = resolve_expiry(cred.expires.as_ref(), cred.expires_in.as_ref(), now);
    (profile, expiry)
}

fn first_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| {
        obj.get(*k)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}
