//! Unverified access-token claims
//!
//! Reads the payload segment of a three-part signed token so an importer can
//! label a profile with its account. The signature is NOT checked. Nothing
//! read here may be used to authenticate or authorize anything.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};

/// Namespace claim carrying account data in OpenAI-issued tokens
const OPENAI_AUTH_CLAIM: &str = "https://api.openai.com/auth";

/// Payload claims of a token whose signature has not been verified
#[derive(Debug, Clone, PartialEq)]
pub struct UnverifiedTokenClaims {
    claims: Map<String, Value>,
}

impl UnverifiedTokenClaims {
    /// Decode the payload of `header.payload.signature`.
    ///
    /// Returns `None` for anything that is not three non-empty dot-separated
    /// segments with a base64url JSON object in the middle.
    #[must_use]
    pub fn decode(token: &str) -> Option<Self> {
        let mut parts = token.trim().split('.');
        let (header, payload, signature) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some()
            || header.is_empty()
            || payload.is_empty()
            || signature.is_empty()
        {
            return None;
        }

        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        match serde_json::from_slice::<Value>(&bytes).ok()? {
            Value::Object(claims) => Some(Self { claims }),
            _ => None,
        }
    }

    /// Raw claim by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// Best-effort account identity.
    ///
    /// Looks at `account_id`, `chatgpt_account_id`, the same keys inside the
    /// OpenAI auth namespace claim, then `sub`.
    #[must_use]
    pub fn account_id(&self) -> Option<String> {
        let namespaced = self.claims.get(OPENAI_AUTH_CLAIM).and_then(Value::as_object);

        ["account_id", "chatgpt_account_id"]
            .iter()
            .find_map(|key| string_claim(&self.claims, key))
            .or_else(|| {
                namespaced.and_then(|ns| {
                    ["chatgpt_account_id", "account_id"]
                        .iter()
                        .find_map(|key| string_claim(ns, key))
                })
            })
            .or_else(|| string_claim(&self.claims, "sub"))
    }
}

fn string_claim(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
pub(crate) fn fake_token(payload: &Value) -> String {
    let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
    format!("eyJhbGciOiJub25lIn0.{body}.c2ln")
}
