//! Prompt sanitization for untrusted text
//!
//! Two transformations are applied to anything that ends up inside a prompt:
//! - control characters other than `\n` and `\t` are removed
//! - case-insensitive matches of a fixed catalogue of instruction-injection
//!   signatures are replaced with [`FILTERED_MARKER`]
//!
//! The catalogue is pattern-based, not a classifier. Novel phrasings get
//! through; ordinary operational text is returned byte-for-byte.

use regex::Regex;
use serde_json::{Map, Value};
use std::borrow::Cow;
use tracing::warn;

/// Replacement for a matched injection signature
pub const FILTERED_MARKER: &str = "[FILTERED]";

/// A known injection phrasing
#[derive(Debug, Clone, Copy)]
pub struct InjectionSignature {
    /// Signature identifier
    pub id: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Regular expression, case-insensitive
    pub pattern: &'static str,
}

/// Known injection phrasings
pub const SIGNATURES: &[InjectionSignature] = &[
    // Instruction override
    InjectionSignature {
        id: "ignore_previous",
        description: "Attempt to ignore previous instructions",
        pattern: r"(?i)\bignore\s+(?:(?:all|any|the|your)\s+)*(?:previous|prior|above|earlier|preceding)\s+(?:instructions?|context|prompts?|messages?|rules|directions)",
    },
    InjectionSignature {
        id: "disregard_previous",
        description: "Attempt to disregard previous instructions",
        pattern: r"(?i)\bdisregard\b[^\n]{0,40}?\b(?:previous|prior|above|earlier|preceding)\b(?:\s+(?:instructions?|context|prompts?|messages?|rules))?",
    },
    InjectionSignature {
        id: "forget_previous",
        description: "Attempt to make the model forget previous instructions",
        pattern: r"(?i)\bforget\b[^\n]{0,40}?\b(?:previous|prior|above|earlier|preceding)\b(?:\s+(?:instructions?|context|prompts?|messages?|rules))?",
    },
    // Role manipulation
    InjectionSignature {
        id: "you_are_now",
        description: "Identity change attempt",
        pattern: r"(?i)\byou\s+are\s+now\b[^.!?\n]*",
    },
    InjectionSignature {
        id: "new_instructions",
        description: "Injected instruction block",
        pattern: r"(?i)\bnew\s+instructions\s*:",
    },
    InjectionSignature {
        id: "system_role",
        description: "Line-leading system role marker",
        pattern: r"(?im)^[ \t]*system\s*:",
    },
    // Chat template delimiters
    InjectionSignature {
        id: "chat_template",
        description: "Chat template delimiter token",
        pattern: r"(?i)\[/?INST\]|\[/?SYSTEM\]|<<\s*/?SYS\s*>>|<\|(?:im_start|im_end|system|user|assistant|endoftext)\|>|</?system>",
    },
];

lazy_static::lazy_static! {
    static ref COMPILED: Vec<(&'static str, Regex)> = SIGNATURES
        .iter()
        .filter_map(|sig| match Regex::new(sig.pattern) {
            Ok(re) => Some((sig.id, re)),
            Err(e) => {
                warn!(signature = sig.id, error = %e, "injection signature failed to compile");
                None
            }
        })
        .collect();
}

/// Strip control characters and neutralize injection phrasing
#[must_use]
pub fn sanitize(text: &str) -> String {
    let stripped = strip_control_chars(text);

    let mut out = stripped.into_owned();
    let mut matched = Vec::new();
    for (id, re) in COMPILED.iter() {
        if let Cow::Owned(replaced) = re.replace_all(&out, FILTERED_MARKER) {
            matched.push(*id);
            out = replaced;
        }
    }

    if !matched.is_empty() {
        warn!(signatures = ?matched, "filtered prompt injection signatures");
    }
    out
}

/// Apply [`sanitize`] to every string leaf and object key.
///
/// Keys that collide after sanitizing get a `#2`, `#3`, ... suffix so no
/// entry is overwritten.
#[must_use]
pub fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize(s)),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_value).collect()),
        Value::Object(obj) => {
            let mut out = Map::with_capacity(obj.len());
            for (k, v) in obj {
                let key = unique_key(&out, sanitize(k));
                out.insert(key, sanitize_value(v));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

fn unique_key(map: &Map<String, Value>, key: String) -> String {
    if !map.contains_key(&key) {
        return key;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{key}#{n}");
        if !map.contains_key(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Ids of the signatures present in `text`
#[must_use]
pub fn detect(text: &str) -> Vec<&'static str> {
    let stripped = strip_control_chars(text);
    COMPILED
        .iter()
        .filter(|(_, re)| re.is_match(&stripped))
        .map(|(id, _)| *id)
        .collect()
}

fn strip_control_chars(text: &str) -> Cow<'_, str> {
    let is_dropped = |c: char| c.is_control() && c != '\n' && c != '\t';
    if text.chars().any(is_dropped) {
        Cow::Owned(text.chars().filter(|c| !is_dropped(*c)).collect())
    } else {
        Cow::Borrowed(text)
    }
}
