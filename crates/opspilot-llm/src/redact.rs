//! Secret redaction for outgoing prompts
//!
//! The last step before a prompt leaves the process. Patterns are applied in
//! order; each whole match becomes [`REDACTED_MARKER`]. A pattern that does
//! not compile is logged and skipped so a bad scrub rule never blocks
//! planning.

use regex::Regex;
use tracing::warn;

/// Replacement for a redacted match
pub const REDACTED_MARKER: &str = "[REDACTED]";

/// Precompiled redaction patterns
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    patterns: Vec<Regex>,
}

impl Redactor {
    /// Compile `patterns`, dropping any that fail
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .filter_map(|p| {
                let p = p.as_ref();
                match Regex::new(p) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        warn!(pattern = %p, error = %e, "skipping invalid redaction pattern");
                        None
                    }
                }
            })
            .collect();
        Self { patterns }
    }

    /// Whether no usable pattern is configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Number of usable patterns
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Replace every match, then trim
    #[must_use]
    pub fn redact(&self, text: &str) -> String {
        let mut out = text.to_string();
        for re in &self.patterns {
            out = re.replace_all(&out, REDACTED_MARKER).into_owned();
        }
        out.trim().to_string()
    }
}

/// One-shot form of [`Redactor::redact`]
#[must_use]
pub fn redact<S: AsRef<str>>(text: &str, patterns: &[S]) -> String {
    Redactor::new(patterns).redact(text)
}
