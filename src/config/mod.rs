//! Application configuration

mod loader;

pub use loader::{load_config, DEFAULT_CONFIG};

use opspilot_llm::RouterConfig;
use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Planning gateway settings
    #[serde(default)]
    pub llm: RouterConfig,
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl AppConfig {
    /// Whether logs should be emitted as JSON lines
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}
