//! CLI command: `opspilot plan`
//!
//! Reads context and evidence JSON files, runs one planning request and
//! prints the raw model text. Ctrl-C cancels the in-flight provider call.

use super::PlanArgs;
use crate::config::AppConfig;
use anyhow::{Context, Result};
use opspilot_llm::Router;
use serde_json::Value;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run the plan subcommand.
pub async fn run(args: PlanArgs, config: AppConfig) -> Result<()> {
    let context = read_json(args.context.as_deref())?;
    let evidence = read_json(args.evidence.as_deref())?;

    let router = Router::new(config.llm);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling plan request");
            on_interrupt.cancel();
        }
    });

    let text = router
        .plan_with_cancel(&args.intent, &context, &evidence, &cancel)
        .await
        .context("Planning request failed")?;

    info!(bytes = text.len(), "plan received");
    println!("{text}");
    Ok(())
}

/// Parse a JSON file; no path means `null`
fn read_json(path: Option<&Path>) -> Result<Value> {
    let Some(path) = path else {
        return Ok(Value::Null);
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}
