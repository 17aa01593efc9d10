//! CLI module for Opspilot
//!
//! Provides commands:
//! - `plan`: run one planning request and print the model's text
//! - `auth`: manage stored credential profiles

use crate::config::AppConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod auth;
pub mod plan;

/// Opspilot planning gateway CLI
#[derive(Parser, Debug)]
#[command(name = "opspilot")]
#[command(about = "LLM planning gateway for operations automation")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Propose a plan for an operator intent
    Plan(PlanArgs),
    /// Manage stored credential profiles
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// What the operator wants done
    #[arg(long)]
    pub intent: String,
    /// JSON file with collected context
    #[arg(long)]
    pub context: Option<PathBuf>,
    /// JSON file with collected evidence
    #[arg(long)]
    pub evidence: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// List stored profiles
    List,
    /// Import the Codex CLI login session
    ImportNative {
        /// Session file (default: $CODEX_HOME/auth.json or ~/.codex/auth.json)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Make the imported profile the provider default
        #[arg(long)]
        default: bool,
    },
    /// Import from a third-party agent credential export
    Import {
        /// Export file (default: discovered under the agent state directory)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Provider to import
        #[arg(long, default_value = opspilot_llm::auth::tolerant::DEFAULT_PROVIDER)]
        provider: String,
        /// Exact profile id to import
        #[arg(long)]
        profile: Option<String>,
        /// Make the imported profile the provider default
        #[arg(long)]
        default: bool,
    },
    /// Set the default profile for a provider
    Use {
        /// Provider name
        provider: String,
        /// Profile id
        profile_id: String,
    },
    /// Delete a stored profile
    Remove {
        /// Profile id
        profile_id: String,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Plan(args)) => plan::run(args, config).await,
        Some(Commands::Auth { command }) => auth::run(command, &config),
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_parse_plan() {
        let cli = Cli::try_parse_from([
            "opspilot",
            "plan",
            "--intent",
            "restart payment-api",
            "--context",
            "ctx.json",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Plan(args)) => {
                assert_eq!(args.intent, "restart payment-api");
                assert_eq!(args.context, Some(PathBuf::from("ctx.json")));
                assert!(args.evidence.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_auth_import_defaults() {
        let cli = Cli::try_parse_from(["opspilot", "auth", "import", "--default"]).unwrap();
        match cli.command {
            Some(Commands::Auth {
                command:
                    AuthCommand::Import {
                        path,
                        provider,
                        profile,
                        default,
                    },
            }) => {
                assert!(path.is_none());
                assert_eq!(provider, "openai-codex");
                assert!(profile.is_none());
                assert!(default);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_auth_use() {
        let cli = Cli::try_parse_from(["opspilot", "auth", "use", "openai", "openai:work"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Auth { command: AuthCommand::Use { ref provider, ref profile_id } })
                if provider == "openai" && profile_id == "openai:work"
        ));
    }
}
