//! CLI command definitions and dispatch.

pub mod send;
pub mod watch;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use sentinel_core::config::AppConfig;
use sentinel_core::error::AppError;
use sentinel_realtime::ClientConfig;

/// Sentinel: live test results from the dashboard feed
#[derive(Debug, Parser)]
#[command(name = "sentinel", version, about, long_about = None)]
pub struct Cli {
    /// Path to a configuration file; defaults to config/default.toml plus the env overlay
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Environment overlay to load when no file is given
    #[arg(long, env = "SENTINEL_ENV", default_value = "development", global = true)]
    pub env: String,

    /// WebSocket endpoint, overriding the configured one
    #[arg(short, long, global = true)]
    pub url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Stream live events until interrupted
    Watch(watch::WatchArgs),
    /// Send one message and exit
    Send(send::SendArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = self.client_config()?;
        match &self.command {
            Commands::Watch(args) => watch::execute(args, config, self.format).await,
            Commands::Send(args) => send::execute(args, config, self.format).await,
        }
    }

    /// Resolve the client configuration from file, environment, and flags
    fn client_config(&self) -> Result<ClientConfig, AppError> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::load(&self.env)?,
        };

        if let Some(url) = &self.url {
            config.client.url = url.clone();
            config.client.validate()?;
        }

        tracing::debug!(
            url = %config.client.url,
            overridden = self.url.is_some(),
            max_reconnect_attempts = config.client.max_reconnect_attempts,
            "Resolved client configuration"
        );
        Ok(ClientConfig::from(&config.client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_send_command() {
        let cli = Cli::try_parse_from([
            "sentinel",
            "--format",
            "json",
            "send",
            "--url",
            "ws://localhost:9000/ws",
            "--type",
            "test",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.url.as_deref(), Some("ws://localhost:9000/ws"));
        match cli.command {
            Commands::Send(args) => {
                assert_eq!(args.kind, "test");
                assert!(args.payload.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_url_override_is_applied() {
        let cli = Cli::try_parse_from(["sentinel", "watch", "--url", "ws://10.0.0.5:4000/ws"]).unwrap();

        let config = cli.client_config().unwrap();

        assert_eq!(config.url, "ws://10.0.0.5:4000/ws");
        assert!(logs_contain("Resolved client configuration"));
    }

    #[test]
    fn test_url_override_is_validated() {
        let cli = Cli::try_parse_from(["sentinel", "--url", "http://nope", "watch"]).unwrap();
        assert!(cli.client_config().is_err());
    }
}
