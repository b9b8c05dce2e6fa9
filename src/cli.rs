//! CLI argument parsing with subcommand architecture.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "chub-relay",
    version,
    about = "Local relay that routes chat-completion requests to per-profile LLM providers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the relay server (default when no subcommand is given)
    Run(RunArgs),
    /// Write a starter config file
    Init(InitArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to config file
    #[arg(short, long, default_value = "config.yaml", env = "RELAY_CONFIG")]
    pub config: String,

    /// Listen host
    #[arg(long, env = "RELAY_HOST")]
    pub host: Option<String>,

    /// Listen port
    #[arg(long, env = "RELAY_PORT")]
    pub port: Option<u16>,

    /// Log level
    #[arg(long, default_value = "info", env = "RELAY_LOG_LEVEL")]
    pub log_level: String,

    /// Log full outbound payloads (at debug level)
    #[arg(long)]
    pub verbose: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            config: "config.yaml".to_string(),
            host: None,
            port: None,
            log_level: "info".to_string(),
            verbose: false,
        }
    }
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Where to write the starter config
    #[arg(short, long, default_value = "config.yaml", env = "RELAY_CONFIG")]
    pub config: String,
}
