pub mod ask;
pub mod config;

use clap::{Parser, Subcommand};

/// CareerPath: a career-assistant agent for job seekers.
#[derive(Debug, Parser)]
#[command(name = "careerpath", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default when no subcommand is given).
    Serve,
    /// Ask a single question and print the answer.
    Ask {
        /// The question to ask.
        query: String,
        /// User the profile belongs to (defaults to `memory.default_user_id`).
        #[arg(long)]
        user: Option<String>,
        /// Continue an existing thread instead of starting a new one.
        #[arg(long)]
        thread: Option<String>,
        /// Print every stream payload as one JSON line.
        #[arg(long)]
        json: bool,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `CP_CONFIG` (or `config.toml`).
/// A missing file yields the defaults. Returns the config and the path used.
pub fn load_config() -> anyhow::Result<(cp_domain::config::Config, String)> {
    let config_path = std::env::var("CP_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        cp_domain::config::Config::default()
    };

    Ok((config, config_path))
}
