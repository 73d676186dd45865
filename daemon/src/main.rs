//! `dao` — run governance scenarios against an in-memory marketplace and
//! membership registry.

use anyhow::Context;
use clap::Parser;
use dao_daemon::{DaoConfig, ScenarioRunner};
use dao_utils::LogFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dao", about = "DAO acquisition engine scenario runner")]
struct Cli {
    /// Log level: "trace", "debug", "info", "warn", "error".
    /// Defaults to the config file's `log_level`.
    #[arg(long, global = true, env = "DAO_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json". Defaults to the config file's `log_format`.
    #[arg(long, global = true, env = "DAO_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Build the DAO from a config file and run its steps.
    Run {
        /// Path to the TOML configuration.
        #[arg(long, short, env = "DAO_CONFIG")]
        config: PathBuf,

        /// Print the final report as JSON instead of text.
        #[arg(long)]
        json: bool,

        /// Exit with an error if any step fails.
        #[arg(long)]
        strict: bool,
    },
    /// Validate a config file and print it back with defaults filled in.
    CheckConfig {
        #[arg(long, short, env = "DAO_CONFIG")]
        config: PathBuf,
    },
}

impl Command {
    fn config_path(&self) -> &PathBuf {
        match self {
            Command::Run { config, .. } | Command::CheckConfig { config } => config,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path = cli.command.config_path();
    let config = DaoConfig::from_toml_file(path)
        .with_context(|| format!("loading {}", path.display()))?;

    dao_utils::init_logging(
        cli.log_format.unwrap_or(config.log_format),
        cli.log_level.as_deref().unwrap_or(&config.log_level),
    );
    tracing::info!("Loaded config from {}", path.display());

    match cli.command {
        Command::Run { json, strict, .. } => {
            let runner = ScenarioRunner::from_config(&config)?;
            let report = if strict {
                runner.run_strict(&config.steps)?
            } else {
                runner.run(&config.steps)
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{report}");
            }
        }
        Command::CheckConfig { .. } => {
            print!("{}", config.to_toml_string()?);
        }
    }
    Ok(())
}
