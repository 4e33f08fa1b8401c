//! `DbConn` CLI - Command-line driver for the `DbConn` connection coordinator
//!
//! Replays scenarios against the connections manager running over in-memory
//! collaborators, and manages the settings file.

mod replay;
mod scenario;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use dbconn_core::config::ConfigManager;
use dbconn_core::AppSettings;
use tracing_subscriber::EnvFilter;

use crate::replay::{replay, ReplayOptions};
use crate::scenario::Scenario;

/// `DbConn` command-line interface
#[derive(Parser)]
#[command(name = "dbconn-cli")]
#[command(author, version, about = "DbConn command-line interface")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Replay a scenario file
    #[command(about = "Replay a connection scenario against the coordinator")]
    Replay {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Output format for the report
        #[arg(short, long, default_value = "text", value_enum)]
        format: OutputFormat,

        /// Do not restore connections automatically on session updates
        #[arg(long)]
        no_watch: bool,
    },

    /// Manage the settings file
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Settings file commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective settings
    Show,

    /// Write default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Output format for replay reports
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON document
    Json,
}

/// Exit codes for CLI operations
pub mod exit_codes {
    /// Success - operation completed successfully
    pub const SUCCESS: i32 = 0;
    /// General error - configuration, scenario or IO errors
    pub const GENERAL_ERROR: i32 = 1;
    /// One or more replay steps failed
    pub const STEPS_FAILED: i32 = 3;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid or unreadable scenario
    #[error("Scenario error: {0}")]
    Scenario(String),

    /// Replay finished with failed steps
    #[error("{0} step(s) failed")]
    StepsFailed(usize),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Returns the exit code for this error type.
    ///
    /// Exit codes:
    /// - 1: General error (configuration, scenario, IO)
    /// - 3: Replay completed but some steps failed
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::StepsFailed(_) => exit_codes::STEPS_FAILED,
            Self::Config(_) | Self::Scenario(_) | Self::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }
}

impl From<dbconn_core::ConfigError> for CliError {
    fn from(e: dbconn_core::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Replay {
            scenario,
            format,
            no_watch,
        } => cmd_replay(cli.config.as_deref(), &scenario, format, no_watch),
        Commands::Config(ConfigCommands::Show) => cmd_config_show(cli.config.as_deref()),
        Commands::Config(ConfigCommands::Init { force }) => {
            cmd_config_init(cli.config.as_deref(), force)
        }
    };

    match result {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

/// Loads settings from the explicit file, or the default location
fn load_settings(config: Option<&Path>) -> Result<AppSettings, CliError> {
    let settings = match config {
        Some(path) => ConfigManager::load_settings_from(path)?,
        None => ConfigManager::new()?.load_settings()?,
    };
    Ok(settings)
}

/// Installs the log subscriber; `RUST_LOG` overrides the configured level
fn init_tracing(settings: &AppSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(settings.logging.ansi)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Replay command handler
fn cmd_replay(
    config: Option<&Path>,
    scenario_path: &Path,
    format: OutputFormat,
    no_watch: bool,
) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    init_tracing(&settings);

    let scenario = Scenario::load(scenario_path)?;
    let options = ReplayOptions::from_settings(&settings, no_watch);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(replay(&scenario, options));

    match format {
        OutputFormat::Text => print!("{}", report.to_text()),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| CliError::Scenario(format!("Failed to serialize report: {e}")))?;
            println!("{json}");
        }
    }

    match report.failed_steps() {
        0 => Ok(()),
        failed => Err(CliError::StepsFailed(failed)),
    }
}

/// Config show command handler
fn cmd_config_show(config: Option<&Path>) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let path = settings_path(config)?;
    let content = toml::to_string_pretty(&settings)
        .map_err(|e| CliError::Config(format!("Failed to serialize settings: {e}")))?;

    println!("# {}", path.display());
    print!("{content}");
    Ok(())
}

/// Config init command handler
fn cmd_config_init(config: Option<&Path>, force: bool) -> Result<(), CliError> {
    let settings = AppSettings::default();

    let path = match config {
        Some(path) => {
            if path.exists() && !force {
                return Err(already_exists(path));
            }
            ConfigManager::save_settings_to(path, &settings)?;
            path.to_path_buf()
        }
        None => {
            let manager = ConfigManager::new()?;
            let path = manager.settings_path();
            if path.exists() && !force {
                return Err(already_exists(&path));
            }
            manager.save_settings(&settings)?;
            path
        }
    };

    println!("Wrote default settings to {}", path.display());
    Ok(())
}

fn settings_path(config: Option<&Path>) -> Result<PathBuf, CliError> {
    match config {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(ConfigManager::new()?.settings_path()),
    }
}

fn already_exists(path: &Path) -> CliError {
    CliError::Config(format!(
        "{} already exists (use --force to overwrite)",
        path.display()
    ))
}
