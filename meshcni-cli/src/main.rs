//! meshcni -- command-line entry point
//!
//! Loads `meshcni.toml`, initialises logging and dispatches to the
//! subcommand handlers. Errors are printed to stderr and mapped to
//! process exit codes by [`CliError::exit_code`].

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::path::Path;

use clap::Parser;
use colored::Colorize;
use tracing::{info, warn};

use meshcni_core::config::{GeneralConfig, MeshcniConfig};
use meshcni_core::error::{ConfigError, MeshcniError};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            e.exit_code()
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);

    let command = match cli.command {
        // config 하위 명령은 설정 파일 자체를 검사하므로 기본 로깅 설정으로 시작
        Commands::Config(args) => {
            let mut general = GeneralConfig::default();
            if let Some(level) = cli.log_level {
                general.log_level = level;
            }
            logging::init_tracing(&general)?;
            return commands::config::execute(args, &cli.config, &writer).await;
        }
        command => command,
    };

    let (mut config, file_missing) = load_config(&cli.config).await?;
    if let Some(level) = cli.log_level {
        config.general.log_level = level;
    }
    logging::init_tracing(&config.general)?;
    meshcni_core::metrics::describe_all();

    if file_missing {
        warn!(
            path = %cli.config.display(),
            "config file not found, using built-in defaults"
        );
    }
    info!(config = %cli.config.display(), "meshcni starting");

    match command {
        Commands::Resolve(args) => commands::resolve::execute(args, &config, &writer).await,
        Commands::Render(args) => commands::render::execute(args, &config, &writer).await,
        Commands::Redirect(args) => commands::redirect::execute(args, &config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}

/// Load the configuration file, falling back to defaults (plus env overrides)
/// when the file does not exist.
async fn load_config(path: &Path) -> Result<(MeshcniConfig, bool), CliError> {
    match MeshcniConfig::load(path).await {
        Ok(config) => Ok((config, false)),
        Err(MeshcniError::Config(ConfigError::FileNotFound { .. })) => {
            let mut config = MeshcniConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok((config, true))
        }
        Err(e) => Err(e.into()),
    }
}
