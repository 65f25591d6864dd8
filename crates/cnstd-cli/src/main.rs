//! cnstd CLI - model cache, checksum and checkpoint tooling.

use clap::Parser;
use cnstd_adapters::{set_models_dir, set_repo_url};
use cnstd_core::{DeviceSpec, MODEL_VERSION};
use tracing::{debug, warn};

mod commands;
mod config;
mod logging;
mod output;

use commands::{Cli, Commands, ExitCode};
use config::{emit_notes, AppConfig};
use logging::{init_logging, LogSettings};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let (config, config_notes) = AppConfig::load();

    let settings = LogSettings {
        verbose: cli.verbose,
        level: config.logging.level.clone(),
        file: cli.log_file.clone().or_else(|| config.logging.file.clone()),
        file_level: config.logging.file_level.clone(),
    };
    // Held until exit so buffered file logs are flushed.
    let _guard = match init_logging(&settings) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::Error.into();
        }
    };
    emit_notes(&config_notes);

    apply_model_settings(&cli, &config);
    let device = resolve_device(&cli, &config);
    debug!("Using device {device}");

    let result = match cli.command {
        Commands::Models(ref args) => {
            commands::models::run(args, config.models.backbone.as_deref())
                .map(|()| ExitCode::Success)
        }
        Commands::Download(ref args) => commands::download::run(args).map(|()| ExitCode::Success),
        Commands::Verify(ref args) => commands::verify::run(args),
        Commands::Charset(ref args) => commands::charset::run(args).map(|()| ExitCode::Success),
        Commands::Checkpoint(ref args) => {
            commands::checkpoint::run(args, device).map(|()| ExitCode::Success)
        }
        Commands::Image(ref args) => {
            commands::image::run(args, device).map(|()| ExitCode::Success)
        }
    };

    let exit_code = result.unwrap_or_else(|e| {
        eprintln!("error: {e:#}");
        ExitCode::Error
    });
    exit_code.into()
}

/// Models directory: `--models-dir`, then `[models] dir`, then
/// `[general] data_dir`, then the environment/default.
fn apply_model_settings(cli: &Cli, config: &AppConfig) {
    let dir = cli
        .models_dir
        .clone()
        .or_else(|| config.models.dir.clone())
        .or_else(|| {
            config
                .general
                .data_dir
                .as_ref()
                .map(|d| d.join(MODEL_VERSION))
        });
    if dir.is_some() {
        set_models_dir(dir);
    }
    if config.models.repo_url.is_some() {
        set_repo_url(config.models.repo_url.clone());
    }
}

/// Device: `--device`, then `[inference] device`, then CPU.
fn resolve_device(cli: &Cli, config: &AppConfig) -> DeviceSpec {
    if let Some(device) = cli.device {
        return device;
    }
    match config.inference.device.as_deref().map(str::parse::<DeviceSpec>) {
        Some(Ok(device)) => device,
        Some(Err(e)) => {
            warn!("{e}");
            DeviceSpec::default()
        }
        None => DeviceSpec::default(),
    }
}
