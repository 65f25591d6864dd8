//! Models command - manage pretrained detection models.

use anyhow::Result;
use clap::{Args, Subcommand};
use cnstd_adapters::models::{
    all_models_installed, ensure_models, list_models as adapter_list_models,
};
use cnstd_adapters::models_dir;
use cnstd_core::find_model;

use crate::output::DownloadProgress;

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// Download and unpack models (the configured backbone, else all published models)
    Fetch {
        /// Model names, e.g. db_resnet18
        names: Vec<String>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },
    /// List published models and whether they are installed
    List,
    /// Print model directory path
    Path,
}

/// Run the models command.
///
/// `default_backbone` is fetched when `models fetch` gets no names; without
/// it every published model is fetched.
pub fn run(args: &ModelsArgs, default_backbone: Option<&str>) -> Result<()> {
    match &args.command {
        ModelsCommand::Fetch { names, quiet } => {
            fetch_models(&fetch_selection(names, default_backbone), *quiet)
        }
        ModelsCommand::List => {
            list_models();
            Ok(())
        }
        ModelsCommand::Path => {
            println!("{}", models_dir().display());
            Ok(())
        }
    }
}

/// Names to fetch; an empty list means all published models.
fn fetch_selection(names: &[String], default_backbone: Option<&str>) -> Vec<String> {
    match (names.is_empty(), default_backbone) {
        (true, Some(backbone)) => vec![backbone.to_string()],
        _ => names.to_vec(),
    }
}

fn fetch_models(names: &[String], quiet: bool) -> Result<()> {
    let progress = DownloadProgress::new(quiet);
    let dirs = ensure_models(names, &progress)?;
    for dir in &dirs {
        println!("{}", dir.display());
    }
    Ok(())
}

fn list_models() {
    let models = adapter_list_models();

    println!("Models directory: {}", models_dir().display());
    println!();

    for (name, installed) in &models {
        let status = if *installed { "✓" } else { "✗" };
        let file = find_model(name).map_or_else(|| "unknown".to_string(), |m| m.params_file());
        println!("  {status} {name} ({file})");
    }

    println!();
    let installed_count = models.iter().filter(|(_, installed)| *installed).count();
    println!("{}/{} models installed", installed_count, models.len());
    if !all_models_installed() {
        println!("Run `cnstd models fetch` to download the missing models");
    }
}
