//! CLI command definitions and dispatch
//!
//! The binary stands in for the graphical deploy flow: it assembles
//! manifests, checks the extension prerequisite, and renders command
//! diagnostics to the terminal.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use crate::apply;
use crate::exec::CommandBridge;
use crate::extension::{CliExtensionClient, ExtensionManager, ExtensionStatus};
use crate::manifest::{combine, UploadedManifest};
use crate::{Config, Error, Result};

/// deckhand - prepare and apply Kubernetes manifests
#[derive(Parser, Debug)]
#[command(name = "deckhand")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Combine manifest files into one multi-document manifest
    Combine(CombineArgs),
    /// Apply a manifest to a cluster context
    Apply(ApplyArgs),
    /// Manage the required CLI extension
    Extension {
        #[command(subcommand)]
        command: ExtensionCommands,
    },
}

#[derive(Args, Debug)]
pub struct CombineArgs {
    /// Manifest files, in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Existing manifest to prepend
    #[arg(long)]
    pub into: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Manifest file to apply
    pub file: PathBuf,

    /// Target cluster context
    #[arg(long)]
    pub context: String,

    /// Namespace stamped onto every resource before apply
    #[arg(long)]
    pub namespace: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ExtensionCommands {
    /// Query the extension install status
    Status,
    /// Install the extension
    Install,
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Combine(args) => run_combine(args),
            Commands::Apply(args) => run_apply(args).await,
            Commands::Extension { command } => run_extension(command).await,
        }
    }
}

fn run_combine(args: CombineArgs) -> Result<()> {
    let existing = match &args.into {
        Some(path) => std::fs::read_to_string(path)?,
        None => String::new(),
    };

    let mut uploads = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        uploads.push(UploadedManifest::new(name, std::fs::read_to_string(path)?));
    }

    println!("{}", combine(&existing, &uploads));
    Ok(())
}

async fn run_apply(args: ApplyArgs) -> Result<()> {
    let config = Config::from_env();
    let bridge = CommandBridge::default();
    let manager = ExtensionManager::new(Arc::new(CliExtensionClient::new(
        bridge.clone(),
        &config,
    )));

    manager.check().await;
    let status = manager.status();
    if status.installed != Some(true) {
        let detail = status
            .error
            .unwrap_or_else(|| "extension status unknown".to_string());
        return Err(Error::command_failed(format!(
            "extension '{}' is not installed ({}); run `deckhand extension install`",
            config.extension_name, detail
        )));
    }

    let manifest = std::fs::read_to_string(&args.file)?;
    let result = apply::apply_manifest(
        &bridge,
        &config,
        &manifest,
        &args.context,
        args.namespace.as_deref(),
    )
    .await?;

    if !result.stdout.is_empty() {
        print!("{}", result.stdout);
    }
    if !result.stderr.is_empty() {
        eprint!("{}", result.stderr);
        return Err(Error::command_failed("apply reported errors"));
    }
    Ok(())
}

async fn run_extension(command: ExtensionCommands) -> Result<()> {
    let config = Config::from_env();
    let bridge = CommandBridge::default();
    let manager = ExtensionManager::new(Arc::new(CliExtensionClient::new(
        bridge.clone(),
        &config,
    )));

    match command {
        ExtensionCommands::Status => {
            manager.check().await;
            render_status(&config, &manager.status());
        }
        ExtensionCommands::Install => {
            manager.install().await;
            let status = manager.status();
            render_status(&config, &status);
            if status.installed != Some(true) {
                return Err(Error::command_failed("extension install failed"));
            }
        }
    }
    Ok(())
}

fn render_status(config: &Config, status: &ExtensionStatus) {
    let installed = match status.installed {
        Some(true) => "installed",
        Some(false) => "not installed",
        None => "unknown",
    };
    println!("extension: {}", config.extension_name);
    println!("status: {}", installed);
    if let Some(error) = &status.error {
        println!("error: {}", error);
    }
}
