//! deckhand - manifest preparation and gated apply for Kubernetes clients
//!
//! deckhand is the deployment core of a desktop Kubernetes client: it
//! assembles uploaded manifests into one multi-document payload, stamps a
//! target namespace across resources (including `*List` collections),
//! tracks whether a required CLI extension is installed, and applies the
//! payload to a cluster by shelling out to `kubectl`.
//!
//! # Architecture
//!
//! - [`exec`] - command execution bridge; the only component that spawns
//!   external processes, with a hard never-fails contract
//! - [`extension`] - lifecycle manager for the required CLI extension
//! - [`manifest`] - manifest assembly and namespace override transforms
//! - [`yaml`] - YAML parsing/emission over the `serde_json::Value` model
//! - [`apply`] - the apply invocation tying the pieces together
//! - [`config`] - tool paths and extension identity
//!
//! Failures never escape as faults from the core components: the bridge
//! encodes them in [`CommandResult::stderr`], the lifecycle manager in
//! [`ExtensionStatus::error`]. The presentation layer renders both as
//! diagnostic text.

pub mod apply;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod extension;
pub mod manifest;
pub mod yaml;

pub use config::Config;
pub use error::{Error, Result};
pub use exec::{CommandBridge, CommandResult};
pub use extension::{ExtensionManager, ExtensionStatus};
pub use manifest::{apply_namespace_override, combine, UploadedManifest};
