//! Deploy/apply invocation
//!
//! Hands an assembled manifest to the external tool: optional namespace
//! override, temp-file handoff, one `kubectl apply` invocation through
//! the bridge. The returned [`CommandResult`] is passed back verbatim
//! for the caller to render; this layer adds no retry, no timeout, and
//! no success interpretation.

use std::io::Write;

use tempfile::NamedTempFile;
use tracing::info;

use crate::exec::{CommandBridge, CommandResult};
use crate::manifest;
use crate::{Config, Result};

/// Apply a manifest to the cluster selected by `context`.
///
/// When a namespace is given, every document in the manifest is stamped
/// with it first. The only fallible steps are the YAML pipeline and the
/// temp-file IO; the invocation itself follows the bridge's never-fails
/// contract.
pub async fn apply_manifest(
    bridge: &CommandBridge,
    config: &Config,
    manifest_text: &str,
    context: &str,
    namespace: Option<&str>,
) -> Result<CommandResult> {
    let payload = match namespace.filter(|ns| !ns.is_empty()) {
        Some(ns) => manifest::override_documents(manifest_text, Some(ns))?,
        None => manifest_text.to_string(),
    };

    let mut file = NamedTempFile::new()?;
    file.write_all(payload.as_bytes())?;
    file.flush()?;
    let path = file.path().to_string_lossy().into_owned();

    info!(
        context,
        namespace = namespace.unwrap_or_default(),
        bytes = payload.len(),
        "applying manifest"
    );

    let result = bridge
        .execute(
            &config.kubectl_path,
            &["apply", "--context", context, "-f", &path],
        )
        .await;

    Ok(result)
}
