//! Prerequisite lifecycle manager for the required CLI extension
//!
//! Tracks whether the extension the deploy flow depends on is installed,
//! driving an external query/install collaborator and publishing status
//! through a watch channel. The manager is the single writer of
//! [`ExtensionStatus`]; the presentation layer only reads.
//!
//! Collaborator faults are never fatal: every failure becomes the
//! `error` field of the published status.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::exec::CommandBridge;
use crate::{Config, Result};

/// How long a successful install keeps `show_success` raised.
const SUCCESS_DISPLAY: Duration = Duration::from_secs(3);

/// Fallback message when a status check reports not-installed without detail.
const DEFAULT_CHECK_ERROR: &str = "Extension is not installed";

/// Fallback message when an install fails without detail.
const DEFAULT_INSTALL_ERROR: &str = "Extension installation failed";

/// Observable state of the required extension.
///
/// `installed` is tri-state: `None` until the first check completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionStatus {
    /// Whether the extension is installed; `None` while unchecked.
    pub installed: Option<bool>,
    /// Whether an install is currently running.
    pub installing: bool,
    /// Last check/install failure, if any.
    pub error: Option<String>,
    /// Raised briefly after a successful install.
    pub show_success: bool,
}

/// Result contract of the external status query.
#[derive(Debug, Clone, Default)]
pub struct CheckOutcome {
    pub installed: bool,
    pub error: Option<String>,
}

/// Result contract of the external install operation.
#[derive(Debug, Clone, Default)]
pub struct InstallOutcome {
    pub success: bool,
    pub error: Option<String>,
}

/// External collaborator that queries and installs the extension.
#[async_trait]
pub trait ExtensionClient: Send + Sync {
    /// Query whether the extension is installed.
    async fn is_installed(&self) -> Result<CheckOutcome>;

    /// Install the extension.
    async fn install(&self) -> Result<InstallOutcome>;
}

/// Lifecycle manager for the required extension.
///
/// Overlapping `check`/`install` invocations on one manager are rejected
/// by a single-flight guard rather than allowed to race; the rejected
/// call returns `false` and leaves the published state untouched.
pub struct ExtensionManager {
    client: Arc<dyn ExtensionClient>,
    status: Arc<watch::Sender<ExtensionStatus>>,
    busy: AtomicBool,
}

impl ExtensionManager {
    /// Build a manager in the unchecked initial state.
    ///
    /// No check runs until [`check`](Self::check) is called; use
    /// [`start`](Self::start) to kick off the initial check automatically.
    pub fn new(client: Arc<dyn ExtensionClient>) -> Self {
        let (status, _) = watch::channel(ExtensionStatus::default());
        Self {
            client,
            status: Arc::new(status),
            busy: AtomicBool::new(false),
        }
    }

    /// Build a manager and run the initial status check in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(client: Arc<dyn ExtensionClient>) -> Arc<Self> {
        let manager = Arc::new(Self::new(client));
        let initial = Arc::clone(&manager);
        tokio::spawn(async move {
            initial.check().await;
        });
        manager
    }

    /// Snapshot of the current status.
    pub fn status(&self) -> ExtensionStatus {
        self.status.borrow().clone()
    }

    /// Subscribe to status updates (read-only).
    pub fn subscribe(&self) -> watch::Receiver<ExtensionStatus> {
        self.status.subscribe()
    }

    fn begin_operation(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn finish_operation(&self) {
        self.busy.store(false, Ordering::Release);
    }

    /// Query the extension status and publish the result.
    ///
    /// Returns `false` if another check/install was already in flight.
    pub async fn check(&self) -> bool {
        if !self.begin_operation() {
            debug!("extension check skipped, another operation in flight");
            return false;
        }

        let outcome = self.client.is_installed().await;
        self.status.send_modify(|status| match &outcome {
            Ok(check) if check.installed => {
                status.installed = Some(true);
                status.error = None;
            }
            Ok(check) => {
                status.installed = Some(false);
                status.error = Some(
                    check
                        .error
                        .clone()
                        .unwrap_or_else(|| DEFAULT_CHECK_ERROR.to_string()),
                );
            }
            Err(e) => {
                warn!(error = %e, "extension status check failed");
                status.installed = Some(false);
                status.error = Some(format!("Failed to check extension status: {}", e));
            }
        });

        self.finish_operation();
        true
    }

    /// Install the extension and publish the result.
    ///
    /// Returns `false` if another check/install was already in flight.
    /// On success `show_success` is raised and autonomously reset after
    /// a fixed delay; the reset timer is fire-and-forget and is not
    /// cancelled by later operations.
    pub async fn install(&self) -> bool {
        if !self.begin_operation() {
            debug!("extension install skipped, another operation in flight");
            return false;
        }

        self.status.send_modify(|status| {
            status.installing = true;
            status.error = None;
        });

        match self.client.install().await {
            Ok(outcome) if outcome.success => {
                self.status.send_modify(|status| {
                    status.installed = Some(true);
                    status.error = None;
                    status.show_success = true;
                });
                let status = Arc::clone(&self.status);
                tokio::spawn(async move {
                    tokio::time::sleep(SUCCESS_DISPLAY).await;
                    status.send_modify(|status| status.show_success = false);
                });
            }
            Ok(outcome) => {
                self.status.send_modify(|status| {
                    status.error = Some(
                        outcome
                            .error
                            .unwrap_or_else(|| DEFAULT_INSTALL_ERROR.to_string()),
                    );
                });
            }
            Err(e) => {
                warn!(error = %e, "extension install failed");
                self.status.send_modify(|status| {
                    status.error = Some(format!("Failed to install extension: {}", e));
                });
            }
        }

        // Always the operation's last state change.
        self.status.send_modify(|status| status.installing = false);
        self.finish_operation();
        true
    }

    /// Clear the published error; `installed` and `installing` are untouched.
    pub fn clear_error(&self) {
        self.status.send_modify(|status| status.error = None);
    }
}

/// Extension collaborator that drives the wrapped CLI through the bridge.
///
/// Only the result contracts matter here: stdout with no stderr means the
/// extension is present; a stderr that merely says the extension is
/// missing is a clean not-installed answer, anything else is a failure.
pub struct CliExtensionClient {
    bridge: CommandBridge,
    cli_path: String,
    extension: String,
}

impl CliExtensionClient {
    pub fn new(bridge: CommandBridge, config: &Config) -> Self {
        Self {
            bridge,
            cli_path: config.cli_path.clone(),
            extension: config.extension_name.clone(),
        }
    }
}

#[async_trait]
impl ExtensionClient for CliExtensionClient {
    async fn is_installed(&self) -> Result<CheckOutcome> {
        let result = self
            .bridge
            .execute(
                &self.cli_path,
                &[
                    "extension",
                    "show",
                    "--name",
                    &self.extension,
                    "--output",
                    "json",
                ],
            )
            .await;

        if result.stderr.is_empty() {
            Ok(CheckOutcome {
                installed: !result.stdout.trim().is_empty(),
                error: None,
            })
        } else if result.stderr.contains("not installed") || result.stderr.contains("not found") {
            Ok(CheckOutcome {
                installed: false,
                error: None,
            })
        } else {
            Ok(CheckOutcome {
                installed: false,
                error: Some(result.stderr.trim().to_string()),
            })
        }
    }

    async fn install(&self) -> Result<InstallOutcome> {
        let result = self
            .bridge
            .execute(
                &self.cli_path,
                &["extension", "add", "--name", &self.extension],
            )
            .await;

        if result.stderr.is_empty() {
            Ok(InstallOutcome {
                success: true,
                error: None,
            })
        } else {
            Ok(InstallOutcome {
                success: false,
                error: Some(result.stderr.trim().to_string()),
            })
        }
    }
}
