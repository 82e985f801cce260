//! Command execution bridge
//!
//! Spawns one external process per call and resolves to a structured
//! result. This is the only component permitted to spawn processes on
//! behalf of the rest of the crate.
//!
//! The bridge has a hard never-fails contract: spawn errors, nonzero
//! exits, and orchestration faults are all encoded in the returned
//! [`CommandResult`], never raised to the caller. The spawning capability
//! itself is injected via [`ProcessSpawner`] so tests can substitute a
//! scripted event source for real child processes.

use std::process::Stdio;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

/// Outcome of one external command invocation.
///
/// Always produced. When `stderr` is non-empty it is either the process's
/// own stderr output or a message synthesized by the bridge (silent
/// nonzero exit, spawn failure), never both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    /// Accumulated standard output, in emission order.
    pub stdout: String,
    /// Accumulated standard error, or a synthesized diagnostic.
    pub stderr: String,
}

/// Events emitted by a spawned process.
///
/// Chunk events preserve per-channel emission order. Exactly one terminal
/// event (`Exited` or `Failed`) ends a well-behaved stream; the bridge
/// resolves from the first terminal event it sees and ignores the rest.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    /// A chunk of standard output.
    Stdout(String),
    /// A chunk of standard error.
    Stderr(String),
    /// The process exited; `None` means it was terminated by a signal.
    Exited(Option<i32>),
    /// The runtime reported an execution failure.
    Failed(String),
}

/// Errors a [`ProcessSpawner`] can report before any process exists.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// Process execution is not available in this context.
    #[error("process execution is not available in this environment")]
    Unavailable,

    /// The spawn itself failed (executable missing, permissions, ...).
    #[error("{0}")]
    Spawn(String),
}

/// Capability for launching external processes.
pub trait ProcessSpawner: Send + Sync {
    /// Spawn `program` with `args`, returning its event stream.
    fn spawn(&self, program: &str, args: &[String])
        -> Result<mpsc::Receiver<ProcessEvent>, SpawnError>;
}

/// Production spawner backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawner;

impl ProcessSpawner for TokioSpawner {
    fn spawn(
        &self,
        program: &str,
        args: &[String],
    ) -> Result<mpsc::Receiver<ProcessEvent>, SpawnError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SpawnError::Spawn(e.to_string()))?;

        let (tx, rx) = mpsc::channel(64);
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        tokio::spawn(async move {
            // Drain both channels to EOF before reporting the terminal
            // event, so no buffered output is lost to the resolve-once
            // latch on the consuming side.
            tokio::join!(
                pump(stdout, tx.clone(), ProcessEvent::Stdout),
                pump(stderr, tx.clone(), ProcessEvent::Stderr),
            );

            let terminal = match child.wait().await {
                Ok(status) => ProcessEvent::Exited(status.code()),
                Err(e) => ProcessEvent::Failed(e.to_string()),
            };
            let _ = tx.send(terminal).await;
        });

        Ok(rx)
    }
}

/// Read one stream to EOF, forwarding chunks in emission order.
async fn pump<R: AsyncRead + Unpin>(
    reader: Option<R>,
    tx: mpsc::Sender<ProcessEvent>,
    event: fn(String) -> ProcessEvent,
) {
    let Some(mut reader) = reader else {
        return;
    };
    let mut buf = vec![0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                if tx.send(event(chunk)).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!(error = %e, "process stream read error");
                break;
            }
        }
    }
}

/// Spawner for contexts where process execution is not permitted.
///
/// Every spawn reports [`SpawnError::Unavailable`], which the bridge
/// converts into the capability-unavailable result.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSpawner;

impl ProcessSpawner for DisabledSpawner {
    fn spawn(
        &self,
        _program: &str,
        _args: &[String],
    ) -> Result<mpsc::Receiver<ProcessEvent>, SpawnError> {
        Err(SpawnError::Unavailable)
    }
}

/// The first terminal event observed for one invocation.
enum Terminal {
    Exited(Option<i32>),
    Failed(String),
}

/// Command execution bridge over an injected [`ProcessSpawner`].
#[derive(Clone)]
pub struct CommandBridge {
    spawner: Arc<dyn ProcessSpawner>,
}

impl Default for CommandBridge {
    fn default() -> Self {
        Self::new(Arc::new(TokioSpawner))
    }
}

impl CommandBridge {
    /// Build a bridge over the given spawning capability.
    pub fn new(spawner: Arc<dyn ProcessSpawner>) -> Self {
        Self { spawner }
    }

    /// Build a bridge for contexts without process execution.
    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledSpawner))
    }

    /// Run `program` with `args` and return its accumulated output.
    ///
    /// This never fails from the caller's point of view: every failure
    /// mode resolves to a [`CommandResult`] with the diagnostics in
    /// `stderr`. There is no timeout at this layer; callers wanting a
    /// bounded wait must wrap the returned future themselves.
    pub async fn execute(&self, program: &str, args: &[&str]) -> CommandResult {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        debug!(program, args = ?args, "executing external command");

        let mut events = match self.spawner.spawn(program, &args) {
            Ok(rx) => rx,
            Err(e) => {
                return CommandResult {
                    stdout: String::new(),
                    stderr: e.to_string(),
                }
            }
        };

        let mut stdout = String::new();
        let mut stderr = String::new();
        // Single-fire latch: the first terminal event resolves the call.
        // Everything after it (chunks or a second terminal) is ignored.
        let mut terminal = None;

        while let Some(event) = events.recv().await {
            match event {
                ProcessEvent::Stdout(chunk) => stdout.push_str(&chunk),
                ProcessEvent::Stderr(chunk) => stderr.push_str(&chunk),
                ProcessEvent::Exited(code) => {
                    terminal = Some(Terminal::Exited(code));
                    break;
                }
                ProcessEvent::Failed(message) => {
                    terminal = Some(Terminal::Failed(message));
                    break;
                }
            }
        }

        match terminal {
            Some(Terminal::Exited(code)) => {
                if stderr.is_empty() {
                    match code {
                        Some(0) => {}
                        Some(code) => stderr = format!("Command exited with code {}", code),
                        None => stderr = "Command terminated by signal".to_string(),
                    }
                }
                CommandResult { stdout, stderr }
            }
            Some(Terminal::Failed(message)) => CommandResult {
                stdout: String::new(),
                stderr: if message.is_empty() {
                    "command execution failed".to_string()
                } else {
                    message
                },
            },
            // The producer went away without reporting an exit. Degrade to
            // a diagnostic instead of hanging or panicking.
            None => CommandResult {
                stdout: String::new(),
                stderr: "process event stream ended without an exit status".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Spawner that replays a fixed event script for every call.
    struct ScriptedSpawner {
        events: Mutex<Vec<ProcessEvent>>,
    }

    impl ScriptedSpawner {
        fn new(events: Vec<ProcessEvent>) -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(events),
            })
        }
    }

    impl ProcessSpawner for ScriptedSpawner {
        fn spawn(
            &self,
            _program: &str,
            _args: &[String],
        ) -> Result<mpsc::Receiver<ProcessEvent>, SpawnError> {
            let events = self.events.lock().unwrap().clone();
            let (tx, rx) = mpsc::channel(16);
            tokio::spawn(async move {
                for event in events {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
            });
            Ok(rx)
        }
    }

    fn bridge_with(events: Vec<ProcessEvent>) -> CommandBridge {
        CommandBridge::new(ScriptedSpawner::new(events))
    }

    #[tokio::test]
    async fn test_accumulates_chunks_in_emission_order() {
        let bridge = bridge_with(vec![
            ProcessEvent::Stdout("one ".into()),
            ProcessEvent::Stderr("warn ".into()),
            ProcessEvent::Stdout("two".into()),
            ProcessEvent::Stderr("warn2".into()),
            ProcessEvent::Exited(Some(0)),
        ]);
        let result = bridge.execute("tool", &["arg"]).await;
        assert_eq!(result.stdout, "one two");
        assert_eq!(result.stderr, "warn warn2");
    }

    #[tokio::test]
    async fn test_clean_exit_with_no_output() {
        let bridge = bridge_with(vec![ProcessEvent::Exited(Some(0))]);
        let result = bridge.execute("tool", &[]).await;
        assert_eq!(result, CommandResult::default());
    }

    #[tokio::test]
    async fn test_synthesizes_stderr_for_silent_nonzero_exit() {
        let bridge = bridge_with(vec![ProcessEvent::Exited(Some(2))]);
        let result = bridge.execute("tool", &[]).await;
        assert_eq!(result.stderr, "Command exited with code 2");
        assert!(result.stdout.is_empty());
    }

    #[tokio::test]
    async fn test_nonzero_exit_keeps_process_stderr() {
        let bridge = bridge_with(vec![
            ProcessEvent::Stderr("real error".into()),
            ProcessEvent::Exited(Some(1)),
        ]);
        let result = bridge.execute("tool", &[]).await;
        assert_eq!(result.stderr, "real error");
    }

    #[tokio::test]
    async fn test_signal_exit_with_no_stderr() {
        let bridge = bridge_with(vec![ProcessEvent::Exited(None)]);
        let result = bridge.execute("tool", &[]).await;
        assert_eq!(result.stderr, "Command terminated by signal");
    }

    #[tokio::test]
    async fn test_execution_error_resolves_with_message() {
        let bridge = bridge_with(vec![
            ProcessEvent::Stdout("partial".into()),
            ProcessEvent::Failed("no such file or directory".into()),
        ]);
        let result = bridge.execute("tool", &[]).await;
        assert!(result.stdout.is_empty());
        assert_eq!(result.stderr, "no such file or directory");
    }

    #[tokio::test]
    async fn test_execution_error_with_empty_message() {
        let bridge = bridge_with(vec![ProcessEvent::Failed(String::new())]);
        let result = bridge.execute("tool", &[]).await;
        assert_eq!(result.stderr, "command execution failed");
    }

    #[tokio::test]
    async fn test_resolves_once_when_both_terminals_fire() {
        // Exit first, then an artificial error: the result must reflect
        // only the first terminal event.
        let bridge = bridge_with(vec![
            ProcessEvent::Exited(Some(0)),
            ProcessEvent::Failed("late error".into()),
        ]);
        let result = bridge.execute("tool", &[]).await;
        assert_eq!(result, CommandResult::default());

        // And the other way around.
        let bridge = bridge_with(vec![
            ProcessEvent::Failed("spawn error".into()),
            ProcessEvent::Exited(Some(0)),
        ]);
        let result = bridge.execute("tool", &[]).await;
        assert_eq!(result.stderr, "spawn error");
    }

    #[tokio::test]
    async fn test_chunks_after_terminal_are_ignored() {
        let bridge = bridge_with(vec![
            ProcessEvent::Stdout("kept".into()),
            ProcessEvent::Exited(Some(0)),
            ProcessEvent::Stdout("dropped".into()),
        ]);
        let result = bridge.execute("tool", &[]).await;
        assert_eq!(result.stdout, "kept");
    }

    #[tokio::test]
    async fn test_stream_ending_without_terminal_degrades() {
        let bridge = bridge_with(vec![ProcessEvent::Stdout("orphan".into())]);
        let result = bridge.execute("tool", &[]).await;
        assert!(result.stderr.contains("without an exit status"));
    }

    #[tokio::test]
    async fn test_disabled_bridge_reports_capability_unavailable() {
        let bridge = CommandBridge::disabled();
        let result = bridge.execute("kubectl", &["version"]).await;
        assert!(result.stdout.is_empty());
        assert_eq!(
            result.stderr,
            "process execution is not available in this environment"
        );
    }

    #[tokio::test]
    async fn test_spawn_error_resolves_with_error_text() {
        struct FailingSpawner;
        impl ProcessSpawner for FailingSpawner {
            fn spawn(
                &self,
                _program: &str,
                _args: &[String],
            ) -> Result<mpsc::Receiver<ProcessEvent>, SpawnError> {
                Err(SpawnError::Spawn("permission denied".into()))
            }
        }
        let bridge = CommandBridge::new(Arc::new(FailingSpawner));
        let result = bridge.execute("tool", &[]).await;
        assert_eq!(result.stderr, "permission denied");
    }
}
