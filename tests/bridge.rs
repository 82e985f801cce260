//! Bridge integration tests against real processes.

use std::time::Duration;

use deckhand::CommandBridge;

/// Every bridge call must resolve within a bounded wait, whatever the
/// command; a hang here is a contract violation.
async fn execute_bounded(bridge: &CommandBridge, program: &str, args: &[&str]) -> deckhand::CommandResult {
    tokio::time::timeout(Duration::from_secs(30), bridge.execute(program, args))
        .await
        .expect("bridge call did not resolve within the test timeout")
}

#[tokio::test]
async fn captures_stdout_in_emission_order() {
    let bridge = CommandBridge::default();
    let result = execute_bounded(&bridge, "sh", &["-c", "printf one; printf ' two'"]).await;
    assert_eq!(result.stdout, "one two");
    assert_eq!(result.stderr, "");
}

#[tokio::test]
async fn clean_exit_keeps_process_stderr_verbatim() {
    let bridge = CommandBridge::default();
    let result = execute_bounded(&bridge, "sh", &["-c", "printf warning >&2"]).await;
    assert_eq!(result.stdout, "");
    assert_eq!(result.stderr, "warning");
}

#[tokio::test]
async fn silent_nonzero_exit_synthesizes_message() {
    let bridge = CommandBridge::default();
    let result = execute_bounded(&bridge, "sh", &["-c", "exit 3"]).await;
    assert_eq!(result.stderr, "Command exited with code 3");
}

#[tokio::test]
async fn nonzero_exit_with_stderr_is_not_overwritten() {
    let bridge = CommandBridge::default();
    let result = execute_bounded(&bridge, "sh", &["-c", "printf broken >&2; exit 1"]).await;
    assert_eq!(result.stderr, "broken");
}

#[tokio::test]
async fn missing_executable_resolves_with_error_text() {
    let bridge = CommandBridge::default();
    let result = execute_bounded(&bridge, "/nonexistent/deckhand-test-tool", &[]).await;
    assert!(result.stdout.is_empty());
    assert!(!result.stderr.is_empty());
}

#[tokio::test]
async fn concurrent_calls_own_independent_processes() {
    let bridge = CommandBridge::default();
    let (a, b) = tokio::join!(
        execute_bounded(&bridge, "sh", &["-c", "printf alpha"]),
        execute_bounded(&bridge, "sh", &["-c", "printf beta"]),
    );
    assert_eq!(a.stdout, "alpha");
    assert_eq!(b.stdout, "beta");
}

#[tokio::test]
async fn large_output_is_fully_accumulated() {
    let bridge = CommandBridge::default();
    let result = execute_bounded(
        &bridge,
        "sh",
        &["-c", "i=0; while [ $i -lt 2000 ]; do echo line-$i; i=$((i+1)); done"],
    )
    .await;
    assert_eq!(result.stdout.lines().count(), 2000);
    assert!(result.stdout.starts_with("line-0\n"));
    assert!(result.stdout.ends_with("line-1999\n"));
}
