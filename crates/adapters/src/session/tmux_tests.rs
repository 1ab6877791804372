// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

/// Random namespace for this test run so parallel `cargo test` invocations
/// cannot collide on session names.
static TEST_PREFIX: LazyLock<String> = LazyLock::new(|| {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    format!("herdt{:04x}", nanos & 0xFFFF)
});

/// Counter for generating unique session names across tests.
static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

fn adapter() -> TmuxAdapter {
    TmuxAdapter::with_prefix(TEST_PREFIX.clone())
}

/// Generate a unique session name for testing.
fn unique_name(suffix: &str) -> String {
    let id = SESSION_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", suffix, id)
}

/// Check if tmux is available on this system
fn tmux_available() -> bool {
    std::process::Command::new("tmux")
        .arg("-V")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

macro_rules! fail_if_no_tmux {
    () => {
        if !tmux_available() {
            panic!("tmux is required but not available");
        }
    };
}

// All tmux tests are serialized because some tests modify PATH which affects all others.

#[tokio::test]
#[serial(tmux)]
async fn spawn_creates_session_under_the_prefix() {
    fail_if_no_tmux!();
    let adapter = adapter();
    let name = unique_name("spawn");

    let id = adapter
        .spawn(&name, Path::new("/tmp"), "sleep 60", &[])
        .await
        .unwrap();

    assert_eq!(id, format!("{}-{}", *TEST_PREFIX, name));
    assert!(adapter.is_alive(&id).await.unwrap());

    // Cleanup
    let _ = adapter.kill(&id).await;
}

#[tokio::test]
#[serial(tmux)]
async fn spawn_sanitizes_document_sourced_names() {
    fail_if_no_tmux!();
    let adapter = adapter();
    // Agent ids come from spec frontmatter and may carry characters tmux
    // rejects in session names
    let name = format!("kid.{}:fix tests", SESSION_COUNTER.fetch_add(1, Ordering::SeqCst));

    let id = adapter
        .spawn(&name, Path::new("/tmp"), "sleep 60", &[])
        .await
        .unwrap();

    assert!(!id.contains('.'));
    assert!(!id.contains(':'));
    assert!(!id.contains(' '));
    assert!(adapter.is_alive(&id).await.unwrap());

    // Cleanup
    let _ = adapter.kill(&id).await;
}

#[tokio::test]
#[serial(tmux)]
async fn spawn_with_env_passes_environment() {
    fail_if_no_tmux!();
    let adapter = adapter();
    let name = unique_name("env");
    let env = vec![("TEST_VAR".to_string(), "test_value".to_string())];

    let id = adapter
        .spawn(&name, Path::new("/tmp"), "echo $TEST_VAR && sleep 60", &env)
        .await
        .unwrap();

    // Give the command time to execute
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    let tail = adapter.capture_tail(&id, 10).await.unwrap();
    assert!(tail.contains("test_value"));

    // Cleanup
    let _ = adapter.kill(&id).await;
}

#[tokio::test]
#[serial(tmux)]
async fn spawn_replaces_stale_session() {
    fail_if_no_tmux!();
    let adapter = adapter();
    let name = unique_name("replace");

    let first = adapter
        .spawn(&name, Path::new("/tmp"), "sleep 60", &[])
        .await
        .unwrap();
    let second = adapter
        .spawn(&name, Path::new("/tmp"), "sleep 60", &[])
        .await
        .unwrap();

    assert_eq!(first, second);
    assert!(adapter.is_alive(&second).await.unwrap());

    // Cleanup
    let _ = adapter.kill(&second).await;
}

#[tokio::test]
#[serial(tmux)]
async fn spawn_rejects_missing_cwd() {
    fail_if_no_tmux!();
    let adapter = adapter();
    let name = unique_name("badcwd");

    let result = adapter
        .spawn(&name, Path::new("/nonexistent/path"), "sleep 1", &[])
        .await;

    assert!(matches!(result, Err(SessionError::SpawnFailed(_))));
    let err = result.unwrap_err();
    assert!(
        err.to_string().contains("working directory does not exist"),
        "Expected error about working directory, got: {}",
        err
    );
}

/// The directive path the context manager and orchestrator use: type
/// literal text, then commit with Enter.
#[tokio::test]
#[serial(tmux)]
async fn write_text_then_enter_reaches_the_pane() {
    fail_if_no_tmux!();
    let adapter = adapter();
    let name = unique_name("write");

    let id = adapter
        .spawn(&name, Path::new("/tmp"), "cat", &[])
        .await
        .unwrap();

    // Give session time to start
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    // cat echoes the committed line back
    adapter.write_text(&id, "hello from the parent").await.unwrap();
    adapter.press_enter(&id).await.unwrap();

    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    let tail = adapter.capture_tail(&id, 10).await.unwrap();
    assert!(tail.contains("hello from the parent"));

    // Cleanup
    let _ = adapter.kill(&id).await;
}

#[tokio::test]
#[serial(tmux)]
async fn write_text_starting_with_dash_is_literal() {
    fail_if_no_tmux!();
    let adapter = adapter();
    let name = unique_name("dash");

    let id = adapter
        .spawn(&name, Path::new("/tmp"), "cat", &[])
        .await
        .unwrap();
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    adapter.write_text(&id, "--not-a-flag").await.unwrap();
    adapter.press_enter(&id).await.unwrap();
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    let tail = adapter.capture_tail(&id, 10).await.unwrap();
    assert!(tail.contains("--not-a-flag"));

    // Cleanup
    let _ = adapter.kill(&id).await;
}

#[tokio::test]
#[serial(tmux)]
async fn write_text_to_missing_session_returns_not_found() {
    fail_if_no_tmux!();
    let adapter = adapter();

    let result = adapter.write_text("nonexistent-session-xyz", "test").await;
    assert!(matches!(result, Err(SessionError::NotFound(_))));

    let result = adapter.press_enter("nonexistent-session-xyz").await;
    assert!(matches!(result, Err(SessionError::NotFound(_))));
}

#[tokio::test]
#[serial(tmux)]
async fn capture_tail_returns_recent_output() {
    fail_if_no_tmux!();
    let adapter = adapter();
    let name = unique_name("capture");

    // Output then stay running so there is something to capture
    let id = adapter
        .spawn(
            &name,
            Path::new("/tmp"),
            "echo 'capture-test-output' && sleep 60",
            &[],
        )
        .await
        .unwrap();

    // Give command time to execute
    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    let tail = adapter.capture_tail(&id, 10).await.unwrap();
    assert!(tail.contains("capture-test-output"));

    // Cleanup
    let _ = adapter.kill(&id).await;
}

/// Completion signals are matched as literals; a line the pane wrapped at
/// its width must come back joined.
#[tokio::test]
#[serial(tmux)]
async fn capture_tail_joins_wrapped_lines() {
    fail_if_no_tmux!();
    let adapter = adapter();
    let name = unique_name("wrap");

    // Longer than any default pane width, signal at the end
    let line = format!("{}<promise>WRAP_TEST_DONE</promise>", "x".repeat(200));
    let id = adapter
        .spawn(
            &name,
            Path::new("/tmp"),
            &format!("echo '{}' && sleep 60", line),
            &[],
        )
        .await
        .unwrap();

    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    let tail = adapter.capture_tail(&id, 20).await.unwrap();
    assert!(
        tail.contains("<promise>WRAP_TEST_DONE</promise>"),
        "signal split by pane wrapping:\n{}",
        tail
    );

    // Cleanup
    let _ = adapter.kill(&id).await;
}

#[tokio::test]
#[serial(tmux)]
async fn capture_tail_missing_session_returns_not_found() {
    fail_if_no_tmux!();
    let adapter = adapter();

    let result = adapter.capture_tail("nonexistent-session-xyz", 10).await;
    assert!(matches!(result, Err(SessionError::NotFound(_))));
}

#[tokio::test]
#[serial(tmux)]
async fn kill_terminates_session() {
    fail_if_no_tmux!();
    let adapter = adapter();
    let name = unique_name("kill");

    let id = adapter
        .spawn(&name, Path::new("/tmp"), "sleep 60", &[])
        .await
        .unwrap();

    assert!(adapter.is_alive(&id).await.unwrap());

    adapter.kill(&id).await.unwrap();

    // Give tmux time to clean up
    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    assert!(!adapter.is_alive(&id).await.unwrap());
}

#[tokio::test]
#[serial(tmux)]
async fn kill_missing_session_succeeds() {
    fail_if_no_tmux!();
    let adapter = adapter();

    // Teardown races are normal; a gone session is not an error
    let result = adapter.kill("nonexistent-session-xyz").await;
    assert!(result.is_ok());
}

#[tokio::test]
#[serial(tmux)]
async fn is_alive_tracks_session_existence() {
    fail_if_no_tmux!();
    let adapter = adapter();
    let name = unique_name("alive");

    let id = adapter
        .spawn(&name, Path::new("/tmp"), "sleep 60", &[])
        .await
        .unwrap();
    assert!(adapter.is_alive(&id).await.unwrap());

    let _ = adapter.kill(&id).await;
    assert!(!adapter.is_alive("nonexistent-session-xyz").await.unwrap());
}

// Tests below modify PATH to simulate tmux being unavailable.

#[tokio::test]
#[serial(tmux)]
async fn spawn_fails_when_tmux_unavailable() {
    use std::env;

    let original_path = env::var("PATH").unwrap_or_default();
    env::set_var("PATH", "/nonexistent");

    let adapter = adapter();
    let result = adapter
        .spawn("no-tmux", Path::new("/tmp"), "sleep 1", &[])
        .await;

    env::set_var("PATH", &original_path);

    assert!(matches!(result, Err(SessionError::SpawnFailed(_) | SessionError::CommandFailed(_))));
}

#[tokio::test]
#[serial(tmux)]
async fn write_text_fails_when_tmux_unavailable() {
    use std::env;

    let original_path = env::var("PATH").unwrap_or_default();
    env::set_var("PATH", "/nonexistent");

    let adapter = adapter();
    let result = adapter.write_text("any-session", "test").await;

    env::set_var("PATH", &original_path);

    assert!(matches!(result, Err(SessionError::CommandFailed(_))));
}

#[tokio::test]
#[serial(tmux)]
async fn kill_succeeds_when_tmux_unavailable() {
    use std::env;

    let original_path = env::var("PATH").unwrap_or_default();
    env::set_var("PATH", "/nonexistent");

    let adapter = adapter();
    let result = adapter.kill("any-session").await;

    env::set_var("PATH", &original_path);

    // kill() is best effort; nothing to kill is fine
    assert!(result.is_ok());
}

#[tokio::test]
#[serial(tmux)]
async fn is_alive_fails_when_tmux_unavailable() {
    use std::env;

    let original_path = env::var("PATH").unwrap_or_default();
    env::set_var("PATH", "/nonexistent");

    let adapter = adapter();
    let result = adapter.is_alive("any-session").await;

    env::set_var("PATH", &original_path);

    assert!(matches!(result, Err(SessionError::CommandFailed(_))));
}

#[tokio::test]
#[serial(tmux)]
async fn capture_tail_fails_when_tmux_unavailable() {
    use std::env;

    let original_path = env::var("PATH").unwrap_or_default();
    env::set_var("PATH", "/nonexistent");

    let adapter = adapter();
    let result = adapter.capture_tail("any-session", 10).await;

    env::set_var("PATH", &original_path);

    assert!(matches!(result, Err(SessionError::CommandFailed(_))));
}
