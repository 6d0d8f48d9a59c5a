//! Integration Tests for Real PTY Sessions
//!
//! Drives `/bin/bash` through the dispatcher. Tests return early on systems
//! without bash.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use promptmux::config::{SessionConfig, TimeoutConfig};
use promptmux::dispatch::{Dispatcher, Outcome};
use promptmux::models::{InteractiveTask, Payload};
use promptmux::platform::Platform;
use promptmux::pty::{PtySession, PtySpawner, ReadEvent, SessionIo};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use test_utils::{test_prompts, SharedBuffer};

fn bash_available() -> bool {
    Path::new("/bin/bash").exists()
}

fn session_config() -> SessionConfig {
    let mut env = HashMap::new();
    env.insert("PS1".to_string(), "PMUX$ ".to_string());
    env.insert("TERM".to_string(), "dumb".to_string());
    SessionConfig {
        shell: PathBuf::from("/bin/bash"),
        shell_args: vec![
            "--norc".to_string(),
            "--noprofile".to_string(),
            "-i".to_string(),
        ],
        rows: 24,
        cols: 120,
        env,
    }
}

fn timeouts() -> TimeoutConfig {
    TimeoutConfig {
        pattern_cycles: 2,
        read_timeout_secs: 0.1,
        safety_cycles: 10,
        cycle_pause_ms: 0,
        prompt_ceiling_cycles: Some(100),
    }
}

fn dispatcher() -> (Dispatcher, SharedBuffer) {
    let out = SharedBuffer::new();
    let dispatcher = Dispatcher::new(
        test_prompts(),
        timeouts(),
        Box::new(PtySpawner::new(session_config())),
        Box::new(out.clone()),
    );
    (dispatcher, out)
}

fn task(text: &str, starting: &str, ending: &str) -> InteractiveTask {
    InteractiveTask::new(
        Payload::Single(text.to_string()),
        starting,
        ending,
        &test_prompts(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_session_echoes_output() {
    if !bash_available() {
        return;
    }
    let mut session = PtySession::spawn(&session_config()).unwrap();
    session.send_line("echo pty-$((1+1))").await.unwrap();

    let mut seen = false;
    for _ in 0..100 {
        match session.read_line(Duration::from_millis(100)).await.unwrap() {
            ReadEvent::Line(line) if line.trim_end() == "pty-2" => {
                seen = true;
                break;
            }
            ReadEvent::Closed => break,
            _ => {}
        }
    }
    assert!(seen);
    assert!(session.is_alive());
    assert!(session.pid().is_some());
}

#[tokio::test]
async fn test_bash_task_reads_until_prompt() {
    if !bash_available() {
        return;
    }
    let (mut dispatcher, out) = dispatcher();

    let outcome = dispatcher
        .submit(task("echo promptmux-$((40+2))", "bash", "bash"))
        .await
        .unwrap();

    assert!(matches!(outcome, Outcome::Transmitted { ref prompt_type, .. } if prompt_type == "bash"));
    assert!(out.contents().contains("promptmux-42"));
    assert!(dispatcher.has_session("bash"));

    dispatcher.shutdown(Platform::signals().as_ref()).await;
    assert!(dispatcher.registry().is_empty());
}

#[tokio::test]
async fn test_prompt_change_and_reuse() {
    if !bash_available() {
        return;
    }
    let (mut dispatcher, out) = dispatcher();

    // a shell whose prompt looks like a framework console
    dispatcher
        .submit(task("PS1='msf6 > '", "bash", "msf"))
        .await
        .unwrap();
    assert_eq!(dispatcher.registry().prompt_types(), vec!["msf"]);
    let first = dispatcher.registry().get("msf").unwrap().id();

    dispatcher
        .submit(task("echo inside-$((2*3))", "msf", "msf"))
        .await
        .unwrap();
    assert_eq!(dispatcher.registry().get("msf").unwrap().id(), first);
    assert!(out.contents().contains("inside-6"));

    dispatcher.shutdown(Platform::signals().as_ref()).await;
}

#[tokio::test]
async fn test_exiting_shell_is_not_kept() {
    if !bash_available() {
        return;
    }
    let (mut dispatcher, _out) = dispatcher();

    let result = dispatcher.submit(task("exit", "bash", "bash")).await;

    assert!(result.is_err());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!dispatcher.has_session("bash"));
}
