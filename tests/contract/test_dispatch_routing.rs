//! Contract Tests for Task Dispatch
//!
//! Routing of interactive tasks onto sessions keyed by prompt type: reuse,
//! spawn, rejection, and the registry state each leaves behind.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use promptmux::dispatch::Outcome;
use promptmux::error::{Error, ErrorCategory};
use promptmux::models::{InteractiveTask, Payload};
use test_utils::{mock_dispatcher, test_prompts, RecordingSignals};

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
async fn test_bash_task_spawns_one_session() {
    let (mut dispatcher, spawner, out) = mock_dispatcher();

    let outcome = dispatcher.submit(task("ls -la", "bash", "bash")).await.unwrap();

    assert!(matches!(outcome, Outcome::Transmitted { ref prompt_type, .. } if prompt_type == "bash"));
    assert_eq!(spawner.spawn_count(), 1);
    assert_eq!(spawner.sent(0), vec!["ls -la"]);
    assert_eq!(dispatcher.registry().prompt_types(), vec!["bash"]);

    let printed = out.contents();
    assert!(printed.contains("user@host:~$ ls -la"));
    assert!(printed.contains("total 0"));
    assert!(printed.ends_with("user@host:~$ \n"));
}

#[tokio::test]
async fn test_prompt_change_rekeys_session() {
    let (mut dispatcher, spawner, _out) = mock_dispatcher();

    let outcome = dispatcher
        .submit(task("msfconsole", "bash", "msf"))
        .await
        .unwrap();

    let (session, prompt_type) = match outcome {
        Outcome::Transmitted {
            session,
            prompt_type,
        } => (session, prompt_type),
        other => panic!("expected a transmission, got {:?}", other),
    };
    assert_eq!(prompt_type, "msf");
    assert_eq!(dispatcher.registry().prompt_types(), vec!["msf"]);

    let handle = dispatcher.registry().get("msf").unwrap();
    assert_eq!(handle.id(), session);
    assert_eq!(handle.prompt_type(), "msf");
    let prompts = test_prompts();
    let msf = prompts.resolve("msf").unwrap().unwrap();
    assert_eq!(handle.prompt_pattern().unwrap().source(), msf.source());
    assert_eq!(spawner.spawn_count(), 1);
}

#[tokio::test]
async fn test_matching_session_is_reused() {
    let (mut dispatcher, spawner, _out) = mock_dispatcher();

    let first = dispatcher
        .submit(task("msfconsole", "bash", "msf"))
        .await
        .unwrap();
    let second = dispatcher
        .submit(task("use exploit/x", "msf", "msf"))
        .await
        .unwrap();

    match (first, second) {
        (
            Outcome::Transmitted { session: a, .. },
            Outcome::Transmitted { session: b, prompt_type },
        ) => {
            assert_eq!(a, b);
            assert_eq!(prompt_type, "msf");
        }
        other => panic!("unexpected outcomes: {:?}", other),
    }
    assert_eq!(spawner.spawn_count(), 1);
    assert_eq!(spawner.sent(0), vec!["msfconsole", "use exploit/x"]);
}

#[tokio::test]
async fn test_duplicate_prompt_type_rejected_without_transmission() {
    let (mut dispatcher, spawner, _out) = mock_dispatcher();

    dispatcher
        .submit(task("msfconsole", "bash", "msf"))
        .await
        .unwrap();
    dispatcher.submit(task("ls -la", "bash", "bash")).await.unwrap();
    assert_eq!(dispatcher.registry().prompt_types(), vec!["bash", "msf"]);

    let result = dispatcher.submit(task("msfconsole", "bash", "msf")).await;

    match result {
        Err(e @ Error::DuplicatePromptType { .. }) => {
            assert_eq!(e.category(), ErrorCategory::Compatibility);
            assert!(!e.is_fatal());
        }
        other => panic!("expected a duplicate rejection, got {:?}", other),
    }
    // the bash session saw only its own command and is still registered
    assert_eq!(spawner.sent(1), vec!["ls -la"]);
    assert_eq!(spawner.spawn_count(), 2);
    assert_eq!(dispatcher.registry().prompt_types(), vec!["bash", "msf"]);
}

#[tokio::test]
async fn test_duplicate_checked_before_spawning() {
    let (mut dispatcher, spawner, _out) = mock_dispatcher();

    dispatcher
        .submit(task("msfconsole", "bash", "msf"))
        .await
        .unwrap();
    let result = dispatcher.submit(task("msfconsole", "bash", "msf")).await;

    assert!(matches!(result, Err(Error::DuplicatePromptType { .. })));
    assert_eq!(spawner.spawn_count(), 1);
}

#[tokio::test]
async fn test_unserviceable_prompt_type_rejected() {
    let (mut dispatcher, spawner, _out) = mock_dispatcher();

    let result = dispatcher.submit(task("sessions -l", "msf", "msf")).await;

    assert!(matches!(
        result,
        Err(Error::IncompatiblePromptType { ref prompt_type }) if prompt_type == "msf"
    ));
    assert_eq!(spawner.spawn_count(), 0);
    assert!(dispatcher.registry().is_empty());
}

#[tokio::test]
async fn test_one_completion_per_invocation() {
    let (mut dispatcher, _spawner, _out) = mock_dispatcher();

    assert_eq!(dispatcher.handle_next().await.unwrap(), Outcome::Idle);
    let _ = dispatcher.submit(task("ls -la", "bash", "bash")).await;
    let _ = dispatcher.submit(task("x", "msf", "msf")).await;
    let _ = dispatcher.submit(task("msfconsole", "bash", "msf")).await;
    let _ = dispatcher.submit(task("msfconsole", "bash", "msf")).await;

    assert_eq!(dispatcher.completions(), 5);
    assert_eq!(dispatcher.queued(), 0);
}

#[tokio::test]
async fn test_queue_is_fifo() {
    let (mut dispatcher, spawner, _out) = mock_dispatcher();

    dispatcher.enqueue(task("msfconsole", "bash", "msf"));
    dispatcher.enqueue(task("use exploit/x", "msf", "msf"));
    assert_eq!(dispatcher.queued(), 2);

    dispatcher.handle_next().await.unwrap();
    dispatcher.handle_next().await.unwrap();

    assert_eq!(spawner.sent(0), vec!["msfconsole", "use exploit/x"]);
    assert_eq!(dispatcher.handle_next().await.unwrap(), Outcome::Idle);
}

#[tokio::test]
async fn test_multi_line_payload_sent_in_order() {
    let (mut dispatcher, spawner, _out) = mock_dispatcher();
    let payload = Payload::Lines(vec!["cd /tmp".to_string(), "ls -la".to_string()]);
    let task = InteractiveTask::new(payload, "bash", "bash", &test_prompts()).unwrap();

    dispatcher.submit(task).await.unwrap();

    assert_eq!(spawner.sent(0), vec!["cd /tmp", "ls -la"]);
}

#[tokio::test]
async fn test_exited_session_is_removed() {
    let (mut dispatcher, spawner, _out) = mock_dispatcher();

    dispatcher.submit(task("ls -la", "bash", "bash")).await.unwrap();
    spawner.session(0).lock().unwrap().alive = false;

    assert!(!dispatcher.has_session("bash"));
    assert!(dispatcher.registry().is_empty());

    // the next bash task gets a fresh shell
    dispatcher.submit(task("ls -la", "bash", "bash")).await.unwrap();
    assert_eq!(spawner.spawn_count(), 2);
}

#[tokio::test]
async fn test_session_closing_mid_read_fails_task() {
    let (mut dispatcher, _spawner, _out) = mock_dispatcher();

    let result = dispatcher.submit(task("logout", "bash", "bash")).await;

    assert!(matches!(result, Err(Error::SessionClosed { .. })));
    assert!(dispatcher.registry().is_empty());
}

#[tokio::test]
async fn test_prompt_ceiling_keeps_session() {
    let (mut dispatcher, spawner, _out) = mock_dispatcher();

    let result = dispatcher.submit(task("hang", "bash", "bash")).await;

    assert!(matches!(result, Err(Error::PromptNotDetected { .. })));
    // two nudges before the ceiling of 25 cycles
    assert_eq!(spawner.sent(0), vec!["hang", "", ""]);
    assert_eq!(dispatcher.registry().prompt_types(), vec!["bash"]);
}

#[tokio::test]
async fn test_spawn_failure_is_fatal() {
    let (mut dispatcher, spawner, _out) = mock_dispatcher();
    spawner.fail_spawns();

    let err = dispatcher
        .submit(task("ls -la", "bash", "bash"))
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Transport);
    assert!(err.is_fatal());
    assert!(dispatcher.registry().is_empty());
}

#[tokio::test]
async fn test_write_failure_drops_session() {
    let (mut dispatcher, spawner, _out) = mock_dispatcher();

    dispatcher.submit(task("ls -la", "bash", "bash")).await.unwrap();
    spawner.session(0).lock().unwrap().broken_pipe = true;

    let err = dispatcher
        .submit(task("ls -la", "bash", "bash"))
        .await
        .unwrap_err();

    assert!(err.is_fatal());
    assert!(dispatcher.registry().is_empty());
}

#[tokio::test]
async fn test_prior_output_printed_before_transmission() {
    let (mut dispatcher, spawner, out) = mock_dispatcher();

    dispatcher.submit(task("ls -la", "bash", "bash")).await.unwrap();
    spawner
        .session(0)
        .lock()
        .unwrap()
        .output
        .push_back("[1]+  Done  sleep 1".to_string());

    dispatcher.submit(task("ls -la", "bash", "bash")).await.unwrap();

    let printed = out.contents();
    let job = printed.find("[1]+  Done").unwrap();
    let second_echo = printed.rfind("ls -la").unwrap();
    assert!(job < second_echo);
}

#[tokio::test]
async fn test_shutdown_hangs_up_live_sessions() {
    let (mut dispatcher, spawner, _out) = mock_dispatcher();
    let signals = RecordingSignals::default();

    dispatcher.submit(task("msfconsole", "bash", "msf")).await.unwrap();
    dispatcher.submit(task("ls -la", "bash", "bash")).await.unwrap();
    spawner.session(0).lock().unwrap().alive = false;

    dispatcher.shutdown(&signals).await;

    // only the live shell is signalled
    let live_pid = spawner.session(1).lock().unwrap().pid;
    assert_eq!(signals.hangups(), vec![live_pid]);
    assert!(dispatcher.registry().is_empty());
}

#[tokio::test]
async fn test_output_failure_before_transmission_keeps_session() {
    let (mut dispatcher, spawner, out) = mock_dispatcher();

    dispatcher.submit(task("msfconsole", "bash", "msf")).await.unwrap();
    spawner
        .session(0)
        .lock()
        .unwrap()
        .output
        .push_back("[*] background job finished".to_string());
    out.set_failing(true);

    let err = dispatcher
        .submit(task("use exploit/x", "msf", "msf"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Io(_)));
    assert!(!err.is_fatal());
    assert_eq!(spawner.sent(0), vec!["msfconsole"]);
    assert_eq!(dispatcher.registry().prompt_types(), vec!["msf"]);
    assert!(spawner.session(0).lock().unwrap().alive);

    // the same session serves the next task once output works again
    out.set_failing(false);
    dispatcher
        .submit(task("use exploit/x", "msf", "msf"))
        .await
        .unwrap();
    assert_eq!(spawner.spawn_count(), 1);
    assert_eq!(spawner.sent(0), vec!["msfconsole", "use exploit/x"]);
}

#[tokio::test]
async fn test_output_failure_while_reading_keeps_session() {
    let (mut dispatcher, spawner, out) = mock_dispatcher();

    dispatcher.submit(task("msfconsole", "bash", "msf")).await.unwrap();
    out.set_failing(true);

    let err = dispatcher
        .submit(task("use exploit/x", "msf", "msf"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Io(_)));
    assert_eq!(spawner.sent(0), vec!["msfconsole", "use exploit/x"]);
    assert_eq!(dispatcher.registry().prompt_types(), vec!["msf"]);
    assert_eq!(spawner.spawn_count(), 1);
}

#[tokio::test]
async fn test_shutdown_skips_processes_already_gone() {
    let (mut dispatcher, spawner, _out) = mock_dispatcher();
    let signals = RecordingSignals::default();

    dispatcher.submit(task("ls -la", "bash", "bash")).await.unwrap();
    signals.mark_gone(spawner.session(0).lock().unwrap().pid);

    dispatcher.shutdown(&signals).await;

    assert!(signals.hangups().is_empty());
    assert!(dispatcher.registry().is_empty());
}
