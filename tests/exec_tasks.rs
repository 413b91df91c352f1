// tests/exec_tasks.rs
mod common;
use crate::common::{init_tracing, message, serial, with_timeout, TestResult};

use std::sync::Arc;

use clap::Parser;
use logpipes::cli::CliArgs;
use logpipes::console::mock::MemoryConsole;
use logpipes::exec::{run_task, run_tasks, CommandSpec, TaskSpec};
use logpipes::{streams, Identity, Redirector, TaskOutcome};
use logpipes_test_utils::builders::RedirectConfigBuilder;

#[tokio::test]
async fn buffered_tasks_print_one_block_each() -> TestResult {
    let _serial = serial();
    init_tracing();

    let dir = tempfile::tempdir()?;
    let console = MemoryConsole::new();
    let redirector = Redirector::new(RedirectConfigBuilder::new().buffer_dir(dir.path()).build())
        .with_console(Arc::new(console.clone()));

    let tasks = vec![
        TaskSpec::shell(Identity::new("Watcher", "a"), "echo a1; sleep 0.05; echo a2"),
        TaskSpec::shell(Identity::new("Watcher", "b"), "echo b1 >&2; exit 3"),
    ];
    let outcomes = with_timeout(run_tasks(&redirector, tasks)).await;

    assert_eq!(
        outcomes,
        vec![
            ("a".to_string(), TaskOutcome::Success),
            ("b".to_string(), TaskOutcome::Failed(3)),
        ]
    );

    let blocks = console.blocks();
    assert_eq!(blocks.len(), 2);
    for block in &blocks {
        let (op, expected): (&str, &[&str]) = if block.contains("[a]") {
            ("a", &["a1", "a2"])
        } else {
            ("b", &["b1"])
        };
        let messages: Vec<&str> = block.lines().map(|l| message(l, "Watcher", op)).collect();
        assert_eq!(messages.first(), Some(&"Starting!"));
        assert_eq!(&messages[1..messages.len() - 1], expected);
        assert!(messages.last().unwrap().starts_with("Done! Elapsed "));
    }

    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
    assert!(!streams::is_redirected());
    Ok(())
}

#[tokio::test]
async fn argv_task_logs_live() -> TestResult {
    let _serial = serial();
    init_tracing();

    let console = MemoryConsole::new();
    let redirector = Redirector::new(RedirectConfigBuilder::new().suppress_buffer(true).build())
        .with_console(Arc::new(console.clone()));

    let task = TaskSpec::argv(
        Identity::new("Runner", "argv"),
        vec!["sh".into(), "-c".into(), "echo argv-ok".into()],
    );
    assert_eq!(task.command.to_string(), "sh -c echo argv-ok");

    let outcome = with_timeout(run_task(&redirector, task)).await?;
    assert_eq!(outcome, TaskOutcome::Success);

    let lines = console.lines();
    assert_eq!(message(&lines[1], "Runner", "argv"), "argv-ok");
    Ok(())
}

#[tokio::test]
async fn unspawnable_task_is_reported_and_scope_closed() -> TestResult {
    let _serial = serial();
    init_tracing();

    let console = MemoryConsole::new();
    let redirector = Redirector::new(RedirectConfigBuilder::new().suppress_buffer(true).build())
        .with_console(Arc::new(console.clone()));

    let missing = || {
        TaskSpec::argv(
            Identity::new("Runner", "missing"),
            vec!["logpipes-definitely-not-a-binary".into()],
        )
    };

    let err = with_timeout(run_task(&redirector, missing())).await.unwrap_err();
    assert!(err.to_string().contains("spawning process"), "got {err:#}");
    assert!(!streams::is_redirected());
    assert!(console.contents().contains("Done! Elapsed "));

    let outcomes = with_timeout(run_tasks(&redirector, vec![missing()])).await;
    assert_eq!(outcomes, vec![("missing".to_string(), TaskOutcome::Failed(-1))]);
    Ok(())
}

#[test]
fn empty_argv_cannot_be_built() {
    assert!(CommandSpec::Argv(Vec::new()).build().is_err());
    assert!(CommandSpec::Shell("true".into()).build().is_ok());
}

#[tokio::test]
async fn command_after_double_dash_runs_instead_of_config() -> TestResult {
    let _serial = serial();
    init_tracing();

    let ok = CliArgs::parse_from(["logpipes", "--suppress-buffer", "--", "sh", "-c", "exit 0"]);
    assert_eq!(ok.command, vec!["sh", "-c", "exit 0"]);
    assert!(with_timeout(logpipes::run(ok)).await?);

    let failing = CliArgs::parse_from(["logpipes", "--", "sh", "-c", "exit 4"]);
    assert!(!with_timeout(logpipes::run(failing)).await?);
    Ok(())
}

#[tokio::test]
async fn configured_tasks_can_be_narrowed() -> TestResult {
    let _serial = serial();
    init_tracing();

    let mut file = tempfile::NamedTempFile::new()?;
    std::io::Write::write_all(
        &mut file,
        br#"
[redirect]
suppress_buffer = true

[task.good]
cmd = "true"

[task.bad]
cmd = "exit 1"
"#,
    )?;
    let path = file.path().to_string_lossy().into_owned();

    let only_good = CliArgs::parse_from(["logpipes", "--config", path.as_str(), "--task", "good"]);
    assert!(with_timeout(logpipes::run(only_good)).await?);

    let all = CliArgs::parse_from(["logpipes", "--config", path.as_str()]);
    assert!(!with_timeout(logpipes::run(all)).await?);

    let unknown = CliArgs::parse_from(["logpipes", "--config", path.as_str(), "--task", "nope"]);
    let err = with_timeout(logpipes::run(unknown)).await.unwrap_err();
    assert!(err.to_string().contains("unknown task 'nope'"));

    let dry = CliArgs::parse_from(["logpipes", "--config", path.as_str(), "--dry-run"]);
    assert!(with_timeout(logpipes::run(dry)).await?);
    Ok(())
}
