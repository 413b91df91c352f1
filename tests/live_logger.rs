// tests/live_logger.rs
mod common;
use crate::common::{init_tracing, message, serial, TestResult};

use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use logpipes::console::mock::MemoryConsole;
use logpipes::policy::live::format_elapsed;
use logpipes::{outln, errln, streams, Identity, LogpipesError, PolicyKind, Redirector};
use logpipes_test_utils::builders::RedirectConfigBuilder;

fn live_redirector(console: &MemoryConsole) -> Redirector {
    let config = RedirectConfigBuilder::new().suppress_buffer(true).build();
    Redirector::new(config).with_console(Arc::new(console.clone()))
}

#[test]
fn live_logger_tags_lines_as_they_arrive() -> TestResult {
    let _serial = serial();
    init_tracing();

    let console = MemoryConsole::new();
    let redirector = live_redirector(&console);
    assert_eq!(redirector.policy(), PolicyKind::Live);
    assert!(!streams::is_redirected());

    redirector.run(Identity::new("Watcher", "build"), |_pipe| -> Result<(), LogpipesError> {
        assert!(streams::is_redirected());
        outln!("compiling");
        // Live: already on the console while the scope is still open.
        let lines = console.lines();
        assert_eq!(lines.len(), 2, "got {lines:?}");
        assert_eq!(message(&lines[1], "Watcher", "build"), "compiling");

        errln!("warning: unused variable");
        Ok(())
    })?;

    assert!(!streams::is_redirected());
    assert!(streams::current().is_none());

    let lines = console.lines();
    let messages: Vec<&str> = lines
        .iter()
        .map(|l| message(l, "Watcher", "build"))
        .collect();
    assert_eq!(messages.len(), 4, "got {lines:?}");
    assert_eq!(messages[0], "Starting!");
    assert_eq!(messages[1], "compiling");
    assert_eq!(messages[2], "warning: unused variable");
    assert!(
        messages[3].starts_with("Done! Elapsed 0:00:"),
        "unexpected final line {:?}",
        messages[3]
    );
    Ok(())
}

#[test]
fn child_process_output_precedes_the_done_line() -> TestResult {
    let _serial = serial();
    init_tracing();

    let console = MemoryConsole::new();
    let redirector = live_redirector(&console);

    redirector.run(Identity::new("Watcher", "test"), |pipe| -> Result<(), LogpipesError> {
        let status = Command::new("sh")
            .arg("-c")
            .arg("echo from-child; sleep 0.05; echo also-from-child >&2")
            .stdout(pipe.stdio()?)
            .stderr(pipe.stdio()?)
            .status()?;
        assert!(status.success());
        Ok(())
    })?;

    let lines = console.lines();
    let messages: Vec<&str> = lines.iter().map(|l| message(l, "Watcher", "test")).collect();
    assert_eq!(&messages[1..3], &["from-child", "also-from-child"]);
    assert!(messages.last().unwrap().starts_with("Done! Elapsed "));
    Ok(())
}

#[test]
fn nested_scopes_restore_the_outer_target() -> TestResult {
    let _serial = serial();
    init_tracing();

    let outer_console = MemoryConsole::new();
    let inner_console = MemoryConsole::new();

    live_redirector(&outer_console).run(
        Identity::new("Outer", "run"),
        |_outer| -> Result<(), LogpipesError> {
            outln!("outer before");
            live_redirector(&inner_console).run(
                Identity::new("Inner", "run"),
                |_inner| -> Result<(), LogpipesError> {
                    outln!("inner only");
                    Ok(())
                },
            )?;
            outln!("outer after");
            Ok(())
        },
    )?;

    let outer: Vec<String> = outer_console
        .lines()
        .iter()
        .map(|l| message(l, "Outer", "run").to_string())
        .collect();
    let inner: Vec<String> = inner_console
        .lines()
        .iter()
        .map(|l| message(l, "Inner", "run").to_string())
        .collect();

    assert_eq!(&outer[1..3], &["outer before", "outer after"]);
    assert_eq!(inner[1], "inner only");
    assert!(!streams::is_redirected());
    Ok(())
}

#[test]
fn elapsed_time_is_rendered_as_hours_minutes_seconds_micros() {
    assert_eq!(format_elapsed(Duration::ZERO), "0:00:00.000000");
    assert_eq!(format_elapsed(Duration::from_micros(1_500)), "0:00:00.001500");
    assert_eq!(
        format_elapsed(Duration::from_secs(3 * 3600 + 25 * 60 + 7) + Duration::from_micros(42)),
        "3:25:07.000042"
    );
}
