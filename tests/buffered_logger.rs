// tests/buffered_logger.rs
mod common;
use crate::common::{init_tracing, message, serial, TestResult};

use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use logpipes::console::mock::MemoryConsole;
use logpipes::fs::FileSystem;
use logpipes::fs::mock::MockFileSystem;
use logpipes::policy::buffered::buffer_path;
use logpipes::{outln, streams, Identity, LogpipesError, PolicyKind, RedirectConfig, Redirector};
use logpipes_test_utils::builders::RedirectConfigBuilder;

fn mock_redirector(console: &MemoryConsole, fs: &MockFileSystem) -> Redirector {
    Redirector::new(RedirectConfig::default())
        .with_console(Arc::new(console.clone()))
        .with_fs(Arc::new(fs.clone()))
        .with_buffer_dir("/buffers")
}

#[test]
fn buffered_output_is_held_back_until_the_scope_ends() -> TestResult {
    let _serial = serial();
    init_tracing();

    let console = MemoryConsole::new();
    let fs = MockFileSystem::new();
    let redirector = mock_redirector(&console, &fs);
    assert_eq!(redirector.policy(), PolicyKind::Buffered);

    let scope = redirector.open(Identity::new("Watcher", "test"))?;
    assert_eq!(scope.kind(), Some(PolicyKind::Buffered));

    outln!("pass1");
    scope.handle().write("pass2\n")?;

    assert!(console.is_empty(), "nothing reaches the console early");

    let paths = fs.paths();
    assert_eq!(paths.len(), 1);
    let path = paths[0].clone();
    let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(path.starts_with("/buffers"));
    assert!(
        file_name.starts_with(&format!("logpipes.{}.test.", std::process::id())),
        "unexpected buffer name {file_name}"
    );
    assert!(fs.contents(&path).unwrap().contains("pass1"));

    scope.close()?;

    assert!(!fs.exists(&path), "buffer file removed after replay");
    assert!(!streams::is_redirected());
    assert_eq!(console.blocks().len(), 1, "replayed as a single block");

    let lines = console.lines();
    let messages: Vec<&str> = lines.iter().map(|l| message(l, "Watcher", "test")).collect();
    assert_eq!(&messages[..3], &["Starting!", "pass1", "pass2"]);
    assert!(messages[3].starts_with("Done! Elapsed "));
    assert_eq!(messages.len(), 4);
    Ok(())
}

#[test]
fn buffer_file_in_real_directory_is_cleaned_up() -> TestResult {
    let _serial = serial();
    init_tracing();

    let dir = tempfile::tempdir()?;
    let console = MemoryConsole::new();
    let config = RedirectConfigBuilder::new().buffer_dir(dir.path()).build();
    let redirector = Redirector::new(config).with_console(Arc::new(console.clone()));

    redirector.run(Identity::new("Watcher", "deploy"), |pipe| -> Result<(), LogpipesError> {
        let status = Command::new("sh")
            .arg("-c")
            .arg("echo child-1; echo child-2 >&2")
            .stdout(pipe.stdio()?)
            .stderr(pipe.stdio()?)
            .status()?;
        assert!(status.success());
        assert_eq!(std::fs::read_dir(dir.path())?.count(), 1);
        assert!(console.is_empty());
        Ok(())
    })?;

    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);

    let lines = console.lines();
    let messages: Vec<&str> = lines.iter().map(|l| message(l, "Watcher", "deploy")).collect();
    assert_eq!(&messages[..3], &["Starting!", "child-1", "child-2"]);
    assert!(messages[3].starts_with("Done! Elapsed "));
    Ok(())
}

#[test]
fn failing_buffer_removal_is_not_fatal() -> TestResult {
    let _serial = serial();
    init_tracing();

    let console = MemoryConsole::new();
    let fs = MockFileSystem::new();
    fs.fail_removals(true);

    let value = mock_redirector(&console, &fs).run(
        Identity::new("Watcher", "lint"),
        |pipe| -> Result<u32, LogpipesError> {
            pipe.write("checked 3 files")?;
            Ok(3)
        },
    )?;

    assert_eq!(value, 3);
    assert_eq!(fs.paths().len(), 1, "the buffer file stays behind");
    assert!(console.contents().contains("checked 3 files"));
    Ok(())
}

#[test]
fn concurrent_buffered_scopes_print_contiguous_blocks() -> TestResult {
    let _serial = serial();
    init_tracing();

    let console = MemoryConsole::new();
    let fs = MockFileSystem::new();
    let redirector = mock_redirector(&console, &fs);

    let workers: Vec<_> = ["alpha", "beta"]
        .into_iter()
        .map(|op| {
            let redirector = redirector.clone();
            thread::spawn(move || {
                redirector.run(Identity::new("Worker", op), |pipe| -> Result<(), LogpipesError> {
                    for i in 0..5 {
                        pipe.write(&format!("{op} {i}"))?;
                        thread::sleep(Duration::from_millis(10));
                    }
                    Ok(())
                })
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap()?;
    }

    let blocks = console.blocks();
    assert_eq!(blocks.len(), 2);
    for block in &blocks {
        let op = if block.contains("[alpha]") { "alpha" } else { "beta" };
        let messages: Vec<&str> = block.lines().map(|l| message(l, "Worker", op)).collect();
        assert_eq!(messages.len(), 7, "block for {op}: {block:?}");
        assert_eq!(messages[0], "Starting!");
        for (i, msg) in messages[1..6].iter().enumerate() {
            assert_eq!(*msg, format!("{op} {i}"));
        }
        assert!(messages[6].starts_with("Done! Elapsed "));
    }
    assert!(fs.paths().is_empty());
    Ok(())
}

#[test]
fn buffer_names_are_unique_and_path_safe() {
    let dir = Path::new("/buffers");
    let first = buffer_path(dir, &Identity::new("Watcher", "a/b"));
    let second = buffer_path(dir, &Identity::new("Watcher", "a/b"));

    assert_ne!(first, second);
    assert_eq!(first.parent(), Some(dir));
    assert!(
        first
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(&format!("logpipes.{}.a_b.", std::process::id()))
    );

    // Created files can be removed through the trait too.
    let fs = MockFileSystem::new();
    drop(fs.create(&first).unwrap());
    fs.remove_file(&first).unwrap();
    assert!(!fs.exists(&first));
}
