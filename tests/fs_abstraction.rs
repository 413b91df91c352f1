// tests/fs_abstraction.rs
mod common;
use crate::common::{init_tracing, TestResult};

use std::io::{Read, Write};

use logpipes::fs::mock::MockFileSystem;
use logpipes::fs::{FileSystem, RealFileSystem};
use logpipes::types::component_name;

fn write_then_read(fs: &dyn FileSystem, path: &std::path::Path) -> TestResult {
    {
        let mut file = fs.create(path)?;
        file.write_all(b"line one\nline two\n")?;
        file.flush()?;
    }
    assert!(fs.exists(path));

    let mut contents = String::new();
    fs.open_read(path)?.read_to_string(&mut contents)?;
    assert_eq!(contents, "line one\nline two\n");

    fs.remove_file(path)?;
    assert!(!fs.exists(path));
    assert!(fs.remove_file(path).is_err(), "second removal fails");
    Ok(())
}

#[test]
fn real_filesystem_round_trips_a_buffer_file() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    write_then_read(&RealFileSystem, &dir.path().join("nested").join("logpipes.buf"))
}

#[test]
fn mock_filesystem_behaves_like_the_real_one() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    write_then_read(&fs, std::path::Path::new("/buffers/logpipes.buf"))?;
    assert!(fs.paths().is_empty());
    assert!(fs.open_read(std::path::Path::new("/missing")).is_err());
    Ok(())
}

mod deploy {
    pub struct DeployWatcher<T>(pub T);
    pub struct Uploader;
}

#[test]
fn component_names_drop_paths_generics_and_watcher() {
    assert_eq!(component_name::<deploy::DeployWatcher<u8>>(), "Deploy");
    assert_eq!(component_name::<deploy::Uploader>(), "Uploader");
}
