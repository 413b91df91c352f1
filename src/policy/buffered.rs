// src/policy/buffered.rs

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, warn};

use crate::console::Console;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::pipe::PipeHandle;
use crate::policy::live::LoggingPipe;
use crate::policy::logger::{LineLogger, LogOutput};
use crate::types::Identity;

static BUFFER_SEQ: AtomicU64 = AtomicU64::new(0);

/// Buffer file for `identity` inside `dir`:
/// `logpipes.<pid>.<operation>.<seq>`.
pub fn buffer_path(dir: &Path, identity: &Identity) -> PathBuf {
    let seq = BUFFER_SEQ.fetch_add(1, Ordering::Relaxed);
    let operation = identity.operation.replace(['/', '\\', '\0'], "_");
    dir.join(format!(
        "logpipes.{}.{}.{}",
        std::process::id(),
        operation,
        seq
    ))
}

/// Logging pipe writing into a private file that is replayed to the console
/// as a single block when the scope ends.
///
/// If the process dies while the scope is active the buffer file is left
/// behind.
#[derive(Debug)]
pub struct BufferedLoggingPipe {
    inner: LoggingPipe,
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
    console: Arc<dyn Console>,
}

impl BufferedLoggingPipe {
    pub fn open(
        identity: Identity,
        buffer_dir: &Path,
        fs: Arc<dyn FileSystem>,
        console: Arc<dyn Console>,
    ) -> Result<Self> {
        let path = buffer_path(buffer_dir, &identity);
        let file = fs.create(&path)?;
        let logger = LineLogger::named(&identity, LogOutput::buffer(file));

        let inner = match LoggingPipe::open(identity, logger) {
            Ok(inner) => inner,
            Err(e) => {
                discard_buffer(fs.as_ref(), &path);
                return Err(e);
            }
        };

        debug!(path = ?path, "log buffer created");
        Ok(Self {
            inner,
            path,
            fs,
            console,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn identity(&self) -> &Identity {
        self.inner.identity()
    }

    pub fn handle(&self) -> PipeHandle {
        self.inner.handle()
    }

    pub fn activate(&mut self) {
        self.inner.activate();
    }

    /// Finish the inner pipe, replay the buffer and delete it.
    ///
    /// A buffer that cannot be deleted is only warned about.
    pub fn finish(&mut self) -> Result<Duration> {
        let finished = self.inner.finish();
        let replayed = self.replay();
        discard_buffer(self.fs.as_ref(), &self.path);

        let elapsed = finished?;
        replayed?;
        Ok(elapsed)
    }

    fn replay(&self) -> Result<()> {
        self.inner.logger().flush()?;

        let mut contents = Vec::new();
        self.fs.open_read(&self.path)?.read_to_end(&mut contents)?;
        if !contents.is_empty() {
            self.console.write_all(&contents)?;
        }

        debug!(path = ?self.path, bytes = contents.len(), "log buffer replayed");
        Ok(())
    }
}

/// Delete a buffer file; failure is only warned about.
fn discard_buffer(fs: &dyn FileSystem, path: &Path) {
    if let Err(e) = fs.remove_file(path) {
        warn!(path = ?path, error = %e, "failed to remove log buffer");
    }
}
