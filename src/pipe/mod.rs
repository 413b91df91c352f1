// src/pipe/mod.rs

//! OS pipe plumbing.
//!
//! A [`PipeChannel`] owns one unidirectional OS pipe. Its write end is handed
//! out through [`PipeHandle`]s (as a `Stdio` for child processes, as a raw
//! `File`, or as a direct in-process line writer), and its read end is
//! drained by a [`reader::LineReaderTask`] that is started in the same call
//! that allocates the pipe, so no writer can ever get ahead of the reader.

pub mod reader;
pub mod sink;

use std::fmt;
use std::fs::File;
use std::io;
use std::os::fd::OwnedFd;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::errors::Result;

pub use reader::LineReaderTask;
pub use sink::{LineSink, split_lines};

struct PipeShared {
    label: String,
    sink: Arc<dyn LineSink>,
    /// `None` once the channel has been closed.
    writer: Mutex<Option<OwnedFd>>,
}

impl PipeShared {
    fn writer(&self) -> MutexGuard<'_, Option<OwnedFd>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop our write descriptor. Returns false if it was already gone.
    fn close_writer(&self) -> bool {
        self.writer().take().is_some()
    }

    fn clone_writer(&self) -> io::Result<OwnedFd> {
        match self.writer().as_ref() {
            Some(fd) => fd.try_clone(),
            None => Err(closed(&self.label)),
        }
    }
}

fn closed(label: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::BrokenPipe,
        format!("pipe '{label}' is closed"),
    )
}

/// Owner of one OS pipe and its reader thread.
pub struct PipeChannel {
    shared: Arc<PipeShared>,
    reader: LineReaderTask,
}

/// Cloneable access to the write side of a [`PipeChannel`].
#[derive(Clone)]
pub struct PipeHandle {
    shared: Arc<PipeShared>,
}

impl PipeChannel {
    /// Allocate a pipe and start draining it into `sink`.
    ///
    /// Running out of descriptors (or threads) is reported to the caller;
    /// there is no fallback.
    pub fn open(label: &str, sink: Arc<dyn LineSink>) -> Result<Self> {
        let (read_fd, write_fd) = os_pipe()?;
        let reader = LineReaderTask::spawn(label, read_fd, Arc::clone(&sink))?;

        debug!(pipe = %label, "pipe channel opened");

        Ok(Self {
            shared: Arc::new(PipeShared {
                label: label.to_string(),
                sink,
                writer: Mutex::new(Some(write_fd)),
            }),
            reader,
        })
    }

    pub fn label(&self) -> &str {
        &self.shared.label
    }

    pub fn handle(&self) -> PipeHandle {
        PipeHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Direct in-process write, see [`PipeHandle::write`].
    pub fn write(&self, buf: &str) -> io::Result<()> {
        self.handle().write(buf)
    }

    /// `Stdio` for a child process, see [`PipeHandle::stdio`].
    pub fn stdio(&self) -> io::Result<Stdio> {
        self.handle().stdio()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.writer().is_none()
    }

    /// Close our write handle and wait until the reader has drained every
    /// line still in the pipe.
    ///
    /// The reader only sees end-of-data once all duplicates of the write end
    /// (child processes, cloned writers) are closed as well. Returns the number
    /// of lines read through the pipe; later calls return `Ok(0)`.
    pub fn close(&mut self) -> Result<u64> {
        if self.shared.close_writer() {
            debug!(pipe = %self.shared.label, "pipe write handle closed");
        }
        self.reader.join()
    }
}

impl Drop for PipeChannel {
    fn drop(&mut self) {
        // The reader finishes by itself once the last writer goes away.
        self.shared.close_writer();
    }
}

impl fmt::Debug for PipeChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeChannel")
            .field("label", &self.shared.label)
            .field("closed", &self.is_closed())
            .field("reader_finished", &self.reader.is_finished())
            .finish()
    }
}

impl PipeHandle {
    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// Forward `buf` to the sink line by line without going through the OS
    /// pipe.
    ///
    /// The buffer's trailing whitespace is dropped and each line is
    /// right-trimmed. Fails with `BrokenPipe` once the channel is closed.
    pub fn write(&self, buf: &str) -> io::Result<()> {
        if self.is_closed() {
            return Err(closed(&self.shared.label));
        }
        for line in split_lines(buf) {
            self.shared.sink.consume(line);
        }
        Ok(())
    }

    /// A `Stdio` owning a duplicate of the write end, for
    /// `Command::stdout` / `Command::stderr`.
    pub fn stdio(&self) -> io::Result<Stdio> {
        Ok(Stdio::from(self.shared.clone_writer()?))
    }

    /// A `File` writing into the OS pipe.
    pub fn try_clone_writer(&self) -> io::Result<File> {
        Ok(File::from(self.shared.clone_writer()?))
    }

    pub fn is_closed(&self) -> bool {
        self.shared.writer().is_none()
    }
}

impl fmt::Debug for PipeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeHandle")
            .field("label", &self.shared.label)
            .finish()
    }
}

/// Both ends are close-on-exec: a concurrently spawned, unrelated child must
/// not keep another channel's write end alive.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn os_pipe() -> Result<(OwnedFd, OwnedFd)> {
    use nix::fcntl::OFlag;

    Ok(nix::unistd::pipe2(OFlag::O_CLOEXEC)?)
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn os_pipe() -> Result<(OwnedFd, OwnedFd)> {
    use nix::fcntl::{FcntlArg, FdFlag, fcntl};

    let (read_fd, write_fd) = nix::unistd::pipe()?;
    for fd in [&read_fd, &write_fd] {
        fcntl(fd, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
    }
    Ok((read_fd, write_fd))
}
