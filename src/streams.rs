// src/streams.rs

//! Process-wide output stream redirection.
//!
//! Rust code cannot rebind `std::io::stdout`, so the crate keeps an explicit
//! "current redirection target" slot instead. Code that wants its output to
//! follow an active redirection scope writes through [`stdout()`] /
//! [`stderr()`] (or the [`outln!`](crate::outln) / [`errln!`](crate::errln)
//! macros); when no scope is active those fall through to the real streams.
//!
//! The slot is a stack guarded by one mutex. [`redirect`] pushes a target and
//! returns a [`StreamGuard`] that removes exactly that entry when dropped, so
//! nested scopes behave as save/restore and a guard dropped out of order
//! (another thread's scope) never leaves a stale binding behind. Which target
//! receives in-process writes while scopes on several threads overlap is
//! simply "the most recently activated one".

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::pipe::PipeHandle;

static SLOT: Mutex<Vec<(u64, PipeHandle)>> = Mutex::new(Vec::new());
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn slot() -> MutexGuard<'static, Vec<(u64, PipeHandle)>> {
    SLOT.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Restores the previous binding when dropped.
#[derive(Debug)]
#[must_use = "dropping the guard immediately restores the previous streams"]
pub struct StreamGuard {
    id: u64,
}

/// Make `target` the destination of the process-wide output streams.
pub fn redirect(target: PipeHandle) -> StreamGuard {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    trace!(id, pipe = %target.label(), "redirecting process streams");
    slot().push((id, target));
    StreamGuard { id }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        let mut entries = slot();
        if let Some(pos) = entries.iter().position(|(id, _)| *id == self.id) {
            entries.remove(pos);
        }
        trace!(id = self.id, remaining = entries.len(), "process streams restored");
    }
}

/// The target in-process writes currently go to, if any.
pub fn current() -> Option<PipeHandle> {
    slot().last().map(|(_, handle)| handle.clone())
}

pub fn is_redirected() -> bool {
    !slot().is_empty()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Line-buffered writer following the redirection slot.
///
/// Complete lines are forwarded as soon as they are written; a trailing
/// fragment is forwarded on `flush` or drop. The target is looked up per
/// line, so a writer created before a scope started still follows it.
#[derive(Debug)]
pub struct RedirectWriter {
    stream: Stream,
    pending: Vec<u8>,
}

pub fn stdout() -> RedirectWriter {
    RedirectWriter {
        stream: Stream::Stdout,
        pending: Vec::new(),
    }
}

pub fn stderr() -> RedirectWriter {
    RedirectWriter {
        stream: Stream::Stderr,
        pending: Vec::new(),
    }
}

impl RedirectWriter {
    fn emit(&self, bytes: &[u8]) -> io::Result<()> {
        match current() {
            Some(target) => target.write(&String::from_utf8_lossy(bytes)),
            None => match self.stream {
                Stream::Stdout => io::stdout().lock().write_all(bytes),
                Stream::Stderr => io::stderr().lock().write_all(bytes),
            },
        }
    }
}

impl Write for RedirectWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.emit(&line)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.emit(&rest)?;
        }
        match self.stream {
            Stream::Stdout => io::stdout().flush(),
            Stream::Stderr => io::stderr().flush(),
        }
    }
}

impl Drop for RedirectWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// `println!` that follows the active redirection scope.
#[macro_export]
macro_rules! outln {
    () => {
        $crate::outln!("")
    };
    ($($arg:tt)*) => {{
        use ::std::io::Write as _;
        let mut w = $crate::streams::stdout();
        let _ = ::std::writeln!(w, $($arg)*);
    }};
}

/// `eprintln!` that follows the active redirection scope.
#[macro_export]
macro_rules! errln {
    () => {
        $crate::errln!("")
    };
    ($($arg:tt)*) => {{
        use ::std::io::Write as _;
        let mut w = $crate::streams::stderr();
        let _ = ::std::writeln!(w, $($arg)*);
    }};
}
