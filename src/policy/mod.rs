// src/policy/mod.rs

//! Sink policies: what happens to the lines coming out of a pipe.
//!
//! - [`SinkPolicy::DirectCallback`] hands every line to a caller function and
//!   never touches the process streams.
//! - [`SinkPolicy::LiveLogger`] logs each line to the console immediately
//!   ([`live`]).
//! - [`SinkPolicy::BufferedLogger`] logs into a private file and replays it to
//!   the console as one block at the end ([`buffered`]).
//! - [`SinkPolicy::RootLoggerRedirect`] retags the process-wide root logger and
//!   logs through it ([`root`]).
//!
//! Every variant owns exactly one pipe channel and its reader.

pub mod buffered;
pub mod format;
pub mod live;
pub mod logger;
pub mod root;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::console::{Console, RealConsole};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::pipe::{LineSink, PipeChannel, PipeHandle};
use crate::types::{Identity, PolicyKind};

pub use buffered::BufferedLoggingPipe;
pub use format::LineFormat;
pub use live::LoggingPipe;
pub use logger::{LineLogger, LogOutput};
pub use root::RootLoggingPipe;

/// Collaborators the logging policies write through.
#[derive(Debug, Clone)]
pub struct PolicyEnv {
    /// Directory for buffer files.
    pub buffer_dir: PathBuf,
    pub fs: Arc<dyn FileSystem>,
    /// The real console live output and buffer replays go to.
    pub console: Arc<dyn Console>,
}

impl Default for PolicyEnv {
    fn default() -> Self {
        Self {
            buffer_dir: std::env::temp_dir(),
            fs: Arc::new(RealFileSystem),
            console: Arc::new(RealConsole::Stdout),
        }
    }
}

pub enum SinkPolicy {
    DirectCallback(PipeChannel),
    LiveLogger(LoggingPipe),
    BufferedLogger(BufferedLoggingPipe),
    RootLoggerRedirect(RootLoggingPipe),
}

impl SinkPolicy {
    /// Pipe forwarding each line verbatim to `callback`.
    pub fn callback<F>(label: &str, callback: F) -> Result<Self>
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let sink: Arc<dyn LineSink> = Arc::new(callback);
        Ok(SinkPolicy::DirectCallback(PipeChannel::open(label, sink)?))
    }

    /// Open the logging policy `kind` for `identity`.
    pub fn open(kind: PolicyKind, identity: Identity, env: &PolicyEnv) -> Result<Self> {
        debug!(%identity, policy = %kind, "opening sink policy");
        let policy = match kind {
            PolicyKind::Live => {
                SinkPolicy::LiveLogger(LoggingPipe::live(identity, Arc::clone(&env.console))?)
            }
            PolicyKind::Buffered => SinkPolicy::BufferedLogger(BufferedLoggingPipe::open(
                identity,
                &env.buffer_dir,
                Arc::clone(&env.fs),
                Arc::clone(&env.console),
            )?),
            PolicyKind::RootRedirect => {
                SinkPolicy::RootLoggerRedirect(RootLoggingPipe::open(identity)?)
            }
        };
        Ok(policy)
    }

    /// The logging policy kind, `None` for a direct callback.
    pub fn kind(&self) -> Option<PolicyKind> {
        match self {
            SinkPolicy::DirectCallback(_) => None,
            SinkPolicy::LiveLogger(_) => Some(PolicyKind::Live),
            SinkPolicy::BufferedLogger(_) => Some(PolicyKind::Buffered),
            SinkPolicy::RootLoggerRedirect(_) => Some(PolicyKind::RootRedirect),
        }
    }

    pub fn handle(&self) -> PipeHandle {
        match self {
            SinkPolicy::DirectCallback(channel) => channel.handle(),
            SinkPolicy::LiveLogger(pipe) => pipe.handle(),
            SinkPolicy::BufferedLogger(pipe) => pipe.handle(),
            SinkPolicy::RootLoggerRedirect(pipe) => pipe.handle(),
        }
    }

    /// Start bookkeeping and take over the process streams.
    ///
    /// A direct callback has nothing to activate.
    pub fn activate(&mut self) {
        match self {
            SinkPolicy::DirectCallback(_) => {}
            SinkPolicy::LiveLogger(pipe) => pipe.activate(),
            SinkPolicy::BufferedLogger(pipe) => pipe.activate(),
            SinkPolicy::RootLoggerRedirect(pipe) => pipe.activate(),
        }
    }

    /// Restore streams, drain and release the pipe, flush/replay as needed.
    pub fn deactivate(&mut self) -> Result<()> {
        match self {
            SinkPolicy::DirectCallback(channel) => channel.close().map(drop),
            SinkPolicy::LiveLogger(pipe) => pipe.finish().map(drop),
            SinkPolicy::BufferedLogger(pipe) => pipe.finish().map(drop),
            SinkPolicy::RootLoggerRedirect(pipe) => pipe.finish().map(drop),
        }
    }
}

impl fmt::Debug for SinkPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkPolicy::DirectCallback(channel) => {
                f.debug_tuple("DirectCallback").field(channel).finish()
            }
            SinkPolicy::LiveLogger(pipe) => f.debug_tuple("LiveLogger").field(pipe).finish(),
            SinkPolicy::BufferedLogger(pipe) => f.debug_tuple("BufferedLogger").field(pipe).finish(),
            SinkPolicy::RootLoggerRedirect(pipe) => {
                f.debug_tuple("RootLoggerRedirect").field(pipe).finish()
            }
        }
    }
}
