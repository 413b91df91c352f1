// src/policy/root.rs

use std::time::Duration;

use crate::errors::Result;
use crate::logging::{self, RootTagGuard};
use crate::pipe::PipeHandle;
use crate::policy::live::LoggingPipe;
use crate::policy::logger::LineLogger;
use crate::types::Identity;

/// Logging pipe that feeds the process-wide root logger and tags its output
/// with this identity for the duration of the scope.
///
/// Overlapping root scopes share the one root logger: while several are
/// active, root output carries the tag of the most recently activated one.
#[derive(Debug)]
pub struct RootLoggingPipe {
    inner: LoggingPipe,
    tag: Option<RootTagGuard>,
}

impl RootLoggingPipe {
    pub fn open(identity: Identity) -> Result<Self> {
        Ok(Self {
            inner: LoggingPipe::open(identity, LineLogger::root())?,
            tag: None,
        })
    }

    pub fn identity(&self) -> &Identity {
        self.inner.identity()
    }

    pub fn handle(&self) -> PipeHandle {
        self.inner.handle()
    }

    pub fn activate(&mut self) {
        self.tag = Some(logging::tag_root(self.inner.identity().clone()));
        self.inner.activate();
    }

    /// Finish the inner pipe, then drop this scope's root tag.
    pub fn finish(&mut self) -> Result<Duration> {
        let finished = self.inner.finish();
        drop(self.tag.take());
        finished
    }
}
