// src/policy/live.rs

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::console::Console;
use crate::errors::Result;
use crate::pipe::{LineSink, PipeChannel, PipeHandle};
use crate::policy::logger::{LineLogger, LogOutput};
use crate::streams::{self, StreamGuard};
use crate::types::Identity;

/// A pipe whose lines go to a logger, with start/elapsed bookkeeping and
/// takeover of the process streams while active.
///
/// On its own this is the live policy (console logger); the buffered and
/// root-redirect policies wrap it.
#[derive(Debug)]
pub struct LoggingPipe {
    identity: Identity,
    logger: Arc<LineLogger>,
    channel: PipeChannel,
    started: Option<Instant>,
    streams: Option<StreamGuard>,
}

impl LoggingPipe {
    /// Open a pipe feeding `logger`.
    ///
    /// The logger is complete before the reader starts, so the first line
    /// can never race its construction.
    pub fn open(identity: Identity, logger: LineLogger) -> Result<Self> {
        let logger = Arc::new(logger);
        let sink: Arc<dyn LineSink> = logger.clone();
        let channel = PipeChannel::open(&identity.operation, sink)?;

        Ok(Self {
            identity,
            logger,
            channel,
            started: None,
            streams: None,
        })
    }

    /// Live policy: every line is written to `console` as it arrives.
    pub fn live(identity: Identity, console: Arc<dyn Console>) -> Result<Self> {
        let logger = LineLogger::named(&identity, LogOutput::Console(console));
        Self::open(identity, logger)
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn logger(&self) -> &LineLogger {
        &self.logger
    }

    pub fn handle(&self) -> PipeHandle {
        self.channel.handle()
    }

    pub fn is_active(&self) -> bool {
        self.streams.is_some()
    }

    pub fn activate(&mut self) {
        self.started = Some(Instant::now());
        self.logger.log("Starting!");
        self.streams = Some(streams::redirect(self.channel.handle()));
        debug!(identity = %self.identity, logger = %self.logger.name(), "logging pipe active");
    }

    /// Restore the process streams, drain the pipe and log the elapsed time.
    ///
    /// The `Done!` line is logged even when draining failed, then the error
    /// is returned.
    pub fn finish(&mut self) -> Result<Duration> {
        drop(self.streams.take());

        let drained = self.channel.close();
        let elapsed = self.started.map(|t| t.elapsed()).unwrap_or_default();
        self.logger
            .log(&format!("Done! Elapsed {}", format_elapsed(elapsed)));

        let lines = drained?;
        debug!(identity = %self.identity, lines, ?elapsed, "logging pipe finished");
        Ok(elapsed)
    }
}

/// `H:MM:SS.ffffff`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{}:{:02}:{:02}.{:06}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        elapsed.subsec_micros()
    )
}
