// src/policy/logger.rs

//! Loggers that redirected lines are fed into.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, Dispatch, Level};
use tracing_subscriber::fmt::MakeWriter;

use crate::console::Console;
use crate::pipe::LineSink;
use crate::policy::format::LineFormat;
use crate::types::Identity;

/// Target of every redirected line event.
pub const LINE_TARGET: &str = "logpipes::line";

/// Where a logger's formatted lines are written.
#[derive(Clone)]
pub enum LogOutput {
    /// Straight to a console, one `write_all` per line.
    Console(Arc<dyn Console>),
    /// Into a private buffer file.
    Buffer(Arc<Mutex<Box<dyn Write + Send>>>),
}

impl LogOutput {
    pub fn buffer(file: Box<dyn Write + Send>) -> Self {
        LogOutput::Buffer(Arc::new(Mutex::new(file)))
    }
}

impl fmt::Debug for LogOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogOutput::Console(console) => f.debug_tuple("Console").field(console).finish(),
            LogOutput::Buffer(_) => f.write_str("Buffer"),
        }
    }
}

impl Write for LogOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogOutput::Console(console) => console.write_all(buf)?,
            LogOutput::Buffer(file) => file
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .write_all(buf)?,
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogOutput::Console(console) => console.flush(),
            LogOutput::Buffer(file) => file.lock().unwrap_or_else(PoisonError::into_inner).flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for LogOutput {
    type Writer = LogOutput;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// A logger a sink policy forwards lines to.
///
/// A *named* logger is a private `tracing` dispatcher tagged with one
/// identity; its events never reach the process-wide subscriber. The *root*
/// logger emits through whatever subscriber is installed globally.
pub struct LineLogger {
    name: String,
    dispatch: Option<Dispatch>,
    output: Option<LogOutput>,
}

impl LineLogger {
    pub fn named(identity: &Identity, output: LogOutput) -> Self {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(output.clone())
            .with_ansi(false)
            .with_max_level(Level::TRACE)
            .event_format(LineFormat::tagged(identity.clone()))
            .finish();

        Self {
            name: format!("{}{}", identity.component, identity.operation),
            dispatch: Some(Dispatch::new(subscriber)),
            output: Some(output),
        }
    }

    pub fn root() -> Self {
        Self {
            name: "root".to_string(),
            dispatch: None,
            output: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        self.dispatch.is_none()
    }

    pub fn log(&self, line: &str) {
        match &self.dispatch {
            Some(dispatch) => {
                tracing::dispatcher::with_default(dispatch, || info!(target: LINE_TARGET, "{line}"))
            }
            None => info!(target: LINE_TARGET, "{line}"),
        }
    }

    pub fn flush(&self) -> io::Result<()> {
        match &self.output {
            Some(output) => output.clone().flush(),
            None => Ok(()),
        }
    }
}

impl LineSink for LineLogger {
    fn consume(&self, line: &str) {
        self.log(line)
    }
}

impl fmt::Debug for LineLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineLogger")
            .field("name", &self.name)
            .field("output", &self.output)
            .finish()
    }
}
