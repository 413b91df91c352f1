// src/pipe/reader.rs

//! Background reader draining the read end of a pipe.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::os::fd::OwnedFd;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, trace};

use crate::errors::{LogpipesError, Result};
use crate::pipe::sink::LineSink;

/// One OS thread per channel, blocking on `read` until every holder of the
/// write end has closed it.
pub struct LineReaderTask {
    label: String,
    handle: Option<JoinHandle<std::io::Result<u64>>>,
}

impl LineReaderTask {
    /// Start draining `read_fd` into `sink`.
    ///
    /// The read stream is owned by the thread and closed when the loop ends.
    pub fn spawn(label: &str, read_fd: OwnedFd, sink: Arc<dyn LineSink>) -> Result<Self> {
        let thread_label = label.to_string();
        let handle = thread::Builder::new()
            .name(format!("logpipes-reader-{label}"))
            .spawn(move || {
                let reader = BufReader::new(File::from(read_fd));
                let res = drain_lines(reader, sink.as_ref());
                debug!(pipe = %thread_label, lines = ?res.as_ref().ok(), "pipe reader reached end of data");
                res
            })?;

        Ok(Self {
            label: label.to_string(),
            handle: Some(handle),
        })
    }

    /// Wait for the reader to observe end-of-data.
    ///
    /// Returns the number of lines delivered. Joining twice returns `Ok(0)`.
    pub fn join(&mut self) -> Result<u64> {
        let Some(handle) = self.handle.take() else {
            return Ok(0);
        };

        match handle.join() {
            Ok(res) => Ok(res?),
            Err(_) => Err(LogpipesError::ReaderPanicked(self.label.clone())),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }
}

/// Forward every line of `reader` to `sink` until end of data.
///
/// Lines are split on `\n`, decoded lossily and right-trimmed, so `\r\n`
/// endings vanish too; a bare `\r` inside a line (progress output) splits it
/// further. A trailing fragment without a newline is still delivered as the
/// last line.
pub fn drain_lines<R: BufRead>(mut reader: R, sink: &dyn LineSink) -> std::io::Result<u64> {
    let mut buf = Vec::new();
    let mut count = 0u64;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        trace!(bytes = buf.len(), "pipe line");
        for part in line.trim_end().split('\r') {
            sink.consume(part.trim_end());
            count += 1;
        }
    }

    Ok(count)
}
