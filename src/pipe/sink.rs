// src/pipe/sink.rs

//! Line consumers.

/// Something that consumes text one line at a time.
///
/// Sinks are called from the channel's reader thread and, for direct
/// in-process writes, from whichever thread wrote. They never see partial
/// lines or multi-line batches.
pub trait LineSink: Send + Sync {
    fn consume(&self, line: &str);
}

impl<F> LineSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn consume(&self, line: &str) {
        self(line)
    }
}

/// Split an in-process write buffer into lines the way they would have come
/// out of the pipe: trailing whitespace of the whole buffer dropped, lines
/// broken at `\n`, `\r\n` and a bare `\r`, then each line right-trimmed.
pub fn split_lines(buf: &str) -> impl Iterator<Item = &str> {
    buf.trim_end()
        .lines()
        .flat_map(|line| line.split('\r'))
        .map(str::trim_end)
}
