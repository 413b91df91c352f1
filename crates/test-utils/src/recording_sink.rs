use std::sync::{Arc, Mutex};

use logpipes::LineSink;

/// A sink that records every line it receives, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn as_sink(&self) -> Arc<dyn LineSink> {
        Arc::new(self.clone())
    }

    /// A callback usable with `SinkPolicy::callback` / `logpipes::capture`.
    pub fn callback(&self) -> impl Fn(&str) + Send + Sync + 'static {
        let lines = Arc::clone(&self.lines);
        move |line: &str| lines.lock().unwrap().push(line.to_string())
    }
}

impl LineSink for RecordingSink {
    fn consume(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}
