// src/console/mock.rs

use std::io;
use std::sync::{Arc, Mutex};

use super::Console;

/// In-memory console recording every block written to it.
#[derive(Debug, Clone, Default)]
pub struct MemoryConsole {
    blocks: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, concatenated.
    pub fn contents(&self) -> String {
        let blocks = self.blocks.lock().unwrap();
        let bytes: Vec<u8> = blocks.iter().flatten().copied().collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// The individual `write_all` calls, in order.
    pub fn blocks(&self) -> Vec<String> {
        let blocks = self.blocks.lock().unwrap();
        blocks
            .iter()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.lock().unwrap().is_empty()
    }
}

impl Console for MemoryConsole {
    fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        self.blocks.lock().unwrap().push(buf.to_vec());
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}
