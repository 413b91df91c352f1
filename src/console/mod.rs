// src/console/mod.rs

//! The "real" output a redirected line eventually lands on.
//!
//! Live loggers write each formatted line here immediately, buffered loggers
//! replay their whole buffer here at scope exit. Tests swap in
//! [`mock::MemoryConsole`].

use std::fmt::Debug;
use std::io::{self, Write};

pub mod mock;

/// Abstract console interface.
///
/// `write_all` must emit `buf` as one uninterrupted block with respect to
/// other writers of the same console.
pub trait Console: Send + Sync + Debug {
    fn write_all(&self, buf: &[u8]) -> io::Result<()>;
    fn flush(&self) -> io::Result<()>;
}

/// Process stdout or stderr, bypassing any redirection slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RealConsole {
    #[default]
    Stdout,
    Stderr,
}

impl Console for RealConsole {
    fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        // Holding the lock for the whole call keeps the block contiguous.
        match self {
            RealConsole::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(buf)?;
                out.flush()
            }
            RealConsole::Stderr => {
                let mut err = io::stderr().lock();
                err.write_all(buf)?;
                err.flush()
            }
        }
    }

    fn flush(&self) -> io::Result<()> {
        match self {
            RealConsole::Stdout => io::stdout().flush(),
            RealConsole::Stderr => io::stderr().flush(),
        }
    }
}
