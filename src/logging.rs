// src/logging.rs

//! Logging setup for `logpipes` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `LOGPIPES_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! The installed subscriber is the *root logger*: a registry with an
//! `EnvFilter` and one `fmt` layer whose event formatter is
//! [`LineFormat::root`]. Root-redirect scopes tag it through [`tag_root`]; the
//! tags form a stack keyed by guard id, the most recent live tag wins and a
//! guard dropped out of order only removes its own entry.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing::trace;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;
use crate::console::{Console, RealConsole};
use crate::policy::{LineFormat, LogOutput};
use crate::types::Identity;

static INSTALLED: AtomicBool = AtomicBool::new(false);
static ROOT_TAGS: Mutex<Vec<(u64, Identity)>> = Mutex::new(Vec::new());
static NEXT_TAG: AtomicU64 = AtomicU64::new(1);

fn root_tags() -> MutexGuard<'static, Vec<(u64, Identity)>> {
    ROOT_TAGS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Initialise the global root logger on stderr.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("LOGPIPES_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    // Keep stdout free for task output.
    init_with_console(level, Arc::new(RealConsole::Stderr))
}

/// Initialise the global root logger writing to `console`.
pub fn init_with_console(level: tracing::Level, console: Arc<dyn Console>) -> Result<()> {
    let filter = EnvFilter::default().add_directive(LevelFilter::from_level(level).into());
    let layer = fmt::layer()
        .with_ansi(false)
        .event_format(LineFormat::root())
        .with_writer(LogOutput::Console(console));

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()?;

    INSTALLED.store(true, Ordering::Release);
    Ok(())
}

/// Whether [`init_logging`] / [`init_with_console`] installed the root logger.
pub fn root_installed() -> bool {
    INSTALLED.load(Ordering::Acquire)
}

/// Removes its tag from the root logger when dropped.
#[derive(Debug)]
#[must_use = "dropping the guard immediately removes the root tag"]
pub struct RootTagGuard {
    id: u64,
}

/// Tag root logger output with `identity` until the guard is dropped.
pub fn tag_root(identity: Identity) -> RootTagGuard {
    let id = NEXT_TAG.fetch_add(1, Ordering::Relaxed);
    trace!(id, %identity, "tagging root logger");
    root_tags().push((id, identity));
    RootTagGuard { id }
}

impl Drop for RootTagGuard {
    fn drop(&mut self) {
        let remaining = {
            let mut tags = root_tags();
            if let Some(pos) = tags.iter().position(|(id, _)| *id == self.id) {
                tags.remove(pos);
            }
            tags.len()
        };
        // Logged after the lock is released: the root formatter takes it too.
        trace!(id = self.id, remaining, "root tag removed");
    }
}

/// Tag the root logger currently prints with, if any.
pub fn root_identity() -> Option<Identity> {
    root_tags().last().map(|(_, identity)| identity.clone())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
