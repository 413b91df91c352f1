// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogpipesError {
    #[error("Pipe allocation failed: {0}")]
    Pipe(#[from] nix::errno::Errno),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Line reader '{0}' panicked")]
    ReaderPanicked(String),

    #[error("Scope teardown task failed: {0}")]
    Join(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, LogpipesError>;
