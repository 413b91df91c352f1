// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::scope::select;
use crate::types::PolicyKind;

/// Configuration exactly as read from a TOML file.
///
/// ```toml
/// [redirect]
/// suppress_output = false
/// suppress_buffer = true
/// buffer_dir = "/tmp"
///
/// [task.build]
/// cmd = "make all"
/// component = "Build"
/// ```
///
/// All sections are optional at this level; [`ConfigFile`] is the validated
/// form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub redirect: RedirectConfig,

    /// All tasks from `[task.<name>]`. Keys double as operation names.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)` or
/// [`load_and_validate`](crate::config::load_and_validate).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub redirect: RedirectConfig,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        redirect: RedirectConfig,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self { redirect, task }
    }
}

/// Caller flags deciding how a redirection scope treats output.
///
/// - `suppress_output`: merge identity-tagged lines into the root logger.
/// - `suppress_buffer`: log lines to the console as they arrive.
/// - neither: buffer per scope and print one block at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RedirectConfig {
    pub suppress_output: bool,
    pub suppress_buffer: bool,
    /// Where buffer files go; the system temp dir when unset.
    pub buffer_dir: Option<PathBuf>,
}

impl RedirectConfig {
    pub fn policy(&self) -> PolicyKind {
        select(self)
    }

    pub fn buffer_dir(&self) -> PathBuf {
        self.buffer_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// OR the command-line flags onto this configuration.
    pub fn merge_flags(&mut self, suppress_output: bool, suppress_buffer: bool) {
        self.suppress_output |= suppress_output;
        self.suppress_buffer |= suppress_buffer;
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskConfig {
    /// Shell command to run.
    pub cmd: String,

    /// Component shown in line prefixes; falls back to the CLI `--component`.
    #[serde(default)]
    pub component: Option<String>,
}
