// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{LogpipesError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::LogpipesError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.redirect, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_redirect(cfg)?;
    validate_tasks(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(LogpipesError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_redirect(cfg: &RawConfigFile) -> Result<()> {
    if let Some(dir) = &cfg.redirect.buffer_dir {
        if !dir.is_dir() {
            return Err(LogpipesError::ConfigError(format!(
                "[redirect].buffer_dir {:?} is not an existing directory",
                dir
            )));
        }
    }
    Ok(())
}

/// Task names end up in buffer file names, so they must be usable as one
/// path component.
fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if name.trim().is_empty() || name.contains(['/', '\\', '\0']) {
            return Err(LogpipesError::ConfigError(format!(
                "task name '{}' cannot be used in a file name",
                name.escape_debug()
            )));
        }
        if task.cmd.trim().is_empty() {
            return Err(LogpipesError::ConfigError(format!(
                "task '{}' has an empty `cmd`",
                name
            )));
        }
        if task.component.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(LogpipesError::ConfigError(format!(
                "task '{}' has an empty `component`",
                name
            )));
        }
    }
    Ok(())
}
