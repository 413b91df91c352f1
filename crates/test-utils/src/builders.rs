#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use logpipes::config::{ConfigFile, RawConfigFile, RedirectConfig, TaskConfig};

/// Builder for `RedirectConfig`.
#[derive(Debug, Default)]
pub struct RedirectConfigBuilder {
    config: RedirectConfig,
}

impl RedirectConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suppress_output(mut self, val: bool) -> Self {
        self.config.suppress_output = val;
        self
    }

    pub fn suppress_buffer(mut self, val: bool) -> Self {
        self.config.suppress_buffer = val;
        self
    }

    pub fn buffer_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.buffer_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> RedirectConfig {
        self.config
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                redirect: RedirectConfig::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_redirect(mut self, redirect: RedirectConfig) -> Self {
        self.config.redirect = redirect;
        self
    }

    pub fn with_task(mut self, name: &str, cmd: &str) -> Self {
        self.config.task.insert(
            name.to_string(),
            TaskConfig {
                cmd: cmd.to_string(),
                component: None,
            },
        );
        self
    }

    pub fn with_component_task(mut self, name: &str, component: &str, cmd: &str) -> Self {
        self.config.task.insert(
            name.to_string(),
            TaskConfig {
                cmd: cmd.to_string(),
                component: Some(component.to_string()),
            },
        );
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
