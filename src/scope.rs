// src/scope.rs

//! Redirection scopes: pick a sink policy from caller configuration and keep
//! it active around a unit of work.
//!
//! [`Redirector::run`] / [`Redirector::run_async`] are the entry points. The
//! policy is torn down on every exit path: normal return, error return and
//! panics (via [`ActiveScope`]'s `Drop`). The work's own result always comes
//! back unchanged; teardown problems only surface when the work succeeded.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, warn};

use crate::config::RedirectConfig;
use crate::console::Console;
use crate::errors::{LogpipesError, Result};
use crate::fs::FileSystem;
use crate::pipe::PipeHandle;
use crate::policy::{PolicyEnv, SinkPolicy};
use crate::types::{Identity, PolicyKind, component_name};

/// Which policy `config` asks for.
///
/// `suppress_output` wins over `suppress_buffer`; buffering is the default.
pub fn select(config: &RedirectConfig) -> PolicyKind {
    if config.suppress_output {
        PolicyKind::RootRedirect
    } else if config.suppress_buffer {
        PolicyKind::Live
    } else {
        PolicyKind::Buffered
    }
}

/// Run `work` inside a redirection scope chosen from `config`, writing to the
/// real stdout and the system temp/`buffer_dir`.
pub fn logpipes<T, E, F>(
    config: &RedirectConfig,
    identity: Identity,
    work: F,
) -> std::result::Result<T, E>
where
    F: FnOnce(&PipeHandle) -> std::result::Result<T, E>,
    E: From<LogpipesError>,
{
    Redirector::new(config.clone()).run(identity, work)
}

/// Run `work` while every line written to the handed-out pipe goes to
/// `callback`. The process streams are left alone.
pub fn capture<T, E, F, C>(label: &str, callback: C, work: F) -> std::result::Result<T, E>
where
    F: FnOnce(&PipeHandle) -> std::result::Result<T, E>,
    C: Fn(&str) + Send + Sync + 'static,
    E: From<LogpipesError>,
{
    let scope = ActiveScope::new(SinkPolicy::callback(label, callback).map_err(E::from)?);
    let result = work(&scope.handle());
    combine(result, scope.close())
}

/// Configured factory for redirection scopes.
#[derive(Debug, Clone)]
pub struct Redirector {
    config: RedirectConfig,
    env: PolicyEnv,
}

impl Redirector {
    pub fn new(config: RedirectConfig) -> Self {
        let env = PolicyEnv {
            buffer_dir: config.buffer_dir(),
            ..PolicyEnv::default()
        };
        Self { config, env }
    }

    /// Console that live output and buffer replays are written to.
    pub fn with_console(mut self, console: Arc<dyn Console>) -> Self {
        self.env.console = console;
        self
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.env.fs = fs;
        self
    }

    pub fn with_buffer_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.env.buffer_dir = dir.into();
        self
    }

    pub fn config(&self) -> &RedirectConfig {
        &self.config
    }

    pub fn policy(&self) -> PolicyKind {
        select(&self.config)
    }

    /// Open and activate the selected policy for `identity`.
    pub fn open(&self, identity: Identity) -> Result<ActiveScope> {
        let mut policy = SinkPolicy::open(self.policy(), identity, &self.env)?;
        policy.activate();
        Ok(ActiveScope::new(policy))
    }

    pub fn run<T, E, F>(&self, identity: Identity, work: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&PipeHandle) -> std::result::Result<T, E>,
        E: From<LogpipesError>,
    {
        let scope = self.open(identity).map_err(E::from)?;
        let result = work(&scope.handle());
        combine(result, scope.close())
    }

    /// Async variant of [`run`](Self::run).
    ///
    /// Teardown joins the pipe reader and replays buffers, so it runs on the
    /// blocking pool. Must be called from within a Tokio runtime.
    ///
    /// If the returned future is dropped before completion (a timeout, a
    /// cancelled `select!`), the scope is torn down synchronously in that
    /// drop: inside `block_in_place` on a multi-threaded runtime, directly on
    /// the polling thread on a current-thread runtime.
    pub async fn run_async<T, E, F, Fut>(
        &self,
        identity: Identity,
        work: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce(PipeHandle) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<LogpipesError>,
    {
        let scope = self.open(identity).map_err(E::from)?;
        let result = work(scope.handle()).await;

        let closed = match tokio::task::spawn_blocking(move || scope.close()).await {
            Ok(closed) => closed,
            Err(e) => Err(LogpipesError::Join(e.to_string())),
        };
        combine(result, closed)
    }
}

/// An activated sink policy. Dropping it deactivates the policy.
#[derive(Debug)]
pub struct ActiveScope {
    handle: PipeHandle,
    policy: Option<SinkPolicy>,
}

impl ActiveScope {
    fn new(policy: SinkPolicy) -> Self {
        Self {
            handle: policy.handle(),
            policy: Some(policy),
        }
    }

    pub fn handle(&self) -> PipeHandle {
        self.handle.clone()
    }

    pub fn kind(&self) -> Option<PolicyKind> {
        self.policy.as_ref().and_then(SinkPolicy::kind)
    }

    /// Deactivate now and report teardown errors.
    pub fn close(mut self) -> Result<()> {
        match self.policy.take() {
            Some(mut policy) => policy.deactivate(),
            None => Ok(()),
        }
    }
}

impl Drop for ActiveScope {
    fn drop(&mut self) {
        let Some(mut policy) = self.policy.take() else {
            return;
        };
        let label = self.handle.label();
        debug!(pipe = %label, "redirection scope dropped without close");

        let mut teardown = || {
            if let Err(e) = policy.deactivate() {
                warn!(pipe = %label, error = %e, "redirection scope teardown failed");
            }
        };

        // Teardown blocks on the reader thread. On a multi-threaded runtime
        // worker, let the scheduler move other tasks away meanwhile.
        match Handle::try_current() {
            Ok(rt) if rt.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(teardown)
            }
            _ => teardown(),
        }
    }
}

fn combine<T, E>(
    result: std::result::Result<T, E>,
    closed: Result<()>,
) -> std::result::Result<T, E>
where
    E: From<LogpipesError>,
{
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(E::from(e)),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(e)) => {
            warn!(error = %e, "redirection teardown failed after the wrapped work failed");
            Err(err)
        }
    }
}

/// Types whose operations run inside redirection scopes.
///
/// The equivalent of decorating a method: implementors provide their
/// configuration and call [`redirected`](Redirected::redirected) with the
/// operation name.
pub trait Redirected {
    fn redirect_config(&self) -> &RedirectConfig;

    /// Component shown in line prefixes. Defaults to the type name without
    /// `Watcher`.
    fn component(&self) -> String {
        component_name::<Self>()
    }

    /// Scope factory used by [`redirected`](Redirected::redirected).
    fn redirector(&self) -> Redirector {
        Redirector::new(self.redirect_config().clone())
    }

    fn redirected<T, E, F>(&self, operation: &str, work: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&PipeHandle) -> std::result::Result<T, E>,
        E: From<LogpipesError>,
    {
        let identity = Identity::new(self.component(), operation);
        self.redirector().run(identity, work)
    }
}
