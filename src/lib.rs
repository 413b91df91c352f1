// src/lib.rs

//! Capture what subprocesses (or in-process writers) print and route every
//! line to a chosen sink: a callback, a live console logger, a per-task buffer
//! replayed as one block, or the identity-tagged root logger.
//!
//! The moving parts, leaf to root:
//! - [`pipe`]: OS pipe + background line reader.
//! - [`policy`]: what happens to each line.
//! - [`streams`]: the process-wide redirection slot in-process writers follow.
//! - [`scope`]: picks a policy from [`RedirectConfig`] and keeps it active
//!   around a unit of work.

pub mod cli;
pub mod config;
pub mod console;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipe;
pub mod policy;
pub mod scope;
pub mod streams;
pub mod types;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::config::loader::load_and_validate;
use crate::exec::{TaskSpec, run_tasks};

pub use crate::config::RedirectConfig;
pub use crate::errors::LogpipesError;
pub use crate::pipe::{LineSink, PipeChannel, PipeHandle};
pub use crate::scope::{ActiveScope, Redirected, Redirector, capture, logpipes, select};
pub use crate::types::{Identity, PolicyKind, TaskOutcome};

/// High-level entry point used by `main.rs`.
///
/// Runs either the command given after `--` or the configured tasks, each in
/// its own redirection scope. Returns whether every task succeeded.
pub async fn run(args: CliArgs) -> Result<bool> {
    let (mut redirect, tasks) = if args.command.is_empty() {
        let config_path = PathBuf::from(&args.config);
        let cfg = load_and_validate(&config_path)?;
        let tasks = configured_tasks(&cfg, &args)?;
        (cfg.redirect, tasks)
    } else {
        let identity = Identity::new(&args.component, &args.operation);
        (
            RedirectConfig::default(),
            vec![TaskSpec::argv(identity, args.command.clone())],
        )
    };
    redirect.merge_flags(args.suppress_output, args.suppress_buffer);

    if args.dry_run {
        print_dry_run(&redirect, &tasks);
        return Ok(true);
    }

    let redirector = Redirector::new(redirect);
    info!(policy = %redirector.policy(), tasks = tasks.len(), "running tasks");

    let outcomes = run_tasks(&redirector, tasks).await;
    let mut all_ok = true;
    for (name, outcome) in &outcomes {
        if !outcome.is_success() {
            warn!(task = %name, ?outcome, "task failed");
            all_ok = false;
        }
    }

    Ok(all_ok)
}

/// Tasks from the config file, narrowed to `--task` selections if any.
fn configured_tasks(cfg: &ConfigFile, args: &CliArgs) -> Result<Vec<TaskSpec>> {
    for wanted in &args.task {
        if !cfg.task.contains_key(wanted) {
            return Err(LogpipesError::ConfigError(format!("unknown task '{wanted}'")).into());
        }
    }

    let tasks = cfg
        .task
        .iter()
        .filter(|(name, _)| args.task.is_empty() || args.task.contains(*name))
        .map(|(name, task)| {
            let component = task.component.as_deref().unwrap_or(&args.component);
            TaskSpec::shell(Identity::new(component, name.as_str()), task.cmd.as_str())
        })
        .collect();

    Ok(tasks)
}

/// Simple dry-run output: print the policy and the tasks.
fn print_dry_run(redirect: &RedirectConfig, tasks: &[TaskSpec]) {
    println!("logpipes dry-run");
    println!("  redirect.suppress_output = {}", redirect.suppress_output);
    println!("  redirect.suppress_buffer = {}", redirect.suppress_buffer);
    println!("  redirect.buffer_dir = {}", redirect.buffer_dir().display());
    println!("  policy = {}", redirect.policy());
    println!();

    println!("tasks ({}):", tasks.len());
    for task in tasks {
        println!("  - {}", task.identity);
        println!("      cmd: {}", task.command);
    }

    debug!("dry-run complete (no execution)");
}
