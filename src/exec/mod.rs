// src/exec/mod.rs

//! Process execution layer.
//!
//! Runs commands with `tokio::process::Command` inside redirection scopes.
//!
//! - [`command`] builds shell / argv commands.
//! - [`task_runner`] runs one command with stdout/stderr attached to its
//!   scope's pipe.
//! - [`run_tasks`] runs several tasks concurrently, one scope each.

pub mod command;
pub mod task_runner;

use tokio::task::JoinSet;
use tracing::error;

use crate::scope::Redirector;
use crate::types::TaskOutcome;

pub use command::{CommandSpec, shell_command};
pub use task_runner::{TaskSpec, run_task};

/// Run every task concurrently and collect `(operation, outcome)` pairs,
/// sorted by operation name.
///
/// A task whose process could not be run at all is reported as
/// `Failed(-1)`.
pub async fn run_tasks(redirector: &Redirector, tasks: Vec<TaskSpec>) -> Vec<(String, TaskOutcome)> {
    let mut set = JoinSet::new();

    for task in tasks {
        let redirector = redirector.clone();
        set.spawn(async move {
            let name = task.identity.operation.clone();
            match run_task(&redirector, task).await {
                Ok(outcome) => (name, outcome),
                Err(err) => {
                    error!(task = %name, error = %err, "task execution error");
                    (name, TaskOutcome::Failed(-1))
                }
            }
        });
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(pair) => outcomes.push(pair),
            Err(e) => error!(error = %e, "task runner panicked"),
        }
    }

    outcomes.sort_by(|a, b| a.0.cmp(&b.0));
    outcomes
}
