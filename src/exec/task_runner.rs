// src/exec/task_runner.rs

//! Individual task process runner.

use std::process::Stdio;

use anyhow::{Context, Result};
use tracing::info;

use crate::exec::command::CommandSpec;
use crate::pipe::PipeHandle;
use crate::scope::Redirector;
use crate::types::{Identity, TaskOutcome};

/// A command plus the identity its output is tagged with.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub identity: Identity,
    pub command: CommandSpec,
}

impl TaskSpec {
    pub fn shell(identity: Identity, line: impl Into<String>) -> Self {
        Self {
            identity,
            command: CommandSpec::Shell(line.into()),
        }
    }

    pub fn argv(identity: Identity, argv: Vec<String>) -> Self {
        Self {
            identity,
            command: CommandSpec::Argv(argv),
        }
    }
}

/// Run a single task process inside its own redirection scope.
///
/// The child's stdout and stderr both write into the scope's pipe, so its
/// lines follow whatever policy `redirector` selects.
pub async fn run_task(redirector: &Redirector, task: TaskSpec) -> Result<TaskOutcome> {
    let identity = task.identity.clone();
    redirector
        .run_async(identity, move |pipe| async move { run_in_pipe(&task, &pipe).await })
        .await
}

async fn run_in_pipe(task: &TaskSpec, pipe: &PipeHandle) -> Result<TaskOutcome> {
    info!(
        task = %task.identity,
        cmd = %task.command,
        "starting task process"
    );

    let mut cmd = task.command.build()?;
    cmd.stdin(Stdio::null())
        .stdout(pipe.stdio().context("attaching stdout to pipe")?)
        .stderr(pipe.stdio().context("attaching stderr to pipe")?)
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for task '{}'", task.identity))?;
    // The command keeps its own copies of the write end until dropped.
    drop(cmd);

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{}'", task.identity))?;

    let code = status.code().unwrap_or(-1);
    let outcome = if status.success() {
        TaskOutcome::Success
    } else {
        TaskOutcome::Failed(code)
    };

    info!(
        task = %task.identity,
        exit_code = code,
        success = status.success(),
        "task process exited"
    );

    Ok(outcome)
}
