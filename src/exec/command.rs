// src/exec/command.rs

use anyhow::{bail, Result};
use tokio::process::Command;

/// What to run for a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    /// A command line interpreted by the platform shell.
    Shell(String),
    /// Program and arguments, no shell involved.
    Argv(Vec<String>),
}

impl CommandSpec {
    pub fn build(&self) -> Result<Command> {
        match self {
            CommandSpec::Shell(line) => Ok(shell_command(line)),
            CommandSpec::Argv(argv) => argv_command(argv),
        }
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandSpec::Shell(line) => f.write_str(line),
            CommandSpec::Argv(argv) => f.write_str(&argv.join(" ")),
        }
    }
}

/// Build a shell command appropriate for the platform.
pub fn shell_command(line: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(line);
        c
    }
}

pub fn argv_command(argv: &[String]) -> Result<Command> {
    let Some((program, args)) = argv.split_first() else {
        bail!("empty command line");
    };
    let mut c = Command::new(program);
    c.args(args);
    Ok(c)
}
