//! External command execution.

use std::{
    io,
    process::{Command, Stdio},
};

use tracing::{debug, trace};

use crate::error::{ProtoregError, ProtoregResult};

/// Outcome of a finished external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external programs to completion.
pub trait CommandRunner {
    /// Runs `program` with `args` and waits for it to exit.
    ///
    /// An `Err` means the program could not be started at all; a non-zero exit is reported
    /// through [`CommandOutput::code`].
    fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput>;
}

/// Runs commands with [`std::process::Command`], inheriting the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        Ok(CommandOutput {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs a command and turns launch failures and non-zero exits into errors.
pub(crate) fn run_checked<R: CommandRunner + ?Sized>(
    runner: &R,
    program: &str,
    args: &[String],
) -> ProtoregResult<()> {
    debug!(program = program, args = ?args, "running command");

    let output = runner
        .run(program, args)
        .map_err(|err| ProtoregError::CommandLaunch {
            program: program.to_string(),
            source: err,
        })?;

    if !output.success() {
        return Err(ProtoregError::CommandFailed {
            program: program.to_string(),
            code: output.code,
            stderr: output.stderr,
        });
    }

    trace!(program = program, "command finished");
    Ok(())
}
