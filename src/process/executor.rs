use std::io;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use super::resolve;
use crate::core::env::EnvStore;
use crate::error::{ErrorKind, ShellError};

/// Exit code of a finished child; `128 + N` when signal `N` killed it.
pub fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => 255,
    }
}

fn spawn_error(path: &Path, err: io::Error) -> ShellError {
    // a missing image is reported like an unresolved name
    let kind = if err.kind() == io::ErrorKind::NotFound {
        ErrorKind::CommandNotFound
    } else {
        ErrorKind::ProcessCreationFailure
    };
    ShellError::with_source(kind, format!("exec: {}", path.display()), err)
}

/// Runs `path` with `argv` (whose first element stays the child's `argv[0]`)
/// and blocks until it finishes.
pub fn invoke(path: &Path, argv: &[String], env: &EnvStore) -> Result<i32, ShellError> {
    let (arg0, rest) = argv
        .split_first()
        .ok_or_else(|| ShellError::new(ErrorKind::InvalidArgument, "exec: empty argv"))?;

    let mut child = Command::new(path)
        .arg0(arg0)
        .args(rest)
        .envs(env.iter())
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| spawn_error(path, e))?;

    let status = child.wait().map_err(|e| {
        ShellError::with_source(ErrorKind::SystemCallFailure, format!("wait: {}", arg0), e)
    })?;
    Ok(exit_code(status))
}

/// Resolves `command` and runs it with `args` (name included).
/// An unresolvable command fails with `CommandNotFound` and nothing is spawned.
pub fn execute_external(command: &str, args: &[String], env: &EnvStore) -> Result<i32, ShellError> {
    let path = resolve(command, env)
        .ok_or_else(|| ShellError::new(ErrorKind::CommandNotFound, command))?;
    invoke(&path, args, env)
}
