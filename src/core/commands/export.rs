use super::{Builtin, Context};
use crate::core::env::{is_valid_identifier, EnvStore};
use crate::error::{ErrorKind, ShellError};

fn invalid_identifier(cmd: &str, arg: &str) -> ShellError {
    ShellError::new(
        ErrorKind::InvalidArgument,
        format!("{}: '{}': not a valid identifier", cmd, arg),
    )
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportCommand;

impl ExportCommand {
    /// `NAME=value` sets; a bare `NAME` creates an empty variable if missing.
    fn export_one(arg: &str, env: &mut EnvStore) -> Result<(), ShellError> {
        match arg.split_once('=') {
            Some((name, value)) => {
                if !is_valid_identifier(name) {
                    return Err(invalid_identifier("export", arg));
                }
                env.set(name, value)
            }
            None => {
                if !is_valid_identifier(arg) {
                    return Err(invalid_identifier("export", arg));
                }
                if env.exists(arg) {
                    Ok(())
                } else {
                    env.set(arg, "")
                }
            }
        }
    }
}

impl Builtin for ExportCommand {
    fn execute(&self, args: &[String], ctx: &mut Context<'_>) -> Result<i32, ShellError> {
        if args.is_empty() {
            for (name, value) in ctx.state.env.iter() {
                writeln!(ctx.out, "{}={}", name, value)?;
            }
            return Ok(0);
        }

        let mut status = 0;
        for arg in args {
            if let Err(err) = Self::export_one(arg, &mut ctx.state.env) {
                ctx.diag.report(&err);
                status = 1;
            }
        }
        Ok(status)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnsetCommand;

impl Builtin for UnsetCommand {
    fn execute(&self, args: &[String], ctx: &mut Context<'_>) -> Result<i32, ShellError> {
        let mut status = 0;
        for name in args {
            let result = if is_valid_identifier(name) {
                ctx.state.env.unset(name)
            } else {
                Err(invalid_identifier("unset", name))
            };
            if let Err(err) = result {
                ctx.diag.report(&err);
                status = 1;
            }
        }
        Ok(status)
    }
}
