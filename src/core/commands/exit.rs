use super::{Builtin, Context};
use crate::error::{ErrorKind, ShellError};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExitCommand;

impl ExitCommand {
    fn parse_code(raw: &str) -> Result<i32, ShellError> {
        raw.parse::<i32>()
            .ok()
            .filter(|code| (0..=255).contains(code))
            .ok_or_else(|| {
                ShellError::new(
                    ErrorKind::InvalidArgument,
                    format!("exit: invalid exit code '{}', expected 0-255", raw),
                )
            })
    }
}

impl Builtin for ExitCommand {
    /// Stops the read loop; the shell leaves with the returned code.
    fn execute(&self, args: &[String], ctx: &mut Context<'_>) -> Result<i32, ShellError> {
        let code = match args.first() {
            Some(raw) => Self::parse_code(raw)?,
            None => ctx.state.last_exit_status & 0xff,
        };

        writeln!(ctx.out, "Exiting shell with code {}...", code)?;
        ctx.state.running = false;
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::Harness;
    use super::*;

    #[test]
    fn test_exit_with_code() -> Result<(), ShellError> {
        let mut h = Harness::new();
        assert_eq!(h.run("exit", &["3"])?, 3);
        assert!(!h.state.running);
        assert_eq!(h.state.last_exit_status, 3);
        assert_eq!(h.output(), "Exiting shell with code 3...\n");
        Ok(())
    }

    #[test]
    fn test_exit_defaults_to_last_status() -> Result<(), ShellError> {
        let mut h = Harness::new();
        h.state.last_exit_status = 127;
        assert_eq!(h.run("exit", &[])?, 127);
        Ok(())
    }

    #[test]
    fn test_exit_rejects_bad_codes() {
        let mut h = Harness::new();
        for raw in ["256", "-1", "abc"] {
            let err = h.run("exit", &[raw]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert!(h.state.running);
    }
}
