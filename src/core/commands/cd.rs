use super::{Builtin, Context};
use crate::error::{ErrorKind, ShellError};
use std::env;

/// `cd` targets of this many bytes or more are rejected.
pub const MAX_PATH_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, Default)]
pub struct CdCommand;

impl Builtin for CdCommand {
    fn execute(&self, args: &[String], ctx: &mut Context<'_>) -> Result<i32, ShellError> {
        let target = match args.first() {
            Some(dir) => dir.clone(),
            None => ctx
                .state
                .env
                .get("HOME")
                .map(|home| home.into_owned())
                .ok_or_else(|| ShellError::new(ErrorKind::EnvironmentError, "cd: HOME not set"))?,
        };

        if target.len() >= MAX_PATH_SIZE {
            return Err(ShellError::new(
                ErrorKind::InvalidPath,
                format!("cd: path of {} bytes", target.len()),
            ));
        }

        env::set_current_dir(&target).map_err(|e| ShellError::from_io(e, format!("cd: {}", target)))?;

        let cwd = env::current_dir().map_err(|e| {
            ShellError::with_source(ErrorKind::SystemCallFailure, "cd: getcwd", e)
        })?;
        ctx.state.env.set("PWD", &cwd.to_string_lossy())?;
        ctx.diag.debug(&format!("cd: now in {}", cwd.display()));
        ctx.state.current_dir = cwd;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{Harness, CWD_LOCK};
    use super::*;
    use std::fs;

    #[test]
    fn test_cd_updates_state_and_pwd() -> Result<(), ShellError> {
        let _guard = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let original = env::current_dir()?;
        let dir = tempfile::tempdir()?;
        let target = dir.path().canonicalize()?;

        let mut h = Harness::new();
        let result = h.run("cd", &[target.to_str().unwrap()]);
        let now = env::current_dir();
        env::set_current_dir(&original)?;

        assert_eq!(result?, 0);
        assert_eq!(now?, target);
        assert_eq!(h.state.current_dir, target);
        assert_eq!(
            h.state.env.get("PWD").map(|v| v.into_owned()),
            Some(target.to_string_lossy().into_owned())
        );
        Ok(())
    }

    #[test]
    fn test_cd_home() -> Result<(), ShellError> {
        let _guard = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let original = env::current_dir()?;
        let dir = tempfile::tempdir()?;
        let home = dir.path().canonicalize()?;

        let mut h = Harness::new();
        h.state.env.set("HOME", &home.to_string_lossy())?;
        let result = h.run("cd", &[]);
        env::set_current_dir(&original)?;

        assert_eq!(result?, 0);
        assert_eq!(h.state.current_dir, home);
        Ok(())
    }

    #[test]
    fn test_cd_without_home() {
        let mut h = Harness::new();
        let err = h.run("cd", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EnvironmentError);
    }

    #[test]
    fn test_cd_errors() -> Result<(), ShellError> {
        let _guard = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("plain.txt");
        fs::write(&file, "x")?;

        let mut h = Harness::new();
        let missing = h.run("cd", &["/path/that/does/not/exist"]).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::FileNotFound);

        let not_dir = h.run("cd", &[file.to_str().unwrap()]).unwrap_err();
        assert_eq!(not_dir.kind(), ErrorKind::InvalidPath);

        let long = "a".repeat(MAX_PATH_SIZE);
        assert_eq!(h.run("cd", &[&long]).unwrap_err().kind(), ErrorKind::InvalidPath);
        Ok(())
    }
}
