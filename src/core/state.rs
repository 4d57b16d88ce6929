use std::env;
use std::path::{Path, PathBuf};

use crate::core::env::{EnvStore, DEFAULT_HOME};
use crate::error::{ErrorKind, ShellError};

pub struct ShellState {
    pub current_dir: PathBuf,
    pub env: EnvStore,
    pub last_exit_status: i32,
    pub running: bool,
    /// Set when a user is at the terminal; builtins may ask before
    /// destructive steps only then.
    pub interactive: bool,
}

impl ShellState {
    /// Starts in the process working directory. If it cannot be read, moves
    /// to `/tmp` instead; failing that too is fatal.
    pub fn new(mut env: EnvStore) -> Result<Self, ShellError> {
        let current_dir = match env::current_dir() {
            Ok(dir) => dir,
            Err(_) => {
                let fallback = PathBuf::from(DEFAULT_HOME);
                env::set_current_dir(&fallback).map_err(|e| {
                    ShellError::with_source(ErrorKind::SystemCallFailure, "startup: chdir /tmp", e)
                })?;
                fallback
            }
        };
        env.init_defaults(&current_dir)?;
        Ok(Self::with_dir(current_dir, env))
    }

    /// Builds state around a known directory without touching the process.
    pub fn with_dir(current_dir: impl AsRef<Path>, env: EnvStore) -> Self {
        Self {
            current_dir: current_dir.as_ref().to_path_buf(),
            env,
            last_exit_status: 0,
            running: true,
            interactive: false,
        }
    }

    /// Last path component of the working directory, `/` at the root.
    pub fn dir_name(&self) -> String {
        self.current_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "/".to_string())
    }
}
