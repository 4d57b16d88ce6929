use std::ffi::CString;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use crate::core::env::EnvStore;

/// A non-directory the current user may execute.
pub fn is_executable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) if !meta.is_dir() => {}
        _ => return false,
    }
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: c_path is NUL-terminated and outlives the call.
    unsafe { libc::access(c_path.as_ptr(), libc::X_OK) == 0 }
}

/// Finds the executable a command name refers to.
///
/// Names containing `/` are checked as given and never looked up in `PATH`.
/// Bare names are tried against each `PATH` directory in order.
pub fn resolve(command: &str, env: &EnvStore) -> Option<PathBuf> {
    if command.is_empty() {
        return None;
    }

    if command.contains('/') {
        let path = PathBuf::from(command);
        return is_executable(&path).then_some(path);
    }

    env.path_dirs()?
        .iter()
        .map(|dir| Path::new(dir).join(command))
        .find(|candidate| is_executable(candidate))
}
