use std::fs;
use std::path::{Path, PathBuf};

use crate::core::Session;
use crate::diagnostics::{Diagnostics, Ledger, LogLevel, LogSink};
use crate::error::ShellError;
use crate::flags::Flags;

pub const LOG_FILE_NAME: &str = ".myshell.log";
pub const RC_FILE_NAME: &str = ".myshellrc";

/// Startup settings derived from the command line and the home directory.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub log_path: Option<PathBuf>,
    pub rc_path: Option<PathBuf>,
    pub debug: bool,
    pub quiet: bool,
}

impl Config {
    pub fn from_flags(flags: &Flags) -> Self {
        let home = dirs::home_dir();
        let in_home = |name: &str, disabled: bool| match (&home, disabled) {
            (Some(home), false) => Some(home.join(name)),
            _ => None,
        };

        Self {
            log_path: in_home(LOG_FILE_NAME, flags.is_set("no-log")),
            rc_path: in_home(RC_FILE_NAME, flags.is_set("no-rc")),
            debug: flags.is_set("debug"),
            quiet: flags.is_set("quiet"),
        }
    }

    /// Opens the log file if one is configured. A log that cannot be opened
    /// leaves file logging off and says so on stderr.
    pub fn open_diagnostics(&self) -> Diagnostics {
        let (sink, open_error) = match &self.log_path {
            Some(path) => match LogSink::open(path) {
                Ok(sink) => (sink, None),
                Err(err) => (LogSink::stderr_only(), Some(err)),
            },
            None => (LogSink::stderr_only(), None),
        };

        let mut diag = Diagnostics::new(sink, Ledger::new());
        if self.debug {
            diag.sink_mut().set_mirror_level(LogLevel::Debug);
        }
        if let Some(err) = open_error {
            diag.warning(&format!("{}; file logging disabled", err));
        }
        diag.info("Diagnostics initialized");
        diag
    }

    /// Runs the rc file through the session if it exists.
    pub fn load_rc(&self, session: &mut Session) -> Result<usize, ShellError> {
        match &self.rc_path {
            Some(path) if path.exists() => source_file(path, session),
            _ => Ok(0),
        }
    }
}

/// Executes every non-blank, non-comment line of `path`. Stops early if a
/// line ran `exit`. Returns how many lines ran.
pub fn source_file(path: &Path, session: &mut Session) -> Result<usize, ShellError> {
    let content = fs::read_to_string(path)
        .map_err(|e| ShellError::from_io(e, format!("source: {}", path.display())))?;

    let mut executed = 0;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        session.execute_line(line);
        executed += 1;
        if !session.is_running() {
            break;
        }
    }
    Ok(executed)
}
