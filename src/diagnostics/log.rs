use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::ShellError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl LogLevel {
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Append-only log file plus a mirror stream (stderr unless replaced).
pub struct LogSink {
    file: Option<File>,
    path: Option<PathBuf>,
    mirror: Option<Box<dyn Write>>,
    mirror_level: LogLevel,
}

impl LogSink {
    /// A sink that only mirrors, with no backing file.
    pub fn stderr_only() -> Self {
        Self {
            file: None,
            path: None,
            mirror: None,
            mirror_level: LogLevel::Warning,
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, ShellError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ShellError::from_io(e, format!("log: {}", path.display())))?;

        Ok(Self {
            file: Some(file),
            path: Some(path.to_path_buf()),
            ..Self::stderr_only()
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    /// Entries below this level are kept out of the mirror stream.
    pub fn set_mirror_level(&mut self, level: LogLevel) {
        self.mirror_level = level;
    }

    pub fn set_mirror(&mut self, writer: Box<dyn Write>) {
        self.mirror = Some(writer);
    }

    /// Writes one entry. The file gets it when `to_file` is set; the mirror
    /// gets it when the level reaches the mirror threshold.
    pub fn write(&mut self, level: LogLevel, message: &str, to_file: bool) {
        let entry = format_entry(level, message);

        if to_file {
            if let Some(file) = self.file.as_mut() {
                // A broken log file must not take the shell down with it.
                let _ = writeln!(file, "{}", entry).and_then(|_| file.flush());
            }
        }

        if level >= self.mirror_level {
            let _ = match self.mirror.as_mut() {
                Some(writer) => writeln!(writer, "{}", entry),
                None => writeln!(io::stderr().lock(), "{}", entry),
            };
        }
    }
}

pub fn format_entry(level: LogLevel, message: &str) -> String {
    format!(
        "[{}] {}: {}",
        Local::now().format(TIMESTAMP_FORMAT),
        level.label(),
        message
    )
}
