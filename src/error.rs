use std::io;

/// Every failure the shell can report, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CommandNotFound,
    PermissionDenied,
    FileNotFound,
    FileExists,
    DirectoryNotEmpty,
    InvalidArgument,
    InvalidPath,
    SystemCallFailure,
    MemoryAllocationFailure,
    BufferOverflow,
    IoFailure,
    ProcessCreationFailure,
    SignalHandlingFailure,
    EnvironmentError,
    ParsingError,
    /// Reserved: nothing in the pipeline waits with a deadline.
    Timeout,
    ResourceLimitExceeded,
}

impl ErrorKind {
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::CommandNotFound => "Command not found",
            ErrorKind::PermissionDenied => "Permission denied",
            ErrorKind::FileNotFound => "File or directory not found",
            ErrorKind::FileExists => "File already exists",
            ErrorKind::DirectoryNotEmpty => "Directory not empty",
            ErrorKind::InvalidArgument => "Invalid argument",
            ErrorKind::InvalidPath => "Invalid path",
            ErrorKind::SystemCallFailure => "System call failed",
            ErrorKind::MemoryAllocationFailure => "Memory allocation failed",
            ErrorKind::BufferOverflow => "Buffer overflow detected",
            ErrorKind::IoFailure => "Input/output operation failed",
            ErrorKind::ProcessCreationFailure => "Process creation failed",
            ErrorKind::SignalHandlingFailure => "Signal handling error",
            ErrorKind::EnvironmentError => "Environment variable error",
            ErrorKind::ParsingError => "Command parsing error",
            ErrorKind::Timeout => "Operation timeout",
            ErrorKind::ResourceLimitExceeded => "Resource limit exceeded",
        }
    }

    /// Status recorded as `last_exit_status` when a command fails with this kind.
    pub fn exit_status(&self) -> i32 {
        match self {
            ErrorKind::CommandNotFound => 127,
            ErrorKind::ProcessCreationFailure => 126,
            _ => 1,
        }
    }

    /// Whether the kind describes a failed OS call, whose errno is worth printing.
    pub fn is_syscall(&self) -> bool {
        matches!(
            self,
            ErrorKind::SystemCallFailure
                | ErrorKind::PermissionDenied
                | ErrorKind::FileNotFound
                | ErrorKind::FileExists
                | ErrorKind::DirectoryNotEmpty
                | ErrorKind::InvalidPath
                | ErrorKind::IoFailure
                | ErrorKind::ProcessCreationFailure
                | ErrorKind::SignalHandlingFailure
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug)]
pub struct ShellError {
    kind: ErrorKind,
    context: String,
    source: Option<io::Error>,
}

impl ShellError {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Self {
            kind,
            context: context.into(),
            source: None,
        }
    }

    /// Wraps an OS error, classifying it by errno.
    pub fn from_io(err: io::Error, context: impl Into<String>) -> Self {
        Self {
            kind: classify(&err),
            context: context.into(),
            source: Some(err),
        }
    }

    /// Wraps an OS error under a caller-chosen kind.
    pub fn with_source(kind: ErrorKind, context: impl Into<String>, err: io::Error) -> Self {
        Self {
            kind,
            context: context.into(),
            source: Some(err),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn os_error(&self) -> Option<&io::Error> {
        self.source.as_ref()
    }

    pub fn exit_status(&self) -> i32 {
        self.kind.exit_status()
    }
}

fn classify(err: &io::Error) -> ErrorKind {
    match err.raw_os_error() {
        Some(libc::ENOENT) => ErrorKind::FileNotFound,
        Some(libc::EACCES) | Some(libc::EPERM) => ErrorKind::PermissionDenied,
        Some(libc::EEXIST) => ErrorKind::FileExists,
        Some(libc::ENOTEMPTY) => ErrorKind::DirectoryNotEmpty,
        Some(libc::ENOTDIR) => ErrorKind::InvalidPath,
        Some(_) => ErrorKind::SystemCallFailure,
        None => match err.kind() {
            io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            io::ErrorKind::AlreadyExists => ErrorKind::FileExists,
            io::ErrorKind::OutOfMemory => ErrorKind::MemoryAllocationFailure,
            _ => ErrorKind::IoFailure,
        },
    }
}

impl From<io::Error> for ShellError {
    fn from(err: io::Error) -> Self {
        ShellError::from_io(err, "io")
    }
}

impl From<rustyline::error::ReadlineError> for ShellError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        match err {
            rustyline::error::ReadlineError::Io(e) => {
                ShellError::with_source(ErrorKind::IoFailure, "readline", e)
            }
            other => ShellError::new(ErrorKind::IoFailure, format!("readline: {}", other)),
        }
    }
}

impl From<ctrlc::Error> for ShellError {
    fn from(err: ctrlc::Error) -> Self {
        ShellError::new(
            ErrorKind::SignalHandlingFailure,
            format!("signal setup: {}", err),
        )
    }
}

impl std::fmt::Display for ShellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error in {}: {}", self.context, self.kind.message())?;
        if let Some(err) = &self.source {
            match err.raw_os_error() {
                Some(errno) if self.kind.is_syscall() => {
                    write!(f, " (errno: {} - {})", errno, strerror(err))?
                }
                _ => write!(f, " ({})", err)?,
            }
        }
        Ok(())
    }
}

impl std::error::Error for ShellError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// io::Error's Display appends " (os error N)"; keep only the description.
fn strerror(err: &io::Error) -> String {
    let text = err.to_string();
    match text.rfind(" (os error") {
        Some(idx) => text[..idx].to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_messages() {
        assert_eq!(ErrorKind::CommandNotFound.message(), "Command not found");
        assert_eq!(ErrorKind::BufferOverflow.message(), "Buffer overflow detected");
        assert_eq!(
            ErrorKind::ResourceLimitExceeded.to_string(),
            "Resource limit exceeded"
        );
    }

    #[test]
    fn test_exit_status_mapping() {
        assert_eq!(ErrorKind::CommandNotFound.exit_status(), 127);
        assert_eq!(ErrorKind::ProcessCreationFailure.exit_status(), 126);
        assert_eq!(ErrorKind::FileNotFound.exit_status(), 1);
    }

    #[test]
    fn test_display_without_source() {
        let err = ShellError::new(ErrorKind::ParsingError, "parse");
        assert_eq!(err.to_string(), "Error in parse: Command parsing error");
    }

    #[test]
    fn test_display_includes_errno() {
        let err = ShellError::from_io(io::Error::from_raw_os_error(libc::ENOENT), "cd: /nope");
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        let text = err.to_string();
        assert!(text.starts_with("Error in cd: /nope: File or directory not found (errno: "));
        assert!(!text.contains("os error"));
    }

    #[test]
    fn test_errno_classification() {
        let cases = [
            (libc::EACCES, ErrorKind::PermissionDenied),
            (libc::EEXIST, ErrorKind::FileExists),
            (libc::ENOTEMPTY, ErrorKind::DirectoryNotEmpty),
            (libc::ENOTDIR, ErrorKind::InvalidPath),
            (libc::EIO, ErrorKind::SystemCallFailure),
        ];
        for (errno, kind) in cases {
            let err: ShellError = io::Error::from_raw_os_error(errno).into();
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn test_non_os_error_is_io_failure() {
        let err: ShellError = io::Error::new(io::ErrorKind::UnexpectedEof, "short read").into();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert!(err.to_string().ends_with("(short read)"));
    }
}
