use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_hook::consts::SIGQUIT;

use crate::error::{ErrorKind, ShellError};

/// Flags raised by the shell's signal handlers, polled by the read loop.
#[derive(Debug, Clone, Default)]
pub struct SignalFlags {
    interrupted: Arc<AtomicBool>,
    quit: Arc<AtomicBool>,
}

impl SignalFlags {
    pub fn take_interrupt(&self) -> bool {
        self.interrupted.swap(false, Ordering::SeqCst)
    }

    pub fn take_quit(&self) -> bool {
        self.quit.swap(false, Ordering::SeqCst)
    }
}

/// SIGINT and SIGQUIT only raise flags, so neither kills the shell or
/// interrupts a child it is waiting for. SIGTSTP is ignored.
///
/// Call once per process.
pub fn setup_signal_handlers() -> Result<SignalFlags, ShellError> {
    let flags = SignalFlags::default();

    let interrupted = Arc::clone(&flags.interrupted);
    ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst))?;

    signal_hook::flag::register(SIGQUIT, Arc::clone(&flags.quit)).map_err(|e| {
        ShellError::with_source(ErrorKind::SignalHandlingFailure, "signal: SIGQUIT", e)
    })?;

    // SAFETY: installs SIG_IGN, no handler code runs.
    let previous = unsafe { libc::signal(libc::SIGTSTP, libc::SIG_IGN) };
    if previous == libc::SIG_ERR {
        return Err(ShellError::with_source(
            ErrorKind::SignalHandlingFailure,
            "signal: SIGTSTP",
            std::io::Error::last_os_error(),
        ));
    }

    Ok(flags)
}
