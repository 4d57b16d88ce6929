mod ledger;
mod log;

pub use ledger::{AllocRecord, Ledger, LedgerStats, Lease, MAX_ALLOCATION_SIZE};
pub use log::{format_entry, LogLevel, LogSink};

use std::io::{self, Write};

use crate::error::{ErrorKind, ShellError};

/// Error bookkeeping, the log sink and the allocation ledger.
///
/// One instance lives for the whole session and is passed by reference to
/// anything that needs to report.
pub struct Diagnostics {
    last_error: Option<ErrorKind>,
    error_count: usize,
    logging_enabled: bool,
    sink: LogSink,
    ledger: Ledger,
}

impl Diagnostics {
    pub fn new(sink: LogSink, ledger: Ledger) -> Self {
        Self {
            last_error: None,
            error_count: 0,
            logging_enabled: sink.has_file(),
            sink,
            ledger,
        }
    }

    /// No log file and a live ledger; failures still reach stderr.
    pub fn stderr_only() -> Self {
        Self::new(LogSink::stderr_only(), Ledger::new())
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn sink_mut(&mut self) -> &mut LogSink {
        &mut self.sink
    }

    /// Records a failure and writes exactly one line for it.
    pub fn report(&mut self, err: &ShellError) {
        self.last_error = Some(err.kind());
        self.error_count += 1;
        self.sink
            .write(LogLevel::Error, &err.to_string(), self.logging_enabled);
    }

    pub fn log(&mut self, level: LogLevel, message: &str) {
        self.sink.write(level, message, self.logging_enabled);
    }

    pub fn debug(&mut self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&mut self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning(&mut self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn fatal(&mut self, err: &ShellError) {
        self.last_error = Some(err.kind());
        self.error_count += 1;
        self.log(LogLevel::Fatal, &err.to_string());
    }

    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    pub fn clear_last_error(&mut self) {
        self.last_error = None;
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn reset_error_count(&mut self) {
        self.error_count = 0;
    }

    pub fn is_logging_enabled(&self) -> bool {
        self.logging_enabled
    }

    pub fn set_logging_enabled(&mut self, enabled: bool) {
        self.logging_enabled = enabled;
    }

    /// Logs releases the ledger could not match to a record.
    pub fn flush_ledger_warnings(&mut self) {
        for warning in self.ledger.take_warnings() {
            self.warning(&warning);
        }
    }

    /// Prints the ledger counters the way `memstat` shows them.
    pub fn write_stats(&self, out: &mut dyn Write) -> io::Result<()> {
        if !self.ledger.is_enabled() {
            return writeln!(out, "Memory tracking is disabled");
        }
        let stats = self.ledger.stats();
        writeln!(out, "=== Memory Statistics ===")?;
        writeln!(out, "Total allocations: {}", stats.allocations)?;
        writeln!(out, "Total deallocations: {}", stats.deallocations)?;
        writeln!(out, "Current allocated: {} bytes", stats.current_bytes)?;
        writeln!(out, "Peak allocated: {} bytes", stats.peak_bytes)?;
        writeln!(
            out,
            "Outstanding blocks: {}",
            stats.allocations.saturating_sub(stats.deallocations)
        )?;
        writeln!(out, "Tracked blocks: {}", stats.live_blocks)
    }

    pub fn write_live_records(&self, out: &mut dyn Write) -> io::Result<()> {
        let live = self.ledger.live();
        if live.is_empty() {
            return writeln!(out, "No live tracked blocks.");
        }
        for (n, record) in live.iter().enumerate() {
            writeln!(out, "Block {}: {}", n + 1, record)?;
        }
        let bytes: usize = live.iter().map(|r| r.size).sum();
        writeln!(out, "Total: {} blocks, {} bytes", live.len(), bytes)
    }

    /// Reports every record still alive as a leak, then force-releases them.
    /// Returns the number of leaks.
    pub fn shutdown(&mut self) -> usize {
        self.flush_ledger_warnings();
        let leaked = self.ledger.force_release_all();
        if !leaked.is_empty() {
            self.warning(&format!("{} tracked blocks leaked", leaked.len()));
        }
        for record in &leaked {
            self.warning(&format!("Leaked memory: {}", record));
        }
        self.info("Diagnostics shut down");
        leaked.len()
    }
}
