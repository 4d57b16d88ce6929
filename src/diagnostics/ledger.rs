use std::cell::RefCell;
use std::collections::BTreeMap;
use std::panic::Location;
use std::rc::{Rc, Weak};

use crate::error::{ErrorKind, ShellError};

/// Largest single buffer any component may register.
pub const MAX_ALLOCATION_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AllocRecord {
    pub id: u64,
    pub size: usize,
    pub context: &'static str,
    pub site: &'static Location<'static>,
}

impl std::fmt::Display for AllocRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} bytes ({}:{}) - {}",
            self.id,
            self.size,
            self.site.file(),
            self.site.line(),
            self.context
        )
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LedgerStats {
    pub allocations: u64,
    pub deallocations: u64,
    pub current_bytes: usize,
    pub peak_bytes: usize,
    pub live_blocks: usize,
}

#[derive(Debug)]
struct LedgerState {
    records: BTreeMap<u64, AllocRecord>,
    next_id: u64,
    stats: LedgerStats,
    enabled: bool,
    warnings: Vec<String>,
}

impl LedgerState {
    fn release(&mut self, id: u64, size: usize, site: Option<&'static Location<'static>>) {
        match self.records.remove(&id) {
            Some(record) => {
                self.stats.deallocations += 1;
                self.stats.current_bytes = self.stats.current_bytes.saturating_sub(record.size);
                self.stats.live_blocks = self.records.len();
            }
            None => {
                let at = site
                    .map(|s| format!(" at {}:{}", s.file(), s.line()))
                    .unwrap_or_default();
                self.warnings.push(format!(
                    "release of untracked block #{} ({} bytes){}",
                    id, size, at
                ));
            }
        }
    }

    fn resize(&mut self, id: u64, old: usize, new: usize) {
        if let Some(record) = self.records.get_mut(&id) {
            record.size = new;
            self.stats.current_bytes = self.stats.current_bytes.saturating_sub(old) + new;
            self.stats.peak_bytes = self.stats.peak_bytes.max(self.stats.current_bytes);
        }
    }
}

/// Registry of live buffers, shared by handle.
///
/// The buffers themselves are owned normally; the ledger only keeps the
/// bookkeeping so `memstat` and the shutdown report can see what is alive.
/// Each registration hands back a [`Lease`] that removes its record on drop.
#[derive(Debug, Clone)]
pub struct Ledger {
    inner: Rc<RefCell<LedgerState>>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(LedgerState {
                records: BTreeMap::new(),
                next_id: 1,
                stats: LedgerStats::default(),
                enabled: true,
                warnings: Vec::new(),
            })),
        }
    }

    pub fn disabled() -> Self {
        let ledger = Self::new();
        ledger.set_enabled(false);
        ledger
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.borrow().enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.borrow_mut().enabled = enabled;
    }

    /// Registers a buffer of `size` bytes owned by `context`.
    #[track_caller]
    pub fn track(&self, size: usize, context: &'static str) -> Result<Lease, ShellError> {
        check_ceiling(size, context)?;

        let mut state = self.inner.borrow_mut();
        if !state.enabled {
            return Ok(Lease::inert(size));
        }

        let id = state.next_id;
        state.next_id += 1;
        state.records.insert(
            id,
            AllocRecord {
                id,
                size,
                context,
                site: Location::caller(),
            },
        );
        state.stats.allocations += 1;
        state.stats.current_bytes += size;
        state.stats.peak_bytes = state.stats.peak_bytes.max(state.stats.current_bytes);
        state.stats.live_blocks = state.records.len();

        Ok(Lease {
            id: Some(id),
            size,
            ledger: Rc::downgrade(&self.inner),
        })
    }

    /// Allocates an empty string with room for `capacity` bytes and registers it.
    #[track_caller]
    pub fn string_with_capacity(
        &self,
        capacity: usize,
        context: &'static str,
    ) -> Result<(String, Lease), ShellError> {
        let lease = self.track(capacity, context)?;
        let mut buf = String::new();
        buf.try_reserve_exact(capacity)
            .map_err(|_| ShellError::new(ErrorKind::MemoryAllocationFailure, context))?;
        Ok((buf, lease))
    }

    /// Releases a lease, recording the caller as the release site.
    #[track_caller]
    pub fn release(&self, mut lease: Lease) {
        if let Some(id) = lease.id.take() {
            self.inner
                .borrow_mut()
                .release(id, lease.size, Some(Location::caller()));
        }
    }

    pub fn stats(&self) -> LedgerStats {
        self.inner.borrow().stats
    }

    pub fn live_count(&self) -> usize {
        self.inner.borrow().records.len()
    }

    /// Live records, oldest first.
    pub fn live(&self) -> Vec<AllocRecord> {
        self.inner.borrow().records.values().cloned().collect()
    }

    /// Drops every live record and returns them. Leases still held afterwards
    /// turn into untracked releases.
    pub fn force_release_all(&self) -> Vec<AllocRecord> {
        let mut state = self.inner.borrow_mut();
        let records: Vec<AllocRecord> =
            std::mem::take(&mut state.records).into_values().collect();
        state.stats.deallocations += records.len() as u64;
        state.stats.current_bytes = 0;
        state.stats.live_blocks = 0;
        records
    }

    pub fn take_warnings(&self) -> Vec<String> {
        std::mem::take(&mut self.inner.borrow_mut().warnings)
    }
}

fn check_ceiling(size: usize, context: &'static str) -> Result<(), ShellError> {
    if size > MAX_ALLOCATION_SIZE {
        return Err(ShellError::new(
            ErrorKind::ResourceLimitExceeded,
            format!("{}: {} bytes requested", context, size),
        ));
    }
    Ok(())
}

/// Proof of registration for one buffer; unregisters itself on drop.
#[must_use]
#[derive(Debug)]
pub struct Lease {
    id: Option<u64>,
    size: usize,
    ledger: Weak<RefCell<LedgerState>>,
}

impl Lease {
    fn inert(size: usize) -> Self {
        Self {
            id: None,
            size,
            ledger: Weak::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_tracked(&self) -> bool {
        self.id.is_some()
    }

    /// Updates the registered size after the owner grew or shrank its buffer.
    pub fn resize(&mut self, new_size: usize, context: &'static str) -> Result<(), ShellError> {
        check_ceiling(new_size, context)?;
        if let (Some(id), Some(ledger)) = (self.id, self.ledger.upgrade()) {
            ledger.borrow_mut().resize(id, self.size, new_size);
        }
        self.size = new_size;
        Ok(())
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if let Some(ledger) = self.ledger.upgrade() {
            if let Ok(mut state) = ledger.try_borrow_mut() {
                state.release(id, self.size, None);
            }
        }
    }
}
