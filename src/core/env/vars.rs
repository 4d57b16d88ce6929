use std::borrow::Cow;
use std::env;
use std::path::Path;

use crate::diagnostics::{Lease, Ledger};
use crate::error::{ErrorKind, ShellError};

pub const DEFAULT_HOME: &str = "/tmp";
pub const DEFAULT_PATH: &str = "/bin:/usr/bin:/usr/local/bin";

#[derive(Debug)]
struct EnvVar {
    name: String,
    value: String,
    lease: Lease,
}

fn entry_size(name: &str, value: &str) -> usize {
    name.len() + value.len() + 2
}

/// Shell variables layered over the process environment.
///
/// Local entries keep insertion order. With the overlay on, writes are
/// mirrored into the process environment so children inherit them, and
/// reads fall back to it.
#[derive(Debug)]
pub struct EnvStore {
    vars: Vec<EnvVar>,
    overlay: bool,
    ledger: Ledger,
}

impl EnvStore {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            vars: Vec::new(),
            overlay: true,
            ledger,
        }
    }

    /// A store that neither reads nor writes the process environment.
    pub fn isolated(ledger: Ledger) -> Self {
        Self {
            overlay: false,
            ..Self::new(ledger)
        }
    }

    pub(super) fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Fills in `HOME` and `PATH` when missing and points `PWD` at `cwd`.
    pub fn init_defaults(&mut self, cwd: &Path) -> Result<(), ShellError> {
        if !self.exists("HOME") {
            self.set("HOME", DEFAULT_HOME)?;
        }
        if !self.exists("PATH") {
            self.set("PATH", DEFAULT_PATH)?;
        }
        self.set("PWD", &cwd.to_string_lossy())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.vars.iter().position(|var| var.name == name)
    }

    pub fn get(&self, name: &str) -> Option<Cow<'_, str>> {
        if let Some(idx) = self.position(name) {
            return Some(Cow::Borrowed(self.vars[idx].value.as_str()));
        }
        if !self.overlay || check_name(name, "get").is_err() {
            return None;
        }
        env::var_os(name).map(|value| Cow::Owned(value.to_string_lossy().into_owned()))
    }

    pub fn set(&mut self, name: &str, value: &str) -> Result<(), ShellError> {
        check_name(name, "set")?;
        if value.contains('\0') {
            return Err(ShellError::new(
                ErrorKind::InvalidArgument,
                format!("set: value of {} contains NUL", name),
            ));
        }

        match self.position(name) {
            Some(idx) => {
                let var = &mut self.vars[idx];
                var.lease.resize(entry_size(name, value), "env")?;
                var.value.clear();
                var.value.push_str(value);
            }
            None => {
                let lease = self.ledger.track(entry_size(name, value), "env")?;
                self.vars.push(EnvVar {
                    name: name.to_string(),
                    value: value.to_string(),
                    lease,
                });
            }
        }

        if self.overlay {
            env::set_var(name, value);
        }
        Ok(())
    }

    /// Removes `name` locally and from the process environment. Unsetting a
    /// name that is not set succeeds.
    pub fn unset(&mut self, name: &str) -> Result<(), ShellError> {
        check_name(name, "unset")?;
        if let Some(idx) = self.position(name) {
            self.vars.remove(idx);
        }
        if self.overlay {
            env::remove_var(name);
        }
        Ok(())
    }

    pub fn exists(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// `PATH` split on `:`, empty segments dropped. `None` when `PATH` is
    /// unset or has no directories.
    pub fn path_dirs(&self) -> Option<Vec<String>> {
        let path = self.get("PATH")?;
        let dirs: Vec<String> = path
            .split(':')
            .filter(|dir| !dir.is_empty())
            .map(String::from)
            .collect();
        if dirs.is_empty() {
            None
        } else {
            Some(dirs)
        }
    }

    /// Local entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars
            .iter()
            .map(|var| (var.name.as_str(), var.value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Drops all local entries, leaving the process environment alone.
    pub fn clear(&mut self) -> usize {
        let count = self.vars.len();
        self.vars.clear();
        count
    }
}

// The process environment cannot hold these, and std panics on them.
fn check_name(name: &str, op: &str) -> Result<(), ShellError> {
    if name.is_empty() || name.contains(['=', '\0']) {
        return Err(ShellError::new(
            ErrorKind::InvalidArgument,
            format!("{}: invalid variable name '{}'", op, name),
        ));
    }
    Ok(())
}

/// A letter or `_`, then letters, digits or `_`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
