use super::EnvStore;
use crate::diagnostics::{Lease, MAX_ALLOCATION_SIZE};
use crate::error::{ErrorKind, ShellError};

const CONTEXT: &str = "expand";

/// Output buffer that grows geometrically and keeps its ledger entry in step.
struct Expansion {
    buf: String,
    lease: Lease,
}

impl Expansion {
    fn reserve_for(&mut self, extra: usize) -> Result<(), ShellError> {
        let needed = self.buf.len() + extra;
        if needed <= self.buf.capacity() {
            return Ok(());
        }
        let target = needed.max((self.buf.capacity() * 2).min(MAX_ALLOCATION_SIZE));
        self.lease.resize(target, CONTEXT)?;
        self.buf
            .try_reserve_exact(target - self.buf.len())
            .map_err(|_| ShellError::new(ErrorKind::MemoryAllocationFailure, CONTEXT))
    }

    fn push_str(&mut self, s: &str) -> Result<(), ShellError> {
        self.reserve_for(s.len())?;
        self.buf.push_str(s);
        Ok(())
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Finds the variable name following a `$` at `start - 1`.
/// Returns the name and the index just past it.
fn scan_name(input: &str, start: usize) -> (&str, usize) {
    let bytes = input.as_bytes();
    if bytes.get(start) == Some(&b'{') {
        let open = start + 1;
        return match input[open..].find('}') {
            Some(len) => (&input[open..open + len], open + len + 1),
            // unterminated: the rest of the line is the name
            None => (&input[open..], input.len()),
        };
    }

    let end = bytes[start..]
        .iter()
        .position(|&b| !is_name_byte(b))
        .map_or(input.len(), |len| start + len);
    (&input[start..end], end)
}

impl EnvStore {
    /// Substitutes `$NAME` and `${NAME}` in one left-to-right pass.
    ///
    /// Unset variables expand to nothing. A `$` not followed by a name is
    /// kept as is, and so is the `$` of an empty `${}`.
    pub fn expand(&self, input: &str) -> Result<String, ShellError> {
        let (buf, lease) = self
            .ledger()
            .string_with_capacity(input.len().max(1) * 2, CONTEXT)?;
        let mut out = Expansion { buf, lease };

        let bytes = input.as_bytes();
        let mut literal = 0;
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] != b'$' {
                i += 1;
                continue;
            }
            out.push_str(&input[literal..i])?;

            let (name, next) = scan_name(input, i + 1);
            if name.is_empty() {
                out.push_str("$")?;
            } else if let Some(value) = self.get(name) {
                out.push_str(&value)?;
            }
            i = next;
            literal = next;
        }
        out.push_str(&input[literal..])?;

        Ok(out.buf)
    }
}
