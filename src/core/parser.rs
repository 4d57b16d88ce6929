use crate::core::env::EnvStore;
use crate::diagnostics::{Lease, Ledger};
use crate::error::{ErrorKind, ShellError};

/// Input lines of this many bytes or more are rejected.
pub const MAX_INPUT_SIZE: usize = 1024;
/// Room for the argv terminator is kept, so a line carries at most `MAX_ARGS - 1` words.
pub const MAX_ARGS: usize = 64;

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Splits a line into words on runs of space, tab, CR and LF.
pub fn tokenize(input: &str) -> Result<Vec<String>, ShellError> {
    if input.len() >= MAX_INPUT_SIZE {
        return Err(ShellError::new(
            ErrorKind::BufferOverflow,
            format!("tokenize: input of {} bytes", input.len()),
        ));
    }

    let tokens: Vec<String> = input
        .split(is_separator)
        .filter(|word| !word.is_empty())
        .map(String::from)
        .collect();

    if tokens.len() > MAX_ARGS - 1 {
        return Err(ShellError::new(
            ErrorKind::ResourceLimitExceeded,
            format!("tokenize: {} words, at most {}", tokens.len(), MAX_ARGS - 1),
        ));
    }

    Ok(tokens)
}

/// One parsed line: `args[0]` is the command name.
#[derive(Debug)]
pub struct Command {
    args: Vec<String>,
    lease: Lease,
}

impl Command {
    pub fn name(&self) -> &str {
        &self.args[0]
    }

    /// Full argv, name included.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Arguments after the name, as builtins receive them.
    pub fn operands(&self) -> &[String] {
        &self.args[1..]
    }

    pub fn argc(&self) -> usize {
        self.args.len()
    }

    /// Expands variables in every word, the name included.
    pub fn expand(&mut self, env: &EnvStore) -> Result<(), ShellError> {
        let expanded = self
            .args
            .iter()
            .map(|word| env.expand(word))
            .collect::<Result<Vec<_>, _>>()?;
        self.lease.resize(footprint(&expanded), "command")?;
        self.args = expanded;
        Ok(())
    }
}

fn footprint(words: &[String]) -> usize {
    words.iter().map(|w| w.len() + 1).sum::<usize>()
        + std::mem::size_of::<String>() * words.len()
}

/// Builds a [`Command`] from one input line.
pub fn parse(input: &str, ledger: &Ledger) -> Result<Command, ShellError> {
    if input.is_empty() {
        return Err(ShellError::new(ErrorKind::InvalidArgument, "parse: empty input"));
    }

    let args = tokenize(input)?;
    if args.is_empty() {
        return Err(ShellError::new(
            ErrorKind::ParsingError,
            "parse: no words in input",
        ));
    }

    let lease = ledger.track(footprint(&args), "command")?;
    Ok(Command { args, lease })
}
