use std::io::{self, Write};

use super::commands::Builtins;
use super::env::EnvStore;
use super::parser::parse;
use super::state::ShellState;
use crate::diagnostics::Diagnostics;
use crate::error::ShellError;
use crate::process::execute_external;

/// The per-line pipeline: parse, expand, dispatch, record the status.
pub struct Session {
    state: ShellState,
    diag: Diagnostics,
    builtins: Builtins,
}

impl Session {
    /// Starts in the process working directory with an environment overlay.
    /// A failure here is logged as fatal before it is returned.
    pub fn new(mut diag: Diagnostics) -> Result<Self, ShellError> {
        let env = EnvStore::new(diag.ledger().clone());
        match ShellState::new(env) {
            Ok(state) => Ok(Self::with_state(state, diag)),
            Err(err) => {
                diag.fatal(&err);
                Err(err)
            }
        }
    }

    pub fn with_state(state: ShellState, diag: Diagnostics) -> Self {
        Self {
            state,
            diag,
            builtins: Builtins::new(),
        }
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ShellState {
        &mut self.state
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diag
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diag
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn last_exit_status(&self) -> i32 {
        self.state.last_exit_status
    }

    pub fn execute_line(&mut self, line: &str) -> i32 {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.execute_line_to(line, &mut out)
    }

    /// Runs one line with builtin output going to `out`. A failure is
    /// reported once and turned into the line's exit status.
    pub fn execute_line_to(&mut self, line: &str, out: &mut dyn Write) -> i32 {
        let status = match self.run(line, out) {
            Ok(status) => status,
            Err(err) => {
                self.diag.report(&err);
                err.exit_status()
            }
        };
        self.state.last_exit_status = status;
        self.diag.flush_ledger_warnings();
        status
    }

    fn run(&mut self, line: &str, out: &mut dyn Write) -> Result<i32, ShellError> {
        let mut command = parse(line, self.diag.ledger())?;
        command.expand(&self.state.env)?;
        self.diag
            .debug(&format!("execute: {} ({} args)", command.name(), command.argc()));

        if self.builtins.is_builtin(command.name()) {
            self.builtins.execute(
                command.name(),
                command.operands(),
                &mut self.state,
                &mut self.diag,
                out,
            )
        } else {
            out.flush()?;
            execute_external(command.name(), command.args(), &self.state.env)
        }
    }

    /// Drops the shell variables, reports anything still tracked and
    /// returns the final exit status.
    pub fn shutdown(mut self) -> i32 {
        self.diag.info("Shell shutting down");
        self.state.env.clear();
        self.diag.shutdown();
        self.state.last_exit_status
    }
}
