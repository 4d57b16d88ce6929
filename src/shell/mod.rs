mod prompt;

use std::io::{self, IsTerminal};

use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::config::Config;
use crate::core::Session;
use crate::error::ShellError;
use crate::highlight::Palette;
use crate::process::signal::{setup_signal_handlers, SignalFlags};

/// The interactive front end: line editing, prompt and signal notices
/// around a [`Session`].
pub struct Shell {
    editor: DefaultEditor,
    session: Session,
    signals: SignalFlags,
    palette: Palette,
    quiet: bool,
}

/// Builds the session and runs the rc file. Startup failures are logged
/// as fatal before they are returned.
pub fn start_session(config: &Config) -> Result<Session, ShellError> {
    let mut session = Session::new(config.open_diagnostics())?;
    if let Err(err) = config.load_rc(&mut session) {
        session.diagnostics_mut().report(&err);
    }
    Ok(session)
}

/// Runs a single line without the line editor and returns its status.
pub fn run_command(config: &Config, line: &str) -> Result<i32, ShellError> {
    let mut session = start_session(config)?;
    if session.is_running() {
        session.execute_line(line);
    }
    Ok(session.shutdown())
}

impl Shell {
    pub fn new(config: &Config) -> Result<Self, ShellError> {
        let mut session = start_session(config)?;

        let setup = setup_signal_handlers().and_then(|signals| {
            let mut editor = DefaultEditor::new()?;
            editor.set_auto_add_history(true);
            Ok((signals, editor))
        });
        let (signals, editor) = match setup {
            Ok(parts) => parts,
            Err(err) => {
                session.diagnostics_mut().fatal(&err);
                return Err(err);
            }
        };

        session.state_mut().interactive = io::stdin().is_terminal();

        Ok(Self {
            editor,
            session,
            signals,
            palette: Palette::new(),
            quiet: config.quiet,
        })
    }

    fn print_banner(&self) {
        println!(
            "{}",
            self.palette.banner(&format!(
                "MyShell v{} - Linux Shell Interpreter",
                env!("CARGO_PKG_VERSION")
            ))
        );
        println!("{}", self.palette.hint("Type 'exit' to quit."));
        println!(
            "{}\n",
            self.palette.hint("Press Ctrl+C to interrupt, Ctrl+D to exit.")
        );
    }

    fn poll_signals(&mut self) {
        // SIGINT already reached the foreground child; nothing left to do.
        if self.signals.take_interrupt() {
            self.session.diagnostics_mut().debug("interrupt received");
        }
        if self.signals.take_quit() {
            println!("\nUse 'exit' to quit the shell.");
        }
    }

    /// Reads and executes lines until `exit` or end of input, then shuts
    /// the session down and returns its final status.
    pub fn run(mut self) -> i32 {
        if !self.quiet {
            self.print_banner();
        }

        while self.session.is_running() {
            self.poll_signals();
            let prompt = prompt::render(self.session.state(), &self.palette);

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    self.session.execute_line(&line);
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(e) => {
                    self.session.diagnostics_mut().fatal(&ShellError::from(e));
                    break;
                }
            }
        }

        let status = self.session.shutdown();
        if !self.quiet {
            println!("Shell exited.");
        }
        status
    }
}
