use std::io::Write;

mod cd;
mod exit;
mod export;
mod fs;
mod info;

pub use cd::{CdCommand, MAX_PATH_SIZE};
pub use exit::ExitCommand;
pub use export::{ExportCommand, UnsetCommand};
pub use fs::{CatCommand, CpCommand, LsCommand, RmCommand, TouchCommand};
pub use info::{DateCommand, EchoCommand, HelpCommand, MemstatCommand, PwdCommand};

use crate::core::state::ShellState;
use crate::diagnostics::Diagnostics;
use crate::error::{ErrorKind, ShellError};

/// What a builtin gets to touch while it runs.
pub struct Context<'a> {
    pub state: &'a mut ShellState,
    pub diag: &'a mut Diagnostics,
    pub out: &'a mut dyn Write,
    pub builtins: &'a Builtins,
}

pub trait Builtin {
    /// Runs with the arguments after the command name and returns an exit status.
    fn execute(&self, args: &[String], ctx: &mut Context<'_>) -> Result<i32, ShellError>;
}

#[derive(Debug, Clone, Copy)]
pub enum CommandType {
    Ls(LsCommand),
    Cat(CatCommand),
    Cp(CpCommand),
    Rm(RmCommand),
    Touch(TouchCommand),
    Date(DateCommand),
    Pwd(PwdCommand),
    Cd(CdCommand),
    Echo(EchoCommand),
    Export(ExportCommand),
    Unset(UnsetCommand),
    Memstat(MemstatCommand),
    Exit(ExitCommand),
    Help(HelpCommand),
}

impl Builtin for CommandType {
    fn execute(&self, args: &[String], ctx: &mut Context<'_>) -> Result<i32, ShellError> {
        match self {
            CommandType::Ls(cmd) => cmd.execute(args, ctx),
            CommandType::Cat(cmd) => cmd.execute(args, ctx),
            CommandType::Cp(cmd) => cmd.execute(args, ctx),
            CommandType::Rm(cmd) => cmd.execute(args, ctx),
            CommandType::Touch(cmd) => cmd.execute(args, ctx),
            CommandType::Date(cmd) => cmd.execute(args, ctx),
            CommandType::Pwd(cmd) => cmd.execute(args, ctx),
            CommandType::Cd(cmd) => cmd.execute(args, ctx),
            CommandType::Echo(cmd) => cmd.execute(args, ctx),
            CommandType::Export(cmd) => cmd.execute(args, ctx),
            CommandType::Unset(cmd) => cmd.execute(args, ctx),
            CommandType::Memstat(cmd) => cmd.execute(args, ctx),
            CommandType::Exit(cmd) => cmd.execute(args, ctx),
            CommandType::Help(cmd) => cmd.execute(args, ctx),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BuiltinInfo {
    pub name: &'static str,
    pub command: CommandType,
    pub min_args: usize,
    /// `None` means no upper bound.
    pub max_args: Option<usize>,
    pub usage: &'static str,
    pub description: &'static str,
}

impl BuiltinInfo {
    pub fn check_arity(&self, argc: usize) -> Result<(), ShellError> {
        let problem = if argc < self.min_args {
            "too few arguments"
        } else if self.max_args.is_some_and(|max| argc > max) {
            "too many arguments"
        } else {
            return Ok(());
        };
        Err(ShellError::new(
            ErrorKind::InvalidArgument,
            format!("{}: {} (usage: {})", self.name, problem, self.usage),
        ))
    }
}

const fn entry(
    name: &'static str,
    command: CommandType,
    min_args: usize,
    max_args: Option<usize>,
    usage: &'static str,
    description: &'static str,
) -> BuiltinInfo {
    BuiltinInfo {
        name,
        command,
        min_args,
        max_args,
        usage,
        description,
    }
}

pub const BUILTINS: &[BuiltinInfo] = &[
    entry("ls", CommandType::Ls(LsCommand), 0, Some(1), "ls [directory]", "List directory contents"),
    entry("cat", CommandType::Cat(CatCommand), 1, None, "cat <file1> [file2] ...", "Display file contents"),
    entry("cp", CommandType::Cp(CpCommand), 2, Some(2), "cp <source> <destination>", "Copy files"),
    entry("rm", CommandType::Rm(RmCommand), 1, None, "rm <file1> [file2] ...", "Remove files"),
    entry("touch", CommandType::Touch(TouchCommand), 1, None, "touch <file1> [file2] ...", "Create empty files"),
    entry("date", CommandType::Date(DateCommand), 0, Some(0), "date", "Display current date and time"),
    entry("pwd", CommandType::Pwd(PwdCommand), 0, Some(0), "pwd", "Print working directory"),
    entry("cd", CommandType::Cd(CdCommand), 0, Some(1), "cd [directory]", "Change directory"),
    entry("echo", CommandType::Echo(EchoCommand), 0, None, "echo [-n] [text] ...", "Display text"),
    entry("export", CommandType::Export(ExportCommand), 0, None, "export [VAR=value] ...", "Set environment variable"),
    entry("unset", CommandType::Unset(UnsetCommand), 1, None, "unset <VAR> ...", "Remove environment variable"),
    entry("memstat", CommandType::Memstat(MemstatCommand), 0, Some(1), "memstat [leaks]", "Show memory statistics"),
    entry("exit", CommandType::Exit(ExitCommand), 0, Some(1), "exit [code]", "Exit the shell"),
    entry("help", CommandType::Help(HelpCommand), 0, Some(1), "help [command]", "Show help information"),
];

/// The builtin table and the dispatcher over it. Built once, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct Builtins {
    table: &'static [BuiltinInfo],
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

impl Builtins {
    pub fn new() -> Self {
        Self { table: BUILTINS }
    }

    pub fn lookup(&self, name: &str) -> Option<&BuiltinInfo> {
        self.table.iter().find(|info| info.name == name)
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Table order.
    pub fn iter(&self) -> impl Iterator<Item = &BuiltinInfo> {
        self.table.iter()
    }

    /// Checks arity, then runs the handler. On success the status is also
    /// stored as the session's last exit status.
    pub fn execute(
        &self,
        name: &str,
        args: &[String],
        state: &mut ShellState,
        diag: &mut Diagnostics,
        out: &mut dyn Write,
    ) -> Result<i32, ShellError> {
        if name.is_empty() {
            return Err(ShellError::new(
                ErrorKind::InvalidArgument,
                "builtin: empty command name",
            ));
        }
        let info = self
            .lookup(name)
            .ok_or_else(|| ShellError::new(ErrorKind::CommandNotFound, name))?;
        info.check_arity(args.len())?;

        diag.debug(&format!("builtin {} with {} args", name, args.len()));
        let mut ctx = Context {
            state,
            diag,
            out,
            builtins: self,
        };
        let status = info.command.execute(args, &mut ctx)?;
        ctx.state.last_exit_status = status;
        Ok(status)
    }
}
