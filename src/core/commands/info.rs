use std::env;

use chrono::Local;

use super::{Builtin, Context};
use crate::error::{ErrorKind, ShellError};

const DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Z %Y";

#[derive(Debug, Clone, Copy, Default)]
pub struct PwdCommand;

impl Builtin for PwdCommand {
    fn execute(&self, _args: &[String], ctx: &mut Context<'_>) -> Result<i32, ShellError> {
        let cwd = env::current_dir().map_err(|e| {
            ShellError::with_source(ErrorKind::SystemCallFailure, "pwd: getcwd", e)
        })?;
        writeln!(ctx.out, "{}", cwd.display())?;
        Ok(0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EchoCommand;

impl EchoCommand {
    fn unescape(word: &str) -> String {
        let mut out = String::with_capacity(word.len());
        let mut chars = word.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some('\'') => out.push('\''),
                Some('a') => out.push('\x07'),
                Some('b') => out.push('\x08'),
                Some('f') => out.push('\x0c'),
                Some('v') => out.push('\x0b'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        }
        out
    }
}

impl Builtin for EchoCommand {
    fn execute(&self, args: &[String], ctx: &mut Context<'_>) -> Result<i32, ShellError> {
        let (newline, words) = match args.split_first() {
            Some((flag, rest)) if flag == "-n" => (false, rest),
            _ => (true, args),
        };

        let text = words
            .iter()
            .map(|w| Self::unescape(w))
            .collect::<Vec<_>>()
            .join(" ");
        write!(ctx.out, "{}", text)?;
        if newline {
            writeln!(ctx.out)?;
        }
        ctx.out.flush()?;
        Ok(0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DateCommand;

impl Builtin for DateCommand {
    fn execute(&self, _args: &[String], ctx: &mut Context<'_>) -> Result<i32, ShellError> {
        writeln!(ctx.out, "{}", Local::now().format(DATE_FORMAT))?;
        Ok(0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HelpCommand;

impl Builtin for HelpCommand {
    fn execute(&self, args: &[String], ctx: &mut Context<'_>) -> Result<i32, ShellError> {
        if let Some(name) = args.first() {
            let info = ctx.builtins.lookup(name).ok_or_else(|| {
                ShellError::new(
                    ErrorKind::InvalidArgument,
                    format!("help: no builtin named '{}'", name),
                )
            })?;
            writeln!(ctx.out, "{} - {}", info.name, info.description)?;
            writeln!(ctx.out, "Usage: {}", info.usage)?;
            return Ok(0);
        }

        writeln!(ctx.out, "Built-in commands:")?;
        for info in ctx.builtins.iter() {
            writeln!(ctx.out, "  {:<10} {}", info.name, info.description)?;
        }
        writeln!(ctx.out)?;
        writeln!(ctx.out, "Type 'help <command>' for usage.")?;
        Ok(0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MemstatCommand;

impl Builtin for MemstatCommand {
    fn execute(&self, args: &[String], ctx: &mut Context<'_>) -> Result<i32, ShellError> {
        match args.first().map(String::as_str) {
            None => ctx.diag.write_stats(ctx.out)?,
            Some("leaks") => ctx.diag.write_live_records(ctx.out)?,
            Some(other) => {
                return Err(ShellError::new(
                    ErrorKind::InvalidArgument,
                    format!("memstat: unknown option '{}' (usage: memstat [leaks])", other),
                ))
            }
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{Harness, CWD_LOCK};
    use super::*;

    #[test]
    fn test_echo() -> Result<(), ShellError> {
        let mut h = Harness::new();
        h.run("echo", &["hello", "world"])?;
        assert_eq!(h.output(), "hello world\n");

        h.run("echo", &[])?;
        assert_eq!(h.output(), "\n");

        h.run("echo", &["-n", "no", "newline"])?;
        assert_eq!(h.output(), "no newline");
        Ok(())
    }

    #[test]
    fn test_echo_escapes() -> Result<(), ShellError> {
        let mut h = Harness::new();
        h.run("echo", &["a\\tb\\nc", "\\\\", "\\q", "end\\"])?;
        assert_eq!(h.output(), "a\tb\nc \\ \\q end\\\n");
        Ok(())
    }

    #[test]
    fn test_echo_does_not_expand_again() -> Result<(), ShellError> {
        let mut h = Harness::new();
        h.state.env.set("HOME", "/r")?;
        h.run("echo", &["$HOME"])?;
        assert_eq!(h.output(), "$HOME\n");
        Ok(())
    }

    #[test]
    fn test_pwd() -> Result<(), ShellError> {
        let _guard = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut h = Harness::new();
        h.run("pwd", &[])?;
        assert_eq!(h.output().trim_end(), env::current_dir()?.display().to_string());
        Ok(())
    }

    #[test]
    fn test_date_shape() -> Result<(), ShellError> {
        let mut h = Harness::new();
        h.run("date", &[])?;
        let out = h.output();
        let year = Local::now().format("%Y").to_string();
        assert!(out.trim_end().ends_with(&year));
        assert!(out.matches(':').count() >= 2);
        Ok(())
    }

    #[test]
    fn test_help_lists_in_table_order() -> Result<(), ShellError> {
        let mut h = Harness::new();
        h.run("help", &[])?;
        let out = h.output();
        let ls = out.find("  ls ").unwrap();
        let help = out.find("  help ").unwrap();
        assert!(ls < help);

        h.run("help", &["cp"])?;
        assert_eq!(h.output(), "cp - Copy files\nUsage: cp <source> <destination>\n");

        let err = h.run("help", &["nope"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        Ok(())
    }

    #[test]
    fn test_memstat() -> Result<(), ShellError> {
        let mut h = Harness::new();
        h.state.env.set("TRACKED", "1")?;
        h.run("memstat", &[])?;
        assert!(h.output().contains("Tracked blocks: 1"));

        h.run("memstat", &["leaks"])?;
        assert!(h.output().contains("env"));

        assert!(h.run("memstat", &["bogus"]).is_err());
        Ok(())
    }
}
