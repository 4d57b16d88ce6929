use crate::error::{ErrorKind, ShellError};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct Flags {
    flags: BTreeMap<String, Flag>,
}

#[derive(Debug, Clone)]
pub struct Flag {
    pub short: Option<String>,
    pub long: String,
    pub description: String,
    pub takes_value: bool,
    pub value: Option<String>,
}

impl Flag {
    fn new(short: Option<&str>, long: &str, description: &str, takes_value: bool) -> Self {
        Self {
            short: short.map(String::from),
            long: long.to_string(),
            description: description.to_string(),
            takes_value,
            value: None,
        }
    }

    fn matches(&self, arg: &str) -> bool {
        self.short.as_deref() == Some(arg) || self.long == arg
    }
}

impl Default for Flags {
    fn default() -> Self {
        Self::new()
    }
}

impl Flags {
    pub fn new() -> Self {
        let mut flags = BTreeMap::new();
        let mut add = |name: &str, flag: Flag| {
            flags.insert(name.to_string(), flag);
        };

        add("help", Flag::new(Some("-h"), "--help", "Print this help message", false));
        add("version", Flag::new(Some("-v"), "--version", "Show version information", false));
        add("quiet", Flag::new(Some("-q"), "--quiet", "Do not print the startup banner", false));
        add("debug", Flag::new(Some("-d"), "--debug", "Echo debug and info log entries to stderr", false));
        add("no-log", Flag::new(Some("-n"), "--no-log", "Do not write ~/.myshell.log", false));
        add("no-rc", Flag::new(None, "--no-rc", "Skip ~/.myshellrc", false));
        add("command", Flag::new(Some("-c"), "--command", "Run one line and exit with its status", true));

        Flags { flags }
    }

    pub fn parse(&mut self, args: &[String]) -> Result<(), ShellError> {
        let mut args = args.iter();
        while let Some(arg) = args.next() {
            let flag = self
                .flags
                .values_mut()
                .find(|flag| flag.matches(arg))
                .ok_or_else(|| {
                    ShellError::new(ErrorKind::InvalidArgument, format!("flags: unknown option '{}'", arg))
                })?;

            flag.value = if flag.takes_value {
                let value = args.next().ok_or_else(|| {
                    ShellError::new(
                        ErrorKind::InvalidArgument,
                        format!("flags: {} requires a value", arg),
                    )
                })?;
                Some(value.clone())
            } else {
                Some("true".to_string())
            };
        }
        Ok(())
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.flags
            .get(name)
            .and_then(|f| f.value.as_ref())
            .is_some()
    }

    pub fn get_value(&self, name: &str) -> Option<&String> {
        self.flags.get(name).and_then(|f| f.value.as_ref())
    }

    pub fn print_help(&self) {
        println!("Usage: myshell [OPTIONS]");
        println!("\nOptions:");
        for flag in self.flags.values() {
            let short = flag.short.as_deref().unwrap_or("  ");
            let long = if flag.takes_value {
                format!("{} <line>", flag.long)
            } else {
                flag.long.clone()
            };
            println!("  {}, {:<18} {}", short, long, flag.description);
        }
    }
}
