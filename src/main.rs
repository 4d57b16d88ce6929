use myshell::config::Config;
use myshell::flags::Flags;
use myshell::highlight::Palette;
use myshell::shell::{self, Shell};
use std::{env, process};

fn main() {
    let mut flags = Flags::new();
    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(e) = flags.parse(&args) {
        eprintln!("{}", Palette::new().error(&format!("myshell: {}", e)));
        flags.print_help();
        process::exit(2);
    }

    if flags.is_set("help") {
        flags.print_help();
        return;
    }

    if flags.is_set("version") {
        println!("MyShell {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let config = Config::from_flags(&flags);
    let status = match flags.get_value("command") {
        Some(line) => shell::run_command(&config, line),
        None => Shell::new(&config).map(Shell::run),
    };

    // Startup failures were already logged as fatal.
    process::exit(status.unwrap_or(1));
}
