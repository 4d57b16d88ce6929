use crate::core::ShellState;
use crate::highlight::Palette;

const DEFAULT_USER: &str = "user";
const DEFAULT_HOST: &str = "localhost";

fn prompt_symbol() -> char {
    // SAFETY: getuid has no preconditions and cannot fail.
    if unsafe { libc::getuid() } == 0 {
        '#'
    } else {
        '$'
    }
}

/// Builds `[user@host dir]$ ` from the shell's own variables.
pub fn render(state: &ShellState, palette: &Palette) -> String {
    let user = state.env.get("USER");
    let host = state.env.get("HOSTNAME");
    palette.prompt(
        user.as_deref().unwrap_or(DEFAULT_USER),
        host.as_deref().unwrap_or(DEFAULT_HOST),
        &state.dir_name(),
        prompt_symbol(),
    )
}
