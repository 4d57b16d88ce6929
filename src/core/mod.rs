pub mod commands;
pub mod env;
pub mod parser;
pub mod session;
pub mod state;

pub use parser::{parse, tokenize, Command, MAX_ARGS, MAX_INPUT_SIZE};
pub use session::Session;
pub use state::ShellState;
