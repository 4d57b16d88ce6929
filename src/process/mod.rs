mod executor;
mod resolver;
pub mod signal;

pub use executor::{execute_external, exit_code, invoke};
pub use resolver::{is_executable, resolve};
