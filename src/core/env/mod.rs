mod expand;
mod vars;

pub use vars::{is_valid_identifier, EnvStore, DEFAULT_HOME, DEFAULT_PATH};
