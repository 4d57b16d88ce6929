pub mod config;
pub mod core;
pub mod diagnostics;
pub mod error;
pub mod flags;
pub mod highlight;
pub mod process;
pub mod shell;
