#![forbid(unsafe_code)]

//! Parser registry: loading, activation scopes and stream commands

mod command;
mod loader;
mod parsers;

pub use command::{COMMAND_DISABLE, COMMAND_ENABLE, COMMAND_RESET, CommandError, ParserCommand};
pub use loader::{CachingLoader, ResolveDirs};
pub use parsers::ParserRegistry;
