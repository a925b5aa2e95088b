//! Chat command parsing and purge URL derivation.

pub mod parser;
pub mod uri;

pub use parser::{Command, CommandParser};
pub use uri::UriNormalizer;
