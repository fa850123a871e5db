mod commands;

pub use commands::{Cli, Command, DocumentKind, OutputFormat};
