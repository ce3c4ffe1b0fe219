//! Command-line parsing. Flags are layered over the JSON config file,
//! which is layered over built-in defaults.

mod clap_parser;

pub use clap_parser::{Cli, Command, PropagateArgs, ReconcileArgs};
