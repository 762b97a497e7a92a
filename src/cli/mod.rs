//! Command line interface.

mod commands;
mod inputs;
mod progress;

pub use commands::{is_verbose, run, Cli, ExtractArgs};
pub use inputs::{parse_file_source, parse_links};
