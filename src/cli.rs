//! Command line interface for the `ampframe` binary.
//!
//! Kept free of library imports so `build.rs` can include it to render the
//! man page.

use clap::{Parser, Subcommand};

/// Command line arguments for the `ampframe` binary.
#[derive(Debug, Parser)]
#[command(name = "ampframe", version, about = "Encode and decode AMP boxes")]
pub struct Cli {
    /// Operation to perform.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported operations.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serialize `key=value` pairs into one box written to stdout.
    Encode {
        /// Pairs to place in the box.
        #[arg(value_parser = parse_pair, required = true)]
        pairs: Vec<(String, String)>,
    },
    /// Read concatenated boxes from stdin and print their pairs.
    Decode,
}

/// Split `key=value` at the first `=`.
///
/// # Errors
///
/// Returns a message if `raw` contains no `=` or the key is empty.
pub fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some(("", _)) => Err(format!("empty key in {raw:?}")),
        Some((key, value)) => Ok((key.to_owned(), value.to_owned())),
        None => Err(format!("expected key=value, got {raw:?}")),
    }
}
