//! # Repo Vendor CLI
//!
//! This is the binary entry point for the `repo-vendor` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Handling top-level application errors and translating them into
//!   user-friendly output and the right process exit code. Partial vendoring
//!   failures get their own code so scripts can tell "some repositories did
//!   not vendor" apart from "the command itself was unusable".
//!
//! The core application logic is defined in the `lib.rs` library crate,
//! ensuring that the binary is a thin wrapper around the reusable library
//! functionality.

mod cli;
mod commands;

use clap::Parser;
use repo_vendor::error::Error;
use repo_vendor::exit_codes;

fn main() {
    let cli = cli::Cli::parse();
    let code = match cli.execute() {
        Ok(()) => exit_codes::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            match err.downcast_ref::<Error>() {
                Some(Error::VendoringFailed { .. }) => exit_codes::VENDOR_FAILED,
                _ => exit_codes::FAILURE,
            }
        }
    };
    std::process::exit(code);
}
