//! Command Line Interface (CLI) layer for GEOSR.
//!
//! `args` defines the `run`/`request` subcommands, `errors` the CLI-only
//! failures, and `runner` installs logging and dispatches to `geosr::api`.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
