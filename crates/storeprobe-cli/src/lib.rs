//! Storeprobe CLI library
//!
//! Command-line front end for the storeprobe journey suite: argument parsing,
//! configuration layering, logging setup and progress output.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
mod runner;

pub use commands::{Cli, ColorArg, Commands, ConfigArgs, FormatArg, ListArgs, RunArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{render_journey_list, render_summary_json, OutputFormat, ProgressReporter};
pub use runner::{resolve_config, selected, RunCommand};
