//! Command-line surface: argument parsing and bootstrap.

pub mod args;
mod run;

pub use args::Cli;
pub use run::{launch_spec, prepare, run};
