//! CLI argument parsing using clap.

use clap::{
    Parser,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

use crate::config::Settings;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Restart a development process whenever the tree it lives in changes
#[derive(Parser, Debug)]
#[command(
    name = "reloader",
    version = env!("CARGO_PKG_VERSION"),
    about = "Restart a development process whenever the tree it lives in changes",
    long_about = "Watches every directory below the root and, at most once per interval, \
                  kills and relaunches `<program> <args...> <FILES...>` when anything changed.",
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Report stat failures on paths that vanish before they are inspected
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to a custom reloader.toml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seconds between change checks
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Program to launch (default: go)
    #[arg(long)]
    pub program: Option<String>,

    /// Directory tree to watch (default: .)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub show_config: bool,

    /// Files or packages handed to the program; everything from here on is passed through
    #[arg(trailing_var_arg = true, value_name = "FILES")]
    pub files: Vec<String>,
}

impl Cli {
    /// Apply command-line overrides on top of loaded settings.
    pub fn apply(&self, settings: &mut Settings) {
        if self.verbose {
            settings.watch.verbose = true;
        }
        if let Some(secs) = self.interval {
            settings.reload.interval_secs = secs;
        }
        if let Some(program) = &self.program {
            settings.reload.program = program.clone();
        }
        if let Some(root) = &self.root {
            settings.watch.root = root.clone();
        }
    }
}
