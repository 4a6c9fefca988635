//! Layered configuration.
//!
//! Settings are merged from, in increasing precedence:
//! - built-in defaults
//! - a TOML file (`reloader.toml` in the current directory, or `--config`)
//! - environment variables
//! - command-line flags (applied by the caller)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `RELOADER_` and use double
//! underscores to separate nested levels:
//! - `RELOADER_RELOAD__INTERVAL_SECS=1` sets `reload.interval_secs`
//! - `RELOADER_RELOAD__PROGRAM=cargo` sets `reload.program`
//! - `RELOADER_WATCH__VERBOSE=true` sets `watch.verbose`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "reloader.toml";

const ENV_PREFIX: &str = "RELOADER_";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    /// Child process and restart cadence
    #[serde(default)]
    pub reload: ReloadConfig,

    /// Which tree is watched
    #[serde(default)]
    pub watch: WatchConfig,

    /// Log levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReloadConfig {
    /// Seconds between coalescing cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Program launched as the child
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments placed before the file arguments
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Kill the child's descendants along with it
    #[serde(default = "default_true")]
    pub kill_descendants: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatchConfig {
    /// Root of the watched tree
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Directory names never watched
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Report stat failures on vanished paths
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Level applied to every module without an override
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `reloader::watcher = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_interval_secs() -> u64 {
    3
}
fn default_program() -> String {
    "go".to_string()
}
fn default_args() -> Vec<String> {
    vec!["run".to_string()]
}
fn default_true() -> bool {
    true
}
fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_exclude() -> Vec<String> {
    vec![".git".to_string()]
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            program: default_program(),
            args: default_args(),
            kill_descendants: true,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            exclude: default_exclude(),
            verbose: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl ReloadConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Settings {
    /// Load configuration from `reloader.toml` in the current directory,
    /// if present, plus the environment.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file plus the environment.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref())
            .extract::<Settings>()
            .map_err(Box::new)
            .and_then(|settings| settings.validate().map(|_| settings))
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            // Double underscore separates nested levels; single underscores
            // stay inside field names
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Reject values the reload loop cannot run with.
    pub fn validate(&self) -> Result<(), Box<figment::Error>> {
        if self.reload.interval_secs == 0 {
            return Err(Box::new(figment::Error::from(
                "reload.interval_secs must be at least 1".to_string(),
            )));
        }
        if self.reload.program.trim().is_empty() {
            return Err(Box::new(figment::Error::from(
                "reload.program must not be empty".to_string(),
            )));
        }
        Ok(())
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
