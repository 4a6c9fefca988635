pub mod cli;
pub mod config;
pub mod logging;
pub mod process;
pub mod reload;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use config::Settings;
pub use process::{CommandLauncher, LaunchSpec, Launcher, ProcessSupervisor};
pub use reload::ReloadLoop;
pub use watcher::{
    ChangeEvent, ChangeKind, DirectorySet, EventCoalescer, NotificationSource, NotifySource,
    ReloadDecision, WatchError,
};
