//! Creating and killing child processes.

use std::fmt;
use std::process::Stdio;

use async_trait::async_trait;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::process::{Child, Command};

use crate::watcher::WatchError;

/// Program and arguments a child is launched with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl fmt::Display for LaunchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Seam between the supervisor and process creation.
///
/// Both operations are best effort: `launch` always yields a handle (one
/// that owns no process if spawning failed) and `kill` swallows failures,
/// treating them as "already exited".
#[async_trait]
pub trait Launcher: Send {
    type Handle: Send;

    /// Start a child sharing this process's standard streams.
    fn launch(&mut self, spec: &LaunchSpec) -> Self::Handle;

    /// Forcibly terminate the child behind `handle`. Safe to call twice.
    async fn kill(&mut self, handle: &mut Self::Handle);
}

/// Handle to a child spawned by [`CommandLauncher`].
#[derive(Debug)]
pub struct ChildHandle {
    child: Option<Child>,
}

impl ChildHandle {
    /// OS process id, if the child was spawned and not yet killed.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }
}

/// Production launcher built on `tokio::process`.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    /// Also kill everything the child spawned (e.g. the binary `go run` built).
    kill_descendants: bool,
}

impl CommandLauncher {
    pub fn new(kill_descendants: bool) -> Self {
        Self { kill_descendants }
    }
}

#[async_trait]
impl Launcher for CommandLauncher {
    type Handle = ChildHandle;

    fn launch(&mut self, spec: &LaunchSpec) -> ChildHandle {
        let spawned = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn();

        match spawned {
            Ok(child) => {
                crate::debug_event!("process", "spawned", "pid {:?}", child.id());
                ChildHandle { child: Some(child) }
            }
            Err(e) => {
                let err = WatchError::LaunchFailed {
                    program: spec.program.clone(),
                    reason: e.to_string(),
                };
                tracing::error!("[process] {err}");
                ChildHandle { child: None }
            }
        }
    }

    async fn kill(&mut self, handle: &mut ChildHandle) {
        let Some(mut child) = handle.child.take() else {
            return;
        };

        if self.kill_descendants {
            if let Some(pid) = child.id() {
                match tokio::task::spawn_blocking(move || kill_descendants(pid)).await {
                    Ok(0) => {}
                    Ok(count) => crate::debug_event!("process", "killed descendants", "{count}"),
                    Err(e) => tracing::warn!("[process] descendant scan failed: {e}"),
                }
            }
        }

        // An error here means the child already exited and was reaped
        if let Err(e) = child.kill().await {
            crate::debug_event!("process", "kill ignored", "{e}");
        }
    }
}

/// Kill every live descendant of `root`, returning how many were signalled.
fn kill_descendants(root: u32) -> usize {
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::All, true);

    let mut found: Vec<Pid> = Vec::new();
    let mut frontier = vec![Pid::from_u32(root)];
    while let Some(parent) = frontier.pop() {
        for (pid, process) in sys.processes() {
            if process.parent() == Some(parent) && !found.contains(pid) {
                found.push(*pid);
                frontier.push(*pid);
            }
        }
    }

    found
        .iter()
        .filter_map(|pid| sys.process(*pid))
        .filter(|process| process.kill())
        .count()
}
