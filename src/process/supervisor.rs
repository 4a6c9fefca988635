//! Ownership of the single supervised child.

use chrono::{DateTime, Local};
use console::style;

use super::launcher::{LaunchSpec, Launcher};

/// The child currently running under supervision.
#[derive(Debug)]
pub struct SupervisedProcess<H> {
    pub handle: H,
    pub launched_at: DateTime<Local>,
    pub args: Vec<String>,
    /// Increases by one with every launch; identifies this instance.
    pub generation: u64,
}

/// Owns at most one child process and replaces it on demand.
///
/// [`restart`](Self::restart) is the only place a new child replaces an old
/// one, and it always kills the old one first.
pub struct ProcessSupervisor<L: Launcher> {
    launcher: L,
    spec: LaunchSpec,
    current: Option<SupervisedProcess<L::Handle>>,
    generation: u64,
}

impl<L: Launcher> ProcessSupervisor<L> {
    pub fn new(launcher: L, spec: LaunchSpec) -> Self {
        Self {
            launcher,
            spec,
            current: None,
            generation: 0,
        }
    }

    /// The live child, if one has been started and not stopped.
    pub fn current(&self) -> Option<&SupervisedProcess<L::Handle>> {
        self.current.as_ref()
    }

    /// Number of launches so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Launch a child, stopping any previous one first.
    pub async fn start(&mut self) -> &SupervisedProcess<L::Handle> {
        if self.current.is_some() {
            self.stop().await;
        }

        let launched_at = Local::now();
        println!(
            "{} [{}] {}...",
            style("Running").green().bold(),
            launched_at.format("%d %b %y %H:%M:%S"),
            self.spec
        );

        let handle = self.launcher.launch(&self.spec);
        self.generation += 1;
        crate::debug_event!("supervisor", "started", "generation {}", self.generation);

        self.current.insert(SupervisedProcess {
            handle,
            launched_at,
            args: self.spec.args.clone(),
            generation: self.generation,
        })
    }

    /// Terminate the current child. Does nothing when none is running.
    pub async fn stop(&mut self) {
        if let Some(mut process) = self.current.take() {
            self.launcher.kill(&mut process.handle).await;
            crate::debug_event!("supervisor", "stopped", "generation {}", process.generation);
        }
    }

    /// Kill the current child and launch its replacement.
    pub async fn restart(&mut self) -> &SupervisedProcess<L::Handle> {
        self.stop().await;
        self.start().await
    }
}
