//! The reload loop: coalesce, decide, restart.

use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

use crate::process::{Launcher, ProcessSupervisor};
use crate::watcher::{CycleReport, EventCoalescer, NotificationSource, ReloadDecision};

/// Everything the loop mutates, owned by the single task running it.
pub struct ReloadLoop<S: NotificationSource, L: Launcher> {
    source: S,
    coalescer: EventCoalescer,
    supervisor: ProcessSupervisor<L>,
    interval: Duration,
}

impl<S: NotificationSource, L: Launcher> ReloadLoop<S, L> {
    pub fn new(
        source: S,
        coalescer: EventCoalescer,
        supervisor: ProcessSupervisor<L>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            coalescer,
            supervisor,
            interval,
        }
    }

    pub fn coalescer(&self) -> &EventCoalescer {
        &self.coalescer
    }

    pub fn supervisor(&self) -> &ProcessSupervisor<L> {
        &self.supervisor
    }

    /// Launch the first child. Until this runs there is nothing to restart.
    pub async fn start(&mut self) {
        self.supervisor.start().await;
    }

    /// Run one coalescing cycle and restart the child if anything changed.
    pub async fn tick(&mut self) -> CycleReport {
        let report = self.coalescer.drain(&mut self.source);

        if report.decision() == ReloadDecision::Reload {
            crate::log_event!("reload", "restarting", "{} events", report.events);
            self.supervisor.restart().await;
        }

        report
    }

    /// Tick every interval until `cancel` fires, then stop the child.
    ///
    /// Launches the first child if [`start`](Self::start) was not called.
    pub async fn run(mut self, cancel: CancellationToken) {
        if self.supervisor.current().is_none() {
            self.start().await;
        }

        let start = tokio::time::Instant::now() + self.interval;
        let mut ticker = interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        crate::log_event!(
            "reload",
            "started",
            "{} directories, polling every {:?}",
            self.coalescer.dirs().len(),
            self.interval
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        self.shutdown().await;
    }

    /// Terminate the current child. The loop can be started again afterwards.
    pub async fn shutdown(&mut self) {
        self.supervisor.stop().await;
        crate::log_event!("reload", "stopped");
    }
}
