//! Bootstrap: settings, initial walk, and the reload loop task.

use anyhow::{Context, Result};
use clap::CommandFactory;
use tokio_util::sync::CancellationToken;

use super::args::Cli;
use crate::config::Settings;
use crate::process::{CommandLauncher, LaunchSpec, ProcessSupervisor};
use crate::reload::ReloadLoop;
use crate::watcher::{
    DirectorySet, EventCoalescer, Exclusions, NotifySource, WatchError, watch_tree,
};

/// Parse-independent entry point for the binary.
pub async fn run(cli: Cli) -> Result<()> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(|e| anyhow::anyhow!("Configuration error: {e}"))?;

    cli.apply(&mut settings);
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration error: {e}"))?;

    crate::logging::init_with_config(&settings.logging, settings.watch.verbose);

    if cli.show_config {
        println!("{}", settings.to_toml()?);
        return Ok(());
    }

    if cli.files.is_empty() {
        println!("Must have at least one file.");
        println!();
        Cli::command().print_help()?;
        return Ok(());
    }

    let spec = launch_spec(&settings, &cli.files);
    let reload = prepare(&settings, spec).context("Fatal error")?;

    let cancel = CancellationToken::new();
    let task = tokio::spawn(reload.run(cancel.clone()));

    shutdown_signal().await;
    crate::log_event!("reloader", "shutting down");
    cancel.cancel();
    task.await.context("reload loop panicked")?;

    Ok(())
}

/// Program plus configured leading arguments plus the user's files.
pub fn launch_spec(settings: &Settings, files: &[String]) -> LaunchSpec {
    let mut args = settings.reload.args.clone();
    args.extend(files.iter().cloned());
    LaunchSpec::new(settings.reload.program.clone(), args)
}

/// Create the OS watcher and subscribe the whole tree.
///
/// Every error here is a setup error: the caller exits without ever
/// entering the loop.
pub fn prepare(
    settings: &Settings,
    spec: LaunchSpec,
) -> Result<ReloadLoop<NotifySource, CommandLauncher>, WatchError> {
    let mut source = NotifySource::new()?;

    let root =
        std::fs::canonicalize(&settings.watch.root).map_err(|e| WatchError::WalkFailed {
            path: settings.watch.root.clone(),
            reason: e.to_string(),
        })?;

    let exclusions = Exclusions::new(settings.watch.exclude.iter().cloned());
    let mut dirs = DirectorySet::new();
    let count = watch_tree(&root, &mut dirs, &mut source, &exclusions)?;
    crate::log_event!("walk", "watching", "{count} directories under {}", root.display());

    let coalescer = EventCoalescer::new(dirs, exclusions, settings.watch.verbose);
    let supervisor = ProcessSupervisor::new(
        CommandLauncher::new(settings.reload.kill_descendants),
        spec,
    );

    Ok(ReloadLoop::new(
        source,
        coalescer,
        supervisor,
        settings.reload.interval(),
    ))
}

/// Resolve on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("[reloader] cannot listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("[reloader] cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
