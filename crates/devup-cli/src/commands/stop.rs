use anyhow::{Context, Result};
use colored::Colorize;
use devup_core::config::BackendConfig;
use devup_core::lock::BackendLock;
use devup_core::reaper::{self, ReapOutcome};
use devup_core::{project, DevConfig, ProcessHost, SystemHost};
use std::path::Path;

/// Kill the backend and forget its recorded PID.
fn stop_backend(host: &dyn ProcessHost, root: &Path, config: &BackendConfig) -> Result<ReapOutcome> {
    let outcome = reaper::reap_stale_backend(host, root, config);
    BackendLock::remove(root)?;
    Ok(outcome)
}

pub fn run(root: Option<&Path>) -> Result<()> {
    let root = project::resolve_root(root).context("could not resolve project root")?;
    let config = DevConfig::load(&root)?;

    println!("{}", "Stopping backend...".bold());
    match stop_backend(&SystemHost, &root, &config.backend)? {
        ReapOutcome::Terminated(_) => println!("{}", "Backend stopped.".green()),
        ReapOutcome::NothingFound => println!("{}", "No running backend found.".yellow()),
    }
    Ok(())
}
