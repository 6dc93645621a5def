//! Best-effort termination of a backend left over from a previous run.
//!
//! Nothing in here fails: a stale process that cannot be found or killed is
//! logged and ignored so the relaunch can proceed.

use crate::config::{BackendConfig, ReaperStrategy};
use crate::host::ProcessHost;
use crate::lock::BackendLock;
use crate::utils::ui;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReapOutcome {
    Terminated(String),
    NothingFound,
}

pub fn reap_stale_backend(
    host: &dyn ProcessHost,
    root: &Path,
    config: &BackendConfig,
) -> ReapOutcome {
    let outcome = match config.reaper {
        ReaperStrategy::Name => reap_by_name(host, &config.process_pattern()),
        ReaperStrategy::Pid => reap_by_lock(host, root),
    };
    match &outcome {
        ReapOutcome::Terminated(target) => ui::killed(target),
        ReapOutcome::NothingFound => tracing::debug!("no stale backend process"),
    }
    outcome
}

/// Coarse kill by command line or image name. May hit unrelated processes
/// that share the pattern.
fn reap_by_name(host: &dyn ProcessHost, pattern: &str) -> ReapOutcome {
    if host.kill_matching(pattern) {
        ReapOutcome::Terminated(pattern.to_string())
    } else {
        ReapOutcome::NothingFound
    }
}

fn reap_by_lock(host: &dyn ProcessHost, root: &Path) -> ReapOutcome {
    let lock = match BackendLock::load(root) {
        Ok(Some(lock)) => lock,
        Ok(None) => return ReapOutcome::NothingFound,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unreadable backend lock");
            let _ = BackendLock::remove(root);
            return ReapOutcome::NothingFound;
        }
    };

    let killed = host.kill_pid(lock.pid);
    if let Err(e) = BackendLock::remove(root) {
        tracing::debug!(error = %e, "could not remove backend lock");
    }
    if killed {
        ReapOutcome::Terminated(format!("pid {}", lock.pid))
    } else {
        tracing::debug!(pid = lock.pid, "recorded backend already gone");
        ReapOutcome::NothingFound
    }
}
