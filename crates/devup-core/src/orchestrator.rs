use crate::config::DevConfig;
use crate::error::{Result, SetupError};
use crate::host::ProcessHost;
use crate::launcher::{self, Desktop, Launched};
use crate::lock::BackendLock;
use crate::prepare;
use crate::probe::{self, ToolStatus};
use crate::reaper;
use crate::utils::ui;
use std::path::Path;

pub const BACKEND_TITLE: &str = "devup backend";
pub const FRONTEND_TITLE: &str = "devup frontend";

#[derive(Debug, Clone)]
pub struct UpOptions {
    pub backend: bool,
    pub frontend: bool,
    pub force_install: bool,
    pub desktop: Desktop,
}

impl Default for UpOptions {
    fn default() -> Self {
        Self {
            backend: true,
            frontend: true,
            force_install: false,
            desktop: Desktop::current(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LaunchSummary {
    pub backend: Option<Launched>,
    pub frontend: Option<Launched>,
    pub backend_url: Option<String>,
    pub frontend_url: Option<String>,
    /// Non-fatal problems, such as a missing optional tool.
    pub warnings: Vec<String>,
}

/// Prepare and launch both servers, backend first.
///
/// Fail-fast: the first error aborts the run, so a broken backend never gets
/// as far as touching the frontend.
pub fn run_up(
    host: &dyn ProcessHost,
    root: &Path,
    config: &DevConfig,
    options: &UpOptions,
) -> Result<LaunchSummary> {
    let mut summary = LaunchSummary::default();

    if options.backend {
        ui::section("Backend");
        let dir = config.backend_dir(root);
        if !dir.is_dir() {
            return Err(SetupError::DirectoryNotFound { path: dir });
        }

        // Must precede the relaunch or the port is still taken.
        reaper::reap_stale_backend(host, root, &config.backend);

        let env = prepare::ensure_backend_env(host, &dir, &config.backend, options.force_install)?;

        for tool in &config.tools.optional {
            let name = probe::optional_tool_name(tool);
            if let ToolStatus::Missing(name) = probe::check_optional_tool(host, &name) {
                let mut message = format!(
                    "{} not found; the backend starts but features needing it will fail",
                    name
                );
                if tool == "ffmpeg" {
                    message.push_str(&format!(" (set {} to point at it)", probe::FFMPEG_ENV));
                }
                ui::warn(&message);
                summary.warnings.push(message);
            }
        }

        let cmd = launcher::backend_command(&env, &dir, &config.backend);
        let launched = launcher::launch(
            host,
            &config.launch.terminal_choice(),
            &options.desktop,
            BACKEND_TITLE,
            &cmd,
        )?;

        let lock = BackendLock::new(
            launched.pid,
            &launched.command,
            &config.backend.host,
            config.backend.port,
        );
        if let Err(e) = lock.save(root) {
            tracing::warn!(error = %e, "could not record backend pid");
        }

        summary.backend = Some(launched);
        summary.backend_url = Some(config.backend_url());
    }

    if options.frontend {
        ui::section("Frontend");
        let dir = config.frontend_dir(root);
        let env = prepare::ensure_frontend_env(host, &dir, &config.frontend)?;
        let cmd = launcher::frontend_command(&env, &dir, &config.frontend);
        let launched = launcher::launch(
            host,
            &config.launch.terminal_choice(),
            &options.desktop,
            FRONTEND_TITLE,
            &cmd,
        )?;
        summary.frontend = Some(launched);
        summary.frontend_url = Some(config.frontend_url());
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::Platform;
    use crate::test_support::FakeHost;

    fn options() -> UpOptions {
        UpOptions {
            desktop: Desktop::of(Platform::Linux),
            ..Default::default()
        }
    }

    fn detached_config() -> DevConfig {
        let mut config = DevConfig::default();
        config.launch.terminal = "none".into();
        config
    }

    fn project() -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("backend")).unwrap();
        std::fs::write(root.path().join("backend/requirements.txt"), "fastapi\n").unwrap();
        std::fs::create_dir_all(root.path().join("frontend")).unwrap();
        std::fs::write(root.path().join("frontend/package.json"), "{}").unwrap();
        root
    }

    #[test]
    fn reap_happens_before_any_launch() {
        let root = project();
        let host = FakeHost::with_tools(&["python3", "npm", "ffmpeg"]);

        run_up(&host, root.path(), &detached_config(), &options()).unwrap();
        assert_eq!(host.killed_patterns.borrow().len(), 1);
        assert_eq!(host.spawned.borrow().len(), 2);
        assert!(host.spawn_lines()[0].contains("uvicorn"));
        assert!(host.spawn_lines()[1].ends_with("npm run dev"));
    }

    #[test]
    fn frontend_only_skips_backend_entirely() {
        let root = project();
        let host = FakeHost::with_tools(&["npm"]);
        let opts = UpOptions {
            backend: false,
            ..options()
        };

        let summary = run_up(&host, root.path(), &detached_config(), &opts).unwrap();
        assert!(summary.backend.is_none());
        assert!(summary.frontend.is_some());
        assert!(host.killed_patterns.borrow().is_empty());
        assert!(!root.path().join("backend/.venv").exists());
    }

    #[test]
    fn missing_backend_dir_aborts_before_reaping() {
        let root = tempfile::tempdir().unwrap();
        let host = FakeHost::with_tools(&["python3", "npm"]);

        let err = run_up(&host, root.path(), &detached_config(), &options()).unwrap_err();
        assert!(matches!(err, SetupError::DirectoryNotFound { .. }));
        assert!(host.killed_patterns.borrow().is_empty());
        assert!(host.spawned.borrow().is_empty());
    }
}
