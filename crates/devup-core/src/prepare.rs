//! Makes the backend and frontend directories runnable.

use crate::config::{BackendConfig, FrontendConfig};
use crate::error::{Result, SetupError};
use crate::host::{CommandSpec, ProcessHost};
use crate::utils::{self, ui};
use std::path::{Path, PathBuf};

pub const VENV_DIR: &str = ".venv";
pub const NODE_MODULES_DIR: &str = "node_modules";
pub const PACKAGE_JSON: &str = "package.json";
/// Package marker that makes the backend's `app/` importable.
pub const PACKAGE_MARKER: &str = "app/__init__.py";
const REQUIREMENTS_STAMP: &str = ".devup-requirements";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEnv {
    /// Interpreter inside the virtual environment.
    pub python: PathBuf,
    pub venv_created: bool,
    pub deps_installed: bool,
    pub marker_created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendEnv {
    /// Resolved package manager executable.
    pub package_manager: PathBuf,
    pub deps_installed: bool,
}

/// Interpreter path inside a virtual environment.
pub fn venv_python(venv: &Path) -> PathBuf {
    if cfg!(windows) {
        venv.join("Scripts").join("python.exe")
    } else {
        venv.join("bin").join("python")
    }
}

fn interpreter_candidates(configured: Option<&str>) -> Vec<String> {
    match configured {
        Some(python) => vec![python.to_string()],
        None if cfg!(windows) => vec!["py".to_string(), "python".to_string()],
        None => vec!["python3".to_string(), "python".to_string()],
    }
}

/// Find an interpreter able to create the virtual environment.
pub fn resolve_interpreter(host: &dyn ProcessHost, configured: Option<&str>) -> Result<PathBuf> {
    let candidates = interpreter_candidates(configured);
    candidates
        .iter()
        .find_map(|name| host.locate(name))
        .ok_or_else(|| SetupError::ToolingMissing {
            tool: candidates.join(" / "),
            hint: "install Python 3 from https://python.org".to_string(),
        })
}

pub fn resolve_package_manager(host: &dyn ProcessHost, name: &str) -> Result<PathBuf> {
    host.locate(name).ok_or_else(|| SetupError::ToolingMissing {
        tool: name.to_string(),
        hint: "install Node.js from https://nodejs.org".to_string(),
    })
}

fn require_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(SetupError::DirectoryNotFound {
            path: dir.to_path_buf(),
        })
    }
}

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SetupError::ManifestNotFound {
            path: path.to_path_buf(),
        })
    }
}

fn read_stamp(venv: &Path) -> Option<String> {
    std::fs::read_to_string(venv.join(REQUIREMENTS_STAMP))
        .ok()
        .map(|s| s.trim().to_string())
}

/// Whether the installed requirements match the manifest on disk.
pub fn requirements_up_to_date(dir: &Path, config: &BackendConfig) -> bool {
    let Ok(bytes) = std::fs::read(dir.join(&config.requirements)) else {
        return false;
    };
    let hash = utils::content_hash(&bytes);
    read_stamp(&dir.join(VENV_DIR)).as_deref() == Some(hash.as_str())
}

/// Create `.venv` if needed, install the requirements, touch the package marker.
///
/// The install is skipped when `.venv/.devup-requirements` holds the hash of
/// the current requirements file, unless `force_install` is set.
pub fn ensure_backend_env(
    host: &dyn ProcessHost,
    dir: &Path,
    config: &BackendConfig,
    force_install: bool,
) -> Result<BackendEnv> {
    require_dir(dir)?;
    let manifest = dir.join(&config.requirements);
    require_file(&manifest)?;

    let venv = dir.join(VENV_DIR);
    let python = venv_python(&venv);

    let venv_created = if venv.exists() {
        ui::skipped(VENV_DIR, "already exists");
        false
    } else {
        let interpreter = resolve_interpreter(host, config.python.as_deref())?;
        let cmd = CommandSpec::new(interpreter.to_string_lossy(), dir).args(["-m", "venv", VENV_DIR]);
        ui::running(&cmd.command_line());
        let status = host.run(&cmd)?;
        if !status.success {
            return Err(SetupError::install_failed(
                dir,
                format!("creating virtual environment {}", status.describe()),
            ));
        }
        ui::created(VENV_DIR);
        true
    };

    if !python.exists() {
        return Err(SetupError::install_failed(
            dir,
            format!("no interpreter at {}; delete {} and retry", python.display(), venv.display()),
        ));
    }

    let manifest_bytes = std::fs::read(&manifest)
        .map_err(|e| SetupError::io(format!("reading {}", manifest.display()), e))?;
    let hash = utils::content_hash(&manifest_bytes);

    let deps_installed = if !force_install && read_stamp(&venv).as_deref() == Some(hash.as_str()) {
        ui::skipped(&config.requirements, "dependencies up to date");
        false
    } else {
        let cmd = CommandSpec::new(python.to_string_lossy(), dir).args([
            "-m",
            "pip",
            "install",
            "-r",
            config.requirements.as_str(),
        ]);
        ui::running(&cmd.command_line());
        let status = host.run(&cmd)?;
        if !status.success {
            return Err(SetupError::install_failed(
                dir,
                format!("pip install {}", status.describe()),
            ));
        }
        utils::write_file(&venv.join(REQUIREMENTS_STAMP), &hash)?;
        true
    };

    let marker = dir.join(PACKAGE_MARKER);
    let marker_created = if marker.exists() {
        false
    } else {
        utils::write_file(&marker, "")?;
        ui::created(PACKAGE_MARKER);
        true
    };

    tracing::info!(
        dir = %dir.display(),
        venv_created,
        deps_installed,
        marker_created,
        "backend environment ready"
    );

    Ok(BackendEnv {
        python,
        venv_created,
        deps_installed,
        marker_created,
    })
}

/// Run the package manager's install when `node_modules` is absent.
pub fn ensure_frontend_env(
    host: &dyn ProcessHost,
    dir: &Path,
    config: &FrontendConfig,
) -> Result<FrontendEnv> {
    require_dir(dir)?;
    require_file(&dir.join(PACKAGE_JSON))?;
    let package_manager = resolve_package_manager(host, &config.package_manager)?;

    let deps_installed = if dir.join(NODE_MODULES_DIR).is_dir() {
        ui::skipped(NODE_MODULES_DIR, "already installed");
        false
    } else {
        let cmd = CommandSpec::new(package_manager.to_string_lossy(), dir).arg("install");
        ui::running(&cmd.command_line());
        let status = host.run(&cmd)?;
        if !status.success {
            return Err(SetupError::install_failed(
                dir,
                format!("{} install {}", config.package_manager, status.describe()),
            ));
        }
        true
    };

    tracing::info!(dir = %dir.display(), deps_installed, "frontend environment ready");

    Ok(FrontendEnv {
        package_manager,
        deps_installed,
    })
}
