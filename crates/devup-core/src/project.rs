use crate::config::CONFIG_FILE;
use crate::error::{Result, SetupError};
use std::path::{Path, PathBuf};

pub const ROOT_ENV: &str = "DEVUP_ROOT";

/// Resolve the project root.
///
/// Order: explicit `--root`, then `DEVUP_ROOT`, then the nearest ancestor of
/// the working directory holding `devup.toml` or a `backend/` directory, and
/// finally the working directory itself.
pub fn resolve_root(explicit: Option<&Path>) -> Result<PathBuf> {
    let chosen = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(ROOT_ENV).map(PathBuf::from));

    if let Some(dir) = chosen {
        if !dir.is_dir() {
            return Err(SetupError::DirectoryNotFound { path: dir });
        }
        return dir
            .canonicalize()
            .map_err(|e| SetupError::io(format!("resolving {}", dir.display()), e));
    }

    let cwd = std::env::current_dir().map_err(|e| SetupError::io("reading working directory", e))?;
    Ok(find_root_from(&cwd))
}

pub fn find_root_from(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE).is_file() || dir.join("backend").is_dir())
        .unwrap_or(start)
        .to_path_buf()
}
