//! Search-path probing for interpreters, package managers and optional tools.

use crate::host::ProcessHost;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Environment variable the backend reads to locate FFmpeg.
pub const FFMPEG_ENV: &str = "FFMPEG_PATH";

/// Find `program` on the current `PATH`.
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    find_in(program, &path_var)
}

/// Find `program` in an explicit search path.
///
/// A name containing a path separator is checked as-is instead of searched.
pub fn find_in(program: &str, path_var: &OsStr) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    for dir in std::env::split_paths(path_var) {
        for name in executable_names(program) {
            let full = dir.join(&name);
            if is_executable(&full) {
                return Some(full);
            }
        }
    }
    None
}

#[cfg(windows)]
fn executable_names(program: &str) -> Vec<String> {
    if Path::new(program).extension().is_some() {
        return vec![program.to_string()];
    }
    let pathext = std::env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string());
    let mut names: Vec<String> = pathext
        .split(';')
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!("{}{}", program, ext.to_ascii_lowercase()))
        .collect();
    names.push(program.to_string());
    names
}

#[cfg(not(windows))]
fn executable_names(program: &str) -> Vec<String> {
    vec![program.to_string()]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match std::fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Outcome of probing for a tool the backend can run without.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    Found(PathBuf),
    Missing(String),
}

/// The name to probe for an optional tool, honoring `FFMPEG_PATH` for ffmpeg.
pub fn optional_tool_name(tool: &str) -> String {
    if tool == "ffmpeg" {
        if let Ok(custom) = std::env::var(FFMPEG_ENV) {
            if !custom.trim().is_empty() {
                return custom;
            }
        }
    }
    tool.to_string()
}

/// Probe for an optional tool. Absence is reported, never raised.
pub fn check_optional_tool(host: &dyn ProcessHost, name: &str) -> ToolStatus {
    match host.locate(name) {
        Some(path) => {
            tracing::debug!(tool = name, path = %path.display(), "optional tool found");
            ToolStatus::Found(path)
        }
        None => {
            tracing::debug!(tool = name, "optional tool not found");
            ToolStatus::Missing(name.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_executable(path: &Path) {
        std::fs::write(path, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
    }

    #[cfg(not(windows))]
    #[test]
    fn finds_program_in_second_dir() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        make_executable(&b.path().join("ffmpeg"));

        let path_var = std::env::join_paths([a.path(), b.path()]).unwrap();
        let found = find_in("ffmpeg", &path_var).unwrap();
        assert_eq!(found, b.path().join("ffmpeg"));
    }

    #[test]
    fn missing_program_returns_none() {
        let a = tempfile::tempdir().unwrap();
        let path_var = std::env::join_paths([a.path()]).unwrap();
        assert!(find_in("definitely-not-here", &path_var).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_skipped() {
        let a = tempfile::tempdir().unwrap();
        std::fs::write(a.path().join("ffmpeg"), "data").unwrap();
        let path_var = std::env::join_paths([a.path()]).unwrap();
        assert!(find_in("ffmpeg", &path_var).is_none());
    }

    #[test]
    fn directory_with_program_name_is_skipped() {
        let a = tempfile::tempdir().unwrap();
        std::fs::create_dir(a.path().join("node")).unwrap();
        let path_var = std::env::join_paths([a.path()]).unwrap();
        assert!(find_in("node", &path_var).is_none());
    }

    #[cfg(not(windows))]
    #[test]
    fn explicit_path_checked_directly() {
        let a = tempfile::tempdir().unwrap();
        let tool = a.path().join("ffmpeg-static");
        make_executable(&tool);

        let empty = std::ffi::OsString::new();
        let found = find_in(tool.to_str().unwrap(), &empty).unwrap();
        assert_eq!(found, tool);
        assert!(find_in(a.path().join("nope").to_str().unwrap(), &empty).is_none());
    }

    #[test]
    fn non_ffmpeg_tools_ignore_env_override() {
        assert_eq!(optional_tool_name("sox"), "sox");
    }
}
