use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a setup branch.
///
/// Everything here is fatal. A missing optional tool is not an error; it is
/// reported as a warning by [`crate::probe::check_optional_tool`].
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("{tool} not found on PATH ({hint})")]
    ToolingMissing { tool: String, hint: String },

    #[error("dependency install failed in {}: {reason}", dir.display())]
    DependencyInstallFailed { dir: PathBuf, reason: String },

    #[error("{} not found", path.display())]
    ManifestNotFound { path: PathBuf },

    #[error("invalid configuration in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl SetupError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        SetupError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn install_failed(dir: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SetupError::DependencyInstallFailed {
            dir: dir.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SetupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_path() {
        let err = SetupError::DirectoryNotFound {
            path: PathBuf::from("/srv/app/backend"),
        };
        assert_eq!(err.to_string(), "directory not found: /srv/app/backend");

        let err = SetupError::install_failed("frontend", "npm install exited with code 1");
        assert_eq!(
            err.to_string(),
            "dependency install failed in frontend: npm install exited with code 1"
        );
    }

    #[test]
    fn tooling_missing_includes_hint() {
        let err = SetupError::ToolingMissing {
            tool: "python3".into(),
            hint: "install from https://python.org".into(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("python3 not found"));
        assert!(msg.contains("python.org"));
    }

    #[test]
    fn io_error_keeps_source() {
        use std::error::Error as _;
        let err = SetupError::io(
            "creating .devup",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "creating .devup: denied");
    }
}
