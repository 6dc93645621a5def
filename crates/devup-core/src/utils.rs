use crate::error::{Result, SetupError};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Write content to a file, creating parent directories as needed.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| SetupError::io(format!("creating {}", parent.display()), e))?;
    }
    fs::write(path, content).map_err(|e| SetupError::io(format!("writing {}", path.display()), e))
}

/// Compute SHA-256 hex digest of content.
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("sha256:{:x}", hasher.finalize())
}

/// Pretty CLI output helpers using the `colored` crate.
pub mod ui {
    use colored::Colorize;

    /// Print a "create" action (green)
    pub fn created(what: &str) {
        println!("  {} {}", "create".green(), what);
    }

    /// Print a "run" action (cyan)
    pub fn running(command: &str) {
        println!("  {} {}", "run".cyan(), command);
    }

    /// Print a "skip" action (yellow)
    pub fn skipped(what: &str, reason: &str) {
        println!("  {} {} ({})", "skip".yellow(), what, reason);
    }

    /// Print a "kill" action (red)
    pub fn killed(what: &str) {
        println!("  {} {}", "kill".red(), what);
    }

    /// Print a "launch" action (magenta)
    pub fn launched(what: &str, pid: u32) {
        println!("  {} {} (pid {})", "launch".magenta(), what, pid);
    }

    /// Print a section header (bold)
    pub fn section(title: &str) {
        println!("\n{}", title.bold());
    }

    /// Print a success message (green bold)
    pub fn success(msg: &str) {
        println!("\n{}", msg.green().bold());
    }

    /// Print a warning (yellow)
    pub fn warn(msg: &str) {
        println!("  {} {}", "warn".yellow(), msg);
    }

    /// Print a check result (pass)
    pub fn check_pass(msg: &str) {
        println!("  {} {}", "✓".green(), msg);
    }

    /// Print a check result (fail)
    pub fn check_fail(msg: &str) {
        println!("  {} {}", "✗".red(), msg);
    }
}
