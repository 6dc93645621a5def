use anyhow::{Context, Result};
use colored::Colorize;
use devup_core::project;
use devup_core::utils::ui;
use devup_core::{run_up, DevConfig, LaunchSummary, SystemHost, UpOptions};
use std::path::Path;

/// Which halves of the environment to bring up.
#[derive(Debug, Clone, Copy)]
pub struct Scope {
    pub backend: bool,
    pub frontend: bool,
    pub force_install: bool,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            backend: true,
            frontend: true,
            force_install: false,
        }
    }
}

pub fn run(root: Option<&Path>, scope: Scope) -> Result<()> {
    let root = project::resolve_root(root).context("could not resolve project root")?;
    let config = DevConfig::load(&root)?;

    println!(
        "{}",
        format!("Starting development environment in {}", root.display()).bold()
    );

    let options = UpOptions {
        backend: scope.backend,
        frontend: scope.frontend,
        force_install: scope.force_install,
        ..Default::default()
    };
    let summary = run_up(&SystemHost, &root, &config, &options)?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &LaunchSummary) {
    ui::success("Development servers launched");
    if let Some(url) = &summary.backend_url {
        println!("  {:<10} {}", "Backend".cyan(), url);
        println!("  {:<10} {}/docs", "API docs".cyan(), url);
    }
    if let Some(url) = &summary.frontend_url {
        println!("  {:<10} {}", "Frontend".cyan(), url);
    }
    if !summary.warnings.is_empty() {
        println!();
        println!(
            "{}",
            format!("{} warning(s) during setup, see above", summary.warnings.len()).yellow()
        );
    }
}
