pub mod doctor;
pub mod stop;
pub mod up;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "devup",
    version,
    about = "Set up and launch the backend (uvicorn) and frontend (npm) dev servers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Project root containing backend/ and frontend/ (default: DEVUP_ROOT,
    /// else the nearest directory with devup.toml or backend/)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Print debug diagnostics to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Prepare environments and launch both dev servers (the default)
    Up {
        /// Only set up and launch the backend
        #[arg(long, conflicts_with = "frontend_only")]
        backend_only: bool,
        /// Only set up and launch the frontend
        #[arg(long)]
        frontend_only: bool,
        /// Reinstall backend requirements even if they look current
        #[arg(long)]
        force_install: bool,
    },
    /// Check tooling and project state without changing anything
    Doctor,
    /// Stop the backend started by a previous run
    Stop,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    let root = cli.root.as_deref();
    match cli.command {
        None => up::run(root, up::Scope::default()),
        Some(Commands::Up {
            backend_only,
            frontend_only,
            force_install,
        }) => up::run(
            root,
            up::Scope {
                backend: !frontend_only,
                frontend: !backend_only,
                force_install,
            },
        ),
        Some(Commands::Doctor) => doctor::run(root),
        Some(Commands::Stop) => stop::run(root),
        Some(Commands::Completions { shell }) => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "devup", &mut std::io::stdout());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_means_up() {
        let cli = Cli::try_parse_from(["devup"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.root.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn global_root_after_subcommand() {
        let cli = Cli::try_parse_from(["devup", "doctor", "--root", "/srv/radio"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Doctor)));
        assert_eq!(cli.root, Some(PathBuf::from("/srv/radio")));
    }

    #[test]
    fn backend_and_frontend_only_conflict() {
        let result = Cli::try_parse_from(["devup", "up", "--backend-only", "--frontend-only"]);
        assert!(result.is_err());
    }

    #[test]
    fn up_flags_parse() {
        let cli = Cli::try_parse_from(["devup", "up", "--backend-only", "--force-install"]).unwrap();
        match cli.command {
            Some(Commands::Up {
                backend_only,
                frontend_only,
                force_install,
            }) => {
                assert!(backend_only);
                assert!(!frontend_only);
                assert!(force_install);
            }
            _ => panic!("expected up"),
        }
    }
}
