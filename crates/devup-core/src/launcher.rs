//! Starts each dev server in its own terminal window and returns immediately.
//!
//! Launched servers are not supervised: no output capture, no restart. The
//! user closes the window to stop them (or runs `devup stop` for the backend).

use crate::config::{BackendConfig, FrontendConfig, TerminalChoice};
use crate::error::{Result, SetupError};
use crate::host::{shell_quote, CommandSpec, ProcessHost};
use crate::prepare::{BackendEnv, FrontendEnv};
use crate::utils::ui;
use std::path::Path;

const LINUX_TERMINALS: &[&str] = &["x-terminal-emulator", "gnome-terminal", "konsole", "xterm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }
}

/// Where windows get opened: the platform plus the user's `$TERMINAL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desktop {
    pub platform: Platform,
    pub preferred_terminal: Option<String>,
}

impl Desktop {
    pub fn current() -> Self {
        Self {
            platform: Platform::current(),
            preferred_terminal: std::env::var("TERMINAL")
                .ok()
                .filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn of(platform: Platform) -> Self {
        Self {
            platform,
            preferred_terminal: None,
        }
    }
}

/// A server that was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launched {
    pub title: String,
    pub pid: u32,
    /// The server command itself, without any terminal wrapper.
    pub command: String,
}

pub fn backend_command(env: &BackendEnv, dir: &Path, config: &BackendConfig) -> CommandSpec {
    let mut cmd = CommandSpec::new(env.python.to_string_lossy(), dir).args([
        "-m",
        "uvicorn",
        config.app.as_str(),
    ]);
    if config.reload {
        cmd = cmd.arg("--reload");
    }
    cmd.args(["--host", config.host.as_str()])
        .args(["--port".to_string(), config.port.to_string()])
        .env("PYTHONUNBUFFERED", "1")
}

pub fn frontend_command(env: &FrontendEnv, dir: &Path, _config: &FrontendConfig) -> CommandSpec {
    CommandSpec::new(env.package_manager.to_string_lossy(), dir).args(["run", "dev"])
}

/// `cd` into the server directory, run it, then keep the window open on a shell.
///
/// Env vars go on the command itself: Terminal.app and gnome-terminal start
/// the shell from their own server process, not from the wrapper.
fn posix_script(cmd: &CommandSpec) -> String {
    let assignments: String = cmd
        .env
        .iter()
        .map(|(k, v)| format!("{}={} ", k, shell_quote(v)))
        .collect();
    format!(
        "cd {} && {}{}; exec \"${{SHELL:-sh}}\"",
        shell_quote(&cmd.cwd.to_string_lossy()),
        assignments,
        cmd.command_line()
    )
}

fn applescript_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Pick the terminal emulator to use on Linux when set to `auto`.
pub fn detect_linux_terminal(host: &dyn ProcessHost, desktop: &Desktop) -> Option<String> {
    desktop
        .preferred_terminal
        .clone()
        .into_iter()
        .chain(LINUX_TERMINALS.iter().map(|t| t.to_string()))
        .find(|t| host.locate(t).is_some())
}

fn emulator_command(emulator: &str, title: &str, cmd: &CommandSpec, platform: Platform) -> CommandSpec {
    let wrapped = CommandSpec {
        program: emulator.to_string(),
        args: Vec::new(),
        cwd: cmd.cwd.clone(),
        env: cmd.env.clone(),
    };
    if platform == Platform::Windows {
        return wrapped.args(["cmd", "/K"]).arg(cmd.command_line());
    }

    let script = posix_script(cmd);
    let name = Path::new(emulator)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    match name.as_str() {
        "gnome-terminal" => wrapped
            .args(["--title", title, "--", "sh", "-c"])
            .arg(script),
        "xterm" => wrapped.args(["-T", title, "-e", "sh", "-c"]).arg(script),
        _ => wrapped.args(["-e", "sh", "-c"]).arg(script),
    }
}

/// Wrap a server command so it opens in a new terminal window.
///
/// Falls back to a plain detached process when `auto` finds no emulator.
pub fn wrap_in_terminal(
    host: &dyn ProcessHost,
    choice: &TerminalChoice,
    desktop: &Desktop,
    title: &str,
    cmd: &CommandSpec,
) -> Result<CommandSpec> {
    let platform = desktop.platform;
    match choice {
        TerminalChoice::Detached => Ok(cmd.clone()),
        TerminalChoice::Emulator(name) => {
            let path = host.locate(name).ok_or_else(|| SetupError::ToolingMissing {
                tool: name.clone(),
                hint: "set [launch] terminal to \"auto\" or \"none\" in devup.toml".to_string(),
            })?;
            Ok(emulator_command(&path.to_string_lossy(), title, cmd, platform))
        }
        TerminalChoice::Auto => match platform {
            Platform::Windows => {
                let mut wrapped = CommandSpec::new("cmd", &cmd.cwd)
                    .args(["/C", "start", title, "cmd", "/K"])
                    .arg(cmd.command_line());
                wrapped.env = cmd.env.clone();
                Ok(wrapped)
            }
            Platform::MacOs => {
                let script = format!(
                    "tell application \"Terminal\" to do script \"{}\"",
                    applescript_escape(&posix_script(cmd))
                );
                let mut wrapped = CommandSpec::new("osascript", &cmd.cwd).args(["-e", script.as_str()]);
                wrapped.env = cmd.env.clone();
                Ok(wrapped)
            }
            Platform::Linux => match detect_linux_terminal(host, desktop) {
                Some(emulator) => Ok(emulator_command(&emulator, title, cmd, platform)),
                None => {
                    ui::warn("no terminal emulator found; starting in the background instead");
                    Ok(cmd.clone())
                }
            },
        },
    }
}

/// Start `cmd` in a new window without waiting for it.
pub fn launch(
    host: &dyn ProcessHost,
    choice: &TerminalChoice,
    desktop: &Desktop,
    title: &str,
    cmd: &CommandSpec,
) -> Result<Launched> {
    let wrapped = wrap_in_terminal(host, choice, desktop, title, cmd)?;
    let pid = host.spawn_detached(&wrapped)?;
    ui::launched(title, pid);
    tracing::info!(title, pid, command = %cmd, "launched");
    Ok(Launched {
        title: title.to_string(),
        pid,
        command: cmd.command_line(),
    })
}
