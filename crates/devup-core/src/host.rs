//! OS process plumbing behind a trait so setup steps can be exercised in tests.

use crate::error::{Result, SetupError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A command to execute: program, arguments, working directory and extra env.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, cwd: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.as_ref().to_path_buf(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Render as a single shell command line, quoting where needed.
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|s| shell_quote(s))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(&self.cwd);
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

pub(crate) fn shell_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,\\".contains(c));
    if plain {
        s.to_string()
    } else if cfg!(windows) {
        format!("\"{}\"", s.replace('"', "\\\""))
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}

/// Exit state of a blocking command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    pub success: bool,
    pub code: Option<i32>,
}

impl RunStatus {
    pub fn describe(&self) -> String {
        match self.code {
            Some(code) => format!("exited with code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Everything devup asks of the operating system.
pub trait ProcessHost {
    /// Resolve a program on the search path.
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Run to completion with inherited stdio.
    fn run(&self, cmd: &CommandSpec) -> Result<RunStatus>;

    /// Start without waiting. Returns the PID of the spawned process.
    fn spawn_detached(&self, cmd: &CommandSpec) -> Result<u32>;

    /// Best-effort kill of every process whose command line contains
    /// `pattern`. Returns whether anything was signalled.
    fn kill_matching(&self, pattern: &str) -> bool;

    /// Best-effort kill of a process started by `spawn_detached`, along with
    /// its children.
    fn kill_pid(&self, pid: u32) -> bool;
}

/// The real operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl ProcessHost for SystemHost {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        crate::probe::find_on_path(program)
    }

    fn run(&self, cmd: &CommandSpec) -> Result<RunStatus> {
        tracing::debug!(command = %cmd, cwd = %cmd.cwd.display(), "running");
        let status = cmd
            .to_command()
            .status()
            .map_err(|e| SetupError::io(format!("failed to run `{}`", cmd), e))?;
        Ok(RunStatus {
            success: status.success(),
            code: status.code(),
        })
    }

    fn spawn_detached(&self, cmd: &CommandSpec) -> Result<u32> {
        tracing::debug!(command = %cmd, cwd = %cmd.cwd.display(), "spawning detached");
        let mut command = cmd.to_command();
        command.stdin(Stdio::null());

        // Own process group so Ctrl+C in the invoking shell does not reach it.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(0x0000_0200); // CREATE_NEW_PROCESS_GROUP
        }

        let child = command
            .spawn()
            .map_err(|e| SetupError::io(format!("failed to start `{}`", cmd), e))?;
        Ok(child.id())
    }

    #[cfg(not(windows))]
    fn kill_matching(&self, pattern: &str) -> bool {
        // pkill exits 1 when nothing matched
        Command::new("pkill")
            .args(["-f", pattern])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[cfg(windows)]
    fn kill_matching(&self, pattern: &str) -> bool {
        // The script exits 1 when nothing matched
        Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command"])
            .arg(windows_kill_script(pattern))
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[cfg(not(windows))]
    fn kill_pid(&self, pid: u32) -> bool {
        let signal = |target: String| {
            Command::new("kill")
                .args(["-9", "--", target.as_str()])
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
        };
        // spawn_detached makes the child a group leader, so this takes the
        // reload worker down with it.
        signal(format!("-{}", pid)) || signal(pid.to_string())
    }

    #[cfg(windows)]
    fn kill_pid(&self, pid: u32) -> bool {
        Command::new("taskkill")
            .args(["/pid", &pid.to_string(), "/T", "/F"])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

/// PowerShell that tree-kills every process whose command line contains
/// `pattern`, skipping itself. `taskkill /IM` only sees image names, and the
/// backend runs as `python.exe`.
#[cfg_attr(not(windows), allow(dead_code))]
fn windows_kill_script(pattern: &str) -> String {
    format!(
        "$targets = @(Get-CimInstance Win32_Process | Where-Object {{ \
         $_.ProcessId -ne $PID -and $_.CommandLine -and $_.CommandLine.Contains('{}') }}); \
         if ($targets.Count -eq 0) {{ exit 1 }}; \
         foreach ($p in $targets) {{ taskkill /PID $p.ProcessId /T /F | Out-Null }}; \
         exit 0",
        pattern.replace('\'', "''")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_args_and_env() {
        let cmd = CommandSpec::new("npm", "/tmp/frontend")
            .arg("run")
            .args(["dev", "--", "--open"])
            .env("BROWSER", "none");
        assert_eq!(cmd.program, "npm");
        assert_eq!(cmd.args, vec!["run", "dev", "--", "--open"]);
        assert_eq!(cmd.cwd, PathBuf::from("/tmp/frontend"));
        assert_eq!(cmd.env, vec![("BROWSER".to_string(), "none".to_string())]);
    }

    #[test]
    fn command_line_leaves_plain_words_alone() {
        let cmd = CommandSpec::new("python", ".")
            .args(["-m", "uvicorn", "app.main:app", "--port", "8000"]);
        assert_eq!(cmd.command_line(), "python -m uvicorn app.main:app --port 8000");
    }

    #[cfg(not(windows))]
    #[test]
    fn command_line_quotes_spaces_and_quotes() {
        let cmd = CommandSpec::new("/opt/my tools/python", ".").arg("it's");
        assert_eq!(cmd.command_line(), r#"'/opt/my tools/python' 'it'\''s'"#);
    }

    #[test]
    fn empty_argument_is_quoted() {
        assert_ne!(shell_quote(""), "");
    }

    #[test]
    fn run_status_description() {
        let failed = RunStatus {
            success: false,
            code: Some(2),
        };
        assert_eq!(failed.describe(), "exited with code 2");
        let signalled = RunStatus {
            success: false,
            code: None,
        };
        assert_eq!(signalled.describe(), "terminated by signal");
    }

    #[cfg(unix)]
    #[test]
    fn system_host_reports_exit_codes() {
        let host = SystemHost;
        let ok = host
            .run(&CommandSpec::new("sh", ".").args(["-c", "exit 0"]))
            .unwrap();
        assert!(ok.success);
        let bad = host
            .run(&CommandSpec::new("sh", ".").args(["-c", "exit 3"]))
            .unwrap();
        assert!(!bad.success);
        assert_eq!(bad.code, Some(3));
    }

    #[test]
    fn windows_kill_script_matches_command_lines() {
        let script = windows_kill_script("uvicorn app.main:app");
        assert!(script.contains("Win32_Process"));
        assert!(script.contains(".Contains('uvicorn app.main:app')"));
        assert!(script.contains("-ne $PID"));
        assert!(script.contains("/T /F"));
        assert!(script.contains("exit 1"));
    }

    #[test]
    fn windows_kill_script_escapes_quotes() {
        let script = windows_kill_script("it's");
        assert!(script.contains(".Contains('it''s')"));
    }

    /// Running and not a zombie.
    #[cfg(target_os = "linux")]
    fn alive(pid: u32) -> bool {
        std::fs::read_to_string(format!("/proc/{}/stat", pid))
            .ok()
            .and_then(|stat| stat.rsplit(')').next().map(|rest| !rest.trim_start().starts_with('Z')))
            .unwrap_or(false)
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn kill_pid_takes_down_the_process_group() {
        use std::time::Duration;

        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("worker.pid");
        let script = format!(
            "exec >/dev/null 2>&1; sleep 300 & echo $! > {}; wait",
            shell_quote(&pid_file.to_string_lossy())
        );
        let pid = SystemHost
            .spawn_detached(&CommandSpec::new("sh", dir.path()).args(["-c", script.as_str()]))
            .unwrap();

        let mut worker = None;
        for _ in 0..200 {
            worker = std::fs::read_to_string(&pid_file)
                .ok()
                .and_then(|s| s.trim().parse::<u32>().ok());
            if worker.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        let worker = worker.expect("worker pid written");
        assert!(alive(worker));

        assert!(SystemHost.kill_pid(pid));

        let mut gone = false;
        for _ in 0..200 {
            if !alive(worker) {
                gone = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        if !gone {
            let _ = Command::new("kill").args(["-9".to_string(), worker.to_string()]).status();
        }
        assert!(gone, "worker {} survived the group kill", worker);
    }

    #[test]
    fn system_host_missing_program_is_io_error() {
        let err = SystemHost
            .run(&CommandSpec::new("devup-no-such-program-xyz", "."))
            .unwrap_err();
        assert!(matches!(err, SetupError::Io { .. }));
    }
}
