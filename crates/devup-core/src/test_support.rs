//! In-memory `ProcessHost` for unit tests.

use crate::error::Result;
use crate::host::{CommandSpec, ProcessHost, RunStatus};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

/// Records every call. `venv` and `install` commands create the directories
/// the real tools would, so follow-up existence checks behave.
#[derive(Default)]
pub struct FakeHost {
    tools: HashMap<String, PathBuf>,
    failing: Vec<String>,
    pub runs: RefCell<Vec<CommandSpec>>,
    pub spawned: RefCell<Vec<CommandSpec>>,
    pub killed_patterns: RefCell<Vec<String>>,
    pub killed_pids: RefCell<Vec<u32>>,
}

impl FakeHost {
    pub fn with_tools(tools: &[&str]) -> Self {
        Self {
            tools: tools
                .iter()
                .map(|t| (t.to_string(), PathBuf::from("/fake/bin").join(t)))
                .collect(),
            ..Default::default()
        }
    }

    /// Any command line containing `needle` exits with code 1.
    pub fn failing(mut self, needle: &str) -> Self {
        self.failing.push(needle.to_string());
        self
    }

    pub fn run_lines(&self) -> Vec<String> {
        self.runs.borrow().iter().map(CommandSpec::command_line).collect()
    }

    pub fn spawn_lines(&self) -> Vec<String> {
        self.spawned.borrow().iter().map(CommandSpec::command_line).collect()
    }
}

impl ProcessHost for FakeHost {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.tools.get(program).cloned()
    }

    fn run(&self, cmd: &CommandSpec) -> Result<RunStatus> {
        self.runs.borrow_mut().push(cmd.clone());
        let line = cmd.command_line();
        if self.failing.iter().any(|n| line.contains(n.as_str())) {
            return Ok(RunStatus {
                success: false,
                code: Some(1),
            });
        }
        if cmd.args.iter().any(|a| a == "venv") {
            let venv = cmd.cwd.join(cmd.args.last().map(String::as_str).unwrap_or(".venv"));
            let python = crate::prepare::venv_python(&venv);
            std::fs::create_dir_all(python.parent().unwrap()).unwrap();
            std::fs::write(&python, "").unwrap();
        } else if cmd.args.first().map(String::as_str) == Some("install") {
            std::fs::create_dir_all(cmd.cwd.join("node_modules")).unwrap();
        }
        Ok(RunStatus {
            success: true,
            code: Some(0),
        })
    }

    fn spawn_detached(&self, cmd: &CommandSpec) -> Result<u32> {
        let mut spawned = self.spawned.borrow_mut();
        spawned.push(cmd.clone());
        Ok(1000 + spawned.len() as u32)
    }

    fn kill_matching(&self, pattern: &str) -> bool {
        self.killed_patterns.borrow_mut().push(pattern.to_string());
        true
    }

    fn kill_pid(&self, pid: u32) -> bool {
        self.killed_pids.borrow_mut().push(pid);
        true
    }
}
