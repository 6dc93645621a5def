use anyhow::{Context, Result};
use colored::Colorize;
use devup_core::config::{DevConfig, TerminalChoice, CONFIG_FILE};
use devup_core::launcher::{self, Desktop, Platform};
use devup_core::lock::BackendLock;
use devup_core::prepare::{self, NODE_MODULES_DIR, PACKAGE_JSON, PACKAGE_MARKER, VENV_DIR};
use devup_core::probe::{self, ToolStatus};
use devup_core::utils::ui;
use devup_core::{project, ProcessHost, SystemHost};
use std::path::Path;
use std::process::Command;

struct CheckResult {
    passed: bool,
    message: String,
}

impl CheckResult {
    fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }
}

fn check_exists(path: &Path, label: &str, hint: &str) -> CheckResult {
    if path.exists() {
        CheckResult::pass(format!("{} found", label))
    } else {
        CheckResult::fail(format!("{} not found ({})", label, hint))
    }
}

fn check_config(root: &Path) -> (CheckResult, DevConfig) {
    match DevConfig::load(root) {
        Ok(config) if root.join(CONFIG_FILE).exists() => {
            (CheckResult::pass(format!("{} valid", CONFIG_FILE)), config)
        }
        Ok(config) => (
            CheckResult::pass(format!("No {} (using defaults)", CONFIG_FILE)),
            config,
        ),
        Err(e) => (CheckResult::fail(e.to_string()), DevConfig::default()),
    }
}

/// First line of `<tool> --version`, trimmed.
fn tool_version(path: &Path) -> Option<String> {
    let output = Command::new(path).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    // python 2 printed its version on stderr
    let text = if stdout.trim().is_empty() { stderr } else { stdout };
    text.lines().next().map(|l| l.trim().to_string())
}

fn found_tool(label: &str, path: &Path) -> CheckResult {
    match tool_version(path) {
        Some(version) => CheckResult::pass(format!("{} ({})", label, version)),
        None => CheckResult::pass(format!("{} ({})", label, path.display())),
    }
}

fn check_python(host: &dyn ProcessHost, config: &DevConfig) -> CheckResult {
    match prepare::resolve_interpreter(host, config.backend.python.as_deref()) {
        Ok(path) => found_tool("Python", &path),
        Err(e) => CheckResult::fail(e.to_string()),
    }
}

fn check_package_manager(host: &dyn ProcessHost, config: &DevConfig) -> CheckResult {
    match prepare::resolve_package_manager(host, &config.frontend.package_manager) {
        Ok(path) => found_tool(&config.frontend.package_manager, &path),
        Err(e) => CheckResult::fail(e.to_string()),
    }
}

fn check_optional_tools(host: &dyn ProcessHost, config: &DevConfig) -> Vec<CheckResult> {
    config
        .tools
        .optional
        .iter()
        .map(|tool| {
            let name = probe::optional_tool_name(tool);
            match probe::check_optional_tool(host, &name) {
                ToolStatus::Found(path) => found_tool(&name, &path),
                ToolStatus::Missing(name) => {
                    CheckResult::fail(format!("{} not found (optional, backend still starts)", name))
                }
            }
        })
        .collect()
}

fn check_terminal(host: &dyn ProcessHost, config: &DevConfig) -> CheckResult {
    let desktop = Desktop::current();
    match config.launch.terminal_choice() {
        TerminalChoice::Detached => CheckResult::pass("Terminal: none (servers run in the background)"),
        TerminalChoice::Emulator(name) => match host.locate(&name) {
            Some(_) => CheckResult::pass(format!("Terminal: {}", name)),
            None => CheckResult::fail(format!("Terminal {} not found", name)),
        },
        TerminalChoice::Auto => match desktop.platform {
            Platform::Windows => CheckResult::pass("Terminal: cmd start"),
            Platform::MacOs => CheckResult::pass("Terminal: Terminal.app via osascript"),
            Platform::Linux => match launcher::detect_linux_terminal(host, &desktop) {
                Some(name) => CheckResult::pass(format!("Terminal: {}", name)),
                None => CheckResult::fail("No terminal emulator found (servers will run in the background)"),
            },
        },
    }
}

fn check_backend_env(backend: &Path, config: &DevConfig) -> Vec<CheckResult> {
    let venv = backend.join(VENV_DIR);
    let mut results = Vec::new();

    if !venv.exists() {
        results.push(CheckResult::fail(format!("{} missing (created on next run)", VENV_DIR)));
    } else if !prepare::venv_python(&venv).exists() {
        results.push(CheckResult::fail(format!(
            "{} has no interpreter (delete it and rerun)",
            VENV_DIR
        )));
    } else {
        results.push(CheckResult::pass(format!("{} present", VENV_DIR)));
    }

    if prepare::requirements_up_to_date(backend, &config.backend) {
        results.push(CheckResult::pass("Backend requirements installed"));
    } else {
        results.push(CheckResult::fail(
            "Backend requirements not installed or changed (installed on next run)",
        ));
    }

    results.push(check_exists(
        &backend.join(PACKAGE_MARKER),
        PACKAGE_MARKER,
        "created on next run",
    ));
    results
}

fn check_lock(root: &Path) -> CheckResult {
    match BackendLock::load(root) {
        Ok(Some(lock)) => CheckResult::pass(format!(
            "Last backend: pid {} on port {} (started {})",
            lock.pid, lock.port, lock.started_at
        )),
        Ok(None) => CheckResult::pass("No backend recorded"),
        Err(e) => CheckResult::fail(format!("Backend lock unreadable: {}", e)),
    }
}

pub fn run(root: Option<&Path>) -> Result<()> {
    let root = project::resolve_root(root).context("could not resolve project root")?;
    let host = SystemHost;

    println!("{}", "devup doctor".bold());
    println!("  root: {}", root.display());

    // === Project Layout ===
    ui::section("Project Layout");
    let (config_check, config) = check_config(&root);
    let backend = config.backend_dir(&root);
    let frontend = config.frontend_dir(&root);
    let layout_checks = vec![
        config_check,
        check_exists(&backend, &format!("{}/", config.backend.dir), "expected next to frontend/"),
        check_exists(
            &backend.join(&config.backend.requirements),
            &config.backend.requirements,
            "pinned backend dependencies",
        ),
        check_exists(&frontend, &format!("{}/", config.frontend.dir), "expected next to backend/"),
        check_exists(&frontend.join(PACKAGE_JSON), PACKAGE_JSON, "frontend package descriptor"),
    ];
    print_checks(&layout_checks);

    // === Tools ===
    ui::section("Development Tools");
    let mut tool_checks = vec![
        check_python(&host, &config),
        check_package_manager(&host, &config),
        check_terminal(&host, &config),
    ];
    tool_checks.extend(check_optional_tools(&host, &config));
    print_checks(&tool_checks);

    // === Environments ===
    ui::section("Environments");
    let mut env_checks = check_backend_env(&backend, &config);
    env_checks.push(check_exists(
        &frontend.join(NODE_MODULES_DIR),
        NODE_MODULES_DIR,
        "installed on next run",
    ));
    env_checks.push(check_lock(&root));
    print_checks(&env_checks);

    // === Summary ===
    let all: Vec<&CheckResult> = layout_checks
        .iter()
        .chain(tool_checks.iter())
        .chain(env_checks.iter())
        .collect();
    let total = all.len();
    let passed = all.iter().filter(|c| c.passed).count();

    println!();
    let summary = format!("{}/{} checks passed", passed, total);
    if passed == total {
        println!("{}", summary.green().bold());
    } else {
        println!("{}", summary.yellow().bold());
    }

    Ok(())
}

fn print_checks(checks: &[CheckResult]) {
    for check in checks {
        if check.passed {
            ui::check_pass(&check.message);
        } else {
            ui::check_fail(&check.message);
        }
    }
}
