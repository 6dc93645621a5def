use crate::error::{Result, SetupError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "devup.toml";
pub const LOCAL_CONFIG_FILE: &str = "devup.local.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub launch: LaunchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_dir")]
    pub dir: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_backend_port")]
    pub port: u16,
    /// ASGI application path handed to uvicorn.
    #[serde(default = "default_app")]
    pub app: String,
    /// Interpreter used to create the venv. Searched on PATH when unset.
    #[serde(default)]
    pub python: Option<String>,
    #[serde(default = "default_requirements")]
    pub requirements: String,
    #[serde(default = "default_true")]
    pub reload: bool,
    #[serde(default)]
    pub reaper: ReaperStrategy,
    /// Substring of the backend's command line used by the name reaper.
    /// Derived from `app` when unset.
    #[serde(default)]
    pub process_pattern: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            dir: default_backend_dir(),
            host: default_host(),
            port: default_backend_port(),
            app: default_app(),
            python: None,
            requirements: default_requirements(),
            reload: true,
            reaper: ReaperStrategy::default(),
            process_pattern: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    #[serde(default = "default_frontend_dir")]
    pub dir: String,
    #[serde(default = "default_package_manager")]
    pub package_manager: String,
    /// Port the dev server picks on its own. Only used for the printed URL.
    #[serde(default = "default_frontend_port")]
    pub port: u16,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            dir: default_frontend_dir(),
            package_manager: default_package_manager(),
            port: default_frontend_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_optional_tools")]
    pub optional: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            optional: default_optional_tools(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// "auto", "none", or the name of a terminal emulator binary.
    #[serde(default = "default_terminal")]
    pub terminal: String,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            terminal: default_terminal(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReaperStrategy {
    /// Kill anything whose command line matches `process_pattern`.
    #[default]
    Name,
    /// Kill only the PID recorded in `.devup/backend.json`.
    Pid,
}

/// Parsed form of `[launch] terminal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalChoice {
    Auto,
    Detached,
    Emulator(String),
}

impl BackendConfig {
    /// What the name reaper looks for in process command lines.
    pub fn process_pattern(&self) -> String {
        match &self.process_pattern {
            Some(pattern) => pattern.clone(),
            None => format!("uvicorn {}", self.app),
        }
    }
}

impl LaunchConfig {
    pub fn terminal_choice(&self) -> TerminalChoice {
        match self.terminal.trim() {
            "" | "auto" => TerminalChoice::Auto,
            "none" => TerminalChoice::Detached,
            other => TerminalChoice::Emulator(other.to_string()),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_backend_dir() -> String {
    "backend".to_string()
}

fn default_frontend_dir() -> String {
    "frontend".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_backend_port() -> u16 {
    8000
}

fn default_frontend_port() -> u16 {
    5173
}

fn default_app() -> String {
    "app.main:app".to_string()
}

fn default_requirements() -> String {
    "requirements.txt".to_string()
}

fn default_package_manager() -> String {
    "npm".to_string()
}

fn default_optional_tools() -> Vec<String> {
    vec!["ffmpeg".to_string()]
}

fn default_terminal() -> String {
    "auto".to_string()
}

/// Deep-merge two TOML values. The `override_val` takes precedence over `base`.
/// Tables are merged recursively; all other types are replaced.
fn deep_merge(base: toml::Value, override_val: toml::Value) -> toml::Value {
    match (base, override_val) {
        (toml::Value::Table(mut base_table), toml::Value::Table(override_table)) => {
            for (key, override_v) in override_table {
                let merged = if let Some(base_v) = base_table.remove(&key) {
                    deep_merge(base_v, override_v)
                } else {
                    override_v
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_base, override_val) => override_val,
    }
}

fn read_table(path: &Path) -> Result<Option<toml::Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| SetupError::io(format!("reading {}", path.display()), e))?;
    let value: toml::Value = toml::from_str(&content).map_err(|e| SetupError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(Some(value))
}

impl DevConfig {
    /// Load `devup.toml` from `root`, with `devup.local.toml` merged on top.
    ///
    /// Both files are optional; with neither present the defaults describe the
    /// conventional `backend/` + `frontend/` layout.
    pub fn load(root: &Path) -> Result<Self> {
        let base_path = root.join(CONFIG_FILE);
        let local_path = root.join(LOCAL_CONFIG_FILE);

        let base = read_table(&base_path)?
            .unwrap_or_else(|| toml::Value::Table(toml::value::Table::new()));
        let (merged, source) = match read_table(&local_path)? {
            Some(local) => (deep_merge(base, local), local_path),
            None => (base, base_path),
        };

        let config: DevConfig = merged.try_into().map_err(|e: toml::de::Error| {
            SetupError::Config {
                path: source.clone(),
                message: e.to_string(),
            }
        })?;
        config.validate(&source)?;
        Ok(config)
    }

    fn validate(&self, source: &Path) -> Result<()> {
        let invalid = |message: &str| SetupError::Config {
            path: source.to_path_buf(),
            message: message.to_string(),
        };
        if self.backend.port == 0 {
            return Err(invalid("backend.port must be non-zero"));
        }
        if self.frontend.port == 0 {
            return Err(invalid("frontend.port must be non-zero"));
        }
        if self.backend.dir.trim().is_empty() || self.frontend.dir.trim().is_empty() {
            return Err(invalid("backend.dir and frontend.dir must not be empty"));
        }
        if self.backend.process_pattern().trim().is_empty() {
            return Err(invalid("backend.process_pattern must not be empty"));
        }
        // A terminal wrapper exits right away, so its recorded PID may be reused.
        if self.backend.reaper == ReaperStrategy::Pid
            && self.launch.terminal_choice() != TerminalChoice::Detached
        {
            return Err(invalid(
                "backend.reaper = \"pid\" requires launch.terminal = \"none\"",
            ));
        }
        Ok(())
    }

    pub fn backend_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.backend.dir)
    }

    pub fn frontend_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.frontend.dir)
    }

    /// URL printed for the backend. A wildcard bind address is shown as localhost.
    pub fn backend_url(&self) -> String {
        let host = match self.backend.host.as_str() {
            "0.0.0.0" | "::" | "[::]" => "localhost",
            other => other,
        };
        format!("http://{}:{}", host, self.backend.port)
    }

    pub fn frontend_url(&self) -> String {
        format!("http://localhost:{}", self.frontend.port)
    }
}
