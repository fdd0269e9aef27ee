use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::{DEFAULT_ROLE, normalize_role};
use crate::control::CommitPolicy;
use crate::domain::WorkerSpec;
use crate::worker::HttpWorkerConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub role: String,
    pub operator: OperatorConfig,
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub workers: WorkersConfig,
    pub dispatch: DispatchConfig,
}

/// Operator station settings edited from the settings page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    pub server: String,
    pub port: u16,
    pub bot_base: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub dir: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("LOOPS"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub host: String,
    pub command_timeout_ms: u64,
    pub status_timeout_ms: u64,
    pub pool: Vec<WorkerSpec>,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            command_timeout_ms: 2000,
            status_timeout_ms: 500,
            pool: vec![
                WorkerSpec::new("BOT1", 6001),
                WorkerSpec::new("BOT2", 6002),
                WorkerSpec::new("BOT3", 6003),
            ],
        }
    }
}

impl WorkersConfig {
    pub fn http(&self) -> HttpWorkerConfig {
        HttpWorkerConfig {
            command_timeout: Duration::from_millis(self.command_timeout_ms),
            status_timeout: Duration::from_millis(self.status_timeout_ms),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub commit_policy: CommitPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            role: DEFAULT_ROLE.to_string(),
            operator: OperatorConfig::default(),
            server: ServerConfig::default(),
            catalog: CatalogConfig::default(),
            workers: WorkersConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

/// The settings surface: operator fields plus the active role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub bot_base: String,
    pub role: String,
}

/// A settings change. Operator fields left out keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_base: Option<String>,
    pub role: String,
}

impl SettingsUpdate {
    /// Change only the role
    pub fn role(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            ..Self::default()
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidates() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// The file `load` would read, if any exists
    pub fn locate(config_path: Option<&PathBuf>) -> Option<PathBuf> {
        match config_path {
            Some(path) => Some(path.clone()),
            None => Self::candidates().into_iter().find(|p| p.exists()),
        }
    }

    /// Primary location ~/.config/<project>/<project>.yml, then ./<project>.yml
    fn candidates() -> Vec<PathBuf> {
        let project_name = env!("CARGO_PKG_NAME");
        let mut candidates = Vec::new();
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join(project_name).join(format!("{}.yml", project_name)));
        }
        candidates.push(PathBuf::from(format!("{}.yml", project_name)));
        candidates
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let mut config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.role = normalize_role(&config.role);

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Write the configuration back as YAML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        fs::write(path, content).context(format!("Failed to write config to {}", path.display()))?;

        log::info!("Saved config to: {}", path.display());
        Ok(())
    }

    pub fn settings(&self) -> Settings {
        Settings {
            server: self.operator.server.clone(),
            port: self.operator.port,
            bot_base: self.operator.bot_base.clone(),
            role: self.role.clone(),
        }
    }

    pub fn apply_settings(&mut self, update: SettingsUpdate) {
        if let Some(server) = update.server {
            self.operator.server = server;
        }
        if let Some(port) = update.port {
            self.operator.port = port;
        }
        if let Some(bot_base) = update.bot_base {
            self.operator.bot_base = bot_base;
        }
        self.role = normalize_role(&update.role);
    }
}
