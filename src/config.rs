//! Configuration loading and the persisted dashboard session
//!
//! Priority for every setting:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::filter::ALL_UNIVERSITIES;
use crate::{Error, Result};

pub const APP_DIR: &str = "wellbeing-dashboard";
pub const ENV_API_URL: &str = "WELLBEING_API_URL";
pub const ENV_LOG_LEVEL: &str = "WELLBEING_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub universities: Vec<String>,
    pub log_level: String,
    pub session_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            request_timeout_secs: 30,
            universities: vec!["UAL".to_string(), "SOL".to_string()],
            log_level: "info".to_string(),
            session_file: None,
        }
    }
}

/// Overrides supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_file: Option<PathBuf>,
    pub api_base_url: Option<String>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Resolves the effective configuration; `env` looks up environment variables.
    pub fn resolve<F>(cli: &CliOverrides, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match &cli.config_file {
            Some(path) => Self::from_file(path)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)
                    .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?,
                _ => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        if let Some(url) = env(ENV_API_URL) {
            config.api_base_url = url;
        }
        if let Some(level) = env(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(url) = &cli.api_base_url {
            config.api_base_url = url.clone();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "api_base_url must be an http(s) URL, got {:?}",
                self.api_base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn session_path(&self) -> PathBuf {
        self.session_file.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("session.toml")
        })
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// State that survives between runs: pinned university and consent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub university: String,
    pub consent: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            university: ALL_UNIVERSITIES.to_string(),
            consent: false,
        }
    }
}

impl Session {
    /// Only an unpinned ("All") session may switch between universities.
    pub fn can_switch_university(&self) -> bool {
        self.university == ALL_UNIVERSITIES
    }

    pub fn permits(&self, university: &str) -> bool {
        self.can_switch_university() || self.university == university
    }
}

pub trait SessionStore {
    fn load(&self) -> Result<Session>;
    fn save(&self, session: &Session) -> Result<()>;
}

pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Session> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No stored session, using default");
            return Ok(Session::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, toml::to_string(session)?)?;
        debug!(path = %self.path.display(), "Saved session");
        Ok(())
    }
}
