//! Configuration management for Deskpilot
//!
//! Handles loading and saving the settings shared by every session:
//! log locations, agent behaviour and experience persistence. A loaded
//! [`Config`] is handed to sessions and rounds as an `Arc<Config>`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Host (application selection) agent settings
    #[serde(default)]
    pub host_agent: HostAgentConfig,
    /// App (action execution) agent settings
    #[serde(default)]
    pub app_agent: AppAgentConfig,
    /// Experience persistence settings
    #[serde(default)]
    pub experience: ExperienceConfig,
}

impl Config {
    /// Log directory for a task: `<log_root>/<task>/`
    pub fn task_log_dir(&self, task: &str) -> PathBuf {
        self.general.log_root.join(task)
    }
}

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Root directory holding one log directory per task
    pub log_root: PathBuf,
    /// Log level
    pub log_level: String,
    /// Global step ceiling for a whole session
    pub max_step: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_root: PathBuf::from("logs"),
            log_level: "info".to_string(),
            max_step: 50,
        }
    }
}

/// Host agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostAgentConfig {
    /// Name given to the host agent
    pub name: String,
    /// Attach the screenshot to decision requests
    pub visual_mode: bool,
}

impl Default for HostAgentConfig {
    fn default() -> Self {
        Self {
            name: "HostAgent".to_string(),
            visual_mode: true,
        }
    }
}

/// App agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppAgentConfig {
    /// Attach the screenshot to decision requests
    pub visual_mode: bool,
    /// Follow the host plan as step-by-step instructions
    pub follower_mode: bool,
    /// Action names that end the round once executed
    pub terminal_actions: Vec<String>,
    /// Number of past experiences retrieved as examples (0 disables retrieval)
    pub experience_top_k: usize,
}

impl Default for AppAgentConfig {
    fn default() -> Self {
        Self {
            visual_mode: true,
            follower_mode: false,
            terminal_actions: vec!["finish".to_string()],
            experience_top_k: 0,
        }
    }
}

/// Experience persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceConfig {
    /// Directory holding `experience.yaml` and `experience_db/`
    pub saved_path: PathBuf,
    /// Save without asking once the session completes
    pub auto_save: bool,
}

impl Default for ExperienceConfig {
    fn default() -> Self {
        Self {
            saved_path: PathBuf::from("vectordb/experience"),
            auto_save: false,
        }
    }
}

/// Configuration manager for loading and saving config
pub struct ConfigManager {
    config_path: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::with_path(config_path)
    }

    /// Create a config manager with a specific path
    pub fn with_path(config_path: PathBuf) -> Result<Self> {
        let config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            Config::default()
        };

        Ok(Self { config_path, config })
    }

    /// Get the default config path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not find config directory".to_string()))?;

        Ok(config_dir.join("deskpilot").join("config.toml"))
    }

    fn load_from_path(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;

        if config.general.max_step == 0 {
            return Err(Error::Config("general.max_step must be at least 1".to_string()));
        }
        Ok(config)
    }

    /// Get the current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to configuration
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Path the configuration is loaded from and saved to
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Save the current configuration to disk
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(&self.config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&self.config_path, content)
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Consume the manager, keeping only the configuration
    pub fn into_config(self) -> Config {
        self.config
    }
}
