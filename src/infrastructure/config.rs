use crate::domain::{config::RelayConfig, error::{RelayError, RelayResult}};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_DIR_NAME: &str = "serial-relay";
const PROJECT_DIR_NAME: &str = ".serial-relay";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration manager
pub struct ConfigManager {
    global_config_path: Option<PathBuf>,
    project_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager
    pub fn new() -> Self {
        Self {
            global_config_path: Self::get_global_config_path(),
            project_config_path: Self::find_project_config_path(),
        }
    }

    /// Load configuration: project file, else global file, else defaults
    pub fn load_config(&self) -> RelayResult<RelayConfig> {
        let candidates = [&self.project_config_path, &self.global_config_path];
        for path in candidates.into_iter().flatten() {
            if path.exists() {
                debug!("Loading configuration from {}", path.display());
                return self.load_config_from_path(path);
            }
        }

        Ok(RelayConfig::default())
    }

    /// Get global configuration path
    fn get_global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Find project configuration path by walking up directory tree
    fn find_project_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut path = current_dir.as_path();

        loop {
            let config_path = path.join(PROJECT_DIR_NAME).join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Some(config_path);
            }

            path = path.parent()?;
        }
    }

    /// Load configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> RelayResult<RelayConfig> {
        let content = fs::read_to_string(path).map_err(|e| RelayError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: RelayConfig = toml::from_str(&content).map_err(|e| RelayError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to specific path
    pub fn save_config_to_path(&self, path: &Path, config: &RelayConfig) -> RelayResult<()> {
        let content = toml::to_string_pretty(config).map_err(|e| RelayError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| RelayError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })
    }

    /// Create default project configuration under `path`
    pub fn init_project_config(&self, path: &Path) -> RelayResult<PathBuf> {
        let config_dir = path.join(PROJECT_DIR_NAME);
        let config_file = config_dir.join(CONFIG_FILE_NAME);

        if config_file.exists() {
            return Err(RelayError::Config {
                message: "Project configuration already exists".to_string(),
            });
        }

        fs::create_dir_all(&config_dir).map_err(|e| RelayError::Config {
            message: format!("Failed to create {} directory: {}", PROJECT_DIR_NAME, e),
        })?;

        self.save_config_to_path(&config_file, &RelayConfig::default())?;

        Ok(config_file)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
