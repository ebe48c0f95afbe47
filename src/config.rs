// ABOUTME: Configuration structures and parsing for the screenshot preference commands and favorites
// ABOUTME: Loaded from a TOML file in the user config directory, generated with defaults on first run

use crate::destination::Destination;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "shotdest";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub screencapture: ScreencaptureConfig,
    #[serde(default)]
    pub favorites: FavoritesConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ScreencaptureConfig {
    pub defaults_program: String,
    pub killall_program: String,
    pub domain: String,
    pub key: String,
    pub refresh_process: String,
    pub refresh_after_write: bool,
    pub command_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FavoritesConfig {
    /// Seeded on first run, before anything has been saved.
    pub defaults: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_path: Option<String>,
}

fn default_refresh_after_write() -> bool {
    true
}

fn default_command_timeout_secs() -> u64 {
    5
}

impl Default for ScreencaptureConfig {
    fn default() -> Self {
        ScreencaptureConfig {
            defaults_program: "/usr/bin/defaults".to_string(),
            killall_program: "/usr/bin/killall".to_string(),
            domain: "com.apple.screencapture".to_string(),
            key: "location".to_string(),
            refresh_process: "SystemUIServer".to_string(),
            refresh_after_write: default_refresh_after_write(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        FavoritesConfig {
            defaults: vec![
                "~/Desktop".to_string(),
                "~/Documents".to_string(),
                "~/Pictures".to_string(),
            ],
            state_path: None,
        }
    }
}

impl Config {
    pub fn default_config_content() -> &'static str {
        r#"# Screenshot Destination Configuration

[screencapture]
# Commands used to read and write the screenshot location preference
defaults_program = "/usr/bin/defaults"
killall_program = "/usr/bin/killall"
domain = "com.apple.screencapture"
key = "location"
# Process restarted after a write so the change takes effect without logging out
refresh_process = "SystemUIServer"
refresh_after_write = true
# Upper bound on how long any of the above commands may run
command_timeout_secs = 5

[favorites]
# Folders offered on first run, before any favorites have been saved
defaults = ["~/Desktop", "~/Documents", "~/Pictures"]
# Where the favorites list is stored (defaults to favorites.toml next to this file)
# state_path = "~/Library/Application Support/shotdest/favorites.toml"
"#
    }

    pub fn load_from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration")
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        Self::load_from_str(&content)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(app_dir()?.join("config.toml"))
    }

    pub fn default_state_path() -> Result<PathBuf> {
        Ok(app_dir()?.join("favorites.toml"))
    }

    /// Reads the config file, writing the default content first when missing.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            Self::save_default_config(path)?;
            tracing::info!("Created default configuration at: {}", path.display());
        }
        Self::load_from_file(path)
    }

    pub fn expand_path(&mut self) -> Result<()> {
        for folder in &mut self.favorites.defaults {
            *folder = expand_tilde(folder)?;
        }
        if let Some(state_path) = &self.favorites.state_path {
            self.favorites.state_path = Some(expand_tilde(state_path)?);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let capture = &self.screencapture;

        if capture.defaults_program.is_empty() {
            anyhow::bail!("defaults_program cannot be empty");
        }

        if capture.domain.is_empty() || capture.key.is_empty() {
            anyhow::bail!("Preference domain and key cannot be empty");
        }

        if capture.command_timeout_secs == 0 {
            anyhow::bail!("command_timeout_secs must be greater than 0");
        }

        if capture.refresh_after_write
            && (capture.killall_program.is_empty() || capture.refresh_process.is_empty())
        {
            anyhow::bail!("refresh_after_write requires killall_program and refresh_process");
        }

        if self.favorites.defaults.iter().any(|folder| folder.is_empty()) {
            anyhow::bail!("Default favorites cannot contain empty paths");
        }

        Ok(())
    }

    pub fn save_default_config(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        fs::write(path, Self::default_config_content())
            .with_context(|| format!("Failed to write default config to: {}", path.display()))?;

        Ok(())
    }

    pub fn default_destinations(&self) -> Vec<Destination> {
        self.favorites.defaults.iter().map(Destination::new).collect()
    }

    pub fn state_path(&self) -> Result<PathBuf> {
        match &self.favorites.state_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Self::default_state_path(),
        }
    }
}

fn app_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Failed to determine config directory")?;
    Ok(config_dir.join(APP_DIR))
}

fn expand_tilde(path: &str) -> Result<String> {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home.join(rest).to_string_lossy().into_owned())
    } else {
        Ok(path.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_config() {
        let config_str = r#"
[screencapture]
defaults_program = "/usr/bin/defaults"
killall_program = "/usr/bin/killall"
domain = "com.apple.screencapture"
key = "location"
refresh_process = "SystemUIServer"

[favorites]
defaults = ["~/Desktop"]
"#;

        let config = Config::load_from_str(config_str).unwrap();

        assert_eq!(config.screencapture.domain, "com.apple.screencapture");
        assert_eq!(config.screencapture.refresh_after_write, true); // Default value
        assert_eq!(config.screencapture.command_timeout_secs, 5); // Default value
        assert_eq!(config.favorites.defaults, vec!["~/Desktop"]);
        assert!(config.favorites.state_path.is_none());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = Config::load_from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_sections_keep_remaining_defaults() {
        let config_str = r#"
[screencapture]
command_timeout_secs = 10

[favorites]
state_path = "~/shots.toml"
"#;

        let config = Config::load_from_str(config_str).unwrap();

        assert_eq!(config.screencapture.command_timeout_secs, 10);
        assert_eq!(config.screencapture.defaults_program, "/usr/bin/defaults");
        assert_eq!(config.screencapture.refresh_process, "SystemUIServer");
        assert!(config.screencapture.refresh_after_write);
        assert_eq!(config.favorites.defaults, FavoritesConfig::default().defaults);
        assert_eq!(config.favorites.state_path.as_deref(), Some("~/shots.toml"));
    }

    #[test]
    fn test_parse_invalid_config_wrong_type() {
        let config_str = r#"
[screencapture]
defaults_program = "/usr/bin/defaults"
killall_program = "/usr/bin/killall"
domain = "com.apple.screencapture"
key = "location"
refresh_process = "SystemUIServer"
command_timeout_secs = "soon"  # Should be an integer
"#;

        let result = Config::load_from_str(config_str);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to parse configuration"));
    }

    #[test]
    fn test_expand_tilde() {
        let home = dirs::home_dir().unwrap();
        let home_str = home.to_string_lossy();

        assert_eq!(expand_tilde("~/test").unwrap(), format!("{}/test", home_str));
        assert_eq!(expand_tilde("/absolute/path").unwrap(), "/absolute/path");
        assert_eq!(expand_tilde("relative/path").unwrap(), "relative/path");
    }

    #[test]
    fn test_config_expand_paths() {
        let mut config = Config::default();
        config.favorites.state_path = Some("~/state/favorites.toml".to_string());
        config.expand_path().unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(config.favorites.defaults[0], home.join("Desktop").to_string_lossy());
        assert_eq!(
            config.state_path().unwrap(),
            home.join("state").join("favorites.toml")
        );
    }

    #[test]
    fn test_default_paths() {
        let config_path = Config::default_config_path().unwrap();
        assert!(config_path.to_string_lossy().contains("shotdest"));
        assert!(config_path.to_string_lossy().ends_with("config.toml"));

        let state_path = Config::default().state_path().unwrap();
        assert_eq!(state_path.parent(), config_path.parent());
        assert!(state_path.to_string_lossy().ends_with("favorites.toml"));
    }

    #[test]
    fn test_default_destinations_are_home_folders() {
        let destinations = Config::default().default_destinations();
        let names: Vec<&str> = destinations.iter().map(|d| d.display_name()).collect();

        assert_eq!(names, vec!["Desktop", "Documents", "Pictures"]);
        assert_eq!(destinations[0], Destination::in_home("Desktop"));
    }

    #[test]
    fn test_validate_empty_defaults_program() {
        let mut config = Config::default();
        config.screencapture.defaults_program = "".to_string();

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("defaults_program cannot be empty"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.screencapture.command_timeout_secs = 0;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("command_timeout_secs"));
    }

    #[test]
    fn test_validate_refresh_without_process() {
        let mut config = Config::default();
        config.screencapture.refresh_process = "".to_string();
        assert!(config.validate().is_err());

        config.screencapture.refresh_after_write = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_default_config_content_can_be_parsed() {
        let content = Config::default_config_content();
        let config = Config::load_from_str(content).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config::load_or_create(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config, Config::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), Config::default_config_content());
    }
}
