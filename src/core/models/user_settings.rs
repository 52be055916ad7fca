use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::global_constants;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub recognition_service_url: String,
    pub project_service_url: String,
    pub language: String,
    pub tool_name: String,
    pub autosave_enabled: bool,
    pub request_timeout_seconds: u64,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            recognition_service_url: global_constants::DEFAULT_RECOGNITION_SERVICE_URL.to_string(),
            project_service_url: global_constants::DEFAULT_PROJECT_SERVICE_URL.to_string(),
            language: global_constants::DEFAULT_LANGUAGE.to_string(),
            tool_name: global_constants::TOOL_NAME.to_string(),
            autosave_enabled: true,
            request_timeout_seconds: global_constants::DEFAULT_REQUEST_TIMEOUT_SECONDS,
        }
    }
}

impl UserSettings {
    pub fn load() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_file_path()?;
        Self::load_from_path(&settings_path)
    }

    pub fn load_from_path(settings_path: &Path) -> anyhow::Result<Self> {
        if !settings_path.exists() {
            log::info!("[SETTINGS] No settings file found, using defaults");
            let default_settings = Self::default();
            default_settings.save_to_path(settings_path)?;
            return Ok(default_settings);
        }

        let contents = std::fs::read_to_string(settings_path)?;
        let settings: UserSettings = serde_json::from_str(&contents)?;

        log::info!("[SETTINGS] Loaded settings from {:?}", settings_path);
        log::debug!(
            "[SETTINGS] Recognition service: {}",
            settings.recognition_service_url
        );
        log::debug!("[SETTINGS] Project service: {}", settings.project_service_url);

        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let settings_path = Self::get_settings_file_path()?;
        self.save_to_path(&settings_path)
    }

    pub fn save_to_path(&self, settings_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = settings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(settings_path, contents)?;

        log::info!("[SETTINGS] Saved settings to {:?}", settings_path);
        Ok(())
    }

    pub fn get_config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join(global_constants::APPLICATION_DIR_NAME))
    }

    fn get_settings_file_path() -> anyhow::Result<PathBuf> {
        Ok(Self::get_config_dir()?.join(global_constants::SETTINGS_FILE_NAME))
    }
}
