use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_DIR: &str = "steam-presence";
const SETTINGS_FILE: &str = "settings.json";

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 40;
pub const MIN_POLL_INTERVAL_SECS: u64 = 10;
pub const MAX_POLL_INTERVAL_SECS: u64 = 300;

/// How the miniprofile document is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Straight to steamcommunity.com
    #[default]
    Direct,
    /// Through the public codetabs CORS proxy
    Codetabs,
    /// Through the profile proxy served by this process
    LocalProxy,
}

/// Settings as stored on disk. Nothing here is trusted until
/// [`PresenceConfig::from_settings`] has validated it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceSettings {
    #[serde(alias = "appID")]
    pub app_id: String,
    #[serde(alias = "steamId")]
    pub steam_id: String,
    pub poll_interval_secs: u64,
    pub fetch_mode: FetchMode,
    pub proxy_port: u16,
    pub clear_when_idle: bool,
    pub clear_on_stop: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_token: Option<String>,
}

impl Default for PresenceSettings {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            steam_id: String::new(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            fetch_mode: FetchMode::Direct,
            proxy_port: 0,
            clear_when_idle: false,
            clear_on_stop: true,
            asset_token: None,
        }
    }
}

fn is_numeric(value: &str) -> bool {
    value.bytes().all(|b| b.is_ascii_digit())
}

/// Checks the application ID, returning the user-facing message on failure.
pub fn validate_app_id(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("Application ID is required.".to_string());
    }
    if !is_numeric(value) {
        return Err("Application ID must be a number.".to_string());
    }
    Ok(())
}

/// Checks the Steam ID, returning the user-facing message on failure.
pub fn validate_steam_id(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("Steam ID is required.".to_string());
    }
    if !is_numeric(value) {
        return Err("SteamId must be a number.".to_string());
    }
    Ok(())
}

impl PresenceSettings {
    pub fn validate(&self) -> Result<(), String> {
        validate_app_id(&self.app_id)?;
        validate_steam_id(&self.steam_id)?;

        if !(MIN_POLL_INTERVAL_SECS..=MAX_POLL_INTERVAL_SECS).contains(&self.poll_interval_secs) {
            return Err(format!(
                "Poll interval must be between {} and {} seconds.",
                MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS
            ));
        }

        if matches!(self.asset_token.as_deref(), Some(t) if t.trim().is_empty()) {
            return Err("Asset token must not be blank.".to_string());
        }

        Ok(())
    }
}

/// Validated runtime configuration, built once at startup and shared by
/// reference with everything that needs it.
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    pub app_id: String,
    pub steam_id: String,
    pub poll_interval: Duration,
    pub fetch_mode: FetchMode,
    pub proxy_port: u16,
    pub clear_when_idle: bool,
    pub clear_on_stop: bool,
    pub asset_token: Option<String>,
}

impl PresenceConfig {
    pub fn from_settings(settings: &PresenceSettings) -> Result<Self, String> {
        settings.validate()?;

        Ok(Self {
            app_id: settings.app_id.clone(),
            steam_id: settings.steam_id.clone(),
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
            fetch_mode: settings.fetch_mode,
            proxy_port: settings.proxy_port,
            clear_when_idle: settings.clear_when_idle,
            clear_on_stop: settings.clear_on_stop,
            asset_token: settings.asset_token.clone(),
        })
    }

    /// Numeric application ID, as the Discord IPC handshake wants it.
    pub fn app_id_number(&self) -> Result<i64, String> {
        self.app_id
            .parse()
            .map_err(|e| format!("Application ID out of range: {}", e))
    }
}

/// Default location of the settings file.
pub fn get_settings_path() -> Result<PathBuf, String> {
    let config_dir = dirs::config_dir()
        .ok_or("Failed to get config directory")?
        .join(SETTINGS_DIR);

    fs::create_dir_all(&config_dir)
        .map_err(|e| format!("Failed to create config directory: {}", e))?;

    Ok(config_dir.join(SETTINGS_FILE))
}

pub fn load_settings(path: &Path) -> Result<PresenceSettings, String> {
    tracing::debug!("Loading settings from {}", path.display());

    if !path.exists() {
        return Ok(PresenceSettings::default());
    }

    let contents =
        fs::read_to_string(path).map_err(|e| format!("Failed to read settings file: {}", e))?;

    serde_json::from_str(&contents).map_err(|e| format!("Failed to parse settings: {}", e))
}

pub fn save_settings(path: &Path, settings: &PresenceSettings) -> Result<(), String> {
    tracing::debug!("Saving settings to {}", path.display());

    let contents = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {}", e))?;

    fs::write(path, contents).map_err(|e| format!("Failed to write settings file: {}", e))
}
