use clap::ValueEnum;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use crate::layer::DEFAULT_WORKERS;

pub const CURRENT_VERSION: u32 = 2;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "textlayer";

/// Log verbosity written to the settings file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => Self::Off,
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_scale")]
    pub scale: f32,

    /// Requested display rotation; unset means the page's own rotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<i32>,

    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_scale() -> f32 {
    1.0
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            scale: default_scale(),
            rotate: None,
            workers: default_workers(),
            log_level: LogLevel::default(),
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from the config directory, writing defaults when absent
pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };

    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

pub fn load_settings_from_path(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }

                set_settings(settings);
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    // v1 allowed a zero worker count, which stalls every extraction
    if settings.version < 2 && settings.workers == 0 {
        settings.workers = default_workers();
    }

    settings.version = CURRENT_VERSION;
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    match serde_yaml::to_string(settings) {
        Ok(content) => match fs::write(path, content) {
            Ok(()) => debug!("Saved settings to {path:?}"),
            Err(e) => error!("Failed to save settings to {path:?}: {e}"),
        },
        Err(e) => error!("Failed to serialize settings: {e}"),
    }
}

pub fn get_settings() -> Settings {
    SETTINGS
        .read()
        .map(|settings| settings.clone())
        .unwrap_or_default()
}

pub fn set_settings(settings: Settings) {
    if let Ok(mut global) = SETTINGS.write() {
        *global = settings;
    }
}
