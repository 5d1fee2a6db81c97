use std::{fs, path::Path};

use serde::Deserialize;
use shared::{domain::BarColor, error::ColorError};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "bossbar.toml";
const ENV_PREFIX: &str = "BOSSBAR__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub speed_ms: u64,
    pub step: i64,
    pub darken_screen: bool,
    pub title: String,
    pub colors: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed_ms: 50,
            step: 5,
            darken_screen: false,
            title: "Boss".into(),
            colors: "red,yellow,green,blue,purple".into(),
        }
    }
}

impl Settings {
    pub fn colors(&self) -> Result<Vec<BarColor>, ColorError> {
        BarColor::parse_list(&self.colors)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    speed_ms: Option<u64>,
    step: Option<i64>,
    darken_screen: Option<bool>,
    title: Option<String>,
    colors: Option<String>,
}

pub fn load_settings(path: &Path) -> Settings {
    load_settings_with(path, |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file at `path` if it exists, then `BOSSBAR__*` variables.
pub fn load_settings_with(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(error) => warn!(
                path = %path.display(),
                %error,
                "config: ignoring unreadable settings file"
            ),
        }
    }

    if let Some(v) = env_value(&env, "SPEED_MS") {
        settings.speed_ms = v;
    }
    if let Some(v) = env_value(&env, "STEP") {
        settings.step = v;
    }
    if let Some(v) = env_value(&env, "DARKEN_SCREEN") {
        settings.darken_screen = v;
    }
    if let Some(v) = env(&format!("{ENV_PREFIX}TITLE")) {
        settings.title = v;
    }
    if let Some(v) = env(&format!("{ENV_PREFIX}COLORS")) {
        settings.colors = v;
    }

    settings
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.speed_ms {
        settings.speed_ms = v;
    }
    if let Some(v) = file_cfg.step {
        settings.step = v;
    }
    if let Some(v) = file_cfg.darken_screen {
        settings.darken_screen = v;
    }
    if let Some(v) = file_cfg.title {
        settings.title = v;
    }
    if let Some(v) = file_cfg.colors {
        settings.colors = v;
    }
}

fn env_value<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<T> {
    let key = format!("{ENV_PREFIX}{name}");
    let raw = env(&key)?;
    match raw.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(%key, value = %raw, "config: ignoring unparsable environment override");
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
