use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::game_state::DEFAULT_HEALTH;
use crate::vocabulary::SupportedVocabulary;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub vocabulary: SupportedVocabulary,
    pub starting_health: i32,
    /// Fall time in seconds of the very first wave
    pub initial_obstacle_duration: f64,
    /// Fall time in seconds of the first wave after a restart
    pub restart_obstacle_duration: f64,
    pub min_obstacle_duration: f64,
    pub field_width: f64,
    pub field_height: f64,
    pub tick_rate_ms: u64,
    /// Horizontal distance the ship travels per key press
    pub ship_step: f64,
    /// Start the next game by itself once the game-over delay has passed
    pub auto_restart: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vocabulary: SupportedVocabulary::English,
            starting_health: DEFAULT_HEALTH,
            initial_obstacle_duration: 10.0,
            restart_obstacle_duration: 8.0,
            min_obstacle_duration: 4.5,
            field_width: 390.0,
            field_height: 844.0,
            tick_rate_ms: 33,
            ship_step: 24.0,
            auto_restart: false,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => log::warn!("ignoring unreadable config {}: {e}", self.path.display()),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
