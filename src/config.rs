use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Holes per side of the square grid.
pub const GRID_SIZE: usize = 3;
/// Length of one session in seconds.
pub const SESSION_SECS: u32 = 30;
pub const POINTS_PER_HIT: u32 = 10;
/// Shortest time a mole stays up.
pub const ACTIVE_MS_MIN: u64 = 1000;
/// Longest time a mole stays up.
pub const ACTIVE_MS_MAX: u64 = 3000;
/// Shortest delay between two spawn attempts.
pub const SPAWN_DELAY_MS_MIN: u64 = 800;
/// Longest delay between two spawn attempts.
pub const SPAWN_DELAY_MS_MAX: u64 = 2000;
/// Cadence of the expiry sweep.
pub const SWEEP_INTERVAL_MS: u64 = 100;
/// Cadence of the session countdown.
pub const COUNTDOWN_INTERVAL_MS: u64 = 1000;
/// Theoretical max score reported with every completion record.
pub const MAX_SCORE: u32 = 300;
/// Score that maps to an accuracy estimate of 1.0.
pub const ACCURACY_REFERENCE_SCORE: u32 = 200;
/// Seconds left at which the HUD starts urging the player.
pub const HURRY_THRESHOLD_SECS: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub grid_size: usize,
    pub session_secs: u32,
    pub points_per_hit: u32,
    pub active_ms_min: u64,
    pub active_ms_max: u64,
    pub spawn_delay_ms_min: u64,
    pub spawn_delay_ms_max: u64,
    pub sweep_interval_ms: u64,
    pub max_score: u32,
    pub accuracy_reference_score: u32,
    pub hurry_threshold_secs: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            session_secs: SESSION_SECS,
            points_per_hit: POINTS_PER_HIT,
            active_ms_min: ACTIVE_MS_MIN,
            active_ms_max: ACTIVE_MS_MAX,
            spawn_delay_ms_min: SPAWN_DELAY_MS_MIN,
            spawn_delay_ms_max: SPAWN_DELAY_MS_MAX,
            sweep_interval_ms: SWEEP_INTERVAL_MS,
            max_score: MAX_SCORE,
            accuracy_reference_score: ACCURACY_REFERENCE_SCORE,
            hurry_threshold_secs: HURRY_THRESHOLD_SECS,
        }
    }
}

impl Settings {
    pub fn slot_count(&self) -> usize {
        self.grid_size * self.grid_size
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: &str) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            }
        }

        if self.grid_size == 0 {
            return Err(invalid("grid_size", "must be at least 1"));
        }
        if self.session_secs == 0 {
            return Err(invalid("session_secs", "must be at least 1"));
        }
        if self.sweep_interval_ms == 0 {
            return Err(invalid("sweep_interval_ms", "must be at least 1"));
        }
        if self.active_ms_min > self.active_ms_max {
            return Err(invalid("active_ms_min", "exceeds active_ms_max"));
        }
        if self.spawn_delay_ms_min > self.spawn_delay_ms_max {
            return Err(invalid("spawn_delay_ms_min", "exceeds spawn_delay_ms_max"));
        }
        if self.spawn_delay_ms_max == 0 {
            return Err(invalid("spawn_delay_ms_max", "must be at least 1"));
        }
        Ok(())
    }
}

pub trait ConfigStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "whackamole") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("whackamole_config.json")
        };
        Self { path }
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
    fn load(&self) -> Settings {
        let Ok(bytes) = fs::read(&self.path) else {
            return Settings::default();
        };
        match serde_json::from_slice::<Settings>(&bytes) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "ignoring unreadable config");
                Settings::default()
            }
        }
    }

    fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
