// Global configuration and constants

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATHS: [&str; 3] = ["config.yaml", "config.yml", "config.json"];

pub const MIN_VIEWPORT: f32 = 1.0;

/// How the nutrient pass walks particle pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairMode {
    /// Every ordered pair (i, j), i != j. Each pair exchanges twice per tick.
    Ordered,
    /// Every unordered pair once.
    Unordered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteMode {
    Cycle,
    Random,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config extension `{0}` (expected yaml, yml or json)")]
    UnsupportedExtension(String),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

// Configuration struct for simulation parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // Surface
    pub width: f32,
    pub height: f32,

    // Population
    pub initial_particle_count: usize,
    pub max_particles: usize,

    // Motion
    pub noise_scale: f32,
    pub time_scale: f32,
    pub pointer_radius: f32,
    pub pointer_force: f32,
    pub depth_effect: bool,

    // Connections
    pub connection_distance: f32,
    pub connection_width: f32,
    pub connection_tone_distance: f32,
    pub connection_tone_chance: f32,

    // Nutrients
    pub nutrient_diffusion: bool,
    pub nutrient_radius: f32,
    pub diffusion_rate: f32,
    pub pair_mode: PairMode,

    // Growth
    pub growth_interval_ms: f64,
    pub growth_depth: u32,
    pub growth_jitter: f32,
    pub growth_spawn_count: usize,
    pub press_spawn_count: usize,
    pub branch_tone_chance: f32,

    // Surface effects
    pub fade_alpha: f32,
    pub moire: bool,
    pub glitch: bool,
    pub glitch_chance: f32,

    // Interaction
    pub palette_mode: PaletteMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            initial_particle_count: 100,
            max_particles: 500,
            noise_scale: 0.005,
            time_scale: 0.01,
            pointer_radius: 100.0,
            pointer_force: 5.0,
            depth_effect: true,
            connection_distance: 120.0,
            connection_width: 0.5,
            connection_tone_distance: 30.0,
            connection_tone_chance: 0.001,
            nutrient_diffusion: true,
            nutrient_radius: 50.0,
            diffusion_rate: 0.001,
            pair_mode: PairMode::Ordered,
            growth_interval_ms: 300.0,
            growth_depth: 5,
            growth_jitter: 20.0,
            growth_spawn_count: 3,
            press_spawn_count: 5,
            branch_tone_chance: 0.2,
            fade_alpha: 0.1,
            moire: true,
            glitch: true,
            glitch_chance: 0.01,
            palette_mode: PaletteMode::Cycle,
        }
    }
}

impl SimulationConfig {
    pub fn connection_distance_sq(&self) -> f32 {
        self.connection_distance * self.connection_distance
    }

    pub fn nutrient_radius_sq(&self) -> f32 {
        self.nutrient_radius * self.nutrient_radius
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let config = match ext.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&text)?,
            "json" => Self::from_json_str(&text)?,
            other => return Err(ConfigError::UnsupportedExtension(other.to_owned())),
        };
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// First readable file from [`DEFAULT_CONFIG_PATHS`], or defaults.
    /// A broken file is reported and skipped rather than aborting startup.
    pub fn from_default_paths() -> Self {
        for candidate in DEFAULT_CONFIG_PATHS {
            if !Path::new(candidate).exists() {
                continue;
            }
            match Self::from_file(candidate) {
                Ok(config) => return config,
                Err(err) => warn!(path = candidate, error = %err, "ignoring config file"),
            }
        }
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width >= MIN_VIEWPORT && self.height >= MIN_VIEWPORT) {
            return Err(ConfigError::Invalid("width and height must be at least 1"));
        }
        if self.max_particles == 0 {
            return Err(ConfigError::Invalid("max_particles must be positive"));
        }
        if !(self.noise_scale > 0.0) {
            return Err(ConfigError::Invalid("noise_scale must be positive"));
        }
        if !(self.pointer_radius > 0.0) {
            return Err(ConfigError::Invalid("pointer_radius must be positive"));
        }
        if !(self.connection_distance > 0.0) {
            return Err(ConfigError::Invalid("connection_distance must be positive"));
        }
        if !(self.nutrient_radius > 0.0) {
            return Err(ConfigError::Invalid("nutrient_radius must be positive"));
        }
        if !(0.0..=0.5).contains(&self.diffusion_rate) {
            return Err(ConfigError::Invalid("diffusion_rate must be within [0, 0.5]"));
        }
        if !(self.growth_interval_ms >= 0.0) {
            return Err(ConfigError::Invalid("growth_interval_ms must not be negative"));
        }
        if self.growth_depth == 0 {
            return Err(ConfigError::Invalid("growth_depth must be positive"));
        }
        if !(0.0..=1.0).contains(&self.fade_alpha) {
            return Err(ConfigError::Invalid("fade_alpha must be within [0, 1]"));
        }
        Ok(())
    }
}
