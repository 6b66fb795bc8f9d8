use std::f64::consts::PI;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evolution::Fitness;
use crate::geometry::Point;

/// Errors raised while loading or validating configuration and maps.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("could not read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Physical envelope shared by every robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub width: f64,
    pub height: f64,
    pub max_vel: f64,
    pub accel: f64,
    pub friction: f64,
    /// Heading change per tick while steering, radians.
    pub turn_rate: f64,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            width: 12.0,
            height: 20.0,
            max_vel: 3.0,
            accel: 0.2,
            friction: 0.05,
            turn_rate: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub ray_count: usize,
    pub ray_length: f64,
    /// Total angle covered by the fan of rays, radians.
    pub ray_spread: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            ray_count: 7,
            ray_length: 100.0,
            ray_spread: PI,
        }
    }
}

/// Everything a simulation run needs, threaded in at setup time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub arena_width: f64,
    pub arena_height: f64,
    pub start: Point,
    pub target: Point,
    pub population_size: usize,
    pub hidden_size: usize,
    /// Blend factor used when deriving children from the persisted brain.
    pub mutation_variance: f64,
    pub fitness: Fitness,
    /// Logical key of the persisted best brain.
    pub store_key: String,
    pub rng_seed: Option<u64>,
    pub robot: RobotConfig,
    pub sensor: SensorConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            arena_width: 1280.0,
            arena_height: 720.0,
            start: Point::new(50.0, 600.0),
            target: Point::new(1242.0, 27.0),
            population_size: 100,
            hidden_size: 9,
            mutation_variance: 0.1,
            fitness: Fitness::default(),
            store_key: "ai_rover_map1".to_string(),
            rng_seed: None,
            robot: RobotConfig::default(),
            sensor: SensorConfig::default(),
        }
    }
}

impl SimConfig {
    /// Read a JSON config; absent fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            self.arena_width,
            self.arena_height,
            self.start.x,
            self.start.y,
            self.target.x,
            self.target.y,
            self.mutation_variance,
            self.robot.width,
            self.robot.height,
            self.robot.max_vel,
            self.robot.accel,
            self.robot.friction,
            self.robot.turn_rate,
            self.sensor.ray_length,
            self.sensor.ray_spread,
        ];
        if crate::utils::has_non_finite(&finite) {
            return Err(ConfigError::Invalid("all numeric settings must be finite"));
        }
        if self.arena_width <= 0.0 || self.arena_height <= 0.0 {
            return Err(ConfigError::Invalid("arena dimensions must be positive"));
        }
        if self.population_size == 0 {
            return Err(ConfigError::Invalid("population_size must be non-zero"));
        }
        if self.hidden_size == 0 {
            return Err(ConfigError::Invalid("hidden_size must be non-zero"));
        }
        if self.sensor.ray_count == 0 {
            return Err(ConfigError::Invalid("sensor.ray_count must be non-zero"));
        }
        if self.sensor.ray_length <= 0.0 {
            return Err(ConfigError::Invalid("sensor.ray_length must be positive"));
        }
        if self.robot.width <= 0.0 || self.robot.height <= 0.0 {
            return Err(ConfigError::Invalid("robot dimensions must be positive"));
        }
        if self.robot.max_vel <= 0.0 {
            return Err(ConfigError::Invalid("robot.max_vel must be positive"));
        }
        if self.robot.accel < 0.0 || self.robot.friction < 0.0 {
            return Err(ConfigError::Invalid("robot accel and friction must be non-negative"));
        }
        if self.store_key.is_empty() {
            return Err(ConfigError::Invalid("store_key must not be empty"));
        }
        Ok(())
    }
}
