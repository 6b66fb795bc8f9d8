use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::geometry::{Point, Segment, polygon_borders};

/// Rectangular world boundary, fixed for the lifetime of a simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arena {
    pub width: f64,
    pub height: f64,
    borders: [Segment; 4],
}

impl Arena {
    pub fn new(width: f64, height: f64) -> Self {
        let top_left = Point::new(0.0, 0.0);
        let top_right = Point::new(width, 0.0);
        let bot_right = Point::new(width, height);
        let bot_left = Point::new(0.0, height);

        Self {
            width,
            height,
            borders: [
                Segment::new(top_left, top_right),
                Segment::new(top_right, bot_right),
                Segment::new(bot_right, bot_left),
                Segment::new(bot_left, top_left),
            ],
        }
    }

    pub fn borders(&self) -> &[Segment] {
        &self.borders
    }
}

/// Closed polygon obstacle. `fill` is only a drawing hint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Obstacle {
    corners: Vec<Point>,
    borders: Vec<Segment>,
    pub fill: bool,
}

impl Obstacle {
    pub fn new(points: Vec<Point>, fill: bool) -> Result<Self, ConfigError> {
        if points.len() < 3 {
            return Err(ConfigError::Invalid("obstacle needs at least 3 points"));
        }
        if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(ConfigError::Invalid("obstacle points must be finite"));
        }
        let borders = polygon_borders(&points);
        Ok(Self {
            corners: points,
            borders,
            fill,
        })
    }

    pub fn corners(&self) -> &[Point] {
        &self.corners
    }

    pub fn borders(&self) -> &[Segment] {
        &self.borders
    }
}

/// On-disk shape of one authored obstacle: `{"points": [{"x":..,"y":..}], "fill": true}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleSpec {
    pub points: Vec<Point>,
    #[serde(default)]
    pub fill: bool,
}

pub fn obstacles_from_specs(specs: Vec<ObstacleSpec>) -> Result<Vec<Obstacle>, ConfigError> {
    specs
        .into_iter()
        .map(|spec| Obstacle::new(spec.points, spec.fill))
        .collect()
}

/// Load an obstacle map (a JSON array of [`ObstacleSpec`]).
pub fn load_map(path: impl AsRef<Path>) -> Result<Vec<Obstacle>, ConfigError> {
    let content = fs::read_to_string(path)?;
    let specs: Vec<ObstacleSpec> = serde_json::from_str(&content)?;
    obstacles_from_specs(specs)
}
