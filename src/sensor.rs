use serde::Serialize;

use crate::arena::Obstacle;
use crate::config::SensorConfig;
use crate::geometry::{Point, Segment, Touch, intersect};
use crate::utils::lerp;

/// Nearest obstruction along a ray; `offset` 0 is the robot centre, 1 the ray tip.
pub type Reading = Touch;

#[derive(Debug, Clone, Serialize)]
pub struct Sensor {
    pub ray_count: usize,
    pub ray_length: f64,
    pub ray_spread: f64,
    rays: Vec<Segment>,
    readings: Vec<Option<Reading>>,
}

impl Sensor {
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            ray_count: config.ray_count,
            ray_length: config.ray_length,
            ray_spread: config.ray_spread,
            rays: Vec::with_capacity(config.ray_count),
            readings: Vec::with_capacity(config.ray_count),
        }
    }

    pub fn rays(&self) -> &[Segment] {
        &self.rays
    }

    /// One entry per ray, in ray order. `None` means the ray hit nothing.
    pub fn readings(&self) -> &[Option<Reading>] {
        &self.readings
    }

    /// Readings turned into network inputs: `1 - offset`, or 0 with no reading.
    pub fn closeness(&self) -> Vec<f64> {
        self.readings
            .iter()
            .map(|r| match r {
                Some(reading) => 1.0 - reading.offset,
                None => 0.0,
            })
            .collect()
    }

    pub fn update(&mut self, origin: Point, heading: f64, borders: &[Segment], obstacles: &[Obstacle]) {
        self.cast_rays(origin, heading);
        // one reading per ray, misses stay in place as None
        self.readings = self
            .rays
            .iter()
            .map(|ray| get_reading(ray, borders, obstacles))
            .collect();
    }

    /// Ray 0 is the most counter-clockwise, the last one the most clockwise.
    fn cast_rays(&mut self, origin: Point, heading: f64) {
        self.rays.clear();
        for i in 0..self.ray_count {
            let t = if self.ray_count == 1 {
                0.5
            } else {
                i as f64 / (self.ray_count - 1) as f64
            };
            // spread is centred on the heading
            let angle = lerp(self.ray_spread / 2.0, -self.ray_spread / 2.0, t) + heading;
            let end = Point::new(
                origin.x - self.ray_length * angle.sin(),
                origin.y - self.ray_length * angle.cos(),
            );
            self.rays.push(Segment::new(origin, end));
        }
    }
}

/// Closest touch of `ray` against the arena borders and every obstacle border.
///
/// On equal offsets the first touch found wins (borders first, then obstacles
/// in order).
pub fn get_reading(ray: &Segment, borders: &[Segment], obstacles: &[Obstacle]) -> Option<Reading> {
    let candidates = borders
        .iter()
        .chain(obstacles.iter().flat_map(|o| o.borders().iter()));

    let mut nearest: Option<Reading> = None;
    for border in candidates {
        if let Some(touch) = intersect(ray.start, ray.end, border.start, border.end) {
            match nearest {
                Some(best) if best.offset <= touch.offset => {}
                _ => nearest = Some(touch),
            }
        }
    }
    nearest
}
