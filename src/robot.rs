use serde::Serialize;
use tracing::{debug, error};

use crate::arena::{Arena, Obstacle};
use crate::config::{RobotConfig, SensorConfig};
use crate::controls::{ControlType, Controls};
use crate::geometry::{Point, polygon_hits_segment};
use crate::network::Network;
use crate::sensor::Sensor;

/// A rover in the arena. Heading 0 points north (negative y), positive
/// headings turn counter-clockwise.
#[derive(Debug, Clone, Serialize)]
pub struct Robot {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub vel: f64,
    pub width: f64,
    pub height: f64,
    pub max_vel: f64,
    pub accel: f64,
    pub friction: f64,
    pub turn_rate: f64,
    damaged: bool,
    polygon: Vec<Point>,
    controls: Controls,
    sensor: Sensor,
    #[serde(skip)]
    brain: Option<Network>,
}

impl Robot {
    /// `brain: None` makes a manually driven robot.
    pub fn new(start: Point, envelope: &RobotConfig, sensor: &SensorConfig, brain: Option<Network>) -> Self {
        let mut robot = Self {
            x: start.x,
            y: start.y,
            angle: 0.0,
            vel: 0.0,
            width: envelope.width,
            height: envelope.height,
            max_vel: envelope.max_vel,
            accel: envelope.accel,
            friction: envelope.friction,
            turn_rate: envelope.turn_rate,
            damaged: false,
            polygon: Vec::with_capacity(4),
            controls: Controls::default(),
            sensor: Sensor::new(sensor),
            brain,
        };
        robot.polygon = robot.create_polygon();
        robot
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn is_damaged(&self) -> bool {
        self.damaged
    }

    pub fn polygon(&self) -> &[Point] {
        &self.polygon
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    pub fn sensor(&self) -> &Sensor {
        &self.sensor
    }

    pub fn brain(&self) -> Option<&Network> {
        self.brain.as_ref()
    }

    pub fn set_brain(&mut self, brain: Network) {
        self.brain = Some(brain);
    }

    pub fn control_type(&self) -> ControlType {
        if self.brain.is_some() {
            ControlType::Ai
        } else {
            ControlType::Manual
        }
    }

    /// One simulation step.
    ///
    /// Physics runs only while the robot is intact; sensing always runs. For
    /// manual robots `input` drives this tick's motion, AI robots ignore it
    /// and set their controls for the next tick from the sensor readings.
    pub fn update(&mut self, arena: &Arena, obstacles: &[Obstacle], input: Controls) {
        if self.brain.is_none() {
            self.controls = input;
        }

        // a wreck stays where it is but keeps sensing
        if !self.damaged {
            self.move_step();
            self.polygon = self.create_polygon();
            self.damaged = self.assess_damage(arena, obstacles);
            if self.damaged {
                debug!(x = self.x, y = self.y, "robot damaged");
            }
        }

        let origin = self.position();
        self.sensor
            .update(origin, self.angle, arena.borders(), obstacles);

        if let Some(brain) = &self.brain {
            let inputs = self.sensor.closeness();
            let decided = brain
                .evaluate(&inputs)
                .and_then(|outputs| Controls::try_from_outputs(&outputs));
            self.controls = match decided {
                Ok(controls) => controls,
                Err(err) => {
                    error!(%err, "controller evaluation failed");
                    Controls::default()
                }
            };
        }
    }

    fn move_step(&mut self) {
        if self.controls.forward {
            self.vel += self.accel;
        }
        if self.controls.reverse {
            self.vel -= self.accel;
        }

        // cap by magnitude; a negative or NaN envelope must not panic
        let cap = self.max_vel.abs();
        self.vel = self.vel.max(-cap).min(cap);

        // friction opposes motion in either direction
        if self.vel > 0.0 {
            self.vel -= self.friction;
        }
        if self.vel < 0.0 {
            self.vel += self.friction;
        }
        if self.vel.abs() < self.friction {
            self.vel = 0.0;
        }

        // steering wheel semantics: controls flip while reversing
        let sign = if self.vel >= 0.0 { 1.0 } else { -1.0 };
        if self.controls.right {
            self.angle -= self.turn_rate * sign;
        }
        if self.controls.left {
            self.angle += self.turn_rate * sign;
        }

        // heading 0 is north, y grows downward
        self.x -= self.angle.sin() * self.vel;
        self.y -= self.angle.cos() * self.vel;
    }

    /// Oriented rectangle corners: top right, top left, bottom left, bottom right.
    fn create_polygon(&self) -> Vec<Point> {
        let rad = self.width.hypot(self.height) / 2.0;
        let alpha = self.width.atan2(self.height);
        let corner = |theta: f64| {
            Point::new(self.x - rad * theta.sin(), self.y - rad * theta.cos())
        };

        vec![
            corner(self.angle - alpha),
            corner(self.angle + alpha),
            corner(std::f64::consts::PI + self.angle - alpha),
            corner(std::f64::consts::PI + self.angle + alpha),
        ]
    }

    fn assess_damage(&self, arena: &Arena, obstacles: &[Obstacle]) -> bool {
        arena
            .borders()
            .iter()
            .chain(obstacles.iter().flat_map(|o| o.borders().iter()))
            .any(|border| polygon_hits_segment(&self.polygon, border))
    }
}
