use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::arena::{Arena, Obstacle};
use crate::config::SimConfig;
use crate::controls::Controls;
use crate::geometry::Point;
use crate::network::{Network, OUTPUT_COUNT};
use crate::robot::Robot;
use crate::utils::displacement;

/// How a robot's progress is scored each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fitness {
    /// Smallest distance to the target wins.
    #[default]
    ClosestToTarget,
    /// Largest distance from the start wins.
    FarthestFromStart,
}

/// Best robot of the latest tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Champion {
    pub index: usize,
    pub displacement: f64,
}

/// Forward scan over `robots`; on equal scores the earliest robot is kept.
pub fn select_champion(robots: &[Robot], fitness: Fitness, start: Point, target: Point) -> Option<Champion> {
    let mut best: Option<Champion> = None;
    for (index, robot) in robots.iter().enumerate() {
        let candidate = match fitness {
            Fitness::ClosestToTarget => displacement(robot.x, robot.y, target.x, target.y),
            Fitness::FarthestFromStart => displacement(start.x, start.y, robot.x, robot.y),
        };
        let better = match best {
            None => true,
            Some(current) => match fitness {
                Fitness::ClosestToTarget => candidate < current.displacement,
                Fitness::FarthestFromStart => candidate > current.displacement,
            },
        };
        if better {
            best = Some(Champion {
                index,
                displacement: candidate,
            });
        }
    }
    best
}

/// Fixed-size set of robots. Robot 0 is the lineage parent.
#[derive(Debug, Clone)]
pub struct Population {
    robots: Vec<Robot>,
    champion: Option<Champion>,
    fitness: Fitness,
    start: Point,
    ray_count: usize,
    hidden_size: usize,
}

impl Population {
    /// `config.population_size` AI robots with independent random brains.
    pub fn new_random<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Self {
        let ray_count = config.sensor.ray_count;
        let robots = (0..config.population_size)
            .map(|_| {
                let brain = Network::new(ray_count, config.hidden_size, OUTPUT_COUNT, rng);
                Robot::new(config.start, &config.robot, &config.sensor, Some(brain))
            })
            .collect();

        Self::from_robots(robots, config)
    }

    /// Wrap an existing set of robots (manual ones included).
    pub fn from_robots(robots: Vec<Robot>, config: &SimConfig) -> Self {
        Self {
            robots,
            champion: None,
            fitness: config.fitness,
            start: config.start,
            ray_count: config.sensor.ray_count,
            hidden_size: config.hidden_size,
        }
    }

    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    pub fn len(&self) -> usize {
        self.robots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.robots.is_empty()
    }

    pub fn champion(&self) -> Option<Champion> {
        self.champion
    }

    pub fn champion_robot(&self) -> Option<&Robot> {
        self.champion.and_then(|c| self.robots.get(c.index))
    }

    pub fn damaged_count(&self) -> usize {
        self.robots.iter().filter(|r| r.is_damaged()).count()
    }

    /// Whether `brain` is well formed and fits the robots' sensor and hidden
    /// layer sizes.
    pub fn accepts(&self, brain: &Network) -> bool {
        brain.is_compatible(self.ray_count, self.hidden_size, OUTPUT_COUNT)
    }

    /// Update every robot, then pick the champion from scratch.
    ///
    /// `input` only reaches manually driven robots.
    pub fn tick(&mut self, arena: &Arena, obstacles: &[Obstacle], target: Point, input: Controls) -> Option<Champion> {
        // robots never interact, order does not matter
        for robot in &mut self.robots {
            robot.update(arena, obstacles, input);
        }
        self.champion = select_champion(&self.robots, self.fitness, self.start, target);
        if let Some(champion) = self.champion {
            debug!(index = champion.index, displacement = champion.displacement, "champion");
        }
        self.champion
    }

    /// Robot 0 gets `best` as is, every other robot an independently mutated
    /// copy of it. Returns false (and changes nothing) if `best` does not fit.
    pub fn seed_from_persisted<R: Rng + ?Sized>(&mut self, best: &Network, variance: f64, rng: &mut R) -> bool {
        if !self.accepts(best) {
            return false;
        }

        // every child starts from the same baseline, not from its sibling
        for (i, robot) in self.robots.iter_mut().enumerate() {
            let mut brain = best.clone();
            if i > 0 {
                brain.mutate(variance, rng);
            }
            robot.set_brain(brain);
        }
        info!(robots = self.robots.len(), variance, "population seeded from persisted brain");
        true
    }
}
