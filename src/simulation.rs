use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{info, warn};

use crate::arena::{Arena, Obstacle};
use crate::config::{ConfigError, SimConfig};
use crate::controls::Controls;
use crate::db::{BrainStore, StoreError};
use crate::evolution::{Champion, Population};
use crate::geometry::{Point, Segment};
use crate::network::Network;
use crate::sensor::Reading;
use crate::utils::seeded_rng;

/// What a frame driver talks to: one `step` per frame, plus the externally
/// triggered save, discard and restart actions.
pub struct Simulation {
    config: SimConfig,
    arena: Arena,
    obstacles: Vec<Obstacle>,
    population: Population,
    rng: StdRng,
    tick: u64,
}

/// Read-only view of one robot for a render surface.
#[derive(Debug, Clone, Serialize)]
pub struct RobotSnapshot {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub damaged: bool,
    pub polygon: Vec<Point>,
    pub rays: Vec<Segment>,
    pub readings: Vec<Option<Reading>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObstacleSnapshot {
    pub corners: Vec<Point>,
    pub fill: bool,
}

/// Read-only view of the whole world after a tick.
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub borders: Vec<Segment>,
    pub obstacles: Vec<ObstacleSnapshot>,
    pub robots: Vec<RobotSnapshot>,
    pub champion: Option<Champion>,
    pub target: Point,
}

impl Simulation {
    /// Fresh random population; nothing is read from storage.
    pub fn new(config: SimConfig, obstacles: Vec<Obstacle>) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = seeded_rng(config.rng_seed);
        let arena = Arena::new(config.arena_width, config.arena_height);
        let population = Population::new_random(&config, &mut rng);

        Ok(Self {
            config,
            arena,
            obstacles,
            population,
            rng,
            tick: 0,
        })
    }

    /// Start-up path: random population, then seeded from `store` when it
    /// holds a usable brain.
    pub fn bootstrap(config: SimConfig, obstacles: Vec<Obstacle>, store: &dyn BrainStore) -> Result<Self, ConfigError> {
        let mut sim = Self::new(config, obstacles)?;
        sim.seed_from_store(store);
        Ok(sim)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn step(&mut self) -> Option<Champion> {
        self.step_with_input(Controls::default())
    }

    /// Like [`Simulation::step`], forwarding `input` to manual robots.
    pub fn step_with_input(&mut self, input: Controls) -> Option<Champion> {
        self.tick += 1;
        self.population
            .tick(&self.arena, &self.obstacles, self.config.target, input)
    }

    pub fn champion_brain(&self) -> Option<&Network> {
        self.population.champion_robot().and_then(|r| r.brain())
    }

    /// Persist the current champion's brain. Returns false before the first tick.
    pub fn save_best(&self, store: &mut dyn BrainStore) -> Result<bool, StoreError> {
        match self.champion_brain() {
            Some(brain) => {
                store.save(brain)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn discard_best(&self, store: &mut dyn BrainStore) -> Result<(), StoreError> {
        store.clear()
    }

    /// Throw the population away and rebuild it from `store`.
    pub fn restart(&mut self, store: &dyn BrainStore) {
        // fresh random brains first, so a missing or bad store still leaves a full population
        self.population = Population::new_random(&self.config, &mut self.rng);
        self.tick = 0;
        self.seed_from_store(store);
    }

    fn seed_from_store(&mut self, store: &dyn BrainStore) -> bool {
        // anything unreadable counts as "nothing saved"
        let best = match store.load() {
            Ok(Some(best)) => best,
            Ok(None) => {
                info!("no persisted brain, starting from random brains");
                return false;
            }
            Err(err) => {
                warn!(%err, "ignoring unreadable persisted brain");
                return false;
            }
        };

        let seeded = self
            .population
            .seed_from_persisted(&best, self.config.mutation_variance, &mut self.rng);
        if !seeded {
            warn!(
                inputs = best.input_size(),
                hidden = best.hidden_size(),
                outputs = best.output_size(),
                "persisted brain does not fit this population, ignoring it"
            );
        }
        seeded
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            borders: self.arena.borders().to_vec(),
            obstacles: self
                .obstacles
                .iter()
                .map(|o| ObstacleSnapshot {
                    corners: o.corners().to_vec(),
                    fill: o.fill,
                })
                .collect(),
            robots: self
                .population
                .robots()
                .iter()
                .map(|r| RobotSnapshot {
                    x: r.x,
                    y: r.y,
                    angle: r.angle,
                    damaged: r.is_damaged(),
                    polygon: r.polygon().to_vec(),
                    rays: r.sensor().rays().to_vec(),
                    readings: r.sensor().readings().to_vec(),
                })
                .collect(),
            champion: self.population.champion(),
            target: self.config.target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use rand::SeedableRng;

    fn config() -> SimConfig {
        SimConfig {
            population_size: 6,
            rng_seed: Some(77),
            ..SimConfig::default()
        }
    }

    #[test]
    fn save_before_first_tick_is_a_no_op() {
        let sim = Simulation::new(config(), Vec::new()).expect("sim");
        let mut store = SqliteStore::in_memory("k").expect("store");
        assert!(!sim.save_best(&mut store).expect("save"));
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn saved_champion_becomes_parent_after_restart() {
        let mut sim = Simulation::new(config(), Vec::new()).expect("sim");
        let mut store = SqliteStore::in_memory("k").expect("store");
        for _ in 0..20 {
            sim.step();
        }
        let champion = sim.champion_brain().cloned().expect("champion brain");
        assert!(sim.save_best(&mut store).expect("save"));

        sim.restart(&store);
        assert_eq!(sim.tick_count(), 0);
        let robots = sim.population().robots();
        assert_eq!(robots[0].brain(), Some(&champion));
        assert_ne!(robots[1].brain(), Some(&champion));

        sim.discard_best(&mut store).expect("discard");
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn incompatible_store_falls_back_to_random() {
        let mut store = SqliteStore::in_memory("k").expect("store");
        let mut rng = StdRng::seed_from_u64(1);
        store.save(&Network::new(3, 9, 4, &mut rng)).expect("save");

        let sim = Simulation::bootstrap(config(), Vec::new(), &store).expect("sim");
        for robot in sim.population().robots() {
            assert!(robot.brain().expect("brain").is_compatible(7, 9, 4));
        }
    }

    #[test]
    fn snapshot_mirrors_world() {
        let obstacle = Obstacle::new(
            vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(5.0, 5.0)],
            true,
        )
        .expect("obstacle");
        let mut sim = Simulation::new(config(), vec![obstacle]).expect("sim");
        sim.step();
        let snap = sim.snapshot();
        assert_eq!(snap.tick, 1);
        assert_eq!(snap.borders.len(), 4);
        assert_eq!(snap.obstacles.len(), 1);
        assert!(snap.obstacles[0].fill);
        assert_eq!(snap.robots.len(), 6);
        assert_eq!(snap.robots[0].readings.len(), 7);
        assert!(snap.champion.is_some());
        let json = serde_json::to_string(&snap).expect("serialize");
        assert!(json.contains("\"champion\""));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let bad = SimConfig {
            hidden_size: 0,
            ..SimConfig::default()
        };
        assert!(Simulation::new(bad, Vec::new()).is_err());
    }
}
