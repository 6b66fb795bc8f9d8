pub mod arena;
pub mod config;
pub mod controls;
pub mod db;
pub mod evolution;
pub mod geometry;
pub mod log;
pub mod network;
pub mod robot;
pub mod sensor;
pub mod simulation;
pub mod utils;

pub use arena::{Arena, Obstacle};
pub use config::{ConfigError, SimConfig};
pub use controls::{ControlType, Controls};
pub use db::{BrainStore, JsonFileStore, SqliteStore, StoreError};
pub use evolution::{Champion, Fitness, Population};
pub use geometry::{Point, Segment};
pub use network::{Network, NetworkError};
pub use robot::Robot;
pub use sensor::{Reading, Sensor};
pub use simulation::{Simulation, WorldSnapshot};
