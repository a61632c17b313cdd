pub mod arena;
pub mod components;
pub mod economy;
pub mod engine;
pub mod noise;
pub mod rng;
pub mod scenario;
pub mod scheduler;
pub mod snapshot;
pub mod spatial;
pub mod systems;
pub mod world;
pub mod worldgen;

pub use engine::{Engine, EngineBuilder, EngineSettings, TickKind, TickReport};
pub use scenario::{Scenario, ScenarioLoader, ScenarioWorld};
pub use world::{Outcome, Rejection, World};
