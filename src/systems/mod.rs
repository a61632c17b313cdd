mod agent;
mod production;
mod score;
mod upkeep;

pub use agent::AgentSystem;
pub use production::ProductionSystem;
pub use score::{CumulativeGains, CurrencyMirror, ScoreMetric, ScoreRule, ScoreSystem};
pub use upkeep::UpkeepSystem;

use crate::engine::EngineBuilder;

/// Registers the standard systems in tick order: cities produce, agents
/// react, upkeep is charged, then scores settle.
pub fn install_defaults(builder: EngineBuilder, score: ScoreRule) -> EngineBuilder {
    builder
        .with_system(ProductionSystem::new())
        .with_system(AgentSystem::new())
        .with_system(UpkeepSystem::new())
        .with_system(ScoreSystem::new(score))
}
