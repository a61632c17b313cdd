use anyhow::Result;
use tracing::trace;

use crate::{
    economy::CityOutput,
    engine::{System, SystemContext, TickKind},
    rng::SystemRng,
    world::World,
};

/// Advances every city's job once, in founding order.
pub struct ProductionSystem;

impl ProductionSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProductionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ProductionSystem {
    fn name(&self) -> &str {
        "production"
    }

    fn runs_on(&self, kind: TickKind) -> bool {
        kind == TickKind::Production
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let cities = world.cities().to_vec();
        for city in cities {
            match world.produce_city(city) {
                CityOutput::Idle => {}
                CityOutput::Working {
                    work_done,
                    work_total,
                } => {
                    trace!(?city, work_done, work_total, "city working");
                    world.journal.produced.push(city);
                }
                CityOutput::Completed(completion) => {
                    trace!(?completion, "job completed");
                    world.journal.produced.push(city);
                    world.journal.completed.push(completion);
                }
            }
        }
        Ok(())
    }
}
