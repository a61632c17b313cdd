use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{
    engine::{System, SystemContext, TickKind},
    rng::SystemRng,
    world::World,
};

/// Folds one tick's currency change into a running score.
pub trait ScoreMetric: Send {
    fn name(&self) -> &'static str;
    fn update(&self, score: i64, before: i64, after: i64) -> i64;
}

/// Score moves with currency, losses included.
pub struct CurrencyMirror;

impl ScoreMetric for CurrencyMirror {
    fn name(&self) -> &'static str {
        "currency_mirror"
    }

    fn update(&self, score: i64, before: i64, after: i64) -> i64 {
        score + (after - before)
    }
}

/// Only income counts; spending never lowers the score.
pub struct CumulativeGains;

impl ScoreMetric for CumulativeGains {
    fn name(&self) -> &'static str {
        "cumulative_gains"
    }

    fn update(&self, score: i64, before: i64, after: i64) -> i64 {
        score + (after - before).max(0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRule {
    CurrencyMirror,
    #[default]
    CumulativeGains,
}

impl ScoreRule {
    pub fn metric(self) -> Box<dyn ScoreMetric> {
        match self {
            ScoreRule::CurrencyMirror => Box::new(CurrencyMirror),
            ScoreRule::CumulativeGains => Box::new(CumulativeGains),
        }
    }
}

/// Settles every player's score at the end of each tick.
pub struct ScoreSystem {
    metric: Box<dyn ScoreMetric>,
}

impl ScoreSystem {
    pub fn new(rule: ScoreRule) -> Self {
        Self::with_metric(rule.metric())
    }

    pub fn with_metric(metric: Box<dyn ScoreMetric>) -> Self {
        Self { metric }
    }
}

impl System for ScoreSystem {
    fn name(&self) -> &str {
        "score"
    }

    fn runs_on(&self, _kind: TickKind) -> bool {
        true
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        for player in world.players.iter_mut() {
            player.score = self
                .metric
                .update(player.score, player.score_mark, player.currency);
            player.score_mark = player.currency;
        }
        Ok(())
    }
}
