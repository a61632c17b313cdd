//! Tick cadence: which tick runs next, in batch or against the wall clock.

use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::engine::{Engine, TickKind, TickReport};
use crate::world::World;

const TICK_QUEUE_DEPTH: usize = 64;

fn default_production_period_ms() -> u64 {
    250
}

fn default_upkeep_every() -> u64 {
    10
}

/// Production period plus how many production periods make one upkeep period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cadence {
    #[serde(default = "default_production_period_ms")]
    pub production_period_ms: u64,
    #[serde(default = "default_upkeep_every")]
    pub upkeep_every: u64,
}

impl Cadence {
    pub fn production_period(&self) -> Duration {
        Duration::from_millis(self.production_period_ms)
    }

    /// `None` when the multiple overflows a `Duration`.
    pub fn upkeep_period(&self) -> Option<Duration> {
        let every = u32::try_from(self.upkeep_every).ok()?;
        self.production_period().checked_mul(every)
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            production_period_ms: default_production_period_ms(),
            upkeep_every: default_upkeep_every(),
        }
    }
}

/// Counts ticks and decides the batch-mode interleaving: an upkeep tick is
/// due right after every `upkeep_every`-th production tick.
#[derive(Debug, Clone)]
pub struct TickClock {
    upkeep_every: u64,
    production: u64,
    upkeep: u64,
}

impl TickClock {
    pub fn new(upkeep_every: u64) -> Self {
        assert!(upkeep_every > 0, "upkeep must come every N >= 1 production ticks");
        Self {
            upkeep_every,
            production: 0,
            upkeep: 0,
        }
    }

    pub fn next_due(&self) -> TickKind {
        if self.upkeep < self.production / self.upkeep_every {
            TickKind::Upkeep
        } else {
            TickKind::Production
        }
    }

    /// Counts a tick that is about to run and returns its ordinal.
    pub fn record(&mut self, kind: TickKind) -> u64 {
        match kind {
            TickKind::Production => {
                self.production += 1;
                self.production
            }
            TickKind::Upkeep => {
                self.upkeep += 1;
                self.upkeep
            }
        }
    }

    pub fn production_ticks(&self) -> u64 {
        self.production
    }

    pub fn upkeep_ticks(&self) -> u64 {
        self.upkeep
    }
}

/// Drives the engine from the wall clock.
///
/// One timer posts a beat every production period into a channel; this task
/// is the sole consumer. Each beat runs a production tick followed by any
/// upkeep tick the clock then has due, so the order matches batch mode.
/// Stops after `limit` production ticks or when `shutdown` resolves.
/// Returns the number of production ticks run.
pub async fn run_realtime<F, S>(
    engine: &mut Engine,
    world: &mut World,
    cadence: Cadence,
    limit: Option<u64>,
    shutdown: S,
    mut hook: F,
) -> Result<u64>
where
    F: FnMut(&TickReport),
    S: Future<Output = ()>,
{
    if limit == Some(0) {
        return Ok(0);
    }
    let period = cadence.production_period();
    if period.is_zero() {
        bail!("production period must be positive");
    }
    let (tx, mut rx) = mpsc::channel(TICK_QUEUE_DEPTH);
    let pump = tokio::spawn(pump(tx, period));
    info!(
        period_ms = cadence.production_period_ms,
        upkeep_every = cadence.upkeep_every,
        "real-time loop started"
    );

    tokio::pin!(shutdown);
    let mut produced = 0;
    let result = loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested");
                break Ok(produced);
            }
            beat = rx.recv() => {
                if beat.is_none() {
                    break Ok(produced);
                }
                if let Err(err) = beat_once(engine, world, &mut hook) {
                    break Err(err);
                }
                produced += 1;
                if limit.is_some_and(|limit| produced >= limit) {
                    break Ok(produced);
                }
            }
        }
    };
    pump.abort();
    match pump.await {
        Err(err) if err.is_panic() => Err(anyhow!("tick timer panicked: {err}")),
        _ => result,
    }
}

fn beat_once<F>(engine: &mut Engine, world: &mut World, hook: &mut F) -> Result<()>
where
    F: FnMut(&TickReport),
{
    let report = engine.dispatch(TickKind::Production, world)?;
    hook(&report);
    while engine.next_due() == TickKind::Upkeep {
        let report = engine.dispatch(TickKind::Upkeep, world)?;
        hook(&report);
    }
    Ok(())
}

async fn pump(tx: mpsc::Sender<()>, period: Duration) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        if tx.send(()).await.is_err() {
            debug!("tick consumer gone");
            break;
        }
    }
}
