use std::time::Duration;

use hexfront::{
    engine::{Engine, EngineBuilder, TickKind},
    scenario::{Scenario, ScenarioLoader},
    scheduler::{run_realtime, Cadence},
    systems::install_defaults,
    world::World,
};
use tempfile::TempDir;

fn setup() -> (Scenario, Engine, World, TempDir) {
    let scenario = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
        .load("scenarios/lone_city.yaml")
        .expect("scenario should load");
    let temp = tempfile::tempdir().unwrap();
    let world = scenario.build_world().unwrap().world;
    let engine = install_defaults(
        EngineBuilder::new(scenario.engine_settings(temp.path())),
        scenario.score,
    )
    .build();
    (scenario, engine, world, temp)
}

#[tokio::test(start_paused = true)]
async fn stops_after_the_production_limit() {
    let (scenario, mut engine, mut world, _temp) = setup();
    let mut kinds = Vec::new();

    let produced = run_realtime(
        &mut engine,
        &mut world,
        scenario.cadence,
        Some(6),
        std::future::pending(),
        |report| kinds.push(report.kind),
    )
    .await
    .unwrap();

    assert_eq!(produced, 6);
    use TickKind::{Production as P, Upkeep as U};
    assert_eq!(kinds, vec![P, P, U, P, P, U, P, P, U]);
    assert_eq!(engine.production_ticks(), 6);
}

#[tokio::test(start_paused = true)]
async fn shutdown_ends_the_loop() {
    let (scenario, mut engine, mut world, _temp) = setup();

    let produced = run_realtime(
        &mut engine,
        &mut world,
        scenario.cadence,
        None,
        tokio::time::sleep(Duration::from_millis(350)),
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(produced, 3);
    assert_eq!(engine.upkeep_ticks(), 1);
}

#[tokio::test(start_paused = true)]
async fn matches_the_batch_interleaving() {
    let (scenario, mut batch_engine, mut batch_world, _batch_temp) = setup();
    let mut batch = Vec::new();
    batch_engine
        .run_with_hook(&mut batch_world, 20, |report| batch.push((report.kind, report.tick)))
        .unwrap();

    let (_, mut engine, mut world, _temp) = setup();
    let mut realtime = Vec::new();
    run_realtime(
        &mut engine,
        &mut world,
        scenario.cadence,
        Some(20),
        std::future::pending(),
        |report| realtime.push((report.kind, report.tick)),
    )
    .await
    .unwrap();

    assert_eq!(realtime, batch);
    assert_eq!(world.ledger(), batch_world.ledger());
}

#[tokio::test(start_paused = true)]
async fn zero_period_is_an_error() {
    let (scenario, mut engine, mut world, _temp) = setup();
    let cadence = Cadence {
        production_period_ms: 0,
        ..scenario.cadence
    };

    let result = run_realtime(
        &mut engine,
        &mut world,
        cadence,
        Some(3),
        std::future::pending(),
        |_| {},
    )
    .await;

    assert!(result.is_err());
    assert_eq!(engine.production_ticks(), 0);
}

#[tokio::test(start_paused = true)]
async fn zero_limit_runs_nothing() {
    let (scenario, mut engine, mut world, _temp) = setup();

    let produced = run_realtime(
        &mut engine,
        &mut world,
        scenario.cadence,
        Some(0),
        std::future::pending(),
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(produced, 0);
    assert_eq!(engine.production_ticks(), 0);
}
