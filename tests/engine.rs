use hexfront::{
    engine::{Engine, EngineBuilder, TickKind, TickReport},
    scenario::{Scenario, ScenarioLoader},
    snapshot::WorldSnapshot,
    systems::install_defaults,
    world::{PlayerLedger, World},
};
use tempfile::tempdir;

fn scenario_loader() -> ScenarioLoader {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
}

fn load(file: &str) -> Scenario {
    scenario_loader().load(file).expect("scenario should load")
}

fn build(scenario: &Scenario, snapshot_dir: &std::path::Path) -> (Engine, World) {
    let world = scenario.build_world().expect("world builds").world;
    let engine = install_defaults(
        EngineBuilder::new(scenario.engine_settings(snapshot_dir)),
        scenario.score,
    )
    .build();
    (engine, world)
}

#[test]
fn fixture_scenarios_load() {
    let twin = load("scenarios/twin_rivers.yaml");
    assert_eq!(twin.name, "twin_rivers");
    assert_eq!(twin.players.len(), 2);
    assert_eq!(twin.cadence.upkeep_every, 10);

    let built = twin.build_world().unwrap();
    assert_eq!(built.world.cities().len(), 3);
    assert_eq!(built.world.grid().tile_count(), 12 * 16);
}

#[test]
fn missing_scenario_is_an_io_error() {
    let err = scenario_loader().load("scenarios/nope.yaml").unwrap_err();
    assert!(err.to_string().contains("nope.yaml"));
}

#[test]
fn hook_sees_every_tick_in_order() {
    let scenario = load("scenarios/lone_city.yaml");
    let temp = tempdir().unwrap();
    let (mut engine, mut world) = build(&scenario, temp.path());

    let mut seen = Vec::new();
    engine
        .run_with_hook(&mut world, 6, |report| seen.push((report.kind, report.tick)))
        .expect("run succeeds");

    use TickKind::{Production as P, Upkeep as U};
    assert_eq!(
        seen,
        vec![
            (P, 1),
            (P, 2),
            (U, 1),
            (P, 3),
            (P, 4),
            (U, 2),
            (P, 5),
            (P, 6),
            (U, 3)
        ]
    );
    assert_eq!(engine.production_ticks(), 6);
    assert_eq!(engine.upkeep_ticks(), 3);
}

#[test]
fn one_upkeep_per_cadence_window() {
    let scenario = load("scenarios/twin_rivers.yaml");
    let temp = tempdir().unwrap();
    let (mut engine, mut world) = build(&scenario, temp.path());

    engine.run(&mut world, 35).unwrap();
    assert_eq!(engine.production_ticks(), 35);
    assert_eq!(engine.upkeep_ticks(), 3);

    // Resuming picks up the interleaving where it left off.
    engine.run(&mut world, 5).unwrap();
    assert_eq!(engine.upkeep_ticks(), 4);
}

#[test]
fn seeded_runs_are_reproducible() {
    let scenario = load("scenarios/twin_rivers.yaml");
    let run = || -> Vec<PlayerLedger> {
        let temp = tempdir().unwrap();
        let (mut engine, mut world) = build(&scenario, temp.path());
        engine.run(&mut world, 60).unwrap();
        world.ledger()
    };
    assert_eq!(run(), run());
}

#[test]
fn ledger_invariants_hold_every_tick() {
    let scenario = load("scenarios/twin_rivers.yaml");
    let temp = tempdir().unwrap();
    let (mut engine, mut world) = build(&scenario, temp.path());

    let mut reports: Vec<TickReport> = Vec::new();
    engine
        .run_with_hook(&mut world, 80, |report| reports.push(report.clone()))
        .unwrap();

    for report in &reports {
        for entry in &report.ledger {
            assert!(entry.currency >= 0, "{} went negative", entry.name);
            assert!(entry.score >= 0);
        }
        if report.kind == TickKind::Production {
            assert!(report.destroyed_units.is_empty());
            assert!(report.destroyed_buildings.is_empty());
        }
    }
    for (_, tile) in world.grid().tiles() {
        if let Some(unit) = tile.unit() {
            assert!(world.unit(unit).is_some());
        }
    }
}

#[test]
fn snapshots_follow_the_interval() {
    let mut scenario = load("scenarios/lone_city.yaml");
    scenario.snapshot_interval_ticks = 4;
    let temp = tempdir().unwrap();
    let (mut engine, mut world) = build(&scenario, temp.path());

    let mut written = Vec::new();
    engine
        .run_with_hook(&mut world, 9, |report| {
            if let Some(path) = &report.snapshot_path {
                written.push((report.tick, path.clone()));
            }
        })
        .unwrap();

    let ticks: Vec<u64> = written.iter().map(|(tick, _)| *tick).collect();
    assert_eq!(ticks, vec![4, 8]);
    let expected = temp.path().join("lone_city").join("tick_000008.json");
    assert_eq!(written[1].1, expected);

    let snapshot: WorldSnapshot =
        serde_json::from_str(&std::fs::read_to_string(&expected).unwrap()).unwrap();
    assert_eq!(snapshot.scenario, "lone_city");
    assert_eq!(snapshot.tiles.len(), 16);
    assert_eq!(snapshot.players[0].name, "solo");
}
