use hexfront::{
    components::BuildingKind,
    spatial::{Biome, TileGrid, EAST, WEST},
    world::{Outcome, Rejection, World},
};

fn forest_world(rows: u32, columns: u32) -> World {
    let mut grid = TileGrid::new(rows, columns);
    for id in grid.ids().collect::<Vec<_>>() {
        grid.tile_mut(id).unwrap().biome = Biome::Forest;
    }
    World::new(grid)
}

#[test]
fn engineer_paves_its_forest_tile_once() {
    let mut world = forest_world(1, 1);
    let red = world.register_player("red", 0);
    let tile = world.grid().id_at(0, 0).unwrap();
    let engineer = world.create_engineer(red);
    assert!(world.add_unit(tile, engineer).is_done());

    let hub = world.request_build_road_hub(engineer, tile);
    assert!(hub.is_done());
    let here = world.tile(tile).unwrap();
    assert!(here.has_building());
    assert!(here.road().is_some());

    let again = world.request_build_road_hub(engineer, tile);
    assert_eq!(again, Outcome::Rejected(Rejection::BuildingPresent));
    assert_eq!(world.player(red).unwrap().buildings().len(), 1);
    assert_eq!(world.player(red).unwrap().upkeep_cost(), 10 + 1);
}

#[test]
fn a_tile_never_holds_two_units() {
    let mut world = forest_world(1, 2);
    let red = world.register_player("red", 0);
    let tile = world.grid().id_at(0, 0).unwrap();
    let first = world.create_engineer(red);
    let second = world.create_engineer(red);

    assert!(world.add_unit(tile, first).is_done());
    assert_eq!(
        world.add_unit(tile, second),
        Outcome::Rejected(Rejection::TileOccupied)
    );
    assert_eq!(world.tile(tile).unwrap().unit(), Some(first));
    assert_eq!(world.unit(second).unwrap().tile(), None);
}

#[test]
fn blocked_raw_move_strands_the_unit() {
    let mut world = forest_world(1, 2);
    let red = world.register_player("red", 0);
    let left = world.grid().id_at(0, 0).unwrap();
    let right = world.grid().id_at(0, 1).unwrap();
    let mover = world.create_engineer(red);
    let blocker = world.create_engineer(red);
    assert!(world.add_unit(left, mover).is_done());
    assert!(world.add_unit(right, blocker).is_done());

    assert!(world.move_unit(mover, right).is_rejected());
    assert_eq!(world.unit(mover).unwrap().tile(), None);
    assert!(!world.tile(left).unwrap().has_unit());
}

#[test]
fn rejected_move_request_keeps_the_unit_in_place() {
    let mut world = forest_world(1, 3);
    let red = world.register_player("red", 0);
    let left = world.grid().id_at(0, 0).unwrap();
    let mid = world.grid().id_at(0, 1).unwrap();
    let right = world.grid().id_at(0, 2).unwrap();
    let mover = world.create_engineer(red);
    let blocker = world.create_engineer(red);
    assert!(world.add_unit(left, mover).is_done());
    assert!(world.add_unit(mid, blocker).is_done());

    assert_eq!(
        world.request_move(mover, mid),
        Outcome::Rejected(Rejection::TileOccupied)
    );
    assert_eq!(
        world.request_move(mover, right),
        Outcome::Rejected(Rejection::NotAdjacent)
    );
    assert_eq!(world.unit(mover).unwrap().tile(), Some(left));

    assert!(world.request_move(blocker, right).is_done());
    assert!(world.request_move(mover, mid).is_done());
    assert_eq!(world.tile(mid).unwrap().unit(), Some(mover));
}

#[test]
fn stale_handles_are_rejected() {
    let mut world = forest_world(1, 2);
    let red = world.register_player("red", 0);
    let tile = world.grid().id_at(0, 0).unwrap();
    let engineer = world.create_engineer(red);
    assert!(world.add_unit(tile, engineer).is_done());

    assert!(world.destroy_unit(engineer));
    assert!(!world.destroy_unit(engineer));
    assert!(world.unit(engineer).is_none());
    assert!(!world.tile(tile).unwrap().has_unit());
    assert_eq!(
        world.request_move(engineer, tile),
        Outcome::Rejected(Rejection::UnknownUnit)
    );

    // The freed slot is reused, but the old handle still resolves to nothing.
    let replacement = world.create_engineer(red);
    assert_ne!(replacement, engineer);
    assert!(world.unit(engineer).is_none());
    assert_eq!(world.player(red).unwrap().units(), &[replacement]);
    assert_eq!(world.player(red).unwrap().upkeep_cost(), 10);
}

#[test]
fn destroying_a_hub_unlinks_its_neighbor() {
    let mut world = forest_world(1, 2);
    let red = world.register_player("red", 0);
    let left = world.grid().id_at(0, 0).unwrap();
    let right = world.grid().id_at(0, 1).unwrap();
    world
        .add_building(red, left, BuildingKind::RoadHub)
        .done()
        .unwrap();
    let hub = world
        .add_building(red, right, BuildingKind::RoadHub)
        .done()
        .unwrap();
    assert!(world.tile(left).unwrap().road().unwrap().is_connected(EAST));
    assert!(world.tile(right).unwrap().road().unwrap().is_connected(WEST));

    assert!(world.destroy_building(hub));
    assert!(world.building(hub).is_none());
    assert!(!world.tile(right).unwrap().has_building());
    assert!(!world.tile(left).unwrap().road().unwrap().is_connected(EAST));
    assert_eq!(world.player(red).unwrap().upkeep_cost(), 1);
}
