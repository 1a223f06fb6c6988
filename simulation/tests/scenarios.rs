use std::time::Duration;

use glam::{Vec2, Vec3};
use pirate_defence_core::{
    Command, CursorMove, Event, GridTile, PlacementError, RemovalCause, SelectionHighlight,
    Transform, UnitPose, BASE_UNIT_LIFE, TOWER_RANGE, UNIT_HEIGHT, WAVE_SLOT_SPACING,
};
use pirate_defence_simulation::{Simulation, SimulationConfig};
use pirate_defence_world::{self as world, query, World};

const FRAME: Duration = Duration::from_millis(100);

#[test]
fn fresh_wave_is_hidden_until_each_slot_elapses() {
    let mut simulation = Simulation::default();
    simulation.add_pirate_wave(0);

    let view = query::unit_view(simulation.world());
    assert_eq!(view.len(), 5);
    assert!(view.iter().all(|unit| unit.life == BASE_UNIT_LIFE));
    assert!(view.iter().all(|unit| !unit.visible));

    let mut offsets: Vec<Duration> = view.iter().map(|unit| unit.spawn_at).collect();
    offsets.sort_unstable();
    let expected: Vec<Duration> = (0..5).map(|slot| WAVE_SLOT_SPACING * slot).collect();
    assert_eq!(offsets, expected);
    assert!(simulation.is_board_empty());

    simulation.update(FRAME);
    assert_eq!(visible_count(&simulation), 1);
    assert!(!simulation.is_board_empty());

    simulation.update(Duration::from_millis(900));
    assert_eq!(visible_count(&simulation), 3);
}

#[test]
fn placing_twice_on_the_same_tile_is_rejected() {
    let mut simulation = Simulation::default();
    select(&mut simulation, GridTile::new(0, 4));

    assert!(simulation.place_tower().is_ok());
    assert_eq!(query::available_towers(simulation.world()), 2);
    assert_eq!(
        query::highlight(simulation.world()),
        SelectionHighlight::Valid
    );

    assert_eq!(simulation.place_tower(), Err(PlacementError::Occupied));
    assert_eq!(
        query::highlight(simulation.world()),
        SelectionHighlight::Blocked
    );
    assert_eq!(query::available_towers(simulation.world()), 2);
    assert_eq!(query::tower_count(simulation.world()), 1);
}

#[test]
fn placement_on_the_road_or_off_the_eligible_set_is_rejected() {
    let mut simulation = Simulation::default();
    assert_eq!(simulation.place_tower(), Err(PlacementError::NotEligible));

    select(&mut simulation, GridTile::new(9, 9));
    assert_eq!(simulation.place_tower(), Err(PlacementError::NotEligible));
    assert_eq!(query::available_towers(simulation.world()), 3);

    simulation.move_selection(CursorMove::Forward);
    assert_eq!(
        query::highlight(simulation.world()),
        SelectionHighlight::Select
    );
    assert_eq!(query::selection(simulation.world()), GridTile::new(9, 9));
}

#[test]
fn ready_tower_locks_onto_a_pirate_in_range() {
    let mut simulation = Simulation::default();
    select(&mut simulation, GridTile::new(1, 0));
    let tower = simulation.place_tower().expect("eligible tile");
    simulation.add_pirate_wave(0);

    simulation.update(FRAME);

    let towers = query::tower_view(simulation.world()).into_vec();
    let snapshot = towers
        .iter()
        .find(|snapshot| snapshot.id == tower)
        .expect("tower stands");
    let target = snapshot.target().expect("tower locked on");
    let unit = query::unit_view(simulation.world())
        .get(target)
        .and_then(|unit| unit.position())
        .expect("target is posed");
    let planar = Vec2::new(unit.x, unit.z).distance(snapshot.tile.center());
    assert!(planar <= TOWER_RANGE, "distance {planar}");
    assert!(snapshot.last_shot().is_some());

    simulation.update(FRAME);
    let still_busy = query::tower_view(simulation.world())
        .iter()
        .any(|snapshot| snapshot.id == tower && !snapshot.is_ready());
    assert!(still_busy);
    assert!(simulation
        .drain_events()
        .contains(&Event::ProjectileFired { tower, target }));
}

#[test]
fn losing_a_target_mid_flight_readies_the_tower() {
    let mut world = World::new();
    let mut events = Vec::new();
    for tile in [GridTile::new(1, 0), GridTile::new(1, 1)] {
        world::apply(&mut world, Command::PlaceTower { tile }, &mut events);
    }
    world::apply(
        &mut world,
        Command::SpawnWave {
            slots: [0, 1, 2, 3, 4],
            bonus_life: 1 - BASE_UNIT_LIFE,
        },
        &mut events,
    );
    let towers: Vec<_> = query::tower_view(&world)
        .iter()
        .map(|tower| tower.id)
        .collect();
    let unit = query::unit_view(&world)
        .iter()
        .map(|unit| unit.id)
        .next()
        .expect("wave spawned");

    world::apply(
        &mut world,
        Command::PoseUnit {
            unit,
            pose: UnitPose {
                segment: 0,
                position: Vec3::new(2.0, UNIT_HEIGHT, 2.0),
                limbs: [Transform::IDENTITY; 4],
            },
        },
        &mut events,
    );
    for tower in &towers {
        world::apply(
            &mut world,
            Command::FireProjectile {
                tower: *tower,
                target: unit,
            },
            &mut events,
        );
    }

    events.clear();
    world::apply(
        &mut world,
        Command::ResolveImpact { tower: towers[0] },
        &mut events,
    );
    world::apply(&mut world, Command::RemoveMarkedUnits, &mut events);
    world::apply(
        &mut world,
        Command::ResolveImpact { tower: towers[1] },
        &mut events,
    );

    assert_eq!(
        events,
        vec![
            Event::UnitHit {
                tower: towers[0],
                unit,
                remaining_life: 0,
            },
            Event::TargetLost {
                tower: towers[1],
                unit,
            },
            Event::UnitRemoved {
                unit,
                cause: RemovalCause::Slain,
            },
        ]
    );
    assert!(query::tower_view(&world)
        .iter()
        .all(|tower| tower.is_ready() && tower.target().is_none()));
    assert_eq!(query::unit_view(&world).len(), 4);
}

#[test]
fn looting_every_chest_ends_the_game() {
    let mut simulation = Simulation::default();
    for _ in 0..6 {
        simulation.add_pirate_wave(0);
    }

    let mut events = Vec::new();
    for _ in 0..400 {
        simulation.update(FRAME);
        events.extend(simulation.drain_events());
        if simulation.game_over() {
            break;
        }
    }

    assert!(simulation.game_over());
    assert!(query::treasure_view(simulation.world()).is_empty());
    let destroyed = events
        .iter()
        .filter(|event| matches!(event, Event::TreasureDestroyed { .. }))
        .count();
    let arrived = events
        .iter()
        .filter(|event| {
            matches!(
                event,
                Event::UnitRemoved {
                    cause: RemovalCause::Arrived,
                    ..
                }
            )
        })
        .count();
    assert_eq!(destroyed, 3);
    assert_eq!(arrived, 30);
    assert_eq!(
        events
            .iter()
            .filter(|event| **event == Event::GameOver)
            .count(),
        1
    );
    assert!(query::unit_view(simulation.world()).is_empty());
}

#[test]
fn replaced_tower_starts_fresh() {
    let mut simulation = Simulation::new(SimulationConfig::default());
    let tile = GridTile::new(1, 0);
    select(&mut simulation, tile);
    let first = simulation.place_tower().expect("eligible tile");
    simulation.add_pirate_wave(0);
    simulation.update(FRAME);
    assert!(query::tower_view(simulation.world())
        .iter()
        .any(|tower| tower.id == first && !tower.is_ready()));

    simulation.add_removal();
    assert_eq!(simulation.remove_tower(), Ok(first));
    assert_eq!(query::tower_count(simulation.world()), 0);
    assert_eq!(query::available_towers(simulation.world()), 3);

    let second = simulation.place_tower().expect("tile is free again");
    assert_ne!(second, first);
    let towers = query::tower_view(simulation.world()).into_vec();
    assert_eq!(towers.len(), 1);
    assert_eq!(towers[0].tile, tile);
    assert!(towers[0].is_ready());
    assert!(towers[0].target().is_none());
    assert!(towers[0].last_shot().is_none());
}

fn select(simulation: &mut Simulation, tile: GridTile) {
    loop {
        let current = query::selection(simulation.world());
        let step = if current.column() < tile.column() {
            CursorMove::Left
        } else if current.column() > tile.column() {
            CursorMove::Right
        } else if current.row() < tile.row() {
            CursorMove::Forward
        } else if current.row() > tile.row() {
            CursorMove::Backward
        } else {
            return;
        };
        simulation.move_selection(step);
    }
}

fn visible_count(simulation: &Simulation) -> usize {
    query::unit_view(simulation.world())
        .iter()
        .filter(|unit| unit.visible)
        .count()
}
