use std::time::Duration;

use glam::Vec2;
use tilenav_core::{CellCoord, Command, Direction, Event, Grid, TileType};
use tilenav_system_movement::{Arrival, MotionStatus, Movement};
use tilenav_world::{self as world, query, World};

fn buildable_world(columns: u32, rows: u32, tile_size: Vec2, entry: CellCoord, goal: CellCoord) -> World {
    let tiles = vec![TileType::BuildableFloor; (columns * rows) as usize];
    let grid = Grid::from_tiles(columns, rows, tile_size, tiles).expect("tile count matches");
    World::new(grid, vec![entry], vec![goal]).expect("goal is passable")
}

fn tick(world: &mut World, movement: &mut Movement, dt: Duration, arrivals: &mut Vec<Arrival>) {
    let mut events = Vec::new();
    world::apply(world, Command::Tick { dt }, &mut events);
    movement.handle(&events, query::grid(world), &query::field_view(world), arrivals);
}

fn path_length(grid: &Grid, cells: &[CellCoord]) -> f32 {
    let size = grid.tile_size();
    cells
        .windows(2)
        .map(|pair| {
            let (dx, dy) = Direction::between(pair[0], pair[1])
                .expect("cached paths are adjacent")
                .delta();
            Vec2::new(dx as f32 * size.x, dy as f32 * size.y).length()
        })
        .sum()
}

#[test]
fn agent_travels_the_cached_path_and_arrives_at_goal_centre() {
    let entry = CellCoord::new(0, 0);
    let goal = CellCoord::new(5, 3);

    for dt in [
        Duration::from_millis(16),
        Duration::from_millis(100),
        Duration::from_millis(750),
    ] {
        let mut world = buildable_world(6, 4, Vec2::new(2.0, 3.0), entry, goal);
        let expected = path_length(
            query::grid(&world),
            query::path_cache(&world).path_for(entry).expect("entry is cached"),
        );

        let mut movement = Movement::new();
        let agent = movement
            .spawn(query::grid(&world), &query::field_view(&world), entry, 4.0)
            .expect("entry is passable");

        let mut arrivals = Vec::new();
        for _ in 0..10_000 {
            tick(&mut world, &mut movement, dt, &mut arrivals);
            if !arrivals.is_empty() {
                break;
            }
        }

        assert_eq!(arrivals.len(), 1, "agent never arrived with dt {dt:?}");
        let arrival = arrivals[0];
        assert_eq!(arrival.agent, agent);
        assert_eq!(arrival.cell, goal);
        assert!(
            (arrival.distance - expected).abs() <= expected * 1e-3,
            "dt {dt:?}: travelled {} but path is {expected}",
            arrival.distance
        );
        assert!(movement.is_empty(), "arrived agents should be removed");
    }
}

#[test]
fn agents_reroute_around_structures_placed_mid_walk() {
    let entry = CellCoord::new(0, 2);
    let goal = CellCoord::new(6, 2);
    let mut world = buildable_world(7, 5, Vec2::ONE, entry, goal);
    let mut movement = Movement::new();
    let agent = movement
        .spawn(query::grid(&world), &query::field_view(&world), entry, 1.0)
        .expect("entry is passable");

    let mut arrivals = Vec::new();
    for _ in 0..4 {
        tick(&mut world, &mut movement, Duration::from_millis(250), &mut arrivals);
    }
    assert_eq!(
        movement.agent(agent).map(|motion| motion.cell()),
        Some(CellCoord::new(1, 2))
    );

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceStructure {
            cell: CellCoord::new(3, 2),
        },
        &mut events,
    );
    assert!(
        events
            .iter()
            .any(|event| matches!(event, Event::StructurePlaced { .. })),
        "expected placement to succeed: {events:?}"
    );

    for _ in 0..200 {
        tick(&mut world, &mut movement, Duration::from_millis(250), &mut arrivals);
        if let Some(motion) = movement.agent(agent) {
            assert!(
                query::grid(&world).is_passable(motion.cell()),
                "agent entered blocked cell {}",
                motion.cell()
            );
        }
        if !arrivals.is_empty() {
            break;
        }
    }

    assert_eq!(arrivals.len(), 1, "agent did not reach the goal");
    assert_eq!(arrivals[0].cell, goal);
}

#[test]
fn sealing_the_only_corridor_is_rejected_and_agents_keep_walking() {
    let entry = CellCoord::new(0, 0);
    let goal = CellCoord::new(4, 0);
    let mut world = buildable_world(5, 1, Vec2::ONE, entry, goal);
    let mut movement = Movement::new();

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SetTile {
            cell: CellCoord::new(2, 0),
            tile: TileType::BuildableObstacle,
        },
        &mut events,
    );
    assert!(
        events
            .iter()
            .any(|event| matches!(event, Event::TileChangeRejected { .. })),
        "sealing the only corridor must be rejected: {events:?}"
    );

    let agent = movement
        .spawn(query::grid(&world), &query::field_view(&world), entry, 2.0)
        .expect("entry is passable");
    let mut arrivals = Vec::new();
    tick(&mut world, &mut movement, Duration::from_millis(500), &mut arrivals);
    assert_eq!(
        movement.agent(agent).map(|motion| motion.status()),
        Some(MotionStatus::Moving)
    );

    for _ in 0..20 {
        tick(&mut world, &mut movement, Duration::from_millis(500), &mut arrivals);
    }
    assert_eq!(arrivals.len(), 1);
    assert!((arrivals[0].distance - 4.0).abs() < 1e-4);
}
