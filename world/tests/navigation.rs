use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tilenav_core::{
    CellCoord, Command, CornerCutting, Direction, Event, Grid, NavigationError, TileType,
    DIAGONAL_STEP_COST,
};
use tilenav_system_pathfinder::{astar, is_reachable, Heuristic};
use tilenav_world::{self as world, query, DirectionField, World};

const SEEDS: [u64; 5] = [1, 7, 0xdead_beef, 0x0042_f0e1, 0x5151_5151];

fn open_grid(columns: u32, rows: u32) -> Grid {
    Grid::new(columns, rows, Vec2::ONE)
}

fn random_grid(seed: u64, corner_cutting: CornerCutting) -> (Grid, Vec<CellCoord>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let columns = rng.gen_range(4..14);
    let rows = rng.gen_range(4..14);
    let mut grid = Grid::new(columns, rows, Vec2::ONE).with_corner_cutting(corner_cutting);
    for row in 0..rows {
        for column in 0..columns {
            if rng.gen_bool(0.28) {
                let _ = grid.set(CellCoord::new(column, row), TileType::Obstacle);
            }
        }
    }

    let goal_count = rng.gen_range(1..4);
    let mut goals = Vec::new();
    while goals.len() < goal_count {
        let cell = CellCoord::new(rng.gen_range(0..columns), rng.gen_range(0..rows));
        let _ = grid.set(cell, TileType::Floor);
        goals.push(cell);
    }
    (grid, goals)
}

fn cells(grid: &Grid) -> impl Iterator<Item = CellCoord> + '_ {
    (0..grid.cell_count()).filter_map(|index| grid.cell_at(index))
}

#[test]
fn open_grid_points_diagonally_at_single_goal() {
    let grid = open_grid(5, 5);
    let mut field = DirectionField::new();
    field
        .build(&grid, &[CellCoord::new(4, 4)])
        .expect("goal is valid");

    let origin = CellCoord::new(0, 0);
    assert_eq!(field.direction_of(origin), Some(Direction::SouthEast));
    assert!((field.cost_of(origin) - 4.0 * DIAGONAL_STEP_COST).abs() < 1e-5);
    assert_eq!(
        field.path_of(origin, grid.cell_count()),
        Some(vec![
            CellCoord::new(0, 0),
            CellCoord::new(1, 1),
            CellCoord::new(2, 2),
            CellCoord::new(3, 3),
            CellCoord::new(4, 4),
        ])
    );
}

#[test]
fn rebuilt_field_routes_around_new_obstacle() {
    let mut grid = open_grid(5, 5);
    let mut field = DirectionField::new();
    field
        .build(&grid, &[CellCoord::new(4, 4)])
        .expect("goal is valid");

    let blocked = CellCoord::new(2, 2);
    let _ = grid.set(blocked, TileType::Obstacle);
    field.update(&grid, blocked).expect("goal still valid");

    let path = field
        .path_of(CellCoord::new(0, 0), grid.cell_count())
        .expect("origin is passable");
    assert!(!path.contains(&blocked), "path {path:?} crosses obstacle");
    assert_eq!(path.last(), Some(&CellCoord::new(4, 4)));
}

#[test]
fn field_invariants_hold_on_random_grids() {
    for seed in SEEDS {
        for corner_cutting in [CornerCutting::Forbid, CornerCutting::Allow] {
            let (grid, goals) = random_grid(seed, corner_cutting);
            let mut field = DirectionField::new();
            field.build(&grid, &goals).expect("goals are floor");

            for cell in cells(&grid) {
                let cost = field.cost_of(cell);
                match field.direction_of(cell) {
                    None => assert!(
                        goals.contains(&cell) || cost.is_infinite(),
                        "seed {seed}: {cell} has no direction but cost {cost}"
                    ),
                    Some(direction) => {
                        assert!(grid.is_passable(cell));
                        let next = grid
                            .can_step(cell, direction)
                            .expect("direction is a legal step");
                        assert!(
                            field.cost_of(next) < cost,
                            "seed {seed}: {cell} -> {next} does not descend"
                        );
                    }
                }
                if goals.contains(&cell) {
                    assert_eq!(cost, 0.0);
                    assert_eq!(field.direction_of(cell), None);
                }
            }
        }
    }
}

#[test]
fn walks_terminate_with_non_increasing_cost() {
    for seed in SEEDS {
        let (grid, goals) = random_grid(seed, CornerCutting::Forbid);
        let mut field = DirectionField::new();
        field.build(&grid, &goals).expect("goals are floor");

        for start in cells(&grid) {
            let Some(path) = field.path_of(start, grid.cell_count()) else {
                assert!(!grid.is_passable(start));
                continue;
            };

            let terminal = *path.last().expect("path holds start");
            assert_eq!(field.direction_of(terminal), None);
            assert!(path.len() <= grid.cell_count());
            for pair in path.windows(2) {
                assert!(field.cost_of(pair[1]) <= field.cost_of(pair[0]));
            }
        }
    }
}

#[test]
fn field_costs_match_astar_and_reachability() {
    for seed in SEEDS {
        for corner_cutting in [CornerCutting::Forbid, CornerCutting::Allow] {
            let (grid, goals) = random_grid(seed, corner_cutting);
            let mut field = DirectionField::new();
            field.build(&grid, &goals).expect("goals are floor");

            for cell in cells(&grid).filter(|cell| grid.is_passable(*cell)) {
                let cost = field.cost_of(cell);
                let reachable = is_reachable(&grid, cell, &goals);
                assert_eq!(cost.is_finite(), reachable, "seed {seed}: {cell}");

                let route = astar(&grid, cell, &goals, Heuristic::Octile);
                assert_eq!(route.is_some(), reachable);
                if let Some(route) = route {
                    let route_cost: f32 = route
                        .windows(2)
                        .map(|pair| {
                            Direction::between(pair[0], pair[1])
                                .expect("adjacent")
                                .step_cost()
                        })
                        .sum();
                    assert!(
                        (route_cost - cost).abs() < 1e-3,
                        "seed {seed}: {cell} field {cost} astar {route_cost}"
                    );
                }
            }
        }
    }
}

#[test]
fn rebuilding_with_same_goals_is_idempotent() {
    for seed in SEEDS {
        let (grid, goals) = random_grid(seed, CornerCutting::Forbid);
        let mut first = DirectionField::new();
        first.build(&grid, &goals).expect("goals are floor");
        let mut second = first.clone();
        second
            .update(&grid, CellCoord::new(0, 0))
            .expect("goals are floor");

        assert_eq!(first.view().directions(), second.view().directions());
        assert_eq!(first.view().costs(), second.view().costs());
    }
}

#[test]
fn goals_outside_or_blocked_are_an_invalid_goal_set() {
    let mut grid = open_grid(4, 4);
    let blocked = CellCoord::new(1, 1);
    let _ = grid.set(blocked, TileType::BuildableObstacle);

    let error = World::new(
        grid,
        vec![CellCoord::new(0, 0)],
        vec![blocked, CellCoord::new(4, 0)],
    )
    .expect_err("no usable goal");

    assert_eq!(error, NavigationError::InvalidGoalSet { supplied: 2 });
}

fn assert_cache_follows_grid(world: &World, context: &str) {
    let grid = query::grid(world);
    let field = query::field_view(world);
    for path in query::path_cache(world).iter() {
        let cells = path.cells();
        assert_eq!(cells.first(), Some(&path.entry()), "{context}");
        let terminal = *cells.last().expect("entries stay passable");
        assert!(field.is_goal(terminal), "{context}: {cells:?} ends off goal");
        for step in cells.windows(2) {
            let direction = Direction::between(step[0], step[1]).expect("adjacent");
            assert_eq!(
                grid.can_step(step[0], direction),
                Some(step[1]),
                "{context}: cached step {} -> {} is no longer legal",
                step[0],
                step[1]
            );
        }
    }
}

#[test]
fn structure_beside_a_diagonal_step_refreshes_the_cached_path() {
    let tiles = vec![TileType::BuildableFloor; 9];
    let grid = Grid::from_tiles(3, 3, Vec2::ONE, tiles).expect("tile count matches");
    let entry = CellCoord::new(0, 0);
    let goal = CellCoord::new(2, 2);
    let mut world = World::new(grid, vec![entry], vec![goal]).expect("goal is passable");
    assert_eq!(
        query::path_cache(&world).path_for(entry),
        Some(&[entry, CellCoord::new(1, 1), goal][..])
    );

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceStructure {
            cell: CellCoord::new(1, 0),
        },
        &mut events,
    );

    assert!(events.iter().any(|event| matches!(
        event,
        Event::NavigationRebuilt { refreshed_entries, .. } if refreshed_entries == &vec![entry]
    )));
    let cached = query::path_cache(&world).path_for(entry).expect("cached");
    let live = query::field_view(&world).path_of(entry, query::grid(&world).cell_count());
    assert_eq!(Some(cached.to_vec()), live);
    assert_cache_follows_grid(&world, "after side placement");
}

#[test]
fn cached_paths_stay_legal_through_random_placements_and_removals() {
    for seed in SEEDS {
        for corner_cutting in [CornerCutting::Forbid, CornerCutting::Allow] {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let columns = rng.gen_range(5..12);
            let rows = rng.gen_range(5..12);
            let tiles = vec![TileType::BuildableFloor; (columns * rows) as usize];
            let grid = Grid::from_tiles(columns, rows, Vec2::ONE, tiles)
                .expect("tile count matches")
                .with_corner_cutting(corner_cutting);
            let entries = vec![CellCoord::new(0, 0), CellCoord::new(0, rows - 1)];
            let goals = vec![CellCoord::new(columns - 1, rows / 2)];
            let mut world = World::new(grid, entries, goals).expect("goal is passable");

            let mut events = Vec::new();
            for step in 0..80 {
                let structures = query::structures(&world);
                let command = if !structures.is_empty() && rng.gen_bool(0.3) {
                    let pick = structures[rng.gen_range(0..structures.len())];
                    Command::RemoveStructure {
                        structure: pick.id,
                    }
                } else {
                    Command::PlaceStructure {
                        cell: CellCoord::new(rng.gen_range(0..columns), rng.gen_range(0..rows)),
                    }
                };

                events.clear();
                world::apply(&mut world, command, &mut events);
                assert_cache_follows_grid(
                    &world,
                    &format!("seed {seed} {corner_cutting:?} step {step}"),
                );
            }
        }
    }
}
