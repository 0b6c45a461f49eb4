#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that loads tilenav maps and drives the navigation systems.

mod render;
mod simulate;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tilenav_core::{CellCoord, Direction};
use tilenav_system_bootstrap::Bootstrap;
use tilenav_system_pathfinder::{astar_to, Heuristic};
use tilenav_world::{query, World};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::simulate::SimulationSettings;

#[derive(Debug, Parser)]
#[command(name = "tilenav", about = "Grid flow-field navigation toolkit")]
struct Cli {
    /// Path to the TOML map description.
    #[arg(long, short, default_value = "maps/demo.toml")]
    map: PathBuf,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Prints the direction field and the cached entry paths.
    Inspect {
        /// Prints per-cell costs instead of arrows.
        #[arg(long)]
        costs: bool,
    },
    /// Computes an A* route between two cells, written as `column,row`.
    Route {
        #[arg(value_parser = parse_cell)]
        from: CellCoord,
        #[arg(value_parser = parse_cell)]
        to: CellCoord,
        #[arg(long, value_enum, default_value_t = HeuristicArg::Octile)]
        heuristic: HeuristicArg,
    },
    /// Spawns agents at every entry and advances them until they arrive.
    Simulate {
        /// Number of fixed-length ticks to run.
        #[arg(long, default_value_t = 600)]
        ticks: u32,
        /// Tick length in milliseconds.
        #[arg(long, default_value_t = 16)]
        tick_ms: u64,
        /// Agent speed in world units per second.
        #[arg(long, default_value_t = 96.0)]
        speed: f32,
        /// Ticks between agent waves; zero spawns a single wave.
        #[arg(long, default_value_t = 0)]
        spawn_every: u32,
        /// Number of structures to attempt to place at random during the run.
        #[arg(long, default_value_t = 0)]
        scatter: u32,
        /// Seed for structure scattering.
        #[arg(long, default_value_t = 0x5eed)]
        seed: u64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HeuristicArg {
    Octile,
    Chebyshev,
    Manhattan,
}

impl From<HeuristicArg> for Heuristic {
    fn from(value: HeuristicArg) -> Self {
        match value {
            HeuristicArg::Octile => Heuristic::Octile,
            HeuristicArg::Chebyshev => Heuristic::Chebyshev,
            HeuristicArg::Manhattan => Heuristic::Manhattan,
        }
    }
}

/// Entry point for the tilenav command-line interface.
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tilenav=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut world = Bootstrap
        .world_from_path(&cli.map)
        .with_context(|| format!("failed to load map {}", cli.map.display()))?;

    match cli.command {
        CliCommand::Inspect { costs } => inspect(&world, costs),
        CliCommand::Route {
            from,
            to,
            heuristic,
        } => route(&world, from, to, heuristic.into())?,
        CliCommand::Simulate {
            ticks,
            tick_ms,
            speed,
            spawn_every,
            scatter,
            seed,
        } => {
            let settings = SimulationSettings {
                ticks,
                dt: Duration::from_millis(tick_ms),
                speed,
                spawn_every,
                scatter,
                seed,
            };
            let report = simulate::run(&mut world, &settings);
            println!("{report}");
            println!("{}", render::arrows(query::grid(&world), &query::field_view(&world)));
        }
    }

    Ok(())
}

fn inspect(world: &World, costs: bool) {
    let grid = query::grid(world);
    let field = query::field_view(world);
    if costs {
        println!("{}", render::costs(grid, &field));
    } else {
        println!("{}", render::arrows(grid, &field));
    }

    println!(
        "{} of {} cells reach a goal",
        query::direction_field(world).reachable_count(),
        grid.cell_count()
    );
    for path in query::path_cache(world).iter() {
        println!(
            "entry {} -> {} steps, cost {:.3}",
            path.entry(),
            path.cells().len().saturating_sub(1),
            field.cost_of(path.entry())
        );
    }
}

fn route(world: &World, from: CellCoord, to: CellCoord, heuristic: Heuristic) -> Result<()> {
    let grid = query::grid(world);
    let path = astar_to(grid, from, to, heuristic)
        .with_context(|| format!("no route from {from} to {to}"))?;

    let cost: f32 = path
        .windows(2)
        .filter_map(|pair| Direction::between(pair[0], pair[1]))
        .map(Direction::step_cost)
        .sum();
    info!(%from, %to, steps = path.len().saturating_sub(1), cost, "route found");
    println!("{}", render::route(grid, &path));
    Ok(())
}

fn parse_cell(value: &str) -> Result<CellCoord, String> {
    let (column, row) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `column,row`, got `{value}`"))?;
    let column = column
        .trim()
        .parse()
        .map_err(|error| format!("invalid column `{column}`: {error}"))?;
    let row = row
        .trim()
        .parse()
        .map_err(|error| format!("invalid row `{row}`: {error}"))?;
    Ok(CellCoord::new(column, row))
}
