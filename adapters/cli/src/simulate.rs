//! Fixed-step simulation loop that couples the world with the movement system.

use std::{fmt, time::Duration};

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tilenav_core::{CellCoord, Command, Event, TileType};
use tilenav_system_movement::{Arrival, MotionStatus, Movement};
use tilenav_world::{self as world, query, World};
use tracing::{debug, info};

/// Parameters of a simulation run.
#[derive(Clone, Debug)]
pub(crate) struct SimulationSettings {
    pub(crate) ticks: u32,
    pub(crate) dt: Duration,
    pub(crate) speed: f32,
    pub(crate) spawn_every: u32,
    pub(crate) scatter: u32,
    pub(crate) seed: u64,
}

/// Summary of a finished simulation run.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SimulationReport {
    pub(crate) ticks: u32,
    pub(crate) spawned: usize,
    pub(crate) arrived: usize,
    pub(crate) total_distance: f32,
    pub(crate) moving: usize,
    pub(crate) stranded: usize,
    pub(crate) placed: usize,
    pub(crate) rejected: usize,
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mean = if self.arrived == 0 {
            0.0
        } else {
            self.total_distance / self.arrived as f32
        };
        writeln!(f, "ticks run:           {}", self.ticks)?;
        writeln!(f, "agents spawned:      {}", self.spawned)?;
        writeln!(f, "agents arrived:      {} (mean distance {mean:.2})", self.arrived)?;
        writeln!(f, "agents moving:       {}", self.moving)?;
        writeln!(f, "agents stranded:     {}", self.stranded)?;
        write!(
            f,
            "structures placed:   {} ({} rejected)",
            self.placed, self.rejected
        )
    }
}

/// Runs the simulation until the tick budget is spent or every agent has arrived.
pub(crate) fn run(world: &mut World, settings: &SimulationSettings) -> SimulationReport {
    let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
    let mut movement = Movement::new();
    let mut report = SimulationReport::default();
    let mut arrivals: Vec<Arrival> = Vec::new();
    let mut events = Vec::new();

    for tick in 0..settings.ticks {
        let wave_due = if settings.spawn_every == 0 {
            tick == 0
        } else {
            tick % settings.spawn_every == 0
        };
        if wave_due {
            report.spawned += spawn_wave(world, &mut movement, settings.speed);
        }

        if tick < settings.scatter {
            if let Some(cell) = scatter_candidate(world, &movement, &mut rng) {
                events.clear();
                world::apply(world, Command::PlaceStructure { cell }, &mut events);
                for event in &events {
                    match event {
                        Event::StructurePlaced { .. } => report.placed += 1,
                        Event::StructurePlacementRejected { reason, .. } => {
                            debug!(%cell, %reason, "scattered structure rejected");
                            report.rejected += 1;
                        }
                        _ => {}
                    }
                }
            }
        }

        events.clear();
        world::apply(world, Command::Tick { dt: settings.dt }, &mut events);
        movement.handle(
            &events,
            query::grid(world),
            &query::field_view(world),
            &mut arrivals,
        );
        report.ticks = tick + 1;

        for arrival in arrivals.drain(..) {
            debug!(
                agent = arrival.agent.get(),
                cell = %arrival.cell,
                distance = arrival.distance,
                "agent arrived"
            );
            report.arrived += 1;
            report.total_distance += arrival.distance;
        }

        if settings.spawn_every == 0 && tick >= settings.scatter && movement.is_empty() {
            break;
        }
    }

    for (_, agent) in movement.agents() {
        match agent.status() {
            MotionStatus::Stranded => report.stranded += 1,
            MotionStatus::Moving | MotionStatus::Arrived => report.moving += 1,
        }
    }

    info!(
        ticks = report.ticks,
        spawned = report.spawned,
        arrived = report.arrived,
        "simulation finished"
    );
    report
}

fn spawn_wave(world: &World, movement: &mut Movement, speed: f32) -> usize {
    let grid = query::grid(world);
    let field = query::field_view(world);
    query::entries(world)
        .iter()
        .filter_map(|entry| movement.spawn(grid, &field, *entry, speed))
        .count()
}

fn scatter_candidate(world: &World, movement: &Movement, rng: &mut ChaCha8Rng) -> Option<CellCoord> {
    let grid = query::grid(world);
    let candidates: Vec<CellCoord> = (0..grid.cell_count())
        .filter_map(|index| grid.cell_at(index))
        .filter(|cell| grid.at(*cell) == TileType::BuildableFloor)
        .filter(|cell| movement.agents().all(|(_, agent)| agent.cell() != *cell))
        .collect();
    candidates.choose(rng).copied()
}
