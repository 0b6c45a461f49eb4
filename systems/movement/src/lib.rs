#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that advances agents along the live direction field.
//!
//! Agents store only a continuous position, the cell they are in, and the
//! direction they face. Each tick the [`MovementIntegrator`] alternates
//! between two phases per cell: while the facing matches the cell's flow the
//! agent runs from the centre to the tile boundary and crosses into the
//! neighbour; whenever the facing and the flow disagree the agent first
//! returns to the cell centre along its facing and only then turns. The
//! field can therefore change underfoot without agents teleporting or
//! overshooting.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use tilenav_core::{CellCoord, Direction, DirectionFieldView, Event, Grid};
use tracing::warn;

/// Unique identifier assigned to an agent by the movement system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Progress state of a single agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MotionStatus {
    /// The agent is following the field.
    Moving,
    /// The agent reached the centre of a goal cell; terminal.
    Arrived,
    /// The agent rests on a cell that cannot reach any goal.
    ///
    /// Re-evaluated every tick, so a later rebuild can set it moving again.
    Stranded,
}

/// Per-agent movement state.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentMotion {
    position: Vec2,
    cell: CellCoord,
    facing: Option<Direction>,
    speed: f32,
    status: MotionStatus,
    odometer: f32,
}

impl AgentMotion {
    /// Places an agent at the centre of `cell`, facing the cell's flow.
    ///
    /// Returns `None` when the cell lies outside the grid or is impassable.
    /// `speed` is measured in world units per second.
    #[must_use]
    pub fn at_cell(
        grid: &Grid,
        field: &DirectionFieldView<'_>,
        cell: CellCoord,
        speed: f32,
    ) -> Option<Self> {
        if !grid.is_passable(cell) {
            return None;
        }

        Some(Self {
            position: grid.coordinate_grid_to_world(cell),
            cell,
            facing: field.direction_of(cell),
            speed,
            status: MotionStatus::Moving,
            odometer: 0.0,
        })
    }

    /// Continuous world-space position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Cell the agent currently occupies.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Direction the agent is currently travelling in.
    #[must_use]
    pub const fn facing(&self) -> Option<Direction> {
        self.facing
    }

    /// Travel speed in world units per second.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Current progress state.
    #[must_use]
    pub const fn status(&self) -> MotionStatus {
        self.status
    }

    /// Total distance travelled in world units.
    #[must_use]
    pub const fn odometer(&self) -> f32 {
        self.odometer
    }

    fn travel(&mut self, heading: Vec2, distance: f32) {
        self.position += heading * distance;
        self.odometer += distance;
    }
}

/// Stateless per-tick integrator that moves agents through the field.
#[derive(Clone, Copy, Debug, Default)]
pub struct MovementIntegrator;

impl MovementIntegrator {
    /// Advances a single agent by `speed * dt` world units.
    ///
    /// Returns the agent's status after the tick.
    pub fn advance(
        &self,
        agent: &mut AgentMotion,
        dt: Duration,
        grid: &Grid,
        field: &DirectionFieldView<'_>,
    ) -> MotionStatus {
        if agent.status == MotionStatus::Arrived {
            return MotionStatus::Arrived;
        }

        let mut budget = (agent.speed * dt.as_secs_f32()).max(0.0);
        let iteration_limit = grid.cell_count().saturating_mul(4).saturating_add(8);

        for _ in 0..iteration_limit {
            let centre = grid.coordinate_grid_to_world(agent.cell);
            let flow = field.direction_of(agent.cell);

            if agent.facing == flow {
                let Some(direction) = flow else {
                    agent.position = centre;
                    agent.status = if field.is_goal(agent.cell) {
                        MotionStatus::Arrived
                    } else {
                        MotionStatus::Stranded
                    };
                    return agent.status;
                };

                agent.status = MotionStatus::Moving;
                if !run_to_boundary(agent, direction, centre, &mut budget, grid) {
                    return agent.status;
                }
                continue;
            }

            agent.status = MotionStatus::Moving;
            let offset = agent.position - centre;
            let distance = offset.length();

            match agent.facing {
                Some(direction) if distance > 0.0 && heading(grid, direction).dot(offset) > 0.0 => {
                    // Heading away from the centre: finish the edge if the
                    // step is still open, otherwise turn back.
                    if grid.can_step(agent.cell, direction).is_some() {
                        if !run_to_boundary(agent, direction, centre, &mut budget, grid) {
                            return agent.status;
                        }
                    } else {
                        agent.facing = Some(direction.opposite());
                    }
                }
                _ => {
                    if distance > budget {
                        agent.travel(-offset / distance, budget);
                        return agent.status;
                    }

                    agent.odometer += distance;
                    agent.position = centre;
                    budget -= distance;
                    agent.facing = flow;
                }
            }
        }

        warn!(
            cell = %agent.cell,
            "movement integrator hit its iteration limit; ending tick early"
        );
        agent.status
    }
}

/// Moves the agent toward the tile boundary along `direction`.
///
/// Returns `true` when the boundary was reached and the agent crossed into
/// the neighbouring cell, `false` when the budget ran out first.
fn run_to_boundary(
    agent: &mut AgentMotion,
    direction: Direction,
    centre: Vec2,
    budget: &mut f32,
    grid: &Grid,
) -> bool {
    let heading = heading(grid, direction);
    let to_boundary = distance_to_boundary(grid, agent.position - centre, heading);
    if to_boundary > *budget {
        agent.travel(heading, *budget);
        *budget = 0.0;
        return false;
    }

    agent.travel(heading, to_boundary);
    *budget -= to_boundary;
    match agent.cell.offset(direction).filter(|next| grid.inside(*next)) {
        Some(next) => {
            agent.cell = next;
            true
        }
        None => false,
    }
}

/// Unit vector along a direction, scaled so diagonals follow centre-to-centre lines.
fn heading(grid: &Grid, direction: Direction) -> Vec2 {
    let (dx, dy) = direction.delta();
    let size = grid.tile_size();
    Vec2::new(dx as f32 * size.x, dy as f32 * size.y).normalize_or_zero()
}

/// Travel distance along `heading` before leaving the tile, given the offset from its centre.
fn distance_to_boundary(grid: &Grid, offset: Vec2, heading: Vec2) -> f32 {
    let half = grid.tile_size() * 0.5;
    let mut distance = f32::INFINITY;
    for (component, half_extent, offset) in [
        (heading.x, half.x, offset.x),
        (heading.y, half.y, offset.y),
    ] {
        if component == 0.0 {
            continue;
        }
        let edge = half_extent.copysign(component);
        distance = distance.min((edge - offset) / component);
    }

    if distance.is_finite() {
        distance.max(0.0)
    } else {
        0.0
    }
}

/// Agent that reached a goal during a movement pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arrival {
    /// Identifier of the agent that arrived.
    pub agent: AgentId,
    /// Goal cell the agent reached.
    pub cell: CellCoord,
    /// Total distance the agent travelled in world units.
    pub distance: f32,
}

/// Pure system that owns agents and advances them on every clock tick.
#[derive(Debug, Default)]
pub struct Movement {
    integrator: MovementIntegrator,
    agents: BTreeMap<AgentId, AgentMotion>,
    next_agent_id: u32,
}

impl Movement {
    /// Creates a movement system without agents.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Introduces an agent at the centre of `cell`.
    ///
    /// Returns `None` when the cell lies outside the grid or is impassable.
    pub fn spawn(
        &mut self,
        grid: &Grid,
        field: &DirectionFieldView<'_>,
        cell: CellCoord,
        speed: f32,
    ) -> Option<AgentId> {
        let motion = AgentMotion::at_cell(grid, field, cell, speed)?;
        let id = AgentId::new(self.next_agent_id);
        self.next_agent_id = self.next_agent_id.saturating_add(1);
        let _ = self.agents.insert(id, motion);
        Some(id)
    }

    /// Consumes world events and advances every agent by the elapsed time.
    ///
    /// Agents that reach a goal are removed and reported through `out`.
    pub fn handle(
        &mut self,
        events: &[Event],
        grid: &Grid,
        field: &DirectionFieldView<'_>,
        out: &mut Vec<Arrival>,
    ) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                elapsed = elapsed.saturating_add(*dt);
            }
        }

        if elapsed.is_zero() {
            return;
        }

        for (id, agent) in &mut self.agents {
            if self.integrator.advance(agent, elapsed, grid, field) == MotionStatus::Arrived {
                out.push(Arrival {
                    agent: *id,
                    cell: agent.cell,
                    distance: agent.odometer,
                });
            }
        }

        self.agents
            .retain(|_, agent| agent.status != MotionStatus::Arrived);
    }

    /// Looks up an agent by identifier.
    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&AgentMotion> {
        self.agents.get(&id)
    }

    /// Iterator over the active agents in identifier order.
    pub fn agents(&self) -> impl Iterator<Item = (AgentId, &AgentMotion)> {
        self.agents.iter().map(|(id, agent)| (*id, agent))
    }

    /// Number of active agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Reports whether no agents are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
