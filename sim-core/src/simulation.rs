//! The stepping engine that owns one aggregation run.

use crate::{
    config::{SimConfig, StepParams},
    contact_buffer::ContactBuffer,
    error::SimError,
    grid::{AggregationGrid, GridSnapshot},
    phases,
    types::Cell,
    walker::WalkerBatch,
};
use rand::{SeedableRng, rngs::SmallRng};
use tracing::{debug, info, warn};

/// Builds a simulation with default margins and an entropy-drawn seed.
///
/// ### Parameters
/// - `grid_side` - Odd side length of the occupancy grid.
/// - `batch_size` - Number of walkers tracked concurrently.
///
/// ### Returns
/// The simulation, or [`SimError::InvalidDimension`] /
/// [`SimError::InvalidParameter`] for unusable arguments.
pub fn new_simulation(grid_side: usize, batch_size: usize) -> Result<Simulation, SimError> {
    Simulation::new(SimConfig {
        grid_side,
        batch_size,
        ..SimConfig::default()
    })
}

/// One diffusion-limited aggregation run.
///
/// [`Simulation`] glues together:
/// - The aggregate: [`AggregationGrid`].
/// - The walker population: [`WalkerBatch`] and its [`ContactBuffer`] scratch.
/// - A seeded [`SmallRng`] driving every random decision, so a seed
///   reproduces the whole growth trajectory.
///
/// Instances share nothing with each other and may run on separate threads.
#[derive(Debug)]
pub struct Simulation {
    cfg: SimConfig,
    seed: u64,
    grid: AggregationGrid,
    walkers: WalkerBatch,
    contacts: ContactBuffer,
    rng: SmallRng,
}

impl Simulation {
    /// Validates `cfg`, seeds the grid and spawns the first batch of walkers
    /// on the spawn circle.
    pub fn new(cfg: SimConfig) -> Result<Self, SimError> {
        cfg.validate()?;

        let seed = cfg.seed.unwrap_or_else(rand::random);
        let grid = AggregationGrid::new(cfg.grid_side)?;
        let mut rng = SmallRng::seed_from_u64(seed);
        let walkers = WalkerBatch::on_circle(
            cfg.batch_size,
            grid.center_cell(),
            grid.max_radius() + cfg.spawn_margin,
            &mut rng,
        );
        let contacts = ContactBuffer::with_len(cfg.batch_size);

        debug!(
            grid_side = cfg.grid_side,
            batch_size = cfg.batch_size,
            seed,
            "created aggregation simulation"
        );

        Ok(Self {
            cfg,
            seed,
            grid,
            walkers,
            contacts,
            rng,
        })
    }

    /// Restores the freshly constructed state, replaying the same seed.
    pub fn reset(&mut self) {
        self.grid.reset();
        self.rng = SmallRng::seed_from_u64(self.seed);
        self.walkers = WalkerBatch::on_circle(
            self.cfg.batch_size,
            self.grid.center_cell(),
            self.spawn_radius(),
            &mut self.rng,
        );
        self.contacts.ensure_len(self.cfg.batch_size);
    }

    /// Advances the walkers by `steps_per_call` micro-steps.
    ///
    /// See [`crate::phases`] for the per-micro-step order. Both the kill
    /// and spawn radii follow `max_radius` as the aggregate grows, so a
    /// single long call grows the same way as many short ones.
    ///
    /// If a commit saturates the grid, the call stops right after it and
    /// leaves the retired walkers unspawned, so no walker is ever placed
    /// on a spawn circle that crosses the border.
    ///
    /// ### Returns
    /// - `Ok(n)` with the number of newly occupied cells during this call.
    /// - [`SimError::InvalidParameter`] for an out-of-range probability or
    ///   a zero step count.
    /// - [`SimError::GridSaturated`] if the grid was already saturated when
    ///   the call started. The grid is left untouched.
    pub fn step(
        &mut self,
        sticking_probability: f64,
        steps_per_call: u32,
    ) -> Result<u64, SimError> {
        self.step_with(StepParams {
            sticking_probability,
            steps_per_call,
        })
    }

    /// [`Simulation::step`] taking a [`StepParams`].
    pub fn step_with(&mut self, params: StepParams) -> Result<u64, SimError> {
        params.validate()?;
        if let Err(err) = self.check_capacity() {
            warn!(%err, "step requested on a saturated grid");
            return Err(err);
        }

        let center = self.grid.center_cell();
        let mut added = 0;

        for _ in 0..params.steps_per_call {
            let spawn_radius = self.spawn_radius();
            if phases::respawn_guard(&mut self.walkers, center, spawn_radius, &mut self.rng) {
                debug!(spawn_radius, "respawned whole walker batch");
            }

            phases::move_phase(&mut self.walkers, &mut self.rng);
            let kill_radius = self.kill_radius();
            phases::cull_phase(&self.grid, &mut self.walkers, kill_radius);

            if self.walkers.any_active() {
                phases::contact_phase(&self.grid, &self.walkers, &mut self.contacts);
                phases::stick_phase(
                    &self.walkers,
                    &mut self.contacts,
                    params.sticking_probability,
                    &mut self.rng,
                );
                added += phases::commit_phase(&mut self.grid, &mut self.walkers, &self.contacts);

                if self.is_saturated() {
                    info!(
                        particles = self.grid.particles_added(),
                        max_radius = self.grid.max_radius(),
                        "aggregate saturated the grid"
                    );
                    break;
                }
            }

            let spawn_radius = self.spawn_radius();
            phases::respawn_phase(&mut self.walkers, center, spawn_radius, &mut self.rng);
        }

        debug!(
            added,
            particles = self.grid.particles_added(),
            max_radius = self.grid.max_radius(),
            "step finished"
        );
        Ok(added)
    }

    /// Cells occupied so far, seed included.
    pub fn particles_added(&self) -> u64 {
        self.grid.particles_added()
    }

    pub fn max_radius(&self) -> u32 {
        self.grid.max_radius()
    }

    /// Radius beyond which walkers are culled.
    pub fn kill_radius(&self) -> u32 {
        self.grid.max_radius().saturating_add(self.cfg.escape_margin)
    }

    /// Radius of the circle new walkers appear on.
    pub fn spawn_radius(&self) -> u32 {
        self.grid.max_radius().saturating_add(self.cfg.spawn_margin)
    }

    /// `true` once the spawn circle reaches the grid border
    /// (`max_radius + spawn_margin >= side / 2`).
    pub fn is_saturated(&self) -> bool {
        self.spawn_radius() as usize >= self.grid.center()
    }

    /// Returns [`SimError::GridSaturated`] if the grid has no room left to
    /// spawn walkers. Drivers should poll this after every step.
    pub fn check_capacity(&self) -> Result<(), SimError> {
        if self.is_saturated() {
            return Err(SimError::GridSaturated {
                max_radius: self.grid.max_radius(),
                spawn_radius: self.spawn_radius(),
                center: self.grid.center(),
            });
        }
        Ok(())
    }

    pub fn grid(&self) -> &AggregationGrid {
        &self.grid
    }

    /// Read-only view of the occupancy flags for rendering or estimation.
    pub fn grid_snapshot(&self) -> GridSnapshot<'_> {
        self.grid.snapshot()
    }

    pub fn walkers(&self) -> &WalkerBatch {
        &self.walkers
    }

    /// Positions of walkers currently in flight.
    pub fn walker_positions(&self) -> impl Iterator<Item = Cell> + '_ {
        self.walkers.active_positions()
    }

    pub fn config(&self) -> &SimConfig {
        &self.cfg
    }

    /// The seed actually in use, including one drawn from entropy.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}
