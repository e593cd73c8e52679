//! Headless driver for a DLA colony.
//!
//! This module defines [`Runner`], which owns a [`Simulation`] plus the
//! pacing and reporting state a front end needs: how many micro-steps per
//! frame, how fast the colony is growing, and when to re-estimate the
//! fractal dimension.

use sim_core::{
    Preset, SimConfig, SimError, Simulation, StepParams, estimate_fractal_dimension,
    fractal::DEFAULT_MIN_BOX_SIZE,
};
use std::time::{Duration, Instant};

/// The dimension is only estimated once the colony has this many cells;
/// smaller clusters give meaningless slopes.
pub const MIN_PARTICLES_FOR_DIMENSION: u64 = 100;

/// Result of one [`Runner::frame`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameOutcome {
    /// The colony grew by `added` cells.
    Grew { added: u64 },
    /// The spawn circle reached the border; stepping has stopped.
    Saturated,
}

/// Statistics reported to the user after a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Report {
    pub frame: u64,
    pub particles: u64,
    pub max_radius: u32,
    /// Particles per second since the previous report.
    pub rate: f64,
    /// `None` while the colony is below [`MIN_PARTICLES_FOR_DIMENSION`].
    pub dimension: Option<f64>,
}

/// Owns one simulation and drives it frame by frame.
///
/// ### Fields
/// - `sim` - The colony being grown.
/// - `params` - Sticking probability and micro-steps per frame.
/// - `box_range` - `(min, max)` box sizes for the dimension estimate.
///
/// - `running` - Cleared once the grid saturates.
/// - `frames` - Frames stepped since the last reset.
///
/// - `last_report_time` / `last_report_particles` - Baseline for the
///   growth rate.
pub struct Runner {
    sim: Simulation,
    params: StepParams,
    box_range: (usize, Option<usize>),

    running: bool,
    frames: u64,

    last_report_time: Instant,
    last_report_particles: u64,
}

impl Runner {
    /// Creates a runner around a fresh simulation.
    pub fn new(cfg: SimConfig, params: StepParams) -> Result<Self, SimError> {
        params.validate()?;
        let sim = Simulation::new(cfg)?;
        Ok(Self {
            sim,
            params,
            box_range: (DEFAULT_MIN_BOX_SIZE, None),
            running: true,
            frames: 0,
            last_report_time: Instant::now(),
            last_report_particles: 1,
        })
    }

    /// Creates a runner using a preset's sticking probability.
    pub fn with_preset(
        cfg: SimConfig,
        preset: Preset,
        steps_per_frame: u32,
    ) -> Result<Self, SimError> {
        Self::new(cfg, preset.step_params(steps_per_frame))
    }

    pub fn set_box_range(&mut self, min: usize, max: Option<usize>) {
        self.box_range = (min, max);
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn params(&self) -> StepParams {
        self.params
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Replays the colony from its seed and resumes running.
    pub fn reset(&mut self) {
        self.sim.reset();
        self.running = true;
        self.frames = 0;
        self.last_report_time = Instant::now();
        self.last_report_particles = self.sim.particles_added();
    }

    /// Advances the simulation by one frame of `steps_per_call` micro-steps.
    ///
    /// A saturated grid stops the runner instead of erroring; parameter
    /// errors are propagated.
    pub fn frame(&mut self) -> Result<FrameOutcome, SimError> {
        if !self.running {
            return Ok(FrameOutcome::Saturated);
        }

        match self.sim.step_with(self.params) {
            Ok(added) => {
                self.frames += 1;
                if self.sim.is_saturated() {
                    self.running = false;
                }
                Ok(FrameOutcome::Grew { added })
            }
            Err(SimError::GridSaturated { .. }) => {
                self.running = false;
                Ok(FrameOutcome::Saturated)
            }
            Err(err) => Err(err),
        }
    }

    /// Builds a report and restarts the growth-rate window.
    pub fn report(&mut self) -> Report {
        let now = Instant::now();
        let particles = self.sim.particles_added();
        let rate = growth_rate(
            particles - self.last_report_particles,
            now.duration_since(self.last_report_time),
        );
        self.last_report_time = now;
        self.last_report_particles = particles;

        Report {
            frame: self.frames,
            particles,
            max_radius: self.sim.max_radius(),
            rate,
            dimension: self.dimension(),
        }
    }

    /// Current fractal dimension, once the colony is large enough.
    pub fn dimension(&self) -> Option<f64> {
        (self.sim.particles_added() > MIN_PARTICLES_FOR_DIMENSION).then(|| {
            let (min, max) = self.box_range;
            estimate_fractal_dimension(&self.sim.grid_snapshot(), min, max)
        })
    }
}

/// Particles per second; zero for an empty interval.
fn growth_rate(added: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { added as f64 / secs } else { 0.0 }
}
