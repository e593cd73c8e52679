use crate::error::SimError;

/// Smallest grid side accepted by [`SimConfig::validate`].
pub const MIN_GRID_SIDE: usize = 3;

/// Construction-time options for a [`crate::simulation::Simulation`].
///
/// ### Fields
/// - `grid_side` - Side length of the square occupancy grid. Must be odd so
///   the seed sits on a unique center cell.
/// - `batch_size` - Number of walkers tracked concurrently.
/// - `escape_margin` - Walkers farther than `max_radius + escape_margin`
///   from the center are culled.
/// - `spawn_margin` - New walkers appear at `max_radius + spawn_margin`.
/// - `seed` - RNG seed; `None` draws one from entropy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimConfig {
    pub grid_side: usize,
    pub batch_size: usize,
    pub escape_margin: u32,
    pub spawn_margin: u32,
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_side: 401,
            batch_size: 500,
            escape_margin: 50,
            spawn_margin: 5,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Checks the grid geometry, batch size and margins.
    ///
    /// The grid must be odd, at least [`MIN_GRID_SIDE`], and wide enough
    /// that the initial spawn circle (`1 + spawn_margin`) lies strictly
    /// inside the border. The kill circle must lie outside the spawn
    /// circle, otherwise every walker is culled on its first move.
    pub fn validate(&self) -> Result<(), SimError> {
        let side = self.grid_side;
        if side < MIN_GRID_SIDE {
            return Err(SimError::InvalidDimension {
                side,
                reason: "grid side must be at least 3",
            });
        }
        if side % 2 == 0 {
            return Err(SimError::InvalidDimension {
                side,
                reason: "grid side must be odd",
            });
        }
        let initial_spawn = 1 + self.spawn_margin as usize;
        if side / 2 <= initial_spawn {
            return Err(SimError::InvalidDimension {
                side,
                reason: "grid side too small to contain the spawn margin",
            });
        }
        if self.batch_size == 0 {
            return Err(SimError::InvalidParameter("batch_size must be at least 1"));
        }
        if self.escape_margin <= self.spawn_margin {
            return Err(SimError::InvalidParameter(
                "escape_margin must exceed spawn_margin",
            ));
        }
        Ok(())
    }
}

/// Per-call options for [`crate::simulation::Simulation::step`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepParams {
    pub sticking_probability: f64,
    pub steps_per_call: u32,
}

impl Default for StepParams {
    fn default() -> Self {
        Self {
            sticking_probability: 1.0,
            steps_per_call: 50,
        }
    }
}

impl StepParams {
    pub fn validate(&self) -> Result<(), SimError> {
        // NaN fails the range check.
        if !(0.0..=1.0).contains(&self.sticking_probability) {
            return Err(SimError::InvalidParameter(
                "sticking_probability must be within [0, 1]",
            ));
        }
        if self.steps_per_call == 0 {
            return Err(SimError::InvalidParameter(
                "steps_per_call must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Colony morphologies reachable by tuning the sticking probability.
///
/// Lower probabilities let walkers penetrate deeper before attaching,
/// producing denser clusters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    /// Canonical DLA, dendritic.
    PureDla,
    DenseBranching,
    Transitional,
    /// Compact, Eden-model-like growth.
    EdenLike,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::PureDla,
        Preset::DenseBranching,
        Preset::Transitional,
        Preset::EdenLike,
    ];

    pub fn sticking_probability(self) -> f64 {
        match self {
            Preset::PureDla => 1.0,
            Preset::DenseBranching => 0.3,
            Preset::Transitional => 0.1,
            Preset::EdenLike => 0.03,
        }
    }

    /// Approximate box-counting dimension observed for this morphology.
    pub fn expected_dimension(self) -> f64 {
        match self {
            Preset::PureDla => 1.71,
            Preset::DenseBranching => 1.8,
            Preset::Transitional => 1.9,
            Preset::EdenLike => 2.0,
        }
    }

    pub fn step_params(self, steps_per_call: u32) -> StepParams {
        StepParams {
            sticking_probability: self.sticking_probability(),
            steps_per_call,
        }
    }
}
