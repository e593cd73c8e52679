use thiserror::Error;

/// Errors surfaced by the aggregation engine.
///
/// Out-of-bounds writes into the grid are not represented here: they can
/// only come from a bug in the step ordering and panic instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// The requested grid side cannot host a simulation.
    #[error("invalid grid dimension {side}: {reason}")]
    InvalidDimension { side: usize, reason: &'static str },

    /// A construction or per-call parameter is outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// The spawn circle no longer fits inside the grid.
    ///
    /// Recoverable: the grid is intact, the driver should stop stepping.
    #[error(
        "grid saturated: spawn radius {spawn_radius} (max radius {max_radius}) reaches the border at {center}"
    )]
    GridSaturated {
        max_radius: u32,
        spawn_radius: u32,
        center: usize,
    },
}
