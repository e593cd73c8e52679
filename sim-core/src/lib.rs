//! Core 2-D diffusion-limited aggregation library.
//!
//! Main components:
//! - [`grid`]: the occupancy field and its read-only snapshots.
//! - [`walker`]: the batch of random walkers and the spawn rule.
//! - [`contact_buffer`]: per-walker scratch flags for one micro-step.
//! - [`phases`]: the ordered micro-step phases.
//! - [`simulation`]: the engine driving walkers against the grid.
//! - [`fractal`]: box-counting dimension estimate.
//! - [`config`]: construction and per-step options, morphology presets.
//! - [`error`]: error taxonomy.
//! - [`types`]: shared type aliases and offsets.

pub mod config;
pub mod contact_buffer;
pub mod error;
pub mod fractal;
pub mod grid;
pub mod phases;
pub mod simulation;
pub mod types;
pub mod walker;

pub use config::{Preset, SimConfig, StepParams};
pub use error::SimError;
pub use fractal::estimate_fractal_dimension;
pub use grid::{AggregationGrid, GridSnapshot};
pub use simulation::{Simulation, new_simulation};
