//! Application entry point for the headless DLA colony runner.
//!
//! This binary parses the run configuration and delegates stepping and
//! reporting to [`Runner`] from the `runner` module.

mod runner;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use runner::{FrameOutcome, Report, Runner};
use sim_core::{Preset, SimConfig, StepParams, fractal::DEFAULT_MIN_BOX_SIZE};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "dla_2d_sim",
    version,
    about = "Grow a diffusion-limited aggregation colony and report its statistics"
)]
struct Cli {
    /// Odd side length of the square grid.
    #[arg(long, env = "DLA_GRID_SIDE", default_value_t = SimConfig::default().grid_side)]
    grid_side: usize,

    /// Number of walkers tracked concurrently.
    #[arg(long, env = "DLA_BATCH_SIZE", default_value_t = SimConfig::default().batch_size)]
    batch_size: usize,

    /// Colony morphology; selects the sticking probability.
    #[arg(long, value_enum, env = "DLA_PRESET", default_value_t = PresetArg::PureDla)]
    preset: PresetArg,

    /// Overrides the preset's sticking probability, in [0, 1].
    #[arg(long, env = "DLA_STICKING_PROBABILITY")]
    sticking_probability: Option<f64>,

    /// Micro-steps per frame.
    #[arg(
        long,
        env = "DLA_STEPS_PER_FRAME",
        default_value_t = StepParams::default().steps_per_call
    )]
    steps_per_frame: u32,

    /// Maximum number of frames to run.
    #[arg(long, env = "DLA_FRAMES", default_value_t = 1000)]
    frames: u64,

    /// Pause between frames, in milliseconds.
    #[arg(long, env = "DLA_FRAME_DELAY_MS", default_value_t = 0)]
    frame_delay_ms: u64,

    /// RNG seed; omitted draws one and logs it for replay.
    #[arg(long, env = "DLA_SEED")]
    seed: Option<u64>,

    /// Walkers beyond `max_radius + escape_margin` are culled.
    #[arg(long, env = "DLA_ESCAPE_MARGIN", default_value_t = SimConfig::default().escape_margin)]
    escape_margin: u32,

    /// Walkers spawn at `max_radius + spawn_margin`.
    #[arg(long, env = "DLA_SPAWN_MARGIN", default_value_t = SimConfig::default().spawn_margin)]
    spawn_margin: u32,

    /// Frames between progress reports; 0 reports only at the end.
    #[arg(long, env = "DLA_REPORT_EVERY", default_value_t = 10)]
    report_every: u64,

    /// Smallest box size for the fractal dimension estimate.
    #[arg(long, default_value_t = DEFAULT_MIN_BOX_SIZE)]
    min_box_size: usize,

    /// Largest box size for the estimate; defaults to side / 8.
    #[arg(long)]
    max_box_size: Option<usize>,

    /// After the run, replay it from the same seed and fail if it diverges.
    #[arg(long)]
    verify_replay: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PresetArg {
    PureDla,
    DenseBranching,
    Transitional,
    EdenLike,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::PureDla => Preset::PureDla,
            PresetArg::DenseBranching => Preset::DenseBranching,
            PresetArg::Transitional => Preset::Transitional,
            PresetArg::EdenLike => Preset::EdenLike,
        }
    }
}

impl Cli {
    fn sim_config(&self) -> SimConfig {
        SimConfig {
            grid_side: self.grid_side,
            batch_size: self.batch_size,
            escape_margin: self.escape_margin,
            spawn_margin: self.spawn_margin,
            seed: self.seed,
        }
    }

    fn runner(&self) -> Result<Runner> {
        let runner = match self.sticking_probability {
            Some(sticking_probability) => Runner::new(
                self.sim_config(),
                StepParams {
                    sticking_probability,
                    steps_per_call: self.steps_per_frame,
                },
            ),
            None => {
                Runner::with_preset(self.sim_config(), self.preset.into(), self.steps_per_frame)
            }
        };
        runner.context("invalid simulation settings")
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut runner = cli.runner()?;
    runner.set_box_range(cli.min_box_size, cli.max_box_size);

    info!(
        seed = runner.simulation().seed(),
        grid_side = cli.grid_side,
        batch_size = cli.batch_size,
        sticking_probability = runner.params().sticking_probability,
        steps_per_frame = cli.steps_per_frame,
        "starting DLA colony"
    );

    let started = Instant::now();
    run_frames(&mut runner, &cli)?;
    let elapsed = started.elapsed();

    let summary = runner.report();
    log_report(&summary);
    if cli.sticking_probability.is_none() {
        info!(
            expected_dimension = Preset::from(cli.preset).expected_dimension(),
            "preset reference"
        );
    }

    if cli.verify_replay {
        verify_replay(&mut runner)?;
    }

    println!(
        "frames={} particles={} max_radius={} dimension={} elapsed={:.2?}",
        summary.frame,
        summary.particles,
        summary.max_radius,
        summary
            .dimension
            .map_or_else(|| "n/a".to_string(), |d| format!("{d:.3}")),
        elapsed,
    );
    Ok(())
}

/// Steps until the frame budget is spent or the grid saturates.
fn run_frames(runner: &mut Runner, cli: &Cli) -> Result<()> {
    let delay = Duration::from_millis(cli.frame_delay_ms);

    while runner.is_running() && runner.frames() < cli.frames {
        match runner.frame().context("simulation step failed")? {
            FrameOutcome::Grew { added } => debug!(added, "frame"),
            FrameOutcome::Saturated => break,
        }

        if cli.report_every > 0 && runner.frames() % cli.report_every == 0 {
            log_report(&runner.report());
        }
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    if !runner.is_running() {
        warn!(
            max_radius = runner.simulation().max_radius(),
            spawn_radius = runner.simulation().spawn_radius(),
            "grid saturated, stopped early"
        );
    }
    Ok(())
}

/// Replays the run from its seed and checks the colony comes out identical.
fn verify_replay(runner: &mut Runner) -> Result<()> {
    let expected = runner.simulation().grid_snapshot().cells().to_vec();
    let frames = runner.frames();

    runner.reset();
    while runner.is_running() && runner.frames() < frames {
        runner.frame().context("replay step failed")?;
    }

    let seed = runner.simulation().seed();
    if runner.simulation().grid_snapshot().cells() != expected.as_slice() {
        bail!("replay with seed {seed} diverged after {frames} frames");
    }
    info!(seed, frames, "replay matched");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn log_report(report: &Report) {
    info!(
        frame = report.frame,
        particles = report.particles,
        max_radius = report.max_radius,
        rate = report.rate,
        dimension = ?report.dimension,
        "colony progress"
    );
}
