//! Micro-step phases of the aggregation process.
//!
//! One micro-step runs, in this exact order:
//! 1. [`respawn_guard`]: refill the whole batch if no walker is active.
//! 2. [`move_phase`]: every active walker takes one random axis step.
//! 3. [`cull_phase`]: walkers past the kill radius or next to the grid
//!    border retire.
//! 4. [`contact_phase`]: flag active walkers with an occupied axis neighbor.
//! 5. [`stick_phase`]: flagged walkers stick with the given probability.
//! 6. [`commit_phase`]: sticking walkers occupy their cell and retire.
//! 7. [`respawn_phase`]: every retired walker reappears on the spawn circle.
//!
//! If [`cull_phase`] leaves nobody active, the contact, stick and commit
//! phases are skipped for that micro-step. Changing the order changes the
//! growth statistics.

use crate::{
    contact_buffer::ContactBuffer,
    grid::AggregationGrid,
    types::{Cell, NEIGHBOR_OFFSETS},
    walker::WalkerBatch,
};
use rand::Rng;
use rayon::prelude::*;

/// Respawns the whole batch on the spawn circle if no walker is active.
///
/// ### Returns
/// `true` if a fresh batch was spawned.
pub fn respawn_guard(
    batch: &mut WalkerBatch,
    center: Cell,
    spawn_radius: u32,
    rng: &mut impl Rng,
) -> bool {
    if batch.any_active() {
        return false;
    }
    batch.respawn_all(center, spawn_radius, rng);
    true
}

/// Moves each active walker one cell up, down, left or right, chosen
/// uniformly and independently. Retired walkers are not touched and
/// consume no random draws.
pub fn move_phase(batch: &mut WalkerBatch, rng: &mut impl Rng) {
    for (pos, _) in batch
        .positions
        .iter_mut()
        .zip(&batch.active)
        .filter(|(_, a)| **a)
    {
        *pos += NEIGHBOR_OFFSETS[rng.random_range(0..NEIGHBOR_OFFSETS.len())];
    }
}

/// Retires walkers that escaped or drifted next to the border.
///
/// A walker escapes when its squared distance from the center exceeds
/// `kill_radius²`. It is out of bounds when `x < 1`, `y < 1`,
/// `x >= side - 1` or `y >= side - 1`; every survivor therefore has all
/// four axis neighbors inside the grid.
///
/// ### Returns
/// The number of walkers retired by this phase.
pub fn cull_phase(grid: &AggregationGrid, batch: &mut WalkerBatch, kill_radius: u32) -> usize {
    let center = grid.center_cell();
    let kill_r2 = (kill_radius as i64).saturating_mul(kill_radius as i64);
    let hi = grid.side() as i32 - 1;

    let mut culled = 0;
    for (pos, active) in batch.positions.iter().zip(batch.active.iter_mut()) {
        if !*active {
            continue;
        }
        let escaped = (*pos - center).as_i64vec2().length_squared() > kill_r2;
        let out_of_bounds = pos.x < 1 || pos.y < 1 || pos.x >= hi || pos.y >= hi;
        if escaped || out_of_bounds {
            *active = false;
            culled += 1;
        }
    }
    culled
}

/// Flags every active walker that has at least one occupied axis neighbor.
///
/// Only reads the grid and writes one flag per walker, so the batch is
/// scanned in parallel. The buffer is resized and cleared first.
///
/// ### Returns
/// The number of walkers in contact with the aggregate.
pub fn contact_phase(
    grid: &AggregationGrid,
    batch: &WalkerBatch,
    buf: &mut ContactBuffer,
) -> usize {
    buf.ensure_len(batch.len());

    buf.touching
        .par_iter_mut()
        .zip(batch.positions.par_iter().zip(batch.active.par_iter()))
        .for_each(|(touching, (&pos, &active))| {
            *touching = active
                && NEIGHBOR_OFFSETS
                    .iter()
                    .any(|&offset| grid.is_occupied(pos + offset));
        });

    buf.touching.iter().filter(|&&t| t).count()
}

/// Draws the sticking decision for every touching walker.
///
/// A walker sticks iff it is active, touches the aggregate, and a uniform
/// draw in `[0, 1)` is below `sticking_probability`. Draws happen in
/// ascending walker order and only for touching walkers.
///
/// ### Returns
/// The number of walkers marked to stick.
pub fn stick_phase(
    batch: &WalkerBatch,
    buf: &mut ContactBuffer,
    sticking_probability: f64,
    rng: &mut impl Rng,
) -> usize {
    let mut marked = 0;
    for id in 0..buf.len() {
        if !buf.is_touching(id) || !batch.is_active(id) {
            continue;
        }
        if rng.random::<f64>() < sticking_probability {
            buf.mark_stick(id);
            marked += 1;
        }
    }
    marked
}

/// Occupies the cell under every sticking walker and retires it.
///
/// Walkers are committed in ascending order. When several stick to the
/// same empty cell, only the first occupation counts; the others still
/// retire.
///
/// ### Returns
/// The number of newly occupied cells.
///
/// ### Panics
/// Panics if a sticking walker sits outside the grid, which means
/// [`cull_phase`] did not run first.
pub fn commit_phase(
    grid: &mut AggregationGrid,
    batch: &mut WalkerBatch,
    buf: &ContactBuffer,
) -> u64 {
    let mut added = 0;
    for id in buf.sticking_indices() {
        if grid.occupy(batch.positions[id]) {
            added += 1;
        }
        batch.retire(id);
    }
    added
}

/// Respawns every retired walker on the spawn circle.
///
/// ### Returns
/// The number of walkers respawned.
pub fn respawn_phase(
    batch: &mut WalkerBatch,
    center: Cell,
    spawn_radius: u32,
    rng: &mut impl Rng,
) -> usize {
    let mut respawned = 0;
    for id in 0..batch.len() {
        if !batch.is_active(id) {
            batch.respawn(id, center, spawn_radius, rng);
            respawned += 1;
        }
    }
    respawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec2;
    use rand::{SeedableRng, rngs::SmallRng};

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[test]
    fn respawn_guard_only_fires_when_batch_is_empty() {
        let mut rng = rng();
        let center = IVec2::new(20, 20);
        let mut batch = WalkerBatch::from_positions(vec![IVec2::ZERO; 3]);

        assert!(!respawn_guard(&mut batch, center, 6, &mut rng));
        assert_eq!(batch.position(0), Some(IVec2::ZERO));

        for id in 0..3 {
            batch.retire(id);
        }
        assert!(respawn_guard(&mut batch, center, 6, &mut rng));
        assert_eq!(batch.active_count(), 3);
        for p in batch.active_positions() {
            assert!(((p - center).as_dvec2().length() - 6.0).abs() <= 0.75);
        }
    }

    #[test]
    fn move_phase_takes_unit_axis_steps_and_skips_retired() {
        let mut rng = rng();
        let start = IVec2::new(10, 10);
        let mut batch = WalkerBatch::from_positions(vec![start; 64]);
        batch.positions[5] = IVec2::new(-7, -7);
        batch.retire(5);

        move_phase(&mut batch, &mut rng);

        for (id, &p) in batch.positions.iter().enumerate() {
            if id == 5 {
                assert_eq!(p, IVec2::new(-7, -7));
                continue;
            }
            let d = p - start;
            assert_eq!(d.x.abs() + d.y.abs(), 1, "walker {id} moved by {d}");
        }
    }

    #[test]
    fn cull_phase_retires_escaped_and_border_walkers() {
        let grid = AggregationGrid::new(21).unwrap();
        let mut batch = WalkerBatch::from_positions(vec![
            IVec2::new(10, 13), // inside both limits
            IVec2::new(10, 15), // distance 5 > kill radius 4
            IVec2::new(0, 10),  // x < 1
            IVec2::new(10, 20), // y >= side - 1
            IVec2::new(1, 19),  // last interior cell, but escaped
        ]);

        let culled = cull_phase(&grid, &mut batch, 4);

        assert_eq!(culled, 4);
        assert!(batch.is_active(0));
        assert!(!batch.is_active(1));
        assert!(!batch.is_active(2));
        assert!(!batch.is_active(3));
        assert!(!batch.is_active(4));
    }

    #[test]
    fn cull_phase_keeps_interior_cells_next_to_border() {
        let grid = AggregationGrid::new(21).unwrap();
        let mut batch = WalkerBatch::from_positions(vec![IVec2::new(1, 1), IVec2::new(19, 19)]);

        assert_eq!(cull_phase(&grid, &mut batch, 100), 0);
        assert_eq!(batch.active_count(), 2);
    }

    #[test]
    fn contact_phase_flags_only_active_neighbors_of_aggregate() {
        let grid = AggregationGrid::new(11).unwrap();
        let mut batch = WalkerBatch::from_positions(vec![
            IVec2::new(6, 5), // right of seed
            IVec2::new(5, 4), // below seed
            IVec2::new(6, 6), // diagonal, not a neighbor
            IVec2::new(4, 5), // left of seed, but retired
        ]);
        batch.retire(3);
        let mut buf = ContactBuffer::default();

        let touching = contact_phase(&grid, &batch, &mut buf);

        assert_eq!(touching, 2);
        assert_eq!(buf.touching_indices().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn stick_phase_respects_probability_bounds() {
        let batch = WalkerBatch::from_positions(vec![IVec2::new(6, 5); 8]);
        let mut buf = ContactBuffer::with_len(8);
        buf.touching.fill(true);
        buf.touching[2] = false;

        let mut rng = rng();
        assert_eq!(stick_phase(&batch, &mut buf, 1.0, &mut rng), 7);
        assert!(!buf.sticks[2]);

        buf.sticks.fill(false);
        assert_eq!(stick_phase(&batch, &mut buf, 0.0, &mut rng), 0);
    }

    #[test]
    fn commit_phase_counts_shared_cell_once() {
        let mut grid = AggregationGrid::new(11).unwrap();
        let target = IVec2::new(6, 5);
        let mut batch = WalkerBatch::from_positions(vec![target, target, IVec2::new(5, 6)]);
        let mut buf = ContactBuffer::with_len(3);
        for id in 0..3 {
            buf.mark_stick(id);
        }

        let added = commit_phase(&mut grid, &mut batch, &buf);

        assert_eq!(added, 2);
        assert_eq!(grid.particles_added(), 3);
        assert!(grid.is_occupied(target));
        assert!(grid.is_occupied(IVec2::new(5, 6)));
        assert!(!batch.any_active(), "every sticking walker retires");
    }

    #[test]
    #[should_panic(expected = "occupy out of bounds")]
    fn commit_phase_panics_if_cull_was_skipped() {
        let mut grid = AggregationGrid::new(11).unwrap();
        let mut batch = WalkerBatch::from_positions(vec![IVec2::new(11, 5)]);
        let mut buf = ContactBuffer::with_len(1);
        buf.mark_stick(0);

        commit_phase(&mut grid, &mut batch, &buf);
    }

    #[test]
    fn respawn_phase_restores_full_batch() {
        let mut rng = rng();
        let center = IVec2::new(30, 30);
        let mut batch = WalkerBatch::from_positions(vec![IVec2::new(31, 30); 5]);
        batch.retire(0);
        batch.retire(4);

        assert_eq!(respawn_phase(&mut batch, center, 8, &mut rng), 2);
        assert_eq!(batch.active_count(), 5);
        assert_eq!(batch.position(1), Some(IVec2::new(31, 30)));
        assert_ne!(batch.position(0), Some(IVec2::new(31, 30)));
    }
}
