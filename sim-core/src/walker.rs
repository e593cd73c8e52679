use crate::types::{Cell, WalkerId};
use glam::DVec2;
use rand::Rng;
use std::f64::consts::TAU;

/// Fixed-capacity population of random walkers.
///
/// Stored as parallel arrays: `positions[i]` and `active[i]` describe slot
/// `i`. An inactive slot keeps whatever position it had when it retired;
/// that data is stale and must be ignored until the slot respawns.
#[derive(Clone, Debug)]
pub struct WalkerBatch {
    pub(crate) positions: Vec<Cell>,
    pub(crate) active: Vec<bool>,
}

impl WalkerBatch {
    /// Builds an all-active batch at the given positions.
    pub fn from_positions(positions: Vec<Cell>) -> Self {
        let active = vec![true; positions.len()];
        Self { positions, active }
    }

    /// Builds a batch of `count` walkers spread uniformly on a circle.
    pub fn on_circle(count: usize, center: Cell, radius: u32, rng: &mut impl Rng) -> Self {
        let positions = (0..count)
            .map(|_| spawn_point(center, radius, rng))
            .collect();
        Self::from_positions(positions)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|&&a| a).count()
    }

    pub fn any_active(&self) -> bool {
        self.active.iter().any(|&a| a)
    }

    #[inline]
    pub fn is_active(&self, id: WalkerId) -> bool {
        self.active[id]
    }

    /// Position of walker `id`, or `None` if the slot is retired.
    #[inline]
    pub fn position(&self, id: WalkerId) -> Option<Cell> {
        self.active[id].then(|| self.positions[id])
    }

    /// Iterates over the positions of active walkers only.
    pub fn active_positions(&self) -> impl Iterator<Item = Cell> + '_ {
        self.positions
            .iter()
            .zip(&self.active)
            .filter_map(|(&p, &a)| a.then_some(p))
    }

    #[inline]
    pub fn retire(&mut self, id: WalkerId) {
        self.active[id] = false;
    }

    /// Places walker `id` on the spawn circle and reactivates it.
    pub fn respawn(&mut self, id: WalkerId, center: Cell, radius: u32, rng: &mut impl Rng) {
        self.positions[id] = spawn_point(center, radius, rng);
        self.active[id] = true;
    }

    /// Respawns every slot, in index order.
    pub fn respawn_all(&mut self, center: Cell, radius: u32, rng: &mut impl Rng) {
        for id in 0..self.len() {
            self.respawn(id, center, radius, rng);
        }
    }
}

/// Picks a uniformly random angle and returns the nearest cell on the
/// circle of `radius` around `center`.
pub fn spawn_point(center: Cell, radius: u32, rng: &mut impl Rng) -> Cell {
    let theta = rng.random_range(0.0..TAU);
    let offset = DVec2::from_angle(theta) * radius as f64;
    (center.as_dvec2() + offset).round().as_ivec2()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec2;
    use rand::{SeedableRng, rngs::SmallRng};

    #[test]
    fn from_positions_marks_all_active() {
        let batch = WalkerBatch::from_positions(vec![IVec2::new(1, 2), IVec2::new(3, 4)]);

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.active_count(), 2);
        assert_eq!(batch.position(1), Some(IVec2::new(3, 4)));
    }

    #[test]
    fn spawn_point_lies_on_circle() {
        let mut rng = SmallRng::seed_from_u64(7);
        let center = IVec2::new(50, 50);

        for _ in 0..500 {
            let p = spawn_point(center, 20, &mut rng);
            let d = (p - center).as_dvec2().length();
            // Rounding moves each axis by at most half a cell.
            assert!((d - 20.0).abs() <= 0.75, "spawned at distance {d}");
        }
    }

    #[test]
    fn on_circle_is_reproducible_for_a_seed() {
        let center = IVec2::new(30, 30);
        let a = WalkerBatch::on_circle(16, center, 6, &mut SmallRng::seed_from_u64(3));
        let b = WalkerBatch::on_circle(16, center, 6, &mut SmallRng::seed_from_u64(3));

        assert_eq!(a.positions, b.positions);
        assert_eq!(a.active_count(), 16);
    }

    #[test]
    fn retire_hides_position_until_respawn() {
        let mut rng = SmallRng::seed_from_u64(1);
        let center = IVec2::new(10, 10);
        let mut batch = WalkerBatch::from_positions(vec![IVec2::new(0, 0); 3]);

        batch.retire(1);
        assert!(!batch.is_active(1));
        assert_eq!(batch.position(1), None);
        assert_eq!(batch.active_count(), 2);
        assert_eq!(batch.active_positions().count(), 2);

        batch.respawn(1, center, 4, &mut rng);
        assert!(batch.is_active(1));
        assert_ne!(batch.position(1), Some(IVec2::new(0, 0)));
        assert_eq!(batch.active_count(), 3);
    }

    #[test]
    fn respawn_all_reactivates_everything() {
        let mut rng = SmallRng::seed_from_u64(9);
        let mut batch = WalkerBatch::from_positions(vec![IVec2::ZERO; 4]);
        for id in 0..4 {
            batch.retire(id);
        }
        assert!(!batch.any_active());

        batch.respawn_all(IVec2::new(20, 20), 6, &mut rng);
        assert_eq!(batch.active_count(), 4);
    }
}
