use glam::IVec2;

/// Identifier for a walker slot in a [`crate::walker::WalkerBatch`].
///
/// This is an index into the batch's parallel arrays, and is only
/// meaningful within the lifetime of a given batch. Slots are reused
/// when a walker retires and respawns.
pub type WalkerId = usize;

/// Integer grid coordinate `(x, y)`.
pub type Cell = IVec2;

/// The four axis-aligned unit steps: up, down, right, left.
///
/// Used both for the random walk and for the contact probe.
pub const NEIGHBOR_OFFSETS: [Cell; 4] = [
    IVec2::new(0, 1),
    IVec2::new(0, -1),
    IVec2::new(1, 0),
    IVec2::new(-1, 0),
];
