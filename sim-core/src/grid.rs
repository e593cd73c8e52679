use crate::error::SimError;
use crate::types::Cell;
use glam::IVec2;

/// Square occupancy field holding the growing aggregate.
///
/// The grid is seeded with a single occupied cell at its center and only
/// ever gains cells. Alongside the flags it tracks:
///
/// - `particles_added` - how many cells have been occupied, seed included.
/// - `max_radius` - `floor(distance) + 1` of the farthest occupied cell
///   from the center. Never decreases and is at least `1`.
///
/// Cells are stored row-major: `(x, y)` lives at `y * side + x`.
#[derive(Clone, Debug)]
pub struct AggregationGrid {
    side: usize,
    center: usize,
    cells: Vec<bool>,
    particles_added: u64,
    max_radius: u32,
}

impl AggregationGrid {
    /// Creates a `side × side` grid with only the center cell occupied.
    ///
    /// ### Parameters
    /// - `side` - Grid side length; must be odd and at least `3`.
    ///
    /// ### Returns
    /// The seeded grid, or [`SimError::InvalidDimension`] for an even or
    /// too-small side.
    pub fn new(side: usize) -> Result<Self, SimError> {
        if side < 3 {
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

        let center = side / 2;
        let mut cells = vec![false; side * side];
        cells[center * side + center] = true;

        Ok(Self {
            side,
            center,
            cells,
            particles_added: 1,
            max_radius: 1,
        })
    }

    /// Clears every cell except the seed and resets the counters.
    pub fn reset(&mut self) {
        self.cells.fill(false);
        self.cells[self.center * self.side + self.center] = true;
        self.particles_added = 1;
        self.max_radius = 1;
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn center(&self) -> usize {
        self.center
    }

    /// The seed cell as a grid coordinate.
    pub fn center_cell(&self) -> Cell {
        IVec2::splat(self.center as i32)
    }

    pub fn particles_added(&self) -> u64 {
        self.particles_added
    }

    pub fn max_radius(&self) -> u32 {
        self.max_radius
    }

    /// Returns `true` if `cell` lies inside the grid.
    #[inline]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        let side = self.side as i64;
        let (x, y) = (cell.x as i64, cell.y as i64);
        x >= 0 && y >= 0 && x < side && y < side
    }

    #[inline]
    fn index(&self, cell: Cell) -> Option<usize> {
        self.in_bounds(cell)
            .then(|| cell.y as usize * self.side + cell.x as usize)
    }

    /// Returns whether `cell` is occupied.
    ///
    /// Coordinates outside the grid read as unoccupied, so neighbor probes
    /// near the border need no special casing.
    #[inline]
    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|i| self.cells[i])
    }

    /// Marks `cell` as occupied.
    ///
    /// Idempotent: an already occupied cell is left as is and nothing is
    /// counted. On a fresh occupation `particles_added` is incremented and
    /// `max_radius` grows to cover the cell.
    ///
    /// ### Returns
    /// `true` if the cell transitioned from unoccupied to occupied.
    ///
    /// ### Panics
    /// Panics if `cell` lies outside the grid. The step algorithm culls
    /// walkers near the border before committing, so reaching this is a bug.
    pub fn occupy(&mut self, cell: Cell) -> bool {
        match self.try_occupy(cell) {
            Some(newly) => newly,
            None => panic!(
                "occupy out of bounds: {cell} on a {side}x{side} grid",
                side = self.side
            ),
        }
    }

    /// Non-panicking form of [`AggregationGrid::occupy`].
    ///
    /// ### Returns
    /// - `None` if `cell` lies outside the grid.
    /// - `Some(true)` on a fresh occupation, `Some(false)` if it was
    ///   already occupied.
    pub fn try_occupy(&mut self, cell: Cell) -> Option<bool> {
        let i = self.index(cell)?;
        if self.cells[i] {
            return Some(false);
        }

        self.cells[i] = true;
        self.particles_added += 1;

        let d2 = (cell - self.center_cell()).as_i64vec2().length_squared();
        let r = (d2 as f64).sqrt() as u32;
        self.max_radius = self.max_radius.max(r + 1);

        Some(true)
    }

    /// Borrows a read-only view of the occupancy flags.
    pub fn snapshot(&self) -> GridSnapshot<'_> {
        GridSnapshot {
            side: self.side,
            cells: &self.cells,
        }
    }
}

/// Read-only, point-in-time view of a grid's occupancy flags.
///
/// Borrowing the grid guarantees the view cannot change underneath a
/// reader. Clone the [`AggregationGrid`] to hand a copy to another thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSnapshot<'a> {
    side: usize,
    cells: &'a [bool],
}

impl<'a> GridSnapshot<'a> {
    /// Wraps a row-major `side × side` flag slice.
    ///
    /// ### Returns
    /// `None` if `cells.len() != side * side`.
    pub fn from_cells(side: usize, cells: &'a [bool]) -> Option<Self> {
        (cells.len() == side * side).then_some(Self { side, cells })
    }

    pub fn side(&self) -> usize {
        self.side
    }

    /// Row-major occupancy flags, `y * side + x`.
    pub fn cells(&self) -> &'a [bool] {
        self.cells
    }

    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        x < self.side && y < self.side && self.cells[y * self.side + x]
    }

    /// One row of flags.
    ///
    /// ### Panics
    /// Panics if `y >= side`.
    pub fn row(&self, y: usize) -> &'a [bool] {
        &self.cells[y * self.side..(y + 1) * self.side]
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}
