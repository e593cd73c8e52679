//! Box-counting fractal dimension of an occupancy snapshot.
//!
//! The estimate is for display only and never feeds back into growth.

use crate::grid::GridSnapshot;
use tracing::trace;

/// Returned when the box-count series is too short or contains an empty
/// count. This is the literature dimension of pure DLA clusters, used as a
/// best guess rather than an error.
pub const FALLBACK_DIMENSION: f64 = 1.71;

/// Smallest box size used by drivers that do not pick one.
pub const DEFAULT_MIN_BOX_SIZE: usize = 2;

/// Doubling sequence `min, 2·min, 4·min, …` of sizes not exceeding `max`.
///
/// A `min` of zero is treated as `1`.
pub fn box_sizes(min_box_size: usize, max_box_size: usize) -> Vec<usize> {
    let mut sizes = Vec::new();
    let mut size = min_box_size.max(1);
    while size <= max_box_size {
        sizes.push(size);
        size = match size.checked_mul(2) {
            Some(next) => next,
            None => break,
        };
    }
    sizes
}

/// Number of `s × s` tiles containing at least one occupied cell.
///
/// Tiles start at the origin; the last row and column of tiles may be
/// truncated by the grid edge. A `box_size` of zero is treated as `1`.
pub fn count_occupied_boxes(snapshot: &GridSnapshot<'_>, box_size: usize) -> usize {
    let box_size = box_size.max(1);
    let side = snapshot.side();
    let tiles = side.div_ceil(box_size);
    let mut hit = vec![false; tiles * tiles];

    for y in 0..side {
        let tile_row = (y / box_size) * tiles;
        for (x, &occupied) in snapshot.row(y).iter().enumerate() {
            if occupied {
                hit[tile_row + x / box_size] = true;
            }
        }
    }

    hit.iter().filter(|&&h| h).count()
}

/// Occupied-box count for each size in `sizes`.
pub fn box_counts(snapshot: &GridSnapshot<'_>, sizes: &[usize]) -> Vec<usize> {
    sizes
        .iter()
        .map(|&s| count_occupied_boxes(snapshot, s))
        .collect()
}

/// Estimates the box-counting dimension of the occupied cells.
///
/// Box sizes double from `min_box_size` up to `max_box_size`
/// (default `side / 8`). The dimension is the least-squares slope of
/// `ln(count)` against `ln(1 / size)`.
///
/// ### Returns
/// The fitted slope, or [`FALLBACK_DIMENSION`] if fewer than two sizes fit
/// in the range or any size yields an empty count.
pub fn estimate_fractal_dimension(
    snapshot: &GridSnapshot<'_>,
    min_box_size: usize,
    max_box_size: Option<usize>,
) -> f64 {
    let max_box_size = max_box_size.unwrap_or(snapshot.side() / 8);
    let sizes = box_sizes(min_box_size, max_box_size);
    if sizes.len() < 2 {
        trace!(min_box_size, max_box_size, "too few box sizes, using fallback");
        return FALLBACK_DIMENSION;
    }

    let counts = box_counts(snapshot, &sizes);
    if counts.contains(&0) {
        trace!(?counts, "empty box count, using fallback");
        return FALLBACK_DIMENSION;
    }

    let points: Vec<(f64, f64)> = sizes
        .iter()
        .zip(&counts)
        .map(|(&s, &c)| ((1.0 / s as f64).ln(), (c as f64).ln()))
        .collect();
    least_squares_slope(&points)
}

/// Slope of the ordinary least-squares line through `points`.
///
/// Callers guarantee at least two points with distinct `x`.
fn least_squares_slope(points: &[(f64, f64)]) -> f64 {
    let n = points.len() as f64;
    let (sx, sy, sxx, sxy) = points
        .iter()
        .fold((0.0, 0.0, 0.0, 0.0), |(sx, sy, sxx, sxy), &(x, y)| {
            (sx + x, sy + y, sxx + x * x, sxy + x * y)
        });
    (n * sxy - sx * sy) / (n * sxx - sx * sx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(side: usize, fill: impl Fn(usize, usize) -> bool) -> Vec<bool> {
        (0..side * side).map(|i| fill(i % side, i / side)).collect()
    }

    #[test]
    fn box_sizes_double_up_to_inclusive_max() {
        assert_eq!(box_sizes(2, 16), vec![2, 4, 8, 16]);
        assert_eq!(box_sizes(2, 15), vec![2, 4, 8]);
        assert_eq!(box_sizes(3, 3), vec![3]);
        assert_eq!(box_sizes(0, 4), vec![1, 2, 4]);
        assert!(box_sizes(8, 4).is_empty());
    }

    #[test]
    fn count_includes_truncated_edge_tiles() {
        // 5x5 grid, 2x2 tiles -> 3x3 tiles with the last ones truncated.
        let cells = grid_with(5, |x, y| (x, y) == (4, 4) || (x, y) == (0, 0));
        let snap = GridSnapshot::from_cells(5, &cells).unwrap();

        assert_eq!(count_occupied_boxes(&snap, 2), 2);
        assert_eq!(count_occupied_boxes(&snap, 1), 2);
        assert_eq!(count_occupied_boxes(&snap, 5), 1);
    }

    #[test]
    fn zero_box_size_counts_single_cells() {
        let cells = grid_with(5, |x, y| x == y);
        let snap = GridSnapshot::from_cells(5, &cells).unwrap();

        assert_eq!(count_occupied_boxes(&snap, 0), 5);
        assert_eq!(box_counts(&snap, &[0, 1]), vec![5, 5]);
    }

    #[test]
    fn filled_square_is_two_dimensional() {
        let side = 129;
        let cells = grid_with(side, |x, y| x < 64 && y < 64);
        let snap = GridSnapshot::from_cells(side, &cells).unwrap();

        let d = estimate_fractal_dimension(&snap, 1, None);
        assert!((d - 2.0).abs() < 0.15, "square gave {d}");
    }

    #[test]
    fn line_is_one_dimensional() {
        let side = 129;
        let cells = grid_with(side, |x, y| y == 40 && x < 64);
        let snap = GridSnapshot::from_cells(side, &cells).unwrap();

        let d = estimate_fractal_dimension(&snap, 1, None);
        assert!((d - 1.0).abs() < 0.15, "line gave {d}");
    }

    #[test]
    fn empty_grid_falls_back() {
        let cells = vec![false; 65 * 65];
        let snap = GridSnapshot::from_cells(65, &cells).unwrap();

        assert_eq!(estimate_fractal_dimension(&snap, 2, None), FALLBACK_DIMENSION);
    }

    #[test]
    fn single_box_size_falls_back() {
        let cells = vec![true; 15 * 15];
        let snap = GridSnapshot::from_cells(15, &cells).unwrap();

        // side / 8 = 1 < min 2: no sizes at all.
        assert_eq!(estimate_fractal_dimension(&snap, 2, None), FALLBACK_DIMENSION);
        // Exactly one size.
        assert_eq!(estimate_fractal_dimension(&snap, 4, Some(7)), FALLBACK_DIMENSION);
    }

    #[test]
    fn explicit_max_box_size_is_honored() {
        let side = 129;
        let cells = grid_with(side, |x, y| x < 64 && y < 64);
        let snap = GridSnapshot::from_cells(side, &cells).unwrap();

        let d = estimate_fractal_dimension(&snap, 2, Some(64));
        assert!((d - 2.0).abs() < 1e-9, "aligned square gave {d}");
    }

    #[test]
    fn least_squares_recovers_exact_line() {
        let points = [(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)];
        assert!((least_squares_slope(&points) - 2.0).abs() < 1e-12);
    }
}
