//! Occupancy grids and their placement in the world.
//!
//! An [`OccupancyGrid`] is a rectangular raster of free/occupied cells, row 0
//! being the top row of the source image. A [`Placement`] says how large a
//! cell is and where the grid sits in world coordinates.

use std::fmt;
use std::str::FromStr;

use nalgebra::Point2;

use crate::error::{Result, WallError};

/// A rectangular binary occupancy grid, `true` meaning occupied.
///
/// Cells are stored row-major. The grid is immutable once built; the only
/// derived grid the pipeline needs is [`OccupancyGrid::flipped_vertically`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    /// Create a grid from row-major cells.
    ///
    /// Fails with [`WallError::InvalidGrid`] when either dimension is zero or
    /// the cell count does not match `rows * cols`.
    pub fn new(rows: usize, cols: usize, cells: Vec<bool>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(WallError::invalid_grid(format!(
                "grid must not be empty (got {rows}x{cols})"
            )));
        }
        let expected = rows
            .checked_mul(cols)
            .ok_or_else(|| WallError::invalid_grid(format!("{rows}x{cols} grid is too large")))?;
        if cells.len() != expected {
            return Err(WallError::invalid_grid(format!(
                "{} cells do not fill a {rows}x{cols} grid",
                cells.len()
            )));
        }
        Ok(Self { rows, cols, cells })
    }

    /// Create a grid from nested rows, rejecting ragged input.
    pub fn from_rows<R: AsRef<[bool]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(WallError::invalid_grid(format!(
                    "row {i} has {} cells, expected {cols}",
                    row.len()
                )));
            }
            cells.extend_from_slice(row);
        }
        Self::new(rows.len(), cols, cells)
    }

    /// Create a grid by evaluating `f(row, col)` for every cell.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> bool) -> Result<Self> {
        let mut cells = Vec::with_capacity(rows.saturating_mul(cols));
        for r in 0..rows {
            for c in 0..cols {
                cells.push(f(r, c));
            }
        }
        Self::new(rows, cols, cells)
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether cell `(row, col)` is occupied. Out-of-range cells are free.
    #[inline]
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.cells[row * self.cols + col]
    }

    /// The cells of one row.
    #[inline]
    pub fn row(&self, row: usize) -> &[bool] {
        &self.cells[row * self.cols..(row + 1) * self.cols]
    }

    /// Number of occupied cells.
    pub fn num_occupied(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// The same grid with row order reversed.
    ///
    /// Image rows grow downward while model-space y grows upward, so the
    /// pipeline flips the grid before meshing.
    pub fn flipped_vertically(&self) -> Self {
        let mut cells = Vec::with_capacity(self.cells.len());
        for r in (0..self.rows).rev() {
            cells.extend_from_slice(self.row(r));
        }
        Self {
            rows: self.rows,
            cols: self.cols,
            cells,
        }
    }
}

/// Parses the text form used in tests and fixtures: one line per row, `#`
/// for occupied and `.` for free. Surrounding whitespace is ignored.
impl FromStr for OccupancyGrid {
    type Err = WallError;

    fn from_str(s: &str) -> Result<Self> {
        let rows = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(r, line)| {
                line.chars()
                    .map(|ch| match ch {
                        '#' => Ok(true),
                        '.' => Ok(false),
                        other => Err(WallError::invalid_grid(format!(
                            "unexpected character {other:?} in row {r}"
                        ))),
                    })
                    .collect::<Result<Vec<bool>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_rows(&rows)
    }
}

impl fmt::Display for OccupancyGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            for &cell in self.row(r) {
                f.write_str(if cell { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Where the grid sits in the world.
///
/// Applied as scale, then translation, then rotation about `pivot`:
/// `p' = R(theta) * (cell_size * p + origin - pivot) + pivot`.
/// With the default pivot at the global origin this is
/// `p' = R(theta) * (cell_size * p + origin)`, which is not the usual
/// rotate-then-translate pose composition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Edge length of one cell in world units (map resolution).
    pub cell_size: f64,
    /// Translation along x.
    pub origin_x: f64,
    /// Translation along y.
    pub origin_y: f64,
    /// Rotation about +z in radians.
    pub origin_theta: f64,
    /// Point the rotation turns about.
    pub pivot: Point2<f64>,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            cell_size: 1.0,
            origin_x: 0.0,
            origin_y: 0.0,
            origin_theta: 0.0,
            pivot: Point2::origin(),
        }
    }
}

impl Placement {
    /// Create a placement rotating about the global origin.
    pub fn new(cell_size: f64, origin_x: f64, origin_y: f64, origin_theta: f64) -> Self {
        Self {
            cell_size,
            origin_x,
            origin_y,
            origin_theta,
            pivot: Point2::origin(),
        }
    }

    /// Placement from a map resolution and a ROS `[x, y, theta]` origin.
    pub fn from_origin(resolution: f64, origin: [f64; 3]) -> Self {
        Self::new(resolution, origin[0], origin[1], origin[2])
    }

    /// Rotate about `pivot` instead of the global origin.
    pub fn with_pivot(mut self, pivot: Point2<f64>) -> Self {
        self.pivot = pivot;
        self
    }

    /// Reject placements that cannot position a grid.
    pub fn validate(&self) -> Result<()> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(WallError::invalid_placement(format!(
                "cell size must be positive, got {}",
                self.cell_size
            )));
        }
        let finite = [self.origin_x, self.origin_y, self.origin_theta, self.pivot.x, self.pivot.y]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(WallError::invalid_placement(
                "origin, rotation and pivot must be finite",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let grid: OccupancyGrid = "
            #.#
            ...
        "
        .parse()
        .unwrap();
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.cols(), 3);
        assert_eq!(grid.num_occupied(), 2);
        assert!(grid.is_occupied(0, 2));
        assert!(!grid.is_occupied(1, 0));
        assert!(!grid.is_occupied(5, 5));
        assert_eq!(grid.to_string(), "#.#\n...\n");
    }

    #[test]
    fn test_empty_grid_rejected() {
        assert!(matches!(
            OccupancyGrid::new(0, 3, vec![]),
            Err(WallError::InvalidGrid { .. })
        ));
        let no_rows: [Vec<bool>; 0] = [];
        assert!(OccupancyGrid::from_rows(&no_rows).is_err());
        assert!(OccupancyGrid::from_rows(&[Vec::<bool>::new()]).is_err());
    }

    #[test]
    fn test_ragged_grid_rejected() {
        let rows = vec![vec![true, false], vec![true]];
        let err = OccupancyGrid::from_rows(&rows).unwrap_err();
        assert!(matches!(err, WallError::InvalidGrid { .. }));
        assert!(OccupancyGrid::new(2, 2, vec![true; 3]).is_err());
        assert!("#.\n#".parse::<OccupancyGrid>().is_err());
        assert!("#x".parse::<OccupancyGrid>().is_err());
    }

    #[test]
    fn test_flip_vertically() {
        let grid: OccupancyGrid = "##\n.#\n..".parse().unwrap();
        let flipped = grid.flipped_vertically();
        assert_eq!(flipped.to_string(), "..\n.#\n##\n");
        assert_eq!(flipped.flipped_vertically(), grid);
    }

    #[test]
    fn test_from_fn() {
        let grid = OccupancyGrid::from_fn(3, 3, |r, c| r == c).unwrap();
        assert_eq!(grid.num_occupied(), 3);
        assert!(grid.is_occupied(1, 1));
    }

    #[test]
    fn test_placement_validation() {
        assert!(Placement::default().validate().is_ok());
        assert!(Placement::new(0.05, -10.0, 3.0, 0.5).validate().is_ok());
        assert!(matches!(
            Placement::new(0.0, 0.0, 0.0, 0.0).validate(),
            Err(WallError::InvalidPlacement { .. })
        ));
        assert!(Placement::new(-1.0, 0.0, 0.0, 0.0).validate().is_err());
        assert!(Placement::new(f64::NAN, 0.0, 0.0, 0.0).validate().is_err());
        assert!(Placement::new(1.0, f64::INFINITY, 0.0, 0.0).validate().is_err());
    }

    #[test]
    fn test_from_origin() {
        let p = Placement::from_origin(0.05, [-1.0, 2.0, 0.25]);
        assert_eq!(p.cell_size, 0.05);
        assert_eq!(p.origin_x, -1.0);
        assert_eq!(p.origin_y, 2.0);
        assert_eq!(p.origin_theta, 0.25);
        assert_eq!(p.pivot, Point2::origin());
    }
}
