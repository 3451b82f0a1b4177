use crate::core::error::ValidationError;
use itertools::iproduct;
use nalgebra::Point3;
use std::collections::HashMap;

type CellKey = (i32, i32, i32);

/// Grid-based spatial index over atom positions.
///
/// Space is divided into cubic cells of edge `cell_size`, keyed by floored
/// integer coordinates. With `cell_size` equal to the search cutoff, every
/// point within the cutoff of a query lies in the query's cell or one of its
/// 26 neighbours.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    inv_cell_size: f64,
    cells: HashMap<CellKey, Vec<u32>>,
}

impl SpatialGrid {
    /// Creates an empty grid.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCutoff`] unless `cell_size` is
    /// positive and finite.
    pub fn new(cell_size: f64) -> Result<Self, ValidationError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(ValidationError::InvalidCutoff(cell_size));
        }
        Ok(Self {
            inv_cell_size: 1.0 / cell_size,
            cells: HashMap::new(),
        })
    }

    /// Creates a grid holding every point, keyed by its position in `points`.
    pub fn from_points<I>(points: I, cell_size: f64) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = Point3<f64>>,
    {
        let mut grid = Self::new(cell_size)?;
        for (index, point) in points.into_iter().enumerate() {
            grid.insert(index as u32, &point);
        }
        Ok(grid)
    }

    fn cell_of(&self, point: &Point3<f64>) -> CellKey {
        (
            (point.x * self.inv_cell_size).floor() as i32,
            (point.y * self.inv_cell_size).floor() as i32,
            (point.z * self.inv_cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, index: u32, point: &Point3<f64>) {
        let cell = self.cell_of(point);
        self.cells.entry(cell).or_default().push(index);
    }

    /// Number of occupied cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Indices stored in the cell containing `point` and its 26 neighbours.
    ///
    /// This is a superset of the points within one cell edge of `point`;
    /// callers filter by exact distance.
    pub fn neighbors(&self, point: &Point3<f64>) -> impl Iterator<Item = u32> + '_ {
        let (cx, cy, cz) = self.cell_of(point);
        iproduct!(-1..=1, -1..=1, -1..=1)
            .filter_map(move |(dx, dy, dz): (i32, i32, i32)| {
                self.cells.get(&(
                    cx.saturating_add(dx),
                    cy.saturating_add(dy),
                    cz.saturating_add(dz),
                ))
            })
            .flatten()
            .copied()
    }
}
