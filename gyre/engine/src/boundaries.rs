//! Boundary conditions on bounded grid axes.
//!
//! Boundary cells are the first and last row (bounded y) and the first and last
//! column (bounded x). Each is visited exactly once; when both axes are bounded the
//! four corners belong to the rows. Every boundary cell is paired with its nearest
//! interior cell, diagonal for corners, so mirroring only ever reads interior values
//! and applying it twice changes nothing.
//!
//! Periodic axes have no boundary and are skipped even when requested.

use rayon::prelude::*;
use tracing::debug;

use gyre_geo::{CoordinateSystem, Index3};

use crate::attributes::{AttributeKind, AttributeSet, HasAttribute};
use crate::error::ConfigError;
use crate::grid::{Grid, GridReference};

/// One boundary cell and the interior cell it mirrors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundaryCell {
    /// The boundary cell.
    pub cell: usize,
    /// Nearest interior cell.
    pub interior: usize,
    /// Axis this edge bounds: 0 for the first/last column, 1 for the first/last row.
    pub axis: usize,
}

fn effective_bounds<C: CoordinateSystem + ?Sized>(cs: &C, bound_x: bool, bound_y: bool) -> (bool, bool) {
    let has = cs.has_boundary();
    (bound_x && has[0], bound_y && has[1])
}

/// Check that every requested bounded axis has at least one interior cell.
///
/// # Errors
/// [`ConfigError::TooSmallForBoundaries`] if a bounded axis has fewer than 3 cells.
pub fn check_boundary_size<C: CoordinateSystem + ?Sized>(cs: &C, bound_x: bool, bound_y: bool) -> Result<(), ConfigError> {
    let (bx, by) = effective_bounds(cs, bound_x, bound_y);
    let n = cs.num_grid_cells_3d();
    if (bx && n.x < 3) || (by && n.y < 3) {
        return Err(ConfigError::TooSmallForBoundaries { nx: n.x as usize, ny: n.y as usize });
    }
    Ok(())
}

/// Enumerate the boundary cells of the requested axes.
///
/// Rows come first (bottom then top, west to east), then columns (south to north,
/// west edge before east edge). Bounded axes need at least 3 cells, see
/// [`check_boundary_size`].
pub fn boundary_cells<C: CoordinateSystem + ?Sized>(cs: &C, bound_x: bool, bound_y: bool) -> Vec<BoundaryCell> {
    let (bx, by) = effective_bounds(cs, bound_x, bound_y);
    debug_assert!(check_boundary_size(cs, bx, by).is_ok(), "grid too small for boundaries");
    let n = cs.num_grid_cells_3d();
    let mut out = Vec::with_capacity(
        usize::from(by) * 2 * n.x as usize + usize::from(bx) * 2 * n.y as usize,
    );

    // shift an interior candidate off the x edges when x is bounded as well
    let off_x_edge = |x: i32, cell: usize| {
        if bx && x == 0 {
            cs.right_neighbor(cell)
        } else if bx && x == n.x - 1 {
            cs.left_neighbor(cell)
        } else {
            cell
        }
    };

    if by {
        for y in [0, n.y - 1] {
            for x in 0..n.x {
                let cell = cs.cell_id(Index3::new(x, y, 0));
                let inward = if y == 0 { cs.forward_neighbor(cell) } else { cs.backward_neighbor(cell) };
                out.push(BoundaryCell { cell, interior: off_x_edge(x, inward), axis: 1 });
            }
        }
    }

    if bx {
        let rows = if by { 1..n.y - 1 } else { 0..n.y };
        for y in rows {
            for x in [0, n.x - 1] {
                let cell = cs.cell_id(Index3::new(x, y, 0));
                let interior = if x == 0 { cs.right_neighbor(cell) } else { cs.left_neighbor(cell) };
                out.push(BoundaryCell { cell, interior, axis: 0 });
            }
        }
    }
    out
}

/// Write fixed values into the boundary cells of all four buffers. Setup only.
///
/// `value_x` goes into the first/last column, `value_y` into the first/last row
/// (including the corners when both axes are bounded).
pub fn initialize_fixed_value_boundaries<K, B, C>(
    bound_x: bool,
    bound_y: bool,
    value_x: K::Value,
    value_y: K::Value,
    cs: &C,
    grid: &Grid<B>,
) where
    K: AttributeKind,
    B: AttributeSet + HasAttribute<K>,
    C: CoordinateSystem + ?Sized,
{
    for bc in boundary_cells(cs, bound_x, bound_y) {
        let value = if bc.axis == 0 { value_x } else { value_y };
        grid.initialize::<K>(bc.cell, value);
    }
}

/// Copy the nearest interior value of the new time level into every boundary cell of
/// the write buffer (zero-gradient boundary). Sequential.
pub fn handle_mirrored_boundaries<K, B, C>(bound_x: bool, bound_y: bool, cs: &C, grid: &Grid<B>)
where
    K: AttributeKind,
    B: AttributeSet + HasAttribute<K>,
    C: CoordinateSystem + ?Sized,
{
    for bc in boundary_cells(cs, bound_x, bound_y) {
        grid.write::<K>(bc.cell, grid.read_next::<K>(bc.interior));
    }
}

/// Parallel [`handle_mirrored_boundaries`] through a grid reference.
pub fn handle_mirrored_boundaries_par<K, B, C>(bound_x: bool, bound_y: bool, cs: &C, grid: GridReference<'_, B>)
where
    K: AttributeKind,
    B: AttributeSet + HasAttribute<K>,
    C: CoordinateSystem + ?Sized,
{
    MirroredBoundary::from_cells(boundary_cells(cs, bound_x, bound_y)).apply_par::<K, B>(grid);
}

/// Precomputed boundary cells for repeated use by a simulation loop.
#[derive(Clone, Debug, Default)]
pub struct MirroredBoundary {
    cells: Vec<BoundaryCell>,
}

impl MirroredBoundary {
    /// Enumerate once.
    ///
    /// # Errors
    /// [`ConfigError::TooSmallForBoundaries`] if a bounded axis has fewer than 3 cells.
    pub fn new<C: CoordinateSystem + ?Sized>(cs: &C, bound_x: bool, bound_y: bool) -> Result<Self, ConfigError> {
        check_boundary_size(cs, bound_x, bound_y)?;
        let cells = boundary_cells(cs, bound_x, bound_y);
        debug!(cells = cells.len(), bound_x, bound_y, "[boundary] mirrored edges");
        Ok(Self { cells })
    }

    fn from_cells(cells: Vec<BoundaryCell>) -> Self {
        Self { cells }
    }

    /// The enumerated cells.
    pub fn cells(&self) -> &[BoundaryCell] {
        &self.cells
    }

    /// Sequential mirroring on the write buffer.
    pub fn apply<K, B>(&self, grid: &Grid<B>)
    where
        K: AttributeKind,
        B: AttributeSet + HasAttribute<K>,
    {
        self.apply_ref::<K, B>(grid.grid_reference());
    }

    /// Sequential mirroring through a grid reference.
    pub fn apply_ref<K, B>(&self, grid: GridReference<'_, B>)
    where
        K: AttributeKind,
        B: AttributeSet + HasAttribute<K>,
    {
        for bc in &self.cells {
            grid.write::<K>(bc.cell, grid.read_next::<K>(bc.interior));
        }
    }

    /// Parallel mirroring; boundary cells are disjoint from their interior sources so
    /// the order of writes does not matter.
    pub fn apply_par<K, B>(&self, grid: GridReference<'_, B>)
    where
        K: AttributeKind,
        B: AttributeSet + HasAttribute<K>,
    {
        self.cells.par_iter().for_each(|bc| {
            grid.write::<K>(bc.cell, grid.read_next::<K>(bc.interior));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gyre_geo::{CartesianCoordinates2D, GeographicCoordinates2D, Vec2};

    fn grid_5x4() -> CartesianCoordinates2D {
        CartesianCoordinates2D::bounded(Vec2::ZERO, Vec2::new(5.0, 4.0), [5, 4])
    }

    #[test]
    fn each_edge_cell_once() {
        let cs = grid_5x4();
        let cells = boundary_cells(&cs, true, true);
        assert_eq!(cells.len(), 2 * 5 + 2 * 4 - 4);
        let mut ids: Vec<usize> = cells.iter().map(|b| b.cell).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), cells.len());
        for b in &cells {
            let i = cs.cell_id_3d(b.interior);
            assert!(i.x > 0 && i.x < 4 && i.y > 0 && i.y < 3, "{b:?}");
        }
    }

    #[test]
    fn corners_map_to_diagonal() {
        let cs = grid_5x4();
        let cells = boundary_cells(&cs, true, true);
        let corner = cells.iter().find(|b| b.cell == 0).map(|b| b.interior);
        assert_eq!(corner, Some(cs.cell_id(Index3::new(1, 1, 0))));
        let corner = cells.iter().find(|b| b.cell == 19).map(|b| b.interior);
        assert_eq!(corner, Some(cs.cell_id(Index3::new(3, 2, 0))));
    }

    #[test]
    fn periodic_axes_are_skipped() {
        let cs = GeographicCoordinates2D::global([8, 6], 1.0);
        let cells = boundary_cells(&cs, true, true);
        assert_eq!(cells.len(), 16);
        assert!(cells.iter().all(|b| b.axis == 1));
    }

    #[test]
    fn too_small_grid_is_rejected() {
        let cs = CartesianCoordinates2D::bounded(Vec2::ZERO, Vec2::new(2.0, 5.0), [2, 5]);
        assert_eq!(
            MirroredBoundary::new(&cs, true, false).map(|b| b.cells().len()),
            Err(ConfigError::TooSmallForBoundaries { nx: 2, ny: 5 })
        );
        assert!(MirroredBoundary::new(&cs, false, true).is_ok());
    }
}
