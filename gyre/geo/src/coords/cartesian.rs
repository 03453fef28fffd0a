use super::{locate_axis, step_axis, CoordinateSystem, CsKind};
use crate::math::{Index3, Vec2, Vec3};

/// 2D cartesian grid in the x-y plane.
///
/// Each axis is either bounded (neighbour lookups clamp at the edge) or periodic
/// (neighbour lookups wrap around).
#[derive(Clone, Debug, PartialEq)]
pub struct CartesianCoordinates2D {
    min: Vec2,
    max: Vec2,
    cells: [i32; 2],
    total: usize,
    cell_size: Vec2,
    periodic: [bool; 2],
}

impl CartesianCoordinates2D {
    /// Build from the lower and upper corner, the cell count per axis and the
    /// periodicity per axis.
    ///
    /// # Panics
    /// Panics if a cell count is zero or a bound is inverted. Validated configs
    /// (see `engine::config`) never hit this.
    #[must_use]
    pub fn new(min: Vec2, max: Vec2, cells: [usize; 2], periodic: [bool; 2]) -> Self {
        assert!(cells[0] > 0 && cells[1] > 0, "cartesian grid needs at least one cell per axis");
        assert!(max.x > min.x && max.y > min.y, "cartesian bounds are inverted");
        let nx = i32::try_from(cells[0]).unwrap_or(i32::MAX);
        let ny = i32::try_from(cells[1]).unwrap_or(i32::MAX);
        let size = max - min;
        Self {
            min,
            max,
            cells: [nx, ny],
            total: cells[0] * cells[1],
            cell_size: Vec2::new(size.x / nx as f32, size.y / ny as f32),
            periodic,
        }
    }

    /// Bounded on both axes.
    #[must_use]
    pub fn bounded(min: Vec2, max: Vec2, cells: [usize; 2]) -> Self {
        Self::new(min, max, cells, [false, false])
    }

    #[inline]
    fn step(&self, cell: usize, dx: i32, dy: i32) -> usize {
        let id = self.cell_id_3d(cell);
        self.cell_id(Index3::new(
            step_axis(id.x, dx, self.cells[0], self.periodic[0]),
            step_axis(id.y, dy, self.cells[1], self.periodic[1]),
            0,
        ))
    }
}

impl CoordinateSystem for CartesianCoordinates2D {
    fn cartesian(&self, coord: Vec3) -> Vec3 {
        Vec3::new(coord.x, coord.y, 0.0)
    }
    fn coord(&self, cartesian: Vec3) -> Vec3 {
        Vec3::new(cartesian.x, cartesian.y, 0.0)
    }

    fn unit_vector_x(&self, _position: Vec3) -> Vec3 {
        Vec3::new(1.0, 0.0, 0.0)
    }
    fn unit_vector_y(&self, _position: Vec3) -> Vec3 {
        Vec3::new(0.0, 1.0, 0.0)
    }
    fn unit_vector_z(&self, _position: Vec3) -> Vec3 {
        Vec3::new(0.0, 0.0, 1.0)
    }

    fn cell_coordinate_3d(&self, id: Index3) -> Vec3 {
        Vec3::new(
            self.min.x + (id.x as f32 + 0.5) * self.cell_size.x,
            self.min.y + (id.y as f32 + 0.5) * self.cell_size.y,
            0.0,
        )
    }
    fn cell_id(&self, id: Index3) -> usize {
        debug_assert!(id.x >= 0 && id.x < self.cells[0] && id.y >= 0 && id.y < self.cells[1]);
        (id.y * self.cells[0] + id.x) as usize
    }
    fn cell_id_3d(&self, cell: usize) -> Index3 {
        debug_assert!(cell < self.total);
        let c = cell as i32;
        Index3::new(c % self.cells[0], c / self.cells[0], 0)
    }
    fn cell_id_3d_at(&self, coord: Vec3) -> Index3 {
        Index3::new(
            locate_axis(coord.x, self.min.x, self.max.x, self.cell_size.x, self.cells[0], self.periodic[0]),
            locate_axis(coord.y, self.min.y, self.max.y, self.cell_size.y, self.cells[1], self.periodic[1]),
            0,
        )
    }

    fn right_neighbor(&self, cell: usize) -> usize {
        self.step(cell, 1, 0)
    }
    fn left_neighbor(&self, cell: usize) -> usize {
        self.step(cell, -1, 0)
    }
    fn forward_neighbor(&self, cell: usize) -> usize {
        self.step(cell, 0, 1)
    }
    fn backward_neighbor(&self, cell: usize) -> usize {
        self.step(cell, 0, -1)
    }

    fn min_coord(&self) -> Vec3 {
        self.min.extend(0.0)
    }
    fn max_coord(&self) -> Vec3 {
        self.max.extend(0.0)
    }
    fn num_grid_cells(&self) -> usize {
        self.total
    }
    fn num_grid_cells_3d(&self) -> Index3 {
        Index3::new(self.cells[0], self.cells[1], 1)
    }
    fn has_boundary(&self) -> [bool; 3] {
        [!self.periodic[0], !self.periodic[1], false]
    }

    fn cell_size(&self) -> Vec3 {
        self.cell_size.extend(0.0)
    }
    fn cell_size_at(&self, _position: Vec3) -> Vec3 {
        self.cell_size()
    }
    fn dimension(&self) -> usize {
        2
    }
    fn cartesian_dimension(&self) -> usize {
        2
    }

    fn aabb_min(&self) -> Vec3 {
        self.min.extend(0.0)
    }
    fn aabb_max(&self) -> Vec3 {
        self.max.extend(0.0)
    }

    fn kind(&self) -> CsKind {
        CsKind::Cartesian2d
    }
    fn shader_define(&self) -> &'static str {
        "CARTESIAN_COORDINATES_2D"
    }
}
