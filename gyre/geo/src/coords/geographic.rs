use std::f32::consts::{FRAC_PI_2, TAU};

use super::{locate_axis, step_axis, CoordinateSystem, CsKind};
use crate::math::{cart_to_geo, geo_to_cart, Index3, Vec3};

/// Longitude/latitude grid on a sphere shell (one layer).
///
/// First coordinate is longitude in `[0, 2π)` and wraps around, second is latitude in
/// `[min_lat, max_lat] ⊆ [-π/2, π/2]` and is bounded, third is the radius.
/// Cells are row major, rows run from `min_lat` northwards.
#[derive(Clone, Debug, PartialEq)]
pub struct GeographicCoordinates2D {
    radius: f32,
    cells: [i32; 2],
    total: usize,
    min: Vec3,
    max: Vec3,
    cell_size: Vec3,
}

impl GeographicCoordinates2D {
    /// Build from the latitude range, the number of cells along longitude and
    /// latitude, and the sphere radius.
    ///
    /// # Panics
    /// Panics on zero cell counts, a non-positive radius or a latitude range that is
    /// inverted or leaves `[-π/2, π/2]`.
    #[must_use]
    pub fn new(min_lat: f32, max_lat: f32, cells: [usize; 2], radius: f32) -> Self {
        assert!(cells[0] > 0 && cells[1] > 0, "geographic grid needs at least one cell per axis");
        assert!(radius > 0.0, "sphere radius must be positive");
        assert!(
            -FRAC_PI_2 <= min_lat && min_lat < max_lat && max_lat <= FRAC_PI_2,
            "latitude range must be increasing and inside [-pi/2, pi/2]"
        );
        let nx = i32::try_from(cells[0]).unwrap_or(i32::MAX);
        let ny = i32::try_from(cells[1]).unwrap_or(i32::MAX);
        Self {
            radius,
            cells: [nx, ny],
            total: cells[0] * cells[1],
            min: Vec3::new(0.0, min_lat, radius),
            max: Vec3::new(TAU, max_lat, radius),
            cell_size: Vec3::new(TAU / nx as f32, (max_lat - min_lat) / ny as f32, 0.0),
        }
    }

    /// Whole sphere, pole to pole.
    #[must_use]
    pub fn global(cells: [usize; 2], radius: f32) -> Self {
        Self::new(-FRAC_PI_2, FRAC_PI_2, cells, radius)
    }

    /// Radius of the sphere shell.
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    fn step(&self, cell: usize, dx: i32, dy: i32) -> usize {
        let id = self.cell_id_3d(cell);
        self.cell_id(Index3::new(
            step_axis(id.x, dx, self.cells[0], true),
            step_axis(id.y, dy, self.cells[1], false),
            0,
        ))
    }
}

impl CoordinateSystem for GeographicCoordinates2D {
    fn cartesian(&self, coord: Vec3) -> Vec3 {
        geo_to_cart(coord)
    }
    fn coord(&self, cartesian: Vec3) -> Vec3 {
        cart_to_geo(cartesian)
    }

    fn unit_vector_x(&self, position: Vec3) -> Vec3 {
        let (slon, clon) = position.x.sin_cos();
        Vec3::new(-slon, clon, 0.0)
    }
    fn unit_vector_y(&self, position: Vec3) -> Vec3 {
        let (slon, clon) = position.x.sin_cos();
        let (slat, clat) = position.y.sin_cos();
        Vec3::new(-slat * clon, -slat * slon, clat)
    }
    fn unit_vector_z(&self, position: Vec3) -> Vec3 {
        let (slon, clon) = position.x.sin_cos();
        let (slat, clat) = position.y.sin_cos();
        Vec3::new(clat * clon, clat * slon, slat)
    }

    fn cell_coordinate_3d(&self, id: Index3) -> Vec3 {
        Vec3::new(
            self.min.x + (id.x as f32 + 0.5) * self.cell_size.x,
            self.min.y + (id.y as f32 + 0.5) * self.cell_size.y,
            self.radius,
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
            locate_axis(coord.x, self.min.x, self.max.x, self.cell_size.x, self.cells[0], true),
            locate_axis(coord.y, self.min.y, self.max.y, self.cell_size.y, self.cells[1], false),
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
        self.min
    }
    fn max_coord(&self) -> Vec3 {
        self.max
    }
    fn num_grid_cells(&self) -> usize {
        self.total
    }
    fn num_grid_cells_3d(&self) -> Index3 {
        Index3::new(self.cells[0], self.cells[1], 1)
    }
    fn has_boundary(&self) -> [bool; 3] {
        [false, true, false]
    }

    fn cell_size(&self) -> Vec3 {
        self.cell_size
    }
    fn cell_size_at(&self, position: Vec3) -> Vec3 {
        Vec3::new(
            self.radius * position.y.cos() * self.cell_size.x,
            self.radius * self.cell_size.y,
            0.0,
        )
    }
    fn dimension(&self) -> usize {
        2
    }
    fn cartesian_dimension(&self) -> usize {
        3
    }

    fn aabb_min(&self) -> Vec3 {
        Vec3::new(-self.radius, -self.radius, self.radius * self.min.y.sin())
    }
    fn aabb_max(&self) -> Vec3 {
        Vec3::new(self.radius, self.radius, self.radius * self.max.y.sin())
    }

    fn kind(&self) -> CsKind {
        CsKind::Geographic2d
    }
    fn shader_define(&self) -> &'static str {
        "GEOGRAPHIC_COORDINATES_2D"
    }
}
