//! Coordinate systems: mapping between logical cell ids and physical coordinates.
//!
//! Cells are stored row major (`id = y * nx + x`). Quantities are sampled at cell
//! centres, `min + (index + 0.5) * cell_size`. Staggered quantities add their own
//! offset on top of that (see `engine::interp`).
//!
//! No bounds checking is done on cell ids; out-of-range ids are a caller error.

mod cartesian;
mod geographic;

pub use cartesian::CartesianCoordinates2D;
pub use geographic::GeographicCoordinates2D;

use crate::math::{Index3, Vec3};

/// Identifies the concrete coordinate system behind a trait object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CsKind {
    /// Planar grid in the x-y plane.
    Cartesian2d,
    /// Longitude/latitude grid on a sphere shell.
    Geographic2d,
}

/// Common interface of all coordinate systems.
///
/// Implementations are immutable after construction and cheap to share between the
/// simulation thread, parallel kernels and the renderer.
pub trait CoordinateSystem: Send + Sync {
    // convert
    /// Convert a coordinate of this system into cartesian coordinates.
    fn cartesian(&self, coord: Vec3) -> Vec3;
    /// Convert a cartesian coordinate into this system.
    fn coord(&self, cartesian: Vec3) -> Vec3;

    // unit vectors
    /// Unit vector of the first coordinate at `position`, in cartesian space.
    fn unit_vector_x(&self, position: Vec3) -> Vec3;
    /// Unit vector of the second coordinate at `position`, in cartesian space.
    fn unit_vector_y(&self, position: Vec3) -> Vec3;
    /// Unit vector of the third coordinate at `position`, in cartesian space.
    fn unit_vector_z(&self, position: Vec3) -> Vec3;

    // coordinates and ids
    /// Coordinate of the centre of a cell.
    fn cell_coordinate(&self, cell: usize) -> Vec3 {
        self.cell_coordinate_3d(self.cell_id_3d(cell))
    }
    /// Coordinate of the centre of the cell with the multi-dimensional id.
    fn cell_coordinate_3d(&self, id: Index3) -> Vec3;
    /// Flat cell id from a multi-dimensional id.
    fn cell_id(&self, id: Index3) -> usize;
    /// Flat id of the cell containing `coord`.
    fn cell_id_at(&self, coord: Vec3) -> usize {
        self.cell_id(self.cell_id_3d_at(coord))
    }
    /// Multi-dimensional id of a flat cell id.
    fn cell_id_3d(&self, cell: usize) -> Index3;
    /// Multi-dimensional id of the cell containing `coord`.
    fn cell_id_3d_at(&self, coord: Vec3) -> Index3;

    // adjacency
    /// Neighbour along the positive first axis.
    fn right_neighbor(&self, cell: usize) -> usize;
    /// Neighbour along the negative first axis.
    fn left_neighbor(&self, cell: usize) -> usize;
    /// Neighbour along the positive second axis.
    fn forward_neighbor(&self, cell: usize) -> usize;
    /// Neighbour along the negative second axis.
    fn backward_neighbor(&self, cell: usize) -> usize;
    /// Neighbour along the positive third axis (the cell itself for 2D systems).
    fn up_neighbor(&self, cell: usize) -> usize {
        cell
    }
    /// Neighbour along the negative third axis (the cell itself for 2D systems).
    fn down_neighbor(&self, cell: usize) -> usize {
        cell
    }

    // boundaries
    /// Lower bound of every dimension.
    fn min_coord(&self) -> Vec3;
    /// Upper bound of every dimension.
    fn max_coord(&self) -> Vec3;
    /// Total number of cells.
    fn num_grid_cells(&self) -> usize;
    /// Number of cells along each dimension.
    fn num_grid_cells_3d(&self) -> Index3;
    /// `true` for every axis that has a boundary, `false` for periodic axes
    /// (and for unused dimensions).
    fn has_boundary(&self) -> [bool; 3];

    // dimensions
    /// Size of one cell in coordinate units (uniform in coordinate space).
    fn cell_size(&self) -> Vec3;
    /// Physical extent of a cell at `position`.
    fn cell_size_at(&self, position: Vec3) -> Vec3;
    /// Number of dimensions of the coordinate space.
    fn dimension(&self) -> usize;
    /// Number of dimensions of the embedding cartesian space.
    fn cartesian_dimension(&self) -> usize;

    // bounding box
    /// Lower corner of the cartesian bounding box.
    fn aabb_min(&self) -> Vec3;
    /// Upper corner of the cartesian bounding box.
    fn aabb_max(&self) -> Vec3;

    // rendering / downcasting
    /// Identify the concrete type.
    fn kind(&self) -> CsKind;
    /// Name of the preprocessor define a shader uses to select matching helpers.
    fn shader_define(&self) -> &'static str;
}

/// Step `i` by `d` along an axis of length `n`, wrapping on periodic axes and
/// clamping on bounded ones.
#[inline]
pub(crate) fn step_axis(i: i32, d: i32, n: i32, periodic: bool) -> i32 {
    let j = i + d;
    if periodic {
        j.rem_euclid(n)
    } else {
        j.clamp(0, n - 1)
    }
}

/// Index of the cell along one axis containing `x`. Points inside `[min, max]` clamp
/// to the axis, since rounding in the division can land one past the last cell.
/// Points outside a periodic axis wrap around.
#[inline]
pub(crate) fn locate_axis(x: f32, min: f32, max: f32, cell_size: f32, n: i32, periodic: bool) -> i32 {
    let i = ((x - min) / cell_size).floor() as i32;
    if periodic && !(min..max).contains(&x) {
        i.rem_euclid(n)
    } else {
        i.clamp(0, n - 1)
    }
}

/// Runtime-polymorphic coordinate system, for code that picks the system at runtime
/// but still wants static dispatch inside kernels after a `match`.
#[derive(Clone, Debug, PartialEq)]
pub enum Coordinates {
    /// Planar grid.
    Cartesian(CartesianCoordinates2D),
    /// Sphere shell.
    Geographic(GeographicCoordinates2D),
}

impl Coordinates {
    /// Downcast to the cartesian variant.
    #[must_use]
    pub fn as_cartesian(&self) -> Option<&CartesianCoordinates2D> {
        match self {
            Self::Cartesian(c) => Some(c),
            Self::Geographic(_) => None,
        }
    }

    /// Downcast to the geographic variant.
    #[must_use]
    pub fn as_geographic(&self) -> Option<&GeographicCoordinates2D> {
        match self {
            Self::Geographic(g) => Some(g),
            Self::Cartesian(_) => None,
        }
    }

    fn inner(&self) -> &dyn CoordinateSystem {
        match self {
            Self::Cartesian(c) => c,
            Self::Geographic(g) => g,
        }
    }
}

impl From<CartesianCoordinates2D> for Coordinates {
    fn from(c: CartesianCoordinates2D) -> Self {
        Self::Cartesian(c)
    }
}

impl From<GeographicCoordinates2D> for Coordinates {
    fn from(g: GeographicCoordinates2D) -> Self {
        Self::Geographic(g)
    }
}

impl CoordinateSystem for Coordinates {
    fn cartesian(&self, coord: Vec3) -> Vec3 {
        self.inner().cartesian(coord)
    }
    fn coord(&self, cartesian: Vec3) -> Vec3 {
        self.inner().coord(cartesian)
    }
    fn unit_vector_x(&self, position: Vec3) -> Vec3 {
        self.inner().unit_vector_x(position)
    }
    fn unit_vector_y(&self, position: Vec3) -> Vec3 {
        self.inner().unit_vector_y(position)
    }
    fn unit_vector_z(&self, position: Vec3) -> Vec3 {
        self.inner().unit_vector_z(position)
    }
    fn cell_coordinate_3d(&self, id: Index3) -> Vec3 {
        self.inner().cell_coordinate_3d(id)
    }
    fn cell_id(&self, id: Index3) -> usize {
        self.inner().cell_id(id)
    }
    fn cell_id_3d(&self, cell: usize) -> Index3 {
        self.inner().cell_id_3d(cell)
    }
    fn cell_id_3d_at(&self, coord: Vec3) -> Index3 {
        self.inner().cell_id_3d_at(coord)
    }
    fn right_neighbor(&self, cell: usize) -> usize {
        self.inner().right_neighbor(cell)
    }
    fn left_neighbor(&self, cell: usize) -> usize {
        self.inner().left_neighbor(cell)
    }
    fn forward_neighbor(&self, cell: usize) -> usize {
        self.inner().forward_neighbor(cell)
    }
    fn backward_neighbor(&self, cell: usize) -> usize {
        self.inner().backward_neighbor(cell)
    }
    fn min_coord(&self) -> Vec3 {
        self.inner().min_coord()
    }
    fn max_coord(&self) -> Vec3 {
        self.inner().max_coord()
    }
    fn num_grid_cells(&self) -> usize {
        self.inner().num_grid_cells()
    }
    fn num_grid_cells_3d(&self) -> Index3 {
        self.inner().num_grid_cells_3d()
    }
    fn has_boundary(&self) -> [bool; 3] {
        self.inner().has_boundary()
    }
    fn cell_size(&self) -> Vec3 {
        self.inner().cell_size()
    }
    fn cell_size_at(&self, position: Vec3) -> Vec3 {
        self.inner().cell_size_at(position)
    }
    fn dimension(&self) -> usize {
        self.inner().dimension()
    }
    fn cartesian_dimension(&self) -> usize {
        self.inner().cartesian_dimension()
    }
    fn aabb_min(&self) -> Vec3 {
        self.inner().aabb_min()
    }
    fn aabb_max(&self) -> Vec3 {
        self.inner().aabb_max()
    }
    fn kind(&self) -> CsKind {
        self.inner().kind()
    }
    fn shader_define(&self) -> &'static str {
        self.inner().shader_define()
    }
}
