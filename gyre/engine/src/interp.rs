//! Interpolation of grid attributes at arbitrary positions.
//!
//! Values are sampled at cell centres. A staggered quantity (C-grid) passes its
//! offset from the centre, e.g. half a cell in x for a velocity stored on the east
//! face. Periodic axes wrap, bounded axes clamp to the edge cell.

use std::f32::consts::PI;

use gyre_geo::{antipodal_longitude, CoordinateSystem, GeographicCoordinates2D, Index3, Vec2};

use crate::attributes::{AttributeKind, CellRead};

/// Affine blend between `(pos_a, val_a)` and `(pos_b, val_b)` evaluated at `target`.
/// `pos_a` and `pos_b` must differ.
#[inline]
pub fn linear_interpolate(target: f32, pos_a: f32, val_a: f32, pos_b: f32, val_b: f32) -> f32 {
    debug_assert!(pos_a != pos_b, "degenerate interpolation interval");
    let f = (target - pos_a) / (pos_b - pos_a);
    val_a * (1.0 - f) + val_b * f
}

/// Bilinear blend over the rectangle `lower..upper`. Values are named by corner:
/// `v_ab` sits at (x = a, y = b) with 0 = lower and 1 = upper.
#[inline]
pub fn bilinear_interpolate(target: Vec2, lower: Vec2, upper: Vec2, v00: f32, v10: f32, v01: f32, v11: f32) -> f32 {
    let bottom = linear_interpolate(target.x, lower.x, v00, upper.x, v10);
    let top = linear_interpolate(target.x, lower.x, v01, upper.x, v11);
    linear_interpolate(target.y, lower.y, bottom, upper.y, top)
}

/// Lower index, upper index and blend weight along one axis for fractional index
/// `idf` (0.0 = centre of cell 0).
fn axis_stencil(idf: f32, n: i32, periodic: bool) -> (i32, i32, f32) {
    let floor = idf.floor();
    let f = idf - floor;
    let lower = floor as i32;
    if periodic {
        (lower.rem_euclid(n), (lower + 1).rem_euclid(n), f)
    } else if lower < 0 {
        (0, 0, 0.0)
    } else if lower >= n - 1 {
        (n - 1, n - 1, 0.0)
    } else {
        (lower, lower + 1, f)
    }
}

/// Bilinear sample of attribute `K` at `position`.
///
/// `offset` is the stagger of `K` relative to the cell centre. `position - offset`
/// must lie inside the coordinate bounds on bounded axes; periodic axes wrap.
pub fn read_interpolated_2d<K, S, C>(position: Vec2, source: &S, cs: &C, offset: Vec2) -> f32
where
    K: AttributeKind<Value = f32>,
    S: CellRead<K> + ?Sized,
    C: CoordinateSystem + ?Sized,
{
    let min = cs.min_coord();
    let size = cs.cell_size();
    let cells = cs.num_grid_cells_3d();
    let bounded = cs.has_boundary();

    let idx = (position.x - offset.x - min.x) / size.x - 0.5;
    let idy = (position.y - offset.y - min.y) / size.y - 0.5;
    let (x0, x1, fx) = axis_stencil(idx, cells.x, !bounded[0]);
    let (y0, y1, fy) = axis_stencil(idy, cells.y, !bounded[1]);

    let at = |x: i32, y: i32| source.read_cell(cs.cell_id(Index3::new(x, y, 0)));
    bilinear_interpolate(Vec2::new(fx, fy), Vec2::ZERO, Vec2::new(1.0, 1.0), at(x0, y0), at(x1, y0), at(x0, y1), at(x1, y1))
}

/// Value of `K` at latitude `target_lat_ext` beyond the north pole, on the meridian of
/// `original_pos`.
///
/// Latitudes are *extended*: they keep growing past `pi/2` instead of folding back.
/// The sample on the far side of the pole is read on the antipodal meridian in the
/// row of `original_pos` and placed at the reflected latitude `pi - lat`. The result
/// blends linearly between `value_at_original` and that reflected sample. Set
/// `negate` for vector components that flip sign when carried over the pole.
///
/// `original_pos` must not lie on the pole itself.
pub fn interpolate_north_pole_2d<K, S>(
    original_pos: Vec2,
    value_at_original: f32,
    target_lat_ext: f32,
    source: &S,
    cs: &GeographicCoordinates2D,
    offset: Vec2,
    negate: bool,
) -> f32
where
    K: AttributeKind<Value = f32>,
    S: CellRead<K> + ?Sized,
{
    let reflected_lat = PI - original_pos.y;
    let load_lon = antipodal_longitude(original_pos.x);

    let min = cs.min_coord();
    let size = cs.cell_size();
    let cells = cs.num_grid_cells_3d();

    let idx = (load_lon - offset.x - min.x) / size.x - 0.5;
    let (x0, x1, fx) = axis_stencil(idx, cells.x, true);
    let row = (((original_pos.y - offset.y - min.y) / size.y - 0.5).round() as i32).clamp(0, cells.y - 1);

    let at = |x: i32| source.read_cell(cs.cell_id(Index3::new(x, row, 0)));
    let sign = if negate { -1.0 } else { 1.0 };
    let reflected = sign * linear_interpolate(fx, 0.0, at(x0), 1.0, at(x1));

    linear_interpolate(target_lat_ext, original_pos.y, value_at_original, reflected_lat, reflected)
}
