use std::f32::consts::{FRAC_PI_2, PI, TAU};

use super::*;

fn approx(a: f32, b: f32, tol: f32) -> bool {
    (a - b).abs() <= tol
}

fn unit_grid_4x4(periodic: [bool; 2]) -> CartesianCoordinates2D {
    CartesianCoordinates2D::new(Vec2::new(0.0, 0.0), Vec2::new(4.0, 4.0), [4, 4], periodic)
}

#[test]
fn geo_cart_round_trip() {
    for &(lon, lat) in &[(0.3, 0.2), (3.0, -1.2), (6.0, 0.0), (PI, 1.4), (0.0, -0.7)] {
        let g = Vec3::new(lon, lat, 2.5);
        let back = cart_to_geo(geo_to_cart(g));
        assert!(back.max_abs_diff(g) < 1e-4, "{g:?} -> {back:?}");
    }
}

#[test]
fn cart_to_geo_handles_degenerate_points() {
    assert_eq!(cart_to_geo(Vec3::ZERO), Vec3::ZERO);
    let north = cart_to_geo(Vec3::new(0.0, 0.0, 3.0));
    assert!(approx(north.y, FRAC_PI_2, EPS_COORD));
    assert!(approx(north.z, 3.0, EPS_COORD));
}

#[test]
fn longitude_wraps_into_range() {
    assert!(approx(wrap_longitude(-0.5), TAU - 0.5, 1e-5));
    assert!(approx(wrap_longitude(TAU + 0.25), 0.25, 1e-5));
    assert!(approx(antipodal_longitude(0.25), 0.25 + PI, 1e-5));
    assert!(approx(antipodal_longitude(4.0), 4.0 - PI, 1e-5));
    let w = wrap_longitude(-1.0e-9);
    assert!((0.0..TAU).contains(&w));
}

#[test]
fn cartesian_cell_ids_are_row_major() {
    let cs = unit_grid_4x4([false, false]);
    assert_eq!(cs.num_grid_cells(), 16);
    assert_eq!(cs.cell_id_3d(5), Index3::new(1, 1, 0));
    assert_eq!(cs.cell_id(Index3::new(3, 2, 0)), 11);
    let c = cs.cell_coordinate(5);
    assert!(approx(c.x, 1.5, 1e-6) && approx(c.y, 1.5, 1e-6));
    for cell in 0..16 {
        assert_eq!(cs.cell_id_at(cs.cell_coordinate(cell)), cell);
    }
}

#[test]
fn cartesian_bounded_neighbours_clamp() {
    let cs = unit_grid_4x4([false, false]);
    assert_eq!(cs.left_neighbor(4), 4);
    assert_eq!(cs.right_neighbor(7), 7);
    assert_eq!(cs.backward_neighbor(2), 2);
    assert_eq!(cs.forward_neighbor(13), 13);
    assert_eq!(cs.right_neighbor(5), 6);
    assert_eq!(cs.forward_neighbor(5), 9);
    assert_eq!(cs.has_boundary(), [true, true, false]);
}

#[test]
fn cartesian_periodic_neighbours_wrap() {
    let cs = unit_grid_4x4([true, false]);
    assert_eq!(cs.left_neighbor(4), 7);
    assert_eq!(cs.right_neighbor(7), 4);
    assert_eq!(cs.backward_neighbor(2), 2);
    assert_eq!(cs.has_boundary(), [false, true, false]);
    assert_eq!(cs.up_neighbor(3), 3);
    assert_eq!(cs.down_neighbor(3), 3);
}

#[test]
fn geographic_wraps_longitude_and_clamps_latitude() {
    let cs = GeographicCoordinates2D::global([8, 4], 1.0);
    assert_eq!(cs.left_neighbor(0), 7);
    assert_eq!(cs.right_neighbor(7), 0);
    assert_eq!(cs.backward_neighbor(3), 3);
    assert_eq!(cs.forward_neighbor(27), 27);
    assert_eq!(cs.has_boundary(), [false, true, false]);

    let first = cs.cell_coordinate(0);
    assert!(approx(first.x, TAU / 16.0, 1e-6));
    assert!(approx(first.y, -FRAC_PI_2 + PI / 8.0, 1e-6));
    assert!(approx(first.z, 1.0, 1e-6));
}

#[test]
fn geographic_cartesian_round_trip_per_cell() {
    let cs = GeographicCoordinates2D::new(-1.2, 1.2, [12, 6], 6.0);
    for cell in 0..cs.num_grid_cells() {
        let c = cs.cell_coordinate(cell);
        let back = cs.coord(cs.cartesian(c));
        assert!(back.max_abs_diff(c) < 1e-4, "cell {cell}: {c:?} -> {back:?}");
        assert_eq!(cs.cell_id_at(back), cell);
    }
}

#[test]
fn geographic_unit_vectors_are_orthonormal() {
    let cs = GeographicCoordinates2D::global([8, 4], 1.0);
    let p = Vec3::new(1.1, 0.4, 1.0);
    let (e, n, u) = (cs.unit_vector_x(p), cs.unit_vector_y(p), cs.unit_vector_z(p));
    for v in [e, n, u] {
        assert!(approx(v.length(), 1.0, 1e-5));
    }
    assert!(approx(e.dot(n), 0.0, 1e-5));
    assert!(approx(e.dot(u), 0.0, 1e-5));
    assert!(approx(n.dot(u), 0.0, 1e-5));
    // up is the radial direction
    assert!(u.max_abs_diff(geo_to_cart(p)) < 1e-5);
    // east x north = up
    assert!(e.cross(n).max_abs_diff(u) < 1e-5);
}

#[test]
fn geographic_cell_size_shrinks_towards_poles() {
    let cs = GeographicCoordinates2D::global([16, 8], 2.0);
    let eq = cs.cell_size_at(Vec3::new(0.0, 0.0, 2.0));
    let hi = cs.cell_size_at(Vec3::new(0.0, 1.2, 2.0));
    assert!(hi.x < eq.x);
    assert!(approx(hi.y, eq.y, 1e-6));
    assert!(approx(eq.x, 2.0 * TAU / 16.0, 1e-5));
}

#[test]
fn coordinates_enum_delegates() {
    let c: Coordinates = unit_grid_4x4([false, true]).into();
    assert_eq!(c.kind(), CsKind::Cartesian2d);
    assert_eq!(c.shader_define(), "CARTESIAN_COORDINATES_2D");
    assert!(c.as_cartesian().is_some() && c.as_geographic().is_none());
    assert_eq!(c.backward_neighbor(1), 13);

    let g: Coordinates = GeographicCoordinates2D::global([4, 4], 1.0).into();
    assert_eq!(g.kind(), CsKind::Geographic2d);
    assert_eq!(g.cartesian_dimension(), 3);
    assert!(g.as_geographic().is_some());
}

#[test]
fn central_differences_are_exact_for_polynomials() {
    // f = 3x + 1
    assert!(approx(central_deriv(3.0 * 0.5 + 1.0, 3.0 * 1.5 + 1.0, 1.0), 3.0, 1e-6));
    // f = x^2 at x = 2, delta 0.5
    let f = |x: f32| x * x;
    assert!(approx(central_2nd_deriv(f(1.5), f(2.0), f(2.5), 0.5), 2.0, 1e-5));
}

#[test]
fn cartesian_operators_match_analytic_fields() {
    let cs = CartesianCoordinates2D::bounded(Vec2::ZERO, Vec2::new(2.0, 2.0), [4, 4]);
    let d = 0.5;
    let at = Vec2::new(1.0, 1.0);

    // f = 2x - y
    let f = |x: f32, y: f32| 2.0 * x - y;
    let g = gradient_2d(f(at.x - d / 2.0, at.y), f(at.x + d / 2.0, at.y), f(at.x, at.y - d / 2.0), f(at.x, at.y + d / 2.0), at, &cs);
    assert!(approx(g.x, 2.0, 1e-5) && approx(g.y, -1.0, 1e-5));

    // (u, v) = (x, y): div = 2, (u, v) = (-y, x): curl = 2
    let div = divergence_2d(at.x - d / 2.0, at.x + d / 2.0, at.y - d / 2.0, at.y + d / 2.0, at, &cs);
    assert!(approx(div, 2.0, 1e-5));
    let curl = curl_2d(at.x - d / 2.0, at.x + d / 2.0, -(at.y - d / 2.0), -(at.y + d / 2.0), at, &cs);
    assert!(approx(curl, 2.0, 1e-5));

    // f = x^2 + y^2
    let h = |x: f32, y: f32| x * x + y * y;
    let lap = laplace_2d(h(at.x - d, at.y), h(at.x + d, at.y), h(at.x, at.y - d), h(at.x, at.y + d), h(at.x, at.y), at, &cs);
    assert!(approx(lap, 4.0, 1e-4));
}

#[test]
fn sphere_laplacian_of_sin_latitude() {
    // on the unit sphere lap(sin lat) = -2 sin lat
    let cs = GeographicCoordinates2D::global([64, 64], 1.0);
    let d = cs.cell_size();
    for &lat in &[-0.9_f32, -0.3, 0.2, 0.5, 1.0] {
        let at = Vec2::new(1.0, lat);
        let c = lat.sin();
        let lap = laplace_2d(c, c, (lat - d.y).sin(), (lat + d.y).sin(), c, at, &cs);
        assert!(approx(lap, -2.0 * c, 1e-2), "lat {lat}: {lap} vs {}", -2.0 * c);
    }
}

#[test]
fn sphere_solid_body_rotation() {
    // u = cos(lat), v = 0 on a sphere of radius 2: divergence 0, curl 2 sin(lat) / r
    let r = 2.0;
    let cs = GeographicCoordinates2D::global([64, 64], r);
    let d = cs.cell_size();
    for &lat in &[-0.8_f32, 0.1, 0.7] {
        let at = Vec2::new(0.5, lat);
        let u = lat.cos();
        let div = divergence_2d(u, u, 0.0, 0.0, at, &cs);
        assert!(approx(div, 0.0, 1e-5));
        let curl = curl_2d(0.0, 0.0, (lat - d.y / 2.0).cos(), (lat + d.y / 2.0).cos(), at, &cs);
        assert!(approx(curl, 2.0 * lat.sin() / r, 1e-2), "lat {lat}: {curl}");
    }
}

#[test]
fn sphere_gradient_has_metric_factors() {
    // f = lon on a sphere of radius 3 at lat 0.6: grad = (1 / (r cos lat), 0)
    let r = 3.0;
    let cs = GeographicCoordinates2D::global([32, 16], r);
    let d = cs.cell_size();
    let at = Vec2::new(1.0, 0.6);
    let g = gradient_2d(at.x - d.x / 2.0, at.x + d.x / 2.0, at.x, at.x, at, &cs);
    assert!(approx(g.x, 1.0 / (r * 0.6_f32.cos()), 1e-4));
    assert!(approx(g.y, 0.0, 1e-6));

    let dynamic: Coordinates = cs.clone().into();
    let g2 = gradient_2d(at.x - d.x / 2.0, at.x + d.x / 2.0, at.x, at.x, at, &dynamic);
    assert!(approx(g.x, g2.x, 1e-7));
}

#[test]
fn lookup_just_below_the_seam_stays_on_the_last_column() {
    let below_tau = f32::from_bits(TAU.to_bits() - 1);
    for nx in 1..300 {
        let cs = GeographicCoordinates2D::global([nx, 8], 1.0);
        let id = cs.cell_id_3d_at(Vec3::new(below_tau, 0.1, 1.0));
        assert_eq!(id.x, nx as i32 - 1, "nx {nx}");
        assert!(cs.cell_id_at(Vec3::new(below_tau, 0.1, 1.0)) < cs.num_grid_cells());
    }

    // a point a hair below the x axis maps to a longitude just under 2 pi
    let cs = GeographicCoordinates2D::global([17, 8], 1.0);
    let id = cs.cell_id_3d_at(cs.coord(Vec3::new(1.0, -3e-7, 0.0)));
    assert_eq!(id, Index3::new(16, 4, 0));
}

#[test]
fn cartesian_lookup_wraps_or_clamps_the_edge() {
    for n in 1..300 {
        let periodic = CartesianCoordinates2D::new(Vec2::ZERO, Vec2::new(1.0, 1.0), [n, n], [true, false]);
        let below_one = f32::from_bits(1.0_f32.to_bits() - 1);
        assert_eq!(periodic.cell_id_3d_at(Vec3::new(below_one, below_one, 0.0)).x, n as i32 - 1, "n {n}");
        // the upper bound of a bounded axis belongs to the last cell
        assert_eq!(periodic.cell_id_3d_at(Vec3::new(0.5, 1.0, 0.0)).y, n as i32 - 1, "n {n}");
    }
}

#[test]
fn centred_curl_of_zonal_flow_on_the_sphere() {
    // u = 1, v = 0: curl = tan(lat) / r, sampled one cell either side of the centre
    let r = 2.0;
    let cs = GeographicCoordinates2D::global([32, 16], r);
    for &lat in &[-1.1_f32, -0.4, 0.3, 0.8836] {
        let at = Vec2::new(0.5, lat);
        let curl = curl_2d_centered(0.0, 0.0, 1.0, 1.0, at, &cs);
        let expected = lat.tan() / r;
        assert!((curl - expected).abs() <= 0.02 * expected.abs(), "lat {lat}: {curl} vs {expected}");
    }

    // on the plane it is the two-cell central difference
    let plane = CartesianCoordinates2D::bounded(Vec2::ZERO, Vec2::new(4.0, 4.0), [4, 4]);
    let at = Vec2::new(2.0, 2.0);
    // (u, v) = (-y, x): curl = 2
    let curl = curl_2d_centered(at.x - 1.0, at.x + 1.0, -(at.y - 1.0), -(at.y + 1.0), at, &plane);
    assert!(approx(curl, 2.0, 1e-5));
}
