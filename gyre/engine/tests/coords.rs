use engine::{ConfigError, CoordinateConfig};
use gyre_geo::{CoordinateSystem, CsKind, Vec3};

#[test]
fn cartesian_round_trip_from_config() {
    let cs = CoordinateConfig::Cartesian { min: [-2.0, 0.0], max: [2.0, 1.0], cells: [10, 5], periodic: [true, false] }
        .build()
        .unwrap();
    assert_eq!(cs.kind(), CsKind::Cartesian2d);
    assert_eq!(cs.has_boundary()[..2], [false, true]);
    for cell in 0..cs.num_grid_cells() {
        let c = cs.cell_coordinate(cell);
        assert_eq!(cs.cell_id_at(c), cell);
        let back = cs.coord(cs.cartesian(c));
        assert!(back.max_abs_diff(c) < 1e-6);
    }
}

#[test]
fn geographic_round_trip_away_from_poles() {
    let cs = CoordinateConfig::global([36, 18], 6.0).build().unwrap();
    assert_eq!(cs.kind(), CsKind::Geographic2d);
    for cell in 0..cs.num_grid_cells() {
        let c = cs.cell_coordinate(cell);
        if c.y.abs() > 1.4 {
            continue;
        }
        let xyz = cs.cartesian(c);
        assert!((xyz.length() - 6.0).abs() < 1e-4);
        let back = cs.coord(xyz);
        assert!(back.max_abs_diff(c) < 1e-4, "{c:?} -> {back:?}");
        assert_eq!(cs.cell_id_at(back), cell);
    }
}

#[test]
fn neighbours_wrap_in_longitude() {
    let cs = CoordinateConfig::global([8, 4], 1.0).build().unwrap();
    let east_edge = 7;
    assert_eq!(cs.right_neighbor(east_edge), 0);
    assert_eq!(cs.left_neighbor(0), east_edge);
    // latitude is clamped at the pole rows
    assert_eq!(cs.backward_neighbor(3), 3);
    let up = cs.unit_vector_z(Vec3::new(0.3, 0.2, 0.0));
    assert!((up.length() - 1.0).abs() < 1e-5);
}

#[test]
fn invalid_configs_are_reported() {
    let bad = CoordinateConfig::Geographic { min_lat: 0.5, max_lat: 0.5, cells: [8, 4], radius: 1.0 };
    assert_eq!(bad.build().err(), Some(ConfigError::InvertedBounds { axis: 1, min: 0.5, max: 0.5 }));
}
