//! Configuration types for grids and simulation drivers.
//!
//! Plain parameter structs with defaults; the viewer maps its CLI flags onto them.

use std::f32::consts::FRAC_PI_2;

use gyre_geo::{CartesianCoordinates2D, Coordinates, GeographicCoordinates2D, Vec2};

use crate::error::ConfigError;

/// Shape of the simulation domain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CoordinateConfig {
    /// Planar grid.
    Cartesian {
        /// Lower corner.
        min: [f32; 2],
        /// Upper corner.
        max: [f32; 2],
        /// Cells along x and y.
        cells: [usize; 2],
        /// Wrap around along x and y.
        periodic: [bool; 2],
    },
    /// Longitude/latitude grid on a sphere.
    Geographic {
        /// Southern latitude bound in radians.
        min_lat: f32,
        /// Northern latitude bound in radians.
        max_lat: f32,
        /// Cells along longitude and latitude.
        cells: [usize; 2],
        /// Sphere radius.
        radius: f32,
    },
}

impl Default for CoordinateConfig {
    fn default() -> Self {
        Self::Cartesian { min: [0.0, 0.0], max: [1.0, 1.0], cells: [64, 64], periodic: [false, false] }
    }
}

impl CoordinateConfig {
    /// Whole sphere with the given resolution.
    pub fn global(cells: [usize; 2], radius: f32) -> Self {
        Self::Geographic { min_lat: -FRAC_PI_2, max_lat: FRAC_PI_2, cells, radius }
    }

    /// Check the parameters without building anything.
    ///
    /// # Errors
    /// The first violated constraint: empty axis, non-finite or inverted bounds,
    /// latitude outside `[-pi/2, pi/2]`, bad radius.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min, max, cells) = match *self {
            Self::Cartesian { min, max, cells, .. } => (min, max, cells),
            Self::Geographic { min_lat, max_lat, cells, radius } => {
                if !(radius.is_finite() && radius > 0.0) {
                    return Err(ConfigError::BadRadius(radius));
                }
                for lat in [min_lat, max_lat] {
                    if lat.is_finite() && !(-FRAC_PI_2..=FRAC_PI_2).contains(&lat) {
                        return Err(ConfigError::LatitudeOutOfRange(lat));
                    }
                }
                ([0.0, min_lat], [1.0, max_lat], cells)
            }
        };
        for axis in 0..2 {
            if cells[axis] == 0 {
                return Err(ConfigError::EmptyAxis { axis });
            }
            if !(min[axis].is_finite() && max[axis].is_finite()) {
                return Err(ConfigError::NonFinite(axis));
            }
            if min[axis] >= max[axis] {
                return Err(ConfigError::InvertedBounds { axis, min: min[axis], max: max[axis] });
            }
        }
        Ok(())
    }

    /// Validate and build the coordinate system.
    ///
    /// # Errors
    /// See [`CoordinateConfig::validate`].
    pub fn build(&self) -> Result<Coordinates, ConfigError> {
        self.validate()?;
        Ok(match *self {
            Self::Cartesian { min, max, cells, periodic } => CartesianCoordinates2D::new(
                Vec2::new(min[0], min[1]),
                Vec2::new(max[0], max[1]),
                cells,
                periodic,
            )
            .into(),
            Self::Geographic { min_lat, max_lat, cells, radius } => {
                GeographicCoordinates2D::new(min_lat, max_lat, cells, radius).into()
            }
        })
    }
}

/// How a driver hands frames to the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// `swap_and_render`: never block, drop frames the renderer could not take.
    #[default]
    BestEffort,
    /// `swap_and_render_wait`: block the simulation until the renderer took the frame.
    NoDrop,
}

/// Parameters of the heat diffusion driver.
#[derive(Clone, Copy, Debug)]
pub struct HeatParams {
    /// Diffusion coefficient.
    pub heat_coefficient: f32,
    /// Time step.
    pub timestep: f32,
    /// Leapfrog (DuFort-Frankel) time stepping using t-1 instead of forward Euler.
    pub leapfrog: bool,
    /// Use the divergence of the staggered gradient instead of the Laplacian.
    pub div_of_grad: bool,
    /// Zero-gradient (mirrored) boundary on x instead of a fixed temperature.
    pub isolated_x: bool,
    /// Zero-gradient (mirrored) boundary on y instead of a fixed temperature.
    pub isolated_y: bool,
    /// Fixed temperature of the x boundary.
    pub boundary_temperature_x: f32,
    /// Fixed temperature of the y boundary.
    pub boundary_temperature_y: f32,
    /// Peak temperature added by the initial hot spot.
    pub hot_spot: f32,
    /// RNG seed for the initial noise (deterministic).
    pub seed: u64,
    /// Frame handoff policy.
    pub render_mode: RenderMode,
    /// Stage a frame every N steps (>= 1); other steps only swap.
    pub render_every: u32,
}

impl Default for HeatParams {
    fn default() -> Self {
        Self {
            heat_coefficient: 0.01,
            timestep: 0.001,
            leapfrog: false,
            div_of_grad: false,
            isolated_x: false,
            isolated_y: false,
            boundary_temperature_x: 6.0,
            boundary_temperature_y: 6.0,
            hot_spot: 20.0,
            seed: 42,
            render_mode: RenderMode::BestEffort,
            render_every: 1,
        }
    }
}

/// Parameters of the render demo.
#[derive(Clone, Copy, Debug)]
pub struct RenderDemoParams {
    /// Random velocities per cell; otherwise every cell gets `vector`.
    pub random_vectors: bool,
    /// Constant velocity used when `random_vectors` is off.
    pub vector: [f32; 2],
    /// RNG seed (deterministic).
    pub seed: u64,
}

impl Default for RenderDemoParams {
    fn default() -> Self {
        Self { random_vectors: true, vector: [1.0, 0.0], seed: 7 }
    }
}
