#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::too_many_arguments,
    clippy::similar_names
)]

//! Grid geometry shared by the engine and the viewer: coordinate systems that map
//! cell ids to physical coordinates, and the finite-difference operators that
//! respect their metric.

pub mod coords;
pub mod fd;
pub mod math;

pub use coords::{CartesianCoordinates2D, Coordinates, CoordinateSystem, CsKind, GeographicCoordinates2D};
pub use fd::{central_2nd_deriv, central_deriv, curl_2d, curl_2d_centered, divergence_2d, gradient_2d, laplace_2d, DifferentialOps};
pub use math::{antipodal_longitude, cart_to_geo, geo_to_cart, wrap_longitude, Index3, Vec2, Vec3, EPS_COORD};

/// Choose f32 everywhere to mirror WGSL exactly.
pub const FLOAT: &str = "f32";

#[cfg(test)]
mod tests;
