//! Second-order central finite differences on 2D grids.
//!
//! The operators take the sampled neighbour values and return the result at the
//! midpoint between them. On the sphere they pick up `1/r` and `1/(r cos φ)` metric
//! factors, so every operator goes through [`DifferentialOps`], implemented once per
//! coordinate system. Simulation code calls the free functions and stays agnostic of
//! the coordinate system it runs on.
//!
//! On the sphere, all operators divide by `cos φ` and are undefined at the poles.
//! Pole rows must be kept out of direct evaluation by the boundary handling.

use crate::coords::{CartesianCoordinates2D, Coordinates, CoordinateSystem, GeographicCoordinates2D};
use crate::math::Vec2;

/// Derivative at the midpoint between two samples `delta` apart.
#[inline]
#[must_use]
pub fn central_deriv(left: f32, right: f32, delta: f32) -> f32 {
    (right - left) / delta
}

/// Second derivative at `center`, with `left` and `right` each `delta` away.
#[inline]
#[must_use]
pub fn central_2nd_deriv(left: f32, center: f32, right: f32, delta: f32) -> f32 {
    (right - 2.0 * center + left) / (delta * delta)
}

/// Differential operators specialised for the metric of a coordinate system.
///
/// `left/right` are samples along the negative/positive first axis, `backward/forward`
/// along the second axis. For the first-order operators the samples are one cell
/// apart (staggered layout), `location` is the point in between.
pub trait DifferentialOps {
    /// Gradient of a scalar field.
    fn gradient_2d(&self, left: f32, right: f32, backward: f32, forward: f32, location: Vec2) -> Vec2;
    /// Divergence of a vector field from the x components left/right and the
    /// y components backward/forward.
    fn divergence_2d(&self, left_x: f32, right_x: f32, backward_y: f32, forward_y: f32, location: Vec2) -> f32;
    /// Vertical component of the curl from the y components left/right and the
    /// x components backward/forward.
    fn curl_2d(&self, left_y: f32, right_y: f32, backward_x: f32, forward_x: f32, location: Vec2) -> f32;
    /// Curl at the cell `location` from the four direct neighbours, which lie one
    /// cell away on either side (two cells apart).
    fn curl_2d_centered(&self, left_y: f32, right_y: f32, backward_x: f32, forward_x: f32, location: Vec2) -> f32;
    /// Laplacian of a scalar field at `center`; the neighbours are one cell away.
    #[allow(clippy::too_many_arguments)]
    fn laplace_2d(
        &self,
        left: f32,
        right: f32,
        backward: f32,
        forward: f32,
        center: f32,
        location: Vec2,
    ) -> f32;
}

impl DifferentialOps for CartesianCoordinates2D {
    fn gradient_2d(&self, left: f32, right: f32, backward: f32, forward: f32, _location: Vec2) -> Vec2 {
        let d = self.cell_size();
        Vec2::new(central_deriv(left, right, d.x), central_deriv(backward, forward, d.y))
    }

    fn divergence_2d(&self, left_x: f32, right_x: f32, backward_y: f32, forward_y: f32, _location: Vec2) -> f32 {
        let d = self.cell_size();
        central_deriv(left_x, right_x, d.x) + central_deriv(backward_y, forward_y, d.y)
    }

    fn curl_2d(&self, left_y: f32, right_y: f32, backward_x: f32, forward_x: f32, _location: Vec2) -> f32 {
        let d = self.cell_size();
        central_deriv(left_y, right_y, d.x) - central_deriv(backward_x, forward_x, d.y)
    }

    fn curl_2d_centered(&self, left_y: f32, right_y: f32, backward_x: f32, forward_x: f32, _location: Vec2) -> f32 {
        let d = self.cell_size();
        central_deriv(left_y, right_y, 2.0 * d.x) - central_deriv(backward_x, forward_x, 2.0 * d.y)
    }

    fn laplace_2d(
        &self,
        left: f32,
        right: f32,
        backward: f32,
        forward: f32,
        center: f32,
        _location: Vec2,
    ) -> f32 {
        let d = self.cell_size();
        central_2nd_deriv(left, center, right, d.x) + central_2nd_deriv(backward, center, forward, d.y)
    }
}

impl DifferentialOps for GeographicCoordinates2D {
    fn gradient_2d(&self, left: f32, right: f32, backward: f32, forward: f32, location: Vec2) -> Vec2 {
        let d = self.cell_size();
        let r_inv = 1.0 / self.radius();
        Vec2::new(
            r_inv / location.y.cos() * central_deriv(left, right, d.x),
            r_inv * central_deriv(backward, forward, d.y),
        )
    }

    fn divergence_2d(&self, left_x: f32, right_x: f32, backward_y: f32, forward_y: f32, location: Vec2) -> f32 {
        let d = self.cell_size();
        let r_cos_inv = 1.0 / (self.radius() * location.y.cos());
        // meridional flux is weighted with cos(lat) at the sample latitudes
        let lat_backward = location.y - d.y * 0.5;
        let lat_forward = location.y + d.y * 0.5;
        r_cos_inv
            * (central_deriv(left_x, right_x, d.x)
                + central_deriv(lat_backward.cos() * backward_y, lat_forward.cos() * forward_y, d.y))
    }

    fn curl_2d(&self, left_y: f32, right_y: f32, backward_x: f32, forward_x: f32, location: Vec2) -> f32 {
        let d = self.cell_size();
        let r_cos_inv = 1.0 / (self.radius() * location.y.cos());
        let lat_backward = location.y - d.y * 0.5;
        let lat_forward = location.y + d.y * 0.5;
        r_cos_inv
            * (central_deriv(left_y, right_y, d.x)
                - central_deriv(lat_backward.cos() * backward_x, lat_forward.cos() * forward_x, d.y))
    }

    fn curl_2d_centered(&self, left_y: f32, right_y: f32, backward_x: f32, forward_x: f32, location: Vec2) -> f32 {
        let d = self.cell_size();
        let r_cos_inv = 1.0 / (self.radius() * location.y.cos());
        let lat_backward = location.y - d.y;
        let lat_forward = location.y + d.y;
        r_cos_inv
            * (central_deriv(left_y, right_y, 2.0 * d.x)
                - central_deriv(lat_backward.cos() * backward_x, lat_forward.cos() * forward_x, 2.0 * d.y))
    }

    fn laplace_2d(
        &self,
        left: f32,
        right: f32,
        backward: f32,
        forward: f32,
        center: f32,
        location: Vec2,
    ) -> f32 {
        let d = self.cell_size();
        let cos_inv = 1.0 / location.y.cos();
        let tan_lat = location.y.tan();
        let r_inv2 = 1.0 / (self.radius() * self.radius());
        r_inv2 * cos_inv * cos_inv * central_2nd_deriv(left, center, right, d.x)
            + r_inv2 * central_2nd_deriv(backward, center, forward, d.y)
            - r_inv2 * tan_lat * central_deriv(backward, forward, 2.0 * d.y)
    }
}

impl DifferentialOps for Coordinates {
    fn gradient_2d(&self, left: f32, right: f32, backward: f32, forward: f32, location: Vec2) -> Vec2 {
        match self {
            Self::Cartesian(c) => c.gradient_2d(left, right, backward, forward, location),
            Self::Geographic(g) => g.gradient_2d(left, right, backward, forward, location),
        }
    }

    fn divergence_2d(&self, left_x: f32, right_x: f32, backward_y: f32, forward_y: f32, location: Vec2) -> f32 {
        match self {
            Self::Cartesian(c) => c.divergence_2d(left_x, right_x, backward_y, forward_y, location),
            Self::Geographic(g) => g.divergence_2d(left_x, right_x, backward_y, forward_y, location),
        }
    }

    fn curl_2d(&self, left_y: f32, right_y: f32, backward_x: f32, forward_x: f32, location: Vec2) -> f32 {
        match self {
            Self::Cartesian(c) => c.curl_2d(left_y, right_y, backward_x, forward_x, location),
            Self::Geographic(g) => g.curl_2d(left_y, right_y, backward_x, forward_x, location),
        }
    }

    fn curl_2d_centered(&self, left_y: f32, right_y: f32, backward_x: f32, forward_x: f32, location: Vec2) -> f32 {
        match self {
            Self::Cartesian(c) => c.curl_2d_centered(left_y, right_y, backward_x, forward_x, location),
            Self::Geographic(g) => g.curl_2d_centered(left_y, right_y, backward_x, forward_x, location),
        }
    }

    fn laplace_2d(
        &self,
        left: f32,
        right: f32,
        backward: f32,
        forward: f32,
        center: f32,
        location: Vec2,
    ) -> f32 {
        match self {
            Self::Cartesian(c) => c.laplace_2d(left, right, backward, forward, center, location),
            Self::Geographic(g) => g.laplace_2d(left, right, backward, forward, center, location),
        }
    }
}

/// Gradient of a scalar field, see [`DifferentialOps::gradient_2d`].
#[inline]
#[must_use]
pub fn gradient_2d<C: DifferentialOps + ?Sized>(
    left: f32,
    right: f32,
    backward: f32,
    forward: f32,
    location: Vec2,
    cs: &C,
) -> Vec2 {
    cs.gradient_2d(left, right, backward, forward, location)
}

/// Divergence of a vector field, see [`DifferentialOps::divergence_2d`].
#[inline]
#[must_use]
pub fn divergence_2d<C: DifferentialOps + ?Sized>(
    left_x: f32,
    right_x: f32,
    backward_y: f32,
    forward_y: f32,
    location: Vec2,
    cs: &C,
) -> f32 {
    cs.divergence_2d(left_x, right_x, backward_y, forward_y, location)
}

/// Curl of a vector field, see [`DifferentialOps::curl_2d`].
#[inline]
#[must_use]
pub fn curl_2d<C: DifferentialOps + ?Sized>(
    left_y: f32,
    right_y: f32,
    backward_x: f32,
    forward_x: f32,
    location: Vec2,
    cs: &C,
) -> f32 {
    cs.curl_2d(left_y, right_y, backward_x, forward_x, location)
}

/// Cell-centred curl, see [`DifferentialOps::curl_2d_centered`].
#[inline]
#[must_use]
pub fn curl_2d_centered<C: DifferentialOps + ?Sized>(
    left_y: f32,
    right_y: f32,
    backward_x: f32,
    forward_x: f32,
    location: Vec2,
    cs: &C,
) -> f32 {
    cs.curl_2d_centered(left_y, right_y, backward_x, forward_x, location)
}

/// Laplacian of a scalar field, see [`DifferentialOps::laplace_2d`].
#[inline]
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn laplace_2d<C: DifferentialOps + ?Sized>(
    left: f32,
    right: f32,
    backward: f32,
    forward: f32,
    center: f32,
    location: Vec2,
    cs: &C,
) -> f32 {
    cs.laplace_2d(left, right, backward, forward, center, location)
}
