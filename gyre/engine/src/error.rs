//! Error types of the engine.
//!
//! Contract violations (bad cell ids, missing attribute kinds) are not errors: they
//! panic or fail to compile. These enums only cover what a caller can act on.

use std::time::Duration;

/// Invalid construction parameters.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// An axis has no cells.
    #[error("axis {axis} needs at least one cell")]
    EmptyAxis {
        /// Axis index (0 = x, 1 = y).
        axis: usize,
    },
    /// Lower bound is not below the upper bound.
    #[error("axis {axis}: min {min} must be below max {max}")]
    InvertedBounds {
        /// Axis index (0 = x, 1 = y).
        axis: usize,
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },
    /// Latitude bound outside `[-pi/2, pi/2]`.
    #[error("latitude {0} outside [-pi/2, pi/2]")]
    LatitudeOutOfRange(f32),
    /// Sphere radius is zero, negative or not finite.
    #[error("radius must be positive and finite, got {0}")]
    BadRadius(f32),
    /// A bound is NaN or infinite.
    #[error("non-finite bound on axis {0}")]
    NonFinite(usize),
    /// Mirrored or fixed boundaries need at least one interior cell per bounded axis.
    #[error("boundary handling needs at least 3 cells per axis, got {nx}x{ny}")]
    TooSmallForBoundaries {
        /// Cells along x.
        nx: usize,
        /// Cells along y.
        ny: usize,
    },
    /// A driver parameter is out of range.
    #[error("{name} = {value} is out of range")]
    BadParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f32,
    },
}

/// Failures of the grid's render handoff.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    /// The renderer did not keep up in time. If an older frame was still queued the
    /// grid did not rotate and nothing new is queued. Otherwise the grid rotated and
    /// the new frame stays queued until the renderer's next `render_done`.
    #[error("renderer did not drain the previous snapshot within {0:?}")]
    RenderWaitTimeout(Duration),
}
