//! Gyre engine: multi-buffered simulation grids with a lock-protected render handoff.
//!
//! A [`grid::Grid`] holds four snapshots of an [`attributes::AttributeSet`] and
//! rotates their roles (t+1, t, t-1, awaiting render) once per step. The render side
//! reads a mirror that is only written between steps. Around it sit cell-centred
//! [`interp`]olation, [`boundaries`] handling and the drivers in [`sim`].
#![deny(missing_docs)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::dbg_macro, clippy::large_enum_variant)]

pub mod attributes;
pub mod boundaries;
pub mod config;
pub mod error;
pub mod gpu;
pub mod grid;
pub mod interp;
pub mod sim;

pub use attributes::{AttributeKind, AttributeSet, CellRead, GridAttribute, RenderAttributeSet};
pub use boundaries::MirroredBoundary;
pub use config::{CoordinateConfig, HeatParams, RenderDemoParams, RenderMode};
pub use error::{ConfigError, GridError};
pub use grid::{Grid, GridBase, GridReference, RenderFrame, Roles};
pub use sim::{HeatDiffusion, RenderDemo, Simulation};

/// Returns the engine version string from Cargo metadata.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
