//! Simulation drivers built on [`Grid`](crate::grid::Grid).
//!
//! A driver owns its grid behind an `Arc` so a render thread can hold the same grid.
//! Each `simulate_once` advances one step and ends with exactly one rotation.

mod demo;
mod heat;

use std::sync::Arc;

use gyre_geo::Vec2;

pub use demo::RenderDemo;
pub use heat::{div_grad, HeatDiffusion};

use crate::grid::GridBase;

/// One simulation model driving one grid.
pub trait Simulation: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Advance one time step.
    fn simulate_once(&mut self);

    /// The grid being simulated.
    fn grid(&self) -> &dyn GridBase;

    /// Shared handle for the render side.
    fn shared_grid(&self) -> Arc<dyn GridBase>;

    /// Steps taken so far.
    fn steps(&self) -> u64;
}

/// Gaussian sample via Box-Muller.
fn normal<R: rand::Rng + ?Sized>(rng: &mut R, mean: f32, std_dev: f32) -> f32 {
    let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
    let u2: f32 = rng.gen_range(0.0..1.0);
    let z = (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos();
    mean + std_dev * z
}

/// Offset of a point by half a cell along x or y.
#[inline]
fn half_step(size: Vec2, axis: usize) -> Vec2 {
    if axis == 0 {
        Vec2::new(0.5 * size.x, 0.0)
    } else {
        Vec2::new(0.0, 0.5 * size.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn normal_samples_have_expected_moments() {
        let mut rng = StdRng::seed_from_u64(3);
        let n = 20_000;
        let xs: Vec<f32> = (0..n).map(|_| normal(&mut rng, 10.0, 4.0)).collect();
        let mean = xs.iter().sum::<f32>() / n as f32;
        let var = xs.iter().map(|x| (x - mean) * (x - mean)).sum::<f32>() / n as f32;
        assert!((mean - 10.0).abs() < 0.2, "{mean}");
        assert!((var.sqrt() - 4.0).abs() < 0.2, "{var}");
    }

    #[test]
    fn half_step_per_axis() {
        let s = Vec2::new(2.0, 4.0);
        assert_eq!(half_step(s, 0), Vec2::new(1.0, 0.0));
        assert_eq!(half_step(s, 1), Vec2::new(0.0, 2.0));
    }
}
