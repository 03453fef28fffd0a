//! Heat diffusion on a bounded or spherical grid.
//!
//! `dT/dt = kappa * L(T)` where `L` is either the five-point Laplacian or the
//! divergence of the face-centred gradient. Both are linear in the centre value, so
//! `L(T) = L0 - D * T_c` with `L0` the operator evaluated with a zero centre. Forward
//! Euler uses `T' = T + kappa dt L(T)`; leapfrog replaces `T_c` in `D * T_c` by the
//! average of t-1 and t+1 (DuFort-Frankel), which is unconditionally stable. All
//! slots start out equal, so the first leapfrog step sees t-1 = t.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, trace, warn};

use gyre_geo::{gradient_2d, divergence_2d, laplace_2d, Coordinates, CoordinateSystem, DifferentialOps, Vec2};

use super::{half_step, Simulation};
use crate::attributes::{Divergence, HeatBuffer, Temperature, TemperatureGradientX, TemperatureGradientY};
use crate::boundaries::{boundary_cells, check_boundary_size, initialize_fixed_value_boundaries, MirroredBoundary};
use crate::config::{HeatParams, RenderMode};
use crate::error::ConfigError;
use crate::grid::{Grid, GridBase};

/// Divergence of the gradient, with the gradient taken on the four cell faces.
pub fn div_grad<C>(cs: &C, left: f32, right: f32, backward: f32, forward: f32, center: f32, location: Vec2) -> f32
where
    C: CoordinateSystem + DifferentialOps + ?Sized,
{
    let size = cs.cell_size().xy();
    let hx = half_step(size, 0);
    let hy = half_step(size, 1);
    let east = gradient_2d(center, right, 0.0, 0.0, location + hx, cs).x;
    let west = gradient_2d(left, center, 0.0, 0.0, location - hx, cs).x;
    let north = gradient_2d(0.0, 0.0, center, forward, location + hy, cs).y;
    let south = gradient_2d(0.0, 0.0, backward, center, location - hy, cs).y;
    divergence_2d(west, east, south, north, location, cs)
}

#[inline]
#[allow(clippy::too_many_arguments)]
fn operator(cs: &Coordinates, div_of_grad: bool, l: f32, r: f32, b: f32, f: f32, c: f32, pos: Vec2) -> f32 {
    if div_of_grad {
        div_grad(cs, l, r, b, f, c, pos)
    } else {
        laplace_2d(l, r, b, f, c, pos, cs)
    }
}

/// Temperature diffusion driver.
pub struct HeatDiffusion {
    cs: Coordinates,
    grid: Arc<Grid<HeatBuffer>>,
    params: HeatParams,
    interior: Vec<usize>,
    mirrored: MirroredBoundary,
    stability: f32,
    steps: u64,
}

impl HeatDiffusion {
    /// Set up the grid, the initial temperature field and the boundaries.
    ///
    /// # Errors
    /// [`ConfigError::TooSmallForBoundaries`] if a bounded axis has fewer than 3 cells,
    /// [`ConfigError::BadParameter`] for a negative or non-finite coefficient or a
    /// non-positive time step.
    pub fn new(cs: Coordinates, params: HeatParams) -> Result<Self, ConfigError> {
        if !(params.heat_coefficient.is_finite() && params.heat_coefficient >= 0.0) {
            return Err(ConfigError::BadParameter { name: "heat_coefficient", value: params.heat_coefficient });
        }
        if !(params.timestep.is_finite() && params.timestep > 0.0) {
            return Err(ConfigError::BadParameter { name: "timestep", value: params.timestep });
        }
        check_boundary_size(&cs, true, true)?;

        let n = cs.num_grid_cells();
        let mut edge = vec![false; n];
        for bc in boundary_cells(&cs, true, true) {
            edge[bc.cell] = true;
        }
        let interior: Vec<usize> = (0..n).filter(|&c| !edge[c]).collect();
        let mirrored = MirroredBoundary::new(&cs, params.isolated_x, params.isolated_y)?;

        // largest coefficient of the centre value in the discrete operator
        let d_max = interior
            .iter()
            .map(|&cell| {
                let pos = cs.cell_coordinate(cell).xy();
                -operator(&cs, params.div_of_grad, 0.0, 0.0, 0.0, 0.0, 1.0, pos)
            })
            .fold(0.0_f32, f32::max);
        let stability = params.heat_coefficient * params.timestep * d_max;

        let sim = Self {
            grid: Arc::new(Grid::for_coordinates(&cs)),
            cs,
            params,
            interior,
            mirrored,
            stability,
            steps: 0,
        };
        sim.seed_temperature();
        initialize_fixed_value_boundaries::<Temperature, _, _>(
            !params.isolated_x,
            !params.isolated_y,
            params.boundary_temperature_x,
            params.boundary_temperature_y,
            &sim.cs,
            sim.grid.as_ref(),
        );

        info!(
            cells = n,
            interior = sim.interior.len(),
            leapfrog = params.leapfrog,
            div_of_grad = params.div_of_grad,
            "[heat] ready"
        );
        if !params.leapfrog && stability > 1.0 {
            warn!(
                "[heat] explicit step unstable: kappa*dt*D = {:.3} > 1 (dt={}, kappa={})",
                stability, params.timestep, params.heat_coefficient
            );
        }
        Ok(sim)
    }

    /// Noise around the mean boundary temperature plus a Gaussian hot spot in the
    /// middle of the domain, written into every slot.
    fn seed_temperature(&self) {
        let p = &self.params;
        let mut rng = StdRng::seed_from_u64(p.seed);
        let min = self.cs.min_coord().xy();
        let max = self.cs.max_coord().xy();
        let centre = (min + max) * 0.5;
        let extent = max - min;
        let base = 0.5 * (p.boundary_temperature_x + p.boundary_temperature_y);
        for cell in 0..self.cs.num_grid_cells() {
            let pos = self.cs.cell_coordinate(cell).xy();
            let dx = (pos.x - centre.x) / extent.x;
            let dy = (pos.y - centre.y) / extent.y;
            let noise: f32 = rng.gen_range(-0.5..0.5);
            let t = base + noise + p.hot_spot * (-(dx * dx + dy * dy) / 0.01).exp();
            self.grid.initialize::<Temperature>(cell, t);
        }
    }

    /// The coordinate system.
    pub fn coordinates(&self) -> &Coordinates {
        &self.cs
    }

    /// Parameters in use.
    pub fn params(&self) -> &HeatParams {
        &self.params
    }

    /// Typed handle on the grid.
    pub fn grid_handle(&self) -> Arc<Grid<HeatBuffer>> {
        Arc::clone(&self.grid)
    }

    /// Cells updated by the diffusion kernel (everything but the boundary).
    pub fn interior_cells(&self) -> &[usize] {
        &self.interior
    }

    /// `kappa * dt * D_max`; forward Euler needs it at most 1.
    pub fn stability_number(&self) -> f32 {
        self.stability
    }

    /// Min and max temperature at time t.
    pub fn temperature_range(&self) -> (f32, f32) {
        (0..self.grid.size())
            .map(|c| self.grid.read::<Temperature>(c))
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), t| (lo.min(t), hi.max(t)))
    }

    fn diffuse(&self) {
        let grid = self.grid.grid_reference();
        let cs = &self.cs;
        let kdt = self.params.heat_coefficient * self.params.timestep;
        let dog = self.params.div_of_grad;
        let euler = !self.params.leapfrog;

        self.interior.par_iter().for_each(|&cell| {
            let l = grid.read::<Temperature>(cs.left_neighbor(cell));
            let r = grid.read::<Temperature>(cs.right_neighbor(cell));
            let b = grid.read::<Temperature>(cs.backward_neighbor(cell));
            let f = grid.read::<Temperature>(cs.forward_neighbor(cell));
            let c = grid.read::<Temperature>(cell);
            let pos = cs.cell_coordinate(cell).xy();

            let next = if euler {
                c + kdt * operator(cs, dog, l, r, b, f, c, pos)
            } else {
                let l0 = operator(cs, dog, l, r, b, f, 0.0, pos);
                let d = l0 - operator(cs, dog, l, r, b, f, 1.0, pos);
                let prev = grid.read_prev::<Temperature>(cell);
                ((1.0 - kdt * d) * prev + 2.0 * kdt * l0) / (1.0 + kdt * d)
            };
            grid.write::<Temperature>(cell, next);
        });

        self.mirrored.apply_par::<Temperature, HeatBuffer>(grid);
    }

    /// Face gradients and the divergence of the gradient of the new temperature.
    fn diagnose(&self) {
        let grid = self.grid.grid_reference();
        let cs = &self.cs;
        let size = cs.cell_size().xy();
        let hx = half_step(size, 0);
        let hy = half_step(size, 1);

        self.interior.par_iter().for_each(|&cell| {
            let l = grid.read_next::<Temperature>(cs.left_neighbor(cell));
            let r = grid.read_next::<Temperature>(cs.right_neighbor(cell));
            let b = grid.read_next::<Temperature>(cs.backward_neighbor(cell));
            let f = grid.read_next::<Temperature>(cs.forward_neighbor(cell));
            let c = grid.read_next::<Temperature>(cell);
            let pos = cs.cell_coordinate(cell).xy();

            grid.write::<TemperatureGradientX>(cell, gradient_2d(c, r, 0.0, 0.0, pos + hx, cs).x);
            grid.write::<TemperatureGradientY>(cell, gradient_2d(0.0, 0.0, c, f, pos + hy, cs).y);
            grid.write::<Divergence>(cell, div_grad(cs, l, r, b, f, c, pos));
        });
    }

    fn rotate(&self) {
        let every = u64::from(self.params.render_every.max(1));
        if self.steps % every == 0 {
            match self.params.render_mode {
                RenderMode::BestEffort => self.grid.swap_and_render(),
                RenderMode::NoDrop => self.grid.swap_and_render_wait(),
            }
        } else {
            self.grid.swap_buffer();
        }
    }
}

impl Simulation for HeatDiffusion {
    fn name(&self) -> &'static str {
        "heat"
    }

    fn simulate_once(&mut self) {
        self.diffuse();
        self.diagnose();
        self.steps += 1;
        self.rotate();
        trace!(step = self.steps, "[heat] step");
        if self.steps % 1000 == 0 {
            let (lo, hi) = self.temperature_range();
            debug!(step = self.steps, lo, hi, "[heat] temperature range");
        }
    }

    fn grid(&self) -> &dyn GridBase {
        self.grid.as_ref()
    }

    fn shared_grid(&self) -> Arc<dyn GridBase> {
        self.grid.clone()
    }

    fn steps(&self) -> u64 {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gyre_geo::{CartesianCoordinates2D, GeographicCoordinates2D};

    fn square(n: usize) -> Coordinates {
        CartesianCoordinates2D::bounded(Vec2::ZERO, Vec2::new(1.0, 1.0), [n, n]).into()
    }

    #[test]
    fn div_grad_matches_laplacian_on_the_plane() {
        let cs = CartesianCoordinates2D::bounded(Vec2::ZERO, Vec2::new(2.0, 1.0), [8, 8]);
        let pos = Vec2::new(1.0, 0.5);
        let a = div_grad(&cs, 1.0, 3.0, -2.0, 0.5, 0.25, pos);
        let b = laplace_2d(1.0, 3.0, -2.0, 0.5, 0.25, pos, &cs);
        assert!((a - b).abs() <= 1e-3 * b.abs().max(1.0), "{a} vs {b}");
    }

    #[test]
    fn rejects_bad_parameters() {
        let p = HeatParams { timestep: 0.0, ..HeatParams::default() };
        assert_eq!(
            HeatDiffusion::new(square(8), p).err(),
            Some(ConfigError::BadParameter { name: "timestep", value: 0.0 })
        );
        assert!(matches!(
            HeatDiffusion::new(square(2), HeatParams::default()),
            Err(ConfigError::TooSmallForBoundaries { .. })
        ));
    }

    #[test]
    fn interior_excludes_edges() {
        let sim = HeatDiffusion::new(square(6), HeatParams::default()).unwrap();
        assert_eq!(sim.interior_cells().len(), 16);

        let sphere = GeographicCoordinates2D::global([8, 6], 1.0).into();
        let sim = HeatDiffusion::new(sphere, HeatParams::default()).unwrap();
        // longitude wraps, only the two polar rows are boundary
        assert_eq!(sim.interior_cells().len(), 8 * 4);
    }

    #[test]
    fn stability_number_of_default_square() {
        let sim = HeatDiffusion::new(square(16), HeatParams::default()).unwrap();
        // kappa*dt*(2/dx^2 + 2/dy^2) with dx = dy = 1/16
        let expected = 0.01 * 0.001 * 4.0 * 256.0;
        assert!((sim.stability_number() - expected).abs() < 1e-4);
    }
}
