//! Static random field for exercising the render path.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, trace};

use gyre_geo::{curl_2d_centered, Coordinates, CoordinateSystem};

use super::{normal, Simulation};
use crate::attributes::{Density, FluidBuffer, VelocityX, VelocityY, Vorticity};
use crate::config::RenderDemoParams;
use crate::grid::{Grid, GridBase};

/// Random density and flow, staged once. Stepping does nothing.
pub struct RenderDemo {
    grid: Arc<Grid<FluidBuffer>>,
}

impl RenderDemo {
    /// Fill every slot and stage the field for rendering.
    pub fn new(cs: &Coordinates, params: RenderDemoParams) -> Self {
        let grid = Grid::<FluidBuffer>::for_coordinates(cs);
        let mut rng = StdRng::seed_from_u64(params.seed);
        let n = cs.num_grid_cells();

        for cell in 0..n {
            grid.initialize::<Density>(cell, normal(&mut rng, 10.0, 4.0).max(0.0));
            let [u, v] = if params.random_vectors {
                [normal(&mut rng, 0.0, 4.0), normal(&mut rng, 0.0, 4.0)]
            } else {
                params.vector
            };
            grid.initialize::<VelocityX>(cell, u);
            grid.initialize::<VelocityY>(cell, v);
        }

        for cell in 0..n {
            let (l, r) = (cs.left_neighbor(cell), cs.right_neighbor(cell));
            let (b, f) = (cs.backward_neighbor(cell), cs.forward_neighbor(cell));
            // centred differences need a neighbour on both sides
            let vort = if [l, r, b, f].contains(&cell) {
                0.0
            } else {
                let pos = cs.cell_coordinate(cell).xy();
                curl_2d_centered(
                    grid.read::<VelocityY>(l),
                    grid.read::<VelocityY>(r),
                    grid.read::<VelocityX>(b),
                    grid.read::<VelocityX>(f),
                    pos,
                    cs,
                )
            };
            grid.initialize::<Vorticity>(cell, vort);
        }

        grid.swap_and_render();
        info!(cells = n, random = params.random_vectors, "[demo] field staged");
        Self { grid: Arc::new(grid) }
    }

    /// Typed handle on the grid.
    pub fn grid_handle(&self) -> Arc<Grid<FluidBuffer>> {
        Arc::clone(&self.grid)
    }
}

impl Simulation for RenderDemo {
    fn name(&self) -> &'static str {
        "render-demo"
    }

    fn simulate_once(&mut self) {
        trace!("[demo] nothing to simulate");
    }

    fn grid(&self) -> &dyn GridBase {
        self.grid.as_ref()
    }

    fn shared_grid(&self) -> Arc<dyn GridBase> {
        self.grid.clone()
    }

    fn steps(&self) -> u64 {
        0
    }
}
