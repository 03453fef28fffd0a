//! Gyre viewer binary: runs a simulation on its own thread and consumes its render
//! frames on the main thread, optionally uploading them to the GPU.
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::dbg_macro, clippy::large_enum_variant)]

use std::f32::consts::FRAC_PI_2;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use engine::gpu::{self, RenderBuffers};
use engine::sim::{HeatDiffusion, RenderDemo, Simulation};
use engine::{CoordinateConfig, GridBase, HeatParams, RenderDemoParams, RenderMode};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SimKind {
    /// Temperature diffusion
    Heat,
    /// Static random field
    Demo,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CsArg {
    /// Bounded unit square
    Cartesian,
    /// Whole sphere
    Geographic,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    /// Drop frames the renderer could not take
    BestEffort,
    /// Block the simulation until every frame is rendered
    NoDrop,
}

#[derive(Parser, Debug)]
#[command(name = "gyre-viewer")]
#[command(about = "Run a gyre simulation and consume its render frames")]
struct Cli {
    /// Simulation to run
    #[arg(long, value_enum, default_value = "heat")]
    sim: SimKind,

    /// Coordinate system
    #[arg(long, value_enum, default_value = "cartesian")]
    cs: CsArg,

    /// Cells along the first axis
    #[arg(long, default_value = "64")]
    nx: usize,

    /// Cells along the second axis
    #[arg(long, default_value = "64")]
    ny: usize,

    /// Sphere radius (geographic only)
    #[arg(long, default_value = "1.0")]
    radius: f32,

    /// Simulation steps
    #[arg(long, default_value = "1000")]
    steps: u64,

    /// Frame handoff policy
    #[arg(long, value_enum, default_value = "best-effort")]
    render_mode: ModeArg,

    /// Stage a frame every N steps
    #[arg(long, default_value = "1")]
    render_every: u32,

    /// Diffusion coefficient
    #[arg(long, default_value = "0.01")]
    kappa: f32,

    /// Time step
    #[arg(long, default_value = "0.001")]
    timestep: f32,

    /// DuFort-Frankel leapfrog instead of forward Euler
    #[arg(long)]
    leapfrog: bool,

    /// Divergence of the face gradient instead of the Laplacian
    #[arg(long)]
    div_of_grad: bool,

    /// Zero-gradient x boundary
    #[arg(long)]
    isolated_x: bool,

    /// Zero-gradient y boundary
    #[arg(long)]
    isolated_y: bool,

    /// Upload every consumed frame to the GPU
    #[arg(long)]
    gpu: bool,
}

impl Cli {
    fn coordinates(&self) -> CoordinateConfig {
        match self.cs {
            CsArg::Cartesian => CoordinateConfig::Cartesian {
                min: [0.0, 0.0],
                max: [1.0, 1.0],
                cells: [self.nx, self.ny],
                periodic: [false, false],
            },
            CsArg::Geographic => CoordinateConfig::Geographic {
                min_lat: -FRAC_PI_2,
                max_lat: FRAC_PI_2,
                cells: [self.nx, self.ny],
                radius: self.radius,
            },
        }
    }

    fn heat_params(&self) -> HeatParams {
        HeatParams {
            heat_coefficient: self.kappa,
            timestep: self.timestep,
            leapfrog: self.leapfrog,
            div_of_grad: self.div_of_grad,
            isolated_x: self.isolated_x,
            isolated_y: self.isolated_y,
            render_mode: match self.render_mode {
                ModeArg::BestEffort => RenderMode::BestEffort,
                ModeArg::NoDrop => RenderMode::NoDrop,
            },
            render_every: self.render_every.max(1),
            ..HeatParams::default()
        }
    }

    fn build(&self) -> Result<Box<dyn Simulation>> {
        let cs = self.coordinates().build().context("coordinate system")?;
        Ok(match self.sim {
            SimKind::Heat => Box::new(HeatDiffusion::new(cs, self.heat_params()).context("heat diffusion")?),
            SimKind::Demo => Box::new(RenderDemo::new(&cs, RenderDemoParams::default())),
        })
    }
}

/// Range of the first attribute of a frame, as f32.
fn frame_range(bytes: &[u8]) -> (f32, f32) {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Consume frames until the simulation finished and nothing is left to render.
fn render_loop(grid: &dyn GridBase, done: &AtomicBool, upload: Option<(&gpu::GpuContext, RenderBuffers)>) -> Result<u64> {
    let mut frames = 0u64;
    let first = grid.render_layout().first().copied().unwrap_or_default();
    loop {
        if !grid.new_render_data_ready() {
            if done.load(Ordering::Acquire) && !grid.new_render_data_ready() {
                return Ok(frames);
            }
            thread::sleep(Duration::from_micros(200));
            continue;
        }
        let rendered = match &upload {
            Some((ctx, buffers)) => buffers.upload_if_new(&ctx.queue, grid)?,
            None => {
                let mut range = (0.0, 0.0);
                let took = grid.try_visit_render_frame(&mut |name, bytes| {
                    if name == first {
                        range = frame_range(bytes);
                    }
                });
                if took && frames % 100 == 0 {
                    debug!(frame = frames, attribute = first, lo = range.0, hi = range.1, "[viewer] frame");
                }
                took
            }
        };
        if rendered {
            frames += 1;
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,engine=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    info!(version = engine::version(), sim = ?cli.sim, cs = ?cli.cs, nx = cli.nx, ny = cli.ny, "[viewer] start");

    let mut sim = cli.build()?;
    let grid = sim.shared_grid();

    let upload = if cli.gpu {
        match gpu::persistent() {
            Some(ctx) => Some((ctx, RenderBuffers::new(&ctx.device, grid.as_ref()))),
            None => {
                warn!("[viewer] --gpu requested but no adapter, consuming on the CPU");
                None
            }
        }
    } else {
        None
    };

    let done = Arc::new(AtomicBool::new(false));
    let steps = cli.steps;
    let started = Instant::now();
    let simulation = {
        let done = Arc::clone(&done);
        thread::Builder::new().name("simulation".into()).spawn(move || {
            for _ in 0..steps {
                sim.simulate_once();
            }
            done.store(true, Ordering::Release);
            sim.name()
        })?
    };

    let frames = render_loop(grid.as_ref(), &done, upload)?;
    let name = simulation.join().map_err(|_| anyhow!("simulation thread panicked"))?;

    let elapsed = started.elapsed();
    info!(
        sim = name,
        steps,
        rotations = grid.rotations(),
        frames,
        elapsed_ms = elapsed.as_millis() as u64,
        "[viewer] done"
    );
    Ok(())
}
