use engine::attributes::{Density, FluidBuffer, Vorticity};
use engine::gpu::{persistent, GpuError, RenderBuffers};
use engine::{Grid, GridBase};

#[test]
fn render_mirror_reaches_the_device() {
    let Some(ctx) = persistent() else {
        eprintln!("skipping: no GPU adapter");
        return;
    };
    let grid = Grid::<FluidBuffer>::new(64);
    for cell in 0..64 {
        grid.write::<Density>(cell, cell as f32 * 0.5);
        grid.write::<Vorticity>(cell, -(cell as f32));
    }
    grid.swap_and_render();

    let buffers = RenderBuffers::new(&ctx.device, &grid);
    assert_eq!(buffers.cells(), 64);
    assert!(buffers.upload_if_new(&ctx.queue, &grid).unwrap());
    assert!(!buffers.upload_if_new(&ctx.queue, &grid).unwrap());

    let density = buffers.read_back(ctx, "density").unwrap();
    let density: Vec<f32> = density.into_iter().map(f32::from_bits).collect();
    assert_eq!(density[10], 5.0);
    let vorticity = buffers.read_back(ctx, "vorticity").unwrap();
    assert_eq!(f32::from_bits(vorticity[63]), -63.0);
    assert!(buffers.read_back(ctx, "pressure").is_none());
}

#[test]
fn layout_mismatch_is_rejected() {
    let Some(ctx) = persistent() else {
        eprintln!("skipping: no GPU adapter");
        return;
    };
    let small = Grid::<FluidBuffer>::new(4);
    let large = Grid::<FluidBuffer>::new(8);
    let buffers = RenderBuffers::new(&ctx.device, &small);
    let err = buffers.upload(&ctx.queue, &large as &dyn GridBase);
    assert!(matches!(err, Err(GpuError::LayoutMismatch { expected: 4, cells: 4 })));
}
