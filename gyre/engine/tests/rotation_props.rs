use engine::attributes::{Density, FluidBuffer};
use engine::grid::{Grid, RenderFrame};
use proptest::prelude::*;

#[derive(Clone, Copy, Debug)]
enum Op {
    Swap,
    SwapRender,
    SwapRenderWait,
    BeginRender,
    EndRender,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Swap),
        Just(Op::SwapRender),
        Just(Op::SwapRenderWait),
        Just(Op::BeginRender),
        Just(Op::EndRender),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn roles_stay_a_valid_assignment(ops in proptest::collection::vec(op(), 1..64)) {
        let grid = Grid::<FluidBuffer>::new(4);
        let mut held: Option<RenderFrame<'_, FluidBuffer>> = None;
        let mut rotations = 0u64;

        for (step, op) in ops.into_iter().enumerate() {
            match op {
                Op::Swap => {
                    grid.swap_buffer();
                    rotations += 1;
                }
                Op::SwapRender => {
                    grid.swap_and_render();
                    rotations += 1;
                }
                Op::SwapRenderWait => {
                    // blocking handoff needs a drained mirror on a single thread
                    drop(held.take());
                    if grid.new_render_data_ready() {
                        drop(grid.start_rendering());
                    }
                    grid.swap_and_render_wait();
                    rotations += 1;
                }
                Op::BeginRender => {
                    if held.is_none() {
                        held = Some(grid.start_rendering());
                    }
                }
                Op::EndRender => drop(held.take()),
            }
            // tag the write slot so stale frames are distinguishable
            grid.write::<Density>(0, step as f32);

            let r = grid.roles();
            prop_assert_ne!(r.read, r.write);
            prop_assert_ne!(r.write, r.previous);
            prop_assert_ne!(r.read, r.previous);
            prop_assert_ne!(r.render_await, Some(r.write));
            prop_assert!(r.read < 4 && r.write < 4 && r.previous < 4);
            if held.is_none() {
                // nothing can be pending while the mirror is free
                prop_assert_eq!(r.render_await, None);
            }
            prop_assert_eq!(grid.rotations(), rotations);
        }
    }

    #[test]
    fn leapfrog_levels_shift_by_one(steps in 1usize..32) {
        let grid = Grid::<FluidBuffer>::new(1);
        for s in 0..steps {
            grid.write::<Density>(0, s as f32 + 1.0);
            grid.swap_and_render();
            prop_assert_eq!(grid.read::<Density>(0), s as f32 + 1.0);
            prop_assert_eq!(grid.read_prev::<Density>(0), s as f32);
        }
    }
}
