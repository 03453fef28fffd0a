//! Four-slot multi-buffered grid with a render handoff.
//!
//! A [`Grid`] owns four [`AttributeSet`] slots and hands them out in rotating roles:
//! `read` (time t), `write` (t+1), `previous` (t-1) and an optional `render_await`
//! slot holding a finished frame the renderer has not picked up yet. The fourth slot
//! exists so a leapfrog step can keep t-1 around while a frame waits for the
//! renderer; whatever slot has no role is *unused* and is the next safe write target.
//!
//! The simulation thread calls one rotation per step:
//! - [`Grid::swap_buffer`] advances time only;
//! - [`Grid::swap_and_render`] also stages the new frame for rendering and drops
//!   older unrendered frames if the renderer is slow;
//! - [`Grid::swap_and_render_wait`] never drops a frame and blocks on the renderer.
//!
//! The render thread brackets its reads with [`Grid::start_rendering`] and
//! [`Grid::render_done`] (or drops the [`RenderFrame`]). It only ever sees the render
//! mirror, which is written at rotation boundaries, so a snapshot is never torn.
//!
//! Locks: `handoff` guards role changes and flag transitions, `render` guards the
//! mirror. The simulation side only `try_lock`s the mirror while holding `handoff`,
//! the render side takes `handoff` while holding the mirror, so there is no cycle.

pub mod reference;

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::{Duration, Instant};

use gyre_geo::CoordinateSystem;
use tracing::{debug, trace, warn};

pub use reference::GridReference;

use crate::attributes::{AttributeKind, AttributeSet, CellRead, HasAttribute, RenderAttributeSet};
use crate::error::GridError;

/// Number of physical buffers.
pub const SLOTS: usize = 4;

const NO_SLOT: u32 = 0xF;

/// Role assignment of the four slots.
///
/// `read`, `write` and `previous` are pairwise distinct and `render_await` is never
/// `write`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Roles {
    /// Slot holding time t.
    pub read: usize,
    /// Slot receiving time t+1.
    pub write: usize,
    /// Slot holding time t-1.
    pub previous: usize,
    /// Finished frame waiting to be copied into the render mirror.
    pub render_await: Option<usize>,
}

impl Roles {
    /// Assignment of a fresh grid.
    pub const INITIAL: Self = Self { read: 0, write: 1, previous: 2, render_await: None };

    /// Slot without a role, if any.
    pub fn unused(self) -> Option<usize> {
        let spare = self.spare();
        (self.render_await != Some(spare)).then_some(spare)
    }

    /// The one slot outside {read, write, previous}.
    #[inline]
    fn spare(self) -> usize {
        // slots are a permutation of 0..4, whose sum is 6
        6 - self.read - self.write - self.previous
    }

    /// One simulation step: t+1 becomes t, t becomes t-1, and the next write target
    /// is the old t-1 unless that slot still awaits rendering.
    fn rotate(self) -> Self {
        let write = if self.render_await == Some(self.previous) { self.spare() } else { self.previous };
        Self { read: self.write, write, previous: self.read, render_await: self.render_await }
    }

    fn pack(self) -> u32 {
        let pending = self.render_await.map_or(NO_SLOT, |s| s as u32);
        self.read as u32 | (self.write as u32) << 4 | (self.previous as u32) << 8 | pending << 12
    }

    fn unpack(bits: u32) -> Self {
        let pending = (bits >> 12) & 0xF;
        Self {
            read: (bits & 0xF) as usize,
            write: ((bits >> 4) & 0xF) as usize,
            previous: ((bits >> 8) & 0xF) as usize,
            render_await: (pending != NO_SLOT).then_some(pending as usize),
        }
    }
}

#[inline]
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Multi-buffered simulation grid. Share it between the simulation and render
/// threads through an `Arc`.
pub struct Grid<B: AttributeSet> {
    buffers: [B; SLOTS],
    roles: AtomicU32,
    rotations: AtomicU64,
    handoff: Mutex<()>,
    render: Mutex<B::Render>,
    unrendered: AtomicBool,
    waiting: AtomicBool,
    signal: Mutex<()>,
    wake: Condvar,
}

impl<B: AttributeSet> Grid<B> {
    /// Grid with `cells` default-valued cells in every slot.
    pub fn new(cells: usize) -> Self {
        Self {
            buffers: [B::new(cells), B::new(cells), B::new(cells), B::new(cells)],
            roles: AtomicU32::new(Roles::INITIAL.pack()),
            rotations: AtomicU64::new(0),
            handoff: Mutex::new(()),
            render: Mutex::new(<B::Render as RenderAttributeSet>::new(cells)),
            unrendered: AtomicBool::new(false),
            waiting: AtomicBool::new(false),
            signal: Mutex::new(()),
            wake: Condvar::new(),
        }
    }

    /// Grid sized for a coordinate system.
    pub fn for_coordinates<C: CoordinateSystem + ?Sized>(cs: &C) -> Self {
        Self::new(cs.num_grid_cells())
    }

    /// Number of cells.
    #[inline]
    pub fn size(&self) -> usize {
        self.buffers[0].size()
    }

    /// Current role assignment.
    #[inline]
    pub fn roles(&self) -> Roles {
        Roles::unpack(self.roles.load(Ordering::Acquire))
    }

    /// Number of rotations since construction.
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    /// Physical slot `index`, regardless of its role.
    pub fn slot(&self, index: usize) -> &B {
        &self.buffers[index]
    }

    /// Buffer holding time t.
    #[inline]
    pub fn read_buffer(&self) -> &B {
        &self.buffers[self.roles().read]
    }

    /// Buffer receiving time t+1.
    #[inline]
    pub fn write_buffer(&self) -> &B {
        &self.buffers[self.roles().write]
    }

    /// Buffer holding time t-1.
    #[inline]
    pub fn previous_buffer(&self) -> &B {
        &self.buffers[self.roles().previous]
    }

    /// Read `K` at time t.
    #[inline]
    pub fn read<K: AttributeKind>(&self, cell: usize) -> K::Value
    where
        B: HasAttribute<K>,
    {
        self.read_buffer().attribute().read(cell)
    }

    /// Read `K` at time t+1 (what has been written this step so far).
    #[inline]
    pub fn read_next<K: AttributeKind>(&self, cell: usize) -> K::Value
    where
        B: HasAttribute<K>,
    {
        self.write_buffer().attribute().read(cell)
    }

    /// Read `K` at time t-1.
    #[inline]
    pub fn read_prev<K: AttributeKind>(&self, cell: usize) -> K::Value
    where
        B: HasAttribute<K>,
    {
        self.previous_buffer().attribute().read(cell)
    }

    /// Write `K` at time t+1.
    #[inline]
    pub fn write<K: AttributeKind>(&self, cell: usize, value: K::Value)
    where
        B: HasAttribute<K>,
    {
        self.write_buffer().attribute().write(cell, value);
    }

    /// Write `K` at time t. Racy against concurrent readers of t; the caller
    /// serializes.
    #[inline]
    pub fn write_current<K: AttributeKind>(&self, cell: usize, value: K::Value)
    where
        B: HasAttribute<K>,
    {
        self.read_buffer().attribute().write(cell, value);
    }

    /// Carry `K` over unchanged from t to t+1.
    #[inline]
    pub fn copy<K: AttributeKind>(&self, cell: usize)
    where
        B: HasAttribute<K>,
    {
        let roles = self.roles();
        let v = self.buffers[roles.read].attribute().read(cell);
        self.buffers[roles.write].attribute().write(cell, v);
    }

    /// Write `value` into all four slots. Setup only: not safe against concurrent
    /// readers or rotations.
    pub fn initialize<K: AttributeKind>(&self, cell: usize, value: K::Value)
    where
        B: HasAttribute<K>,
    {
        for b in &self.buffers {
            b.attribute().write(cell, value);
        }
    }

    /// View of the current read/write/previous buffers. Stale after the next
    /// rotation.
    pub fn grid_reference(&self) -> GridReference<'_, B> {
        let r = self.roles();
        GridReference::new(&self.buffers[r.read], &self.buffers[r.write], &self.buffers[r.previous])
    }

    /// Advance one step without touching rendering.
    pub fn swap_buffer(&self) {
        let _handoff = lock(&self.handoff);
        let roles = self.roles().rotate();
        self.store_roles(roles);
        self.rotations.fetch_add(1, Ordering::Relaxed);
        trace!(read = roles.read, write = roles.write, previous = roles.previous, "[grid] swap");
    }

    /// Advance one step and stage the finished frame for rendering.
    ///
    /// If the renderer currently holds the mirror the copy is deferred to its
    /// `render_done`; a newer frame staged before that replaces this one.
    pub fn swap_and_render(&self) {
        let _handoff = lock(&self.handoff);
        self.rotate_for_render();
        self.stage_or_defer();
    }

    /// Advance one step and stage the finished frame, blocking until the renderer has
    /// taken every earlier frame. No frame is ever dropped.
    pub fn swap_and_render_wait(&self) {
        self.wait_until_clear(&self.waiting, None);
        {
            let _handoff = lock(&self.handoff);
            self.rotate_for_render();
        }
        self.wait_until_clear(&self.unrendered, None);
        let _handoff = lock(&self.handoff);
        self.stage_or_defer();
    }

    /// [`Grid::swap_and_render_wait`] with an upper bound on the blocking time.
    ///
    /// If an older frame is still pending when `timeout` expires, nothing is rotated.
    /// If the rotation happened but the renderer has not drained its snapshot in time,
    /// the new frame stays queued and the renderer's next `render_done` stages it.
    ///
    /// # Errors
    /// [`GridError::RenderWaitTimeout`] when the renderer did not keep up in time.
    pub fn swap_and_render_wait_timeout(&self, timeout: Duration) -> Result<(), GridError> {
        // an unrepresentable deadline means no bound
        let deadline = Instant::now().checked_add(timeout);
        if !self.wait_until_clear(&self.waiting, deadline) {
            warn!(?timeout, "[grid] pending frame not taken, skipping rotation");
            return Err(GridError::RenderWaitTimeout(timeout));
        }
        {
            let _handoff = lock(&self.handoff);
            self.rotate_for_render();
        }
        let drained = self.wait_until_clear(&self.unrendered, deadline);
        let _handoff = lock(&self.handoff);
        if drained || !self.unrendered.load(Ordering::Acquire) {
            self.stage_or_defer();
            Ok(())
        } else {
            // still unrendered under the lock, so a render_done is guaranteed to follow
            self.waiting.store(true, Ordering::Release);
            warn!(?timeout, "[grid] renderer behind, frame queued");
            Err(GridError::RenderWaitTimeout(timeout))
        }
    }

    /// Renderer side: take the mirror, blocking while a copy is in progress.
    pub fn start_rendering(&self) -> RenderFrame<'_, B> {
        RenderFrame { grid: self, mirror: Some(lock(&self.render)) }
    }

    /// Non-blocking [`Grid::start_rendering`].
    pub fn try_start_rendering(&self) -> Option<RenderFrame<'_, B>> {
        let mirror = match self.render.try_lock() {
            Ok(m) => m,
            Err(TryLockError::Poisoned(p)) => p.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };
        Some(RenderFrame { grid: self, mirror: Some(mirror) })
    }

    /// True when the mirror holds a frame the renderer has not finished yet.
    #[inline]
    pub fn new_render_data_ready(&self) -> bool {
        self.unrendered.load(Ordering::Acquire)
    }

    /// Renderer side: release the mirror. Same as dropping the frame.
    pub fn render_done(&self, frame: RenderFrame<'_, B>) {
        debug_assert!(std::ptr::eq(frame.grid, self), "frame belongs to another grid");
        drop(frame);
    }

    /// Exchange the complete state with `other`. Setup only.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    fn store_roles(&self, roles: Roles) {
        debug_assert!(roles.read != roles.write && roles.write != roles.previous && roles.read != roles.previous);
        debug_assert!(roles.render_await != Some(roles.write));
        self.roles.store(roles.pack(), Ordering::Release);
    }

    /// Rotate and mark the new t as awaiting rendering. Caller holds `handoff`.
    fn rotate_for_render(&self) {
        let mut roles = self.roles().rotate();
        roles.render_await = Some(roles.read);
        self.store_roles(roles);
        self.rotations.fetch_add(1, Ordering::Relaxed);
        trace!(read = roles.read, write = roles.write, previous = roles.previous, "[grid] swap+render");
    }

    /// Copy the awaiting frame now if the mirror is free, else leave it to the
    /// renderer. Caller holds `handoff`.
    fn stage_or_defer(&self) {
        match self.render.try_lock() {
            Ok(mut mirror) => {
                self.stage(&mut mirror);
            }
            Err(TryLockError::Poisoned(p)) => {
                self.stage(&mut p.into_inner());
            }
            Err(TryLockError::WouldBlock) => {
                self.waiting.store(true, Ordering::Release);
                debug!("[grid] renderer busy, copy deferred");
            }
        }
    }

    /// Copy the awaiting slot into the mirror and release it. A queued deferred copy
    /// is settled by this one. Caller holds `handoff` and the mirror. Returns whether
    /// a frame was copied.
    fn stage(&self, mirror: &mut B::Render) -> bool {
        self.waiting.store(false, Ordering::Release);
        let roles = self.roles();
        let Some(slot) = roles.render_await else {
            return false;
        };
        self.buffers[slot].copy_to_render(mirror);
        self.unrendered.store(true, Ordering::Release);
        self.store_roles(Roles { render_await: None, ..roles });
        trace!(slot, "[grid] staged frame");
        true
    }

    fn finish_rendering(&self, mut mirror: MutexGuard<'_, B::Render>) {
        let handoff = lock(&self.handoff);
        // clear first: a deferred copy below is a fresh, unrendered frame
        self.unrendered.store(false, Ordering::Release);
        if self.waiting.load(Ordering::Acquire) && self.stage(&mut mirror) {
            debug!("[grid] deferred copy staged");
        }
        drop(mirror);
        drop(handoff);
        let _signal = lock(&self.signal);
        self.wake.notify_all();
    }

    /// Block until `flag` is false. Returns false if `deadline` passed first.
    fn wait_until_clear(&self, flag: &AtomicBool, deadline: Option<Instant>) -> bool {
        let mut signal = lock(&self.signal);
        while flag.load(Ordering::Acquire) {
            match deadline {
                None => signal = self.wake.wait(signal).unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    let (guard, _) =
                        self.wake.wait_timeout(signal, deadline - now).unwrap_or_else(PoisonError::into_inner);
                    signal = guard;
                }
            }
        }
        true
    }
}

impl<B: AttributeSet> Clone for Grid<B> {
    /// Deep copy of all four slots, the mirror, the roles and the flags. Setup only.
    fn clone(&self) -> Self {
        let mirror = lock(&self.render).clone();
        Self {
            buffers: self.buffers.clone(),
            roles: AtomicU32::new(self.roles.load(Ordering::Acquire)),
            rotations: AtomicU64::new(self.rotations()),
            handoff: Mutex::new(()),
            render: Mutex::new(mirror),
            unrendered: AtomicBool::new(self.unrendered.load(Ordering::Acquire)),
            waiting: AtomicBool::new(self.waiting.load(Ordering::Acquire)),
            signal: Mutex::new(()),
            wake: Condvar::new(),
        }
    }
}

impl<B: AttributeSet> fmt::Debug for Grid<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("cells", &self.size())
            .field("roles", &self.roles())
            .field("rotations", &self.rotations())
            .field("unrendered", &self.unrendered.load(Ordering::Relaxed))
            .field("waiting", &self.waiting.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<K: AttributeKind, B: AttributeSet + HasAttribute<K>> CellRead<K> for Grid<B> {
    #[inline]
    fn read_cell(&self, cell: usize) -> K::Value {
        self.read::<K>(cell)
    }
}

/// Exclusive access to the render mirror. Dropping it is `render_done`.
pub struct RenderFrame<'a, B: AttributeSet> {
    grid: &'a Grid<B>,
    mirror: Option<MutexGuard<'a, B::Render>>,
}

impl<B: AttributeSet> Deref for RenderFrame<'_, B> {
    type Target = B::Render;

    fn deref(&self) -> &B::Render {
        match &self.mirror {
            Some(m) => &**m,
            None => unreachable!("render frame used after release"),
        }
    }
}

impl<B: AttributeSet> Drop for RenderFrame<'_, B> {
    fn drop(&mut self) {
        if let Some(mirror) = self.mirror.take() {
            self.grid.finish_rendering(mirror);
        }
    }
}

/// Object-safe view of a grid, for code that handles differently attributed grids
/// (render loops, GPU upload, drivers).
pub trait GridBase: Send + Sync {
    /// Number of cells.
    fn size(&self) -> usize;
    /// Current role assignment.
    fn roles(&self) -> Roles;
    /// Rotations since construction.
    fn rotations(&self) -> u64;
    /// See [`Grid::swap_buffer`].
    fn swap_buffer(&self);
    /// See [`Grid::swap_and_render`].
    fn swap_and_render(&self);
    /// See [`Grid::swap_and_render_wait`].
    fn swap_and_render_wait(&self);
    /// See [`Grid::swap_and_render_wait_timeout`].
    ///
    /// # Errors
    /// [`GridError::RenderWaitTimeout`] when the renderer did not keep up in time.
    fn swap_and_render_wait_timeout(&self, timeout: Duration) -> Result<(), GridError>;
    /// See [`Grid::new_render_data_ready`].
    fn new_render_data_ready(&self) -> bool;
    /// Names of the mirrored attributes in binding order.
    fn render_layout(&self) -> &'static [&'static str];
    /// `start_rendering`, visit every attribute as `(name, bytes)`, `render_done`.
    fn visit_render_frame(&self, visit: &mut dyn FnMut(&'static str, &[u8]));
    /// Like [`GridBase::visit_render_frame`] but returns false instead of blocking.
    fn try_visit_render_frame(&self, visit: &mut dyn FnMut(&'static str, &[u8])) -> bool;
}

impl<B: AttributeSet> GridBase for Grid<B> {
    fn size(&self) -> usize {
        Grid::size(self)
    }
    fn roles(&self) -> Roles {
        Grid::roles(self)
    }
    fn rotations(&self) -> u64 {
        Grid::rotations(self)
    }
    fn swap_buffer(&self) {
        Grid::swap_buffer(self);
    }
    fn swap_and_render(&self) {
        Grid::swap_and_render(self);
    }
    fn swap_and_render_wait(&self) {
        Grid::swap_and_render_wait(self);
    }
    fn swap_and_render_wait_timeout(&self, timeout: Duration) -> Result<(), GridError> {
        Grid::swap_and_render_wait_timeout(self, timeout)
    }
    fn new_render_data_ready(&self) -> bool {
        Grid::new_render_data_ready(self)
    }
    fn render_layout(&self) -> &'static [&'static str] {
        <B::Render as RenderAttributeSet>::layout()
    }
    fn visit_render_frame(&self, visit: &mut dyn FnMut(&'static str, &[u8])) {
        let frame = self.start_rendering();
        frame.for_each_attribute(visit);
    }
    fn try_visit_render_frame(&self, visit: &mut dyn FnMut(&'static str, &[u8])) -> bool {
        match self.try_start_rendering() {
            Some(frame) => {
                frame.for_each_attribute(visit);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{Density, FluidBuffer, VelocityX};

    #[test]
    fn roles_pack_round_trip() {
        let r = Roles { read: 3, write: 0, previous: 1, render_await: Some(2) };
        assert_eq!(Roles::unpack(r.pack()), r);
        assert_eq!(Roles::unpack(Roles::INITIAL.pack()), Roles::INITIAL);
        assert_eq!(Roles::INITIAL.unused(), Some(3));
        assert_eq!(r.unused(), None);
    }

    #[test]
    fn rotate_avoids_awaiting_slot() {
        let r = Roles { read: 0, write: 1, previous: 2, render_await: Some(2) };
        let n = r.rotate();
        assert_eq!(n.read, 1);
        assert_eq!(n.previous, 0);
        assert_eq!(n.write, 3);
        assert_eq!(n.render_await, Some(2));
    }

    #[test]
    fn swap_buffer_shifts_time_levels() {
        let g = Grid::<FluidBuffer>::new(2);
        g.write::<Density>(0, 1.0);
        g.swap_buffer();
        assert_eq!(g.read::<Density>(0), 1.0);
        g.write::<Density>(0, 2.0);
        g.swap_buffer();
        assert_eq!(g.read::<Density>(0), 2.0);
        assert_eq!(g.read_prev::<Density>(0), 1.0);
    }

    #[test]
    fn copy_and_write_current() {
        let g = Grid::<FluidBuffer>::new(1);
        g.write_current::<VelocityX>(0, 4.0);
        g.copy::<VelocityX>(0);
        assert_eq!(g.read_next::<VelocityX>(0), 4.0);
    }

    #[test]
    fn render_frame_drop_clears_flag() {
        let g = Grid::<FluidBuffer>::new(3);
        g.write::<Density>(1, 5.0);
        g.swap_and_render();
        assert!(g.new_render_data_ready());
        {
            let frame = g.start_rendering();
            assert_eq!(frame.density.read(1), 5.0);
        }
        assert!(!g.new_render_data_ready());
        assert_eq!(g.roles().render_await, None);
    }

    #[test]
    fn busy_renderer_defers_copy() {
        let g = Grid::<FluidBuffer>::new(1);
        let frame = g.start_rendering();
        g.write::<Density>(0, 7.0);
        g.swap_and_render();
        assert!(!g.new_render_data_ready());
        assert!(g.roles().render_await.is_some());
        g.render_done(frame);
        assert!(g.new_render_data_ready());
        let frame = g.try_start_rendering();
        assert!(frame.is_some_and(|f| f.density.read(0) == 7.0));
    }

    #[test]
    fn timeout_when_renderer_never_drains() {
        let g = Grid::<FluidBuffer>::new(1);
        g.swap_and_render();
        let err = g.swap_and_render_wait_timeout(Duration::from_millis(20));
        assert_eq!(err, Err(GridError::RenderWaitTimeout(Duration::from_millis(20))));
        // the queued frame is staged by the next render_done
        drop(g.start_rendering());
        assert!(g.new_render_data_ready());
    }

    #[test]
    fn clone_is_independent() {
        let g = Grid::<FluidBuffer>::new(2);
        g.swap_buffer();
        g.write::<Density>(0, 3.0);
        let c = g.clone();
        g.write::<Density>(0, 8.0);
        assert_eq!(c.read_next::<Density>(0), 3.0);
        assert_eq!(c.roles(), g.roles());
    }
}
