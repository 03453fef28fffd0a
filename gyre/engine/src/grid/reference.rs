//! Borrowed view of one rotation state of a [`Grid`](super::Grid).

use std::fmt;

use crate::attributes::{AttributeKind, AttributeSet, CellRead, HasAttribute};

/// Copyable view of the read/write/previous buffers of a grid, as assigned when the
/// view was taken. Cheap to pass into parallel kernels.
///
/// The view does not follow rotations: after the grid rotates it still points at the
/// old slots, and reading or writing through it is a logic error.
pub struct GridReference<'a, B: AttributeSet> {
    read: &'a B,
    write: &'a B,
    previous: &'a B,
}

impl<'a, B: AttributeSet> GridReference<'a, B> {
    pub(crate) fn new(read: &'a B, write: &'a B, previous: &'a B) -> Self {
        Self { read, write, previous }
    }

    /// Number of cells.
    #[inline]
    pub fn size(&self) -> usize {
        self.read.size()
    }

    /// Read `K` at time t.
    #[inline]
    pub fn read<K: AttributeKind>(&self, cell: usize) -> K::Value
    where
        B: HasAttribute<K>,
    {
        self.read.attribute().read(cell)
    }

    /// Read `K` at time t+1.
    #[inline]
    pub fn read_next<K: AttributeKind>(&self, cell: usize) -> K::Value
    where
        B: HasAttribute<K>,
    {
        self.write.attribute().read(cell)
    }

    /// Read `K` at time t-1.
    #[inline]
    pub fn read_prev<K: AttributeKind>(&self, cell: usize) -> K::Value
    where
        B: HasAttribute<K>,
    {
        self.previous.attribute().read(cell)
    }

    /// Write `K` at time t+1.
    #[inline]
    pub fn write<K: AttributeKind>(&self, cell: usize, value: K::Value)
    where
        B: HasAttribute<K>,
    {
        self.write.attribute().write(cell, value);
    }

    /// Write `K` at time t.
    #[inline]
    pub fn write_current<K: AttributeKind>(&self, cell: usize, value: K::Value)
    where
        B: HasAttribute<K>,
    {
        self.read.attribute().write(cell, value);
    }

    /// Carry `K` over unchanged from t to t+1.
    #[inline]
    pub fn copy<K: AttributeKind>(&self, cell: usize)
    where
        B: HasAttribute<K>,
    {
        self.write.attribute().write(cell, self.read.attribute().read(cell));
    }

    /// The time-t buffer.
    pub fn read_buffer(&self) -> &'a B {
        self.read
    }

    /// The time-t+1 buffer.
    pub fn write_buffer(&self) -> &'a B {
        self.write
    }

    /// The time-t-1 buffer.
    pub fn previous_buffer(&self) -> &'a B {
        self.previous
    }
}

impl<B: AttributeSet> Clone for GridReference<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: AttributeSet> Copy for GridReference<'_, B> {}

impl<B: AttributeSet> fmt::Debug for GridReference<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridReference").field("cells", &self.size()).finish_non_exhaustive()
    }
}

impl<K: AttributeKind, B: AttributeSet + HasAttribute<K>> CellRead<K> for GridReference<'_, B> {
    #[inline]
    fn read_cell(&self, cell: usize) -> K::Value {
        self.read::<K>(cell)
    }
}
