//! Per-cell attribute storage.
//!
//! An attribute is one scalar field over all cells (density, temperature, ...). Its
//! identity is a marker type implementing [`AttributeKind`], so selecting a field in a
//! buffer is resolved at compile time: asking a buffer for a kind it does not contain
//! fails to type-check.
//!
//! Cell values are 32 bit and stored as relaxed atomics. Writes go through `&self`,
//! which lets parallel per-cell kernels write distinct cells of the same buffer
//! without locking; ordering between steps comes from the grid's rotation locks.
//!
//! Concrete buffers are declared with [`attribute_set!`](crate::attribute_set), which
//! generates the simulation buffer, its render mirror and the kind dispatch impls.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};

use bytemuck::Pod;

/// A 32-bit plain-old-data cell value.
pub trait CellValue: Pod + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Raw bit pattern.
    fn to_bits(self) -> u32;
    /// Inverse of [`CellValue::to_bits`].
    fn from_bits(bits: u32) -> Self;
}

impl CellValue for f32 {
    #[inline]
    fn to_bits(self) -> u32 {
        f32::to_bits(self)
    }
    #[inline]
    fn from_bits(bits: u32) -> Self {
        f32::from_bits(bits)
    }
}

impl CellValue for u32 {
    #[inline]
    fn to_bits(self) -> u32 {
        self
    }
    #[inline]
    fn from_bits(bits: u32) -> Self {
        bits
    }
}

impl CellValue for i32 {
    #[inline]
    fn to_bits(self) -> u32 {
        bytemuck::cast(self)
    }
    #[inline]
    fn from_bits(bits: u32) -> Self {
        bytemuck::cast(bits)
    }
}

/// Type-level tag naming a physical quantity.
pub trait AttributeKind: Send + Sync + 'static {
    /// Value type stored per cell.
    type Value: CellValue;
    /// Human readable name, used for render layouts and logs.
    const NAME: &'static str;
}

macro_rules! kinds {
    ($($(#[$meta:meta])* $kind:ident => $name:literal),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
            pub struct $kind;

            impl AttributeKind for $kind {
                type Value = f32;
                const NAME: &'static str = $name;
            }
        )+
    };
}

kinds! {
    /// Mass density (or any advected tracer).
    Density => "density",
    /// Velocity along the first axis (eastward on the sphere).
    VelocityX => "velocity_x",
    /// Velocity along the second axis (northward on the sphere).
    VelocityY => "velocity_y",
    /// Temperature.
    Temperature => "temperature",
    /// Temperature gradient along the first axis.
    TemperatureGradientX => "temperature_gradient_x",
    /// Temperature gradient along the second axis.
    TemperatureGradientY => "temperature_gradient_y",
    /// Geopotential height times gravity.
    Geopotential => "geopotential",
    /// Vertical vorticity.
    Vorticity => "vorticity",
    /// Horizontal divergence.
    Divergence => "divergence",
}

/// Fixed-length array of cell values of one kind.
///
/// No bounds checks beyond the slice index; a bad cell id panics.
pub struct GridAttribute<K: AttributeKind> {
    data: Box<[AtomicU32]>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: AttributeKind> GridAttribute<K> {
    /// Attribute with `cells` default values.
    pub fn new(cells: usize) -> Self {
        let zero = K::Value::default().to_bits();
        Self { data: (0..cells).map(|_| AtomicU32::new(zero)).collect(), _kind: PhantomData }
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for the default-constructed empty attribute.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value of `cell`.
    #[inline]
    pub fn read(&self, cell: usize) -> K::Value {
        K::Value::from_bits(self.data[cell].load(Ordering::Relaxed))
    }

    /// Overwrite `cell`.
    #[inline]
    pub fn write(&self, cell: usize, value: K::Value) {
        self.data[cell].store(value.to_bits(), Ordering::Relaxed);
    }

    /// Set every cell to `value`.
    pub fn fill(&self, value: K::Value) {
        let bits = value.to_bits();
        for v in self.data.iter() {
            v.store(bits, Ordering::Relaxed);
        }
    }

    /// Element-wise copy of `other`. Sizes must match.
    pub fn copy_from(&self, other: &Self) {
        debug_assert_eq!(self.len(), other.len(), "attribute size mismatch");
        for (dst, src) in self.data.iter().zip(other.data.iter()) {
            dst.store(src.load(Ordering::Relaxed), Ordering::Relaxed);
        }
    }

    /// Snapshot of all values.
    pub fn to_vec(&self) -> Vec<K::Value> {
        self.data.iter().map(|v| K::Value::from_bits(v.load(Ordering::Relaxed))).collect()
    }

    /// Copy all values into a render mirror of the same size.
    pub fn copy_to_render(&self, render: &mut RenderAttribute<K>) {
        debug_assert_eq!(self.len(), render.len(), "render mirror size mismatch");
        for (dst, src) in render.data.iter_mut().zip(self.data.iter()) {
            *dst = K::Value::from_bits(src.load(Ordering::Relaxed));
        }
    }
}

impl<K: AttributeKind> Default for GridAttribute<K> {
    fn default() -> Self {
        Self { data: Box::new([]), _kind: PhantomData }
    }
}

impl<K: AttributeKind> Clone for GridAttribute<K> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.iter().map(|v| AtomicU32::new(v.load(Ordering::Relaxed))).collect(),
            _kind: PhantomData,
        }
    }
}

impl<K: AttributeKind> fmt::Debug for GridAttribute<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridAttribute").field("kind", &K::NAME).field("cells", &self.len()).finish()
    }
}

/// Plain host mirror of one attribute, laid out for GPU upload.
pub struct RenderAttribute<K: AttributeKind> {
    data: Vec<K::Value>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: AttributeKind> RenderAttribute<K> {
    /// Mirror with `cells` default values.
    pub fn new(cells: usize) -> Self {
        Self { data: vec![K::Value::default(); cells], _kind: PhantomData }
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for an empty mirror.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value of `cell` in the staged snapshot.
    #[inline]
    pub fn read(&self, cell: usize) -> K::Value {
        self.data[cell]
    }

    /// Staged values.
    #[inline]
    pub fn as_slice(&self) -> &[K::Value] {
        &self.data
    }

    /// Staged values as raw bytes, ready for `queue.write_buffer`.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

impl<K: AttributeKind> Default for RenderAttribute<K> {
    fn default() -> Self {
        Self { data: Vec::new(), _kind: PhantomData }
    }
}

impl<K: AttributeKind> Clone for RenderAttribute<K> {
    fn clone(&self) -> Self {
        Self { data: self.data.clone(), _kind: PhantomData }
    }
}

impl<K: AttributeKind> fmt::Debug for RenderAttribute<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderAttribute").field("kind", &K::NAME).field("cells", &self.len()).finish()
    }
}

/// Compile-time lookup of the attribute of kind `K` inside a buffer.
pub trait HasAttribute<K: AttributeKind> {
    /// The attribute storage.
    fn attribute(&self) -> &GridAttribute<K>;
}

/// Compile-time lookup of the attribute of kind `K` inside a render mirror.
pub trait HasRenderAttribute<K: AttributeKind> {
    /// The mirrored attribute.
    fn render_attribute(&self) -> &RenderAttribute<K>;
}

/// Anything that can be sampled per cell for attribute `K`: a single attribute, an
/// attribute set or its render mirror, a grid (its current time level) or a
/// [`GridReference`](crate::grid::GridReference).
pub trait CellRead<K: AttributeKind> {
    /// Value of `cell`.
    fn read_cell(&self, cell: usize) -> K::Value;
}

impl<K: AttributeKind> CellRead<K> for GridAttribute<K> {
    #[inline]
    fn read_cell(&self, cell: usize) -> K::Value {
        self.read(cell)
    }
}

impl<K: AttributeKind> CellRead<K> for RenderAttribute<K> {
    #[inline]
    fn read_cell(&self, cell: usize) -> K::Value {
        self.read(cell)
    }
}

/// One complete snapshot of every attribute of a grid (one time level).
pub trait AttributeSet: Clone + fmt::Debug + Send + Sync + 'static {
    /// Matching render mirror.
    type Render: RenderAttributeSet;

    /// Set with `cells` default values per attribute.
    fn new(cells: usize) -> Self;

    /// Number of cells.
    fn size(&self) -> usize;

    /// Element-wise copy of every attribute of `other`.
    fn copy_from(&self, other: &Self);

    /// Copy every attribute into the render mirror.
    fn copy_to_render(&self, render: &mut Self::Render);

    /// Read attribute `K` at `cell`.
    #[inline]
    fn read<K: AttributeKind>(&self, cell: usize) -> K::Value
    where
        Self: HasAttribute<K>,
    {
        self.attribute().read(cell)
    }

    /// Write attribute `K` at `cell`.
    #[inline]
    fn write<K: AttributeKind>(&self, cell: usize, value: K::Value)
    where
        Self: HasAttribute<K>,
    {
        self.attribute().write(cell, value);
    }
}

/// Host mirror of an [`AttributeSet`], written only by the grid's render copy.
pub trait RenderAttributeSet: Clone + fmt::Debug + Send + 'static {
    /// Mirror with `cells` default values per attribute.
    fn new(cells: usize) -> Self;

    /// Number of cells.
    fn size(&self) -> usize;

    /// Attribute names in binding order.
    fn layout() -> &'static [&'static str]
    where
        Self: Sized;

    /// Visit every attribute as `(name, bytes)` in binding order.
    fn for_each_attribute(&self, f: &mut dyn FnMut(&'static str, &[u8]));

    /// Read mirrored attribute `K` at `cell`.
    #[inline]
    fn read<K: AttributeKind>(&self, cell: usize) -> K::Value
    where
        Self: HasRenderAttribute<K> + Sized,
    {
        self.render_attribute().read(cell)
    }
}

/// Declare an attribute buffer together with its render mirror.
///
/// ```
/// use engine::attribute_set;
/// use engine::attributes::{Density, VelocityX};
///
/// attribute_set! {
///     /// Tracer plus one velocity component.
///     pub struct TracerBuffer, render TracerRender {
///         density: Density,
///         velocity_x: VelocityX,
///     }
/// }
/// ```
///
/// Listing the same kind twice is rejected by the compiler (conflicting impls).
#[macro_export]
macro_rules! attribute_set {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident, render $render:ident {
            $($field:ident : $kind:ty),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default)]
        $vis struct $name {
            $(
                #[doc = concat!("`", stringify!($kind), "` per cell.")]
                pub $field: $crate::attributes::GridAttribute<$kind>,
            )+
        }

        #[doc = concat!("Render mirror of [`", stringify!($name), "`].")]
        #[derive(Clone, Debug, Default)]
        $vis struct $render {
            $(
                #[doc = concat!("Staged `", stringify!($kind), "`.")]
                pub $field: $crate::attributes::RenderAttribute<$kind>,
            )+
        }

        impl $crate::attributes::AttributeSet for $name {
            type Render = $render;

            fn new(cells: usize) -> Self {
                Self { $($field: $crate::attributes::GridAttribute::new(cells),)+ }
            }

            fn size(&self) -> usize {
                let sizes = [$(self.$field.len()),+];
                sizes[0]
            }

            fn copy_from(&self, other: &Self) {
                $(self.$field.copy_from(&other.$field);)+
            }

            fn copy_to_render(&self, render: &mut $render) {
                $(self.$field.copy_to_render(&mut render.$field);)+
            }
        }

        impl $crate::attributes::RenderAttributeSet for $render {
            fn new(cells: usize) -> Self {
                Self { $($field: $crate::attributes::RenderAttribute::new(cells),)+ }
            }

            fn size(&self) -> usize {
                let sizes = [$(self.$field.len()),+];
                sizes[0]
            }

            fn layout() -> &'static [&'static str] {
                &[$(stringify!($field)),+]
            }

            fn for_each_attribute(&self, f: &mut dyn FnMut(&'static str, &[u8])) {
                $(f(stringify!($field), self.$field.as_bytes());)+
            }
        }

        $(
            impl $crate::attributes::HasAttribute<$kind> for $name {
                #[inline]
                fn attribute(&self) -> &$crate::attributes::GridAttribute<$kind> {
                    &self.$field
                }
            }

            impl $crate::attributes::HasRenderAttribute<$kind> for $render {
                #[inline]
                fn render_attribute(&self) -> &$crate::attributes::RenderAttribute<$kind> {
                    &self.$field
                }
            }

            impl $crate::attributes::CellRead<$kind> for $name {
                #[inline]
                fn read_cell(&self, cell: usize) -> <$kind as $crate::attributes::AttributeKind>::Value {
                    self.$field.read(cell)
                }
            }

            impl $crate::attributes::CellRead<$kind> for $render {
                #[inline]
                fn read_cell(&self, cell: usize) -> <$kind as $crate::attributes::AttributeKind>::Value {
                    self.$field.read(cell)
                }
            }
        )+
    };
}

attribute_set! {
    /// Buffer of the render demo: a tracer, the flow that would move it and its
    /// vorticity.
    pub struct FluidBuffer, render FluidRender {
        density: Density,
        velocity_x: VelocityX,
        velocity_y: VelocityY,
        vorticity: Vorticity,
    }
}

attribute_set! {
    /// Buffer of the heat diffusion driver: temperature plus diagnostics.
    pub struct HeatBuffer, render HeatRender {
        temperature: Temperature,
        temperature_gradient_x: TemperatureGradientX,
        temperature_gradient_y: TemperatureGradientY,
        divergence: Divergence,
    }
}
