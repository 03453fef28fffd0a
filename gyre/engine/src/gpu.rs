//! GPU device context and device-side copies of a grid's render mirror.
//!
//! The renderer binds one read-only storage buffer per mirrored attribute, in the
//! order of [`GridBase::render_layout`]. [`RenderBuffers::upload`] runs the render
//! handshake and copies the staged frame with `queue.write_buffer`.

use std::sync::OnceLock;

use tracing::{debug, info, warn};
use wgpu::{Device, Instance, Queue};

use crate::grid::GridBase;

/// Errors while setting up or using the GPU.
#[derive(thiserror::Error, Debug)]
pub enum GpuError {
    /// No adapter matched the request (headless CI, no driver).
    #[error("no suitable GPU adapter")]
    NoAdapter,
    /// The adapter refused to create a device.
    #[error("request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    /// Buffers were created for a different grid layout.
    #[error("render layout mismatch: buffers for {expected} attributes x {cells} cells")]
    LayoutMismatch {
        /// Attribute count the buffers were created for.
        expected: usize,
        /// Cell count the buffers were created for.
        cells: usize,
    },
}

/// Device, queue and the instance they came from.
pub struct GpuContext {
    /// Instance used to create adapters
    pub instance: Instance,
    /// Logical device
    pub device: Device,
    /// Submission queue
    pub queue: Queue,
}

impl GpuContext {
    /// Create a context on a high-performance adapter.
    ///
    /// # Errors
    /// [`GpuError::NoAdapter`] without a usable adapter, [`GpuError::RequestDevice`]
    /// if device creation fails.
    pub async fn new() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;
        let info = adapter.get_info();
        info!(name = %info.name, backend = ?info.backend, "[gpu] adapter");
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("gyre-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await?;
        Ok(Self { instance, device, queue })
    }

    /// Blocking [`GpuContext::new`].
    ///
    /// # Errors
    /// See [`GpuContext::new`].
    pub fn new_blocking() -> Result<Self, GpuError> {
        pollster::block_on(Self::new())
    }
}

static GPU_CTX: OnceLock<Option<GpuContext>> = OnceLock::new();

/// Process-wide context, created on first use. `None` when no GPU is available;
/// the failure is logged once.
pub fn persistent() -> Option<&'static GpuContext> {
    GPU_CTX
        .get_or_init(|| match GpuContext::new_blocking() {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                warn!(error = %e, "[gpu] unavailable");
                None
            }
        })
        .as_ref()
}

/// One storage buffer per render attribute plus the bind group exposing them.
pub struct RenderBuffers {
    cells: usize,
    names: Vec<&'static str>,
    buffers: Vec<wgpu::Buffer>,
    /// Layout with one read-only storage binding per attribute.
    pub bind_group_layout: wgpu::BindGroupLayout,
    /// Bind group matching `bind_group_layout`.
    pub bind_group: wgpu::BindGroup,
}

impl RenderBuffers {
    /// Allocate buffers for `grid`'s render layout.
    pub fn new(device: &wgpu::Device, grid: &dyn GridBase) -> Self {
        Self::with_layout(device, grid.render_layout(), grid.size())
    }

    /// Allocate buffers for an explicit layout (binding `i` = `layout[i]`).
    pub fn with_layout(device: &wgpu::Device, layout: &[&'static str], cells: usize) -> Self {
        let size = (cells.max(1) * std::mem::size_of::<u32>()) as u64;
        let usage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST;
        let buffers: Vec<wgpu::Buffer> = layout
            .iter()
            .map(|name| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(name),
                    size,
                    usage,
                    mapped_at_creation: false,
                })
            })
            .collect();

        let entries: Vec<wgpu::BindGroupLayoutEntry> = (0..layout.len() as u32).map(Self::entry).collect();
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("render-mirror-bgl"),
            entries: &entries,
        });
        let bg_entries: Vec<wgpu::BindGroupEntry<'_>> =
            buffers.iter().enumerate().map(|(i, b)| Self::bg_entry(i as u32, b)).collect();
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("render-mirror-bg"),
            layout: &bind_group_layout,
            entries: &bg_entries,
        });
        debug!(attributes = layout.len(), cells, "[gpu] render buffers");
        Self { cells, names: layout.to_vec(), buffers, bind_group_layout, bind_group }
    }

    fn entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT | wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }

    fn bg_entry(binding: u32, buffer: &wgpu::Buffer) -> wgpu::BindGroupEntry<'_> {
        wgpu::BindGroupEntry { binding, resource: buffer.as_entire_binding() }
    }

    /// Number of cells per buffer.
    pub fn cells(&self) -> usize {
        self.cells
    }

    /// Buffer bound to attribute `name`.
    pub fn buffer(&self, name: &str) -> Option<&wgpu::Buffer> {
        self.names.iter().position(|n| *n == name).map(|i| &self.buffers[i])
    }

    fn check(&self, grid: &dyn GridBase) -> Result<(), GpuError> {
        if grid.size() != self.cells || grid.render_layout() != self.names.as_slice() {
            return Err(GpuError::LayoutMismatch { expected: self.names.len(), cells: self.cells });
        }
        Ok(())
    }

    /// Take the current render frame of `grid` (blocking) and copy it to the GPU.
    ///
    /// # Errors
    /// [`GpuError::LayoutMismatch`] if the buffers were made for another grid.
    pub fn upload(&self, queue: &wgpu::Queue, grid: &dyn GridBase) -> Result<(), GpuError> {
        self.check(grid)?;
        grid.visit_render_frame(&mut |name, bytes| self.write(queue, name, bytes));
        Ok(())
    }

    /// Like [`RenderBuffers::upload`] but skips if the renderer side is busy or no
    /// new frame is staged. Returns whether a frame was copied.
    ///
    /// # Errors
    /// [`GpuError::LayoutMismatch`] if the buffers were made for another grid.
    pub fn upload_if_new(&self, queue: &wgpu::Queue, grid: &dyn GridBase) -> Result<bool, GpuError> {
        self.check(grid)?;
        if !grid.new_render_data_ready() {
            return Ok(false);
        }
        Ok(grid.try_visit_render_frame(&mut |name, bytes| self.write(queue, name, bytes)))
    }

    fn write(&self, queue: &wgpu::Queue, name: &str, bytes: &[u8]) {
        if let Some(buf) = self.buffer(name) {
            if !bytes.is_empty() {
                queue.write_buffer(buf, 0, bytes);
            }
        }
    }

    /// Copy attribute `name` back to the host. Blocks on the device; meant for tests
    /// and debugging.
    pub fn read_back(&self, ctx: &GpuContext, name: &str) -> Option<Vec<u32>> {
        let src = self.buffer(name)?;
        let size = (self.cells.max(1) * std::mem::size_of::<u32>()) as u64;
        let read_buf = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder =
            ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("enc.read") });
        encoder.copy_buffer_to_buffer(src, 0, &read_buf, 0, size);
        ctx.queue.submit(Some(encoder.finish()));
        read_buf.slice(..).map_async(wgpu::MapMode::Read, |_| {});
        ctx.device.poll(wgpu::Maintain::Wait);
        let data = read_buf.slice(..).get_mapped_range();
        let mut out: Vec<u32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        read_buf.unmap();
        out.truncate(self.cells);
        Some(out)
    }
}
