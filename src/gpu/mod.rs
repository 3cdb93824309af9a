//! Boundary between the terrain core and whatever graphics API hosts it.
//!
//! The engine never talks to OpenGL/Vulkan directly; it drives a
//! [`GpuBackend`] owned by the application. [`HeadlessBackend`] satisfies the
//! same contract without a device and is what the tests run against.

mod headless;
pub mod pool;

pub use headless::HeadlessBackend;
pub use pool::{Handle, Pool};

use std::fmt;

/// Opaque identifier minted by the backend for one GPU object.
pub type RawId = u64;

#[derive(Debug)]
pub enum GpuError {
    Allocation { debug_name: String, reason: String },
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::Allocation { debug_name, reason } => {
                write!(f, "Failed to allocate GPU object '{}': {}", debug_name, reason)
            }
        }
    }
}

impl std::error::Error for GpuError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Vertex,
    Index,
    Uniform,
}

/// Creation parameters for one GPU buffer.
pub struct BufferInfo<'a> {
    pub debug_name: &'a str,
    pub byte_size: u32,
    pub usage: BufferUsage,
    /// Dynamic buffers are re-uploaded per frame; static ones are written once.
    pub dynamic: bool,
    pub initial_data: Option<&'a [u8]>,
}

impl Default for BufferInfo<'_> {
    fn default() -> Self {
        BufferInfo {
            debug_name: "[TSUCHI] Buffer",
            byte_size: 0,
            usage: BufferUsage::Vertex,
            dynamic: false,
            initial_data: None,
        }
    }
}

/// The device operations the resource cache needs. All calls must happen on
/// the thread owning the graphics context.
pub trait GpuBackend {
    fn make_vertex_array(&mut self, debug_name: &str) -> Result<RawId, GpuError>;
    fn make_buffer(&mut self, info: &BufferInfo) -> Result<RawId, GpuError>;
    fn make_framebuffer(&mut self, debug_name: &str) -> Result<RawId, GpuError>;
    fn make_renderbuffer(&mut self, debug_name: &str) -> Result<RawId, GpuError>;

    fn bind_vertex_array(&mut self, raw: RawId);
    fn unbind_vertex_array(&mut self);

    /// Replace the contents of a buffer. Static buffers are expected to be
    /// written at most once.
    fn upload_buffer(&mut self, raw: RawId, data: &[u8]);

    fn draw_arrays(&mut self, vertex_count: u32);
    fn draw_indexed(&mut self, index_count: u32);

    fn destroy_vertex_array(&mut self, raw: RawId);
    fn destroy_buffer(&mut self, raw: RawId);
    fn destroy_framebuffer(&mut self, raw: RawId);
    fn destroy_renderbuffer(&mut self, raw: RawId);
}
