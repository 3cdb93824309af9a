//! Process-lifetime store of GPU objects shared by every renderable.
//!
//! Objects live in typed arenas, one per category, with a tag lookup map only
//! at the boundary where human-readable identity matters. All `ensure_*`
//! calls are idempotent: requesting a key that already exists reuses the
//! existing object instead of allocating a second one. Nothing is destroyed
//! individually; [`ResourceCache::unload_all`] tears everything down once at
//! shutdown.

pub mod error;
pub use error::*;

use std::collections::HashMap;

use tracing::{error, info};

use crate::gpu::{BufferInfo, BufferUsage, GpuBackend, Handle, Pool, RawId};

pub struct VertexArray {
    pub raw: RawId,
    pub tag: String,
}

pub struct GpuBuffer {
    pub raw: RawId,
    pub byte_size: u32,
    pub usage: BufferUsage,
    pub dynamic: bool,
}

pub struct Framebuffer {
    pub raw: RawId,
    pub tag: String,
}

pub struct Renderbuffer {
    pub raw: RawId,
    pub tag: String,
}

/// Outcome of an `ensure_*` call that distinguishes a fresh allocation from a
/// reused one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ensured<T> {
    Created(T),
    Existing(T),
}

impl<T: Copy> Ensured<T> {
    pub fn handle(self) -> T {
        match self {
            Ensured::Created(h) | Ensured::Existing(h) => h,
        }
    }

    pub fn is_existing(self) -> bool {
        matches!(self, Ensured::Existing(_))
    }
}

#[derive(Default)]
pub struct ResourceCache {
    vertex_arrays: Pool<VertexArray>,
    vertex_array_lookup: HashMap<String, Handle<VertexArray>>,

    vertex_buffers: Pool<GpuBuffer>,
    vertex_buffer_lookup: HashMap<(String, u32), Handle<GpuBuffer>>,

    index_buffers: Pool<GpuBuffer>,
    index_buffer_lookup: HashMap<String, Handle<GpuBuffer>>,

    uniform_buffers: Pool<GpuBuffer>,
    uniform_buffer_lookup: HashMap<u32, Handle<GpuBuffer>>,

    framebuffers: Pool<Framebuffer>,
    framebuffer_lookup: HashMap<String, Handle<Framebuffer>>,

    renderbuffers: Pool<Renderbuffer>,
    renderbuffer_lookup: HashMap<String, Handle<Renderbuffer>>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Default::default()
    }

    /// Create the vertex array for `tag`, or reuse the existing one.
    pub fn ensure_vertex_array(
        &mut self,
        backend: &mut dyn GpuBackend,
        tag: &str,
    ) -> Result<Ensured<Handle<VertexArray>>> {
        if let Some(handle) = self.vertex_array_lookup.get(tag) {
            return Ok(Ensured::Existing(*handle));
        }
        let raw = backend.make_vertex_array(tag)?;
        let handle = self.vertex_arrays.insert(VertexArray {
            raw,
            tag: tag.to_string(),
        });
        self.vertex_array_lookup.insert(tag.to_string(), handle);
        info!("Registered vertex array: {}", tag);
        Ok(Ensured::Created(handle))
    }

    /// Create the vertex buffer for `(tag, slot)`, or reuse the existing one.
    pub fn ensure_vertex_buffer(
        &mut self,
        backend: &mut dyn GpuBackend,
        tag: &str,
        slot: u32,
        dynamic: bool,
    ) -> Result<Ensured<Handle<GpuBuffer>>> {
        let key = (tag.to_string(), slot);
        if let Some(handle) = self.vertex_buffer_lookup.get(&key) {
            return Ok(Ensured::Existing(*handle));
        }
        let raw = backend.make_buffer(&BufferInfo {
            debug_name: tag,
            usage: BufferUsage::Vertex,
            dynamic,
            ..Default::default()
        })?;
        let handle = self.vertex_buffers.insert(GpuBuffer {
            raw,
            byte_size: 0,
            usage: BufferUsage::Vertex,
            dynamic,
        });
        self.vertex_buffer_lookup.insert(key, handle);
        info!("Registered vertex buffer: {} (slot {})", tag, slot);
        Ok(Ensured::Created(handle))
    }

    /// Create the index buffer for `tag`, or reuse the existing one.
    pub fn ensure_index_buffer(
        &mut self,
        backend: &mut dyn GpuBackend,
        tag: &str,
    ) -> Result<Ensured<Handle<GpuBuffer>>> {
        if let Some(handle) = self.index_buffer_lookup.get(tag) {
            return Ok(Ensured::Existing(*handle));
        }
        let raw = backend.make_buffer(&BufferInfo {
            debug_name: tag,
            usage: BufferUsage::Index,
            ..Default::default()
        })?;
        let handle = self.index_buffers.insert(GpuBuffer {
            raw,
            byte_size: 0,
            usage: BufferUsage::Index,
            dynamic: false,
        });
        self.index_buffer_lookup.insert(tag.to_string(), handle);
        info!("Registered index buffer: {}", tag);
        Ok(Ensured::Created(handle))
    }

    /// Create the uniform buffer bound at `binding`, or report the existing
    /// one. `byte_size` must honor std140 alignment (a multiple of 16).
    pub fn ensure_uniform_buffer(
        &mut self,
        backend: &mut dyn GpuBackend,
        binding: u32,
        byte_size: u32,
        dynamic: bool,
    ) -> Result<Ensured<Handle<GpuBuffer>>> {
        if byte_size % 16 != 0 {
            return Err(Error::Alignment(AlignmentError { binding, byte_size }));
        }
        if let Some(handle) = self.uniform_buffer_lookup.get(&binding) {
            return Ok(Ensured::Existing(*handle));
        }
        let debug_name = format!("uniform binding {}", binding);
        let raw = backend.make_buffer(&BufferInfo {
            debug_name: &debug_name,
            byte_size,
            usage: BufferUsage::Uniform,
            dynamic,
            initial_data: None,
        })?;
        let handle = self.uniform_buffers.insert(GpuBuffer {
            raw,
            byte_size,
            usage: BufferUsage::Uniform,
            dynamic,
        });
        self.uniform_buffer_lookup.insert(binding, handle);
        info!("Registered uniform buffer at binding {}", binding);
        Ok(Ensured::Created(handle))
    }

    /// Create the framebuffer for `tag`, or reuse the existing one.
    pub fn ensure_framebuffer(
        &mut self,
        backend: &mut dyn GpuBackend,
        tag: &str,
    ) -> Result<Ensured<Handle<Framebuffer>>> {
        if let Some(handle) = self.framebuffer_lookup.get(tag) {
            return Ok(Ensured::Existing(*handle));
        }
        let raw = backend.make_framebuffer(tag)?;
        let handle = self.framebuffers.insert(Framebuffer {
            raw,
            tag: tag.to_string(),
        });
        self.framebuffer_lookup.insert(tag.to_string(), handle);
        info!("Registered framebuffer: {}", tag);
        Ok(Ensured::Created(handle))
    }

    /// Create the renderbuffer for `tag`, or reuse the existing one.
    pub fn ensure_renderbuffer(
        &mut self,
        backend: &mut dyn GpuBackend,
        tag: &str,
    ) -> Result<Ensured<Handle<Renderbuffer>>> {
        if let Some(handle) = self.renderbuffer_lookup.get(tag) {
            return Ok(Ensured::Existing(*handle));
        }
        let raw = backend.make_renderbuffer(tag)?;
        let handle = self.renderbuffers.insert(Renderbuffer {
            raw,
            tag: tag.to_string(),
        });
        self.renderbuffer_lookup.insert(tag.to_string(), handle);
        info!("Registered renderbuffer: {}", tag);
        Ok(Ensured::Created(handle))
    }

    /// True if a vertex array exists for `tag`. Quiet form of
    /// [`ResourceCache::vertex_array`] for callers probing reuse.
    pub fn contains_vertex_array(&self, tag: &str) -> bool {
        self.vertex_array_lookup.contains_key(tag)
    }

    pub fn vertex_array(&self, tag: &str) -> Option<Handle<VertexArray>> {
        match self.vertex_array_lookup.get(tag) {
            Some(handle) => Some(*handle),
            None => {
                error!("Could not find vertex array {} in cache!", tag);
                None
            }
        }
    }

    pub fn vertex_buffer(&self, tag: &str, slot: u32) -> Option<Handle<GpuBuffer>> {
        match self.vertex_buffer_lookup.get(&(tag.to_string(), slot)) {
            Some(handle) => Some(*handle),
            None => {
                error!("Could not find vertex buffer {} (slot {}) in cache!", tag, slot);
                None
            }
        }
    }

    pub fn index_buffer(&self, tag: &str) -> Option<Handle<GpuBuffer>> {
        match self.index_buffer_lookup.get(tag) {
            Some(handle) => Some(*handle),
            None => {
                error!("Could not find index buffer {} in cache!", tag);
                None
            }
        }
    }

    pub fn uniform_buffer(&self, binding: u32) -> Option<Handle<GpuBuffer>> {
        match self.uniform_buffer_lookup.get(&binding) {
            Some(handle) => Some(*handle),
            None => {
                error!("Could not find uniform buffer at binding {} in cache!", binding);
                None
            }
        }
    }

    pub fn framebuffer(&self, tag: &str) -> Option<Handle<Framebuffer>> {
        match self.framebuffer_lookup.get(tag) {
            Some(handle) => Some(*handle),
            None => {
                error!("Could not find framebuffer {} in cache!", tag);
                None
            }
        }
    }

    pub fn renderbuffer(&self, tag: &str) -> Option<Handle<Renderbuffer>> {
        match self.renderbuffer_lookup.get(tag) {
            Some(handle) => Some(*handle),
            None => {
                error!("Could not find renderbuffer {} in cache!", tag);
                None
            }
        }
    }

    /// Bind the vertex array registered under `tag`. A miss logs and leaves
    /// the current binding untouched.
    pub fn bind_vertex_array(&self, backend: &mut dyn GpuBackend, tag: &str) {
        if let Some(handle) = self.vertex_array(tag) {
            if let Some(va) = self.vertex_arrays.get(handle) {
                backend.bind_vertex_array(va.raw);
            }
        }
    }

    pub fn unbind_vertex_array(&self, backend: &mut dyn GpuBackend) {
        backend.unbind_vertex_array();
    }

    /// Upload `data` into the vertex buffer registered under `(tag, slot)`.
    pub fn push_vertex_data(
        &mut self,
        backend: &mut dyn GpuBackend,
        tag: &str,
        slot: u32,
        data: &[u8],
    ) {
        let Some(handle) = self.vertex_buffer(tag, slot) else {
            return;
        };
        if let Some(buffer) = self.vertex_buffers.get_mut(handle) {
            backend.upload_buffer(buffer.raw, data);
            buffer.byte_size = data.len() as u32;
        }
    }

    /// Upload `data` into the index buffer registered under `tag`.
    pub fn push_index_data(&mut self, backend: &mut dyn GpuBackend, tag: &str, data: &[u8]) {
        let Some(handle) = self.index_buffer(tag) else {
            return;
        };
        if let Some(buffer) = self.index_buffers.get_mut(handle) {
            backend.upload_buffer(buffer.raw, data);
            buffer.byte_size = data.len() as u32;
        }
    }

    /// Draw the object registered under `tag` without an index buffer. A tag
    /// with no vertex array logs the miss and draws nothing.
    pub fn render_non_indexed(
        &self,
        backend: &mut dyn GpuBackend,
        tag: &str,
        vertex_count: u32,
    ) {
        let Some(handle) = self.vertex_array(tag) else {
            return;
        };
        if let Some(va) = self.vertex_arrays.get(handle) {
            backend.bind_vertex_array(va.raw);
            backend.draw_arrays(vertex_count);
            backend.unbind_vertex_array();
        }
    }

    /// Draw the object registered under `tag` with its index buffer. A tag
    /// with no vertex array logs the miss and draws nothing.
    pub fn render_indexed(&self, backend: &mut dyn GpuBackend, tag: &str, index_count: u32) {
        let Some(handle) = self.vertex_array(tag) else {
            return;
        };
        if let Some(va) = self.vertex_arrays.get(handle) {
            backend.bind_vertex_array(va.raw);
            backend.draw_indexed(index_count);
            backend.unbind_vertex_array();
        }
    }

    /// Release every GPU object in every category exactly once.
    ///
    /// Must be called once at shutdown. Render calls after teardown are not
    /// guarded against.
    pub fn unload_all(&mut self, backend: &mut dyn GpuBackend) {
        info!(
            "Unloading resource cache: {} vertex arrays, {} vertex buffers, {} index buffers, {} uniform buffers, {} framebuffers, {} renderbuffers",
            self.vertex_arrays.len(),
            self.vertex_buffers.len(),
            self.index_buffers.len(),
            self.uniform_buffers.len(),
            self.framebuffers.len(),
            self.renderbuffers.len(),
        );

        for va in self.vertex_arrays.drain() {
            backend.destroy_vertex_array(va.raw);
        }
        self.vertex_array_lookup.clear();

        for buffer in self.vertex_buffers.drain() {
            backend.destroy_buffer(buffer.raw);
        }
        self.vertex_buffer_lookup.clear();

        for buffer in self.index_buffers.drain() {
            backend.destroy_buffer(buffer.raw);
        }
        self.index_buffer_lookup.clear();

        for buffer in self.uniform_buffers.drain() {
            backend.destroy_buffer(buffer.raw);
        }
        self.uniform_buffer_lookup.clear();

        for fb in self.framebuffers.drain() {
            backend.destroy_framebuffer(fb.raw);
        }
        self.framebuffer_lookup.clear();

        for rb in self.renderbuffers.drain() {
            backend.destroy_renderbuffer(rb.raw);
        }
        self.renderbuffer_lookup.clear();
    }
}
