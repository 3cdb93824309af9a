use std::collections::HashMap;

use tracing::info;

use super::{BufferInfo, GpuBackend, GpuError, RawId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ObjectKind {
    VertexArray,
    Buffer,
    Framebuffer,
    Renderbuffer,
}

/// Backend that allocates nothing on a device.
///
/// Every object is a counter-minted id plus bookkeeping, which is enough for
/// tools and tests to exercise the full create/bind/upload/teardown flow.
#[derive(Default)]
pub struct HeadlessBackend {
    next_id: RawId,
    live: HashMap<RawId, ObjectKind>,
    buffer_contents: HashMap<RawId, Vec<u8>>,
    bound_vertex_array: Option<RawId>,
    total_allocations: usize,
    draw_calls: usize,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Default::default()
    }

    /// Number of objects created and not yet destroyed.
    pub fn live_objects(&self) -> usize {
        self.live.len()
    }

    /// Number of allocations performed over the backend's lifetime.
    pub fn total_allocations(&self) -> usize {
        self.total_allocations
    }

    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }

    pub fn bound_vertex_array(&self) -> Option<RawId> {
        self.bound_vertex_array
    }

    /// Byte length last uploaded to a buffer, if any.
    pub fn buffer_len(&self, raw: RawId) -> Option<usize> {
        self.buffer_contents.get(&raw).map(|b| b.len())
    }

    fn alloc(&mut self, kind: ObjectKind) -> RawId {
        self.next_id += 1;
        self.live.insert(self.next_id, kind);
        self.total_allocations += 1;
        self.next_id
    }
}

impl GpuBackend for HeadlessBackend {
    fn make_vertex_array(&mut self, debug_name: &str) -> Result<RawId, GpuError> {
        let raw = self.alloc(ObjectKind::VertexArray);
        info!("Allocated headless vertex array '{}' ({})", debug_name, raw);
        Ok(raw)
    }

    fn make_buffer(&mut self, info: &BufferInfo) -> Result<RawId, GpuError> {
        let raw = self.alloc(ObjectKind::Buffer);
        if let Some(data) = info.initial_data {
            self.buffer_contents.insert(raw, data.to_vec());
        }
        info!(
            "Allocated headless buffer '{}' ({}, {} bytes)",
            info.debug_name, raw, info.byte_size
        );
        Ok(raw)
    }

    fn make_framebuffer(&mut self, debug_name: &str) -> Result<RawId, GpuError> {
        let raw = self.alloc(ObjectKind::Framebuffer);
        info!("Allocated headless framebuffer '{}' ({})", debug_name, raw);
        Ok(raw)
    }

    fn make_renderbuffer(&mut self, debug_name: &str) -> Result<RawId, GpuError> {
        let raw = self.alloc(ObjectKind::Renderbuffer);
        info!("Allocated headless renderbuffer '{}' ({})", debug_name, raw);
        Ok(raw)
    }

    fn bind_vertex_array(&mut self, raw: RawId) {
        self.bound_vertex_array = Some(raw);
    }

    fn unbind_vertex_array(&mut self) {
        self.bound_vertex_array = None;
    }

    fn upload_buffer(&mut self, raw: RawId, data: &[u8]) {
        self.buffer_contents.insert(raw, data.to_vec());
    }

    fn draw_arrays(&mut self, _vertex_count: u32) {
        self.draw_calls += 1;
    }

    fn draw_indexed(&mut self, _index_count: u32) {
        self.draw_calls += 1;
    }

    fn destroy_vertex_array(&mut self, raw: RawId) {
        self.live.remove(&raw);
    }

    fn destroy_buffer(&mut self, raw: RawId) {
        self.live.remove(&raw);
        self.buffer_contents.remove(&raw);
    }

    fn destroy_framebuffer(&mut self, raw: RawId) {
        self.live.remove(&raw);
    }

    fn destroy_renderbuffer(&mut self, raw: RawId) {
        self.live.remove(&raw);
    }
}
