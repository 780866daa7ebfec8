//! Rendering backend seam
//!
//! The model never talks to a graphics API directly. Uploads, draws, and
//! releases go through [`RenderBackend`], so the same model code runs against
//! a real renderer or the recording [`HeadlessBackend`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glam::Mat4;

use crate::geometry::VERTEX_STRIDE;

/// Opaque id of an uploaded vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Opaque id of an uploaded layered texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// How often the vertex buffer is expected to change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BufferUsage {
    #[default]
    Static,
    Dynamic,
    Stream,
}

/// How texture layers are laid out in backend memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TexturePacking {
    /// One layer of an array texture per entry
    #[default]
    ArrayLayers,
    /// Entries side by side in one wide 2D texture
    HorizontalStrip,
}

/// Texture images to upload, one layer per material slot
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextureLayers {
    layers: Vec<Option<PathBuf>>,
    packing: TexturePacking,
}

impl TextureLayers {
    pub fn new(layers: Vec<Option<PathBuf>>, packing: TexturePacking) -> Self {
        Self { layers, packing }
    }

    pub fn layers(&self) -> &[Option<PathBuf>] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Path> {
        self.layers.get(index).and_then(|l| l.as_deref())
    }

    pub fn packing(&self) -> TexturePacking {
        self.packing
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// True when no layer has an image
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(Option::is_none)
    }

    /// Map a texture `u` coordinate of `layer` into the packed texture
    ///
    /// Array layers keep their coordinates; a strip squeezes each layer into
    /// its own horizontal cell.
    pub fn packed_u(&self, u: f32, layer: usize) -> f32 {
        match self.packing {
            TexturePacking::ArrayLayers => u,
            TexturePacking::HorizontalStrip if self.layers.is_empty() => u,
            TexturePacking::HorizontalStrip => (u + layer as f32) / self.layers.len() as f32,
        }
    }
}

/// One draw call worth of state
#[derive(Debug, Clone, Copy)]
pub struct DrawRequest<'a> {
    pub buffer: BufferHandle,
    pub texture: Option<TextureHandle>,
    pub vertex_count: usize,
    pub model_matrix: Mat4,
    /// World matrix per bone, indexed by bone id; empty for unanimated draws
    pub bone_matrices: &'a [Mat4],
}

/// Graphics services a model needs
pub trait RenderBackend {
    /// Upload an interleaved vertex buffer of `VERTEX_STRIDE`-float records
    fn upload_vertex_buffer(&mut self, data: &[f32], usage: BufferUsage) -> BufferHandle;

    /// Upload texture images; `None` when there is nothing to upload or no
    /// image could be used
    fn upload_texture_layers(&mut self, layers: &TextureLayers) -> Option<TextureHandle>;

    /// Whether array textures are available; otherwise layers are packed
    /// into a horizontal strip
    fn supports_array_textures(&self) -> bool {
        true
    }

    fn draw(&mut self, request: &DrawRequest<'_>);

    fn release_buffer(&mut self, buffer: BufferHandle);

    fn release_texture(&mut self, texture: TextureHandle);
}

/// A draw call as seen by [`HeadlessBackend`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub buffer: BufferHandle,
    pub texture: Option<TextureHandle>,
    pub vertex_count: usize,
    pub model_matrix: Mat4,
    pub bone_matrices: Vec<Mat4>,
}

/// Backend that keeps uploads in memory and records draws
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u32,
    array_textures: bool,
    buffers: HashMap<BufferHandle, (Vec<f32>, BufferUsage)>,
    textures: HashMap<TextureHandle, TextureLayers>,
    draws: Vec<RecordedDraw>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            array_textures: true,
            ..Self::default()
        }
    }

    /// A backend that reports no array texture support
    pub fn without_array_textures() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn buffer(&self, handle: BufferHandle) -> Option<&[f32]> {
        self.buffers.get(&handle).map(|(data, _)| data.as_slice())
    }

    pub fn buffer_usage(&self, handle: BufferHandle) -> Option<BufferUsage> {
        self.buffers.get(&handle).map(|(_, usage)| *usage)
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&TextureLayers> {
        self.textures.get(&handle)
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    pub fn clear_draws(&mut self) {
        self.draws.clear();
    }
}

impl RenderBackend for HeadlessBackend {
    fn upload_vertex_buffer(&mut self, data: &[f32], usage: BufferUsage) -> BufferHandle {
        let handle = BufferHandle(self.next_id());
        log::trace!(
            "headless: buffer {:?} with {} vertices",
            handle,
            data.len() / VERTEX_STRIDE
        );
        self.buffers.insert(handle, (data.to_vec(), usage));
        handle
    }

    fn upload_texture_layers(&mut self, layers: &TextureLayers) -> Option<TextureHandle> {
        if layers.is_empty() {
            return None;
        }
        let handle = TextureHandle(self.next_id());
        self.textures.insert(handle, layers.clone());
        Some(handle)
    }

    fn supports_array_textures(&self) -> bool {
        self.array_textures
    }

    fn draw(&mut self, request: &DrawRequest<'_>) {
        self.draws.push(RecordedDraw {
            buffer: request.buffer,
            texture: request.texture,
            vertex_count: request.vertex_count,
            model_matrix: request.model_matrix,
            bone_matrices: request.bone_matrices.to_vec(),
        });
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer).is_none() {
            log::warn!("headless: release of unknown buffer {:?}", buffer);
        }
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture).is_none() {
            log::warn!("headless: release of unknown texture {:?}", texture);
        }
    }
}
