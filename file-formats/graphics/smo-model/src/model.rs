//! Loaded models
//!
//! A [`Model`] owns everything read from disk: triangles, materials, the
//! bone hierarchy with its animations, and the interleaved vertex buffer
//! handed to the backend. It holds no per-instance animation state, so one
//! model can be shared by any number of [`ModelInstance`](crate::ModelInstance)s.

use std::fmt;
use std::path::{Path, PathBuf};

use glam::Mat4;

use crate::animation::compose_world_matrices_uniform;
use crate::backend::{
    BufferHandle, BufferUsage, DrawRequest, RenderBackend, TextureHandle, TextureLayers,
    TexturePacking,
};
use crate::error::{ModelError, Result};
use crate::format::{obj, sma, smm, smo, sms};
use crate::geometry::{Triangle, VERTEX_STRIDE, interleave};
use crate::instance::Placement;
use crate::material::MaterialTable;
use crate::skeleton::{BoneId, Skeleton};

/// Animation frames per second used when none is configured
pub const DEFAULT_FRAMERATE: f32 = 60.0;

/// Entry-point file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// Wavefront OBJ with an optional MTL library
    Obj,
    /// Umbrella listing mesh, bone, and animation files
    Smo,
    /// Mesh+material file on its own, without bones
    Smm,
}

impl ModelFormat {
    /// Detect the format from a file extension, ignoring case
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "obj" => Ok(Self::Obj),
            "smo" => Ok(Self::Smo),
            "smm" => Ok(Self::Smm),
            _ => Err(ModelError::UnsupportedFormat(format!(
                "{} (expected .obj, .smo, or .smm)",
                path.display()
            ))),
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Obj => write!(f, "OBJ"),
            Self::Smo => write!(f, "SMO"),
            Self::Smm => write!(f, "SMM"),
        }
    }
}

/// Load-time settings
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    name: Option<String>,
    framerate: f32,
    usage: BufferUsage,
    allow_partial: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            name: None,
            framerate: DEFAULT_FRAMERATE,
            usage: BufferUsage::Static,
            allow_partial: false,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Model name; defaults to the file stem
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Animation frames per second
    pub fn framerate(mut self, framerate: f32) -> Self {
        self.framerate = framerate;
        self
    }

    pub fn buffer_usage(mut self, usage: BufferUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Skip unopenable member files instead of failing the load
    pub fn allow_partial(mut self, allow: bool) -> Self {
        self.allow_partial = allow;
        self
    }

    pub fn is_partial_allowed(&self) -> bool {
        self.allow_partial
    }
}

/// What kind of input a load skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkippedKind {
    MaterialLibrary,
    UmbrellaMember,
    Texture,
    MaterialName,
}

impl fmt::Display for SkippedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::MaterialLibrary => "material library",
            Self::UmbrellaMember => "umbrella member",
            Self::Texture => "texture",
            Self::MaterialName => "material name",
        };
        f.write_str(label)
    }
}

/// One input left out of a load
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkippedItem {
    pub kind: SkippedKind,
    pub target: String,
    pub reason: String,
}

/// Inputs a load had to leave out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadReport {
    skipped: Vec<SkippedItem>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn skipped(&self) -> &[SkippedItem] {
        &self.skipped
    }

    fn skip(&mut self, kind: SkippedKind, target: impl Into<String>, reason: impl Into<String>) {
        let item = SkippedItem {
            kind,
            target: target.into(),
            reason: reason.into(),
        };
        log::warn!("Skipping {} {}: {}", item.kind, item.target, item.reason);
        self.skipped.push(item);
    }
}

/// A loaded model
#[derive(Debug)]
pub struct Model {
    name: String,
    source: PathBuf,
    format: ModelFormat,
    framerate: f32,
    usage: BufferUsage,
    triangles: Vec<Triangle>,
    materials: MaterialTable,
    skeleton: Skeleton,
    vertex_data: Vec<f32>,
    texture_files: Vec<Option<PathBuf>>,
    buffer: Option<BufferHandle>,
    texture: Option<TextureHandle>,
    report: LoadReport,
}

/// Turn an unopenable member into a report entry when partial loads are allowed
fn member<T>(
    result: Result<T>,
    options: &LoadOptions,
    report: &mut LoadReport,
    kind: SkippedKind,
) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ModelError::Open { path, source }) if options.allow_partial => {
            report.skip(kind, path.display().to_string(), source.to_string());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Resolve a texture against `base`, recording it as skipped when missing
fn resolve_texture(base: &Path, texture: &Path, report: &mut LoadReport) -> Option<PathBuf> {
    let full = base.join(texture);
    if full.is_file() {
        Some(full)
    } else {
        report.skip(
            SkippedKind::Texture,
            full.display().to_string(),
            "image file not found",
        );
        None
    }
}

fn base_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

impl Model {
    /// Load a model from an `.obj`, `.smo`, or `.smm` file
    ///
    /// Nothing is uploaded; call [`Model::upload`] or use
    /// [`Model::load_with_backend`] before drawing.
    pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        let format = ModelFormat::from_path(path)?;
        let name = options.name.clone().unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        let mut model = Self {
            name,
            source: path.to_path_buf(),
            format,
            framerate: options.framerate,
            usage: options.usage,
            triangles: Vec::new(),
            materials: MaterialTable::new(),
            skeleton: Skeleton::new(),
            vertex_data: Vec::new(),
            texture_files: Vec::new(),
            buffer: None,
            texture: None,
            report: LoadReport::default(),
        };

        match format {
            ModelFormat::Obj => model.load_obj(path, options)?,
            ModelFormat::Smo => model.load_smo(path, options)?,
            ModelFormat::Smm => model.load_smm(&smm::read(path)?, &base_dir(path)),
        }

        log::info!(
            "Loaded {} model '{}' from {}: {} triangles, {} materials, {} bones{}",
            format,
            model.name,
            path.display(),
            model.triangles.len(),
            model.materials.len(),
            model.skeleton.len(),
            if model.report.is_complete() {
                String::new()
            } else {
                format!(", {} inputs skipped", model.report.skipped().len())
            }
        );
        Ok(model)
    }

    /// Load and upload in one step
    pub fn load_with_backend<B: RenderBackend + ?Sized>(
        path: impl AsRef<Path>,
        options: &LoadOptions,
        backend: &mut B,
    ) -> Result<Self> {
        let mut model = Self::load(path, options)?;
        model.upload(backend);
        Ok(model)
    }

    fn load_obj(&mut self, path: &Path, options: &LoadOptions) -> Result<()> {
        let base = base_dir(path);
        let doc = obj::read(path)?;

        let materials = match &doc.mtllib {
            Some(library) => member(
                obj::read_mtl(&base.join(library)),
                options,
                &mut self.report,
                SkippedKind::MaterialLibrary,
            )?
            .unwrap_or_default(),
            None => Vec::new(),
        };

        let bound = doc.bind(materials, options.allow_partial)?;
        for name in &bound.dangling {
            self.report.skip(
                SkippedKind::MaterialName,
                name.clone(),
                "no material with this name; faces use slot 0",
            );
        }

        let mut materials = bound.materials.as_slice().to_vec();
        let mut texture_files = Vec::with_capacity(materials.len());
        for material in &mut materials {
            let file = material
                .texture
                .as_deref()
                .and_then(|t| resolve_texture(&base, t, &mut self.report));
            material.has_texture = file.is_some();
            texture_files.push(file);
        }

        self.vertex_data = interleave(&bound.triangles, &materials)?;
        self.triangles = bound.triangles;
        self.materials = materials.into();
        self.texture_files = texture_files;
        Ok(())
    }

    fn load_smm(&mut self, mesh: &smm::MeshData, base: &Path) {
        self.texture_files = mesh
            .textures
            .iter()
            .map(|name| resolve_texture(base, Path::new(name), &mut self.report))
            .collect();
        self.vertex_data = mesh.vertex_data.clone();
        self.triangles = mesh.triangles.clone();
        self.materials = mesh.materials.clone();
    }

    fn load_smo(&mut self, path: &Path, options: &LoadOptions) -> Result<()> {
        let base = base_dir(path);
        let umbrella = smo::read(path)?;

        let skeleton = member(
            sms::read(&umbrella.skeleton_path(&base)),
            options,
            &mut self.report,
            SkippedKind::UmbrellaMember,
        )?;

        if let Some(mesh) = member(
            smm::read(&umbrella.mesh_path(&base)),
            options,
            &mut self.report,
            SkippedKind::UmbrellaMember,
        )? {
            self.load_smm(&mesh, &base);
        }

        match skeleton {
            Some(skeleton) => {
                self.skeleton = skeleton;
                for file in umbrella.animation_paths(&base) {
                    let blocks = member(
                        sma::read(&file),
                        options,
                        &mut self.report,
                        SkippedKind::UmbrellaMember,
                    )?;
                    if let Some(blocks) = blocks {
                        sma::attach(&mut self.skeleton, blocks)?;
                    }
                }
            }
            None => {
                for file in umbrella.animation_paths(&base) {
                    self.report.skip(
                        SkippedKind::UmbrellaMember,
                        file.display().to_string(),
                        "bone file unavailable",
                    );
                }
            }
        }
        Ok(())
    }

    /// Upload the vertex buffer and textures if not already uploaded
    pub fn upload<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        if self.buffer.is_some() {
            return;
        }
        self.buffer = Some(backend.upload_vertex_buffer(&self.vertex_data, self.usage));
        self.texture = backend.upload_texture_layers(&self.texture_layers(backend));
        log::debug!(
            "Uploaded '{}': buffer {:?}, texture {:?}",
            self.name,
            self.buffer,
            self.texture
        );
    }

    /// Give the backend resources back; the model can be uploaded again later
    pub fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        if let Some(buffer) = self.buffer.take() {
            backend.release_buffer(buffer);
        }
        if let Some(texture) = self.texture.take() {
            backend.release_texture(texture);
        }
    }

    /// Texture request for `backend`, packed the way it supports
    pub fn texture_layers<B: RenderBackend + ?Sized>(&self, backend: &B) -> TextureLayers {
        let packing = if backend.supports_array_textures() {
            TexturePacking::ArrayLayers
        } else {
            TexturePacking::HorizontalStrip
        };
        TextureLayers::new(self.texture_files.clone(), packing)
    }

    /// Issue one draw with explicit bone matrices
    pub fn draw_with<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        model_matrix: Mat4,
        bone_matrices: &[Mat4],
    ) -> Result<()> {
        let buffer = self.buffer.ok_or_else(|| {
            ModelError::Validation(format!("model '{}' has not been uploaded", self.name))
        })?;
        backend.draw(&DrawRequest {
            buffer,
            texture: self.texture,
            vertex_count: self.vertex_count(),
            model_matrix,
            bone_matrices,
        });
        Ok(())
    }

    /// Draw at `placement` with every bone on the same animation and frame
    pub fn draw_at<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        placement: &Placement,
        animation: usize,
        frame: f32,
        skip_animation: bool,
    ) -> Result<()> {
        let bones = if skip_animation || self.skeleton.is_empty() {
            Vec::new()
        } else {
            compose_world_matrices_uniform(&self.skeleton, animation, frame)
        };
        self.draw_with(backend, placement.model_matrix(), &bones)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File the model was loaded from
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn format(&self) -> ModelFormat {
        self.format
    }

    pub fn framerate(&self) -> f32 {
        self.framerate
    }

    pub fn set_framerate(&mut self, framerate: f32) {
        self.framerate = framerate;
    }

    pub fn buffer_usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn materials(&self) -> &MaterialTable {
        &self.materials
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Interleaved vertex buffer, [`VERTEX_STRIDE`] floats per vertex
    pub fn vertex_data(&self) -> &[f32] {
        &self.vertex_data
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_data.len() / VERTEX_STRIDE
    }

    /// Resolved texture file per layer; `None` where no image is available
    pub fn texture_files(&self) -> &[Option<PathBuf>] {
        &self.texture_files
    }

    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    pub fn is_uploaded(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    pub fn bone_id(&self, name: &str) -> Option<BoneId> {
        self.skeleton.bone_id(name)
    }

    pub fn bone_name(&self, id: BoneId) -> Option<&str> {
        self.skeleton.bone_name(id)
    }

    pub fn animation_id(&self, name: &str) -> Option<usize> {
        self.skeleton.animation_id(name)
    }
}
