//! Triangle geometry and the interleaved vertex layout
//!
//! Geometry is stored per triangle corner rather than indexed: every corner
//! carries its own position, normal, and texture coordinate. This mirrors the
//! layout the renderer consumes, where each vertex record is
//! [`VERTEX_STRIDE`] floats wide.

use std::collections::HashMap;

use glam::Vec3;

use crate::error::{ModelError, Result};
use crate::material::Material;

/// Number of floats per vertex in the interleaved buffer
pub const VERTEX_STRIDE: usize = 24;

/// Number of floats per triangle in the interleaved buffer
pub const TRIANGLE_STRIDE: usize = VERTEX_STRIDE * 3;

/// Homogeneous position component written for geometry that does not carry one
pub const DEFAULT_W: f32 = 1.0;

/// Value of the trailing reserved field for geometry that does not carry one
pub const DEFAULT_RESERVED: f32 = -1.0;

/// Float offsets of each attribute inside one interleaved vertex
pub mod layout {
    /// Position, four floats (`x, y, z, w`)
    pub const POSITION: usize = 0;
    /// Normal, three floats
    pub const NORMAL: usize = 4;
    /// Ambient color, three floats
    pub const AMBIENT: usize = 7;
    /// Diffuse color, three floats
    pub const DIFFUSE: usize = 10;
    /// Specular color, three floats
    pub const SPECULAR: usize = 13;
    /// Texture coordinate, three floats
    pub const TEXCOORD: usize = 16;
    pub const MATERIAL_INDEX: usize = 19;
    pub const HAS_TEXTURE: usize = 20;
    pub const SHININESS: usize = 21;
    pub const ALPHA: usize = 22;
    pub const RESERVED: usize = 23;
}

/// A point with an attached normal
///
/// Texture coordinates reuse this type; their normal is always zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
}

impl Vertex {
    /// Create a vertex with a zero normal
    pub const fn new(position: Vec3) -> Self {
        Self {
            position,
            normal: Vec3::ZERO,
        }
    }

    /// Create a vertex with an explicit normal
    pub const fn with_normal(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal }
    }
}

/// One triangle of the geometry store
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Triangle {
    /// Corner positions and normals
    pub coords: [Vertex; 3],
    /// Corner texture coordinates (`z` selects nothing and is usually zero)
    pub tex_coords: [Vertex; 3],
    /// Material slot in the owning model's material table
    pub material: usize,
    /// Homogeneous position component per corner
    pub w: [f32; 3],
    /// Trailing reserved field per corner
    pub reserved: [f32; 3],
}

impl Triangle {
    /// Create a triangle with default `w` and reserved fields
    pub fn new(coords: [Vertex; 3], tex_coords: [Vertex; 3], material: usize) -> Self {
        Self {
            coords,
            tex_coords,
            material,
            w: [DEFAULT_W; 3],
            reserved: [DEFAULT_RESERVED; 3],
        }
    }

    /// Unnormalized face normal, `(v1 - v0) x (v2 - v0)`
    ///
    /// Its length is twice the triangle's area.
    pub fn face_normal(&self) -> Vec3 {
        let u = self.coords[1].position - self.coords[0].position;
        let v = self.coords[2].position - self.coords[0].position;
        u.cross(v)
    }

    /// Unit surface normal; a degenerate triangle yields the zero vector
    pub fn surface_normal(&self) -> Vec3 {
        normalize_or_zero(self.face_normal())
    }

    /// Triangle area
    pub fn area(&self) -> f32 {
        self.face_normal().length() * 0.5
    }
}

/// Normalize, substituting a length of 1 for a zero-length vector
pub(crate) fn normalize_or_zero(v: Vec3) -> Vec3 {
    let mut len = v.length();
    if len == 0.0 {
        len = 1.0;
    }
    v / len
}

/// How per-corner normals are generated for geometry without authored normals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalMode {
    /// Every corner takes its triangle's surface normal
    Flat,
    /// Corners sharing an exact position take the area-weighted average of
    /// the adjoining face normals
    #[default]
    Smooth,
}

/// Bit pattern used to identify a position; `-0.0` and `0.0` compare equal
fn position_key(p: Vec3) -> [u32; 3] {
    [
        (p.x + 0.0).to_bits(),
        (p.y + 0.0).to_bits(),
        (p.z + 0.0).to_bits(),
    ]
}

/// Overwrite every corner normal according to `mode`
pub fn compute_normals(triangles: &mut [Triangle], mode: NormalMode) {
    match mode {
        NormalMode::Flat => {
            for triangle in triangles.iter_mut() {
                let normal = triangle.surface_normal();
                for corner in &mut triangle.coords {
                    corner.normal = normal;
                }
            }
        }
        NormalMode::Smooth => {
            let mut sums: HashMap<[u32; 3], Vec3> = HashMap::new();
            for triangle in triangles.iter() {
                // The unnormalized cross product is already weighted by area
                let face = triangle.face_normal();
                for corner in &triangle.coords {
                    *sums.entry(position_key(corner.position)).or_insert(Vec3::ZERO) += face;
                }
            }
            for triangle in triangles.iter_mut() {
                for corner in &mut triangle.coords {
                    let sum = sums
                        .get(&position_key(corner.position))
                        .copied()
                        .unwrap_or(Vec3::ZERO);
                    corner.normal = normalize_or_zero(sum);
                }
            }
        }
    }
}

/// Build the interleaved vertex buffer for `triangles`
///
/// Produces `triangles.len() * 3 * VERTEX_STRIDE` floats.
pub fn interleave(triangles: &[Triangle], materials: &[Material]) -> Result<Vec<f32>> {
    let mut data = Vec::with_capacity(triangles.len() * TRIANGLE_STRIDE);

    for (index, triangle) in triangles.iter().enumerate() {
        let material = materials.get(triangle.material).ok_or_else(|| {
            ModelError::Reference(format!(
                "triangle {} uses material slot {} but only {} materials exist",
                index,
                triangle.material,
                materials.len()
            ))
        })?;

        for corner in 0..3 {
            let vertex = &triangle.coords[corner];
            let tex = &triangle.tex_coords[corner];
            data.extend_from_slice(&vertex.position.to_array());
            data.push(triangle.w[corner]);
            data.extend_from_slice(&vertex.normal.to_array());
            data.extend_from_slice(&material.ambient.to_array());
            data.extend_from_slice(&material.diffuse.to_array());
            data.extend_from_slice(&material.specular.to_array());
            data.extend_from_slice(&tex.position.to_array());
            data.push(triangle.material as f32);
            data.push(if material.has_texture { 1.0 } else { 0.0 });
            data.push(material.shininess);
            data.push(material.alpha);
            data.push(triangle.reserved[corner]);
        }
    }

    Ok(data)
}
