//! Material table

use std::path::PathBuf;

use glam::Vec3;

/// Surface material referenced by triangles through its slot index
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    pub name: String,
    /// Source image for the diffuse texture, relative to the model file
    pub texture: Option<PathBuf>,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
    pub alpha: f32,
    /// Whether the texture was found and occupies a texture layer
    pub has_texture: bool,
}

impl Material {
    /// Create a material with the format defaults: black colors, opaque, no shininess
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            texture: None,
            ambient: Vec3::ZERO,
            diffuse: Vec3::ZERO,
            specular: Vec3::ZERO,
            shininess: 0.0,
            alpha: 1.0,
            has_texture: false,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default")
    }
}

/// Ordered materials; indices are stable for the lifetime of the owning model
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaterialTable {
    materials: Vec<Material>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a material and return its slot
    pub fn push(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    pub fn get(&self, slot: usize) -> Option<&Material> {
        self.materials.get(slot)
    }

    /// Slot of the first material named `name`
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.materials.iter().position(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn as_slice(&self) -> &[Material] {
        &self.materials
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Material> {
        self.materials.iter()
    }

    /// Number of materials whose texture occupies a layer
    pub fn textured_count(&self) -> usize {
        self.materials.iter().filter(|m| m.has_texture).count()
    }
}

impl From<Vec<Material>> for MaterialTable {
    fn from(materials: Vec<Material>) -> Self {
        Self { materials }
    }
}

impl<'a> IntoIterator for &'a MaterialTable {
    type Item = &'a Material;
    type IntoIter = std::slice::Iter<'a, Material>;

    fn into_iter(self) -> Self::IntoIter {
        self.materials.iter()
    }
}
