//! SMM mesh+material files
//!
//! Layout, one field per line:
//!
//! ```text
//! triangleCount
//! triangleCount * 3 * 24 floats, one interleaved vertex record after another
//! textureCount
//! textureCount filenames
//! ```
//!
//! The float block is the renderer's vertex buffer verbatim, so it is kept
//! as loaded; triangles and materials are rebuilt from it for inspection
//! and animation.

use std::io::Write;
use std::path::{Path, PathBuf};

use glam::Vec3;

use super::text::{RecordReader, RecordWriter, read_source};
use crate::error::{ModelError, Result};
use crate::geometry::{TRIANGLE_STRIDE, Triangle, VERTEX_STRIDE, Vertex, layout};
use crate::material::{Material, MaterialTable};

/// Everything an SMM file carries
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    /// Interleaved vertex buffer exactly as stored in the file
    pub vertex_data: Vec<f32>,
    pub triangles: Vec<Triangle>,
    pub materials: MaterialTable,
    /// Texture filenames; entry `i` is the layer sampled by material slot `i`
    pub textures: Vec<String>,
}

/// Read an SMM file from disk
pub fn read(path: &Path) -> Result<MeshData> {
    let content = read_source(path)?;
    parse(&path.display().to_string(), &content)
}

/// Parse SMM content; `file` names the source in errors
pub fn parse(file: &str, content: &str) -> Result<MeshData> {
    let mut reader = RecordReader::new(file, content);

    let triangle_count = reader.next_usize("triangle count")?;
    let float_count = triangle_count.checked_mul(TRIANGLE_STRIDE).ok_or_else(|| {
        reader.parse_error(format!("triangle count {triangle_count} is too large"))
    })?;
    if reader.remaining() < float_count {
        return Err(ModelError::UnexpectedEof {
            file: file.to_string(),
            expected: format!(
                "{} vertex floats for {} triangles, found {} lines",
                float_count,
                triangle_count,
                reader.remaining()
            ),
        });
    }

    let mut vertex_data = Vec::with_capacity(float_count);
    let mut slots = Vec::with_capacity(triangle_count * 3);
    for _ in 0..triangle_count * 3 {
        for offset in 0..VERTEX_STRIDE {
            let value = reader.next_f32("vertex component")?;
            if offset == layout::MATERIAL_INDEX {
                slots.push(material_slot(&reader, value)?);
            }
            vertex_data.push(value);
        }
    }

    let textures = if reader.remaining() == 0 {
        log::debug!("{}: no texture section", file);
        Vec::new()
    } else {
        let count = reader.next_usize("texture count")?;
        let mut names = Vec::with_capacity(reader.capacity_for(count, 1));
        for _ in 0..count {
            names.push(reader.next_line("texture filename")?.to_string());
        }
        names
    };

    if reader.remaining() > 0 {
        log::warn!(
            "{}: ignoring {} lines after the texture list",
            file,
            reader.remaining()
        );
    }

    let materials = rebuild_materials(file, &vertex_data, &slots, &textures);
    let triangles = rebuild_triangles(file, &vertex_data, &slots);

    log::debug!(
        "Parsed {}: {} triangles, {} materials, {} textures",
        file,
        triangles.len(),
        materials.len(),
        textures.len()
    );

    Ok(MeshData {
        vertex_data,
        triangles,
        materials,
        textures,
    })
}

/// Material slots are stored as floats; they must be small non-negative integers
fn material_slot(reader: &RecordReader<'_>, value: f32) -> Result<usize> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u16::MAX as f32 {
        Ok(value as usize)
    } else {
        Err(reader.parse_error(format!("material index {value} is not a valid slot")))
    }
}

fn vertex(data: &[f32], index: usize) -> &[f32] {
    &data[index * VERTEX_STRIDE..(index + 1) * VERTEX_STRIDE]
}

fn vec3_at(record: &[f32], offset: usize) -> Vec3 {
    Vec3::new(record[offset], record[offset + 1], record[offset + 2])
}

fn material_from_record(slot: usize, record: &[f32]) -> Material {
    let mut material = Material::new(format!("material_{slot}"));
    material.ambient = vec3_at(record, layout::AMBIENT);
    material.diffuse = vec3_at(record, layout::DIFFUSE);
    material.specular = vec3_at(record, layout::SPECULAR);
    material.has_texture = record[layout::HAS_TEXTURE] != 0.0;
    material.shininess = record[layout::SHININESS];
    material.alpha = record[layout::ALPHA];
    material
}

/// Slot `i` takes its properties from the first vertex that references it
fn rebuild_materials(
    file: &str,
    data: &[f32],
    slots: &[usize],
    textures: &[String],
) -> MaterialTable {
    let slot_count = slots.iter().max().map_or(0, |max| max + 1);
    let mut materials: Vec<Option<Material>> = vec![None; slot_count];
    let mut warned = vec![false; slot_count];

    for (index, &slot) in slots.iter().enumerate() {
        let candidate = material_from_record(slot, vertex(data, index));
        match &materials[slot] {
            None => materials[slot] = Some(candidate),
            Some(existing) if *existing != candidate && !warned[slot] => {
                log::warn!(
                    "{}: vertex {} disagrees with earlier vertices on the properties of material slot {}",
                    file,
                    index,
                    slot
                );
                warned[slot] = true;
            }
            Some(_) => {}
        }
    }

    materials
        .into_iter()
        .enumerate()
        .map(|(slot, material)| {
            let mut material =
                material.unwrap_or_else(|| Material::new(format!("material_{slot}")));
            material.texture = textures.get(slot).map(PathBuf::from);
            material
        })
        .collect::<Vec<_>>()
        .into()
}

fn rebuild_triangles(file: &str, data: &[f32], slots: &[usize]) -> Vec<Triangle> {
    (0..slots.len() / 3)
        .map(|t| {
            let corners = [3 * t, 3 * t + 1, 3 * t + 2];
            let records = corners.map(|i| vertex(data, i));

            if corners.iter().any(|&i| slots[i] != slots[3 * t]) {
                log::warn!(
                    "{}: triangle {} mixes material slots; using slot {}",
                    file,
                    t,
                    slots[3 * t]
                );
            }

            Triangle {
                coords: records.map(|r| {
                    Vertex::with_normal(vec3_at(r, layout::POSITION), vec3_at(r, layout::NORMAL))
                }),
                tex_coords: records.map(|r| Vertex::new(vec3_at(r, layout::TEXCOORD))),
                material: slots[3 * t],
                w: records.map(|r| r[layout::POSITION + 3]),
                reserved: records.map(|r| r[layout::RESERVED]),
            }
        })
        .collect()
}

/// Write an SMM file from an interleaved buffer and texture list
pub fn write<W: Write>(out: W, vertex_data: &[f32], textures: &[String]) -> Result<W> {
    if vertex_data.len() % TRIANGLE_STRIDE != 0 {
        return Err(ModelError::Validation(format!(
            "vertex buffer of {} floats is not a whole number of {}-float triangles",
            vertex_data.len(),
            TRIANGLE_STRIDE
        )));
    }

    let mut writer = RecordWriter::new(out);
    writer.field(vertex_data.len() / TRIANGLE_STRIDE)?;
    for value in vertex_data {
        writer.field(value)?;
    }
    writer.field(textures.len())?;
    for name in textures {
        writer.field(name)?;
    }
    writer.finish()
}
