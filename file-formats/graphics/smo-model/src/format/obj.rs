//! Wavefront OBJ and MTL
//!
//! Only the subset the renderer needs is read: positions, texture
//! coordinates, faces, material libraries and material switches. Normals are
//! always generated, never read from `vn`.

use std::path::{Path, PathBuf};

use glam::Vec3;

use super::text::read_source;
use crate::error::{ModelError, Result};
use crate::geometry::{NormalMode, Triangle, Vertex, compute_normals};
use crate::material::{Material, MaterialTable};

/// A parsed OBJ file whose faces still refer to materials by name
#[derive(Debug, Clone, PartialEq)]
pub struct ObjDocument {
    /// First `mtllib` directive, relative to the OBJ file
    pub mtllib: Option<String>,
    /// Set by a `blocky` marker line; selects flat normals
    pub blocky: bool,
    /// Triangles whose `material` indexes [`ObjDocument::material_refs`]
    pub triangles: Vec<Triangle>,
    /// Material names in order of first use; `None` for faces before any `usemtl`
    pub material_refs: Vec<Option<String>>,
}

/// Triangles bound to a concrete material table
#[derive(Debug, Clone, PartialEq)]
pub struct BoundMesh {
    pub triangles: Vec<Triangle>,
    pub materials: MaterialTable,
    /// `usemtl` names that matched no material, if dangling names were allowed
    pub dangling: Vec<String>,
}

pub fn read(path: &Path) -> Result<ObjDocument> {
    let content = read_source(path)?;
    parse(&path.display().to_string(), &content)
}

pub fn read_mtl(path: &Path) -> Result<Vec<Material>> {
    let content = read_source(path)?;
    parse_mtl(&path.display().to_string(), &content)
}

/// Split a directive line into its lowercased keyword and the trimmed rest
fn directive(line: &str) -> (String, &str) {
    match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword.to_ascii_lowercase(), rest.trim()),
        None => (line.to_ascii_lowercase(), ""),
    }
}

fn is_blocky_marker(line: &str) -> bool {
    line.eq_ignore_ascii_case("blocky")
        || line
            .strip_prefix('#')
            .is_some_and(|rest| rest.trim().eq_ignore_ascii_case("blocky"))
}

fn parse_error(file: &str, line: usize, message: impl Into<String>) -> ModelError {
    ModelError::Parse {
        file: file.to_string(),
        line,
        message: message.into(),
    }
}

fn parse_floats(file: &str, line: usize, rest: &str, min: usize) -> Result<Vec<f32>> {
    let values = rest
        .split_whitespace()
        .map(|token| {
            token
                .parse::<f32>()
                .map_err(|e| parse_error(file, line, format!("invalid number '{token}': {e}")))
        })
        .collect::<Result<Vec<f32>>>()?;
    if values.len() < min {
        return Err(parse_error(
            file,
            line,
            format!("expected at least {min} numbers, found {}", values.len()),
        ));
    }
    Ok(values)
}

/// Resolve a 1-based or negative (relative) OBJ index against `len` items
fn resolve_index(file: &str, line: usize, token: &str, len: usize, what: &str) -> Result<usize> {
    let raw: i64 = token
        .parse()
        .map_err(|e| parse_error(file, line, format!("invalid {what} index '{token}': {e}")))?;
    let resolved = match raw {
        0 => None,
        n if n > 0 => usize::try_from(n - 1).ok(),
        n => usize::try_from(len as i64 + n).ok(),
    };
    resolved.filter(|&i| i < len).ok_or_else(|| {
        ModelError::Reference(format!(
            "{file} line {line}: {what} index {raw} does not name one of the {len} {what}s read so far"
        ))
    })
}

/// Parse OBJ content and generate normals
pub fn parse(file: &str, content: &str) -> Result<ObjDocument> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut tex_coords: Vec<Vec3> = Vec::new();
    let mut doc = ObjDocument {
        mtllib: None,
        blocky: false,
        triangles: Vec::new(),
        material_refs: Vec::new(),
    };
    let mut current: Option<usize> = None;

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if is_blocky_marker(line) {
            doc.blocky = true;
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let (keyword, rest) = directive(line);
        match keyword.as_str() {
            "v" => {
                let v = parse_floats(file, line_no, rest, 3)?;
                positions.push(Vec3::new(v[0], v[1], v[2]));
            }
            "vt" => {
                let v = parse_floats(file, line_no, rest, 1)?;
                tex_coords.push(Vec3::new(
                    v[0],
                    v.get(1).copied().unwrap_or(0.0),
                    v.get(2).copied().unwrap_or(0.0),
                ));
            }
            "f" => {
                let slot = match current {
                    Some(slot) => slot,
                    None => {
                        let slot = ref_slot(&mut doc.material_refs, None);
                        current = Some(slot);
                        slot
                    }
                };
                let mut corners = Vec::new();
                for token in rest.split_whitespace() {
                    let mut parts = token.split('/');
                    let v = parts.next().unwrap_or_default();
                    let position =
                        positions[resolve_index(file, line_no, v, positions.len(), "vertex")?];
                    let tex = match parts.next() {
                        Some(vt) if !vt.is_empty() => {
                            tex_coords[resolve_index(
                                file,
                                line_no,
                                vt,
                                tex_coords.len(),
                                "texture coordinate",
                            )?]
                        }
                        _ => Vec3::ZERO,
                    };
                    corners.push((Vertex::new(position), Vertex::new(tex)));
                }
                if corners.len() < 3 {
                    return Err(parse_error(
                        file,
                        line_no,
                        format!("face has {} corners, at least 3 are needed", corners.len()),
                    ));
                }
                for i in 1..corners.len() - 1 {
                    let fan = [corners[0], corners[i], corners[i + 1]];
                    doc.triangles.push(Triangle::new(
                        fan.map(|(v, _)| v),
                        fan.map(|(_, t)| t),
                        slot,
                    ));
                }
            }
            "usemtl" => {
                let name = rest.to_string();
                current = Some(ref_slot(&mut doc.material_refs, Some(name)));
            }
            "mtllib" => {
                if doc.mtllib.is_none() && !rest.is_empty() {
                    doc.mtllib = Some(rest.to_string());
                }
            }
            _ => {}
        }
    }

    let mode = if doc.blocky {
        NormalMode::Flat
    } else {
        NormalMode::Smooth
    };
    compute_normals(&mut doc.triangles, mode);

    log::debug!(
        "Parsed {}: {} positions, {} texture coordinates, {} triangles, {:?} normals",
        file,
        positions.len(),
        tex_coords.len(),
        doc.triangles.len(),
        mode
    );
    Ok(doc)
}

fn ref_slot(refs: &mut Vec<Option<String>>, name: Option<String>) -> usize {
    match refs.iter().position(|r| *r == name) {
        Some(slot) => slot,
        None => {
            refs.push(name);
            refs.len() - 1
        }
    }
}

impl ObjDocument {
    /// Bind material names to slots of `materials`
    ///
    /// Faces without a `usemtl` take slot 0, which becomes a default material
    /// when the table is empty. A name missing from the table is a
    /// [`ModelError::Reference`] unless `allow_dangling` is set, in which
    /// case those faces also fall back to slot 0 and the name is reported.
    pub fn bind(self, materials: Vec<Material>, allow_dangling: bool) -> Result<BoundMesh> {
        let mut table = MaterialTable::from(materials);
        let mut dangling = Vec::new();
        let mut needs_default = false;

        let mut remap = Vec::with_capacity(self.material_refs.len());
        for name in &self.material_refs {
            let slot = match name {
                None => {
                    needs_default = true;
                    0
                }
                Some(name) => match table.slot_of(name) {
                    Some(slot) => slot,
                    None if allow_dangling => {
                        log::warn!("usemtl '{}' matches no material; using slot 0", name);
                        dangling.push(name.clone());
                        needs_default = true;
                        0
                    }
                    None => {
                        return Err(ModelError::Reference(format!(
                            "usemtl '{}' matches none of the {} materials",
                            name,
                            table.len()
                        )));
                    }
                },
            };
            remap.push(slot);
        }

        if needs_default && table.is_empty() {
            table.push(Material::default());
        }

        let triangles = self
            .triangles
            .into_iter()
            .map(|mut t| {
                t.material = remap[t.material];
                t
            })
            .collect();

        Ok(BoundMesh {
            triangles,
            materials: table,
            dangling,
        })
    }
}

/// Parse MTL content; texture paths are kept as written
pub fn parse_mtl(file: &str, content: &str) -> Result<Vec<Material>> {
    let mut materials: Vec<Material> = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (keyword, rest) = directive(line);
        if keyword == "newmtl" {
            materials.push(Material::new(rest));
            continue;
        }

        let Some(material) = materials.last_mut() else {
            log::warn!(
                "{} line {}: '{}' before any newmtl is ignored",
                file,
                line_no,
                keyword
            );
            continue;
        };

        match keyword.as_str() {
            "ka" => material.ambient = color(file, line_no, rest)?,
            "kd" => material.diffuse = color(file, line_no, rest)?,
            "ks" => material.specular = color(file, line_no, rest)?,
            "d" => material.alpha = parse_floats(file, line_no, rest, 1)?[0],
            "tr" => material.alpha = 1.0 - parse_floats(file, line_no, rest, 1)?[0],
            "ns" => material.shininess = parse_floats(file, line_no, rest, 1)?[0],
            "map_kd" if !rest.is_empty() => material.texture = Some(PathBuf::from(rest)),
            _ => {}
        }
    }

    log::debug!("Parsed {}: {} materials", file, materials.len());
    Ok(materials)
}

/// `r [g b]`; a single value is used for all three channels
fn color(file: &str, line: usize, rest: &str) -> Result<Vec3> {
    let v = parse_floats(file, line, rest, 1)?;
    Ok(match v.as_slice() {
        [r, g, b, ..] => Vec3::new(*r, *g, *b),
        [grey, ..] => Vec3::splat(*grey),
        [] => Vec3::ZERO,
    })
}
