//! SMS bone hierarchy files
//!
//! A bone count followed by fifteen lines per bone: id, name, pivot xyz,
//! end xyz, parent id (negative for the root), upper rotation limit xyz and
//! lower rotation limit xyz.

use std::io::Write;
use std::path::Path;

use super::text::{RecordReader, RecordWriter, read_source};
use crate::error::Result;
use crate::skeleton::{Bone, RotationLimits, Skeleton};

pub fn read(path: &Path) -> Result<Skeleton> {
    let content = read_source(path)?;
    parse(&path.display().to_string(), &content)
}

/// Parse SMS content; parents must precede their children
pub fn parse(file: &str, content: &str) -> Result<Skeleton> {
    let mut reader = RecordReader::new(file, content);
    let count = reader.next_usize("bone count")?;
    let mut skeleton = Skeleton::new();

    for _ in 0..count {
        let id = reader.next_usize("bone id")?;
        let name = reader.next_line("bone name")?.to_string();
        let pivot = reader.next_vec3("bone pivot")?;
        let end = reader.next_vec3("bone end point")?;
        let parent = reader.next_i64("parent id")?;
        let upper = reader.next_vec3("upper rotation limit")?;
        let lower = reader.next_vec3("lower rotation limit")?;

        let parent = usize::try_from(parent).ok();
        let mut bone = Bone::new(id, name, pivot, end, parent);
        bone.limits = RotationLimits { upper, lower };
        skeleton.push(bone)?;
    }

    if reader.remaining() > 0 {
        log::warn!(
            "{}: ignoring {} lines after {} bones",
            file,
            reader.remaining(),
            count
        );
    }

    log::debug!("Parsed {}: {} bones", file, skeleton.len());
    Ok(skeleton)
}

/// Write a skeleton's bones; animations are not part of this format
pub fn write<W: Write>(out: W, skeleton: &Skeleton) -> Result<W> {
    let mut writer = RecordWriter::new(out);
    writer.field(skeleton.len())?;
    for bone in skeleton.iter() {
        writer.comment(&format!("bone {}", bone.id))?;
        writer.field(bone.id)?;
        writer.field(&bone.name)?;
        writer.vec3(bone.pivot)?;
        writer.vec3(bone.end)?;
        match bone.parent {
            Some(parent) => writer.field(parent)?,
            None => writer.field(-1)?,
        }
        writer.vec3(bone.limits.upper)?;
        writer.vec3(bone.limits.lower)?;
    }
    writer.finish()
}
