//! SMO umbrella files
//!
//! Line one names the mesh+material file, line two the bone file, and every
//! further line an animation file. Member paths are relative to the
//! directory holding the umbrella file.

use std::io::Write;
use std::path::{Path, PathBuf};

use super::text::{RecordReader, RecordWriter, read_source};
use crate::error::Result;

/// Member files named by an umbrella file
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Umbrella {
    pub mesh: String,
    pub skeleton: String,
    pub animations: Vec<String>,
}

impl Umbrella {
    pub fn mesh_path(&self, base: &Path) -> PathBuf {
        base.join(&self.mesh)
    }

    pub fn skeleton_path(&self, base: &Path) -> PathBuf {
        base.join(&self.skeleton)
    }

    pub fn animation_paths<'a>(&'a self, base: &'a Path) -> impl Iterator<Item = PathBuf> + 'a {
        self.animations.iter().map(move |a| base.join(a))
    }
}

pub fn read(path: &Path) -> Result<Umbrella> {
    let content = read_source(path)?;
    parse(&path.display().to_string(), &content)
}

pub fn parse(file: &str, content: &str) -> Result<Umbrella> {
    let mut reader = RecordReader::new(file, content);
    let mesh = reader.next_line("mesh file")?.to_string();
    let skeleton = reader.next_line("bone file")?.to_string();

    let mut animations = Vec::with_capacity(reader.remaining());
    while reader.remaining() > 0 {
        let line = reader.next_line("animation file")?;
        if line.is_empty() {
            return Err(reader.parse_error("empty animation file name"));
        }
        animations.push(line.to_string());
    }

    log::debug!(
        "Parsed {}: mesh {}, bones {}, {} animation files",
        file,
        mesh,
        skeleton,
        animations.len()
    );

    Ok(Umbrella {
        mesh,
        skeleton,
        animations,
    })
}

pub fn write<W: Write>(out: W, umbrella: &Umbrella) -> Result<W> {
    let mut writer = RecordWriter::new(out);
    writer.field(&umbrella.mesh)?;
    writer.field(&umbrella.skeleton)?;
    for animation in &umbrella.animations {
        writer.field(animation)?;
    }
    writer.finish()
}
