//! SMA animation files
//!
//! A block count, then per block: bone id, animation name, length, key count,
//! and four lines per key (rotation xyz in degrees, integer step). Each block
//! appends one animation to the named bone.

use std::io::Write;
use std::path::Path;

use super::text::{RecordReader, RecordWriter, read_source};
use crate::animation::{Animation, KeyFrame};
use crate::error::Result;
use crate::skeleton::{BoneId, Skeleton};

/// Lines per block before its keys: bone id, name, length, key count
const BLOCK_HEADER_LINES: usize = 4;

/// Lines per key: rotation xyz and step
const KEY_LINES: usize = 4;

/// One animation block, not yet attached to a skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationBlock {
    pub bone: BoneId,
    pub animation: Animation,
}

pub fn read(path: &Path) -> Result<Vec<AnimationBlock>> {
    let content = read_source(path)?;
    parse(&path.display().to_string(), &content)
}

pub fn parse(file: &str, content: &str) -> Result<Vec<AnimationBlock>> {
    let mut reader = RecordReader::new(file, content);
    let count = reader.next_usize("animation block count")?;
    let mut blocks = Vec::with_capacity(reader.capacity_for(count, BLOCK_HEADER_LINES));

    for _ in 0..count {
        let bone = reader.next_usize("bone id")?;
        let name = reader.next_line("animation name")?.to_string();
        let length = reader.next_value::<u32>("animation length")?;
        let key_count = reader.next_usize("key frame count")?;

        let mut keyframes = Vec::with_capacity(reader.capacity_for(key_count, KEY_LINES));
        for _ in 0..key_count {
            let rotation = reader.next_vec3("key rotation")?;
            let step = reader.next_value::<u32>("key step")?;
            keyframes.push(KeyFrame::new(rotation, step));
        }

        let animation = Animation::new(name, length, keyframes);
        animation.validate()?;
        blocks.push(AnimationBlock { bone, animation });
    }

    if reader.remaining() > 0 {
        log::warn!(
            "{}: ignoring {} lines after {} animation blocks",
            file,
            reader.remaining(),
            count
        );
    }

    log::debug!("Parsed {}: {} animation blocks", file, blocks.len());
    Ok(blocks)
}

/// Append every block to its bone, in file order
pub fn attach(skeleton: &mut Skeleton, blocks: Vec<AnimationBlock>) -> Result<()> {
    for block in blocks {
        skeleton.push_animation(block.bone, block.animation)?;
    }
    Ok(())
}

/// Write every animation of every bone, bone by bone
pub fn write<W: Write>(out: W, skeleton: &Skeleton) -> Result<W> {
    let count: usize = skeleton.iter().map(|b| b.animations.len()).sum();
    let mut writer = RecordWriter::new(out);
    writer.field(count)?;
    for bone in skeleton.iter() {
        for animation in &bone.animations {
            writer.comment(&format!("{} on bone {}", animation.name, bone.name))?;
            writer.field(bone.id)?;
            writer.field(&animation.name)?;
            writer.field(animation.length)?;
            writer.field(animation.keyframes.len())?;
            for key in &animation.keyframes {
                writer.vec3(key.rotation)?;
                writer.field(key.step)?;
            }
        }
    }
    writer.finish()
}
