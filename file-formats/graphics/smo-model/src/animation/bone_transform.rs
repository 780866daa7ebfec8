//! Bone hierarchy transform computation
//!
//! Each bone rotates about its own pivot, and its world matrix is the parent's
//! world matrix times that local rotation. The evaluator keeps no state between
//! calls; everything it needs comes from the skeleton and the caller's
//! per-bone selection.

use glam::{Mat4, Vec3};

use super::interpolation::resolve_rotation;
use crate::skeleton::{Bone, Skeleton};

/// Which animation a bone plays and where it is in it
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoneSample {
    pub animation: usize,
    pub frame: f32,
}

impl BoneSample {
    pub const fn new(animation: usize, frame: f32) -> Self {
        Self { animation, frame }
    }
}

/// Rotation matrix for Euler angles in degrees, applied as `Rx * Ry * Rz`
pub fn rotation_matrix(degrees: Vec3) -> Mat4 {
    Mat4::from_rotation_x(degrees.x.to_radians())
        * Mat4::from_rotation_y(degrees.y.to_radians())
        * Mat4::from_rotation_z(degrees.z.to_radians())
}

/// Local transform of a bone: rotate by `rotation` about its pivot
pub fn local_matrix(bone: &Bone, rotation: Vec3) -> Mat4 {
    Mat4::from_translation(bone.pivot)
        * rotation_matrix(rotation)
        * Mat4::from_translation(-bone.pivot)
}

/// Compose world matrices for every bone, indexed by bone id
///
/// `selection[id]` picks the animation and frame for bone `id`; bones past the
/// end of `selection` play animation 0 at frame 0.
pub fn compose_world_matrices(skeleton: &Skeleton, selection: &[BoneSample]) -> Vec<Mat4> {
    let mut out = Vec::with_capacity(skeleton.len());
    compose_world_matrices_into(skeleton, selection, &mut out);
    out
}

/// Like [`compose_world_matrices`], reusing `out`'s allocation
pub fn compose_world_matrices_into(
    skeleton: &Skeleton,
    selection: &[BoneSample],
    out: &mut Vec<Mat4>,
) {
    out.clear();
    // Parents always precede their children, so a single pass in id order
    // visits the hierarchy parent-first.
    for bone in skeleton.iter() {
        let sample = selection.get(bone.id).copied().unwrap_or_default();
        let rotation = resolve_rotation(bone, sample.animation, sample.frame);
        let parent = bone.parent.map_or(Mat4::IDENTITY, |p| out[p]);
        out.push(parent * local_matrix(bone, rotation));
    }
}

/// Compose world matrices with every bone playing the same animation and frame
pub fn compose_world_matrices_uniform(
    skeleton: &Skeleton,
    animation: usize,
    frame: f32,
) -> Vec<Mat4> {
    let selection = vec![BoneSample::new(animation, frame); skeleton.len()];
    compose_world_matrices(skeleton, &selection)
}

/// Map every bone's end point through its world matrix
pub fn transformed_end_points(skeleton: &Skeleton, world: &[Mat4]) -> Vec<Vec3> {
    skeleton
        .iter()
        .zip(world)
        .map(|(bone, matrix)| matrix.transform_point3(bone.end))
        .collect()
}

/// Flatten matrices column-major, 16 floats each
pub fn flatten_matrices(world: &[Mat4]) -> Vec<f32> {
    world.iter().flat_map(|m| m.to_cols_array()).collect()
}
