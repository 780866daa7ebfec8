//! Keyframe interpolation for bone rotation tracks

use glam::Vec3;

use super::track::KeyFrame;
use crate::skeleton::Bone;

/// Signed per-axis delta from `prev` to `next` along the shorter arc
///
/// Both angles are expected in `[-360, 360]`. The direct difference and the
/// way around through ±180 are compared by magnitude; the wrapped distance,
/// when shorter, is signed after `prev`.
pub fn shortest_delta(prev: f32, next: f32) -> f32 {
    let direct = next - prev;
    let wrapped = (360.0 - prev.abs()) - next.abs();
    if direct.abs() < wrapped.abs() {
        direct
    } else if prev < 0.0 {
        -wrapped
    } else {
        wrapped
    }
}

/// Interpolate between two bracketing keys
///
/// `frame` is expected to lie in `[prev.step, next.step]`; the result is not
/// normalized into any angle range.
pub fn interpolate_keys(prev: &KeyFrame, next: &KeyFrame, frame: f32) -> Vec3 {
    let span = next.step as f32 - prev.step as f32;
    if span <= 0.0 {
        return prev.rotation;
    }
    let t = (frame - prev.step as f32) / span;
    let a = prev.rotation;
    let b = next.rotation;
    Vec3::new(
        a.x + shortest_delta(a.x, b.x) * t,
        a.y + shortest_delta(a.y, b.y) * t,
        a.z + shortest_delta(a.z, b.z) * t,
    )
}

/// Rotation of `bone` for `animation_id` at `frame`, in degrees
///
/// A bone without animations, or an animation without keys, yields the
/// bone's rest rotation. Frames before the first key hold the first key and
/// frames past the last key hold the last.
///
/// # Panics
///
/// Panics if the bone has animations and `animation_id` is not one of them.
#[allow(clippy::panic)]
pub fn resolve_rotation(bone: &Bone, animation_id: usize, frame: f32) -> Vec3 {
    if bone.animations.is_empty() {
        return bone.rest_rotation;
    }
    let Some(animation) = bone.animations.get(animation_id) else {
        panic!(
            "animation {} out of range for bone {} ('{}') with {} animations",
            animation_id,
            bone.id,
            bone.name,
            bone.animations.len()
        );
    };

    let keys = &animation.keyframes;
    let Some(first) = keys.first() else {
        return bone.rest_rotation;
    };

    let Some(index) = animation.key_index(frame) else {
        return first.rotation;
    };

    let prev = &keys[index];
    if prev.step as f32 == frame {
        return prev.rotation;
    }
    match keys.get(index + 1) {
        Some(next) => interpolate_keys(prev, next, frame),
        None => prev.rotation,
    }
}
