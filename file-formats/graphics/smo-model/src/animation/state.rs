//! Per-instance animation state
//!
//! Many instances can share one [`Model`]; each keeps its own animation
//! selection and frame per bone here.

use std::time::Duration;

use super::bone_transform::BoneSample;
use crate::model::Model;
use crate::skeleton::{BoneId, Skeleton};

/// Wrap `frame` into the loop of an animation of `length` frames
///
/// Frames past `length` wrap back by whole periods and frames below 1 wrap
/// forward by `length - 1`. Lengths below 2 have no loop to wrap around and
/// pin the frame to 1.
pub fn wrap_frame(frame: f32, length: u32) -> f32 {
    if length < 2 {
        return 1.0;
    }
    let length = length as f32;
    let mut frame = frame;
    if frame > length {
        frame -= ((frame - length) / length).ceil() * length;
    }
    if frame < 1.0 {
        frame += ((1.0 - frame) / (length - 1.0)).ceil() * (length - 1.0);
    }
    frame
}

/// Frame delta for `elapsed` wall time at `framerate` animation frames per second
pub fn frame_delta(elapsed: Duration, framerate: f32) -> f32 {
    elapsed.as_secs_f32() * framerate
}

/// Animation selection and frame for every bone of one instance
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceAnimation {
    samples: Vec<BoneSample>,
}

impl InstanceAnimation {
    /// Every bone starts on animation 0 at frame 0
    pub fn new(skeleton: &Skeleton) -> Self {
        Self {
            samples: vec![BoneSample::default(); skeleton.len()],
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Per-bone selection, indexed by bone id
    pub fn samples(&self) -> &[BoneSample] {
        &self.samples
    }

    pub fn frame(&self, bone: BoneId) -> f32 {
        self.samples[bone].frame
    }

    pub fn current_animation(&self, bone: BoneId) -> usize {
        self.samples[bone].animation
    }

    /// Add `delta` to the frame of `bone`, and of all its descendants when
    /// `apply_to_children` is set
    ///
    /// Each bone wraps against the length of its own current animation.
    pub fn advance_frame(
        &mut self,
        skeleton: &Skeleton,
        delta: f32,
        bone: BoneId,
        apply_to_children: bool,
    ) {
        self.for_each_target(skeleton, bone, apply_to_children, |sample, length| {
            let next = sample.frame + delta;
            sample.frame = length.map_or(next, |length| wrap_frame(next, length));
        });
    }

    /// Set the frame of `bone` (and optionally its descendants), wrapped the
    /// same way as [`InstanceAnimation::advance_frame`]
    pub fn set_frame(
        &mut self,
        skeleton: &Skeleton,
        frame: f32,
        bone: BoneId,
        apply_to_children: bool,
    ) {
        self.for_each_target(skeleton, bone, apply_to_children, |sample, length| {
            sample.frame = length.map_or(frame, |length| wrap_frame(frame, length));
        });
    }

    /// Switch `bone` (and optionally its descendants) to `animation`
    ///
    /// The frame is left untouched.
    pub fn set_current_animation(
        &mut self,
        skeleton: &Skeleton,
        animation: usize,
        bone: BoneId,
        apply_to_children: bool,
    ) {
        self.samples[bone].animation = animation;
        if apply_to_children {
            for child in skeleton.descendants(bone) {
                self.samples[child].animation = animation;
            }
        }
    }

    /// Advance by wall time, converted to frames with the model's framerate
    pub fn advance_by_time(
        &mut self,
        model: &Model,
        elapsed: Duration,
        bone: BoneId,
        apply_to_children: bool,
    ) {
        let delta = frame_delta(elapsed, model.framerate());
        self.advance_frame(model.skeleton(), delta, bone, apply_to_children);
    }

    fn for_each_target<F>(&mut self, skeleton: &Skeleton, bone: BoneId, children: bool, mut f: F)
    where
        F: FnMut(&mut BoneSample, Option<u32>),
    {
        let mut apply = |id: BoneId, samples: &mut [BoneSample]| {
            let sample = &mut samples[id];
            let length = skeleton
                .get(id)
                .and_then(|b| b.animation(sample.animation))
                .map(|a| a.length);
            f(sample, length);
        };

        apply(bone, self.samples.as_mut_slice());
        if children {
            for child in skeleton.descendants(bone) {
                apply(child, self.samples.as_mut_slice());
            }
        }
    }
}
