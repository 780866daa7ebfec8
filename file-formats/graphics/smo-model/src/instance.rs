//! Placed, independently animated uses of a shared model

use std::time::Duration;

use glam::{Mat4, Vec3};

use crate::animation::{InstanceAnimation, compose_world_matrices, rotation_matrix};
use crate::backend::RenderBackend;
use crate::error::Result;
use crate::model::Model;
use crate::skeleton::BoneId;

/// Position, Euler rotation in degrees, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Placement {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Placement {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// `T * Rx * Ry * Rz * S`
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * rotation_matrix(self.rotation)
            * Mat4::from_scale(self.scale)
    }
}

/// One placed instance of a model with its own animation state
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInstance {
    pub placement: Placement,
    animation: InstanceAnimation,
}

impl ModelInstance {
    pub fn new(model: &Model) -> Self {
        Self {
            placement: Placement::default(),
            animation: InstanceAnimation::new(model.skeleton()),
        }
    }

    pub fn with_placement(model: &Model, placement: Placement) -> Self {
        Self {
            placement,
            animation: InstanceAnimation::new(model.skeleton()),
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.placement.model_matrix()
    }

    pub fn animation(&self) -> &InstanceAnimation {
        &self.animation
    }

    pub fn animation_mut(&mut self) -> &mut InstanceAnimation {
        &mut self.animation
    }

    pub fn frame(&self, bone: BoneId) -> f32 {
        self.animation.frame(bone)
    }

    pub fn current_animation(&self, bone: BoneId) -> usize {
        self.animation.current_animation(bone)
    }

    pub fn advance_frame(&mut self, model: &Model, delta: f32, bone: BoneId, children: bool) {
        self.animation
            .advance_frame(model.skeleton(), delta, bone, children);
    }

    pub fn set_frame(&mut self, model: &Model, frame: f32, bone: BoneId, children: bool) {
        self.animation.set_frame(model.skeleton(), frame, bone, children);
    }

    pub fn set_current_animation(
        &mut self,
        model: &Model,
        animation: usize,
        bone: BoneId,
        children: bool,
    ) {
        self.animation
            .set_current_animation(model.skeleton(), animation, bone, children);
    }

    pub fn advance_by_time(&mut self, model: &Model, elapsed: Duration, bone: BoneId, children: bool) {
        self.animation.advance_by_time(model, elapsed, bone, children);
    }

    /// World matrix per bone for the current animation state
    pub fn pose(&self, model: &Model) -> Vec<Mat4> {
        compose_world_matrices(model.skeleton(), self.animation.samples())
    }

    /// Draw this instance; with `skip_animation` no bone matrices are sent
    pub fn draw<B: RenderBackend + ?Sized>(
        &self,
        model: &Model,
        backend: &mut B,
        skip_animation: bool,
    ) -> Result<()> {
        let bones = if skip_animation || model.skeleton().is_empty() {
            Vec::new()
        } else {
            self.pose(model)
        };
        model.draw_with(backend, self.model_matrix(), &bones)
    }
}
