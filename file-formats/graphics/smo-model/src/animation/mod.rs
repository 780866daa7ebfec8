//! Skeletal animation
//!
//! This module provides:
//! - Rotation tracks owned by bones ([`Animation`], [`KeyFrame`])
//! - Shortest-arc keyframe interpolation
//! - World matrix composition over the bone hierarchy
//! - Per-instance frame bookkeeping with loop wrapping
//!
//! # Example
//!
//! ```rust,no_run
//! use smo_model::animation::{InstanceAnimation, compose_world_matrices};
//! use smo_model::{LoadOptions, Model};
//!
//! let model = Model::load("data/robot.smo", &LoadOptions::default())?;
//! let mut state = InstanceAnimation::new(model.skeleton());
//!
//! // Play the second clip on the whole body and step one frame
//! state.set_current_animation(model.skeleton(), 1, 0, true);
//! state.advance_frame(model.skeleton(), 1.0, 0, true);
//!
//! let matrices = compose_world_matrices(model.skeleton(), state.samples());
//! assert_eq!(matrices.len(), model.skeleton().len());
//! # Ok::<(), smo_model::ModelError>(())
//! ```

mod bone_transform;
mod interpolation;
mod state;
mod track;

pub use bone_transform::{
    BoneSample, compose_world_matrices, compose_world_matrices_into,
    compose_world_matrices_uniform, flatten_matrices, local_matrix, rotation_matrix,
    transformed_end_points,
};
pub use interpolation::{interpolate_keys, resolve_rotation, shortest_delta};
pub use state::{InstanceAnimation, frame_delta, wrap_frame};
pub use track::{Animation, KeyFrame};
