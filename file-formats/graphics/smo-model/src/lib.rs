//! Model geometry and skeletal animation
//!
//! Loads SMO/SMM/SMS/SMA and Wavefront OBJ models into a [`Model`], evaluates
//! bone animations into world matrices, and tracks per-instance animation
//! state so many [`ModelInstance`]s can share one model.
//!
//! ```rust,no_run
//! use smo_model::{HeadlessBackend, LoadOptions, ModelLibrary, ModelInstance};
//!
//! let mut library = ModelLibrary::new(HeadlessBackend::new());
//! let model = library.load("robot", "data/robot.smo", &LoadOptions::default())?;
//! let mut robot = ModelInstance::new(model);
//!
//! let model = library.get("robot").unwrap();
//! robot.advance_frame(model, 1.0, 0, true);
//! library.draw("robot", &robot, false)?;
//! # Ok::<(), smo_model::ModelError>(())
//! ```

pub mod animation;
pub mod backend;
pub mod error;
pub mod format;
pub mod geometry;
pub mod instance;
pub mod library;
pub mod material;
pub mod model;
pub mod skeleton;

// Re-export common types
pub use animation::{Animation, BoneSample, InstanceAnimation, KeyFrame};
pub use backend::{
    BufferHandle, BufferUsage, DrawRequest, HeadlessBackend, RenderBackend, TextureHandle,
    TextureLayers,
};
pub use error::{ModelError, Result};
pub use geometry::{Triangle, Vertex};
pub use instance::{ModelInstance, Placement};
pub use library::ModelLibrary;
pub use material::{Material, MaterialTable};
pub use model::{LoadOptions, LoadReport, Model, ModelFormat};
pub use skeleton::{Bone, BoneId, Skeleton};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
