//! File formats
//!
//! The SMx formats are line oriented text with one field per line:
//! - [`smm`]: interleaved vertex buffer plus texture list
//! - [`sms`]: bone hierarchy
//! - [`sma`]: per-bone rotation tracks
//! - [`smo`]: umbrella naming one file of each kind
//!
//! [`obj`] reads Wavefront OBJ with MTL material libraries.

pub mod obj;
pub mod sma;
pub mod smm;
pub mod smo;
pub mod sms;
pub(crate) mod text;
