//! Per-bone rotation tracks

use glam::Vec3;

use crate::error::{ModelError, Result};

/// A rotation sample at an integer step
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyFrame {
    /// Euler rotation in degrees, applied X then Y then Z
    pub rotation: Vec3,
    pub step: u32,
}

impl KeyFrame {
    pub const fn new(rotation: Vec3, step: u32) -> Self {
        Self { rotation, step }
    }
}

/// A named rotation track owned by one bone
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Animation {
    pub name: String,
    /// Loop period in frames
    pub length: u32,
    /// Keys ordered by non-decreasing step
    pub keyframes: Vec<KeyFrame>,
}

impl Animation {
    pub fn new(name: impl Into<String>, length: u32, keyframes: Vec<KeyFrame>) -> Self {
        Self {
            name: name.into(),
            length,
            keyframes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn first(&self) -> Option<&KeyFrame> {
        self.keyframes.first()
    }

    pub fn last(&self) -> Option<&KeyFrame> {
        self.keyframes.last()
    }

    /// Index of the key at or before `frame`
    ///
    /// Returns `None` for an empty track or a frame before the first key.
    pub fn key_index(&self, frame: f32) -> Option<usize> {
        let after = self.keyframes.partition_point(|k| k.step as f32 <= frame);
        after.checked_sub(1)
    }

    /// Check that keys are ordered by step
    pub fn validate(&self) -> Result<()> {
        for pair in self.keyframes.windows(2) {
            if pair[1].step < pair[0].step {
                return Err(ModelError::Validation(format!(
                    "animation '{}' has key step {} after step {}",
                    self.name, pair[1].step, pair[0].step
                )));
            }
        }
        Ok(())
    }
}
