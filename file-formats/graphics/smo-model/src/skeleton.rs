//! Bone hierarchy
//!
//! Bones live in a flat arena addressed by their dense id. Parent links are
//! plain ids, so the tree never forms reference cycles, and the root is always
//! `bones[0]` because a parent must be pushed before any of its children.

use glam::Vec3;

use crate::animation::Animation;
use crate::error::{ModelError, Result};

/// Dense bone index; equal to the bone's position in the skeleton
pub type BoneId = usize;

/// Advisory per-axis rotation limits, in degrees
///
/// The evaluator does not clamp against these; they are carried for callers
/// that drive bones procedurally.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RotationLimits {
    pub upper: Vec3,
    pub lower: Vec3,
}

impl RotationLimits {
    /// Clamp `rotation` into the limits, axis by axis
    pub fn clamp(&self, rotation: Vec3) -> Vec3 {
        rotation.clamp(self.lower.min(self.upper), self.upper.max(self.lower))
    }
}

/// A node of the bone hierarchy
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bone {
    pub id: BoneId,
    pub name: String,
    /// Pivot point the bone rotates about, in model space
    pub pivot: Vec3,
    /// End point of the bone, used to chain dependent geometry
    pub end: Vec3,
    /// Rotation used when the bone has no animation to resolve
    pub rest_rotation: Vec3,
    pub limits: RotationLimits,
    pub parent: Option<BoneId>,
    pub children: Vec<BoneId>,
    pub animations: Vec<Animation>,
}

impl Bone {
    /// Create a bone with no animations and a zero rest rotation
    pub fn new(
        id: BoneId,
        name: impl Into<String>,
        pivot: Vec3,
        end: Vec3,
        parent: Option<BoneId>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            pivot,
            end,
            rest_rotation: Vec3::ZERO,
            limits: RotationLimits::default(),
            parent,
            children: Vec::new(),
            animations: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn animation(&self, animation_id: usize) -> Option<&Animation> {
        self.animations.get(animation_id)
    }

    /// Index of the first animation named `name` on this bone
    pub fn animation_id(&self, name: &str) -> Option<usize> {
        self.animations.iter().position(|a| a.name == name)
    }
}

/// Flat, id-indexed bone hierarchy
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Skeleton {
    bones: Vec<Bone>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bone, linking it into its parent's child list
    ///
    /// The bone's id must equal the current bone count, its parent must
    /// already be present, and only the first bone may be a root. Any
    /// children listed on `bone` are discarded; they are filled in as
    /// children are pushed.
    pub fn push(&mut self, mut bone: Bone) -> Result<BoneId> {
        let id = self.bones.len();
        if bone.id != id {
            return Err(ModelError::Validation(format!(
                "bone '{}' has id {} but ids must be dense and in file order (expected {})",
                bone.name, bone.id, id
            )));
        }

        match bone.parent {
            Some(parent) if parent >= id => {
                return Err(ModelError::Reference(format!(
                    "bone {} ('{}') names parent {} which has not been loaded",
                    id, bone.name, parent
                )));
            }
            Some(parent) => self.bones[parent].children.push(id),
            None if id != 0 => {
                return Err(ModelError::Validation(format!(
                    "bone {} ('{}') is a second root; only bone 0 may have no parent",
                    id, bone.name
                )));
            }
            None => {}
        }

        bone.children.clear();
        self.bones.push(bone);
        Ok(id)
    }

    /// Append an animation track to a bone
    pub fn push_animation(&mut self, bone_id: BoneId, animation: Animation) -> Result<usize> {
        let count = self.bones.len();
        let bone = self.bones.get_mut(bone_id).ok_or_else(|| {
            ModelError::Reference(format!(
                "animation '{}' targets bone {} but the skeleton has {} bones",
                animation.name, bone_id, count
            ))
        })?;
        bone.animations.push(animation);
        Ok(bone.animations.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn root(&self) -> Option<&Bone> {
        self.bones.first()
    }

    pub fn get(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id)
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bone> {
        self.bones.iter()
    }

    /// Id of the first bone named `name`
    pub fn bone_id(&self, name: &str) -> Option<BoneId> {
        self.bones.iter().position(|b| b.name == name)
    }

    pub fn bone_name(&self, id: BoneId) -> Option<&str> {
        self.bones.get(id).map(|b| b.name.as_str())
    }

    /// Animation index for `name`, looked up on the root bone
    ///
    /// Animation files add one block per bone for each clip, so the root's
    /// track order is the canonical clip order.
    pub fn animation_id(&self, name: &str) -> Option<usize> {
        self.root().and_then(|root| root.animation_id(name))
    }

    /// Number of animation tracks on the root bone
    pub fn animation_count(&self) -> usize {
        self.root().map_or(0, |root| root.animations.len())
    }

    /// Walk from `id` towards the root, excluding `id` itself
    pub fn ancestors(&self, id: BoneId) -> Ancestors<'_> {
        Ancestors {
            skeleton: self,
            next: self.bones.get(id).and_then(|b| b.parent),
        }
    }

    /// All descendants of `id` in depth-first pre-order, excluding `id`
    pub fn descendants(&self, id: BoneId) -> Vec<BoneId> {
        let mut out = Vec::new();
        let Some(bone) = self.bones.get(id) else {
            return out;
        };
        let mut stack: Vec<BoneId> = bone.children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.bones[next].children.iter().rev());
        }
        out
    }

    /// Number of edges between `id` and the root
    pub fn depth(&self, id: BoneId) -> usize {
        self.ancestors(id).count()
    }

    /// Check the arena invariants
    ///
    /// Holds by construction for skeletons built through [`Skeleton::push`];
    /// deserialized skeletons should be checked before use.
    pub fn validate(&self) -> Result<()> {
        for (index, bone) in self.bones.iter().enumerate() {
            if bone.id != index {
                return Err(ModelError::Validation(format!(
                    "bone at index {} carries id {}",
                    index, bone.id
                )));
            }
            match bone.parent {
                None if index != 0 => {
                    return Err(ModelError::Validation(format!(
                        "bone {} is a root but is not the first bone",
                        index
                    )));
                }
                Some(parent) if parent >= index => {
                    return Err(ModelError::Validation(format!(
                        "bone {} has parent {} which does not precede it",
                        index, parent
                    )));
                }
                Some(parent) if !self.bones[parent].children.contains(&index) => {
                    return Err(ModelError::Validation(format!(
                        "bone {} is missing from the child list of its parent {}",
                        index, parent
                    )));
                }
                _ => {}
            }
            for &child in &bone.children {
                if self.bones.get(child).and_then(|c| c.parent) != Some(index) {
                    return Err(ModelError::Validation(format!(
                        "bone {} lists child {} whose parent is not {}",
                        index, child, index
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Iterator over a bone's ancestors, nearest first
pub struct Ancestors<'a> {
    skeleton: &'a Skeleton,
    next: Option<BoneId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Bone;

    fn next(&mut self) -> Option<Self::Item> {
        let bone = self.skeleton.bones.get(self.next?)?;
        self.next = bone.parent;
        Some(bone)
    }
}
