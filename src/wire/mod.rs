//! Data shapes shared with the network layer.
//!
//! Everything in here is in wire space. The network side never touches an
//! [`AvatarData`] directly: it sends [`AvatarUpdate`]s through an
//! [`AvatarLink`], and the render thread applies them at the start of a tick.

pub mod pose_mapper;

use std::collections::HashSet;

use crossbeam_channel::{unbounded, Receiver, Sender};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::engine::signal::Signal;
use crate::error::SkeletonError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoneType {
    SkeletonRoot,
    SkeletonChild,
    NonSkeletonRoot,
    NonSkeletonChild,
}

impl BoneType {
    pub fn classify(in_skeleton: bool, has_parent: bool) -> Self {
        match (in_skeleton, has_parent) {
            (true, false) => Self::SkeletonRoot,
            (true, true) => Self::SkeletonChild,
            (false, false) => Self::NonSkeletonRoot,
            (false, true) => Self::NonSkeletonChild,
        }
    }
}

/// One joint of an avatar skeleton, as exchanged with the network layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Joint {
    pub joint_name: String,
    pub joint_index: usize,
    /// -1 for roots, otherwise the index of an earlier joint.
    pub parent_index: i32,
    pub bone_type: BoneType,
    pub default_translation: Vec3,
    pub default_rotation: Quat,
    pub default_scale: f32,
}

/// `parent_index` as a usable index into a list of `len` joints, or `None`.
pub fn valid_parent(parent_index: i32, len: usize) -> Option<usize> {
    if parent_index >= 0 && (parent_index as usize) < len {
        Some(parent_index as usize)
    } else {
        None
    }
}

/// Check the ordering contract: each joint sits at its own index and its
/// parent is either -1 or an earlier joint.
pub fn validate_joints(joints: &[Joint]) -> Result<(), SkeletonError> {
    let mut names = HashSet::with_capacity(joints.len());
    for (index, joint) in joints.iter().enumerate() {
        if joint.joint_index != index {
            return Err(SkeletonError::IndexMismatch {
                joint: joint.joint_name.clone(),
                index,
                reported: joint.joint_index,
            });
        }
        if joint.parent_index != -1
            && !(joint.parent_index >= 0 && (joint.parent_index as usize) < index)
        {
            return Err(SkeletonError::ParentOutOfOrder {
                joint: joint.joint_name.clone(),
                index,
                parent: joint.parent_index,
            });
        }
        if !names.insert(joint.joint_name.as_str()) {
            return Err(SkeletonError::DuplicateJoint(joint.joint_name.clone()));
        }
    }
    Ok(())
}

/// A change staged by the network layer.
#[derive(Debug, Clone)]
pub enum AvatarUpdate {
    Position(Vec3),
    Orientation(Quat),
    Scale(f32),
    Skeleton(Vec<Joint>),
    JointTranslations(Vec<Option<Vec3>>),
    JointRotations(Vec<Option<Quat>>),
}

/// Network-side handle for staging updates. Cheap to clone, `Send`.
#[derive(Debug, Clone)]
pub struct AvatarLink {
    tx: Sender<AvatarUpdate>,
}

impl AvatarLink {
    /// Returns `false` once the avatar has been dropped.
    pub fn send(&self, update: AvatarUpdate) -> bool {
        self.tx.send(update).is_ok()
    }
}

/// Serializable copy of an avatar's replicated state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarSnapshot {
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: f32,
    pub skeleton: Vec<Joint>,
    pub joint_translations: Vec<Option<Vec3>>,
    pub joint_rotations: Vec<Option<Quat>>,
}

/// Replicated state of one avatar (controlled or remote), in wire space.
///
/// Joint arrays are parallel to `skeleton` but may be shorter or have holes
/// while an update is in flight; readers fall back to joint defaults.
pub struct AvatarData {
    position: Vec3,
    orientation: Quat,
    scale: f32,
    skeleton: Vec<Joint>,
    joint_translations: Vec<Option<Vec3>>,
    joint_rotations: Vec<Option<Quat>>,
    skeleton_generation: u64,
    /// Fired with the new joint count when the skeleton is replaced.
    pub skeleton_changed: Signal<usize>,
    pub scale_changed: Signal<f32>,
    tx: Sender<AvatarUpdate>,
    inbox: Receiver<AvatarUpdate>,
}

impl Default for AvatarData {
    fn default() -> Self {
        Self::new()
    }
}

impl AvatarData {
    pub fn new() -> Self {
        let (tx, inbox) = unbounded();
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            scale: 1.0,
            skeleton: Vec::new(),
            joint_translations: Vec::new(),
            joint_rotations: Vec::new(),
            skeleton_generation: 0,
            skeleton_changed: Signal::new(),
            scale_changed: Signal::new(),
            tx,
            inbox,
        }
    }

    pub fn link(&self) -> AvatarLink {
        AvatarLink { tx: self.tx.clone() }
    }

    /// Apply every staged update. Call once at the start of a tick.
    pub fn apply_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.inbox.try_recv() {
            self.apply(update);
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, update: AvatarUpdate) {
        match update {
            AvatarUpdate::Position(p) => self.position = p,
            AvatarUpdate::Orientation(q) => self.orientation = q,
            AvatarUpdate::Scale(s) => self.set_scale(s),
            AvatarUpdate::Skeleton(joints) => self.set_skeleton(joints),
            AvatarUpdate::JointTranslations(t) => self.joint_translations = t,
            AvatarUpdate::JointRotations(r) => self.joint_rotations = r,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation;
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        if scale != self.scale {
            self.scale = scale;
            self.scale_changed.emit(&scale);
        }
    }

    pub fn skeleton(&self) -> &[Joint] {
        &self.skeleton
    }

    pub fn set_skeleton(&mut self, joints: Vec<Joint>) {
        self.skeleton = joints;
        self.joint_translations.clear();
        self.joint_rotations.clear();
        self.skeleton_generation += 1;
        let count = self.skeleton.len();
        self.skeleton_changed.emit(&count);
    }

    /// Bumped on every skeleton replacement.
    pub fn skeleton_generation(&self) -> u64 {
        self.skeleton_generation
    }

    pub fn joint_translation(&self, index: usize) -> Option<Vec3> {
        self.joint_translations.get(index).copied().flatten()
    }

    pub fn joint_rotation(&self, index: usize) -> Option<Quat> {
        self.joint_rotations.get(index).copied().flatten()
    }

    pub fn joint_rotations(&self) -> &[Option<Quat>] {
        &self.joint_rotations
    }

    pub fn joint_translations(&self) -> &[Option<Vec3>] {
        &self.joint_translations
    }

    /// Size both joint arrays for `len` joints, keeping existing entries.
    pub fn resize_joints(&mut self, len: usize) {
        self.joint_translations.resize(len, None);
        self.joint_rotations.resize(len, None);
    }

    pub fn set_joint(&mut self, index: usize, translation: Vec3, rotation: Quat) {
        if index >= self.joint_rotations.len() || index >= self.joint_translations.len() {
            self.resize_joints(index + 1);
        }
        self.joint_translations[index] = Some(translation);
        self.joint_rotations[index] = Some(rotation);
    }

    pub fn snapshot(&self) -> AvatarSnapshot {
        AvatarSnapshot {
            position: self.position,
            orientation: self.orientation,
            scale: self.scale,
            skeleton: self.skeleton.clone(),
            joint_translations: self.joint_translations.clone(),
            joint_rotations: self.joint_rotations.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn joint(name: &str, index: usize, parent: i32) -> Joint {
        Joint {
            joint_name: name.to_string(),
            joint_index: index,
            parent_index: parent,
            bone_type: BoneType::classify(true, parent >= 0),
            default_translation: Vec3::ZERO,
            default_rotation: Quat::IDENTITY,
            default_scale: 1.0,
        }
    }

    #[test]
    fn ordered_skeleton_validates() {
        let joints = vec![joint("Hips", 0, -1), joint("Spine", 1, 0), joint("Head", 2, 1)];
        assert_eq!(validate_joints(&joints), Ok(()));
    }

    #[test]
    fn forward_parent_reference_is_rejected() {
        let joints = vec![joint("Hips", 0, -1), joint("Spine", 1, 2), joint("Head", 2, 0)];
        assert_eq!(
            validate_joints(&joints),
            Err(SkeletonError::ParentOutOfOrder {
                joint: "Spine".into(),
                index: 1,
                parent: 2
            })
        );
        let self_parent = vec![joint("Hips", 0, 0)];
        assert!(validate_joints(&self_parent).is_err());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let joints = vec![joint("Hips", 0, -1), joint("Hips", 1, 0)];
        assert_eq!(
            validate_joints(&joints),
            Err(SkeletonError::DuplicateJoint("Hips".into()))
        );
    }

    #[test]
    fn valid_parent_guards_range() {
        assert_eq!(valid_parent(-1, 3), None);
        assert_eq!(valid_parent(2, 3), Some(2));
        assert_eq!(valid_parent(3, 3), None);
    }

    #[test]
    fn staged_updates_apply_on_tick_and_fire_signals() {
        let mut data = AvatarData::new();
        let link = data.link();
        let skeleton_events = Rc::new(Cell::new(0));
        let scale_events = Rc::new(Cell::new(0.0));
        {
            let s = skeleton_events.clone();
            data.skeleton_changed.connect(move |n| s.set(*n));
            let s = scale_events.clone();
            data.scale_changed.connect(move |v| s.set(*v));
        }

        let sender = std::thread::spawn(move || {
            link.send(AvatarUpdate::Position(Vec3::X));
            link.send(AvatarUpdate::Skeleton(vec![joint("Hips", 0, -1)]));
            link.send(AvatarUpdate::Scale(2.0));
        });
        sender.join().unwrap();

        assert_eq!(data.position(), Vec3::ZERO);
        assert_eq!(data.apply_pending(), 3);
        assert_eq!(data.position(), Vec3::X);
        assert_eq!(skeleton_events.get(), 1);
        assert_eq!(scale_events.get(), 2.0);
    }

    #[test]
    fn short_arrays_read_as_missing() {
        let mut data = AvatarData::new();
        data.set_joint(1, Vec3::Y, Quat::IDENTITY);
        assert_eq!(data.joint_rotation(0), None);
        assert_eq!(data.joint_translation(1), Some(Vec3::Y));
        assert_eq!(data.joint_rotation(5), None);
    }

    #[test]
    fn joint_serializes_with_wire_field_names() {
        let text = toml::to_string(&joint("Hips", 0, -1)).unwrap();
        assert!(text.contains("jointName"));
        assert!(text.contains("parentIndex = -1"));
    }
}
