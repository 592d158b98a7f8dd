//! Skeleton synchronizer.
//!
//! Builds the ordered joint list of an avatar model from the transform
//! hierarchy, then moves poses between the model and an [`AvatarData`] every
//! frame. Joint lists and cached defaults are kept in wire space; rotations on
//! the wire are absolute (chained from the root), rotations on the nodes are
//! parent-relative.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use hecs::{Entity, World};
use tracing::{error, trace, warn};

use crate::components::{Children, LocalTransform, Name, SkinnedSkeleton};
use crate::error::SkeletonError;
use crate::wire::pose_mapper::{quat_to_local, quat_to_wire, vec_to_local, vec_to_wire};
use crate::wire::{valid_parent, validate_joints, AvatarData, BoneType, Joint};

/// Walk the named nodes below `root` in pre-order and emit one joint each.
///
/// `root` itself is the avatar object and is not a joint. Parents are looked
/// up by name among nodes already emitted, so every `parent_index` is -1 or
/// smaller than the joint's own index. A model with no named nodes is
/// [`SkeletonError::Empty`].
pub fn build_skeleton(
    world: &World,
    root: Entity,
) -> Result<(Vec<Joint>, Vec<Entity>), SkeletonError> {
    let bones = find_skinned_skeleton(world, root);

    let mut joints: Vec<Joint> = Vec::new();
    let mut nodes: Vec<Entity> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();

    // (node, name of nearest named ancestor)
    let mut stack: Vec<(Entity, Option<String>)> = child_list(world, root)
        .into_iter()
        .rev()
        .map(|child| (child, None))
        .collect();

    while let Some((node, parent_name)) = stack.pop() {
        let name = world.get::<&Name>(node).ok().map(|n| n.0.clone());

        let next_parent = match name {
            Some(name) if !index_by_name.contains_key(&name) => {
                let index = joints.len();
                let parent_index = parent_name
                    .as_ref()
                    .and_then(|p| index_by_name.get(p))
                    .map_or(-1, |&p| p as i32);
                let in_skeleton = bones.as_ref().is_some_and(|b| b.contains(&name));
                let local = world
                    .get::<&LocalTransform>(node)
                    .map(|l| *l)
                    .unwrap_or_default();

                joints.push(Joint {
                    joint_name: name.clone(),
                    joint_index: index,
                    parent_index,
                    bone_type: BoneType::classify(in_skeleton, parent_index >= 0),
                    default_translation: vec_to_wire(local.position),
                    default_rotation: quat_to_wire(local.rotation),
                    default_scale: local.scale.x,
                });
                nodes.push(node);
                index_by_name.insert(name.clone(), index);
                Some(name)
            }
            Some(name) => {
                warn!(joint = %name, "duplicate node name, skipping");
                parent_name
            }
            None => parent_name,
        };

        for child in child_list(world, node).into_iter().rev() {
            stack.push((child, next_parent.clone()));
        }
    }

    if joints.is_empty() {
        return Err(SkeletonError::Empty);
    }
    Ok((joints, nodes))
}

fn child_list(world: &World, entity: Entity) -> Vec<Entity> {
    world
        .get::<&Children>(entity)
        .map(|c| c.0.clone())
        .unwrap_or_default()
}

/// The skinned skeleton on `root` or the first one found below it.
fn find_skinned_skeleton(world: &World, root: Entity) -> Option<SkinnedSkeleton> {
    let mut stack = vec![root];
    while let Some(entity) = stack.pop() {
        if let Ok(skeleton) = world.get::<&SkinnedSkeleton>(entity) {
            return Some((*skeleton).clone());
        }
        stack.extend(child_list(world, entity));
    }
    None
}

/// Absolute rest rotations, chained from each joint's default local rotation.
fn default_absolute_rotations(joints: &[Joint]) -> Vec<Quat> {
    let mut absolute = Vec::with_capacity(joints.len());
    for (i, joint) in joints.iter().enumerate() {
        let rotation = match valid_parent(joint.parent_index, i) {
            Some(p) => absolute[p] * joint.default_rotation,
            None => joint.default_rotation,
        };
        absolute.push(rotation);
    }
    absolute
}

/// Per-avatar joint cache plus the two sync directions.
#[derive(Debug)]
pub struct SkeletonSync {
    root: Entity,
    joints: Vec<Joint>,
    nodes: Vec<Entity>,
    default_absolute: Vec<Quat>,
    /// Wire index -> local joint index, for a remote wire skeleton.
    remap: Vec<Option<usize>>,
    /// Wire skeleton generation the remap was computed for.
    remap_generation: Option<u64>,
    identity_remap: bool,
    skeleton_published: bool,
    reported_empty: bool,
    scratch: Vec<Quat>,
}

impl SkeletonSync {
    pub fn new(root: Entity) -> Self {
        Self {
            root,
            joints: Vec::new(),
            nodes: Vec::new(),
            default_absolute: Vec::new(),
            remap: Vec::new(),
            remap_generation: None,
            identity_remap: true,
            skeleton_published: false,
            reported_empty: false,
            scratch: Vec::new(),
        }
    }

    pub fn root(&self) -> Entity {
        self.root
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Rebuild the joint cache from the model. Returns the joint count.
    pub fn rebuild(&mut self, world: &World) -> usize {
        self.remap_generation = None;
        self.skeleton_published = false;
        match build_skeleton(world, self.root) {
            Ok((joints, nodes)) => {
                self.default_absolute = default_absolute_rotations(&joints);
                self.joints = joints;
                self.nodes = nodes;
                self.reported_empty = false;
                trace!(root = ?self.root, joints = self.joints.len(), "skeleton cache rebuilt");
            }
            Err(err) => {
                self.invalidate();
                if !self.reported_empty {
                    error!(root = ?self.root, %err, "avatar model unusable after rebuild");
                    self.reported_empty = true;
                }
            }
        }
        self.joints.len()
    }

    /// Drop the cache; the next sync rebuilds it.
    pub fn invalidate(&mut self) {
        self.joints.clear();
        self.nodes.clear();
        self.default_absolute.clear();
        self.remap.clear();
        self.remap_generation = None;
    }

    /// Local -> wire, for the controlled avatar.
    ///
    /// Publishes the joint list once per build, then every joint's translation
    /// and absolute rotation.
    pub fn publish(&mut self, world: &World, data: &mut AvatarData) {
        if self.joints.is_empty() && self.rebuild(world) == 0 {
            return;
        }
        if !self.skeleton_published {
            data.set_skeleton(self.joints.clone());
            self.skeleton_published = true;
        }

        let len = self.joints.len();
        data.resize_joints(len);
        self.scratch.clear();
        self.scratch.resize(len, Quat::IDENTITY);

        for i in 0..len {
            let local = world
                .get::<&LocalTransform>(self.nodes[i])
                .map(|l| *l)
                .ok();
            let (translation, rotation) = match local {
                Some(local) => (vec_to_wire(local.position), quat_to_wire(local.rotation)),
                None => (
                    self.joints[i].default_translation,
                    self.joints[i].default_rotation,
                ),
            };
            let absolute = match valid_parent(self.joints[i].parent_index, len) {
                Some(p) => self.scratch[p] * rotation,
                None => rotation,
            };
            self.scratch[i] = absolute;
            data.set_joint(i, translation, absolute);
        }
    }

    /// Wire -> local, for a remote avatar.
    ///
    /// Missing wire values fall back to the cached rest pose. Running it twice
    /// on the same data writes the same transforms. An empty wire skeleton
    /// means the model's own joint order; the cache is rebuilt only if it was
    /// dropped.
    pub fn apply(&mut self, world: &mut World, data: &AvatarData) {
        if self.joints.is_empty() && self.rebuild(world) == 0 {
            return;
        }
        self.refresh_remap(data);

        let wire = data.skeleton();
        let wire_len = if wire.is_empty() { self.joints.len() } else { wire.len() };
        self.scratch.clear();
        self.scratch.resize(wire_len, Quat::IDENTITY);

        for w in 0..wire_len {
            let local_index = self.remap.get(w).copied().flatten();
            let parent = self.wire_parent(wire, w, wire_len);

            // Every slot gets an absolute rotation, matched or not, so
            // children of unmatched wire joints still compose correctly.
            let absolute = match (data.joint_rotation(w), local_index) {
                (Some(rotation), _) => rotation,
                (None, Some(local)) => self.default_absolute[local],
                (None, None) => {
                    let rest = wire.get(w).map_or(Quat::IDENTITY, |j| j.default_rotation);
                    parent.map_or(rest, |p| self.scratch[p] * rest)
                }
            };
            self.scratch[w] = absolute;

            let Some(local_index) = local_index else {
                continue;
            };
            let relative = match parent {
                Some(p) => self.scratch[p].inverse() * absolute,
                None => absolute,
            };
            let translation = data
                .joint_translation(w)
                .unwrap_or(self.joints[local_index].default_translation);

            if let Ok(mut local) = world.get::<&mut LocalTransform>(self.nodes[local_index]) {
                local.rotation = quat_to_local(relative);
                local.position = vec_to_local(translation);
            }
        }
    }

    /// Parent of wire slot `w`, in wire index space.
    fn wire_parent(&self, wire: &[Joint], w: usize, len: usize) -> Option<usize> {
        if self.identity_remap {
            let local = self.remap.get(w).copied().flatten()?;
            valid_parent(self.joints[local].parent_index, len)
        } else {
            valid_parent(wire[w].parent_index, len)
        }
    }

    fn refresh_remap(&mut self, data: &AvatarData) {
        let wire = data.skeleton();
        if wire.is_empty() {
            self.use_identity_remap();
            self.remap_generation = None;
            return;
        }
        let generation = data.skeleton_generation();
        if self.remap_generation == Some(generation) {
            return;
        }
        self.remap_generation = Some(generation);

        match validate_joints(wire) {
            Ok(()) => {
                let by_name: HashMap<&str, usize> = self
                    .joints
                    .iter()
                    .map(|j| (j.joint_name.as_str(), j.joint_index))
                    .collect();
                self.remap = wire
                    .iter()
                    .map(|j| by_name.get(j.joint_name.as_str()).copied())
                    .collect();
                self.identity_remap = false;
                let unmatched = self.remap.iter().filter(|m| m.is_none()).count();
                if unmatched > 0 {
                    warn!(unmatched, "wire joints without a matching model node");
                }
            }
            Err(err) => {
                error!(%err, "rejecting wire skeleton, using model joint order");
                self.use_identity_remap();
            }
        }
    }

    fn use_identity_remap(&mut self) {
        self.remap = (0..self.joints.len()).map(Some).collect();
        self.identity_remap = true;
    }
}
