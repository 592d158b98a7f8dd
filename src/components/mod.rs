pub mod avatar;
pub mod physics;

pub use avatar::*;
pub use physics::*;

use std::collections::HashSet;

use glam::{Mat4, Quat, Vec3};
use hecs::{Entity, World};

/// Spatial transform with position, rotation, and scale (local space).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl LocalTransform {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Local +Z rotated into the parent frame.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

/// Computed world-space transform matrix, updated by the propagation system.
#[derive(Debug, Clone, Copy)]
pub struct GlobalTransform(pub Mat4);

impl GlobalTransform {
    pub fn translation(&self) -> Vec3 {
        self.0.w_axis.truncate()
    }
}

impl Default for GlobalTransform {
    fn default() -> Self {
        Self(Mat4::IDENTITY)
    }
}

/// Points to the parent entity in the transform hierarchy.
pub struct Parent(pub Entity);

/// Lists child entities in the transform hierarchy, in insertion order.
pub struct Children(pub Vec<Entity>);

/// Node name. Skeleton joints are matched by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Attach `child` under `parent` in the transform hierarchy.
pub fn add_child(world: &mut World, parent: Entity, child: Entity) {
    let has_children = world.get::<&Children>(parent).is_ok();
    if has_children {
        if let Ok(mut children) = world.get::<&mut Children>(parent) {
            if !children.0.contains(&child) {
                children.0.push(child);
            }
        }
    } else {
        let _ = world.insert_one(parent, Children(vec![child]));
    }

    let _ = world.insert_one(child, Parent(parent));
}

/// Marker: entity is hidden from rendering but still participates in physics/collision.
pub struct Hidden;

/// Hide or show everything below `root`. `root` itself is left alone.
pub fn set_subtree_hidden(world: &mut World, root: Entity, hidden: bool) {
    let mut stack: Vec<Entity> = world
        .get::<&Children>(root)
        .map(|c| c.0.clone())
        .unwrap_or_default();
    while let Some(entity) = stack.pop() {
        if hidden {
            let _ = world.insert_one(entity, Hidden);
        } else {
            let _ = world.remove_one::<Hidden>(entity);
        }
        if let Ok(children) = world.get::<&Children>(entity) {
            stack.extend(children.0.iter().copied());
        }
    }
}

/// Bone names of the renderable skinned skeleton attached to an avatar model.
/// Nodes whose names are not in this set are decorative/attachment nodes.
#[derive(Debug, Clone, Default)]
pub struct SkinnedSkeleton {
    pub bone_names: HashSet<String>,
}

impl SkinnedSkeleton {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bone_names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bone_names.contains(name)
    }
}

/// World object the avatar can sit on. `seat_offset` is added to the object's
/// world position to place the avatar root.
#[derive(Debug, Clone, Copy)]
pub struct Interactable {
    pub seat_offset: Vec3,
    /// Yaw the avatar takes when seated, radians.
    pub seat_yaw: f32,
}
