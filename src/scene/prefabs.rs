use glam::{Mat4, Quat, Vec3};
use hecs::{Entity, World};

use crate::components::*;

// ---------------------------------------------------------------------------
// AvatarRig: proportions table for spawn_avatar_model
// ---------------------------------------------------------------------------

/// Joint offsets of the stock humanoid, each relative to its parent bone.
/// Collider dimensions live apart from the bones so hitbox ≠ visual is possible.
struct AvatarRig {
    body_collider_radius: f32,
    body_collider_height: f32,
    /// Hips above the body origin (the capsule center).
    hips_y: f32,
    spine_y: f32,
    neck_y: f32,
    head_y: f32,
    shoulder_x: f32,
    shoulder_y: f32,
    /// Z rotation of the upper arms, outward tilt (radians).
    shoulder_angle: f32,
    upper_arm: f32,
    forearm: f32,
    hip_x: f32,
    upper_leg: f32,
}

fn default_rig() -> AvatarRig {
    AvatarRig {
        body_collider_radius: 0.3,
        body_collider_height: 1.2,
        hips_y: 0.05,
        spine_y: 0.25,
        neck_y: 0.3,
        head_y: 0.12,
        shoulder_x: 0.18,
        shoulder_y: 0.25,
        shoulder_angle: 0.14,
        upper_arm: 0.28,
        forearm: 0.26,
        hip_x: 0.1,
        upper_leg: 0.42,
    }
}

/// One bone of the stock humanoid: name, parent (index into this table) and
/// rest transform.
struct BoneDef {
    name: &'static str,
    parent: Option<usize>,
    offset: Vec3,
    rotation: Quat,
}

fn bone_table(rig: &AvatarRig) -> Vec<BoneDef> {
    let bone = |name, parent, offset, rotation| BoneDef { name, parent, offset, rotation };
    vec![
        bone("Hips", None, Vec3::Y * rig.hips_y, Quat::IDENTITY),
        bone("Spine", Some(0), Vec3::Y * rig.spine_y, Quat::IDENTITY),
        bone("Neck", Some(1), Vec3::Y * rig.neck_y, Quat::IDENTITY),
        bone("Head", Some(2), Vec3::Y * rig.head_y, Quat::IDENTITY),
        bone(
            "LeftArm",
            Some(1),
            Vec3::new(rig.shoulder_x, rig.shoulder_y, 0.0),
            Quat::from_rotation_z(rig.shoulder_angle),
        ),
        bone("LeftForeArm", Some(4), Vec3::Y * -rig.upper_arm, Quat::IDENTITY),
        bone(
            "RightArm",
            Some(1),
            Vec3::new(-rig.shoulder_x, rig.shoulder_y, 0.0),
            Quat::from_rotation_z(-rig.shoulder_angle),
        ),
        bone("RightForeArm", Some(6), Vec3::Y * -rig.upper_arm, Quat::IDENTITY),
        bone("LeftUpLeg", Some(0), Vec3::new(rig.hip_x, 0.0, 0.0), Quat::IDENTITY),
        bone("LeftLeg", Some(8), Vec3::Y * -rig.upper_leg, Quat::IDENTITY),
        bone("RightUpLeg", Some(0), Vec3::new(-rig.hip_x, 0.0, 0.0), Quat::IDENTITY),
        bone("RightLeg", Some(10), Vec3::Y * -rig.upper_leg, Quat::IDENTITY),
    ]
}

/// Bone names of the stock humanoid, in build order.
pub fn humanoid_bone_names() -> Vec<&'static str> {
    bone_table(&default_rig()).into_iter().map(|b| b.name).collect()
}

// ---------------------------------------------------------------------------
// spawn_avatar_model: shared by the controlled and remote avatars
// ---------------------------------------------------------------------------

/// Attach the stock humanoid under `root` and tag `root` with its skinned
/// skeleton. A hand attachment and an unnamed pivot ride along as
/// non-skeleton nodes.
fn spawn_avatar_model(world: &mut World, root: Entity, rig: &AvatarRig) {
    let table = bone_table(rig);
    let mut bones: Vec<Entity> = Vec::with_capacity(table.len());

    for def in &table {
        let bone = world.spawn((
            Name::new(def.name),
            LocalTransform::new(def.offset).with_rotation(def.rotation),
            GlobalTransform(Mat4::IDENTITY),
        ));
        let parent = def.parent.map_or(root, |p| bones[p]);
        add_child(world, parent, bone);
        bones.push(bone);
    }

    // Forearm end: unnamed pivot, then the named hand slot under it.
    let left_forearm = bones[5];
    let pivot = world.spawn((
        LocalTransform::new(Vec3::Y * -rig.forearm),
        GlobalTransform(Mat4::IDENTITY),
    ));
    add_child(world, left_forearm, pivot);
    let hand_slot = world.spawn((
        Name::new("LeftHandAttachment"),
        LocalTransform::default(),
        GlobalTransform(Mat4::IDENTITY),
    ));
    add_child(world, pivot, hand_slot);

    let _ = world.insert_one(root, SkinnedSkeleton::new(table.iter().map(|b| b.name)));
}

// ---------------------------------------------------------------------------
// Public spawners
// ---------------------------------------------------------------------------

/// Infinite floor at y = 0.
pub fn spawn_ground(world: &mut World) -> Entity {
    world.spawn((
        LocalTransform::default(),
        GlobalTransform(Mat4::IDENTITY),
        Collider::Plane { normal: Vec3::Y, offset: 0.0 },
        Static,
    ))
}

pub fn spawn_static_box(world: &mut World, position: Vec3, half_extents: Vec3) -> Entity {
    world.spawn((
        LocalTransform::new(position),
        GlobalTransform(Mat4::from_translation(position)),
        Collider::Box { half_extents },
        Static,
    ))
}

/// Box-shaped seat the avatar can sit on. `yaw` is the facing of a seated
/// avatar.
pub fn spawn_chair(world: &mut World, position: Vec3, yaw: f32) -> Entity {
    let half_extents = Vec3::new(0.25, 0.25, 0.25);
    let center = position + Vec3::Y * half_extents.y;
    world.spawn((
        LocalTransform::new(center).with_rotation(Quat::from_rotation_y(yaw)),
        GlobalTransform(Mat4::from_translation(center)),
        Collider::Box { half_extents },
        Static,
        Interactable {
            // Seated capsule center sits above the seat surface.
            seat_offset: Vec3::Y * 0.75,
            seat_yaw: yaw,
        },
    ))
}

/// The locally controlled avatar: a physics capsule carrying the humanoid.
/// `position` is the capsule center.
pub fn spawn_avatar(world: &mut World, position: Vec3) -> Entity {
    let rig = default_rig();
    let body = world.spawn((
        LocalTransform::new(position),
        GlobalTransform(Mat4::IDENTITY),
        Velocity::default(),
        Mass(1.0),
        GravityAffected,
        Collider::Capsule {
            radius: rig.body_collider_radius,
            height: rig.body_collider_height,
        },
    ));
    spawn_avatar_model(world, body, &rig);
    body
}

/// A remote avatar. No physics: the network layer drives its pose.
pub fn spawn_remote_avatar(world: &mut World, position: Vec3) -> Entity {
    let rig = default_rig();
    let root = world.spawn((LocalTransform::new(position), GlobalTransform(Mat4::IDENTITY)));
    spawn_avatar_model(world, root, &rig);
    root
}
