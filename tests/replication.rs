//! Controlled avatar -> network link -> remote avatar, through the full app.

use std::collections::HashMap;

use avatar_rig::app::AvatarApp;
use avatar_rig::components::LocalTransform;
use avatar_rig::config::Settings;
use avatar_rig::engine::input::InputState;
use avatar_rig::input::InputKind;
use avatar_rig::systems::skeleton::build_skeleton;
use avatar_rig::wire::pose_mapper::{quat_to_local, vec_to_local};
use avatar_rig::wire::{AvatarLink, AvatarUpdate};
use glam::{Quat, Vec3};
use hecs::{Entity, World};
use sdl2::keyboard::Scancode;

const DT: f32 = 1.0 / 60.0;

fn bones_by_name(world: &World, root: Entity) -> HashMap<String, Entity> {
    let (joints, nodes) = build_skeleton(world, root).unwrap();
    joints
        .into_iter()
        .map(|j| j.joint_name)
        .zip(nodes)
        .collect()
}

/// Forward what the controlled avatar published, the way a network layer would.
fn relay(app: &AvatarApp, link: &AvatarLink, send_skeleton: bool) {
    let snapshot = app.avatar().data().snapshot();
    if send_skeleton {
        assert!(link.send(AvatarUpdate::Skeleton(snapshot.skeleton)));
    }
    link.send(AvatarUpdate::Position(snapshot.position));
    link.send(AvatarUpdate::Orientation(snapshot.orientation));
    link.send(AvatarUpdate::JointTranslations(snapshot.joint_translations));
    link.send(AvatarUpdate::JointRotations(snapshot.joint_rotations));
}

#[test]
fn remote_mirrors_the_controlled_avatar() {
    let mut app = AvatarApp::new(&Settings::default(), InputKind::Keyboard, 1).unwrap();
    let link = app.remote_link(0).unwrap();
    let body = app.avatar().body();
    let remote_root = app.remotes()[0].root();

    let local_bones = bones_by_name(app.world(), body);
    let remote_bones = bones_by_name(app.world(), remote_root);

    // Pose a few bones away from rest.
    let posed = [
        ("LeftArm", Quat::from_rotation_x(-1.1)),
        ("LeftForeArm", Quat::from_rotation_z(0.4)),
        ("Spine", Quat::from_rotation_y(0.25)),
    ];
    for (name, rotation) in posed {
        let entity = local_bones[name];
        app.world_mut().get::<&mut LocalTransform>(entity).unwrap().rotation = rotation;
    }

    let mut input = InputState::new();
    input.press(Scancode::W);
    for i in 0..30 {
        app.frame(&input, DT);
        input.begin_frame();
        relay(&app, &link, i == 0);
    }

    // Published before this frame's physics step, so read it off the data.
    let expected_position = vec_to_local(app.avatar().data().position());
    let expected_orientation = quat_to_local(app.avatar().data().orientation());
    let expected: Vec<(String, Quat)> = local_bones
        .iter()
        .map(|(name, &e)| (name.clone(), app.world().get::<&LocalTransform>(e).unwrap().rotation))
        .collect();

    app.frame(&input, DT);

    let remote = *app.world().get::<&LocalTransform>(remote_root).unwrap();
    assert!(remote.position.abs_diff_eq(expected_position, 1e-5));
    assert!(remote.rotation.abs_diff_eq(expected_orientation, 1e-5));
    assert!(expected_position.z > 0.1);
    for (name, rotation) in expected {
        let got = app.world().get::<&LocalTransform>(remote_bones[&name]).unwrap().rotation;
        assert!(got.abs_diff_eq(rotation, 1e-4), "{name}: {got:?} vs {rotation:?}");
    }
}

#[test]
fn remote_keeps_its_spawn_point_until_data_arrives() {
    let mut app = AvatarApp::new(&Settings::default(), InputKind::Keyboard, 0).unwrap();
    let (root, _link) = app.add_remote(Vec3::new(4.0, 0.0, -1.0));
    app.frame(&InputState::new(), DT);
    let position = app.world().get::<&LocalTransform>(root).unwrap().position;
    assert!(position.abs_diff_eq(Vec3::new(4.0, 0.0, -1.0), 1e-6));
}

#[test]
fn remote_without_data_holds_rest_pose() {
    let mut app = AvatarApp::new(&Settings::default(), InputKind::Keyboard, 1).unwrap();
    let remote_root = app.remotes()[0].root();
    let bones = bones_by_name(app.world(), remote_root);
    let arm = bones["LeftArm"];
    let rest = *app.world().get::<&LocalTransform>(arm).unwrap();

    let input = InputState::new();
    for _ in 0..5 {
        app.frame(&input, DT);
    }
    let now = *app.world().get::<&LocalTransform>(arm).unwrap();
    assert!(now.rotation.abs_diff_eq(rest.rotation, 1e-5));
    assert!(now.position.abs_diff_eq(rest.position, 1e-5));
}

#[test]
fn added_remote_gets_its_own_link() {
    let mut app = AvatarApp::new(&Settings::default(), InputKind::Keyboard, 0).unwrap();
    let (root, link) = app.add_remote(Vec3::new(4.0, 0.0, 0.0));
    link.send(AvatarUpdate::Position(Vec3::new(-2.0, 0.0, 1.0)));
    app.frame(&InputState::new(), DT);

    // Wire x is mirrored.
    let position = app.world().get::<&LocalTransform>(root).unwrap().position;
    assert!(position.abs_diff_eq(Vec3::new(2.0, 0.0, 1.0), 1e-6));
    assert_eq!(app.remotes().len(), 1);
}
