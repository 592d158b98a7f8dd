use glam::Vec3;
use hecs::{Entity, World};

use crate::scene::prefabs::{
    spawn_avatar, spawn_chair, spawn_ground, spawn_remote_avatar, spawn_static_box,
};

/// Entities the app needs handles to.
#[derive(Debug, Clone)]
pub struct TestScene {
    pub avatar: Entity,
    pub chair: Entity,
    pub remotes: Vec<Entity>,
}

/// Floor, a few walls, one chair, the controlled avatar and `remote_count`
/// remote avatars lined up behind it.
pub fn load_test_scene(world: &mut World, remote_count: usize) -> TestScene {
    spawn_ground(world);

    for &(x, z, h) in &[(6.0_f32, -4.0_f32, 2.0_f32), (-5.0, 3.0, 3.5), (3.0, 7.0, 1.5)] {
        spawn_static_box(
            world,
            Vec3::new(x, h / 2.0, z),
            Vec3::new(2.5, h / 2.0, 3.5),
        );
    }

    let chair = spawn_chair(world, Vec3::new(1.5, 0.0, 2.0), std::f32::consts::PI);
    let avatar = spawn_avatar(world, Vec3::new(0.0, 0.9, 0.0));

    let remotes = (0..remote_count)
        .map(|i| spawn_remote_avatar(world, Vec3::new(i as f32 * 1.5 - 1.5, 0.0, -3.0)))
        .collect();

    TestScene { avatar, chair, remotes }
}
