use glam::Vec3;
use hecs::{Entity, World};

use crate::components::{Collider, GravityAffected, LocalTransform, Mass, Static, Velocity};

use super::raycast::{raycast_static, RaycastHit};

pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

/// Extra probe length below a body's lowest point that still counts as ground.
const GROUND_SKIN: f32 = 0.05;

/// What the avatar controllers need from the physics engine.
///
/// The controllers only ever talk to physics through this seam, so a test can
/// count impulses or a real engine can stand in for [`EcsPhysics`].
pub trait PhysicsBackend {
    fn linear_velocity(&self, world: &World, body: Entity) -> Vec3;

    fn apply_impulse(&mut self, world: &mut World, body: Entity, impulse: Vec3);

    /// Displace `body`, stopping short of static geometry along the way.
    fn move_with_collisions(&mut self, world: &mut World, body: Entity, displacement: Vec3);

    fn set_gravity_enabled(&mut self, world: &mut World, body: Entity, enabled: bool);

    /// Downward probe from the body's lowest point. `true` if anything static
    /// is within `max_distance`.
    fn ground_probe(&self, world: &World, body: Entity, max_distance: f32) -> bool;

    fn step(&mut self, world: &mut World, dt: f32);
}

/// Minimal rigid-body integration over the ECS components.
#[derive(Debug, Default)]
pub struct EcsPhysics;

impl EcsPhysics {
    pub fn new() -> Self {
        Self
    }
}

impl PhysicsBackend for EcsPhysics {
    fn linear_velocity(&self, world: &World, body: Entity) -> Vec3 {
        world
            .get::<&Velocity>(body)
            .map(|v| v.0)
            .unwrap_or(Vec3::ZERO)
    }

    fn apply_impulse(&mut self, world: &mut World, body: Entity, impulse: Vec3) {
        let mass = world.get::<&Mass>(body).map(|m| m.0).unwrap_or(1.0);
        if let Ok(mut vel) = world.get::<&mut Velocity>(body) {
            vel.0 += impulse / mass.max(1e-3);
        }
    }

    fn move_with_collisions(&mut self, world: &mut World, body: Entity, displacement: Vec3) {
        let length = displacement.length();
        if length <= 1e-6 {
            return;
        }
        let dir = displacement / length;
        let (origin, extent) = match (
            world.get::<&LocalTransform>(body),
            world.get::<&Collider>(body),
        ) {
            (Ok(local), Ok(collider)) => {
                let extent = if dir.y.abs() > 0.7 {
                    collider.half_height()
                } else {
                    collider.radius()
                };
                (local.position, extent)
            }
            (Ok(local), Err(_)) => (local.position, 0.0),
            _ => return,
        };

        let allowed = match raycast_static(world, origin, dir, length + extent, true) {
            Some(hit) => (hit.distance - extent).clamp(0.0, length),
            None => length,
        };

        if let Ok(mut local) = world.get::<&mut LocalTransform>(body) {
            local.position += dir * allowed;
        }
    }

    fn set_gravity_enabled(&mut self, world: &mut World, body: Entity, enabled: bool) {
        if enabled {
            let _ = world.insert_one(body, GravityAffected);
        } else {
            let _ = world.remove_one::<GravityAffected>(body);
            if let Ok(mut vel) = world.get::<&mut Velocity>(body) {
                vel.0.y = 0.0;
            }
        }
    }

    fn ground_probe(&self, world: &World, body: Entity, max_distance: f32) -> bool {
        ground_hit(world, body, max_distance).is_some()
    }

    fn step(&mut self, world: &mut World, dt: f32) {
        physics_step(world, dt);
    }
}

fn ground_hit(world: &World, body: Entity, max_distance: f32) -> Option<RaycastHit> {
    let position = world.get::<&LocalTransform>(body).ok()?.position;
    let half_height = world
        .get::<&Collider>(body)
        .map(|c| c.half_height())
        .unwrap_or(0.0);
    raycast_static(world, position, -Vec3::Y, half_height + max_distance, true)
        .filter(|hit| hit.distance <= half_height + max_distance)
}

/// Integrate velocities of dynamic bodies and resolve them against the ground.
pub fn physics_step(world: &mut World, dt: f32) {
    if dt <= 0.0 {
        return;
    }

    let bodies: Vec<Entity> = world
        .query_mut::<(&mut LocalTransform, &mut Velocity, Option<&GravityAffected>)>()
        .without::<&Static>()
        .into_iter()
        .map(|(entity, (local, vel, gravity))| {
            if gravity.is_some() {
                vel.0 += GRAVITY * dt;
            }
            // Semi-implicit Euler: velocity first, then position.
            local.position += vel.0 * dt;
            entity
        })
        .collect();

    for entity in bodies {
        let Ok(half_height) = world.get::<&Collider>(entity).map(|c| c.half_height()) else {
            continue;
        };
        let Some(hit) = ground_hit(world, entity, GROUND_SKIN) else {
            continue;
        };
        let penetration = half_height - hit.distance;
        if let Ok(mut local) = world.get::<&mut LocalTransform>(entity) {
            if penetration > 0.0 {
                local.position.y += penetration;
            }
        }
        if let Ok(mut vel) = world.get::<&mut Velocity>(entity) {
            if vel.0.y < 0.0 {
                vel.0.y = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::GlobalTransform;

    fn world_with_floor() -> World {
        let mut world = World::new();
        world.spawn((
            Static,
            Collider::Plane { normal: Vec3::Y, offset: 0.0 },
            GlobalTransform::default(),
        ));
        world
    }

    fn spawn_body(world: &mut World, at: Vec3) -> Entity {
        world.spawn((
            LocalTransform::new(at),
            Velocity::default(),
            GravityAffected,
            Collider::Capsule { radius: 0.3, height: 1.2 },
        ))
    }

    #[test]
    fn body_falls_and_rests_on_floor() {
        let mut world = world_with_floor();
        let body = spawn_body(&mut world, Vec3::new(0.0, 3.0, 0.0));
        for _ in 0..240 {
            physics_step(&mut world, 1.0 / 60.0);
        }
        let y = world.get::<&LocalTransform>(body).unwrap().position.y;
        assert!((y - 0.9).abs() < 0.05, "rest height {y}");
        assert!(EcsPhysics::new().ground_probe(&world, body, GROUND_SKIN));
    }

    #[test]
    fn impulse_scales_with_mass() {
        let mut world = World::new();
        let body = spawn_body(&mut world, Vec3::ZERO);
        world.insert_one(body, Mass(2.0)).unwrap();
        let mut physics = EcsPhysics::new();
        physics.apply_impulse(&mut world, body, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(physics.linear_velocity(&world, body), Vec3::new(0.0, 2.5, 0.0));
    }

    #[test]
    fn collision_move_stops_at_floor() {
        let mut world = world_with_floor();
        let body = spawn_body(&mut world, Vec3::new(0.0, 1.5, 0.0));
        let mut physics = EcsPhysics::new();
        physics.move_with_collisions(&mut world, body, Vec3::new(0.0, -5.0, 0.0));
        let y = world.get::<&LocalTransform>(body).unwrap().position.y;
        assert!((y - 0.9).abs() < 1e-4);
    }

    #[test]
    fn disabling_gravity_removes_marker() {
        let mut world = World::new();
        let body = spawn_body(&mut world, Vec3::ZERO);
        let mut physics = EcsPhysics::new();
        physics.set_gravity_enabled(&mut world, body, false);
        assert!(world.get::<&GravityAffected>(body).is_err());
        physics.set_gravity_enabled(&mut world, body, true);
        assert!(world.get::<&GravityAffected>(body).is_ok());
    }
}
