use glam::Vec3;
use hecs::{Entity, World};

use crate::components::{GlobalTransform, Interactable};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SitTarget {
    pub entity: Entity,
    /// Where the avatar root goes.
    pub seat: Vec3,
    pub yaw: f32,
    pub distance: f32,
}

/// Nearest interactable object within `radius` of `position`.
pub fn find_sit_target(world: &World, position: Vec3, radius: f32) -> Option<SitTarget> {
    world
        .query::<(&Interactable, &GlobalTransform)>()
        .iter()
        .map(|(entity, (interactable, global))| {
            let at = global.translation();
            SitTarget {
                entity,
                seat: at + interactable.seat_offset,
                yaw: interactable.seat_yaw,
                distance: at.distance(position),
            }
        })
        .filter(|t| t.distance <= radius)
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    fn chair(world: &mut World, at: Vec3) -> Entity {
        world.spawn((
            Interactable { seat_offset: Vec3::Y * 0.5, seat_yaw: 1.0 },
            GlobalTransform(Mat4::from_translation(at)),
        ))
    }

    #[test]
    fn picks_nearest_in_radius() {
        let mut world = World::new();
        chair(&mut world, Vec3::new(1.5, 0.0, 0.0));
        let near = chair(&mut world, Vec3::new(0.0, 0.0, 1.0));
        chair(&mut world, Vec3::new(10.0, 0.0, 0.0));

        let target = find_sit_target(&world, Vec3::ZERO, 2.0).unwrap();
        assert_eq!(target.entity, near);
        assert_eq!(target.seat, Vec3::new(0.0, 0.5, 1.0));
    }

    #[test]
    fn nothing_in_radius() {
        let mut world = World::new();
        chair(&mut world, Vec3::new(5.0, 0.0, 0.0));
        assert!(find_sit_target(&world, Vec3::ZERO, 2.0).is_none());
    }
}
