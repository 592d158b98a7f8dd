use glam::{Mat4, Quat};
use hecs::{Entity, World};

use crate::components::{Children, GlobalTransform, LocalTransform, Parent};

/// Propagates LocalTransform down the hierarchy.
///
/// Roots (LocalTransform, no Parent) take their own matrix; children inherit
/// `parent_global * local`. Entities without a GlobalTransform are skipped as
/// targets but still pass their matrix on to their children.
pub fn transform_propagation_system(world: &mut World) {
    let roots: Vec<(Entity, Mat4)> = world
        .query::<&LocalTransform>()
        .without::<&Parent>()
        .iter()
        .map(|(entity, local)| (entity, local.matrix()))
        .collect();

    let mut stack: Vec<(Entity, Mat4)> = roots;

    while let Some((entity, global)) = stack.pop() {
        if let Ok(mut gt) = world.get::<&mut GlobalTransform>(entity) {
            gt.0 = global;
        }

        if let Ok(children) = world.get::<&Children>(entity) {
            for &child in &children.0 {
                let child_global = match world.get::<&LocalTransform>(child) {
                    Ok(local) => global * local.matrix(),
                    Err(_) => global,
                };
                stack.push((child, child_global));
            }
        }
    }
}

/// World-space rotation of `entity`, composed from LocalTransforms up the
/// Parent chain. Independent of whether propagation ran this frame.
pub fn world_rotation(world: &World, entity: Entity) -> Quat {
    let mut rotation = Quat::IDENTITY;
    let mut current = Some(entity);
    while let Some(e) = current {
        if let Ok(local) = world.get::<&LocalTransform>(e) {
            rotation = local.rotation * rotation;
        }
        current = world.get::<&Parent>(e).ok().map(|p| p.0);
    }
    rotation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::add_child;
    use glam::Vec3;

    #[test]
    fn children_inherit_parent_matrix() {
        let mut world = World::new();
        let root = world.spawn((
            LocalTransform::new(Vec3::new(1.0, 0.0, 0.0)),
            GlobalTransform::default(),
        ));
        let child = world.spawn((
            LocalTransform::new(Vec3::new(0.0, 2.0, 0.0)),
            GlobalTransform::default(),
        ));
        let grandchild = world.spawn((
            LocalTransform::new(Vec3::new(0.0, 0.0, 3.0)),
            GlobalTransform::default(),
        ));
        add_child(&mut world, root, child);
        add_child(&mut world, child, grandchild);

        transform_propagation_system(&mut world);

        let gt = world.get::<&GlobalTransform>(grandchild).unwrap();
        assert!(gt.translation().abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6));
    }

    #[test]
    fn world_rotation_composes_parent_first() {
        let mut world = World::new();
        let a = Quat::from_rotation_y(0.5);
        let b = Quat::from_rotation_x(0.25);
        let root = world.spawn((LocalTransform::default().with_rotation(a),));
        let child = world.spawn((LocalTransform::default().with_rotation(b),));
        add_child(&mut world, root, child);
        assert!(world_rotation(&world, child).abs_diff_eq(a * b, 1e-6));
    }
}
