use glam::Vec3;
use hecs::{Entity, World};

use crate::components::{Collider, GlobalTransform, Static};

#[derive(Debug, Clone, Copy)]
pub struct RaycastHit {
    pub entity: Entity,
    pub distance: f32,
    pub point: Vec3,
    /// Surface normal at `point`, facing back toward the ray origin.
    pub normal: Vec3,
}

/// Cast a ray against all Static geometry and return the nearest hit within
/// `max_distance`.
///
/// Infinite planes are floors; camera probes skip them (`include_planes =
/// false`) while ground probes need them.
pub fn raycast_static(
    world: &World,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    include_planes: bool,
) -> Option<RaycastHit> {
    let dir = direction.normalize_or_zero();
    if dir == Vec3::ZERO || max_distance <= 0.0 {
        return None;
    }
    let mut best: Option<RaycastHit> = None;

    for (entity, (_, collider, global)) in
        world.query::<(&Static, &Collider, &GlobalTransform)>().iter()
    {
        let center = global.translation();

        let hit = match collider {
            Collider::Sphere { radius } => ray_sphere_intersection(origin, dir, center, *radius)
                .map(|t| (t, sphere_normal(origin + dir * t, center))),
            Collider::Capsule { radius, height } => {
                ray_capsule_intersection(origin, dir, center, *radius, *height)
                    .map(|t| (t, capsule_normal(origin + dir * t, center, *height)))
            }
            Collider::Box { half_extents } => {
                ray_aabb_intersection(origin, dir, center, *half_extents)
                    .map(|t| (t, box_normal(origin + dir * t, center, *half_extents)))
            }
            Collider::Plane { normal, offset } if include_planes => {
                ray_plane_intersection(origin, dir, *normal, *offset).map(|t| (t, *normal))
            }
            Collider::Plane { .. } => None,
        };

        if let Some((t, normal)) = hit {
            if t > 0.0 && t <= max_distance && best.map_or(true, |b| t < b.distance) {
                let normal = if normal.dot(dir) > 0.0 { -normal } else { normal };
                best = Some(RaycastHit {
                    entity,
                    distance: t,
                    point: origin + dir * t,
                    normal,
                });
            }
        }
    }

    best
}

fn ray_sphere_intersection(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let a = dir.dot(dir);
    let b = 2.0 * oc.dot(dir);
    let c = oc.dot(oc) - radius * radius;
    let discriminant = b * b - 4.0 * a * c;

    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let t1 = (-b - sqrt_d) / (2.0 * a);
    let t2 = (-b + sqrt_d) / (2.0 * a);

    if t1 > 0.0 {
        Some(t1)
    } else if t2 > 0.0 {
        Some(t2)
    } else {
        None
    }
}

/// Hemisphere caps plus a center sphere. Coarse, but enough for probes.
fn ray_capsule_intersection(
    origin: Vec3,
    dir: Vec3,
    center: Vec3,
    radius: f32,
    height: f32,
) -> Option<f32> {
    let half_h = height * 0.5;
    [
        center + Vec3::Y * half_h,
        center - Vec3::Y * half_h,
        center,
    ]
    .iter()
    .filter_map(|c| ray_sphere_intersection(origin, dir, *c, radius))
    .reduce(f32::min)
}

fn ray_aabb_intersection(origin: Vec3, dir: Vec3, center: Vec3, half: Vec3) -> Option<f32> {
    let min = center - half;
    let max = center + half;
    let inv_dir = dir.recip();

    let t1 = (min - origin) * inv_dir;
    let t2 = (max - origin) * inv_dir;

    let tmin = t1.min(t2).max_element();
    let tmax = t1.max(t2).min_element();

    if tmax < 0.0 || tmin > tmax {
        return None;
    }
    // Origin inside the box: report the exit.
    Some(if tmin < 0.0 { tmax } else { tmin })
}

fn ray_plane_intersection(origin: Vec3, dir: Vec3, normal: Vec3, offset: f32) -> Option<f32> {
    let denom = normal.dot(dir);
    if denom.abs() < 1e-6 {
        return None;
    }
    let t = (offset - normal.dot(origin)) / denom;
    (t > 0.0).then_some(t)
}

fn sphere_normal(point: Vec3, center: Vec3) -> Vec3 {
    (point - center).normalize_or(Vec3::Y)
}

fn capsule_normal(point: Vec3, center: Vec3, height: f32) -> Vec3 {
    let half_h = height * 0.5;
    let y = (point.y - center.y).clamp(-half_h, half_h);
    (point - Vec3::new(center.x, center.y + y, center.z)).normalize_or(Vec3::Y)
}

fn box_normal(point: Vec3, center: Vec3, half: Vec3) -> Vec3 {
    let local = (point - center) / half.max(Vec3::splat(1e-6));
    let abs = local.abs();
    if abs.x >= abs.y && abs.x >= abs.z {
        Vec3::X * local.x.signum()
    } else if abs.y >= abs.z {
        Vec3::Y * local.y.signum()
    } else {
        Vec3::Z * local.z.signum()
    }
}
