use glam::Vec3;

/// Linear velocity in world space.
#[derive(Debug, Clone, Copy, Default)]
pub struct Velocity(pub Vec3);

/// Entity mass in kilograms. Impulses divide by it.
#[derive(Debug, Clone, Copy)]
pub struct Mass(pub f32);

/// Marker: entity is affected by gravity. Removed while flying.
pub struct GravityAffected;

/// Collision shape attached to an entity, centered on its world position.
#[derive(Debug, Clone, Copy)]
pub enum Collider {
    Sphere { radius: f32 },
    /// Vertical capsule; `height` is the distance between hemisphere centers.
    Capsule { radius: f32, height: f32 },
    Box { half_extents: Vec3 },
    /// Infinite plane `dot(p, normal) == offset`.
    Plane { normal: Vec3, offset: f32 },
}

impl Collider {
    /// Distance from the center to the lowest point of the shape.
    pub fn half_height(&self) -> f32 {
        match self {
            Self::Sphere { radius } => *radius,
            Self::Capsule { radius, height } => height * 0.5 + radius,
            Self::Box { half_extents } => half_extents.y,
            Self::Plane { .. } => 0.0,
        }
    }

    /// Horizontal extent used for sweep tests.
    pub fn radius(&self) -> f32 {
        match self {
            Self::Sphere { radius } | Self::Capsule { radius, .. } => *radius,
            Self::Box { half_extents } => half_extents.x.max(half_extents.z),
            Self::Plane { .. } => 0.0,
        }
    }
}

/// Marker: entity is immovable world geometry.
pub struct Static;
