//! Conversions between engine space and wire space.
//!
//! The engine is left-handed, the wire is right-handed. Mirroring across the
//! YZ plane maps one onto the other:
//!
//! | quantity   | engine -> wire         |
//! |------------|------------------------|
//! | position   | `(-x, y, z)`           |
//! | rotation   | `(x, -y, -z, w)`       |
//! | scale      | unchanged              |
//!
//! Both maps are their own inverse. The rotation map is a conjugation, so it
//! preserves products and inverses: `to_wire(a * b) == to_wire(a) * to_wire(b)`.

use glam::{Quat, Vec3};

pub fn vec_to_wire(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.y, v.z)
}

pub fn vec_to_local(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.y, v.z)
}

pub fn quat_to_wire(q: Quat) -> Quat {
    Quat::from_xyzw(q.x, -q.y, -q.z, q.w)
}

pub fn quat_to_local(q: Quat) -> Quat {
    Quat::from_xyzw(q.x, -q.y, -q.z, q.w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rotations() -> Vec<Quat> {
        let mut out = Vec::new();
        for i in 0..8 {
            let t = i as f32 * 0.7;
            out.push(Quat::from_euler(glam::EulerRot::YXZ, t, t * 0.5 - 1.0, 1.3 - t * 0.3));
        }
        out.push(Quat::IDENTITY);
        out.push(Quat::from_rotation_z(std::f32::consts::PI));
        out
    }

    #[test]
    fn rotation_mapping_round_trips() {
        for q in sample_rotations() {
            assert!(quat_to_wire(quat_to_local(q)).abs_diff_eq(q, 1e-6));
            assert!(quat_to_local(quat_to_wire(q)).abs_diff_eq(q, 1e-6));
        }
    }

    #[test]
    fn sign_convention() {
        let q = Quat::from_xyzw(0.1, 0.2, 0.3, 0.927_361_8);
        let w = quat_to_wire(q);
        assert_eq!((w.x, w.y, w.z, w.w), (0.1, -0.2, -0.3, 0.927_361_8));
        assert_eq!(vec_to_wire(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(-1.0, 2.0, 3.0));
    }

    #[test]
    fn mapping_preserves_products_and_inverses() {
        let rots = sample_rotations();
        for pair in rots.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert!(quat_to_wire(a * b).abs_diff_eq(quat_to_wire(a) * quat_to_wire(b), 1e-5));
            assert!(quat_to_wire(a.inverse()).abs_diff_eq(quat_to_wire(a).inverse(), 1e-6));
        }
    }

    #[test]
    fn mirrored_rotation_matches_mirrored_vectors() {
        // Rotating then mirroring equals mirroring both the rotation and the vector.
        let q = Quat::from_rotation_y(0.8) * Quat::from_rotation_x(0.3);
        let v = Vec3::new(0.4, -1.2, 2.0);
        let lhs = vec_to_wire(q * v);
        let rhs = quat_to_wire(q) * vec_to_wire(v);
        assert!(lhs.abs_diff_eq(rhs, 1e-5));
    }
}
