use glam::{Mat4, Vec3};
use hecs::World;
use tracing::debug;

use crate::config::CameraSettings;
use crate::smoothing::Hysteresis;
use crate::systems::avatar::CameraView;
use crate::systems::raycast::raycast_static;

/// Orbit camera around a target point.
///
/// `alpha` is the angle around +Y, `beta` the polar angle from +Y. With
/// `alpha = -PI/2` the camera sits on the target's -Z side looking along +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub alpha: f32,
    pub beta: f32,
    pub radius: f32,
    pub target: Vec3,
    pub inertial_alpha_offset: f32,
    pub inertial_beta_offset: f32,
    /// Fraction of inertial rotation kept per tick.
    pub inertia: f32,
    pub min_beta: f32,
    pub max_beta: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    pub fov: f32,
}

impl OrbitCamera {
    pub fn new(settings: &CameraSettings) -> Self {
        Self {
            alpha: settings.default_alpha,
            beta: settings.default_beta,
            radius: settings.default_radius,
            target: Vec3::ZERO,
            inertial_alpha_offset: 0.0,
            inertial_beta_offset: 0.0,
            inertia: settings.inertia,
            min_beta: settings.min_beta,
            max_beta: settings.max_beta,
            min_radius: settings.min_radius,
            max_radius: settings.max_radius,
            fov: 45.0,
        }
    }

    /// Unit vector from the target toward the camera.
    pub fn offset_dir(&self) -> Vec3 {
        let (sa, ca) = self.alpha.sin_cos();
        let (sb, cb) = self.beta.sin_cos();
        Vec3::new(ca * sb, cb, sa * sb)
    }

    pub fn position(&self) -> Vec3 {
        self.target + self.offset_dir() * self.radius
    }

    /// Unit vector from the camera toward the target.
    pub fn direction(&self) -> Vec3 {
        -self.offset_dir()
    }

    /// Heading of the view direction around +Y. Zero looks along +Z.
    pub fn yaw(&self) -> f32 {
        let d = self.direction();
        d.x.atan2(d.z)
    }

    /// Turn the view by `yaw` radians (positive turns right) and tilt by
    /// `pitch` (positive raises the camera, looking further down).
    pub fn rotate(&mut self, yaw: f32, pitch: f32) {
        self.alpha -= yaw;
        self.beta = (self.beta - pitch).clamp(self.min_beta, self.max_beta);
    }

    /// Queue rotation that decays by `inertia` every tick.
    pub fn add_inertial_rotation(&mut self, yaw: f32, pitch: f32) {
        self.inertial_alpha_offset -= yaw;
        self.inertial_beta_offset -= pitch;
    }

    pub fn apply_inertia(&mut self) {
        if self.inertial_alpha_offset.abs() < 1e-5 && self.inertial_beta_offset.abs() < 1e-5 {
            self.inertial_alpha_offset = 0.0;
            self.inertial_beta_offset = 0.0;
            return;
        }
        self.alpha += self.inertial_alpha_offset;
        self.beta = (self.beta + self.inertial_beta_offset).clamp(self.min_beta, self.max_beta);
        self.inertial_alpha_offset *= self.inertia;
        self.inertial_beta_offset *= self.inertia;
    }

    pub fn zoom(&mut self, delta: f32) {
        self.radius = (self.radius + delta).clamp(self.min_radius, self.max_radius);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_lh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_lh(self.fov.to_radians(), aspect, 0.05, 500.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraMode {
    FirstPerson,
    ThirdPerson,
}

/// Obstruction probe state, throttled to one probe per interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraObstacleDetectInfo {
    /// Target-to-camera direction of the last probe that hit.
    pub direction: Vec3,
    pub length: f32,
    /// The camera is pulled in front of an obstruction.
    pub snapping: bool,
    pub elapsed: f32,
}

/// Follows the avatar with an orbit camera: mode switching, follow height and
/// obstruction avoidance.
#[derive(Debug, Clone)]
pub struct CameraRig {
    pub camera: OrbitCamera,
    settings: CameraSettings,
    mode: CameraMode,
    follow_y: Hysteresis<f32>,
    obstacle: CameraObstacleDetectInfo,
    /// Radius the user chose, saved when an obstruction pulled the camera in.
    saved_radius: Option<f32>,
}

impl CameraRig {
    pub fn new(settings: &CameraSettings) -> Self {
        let camera = OrbitCamera::new(settings);
        let mut rig = Self {
            camera,
            settings: settings.clone(),
            mode: CameraMode::ThirdPerson,
            follow_y: Hysteresis::new(0.0, settings.follow_smoothing),
            obstacle: CameraObstacleDetectInfo::default(),
            saved_radius: None,
        };
        rig.mode = rig.mode_for_radius(rig.user_radius());
        rig
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn is_first_person(&self) -> bool {
        self.mode == CameraMode::FirstPerson
    }

    pub fn obstacle(&self) -> &CameraObstacleDetectInfo {
        &self.obstacle
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn set_collision_checking(&mut self, enabled: bool) {
        self.settings.collision_checking = enabled;
    }

    pub fn set_elastic(&mut self, enabled: bool) {
        self.settings.elastic_camera = enabled;
        if !enabled {
            self.restore();
        }
    }

    /// Radius ignoring any obstruction pull-in.
    pub fn user_radius(&self) -> f32 {
        self.saved_radius.unwrap_or(self.camera.radius)
    }

    /// Mode implied by `radius` given the current mode. The threshold to leave
    /// first person is larger than the one to enter it.
    pub fn mode_for_radius(&self, radius: f32) -> CameraMode {
        match self.mode {
            CameraMode::ThirdPerson if radius <= self.settings.first_person_enter_radius => {
                CameraMode::FirstPerson
            }
            CameraMode::FirstPerson if radius > self.settings.first_person_exit_radius => {
                CameraMode::ThirdPerson
            }
            mode => mode,
        }
    }

    /// Re-derive the mode from the radius. Returns the new mode on a change.
    pub fn update_mode(&mut self) -> Option<CameraMode> {
        let mode = self.mode_for_radius(self.user_radius());
        if mode == self.mode {
            return None;
        }
        debug!(?mode, radius = self.user_radius(), "camera mode");
        self.mode = mode;
        Some(mode)
    }

    /// Jump straight into `mode`, moving the radius to match.
    pub fn set_mode(&mut self, mode: CameraMode) {
        self.restore();
        self.camera.radius = match mode {
            CameraMode::FirstPerson => self.settings.first_person_radius,
            CameraMode::ThirdPerson => self.settings.default_radius,
        };
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) -> CameraMode {
        let next = match self.mode {
            CameraMode::FirstPerson => CameraMode::ThirdPerson,
            CameraMode::ThirdPerson => CameraMode::FirstPerson,
        };
        self.set_mode(next);
        next
    }

    /// Zoom the user radius. While pulled in, the saved radius takes the change.
    pub fn zoom(&mut self, delta: f32) {
        match self.saved_radius.as_mut() {
            Some(saved) => {
                *saved = (*saved + delta).clamp(self.settings.min_radius, self.settings.max_radius)
            }
            None => self.camera.zoom(delta),
        }
    }

    /// Snap the follow height, e.g. after a teleport.
    pub fn reset_follow(&mut self, avatar_position: Vec3) {
        self.follow_y.reset(avatar_position.y + self.settings.follow_height);
        self.camera.target = avatar_position + Vec3::Y * self.settings.follow_height;
    }

    /// Move the orbit target to the avatar. Height is smoothed unless the
    /// camera is set to bob with the avatar.
    pub fn follow(&mut self, avatar_position: Vec3, dt: f32) {
        let raw = avatar_position.y + self.settings.follow_height;
        let y = if self.settings.camera_bobbing {
            self.follow_y.reset(raw);
            raw
        } else {
            self.follow_y.update(raw, dt)
        };
        self.camera.target = Vec3::new(avatar_position.x, y, avatar_position.z);
    }

    /// Throttled obstruction probe from the target toward the camera.
    pub fn update_obstruction(&mut self, world: &World, dt: f32) {
        if !self.settings.elastic_camera || self.is_first_person() {
            self.restore();
            return;
        }
        self.obstacle.elapsed += dt;
        if self.obstacle.elapsed < self.settings.obstacle_probe_interval {
            return;
        }
        self.obstacle.elapsed = 0.0;

        if let Some(user_radius) = self.saved_radius {
            // Re-probe where the camera wants to be.
            let clear = raycast_static(
                world,
                self.camera.target,
                self.obstacle.direction,
                self.obstacle.length.max(user_radius),
                false,
            )
            .is_none();
            if clear {
                self.restore();
                return;
            }
        }

        let direction = self.camera.offset_dir();
        let length = self.user_radius();
        let Some(hit) = raycast_static(world, self.camera.target, direction, length, false) else {
            return;
        };

        if self.saved_radius.is_none() {
            self.saved_radius = Some(self.camera.radius);
            debug!(distance = hit.distance, "camera obstructed");
        }
        self.obstacle.direction = direction;
        self.obstacle.length = length;
        self.obstacle.snapping = true;

        let radius = if self.settings.collision_checking {
            let placed = hit.point + hit.normal * self.settings.hit_normal_offset;
            (placed - self.camera.target).length()
        } else {
            hit.distance
        };
        self.camera.radius = radius.clamp(self.settings.min_radius, length);
    }

    fn restore(&mut self) {
        if let Some(radius) = self.saved_radius.take() {
            self.camera.radius = radius;
            debug!(radius, "camera unobstructed");
        }
        self.obstacle.snapping = false;
    }

    /// Camera facts the locomotion state machine consumes.
    pub fn view(&self) -> CameraView {
        CameraView {
            yaw: self.camera.yaw(),
            pitch: self.settings.default_beta - self.camera.beta,
            first_person: self.is_first_person(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Collider, GlobalTransform, Static};
    use glam::Mat4;

    fn settings() -> CameraSettings {
        CameraSettings::default()
    }

    #[test]
    fn default_camera_sits_behind_and_looks_forward() {
        let camera = OrbitCamera::new(&settings());
        assert!(camera.yaw().abs() < 1e-6);
        assert!(camera.position().z < 0.0);
        assert!(camera.position().x.abs() < 1e-5);
    }

    #[test]
    fn positive_yaw_turns_right() {
        let mut camera = OrbitCamera::new(&settings());
        camera.rotate(0.3, 0.0);
        assert!((camera.yaw() - 0.3).abs() < 1e-5);
    }

    #[test]
    fn inertia_decays() {
        let mut camera = OrbitCamera::new(&settings());
        camera.add_inertial_rotation(0.1, 0.0);
        camera.apply_inertia();
        let first = camera.yaw();
        camera.apply_inertia();
        let second = camera.yaw() - first;
        assert!((first - 0.1).abs() < 1e-5);
        assert!((second - 0.1 * camera.inertia).abs() < 1e-5);
    }

    #[test]
    fn mode_switches_once_and_resists_oscillation() {
        let mut rig = CameraRig::new(&settings());
        assert_eq!(rig.mode(), CameraMode::ThirdPerson);

        let mut switches = 0;
        let mut radius = 2.0;
        while radius > 0.5 {
            radius -= 0.05;
            rig.camera.radius = radius;
            if rig.update_mode().is_some() {
                switches += 1;
            }
        }
        assert_eq!(switches, 1);
        assert_eq!(rig.mode(), CameraMode::FirstPerson);

        for i in 0..20 {
            let wobble = if i % 2 == 0 { 0.01 } else { -0.01 };
            rig.camera.radius = 0.6 + wobble;
            assert_eq!(rig.update_mode(), None);
        }
        assert_eq!(rig.mode(), CameraMode::FirstPerson);
    }

    #[test]
    fn toggle_moves_radius() {
        let mut rig = CameraRig::new(&settings());
        assert_eq!(rig.toggle_mode(), CameraMode::FirstPerson);
        assert_eq!(rig.camera.radius, 0.1);
        assert_eq!(rig.update_mode(), None);
        assert_eq!(rig.toggle_mode(), CameraMode::ThirdPerson);
        assert_eq!(rig.camera.radius, 3.5);
    }

    #[test]
    fn follow_height_is_smoothed_unless_bobbing() {
        let mut rig = CameraRig::new(&settings());
        rig.reset_follow(Vec3::ZERO);
        rig.follow(Vec3::new(0.0, 1.0, 0.0), 0.1);
        let y = rig.camera.target.y;
        assert!(y > 1.6 && y < 2.6);

        let mut s = settings();
        s.camera_bobbing = true;
        let mut rig = CameraRig::new(&s);
        rig.reset_follow(Vec3::ZERO);
        rig.follow(Vec3::new(0.0, 1.0, 0.0), 0.1);
        assert!((rig.camera.target.y - 2.6).abs() < 1e-6);
    }

    fn wall_behind(world: &mut World) {
        world.spawn((
            Static,
            Collider::Box { half_extents: Vec3::new(5.0, 5.0, 0.1) },
            GlobalTransform(Mat4::from_translation(Vec3::new(0.0, 0.0, -1.5))),
        ));
    }

    #[test]
    fn obstruction_pulls_in_and_restores() {
        let mut world = World::new();
        wall_behind(&mut world);
        let mut rig = CameraRig::new(&settings());
        rig.reset_follow(Vec3::ZERO);

        // Throttled: nothing before the interval.
        rig.update_obstruction(&world, 0.25);
        assert_eq!(rig.camera.radius, 3.5);
        rig.update_obstruction(&world, 0.25);
        assert!(rig.obstacle().snapping);
        assert!(rig.camera.radius < 3.5);
        assert_eq!(rig.user_radius(), 3.5);
        assert_eq!(rig.mode(), CameraMode::ThirdPerson);

        world.clear();
        rig.update_obstruction(&world, 0.5);
        assert!(!rig.obstacle().snapping);
        assert_eq!(rig.camera.radius, 3.5);
    }

    #[test]
    fn obstruction_without_collision_checking_uses_hit_distance() {
        let mut world = World::new();
        wall_behind(&mut world);
        let mut s = settings();
        s.collision_checking = false;
        let mut rig = CameraRig::new(&s);
        rig.reset_follow(Vec3::ZERO);
        rig.update_obstruction(&world, 0.5);

        let dir = rig.camera.offset_dir();
        // The ray leaves the target along dir and meets the wall face at z = -1.4.
        let expected = (-1.4 - rig.camera.target.z) / dir.z;
        assert!((rig.camera.radius - expected).abs() < 1e-4);
    }
}
