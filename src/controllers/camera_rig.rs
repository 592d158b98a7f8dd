use glam::Vec3;
use hecs::{Entity, World};
use tracing::debug;

use crate::camera::CameraRig;
use crate::components::LocalTransform;
use crate::config::CameraSettings;
use crate::engine::lifecycle::ScriptComponent;

use super::FrameContext;

/// Keeps the orbit camera on the controlled avatar and publishes the view the
/// avatar steers by.
pub struct CameraRigController {
    rig: CameraRig,
    target: Entity,
}

impl CameraRigController {
    pub fn new(target: Entity, settings: &CameraSettings) -> Self {
        Self {
            rig: CameraRig::new(settings),
            target,
        }
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn rig_mut(&mut self) -> &mut CameraRig {
        &mut self.rig
    }

    fn target_position(&self, world: &World) -> Option<Vec3> {
        world.get::<&LocalTransform>(self.target).map(|t| t.position).ok()
    }
}

impl<'a> ScriptComponent<FrameContext<'a>> for CameraRigController {
    fn name(&self) -> &str {
        "CameraRigController"
    }

    fn on_initialize(&mut self, ctx: &mut FrameContext<'a>) {
        if let Some(position) = self.target_position(ctx.world) {
            self.rig.reset_follow(position);
        }
        ctx.shared.camera_mode.set(self.rig.mode());
        ctx.shared.camera_view = self.rig.view();
    }

    fn on_update(&mut self, ctx: &mut FrameContext<'a>, dt: f32) {
        self.rig.set_collision_checking(*ctx.shared.collision_checking.get());
        self.rig.set_elastic(*ctx.shared.elastic_camera.get());

        // Someone else (a key, the UI) asked for a mode.
        let requested = *ctx.shared.camera_mode.get();
        if requested != self.rig.mode() {
            debug!(mode = ?requested, "camera mode requested");
            self.rig.set_mode(requested);
        }

        let intent = ctx.intent;
        self.rig.camera.rotate(intent.camera_yaw, intent.camera_pitch);
        self.rig
            .camera
            .add_inertial_rotation(intent.inertial_yaw, intent.inertial_pitch);
        self.rig.camera.apply_inertia();
        if intent.zoom != 0.0 {
            self.rig.zoom(intent.zoom);
        }
        if let Some(mode) = self.rig.update_mode() {
            ctx.shared.camera_mode.set(mode);
        }

        if let Some(position) = self.target_position(ctx.world) {
            self.rig.follow(position, dt);
        }
        self.rig.update_obstruction(ctx.world, dt);

        ctx.shared.camera_view = self.rig.view();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraMode;
    use crate::controllers::SharedState;
    use crate::engine::lifecycle::Script;
    use crate::input::{AvatarIntent, InputKind};
    use crate::systems::physics::EcsPhysics;

    struct Harness {
        world: World,
        physics: EcsPhysics,
        shared: SharedState,
        camera: Script<CameraRigController>,
    }

    impl Harness {
        fn new() -> Self {
            let mut world = World::new();
            let body = world.spawn((LocalTransform::new(Vec3::new(2.0, 0.9, -1.0)),));
            let settings = CameraSettings::default();
            Self {
                world,
                physics: EcsPhysics::new(),
                shared: SharedState::new(&settings, InputKind::Keyboard),
                camera: Script::new(CameraRigController::new(body, &settings)),
            }
        }

        fn frame(&mut self, intent: &AvatarIntent) {
            let mut ctx = FrameContext {
                world: &mut self.world,
                physics: &mut self.physics,
                intent,
                shared: &mut self.shared,
            };
            self.camera.update(&mut ctx, 0.016);
            self.shared.update();
        }
    }

    #[test]
    fn follows_target_and_publishes_view() {
        let mut h = Harness::new();
        let intent = AvatarIntent { camera_yaw: 0.3, ..Default::default() };
        h.frame(&intent);

        let camera = &h.camera.rig().camera;
        assert_eq!(camera.target.x, 2.0);
        assert_eq!(camera.target.z, -1.0);
        assert!((h.shared.camera_view.yaw - camera.yaw()).abs() < 1e-6);
        assert!(h.shared.camera_view.yaw > 0.0);
        assert!(!h.shared.camera_view.first_person);
    }

    #[test]
    fn zooming_in_switches_to_first_person() {
        let mut h = Harness::new();
        let intent = AvatarIntent { zoom: -3.2, ..Default::default() };
        h.frame(&intent);
        assert_eq!(h.camera.rig().mode(), CameraMode::FirstPerson);
        assert_eq!(*h.shared.camera_mode.get(), CameraMode::FirstPerson);
        assert!(h.shared.camera_view.first_person);
    }

    #[test]
    fn external_mode_request_moves_radius() {
        let mut h = Harness::new();
        h.frame(&AvatarIntent::default());
        h.shared.camera_mode.set(CameraMode::FirstPerson);
        h.frame(&AvatarIntent::default());
        let settings = CameraSettings::default();
        assert_eq!(h.camera.rig().camera.radius, settings.first_person_radius);
        assert!(h.camera.rig().is_first_person());
    }
}
