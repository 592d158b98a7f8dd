use glam::{Vec2, Vec3};

use crate::config::InputSettings;
use crate::engine::input::InputState;

use super::{AvatarIntent, InputHandler, InputKind};

/// Two-stick virtual joystick.
///
/// The left stick is the movement vector as-is, no easing. The right stick
/// spins the camera through its inertia once it leaves the dead zone.
#[derive(Debug)]
pub struct JoystickInput {
    dead_zone: f32,
    camera_speed: f32,
    attached: bool,
}

impl JoystickInput {
    pub fn new(settings: &InputSettings) -> Self {
        Self {
            dead_zone: settings.joystick_dead_zone,
            camera_speed: settings.joystick_camera_speed,
            attached: false,
        }
    }

    fn outside_dead_zone(&self, stick: Vec2) -> bool {
        stick.x > self.dead_zone
            || stick.x < -self.dead_zone
            || stick.y > self.dead_zone
            || stick.y < -self.dead_zone
    }
}

impl InputHandler for JoystickInput {
    fn kind(&self) -> InputKind {
        InputKind::Joystick
    }

    fn attach_control(&mut self) {
        self.attached = true;
    }

    fn detach_control(&mut self) {
        self.attached = false;
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn handle_inputs(&mut self, input: &InputState, dt: f32, intent: &mut AvatarIntent) {
        if !self.attached {
            return;
        }

        let left = input.left_stick.clamp(Vec2::NEG_ONE, Vec2::ONE);
        intent.move_dir = Vec3::new(left.x, 0.0, left.y);
        intent.running = false;

        let right = input.right_stick;
        if self.outside_dead_zone(right) {
            intent.inertial_yaw += right.x * self.camera_speed * dt;
            // Stick up looks up.
            intent.inertial_pitch -= right.y * self.camera_speed * dt;
        }
    }
}
