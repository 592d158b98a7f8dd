use glam::Vec3;
use sdl2::keyboard::Scancode;
use std::collections::HashSet;

use crate::config::{bound, InputSettings, KeyBinding, Keymap};
use crate::engine::input::{InputEvent, InputState};
use crate::error::ConfigError;

use super::{AvatarIntent, InputHandler, InputKind, IntentAction};

/// Mouse pixels to radians.
const MOUSE_SENSITIVITY: f32 = 0.004;
/// Scroll notches to radius change.
const ZOOM_STEP: f32 = -0.5;
/// Axis values closer than this to their target snap onto it.
const AXIS_SNAP: f32 = 0.01;

/// Desktop keyboard and mouse.
///
/// Movement axes ease toward their target by a fixed per-tick lerp, so a tap
/// starts slow and a release coasts to a stop.
#[derive(Debug)]
pub struct KeyboardInput {
    keymap: Keymap,
    /// Keys pressed since attach, tracked from edges.
    down: HashSet<Scancode>,
    axis: Vec3,
    axis_smoothing: f32,
    camera_speed: f32,
    attached: bool,
}

impl KeyboardInput {
    pub fn new(settings: &InputSettings) -> Result<Self, ConfigError> {
        Ok(Self {
            keymap: settings.bindings.resolve()?,
            down: HashSet::new(),
            axis: Vec3::ZERO,
            axis_smoothing: settings.axis_smoothing,
            camera_speed: settings.key_camera_speed,
            attached: false,
        })
    }

    pub fn axis(&self) -> Vec3 {
        self.axis
    }

    fn held(&self, bindings: &[KeyBinding]) -> bool {
        self.down.iter().any(|&sc| bound(bindings, sc))
    }

    fn key_axis(&self, negative: &[KeyBinding], positive: &[KeyBinding]) -> f32 {
        let mut value = 0.0;
        if self.held(positive) {
            value += 1.0;
        }
        if self.held(negative) {
            value -= 1.0;
        }
        value
    }

    fn on_key_down(&self, sc: Scancode, intent: &mut AvatarIntent) {
        let k = &self.keymap;
        if bound(&k.jump, sc) {
            intent.actions.push(IntentAction::Jump);
        }
        if bound(&k.fly, sc) {
            intent.actions.push(IntentAction::ToggleFly);
        }
        if bound(&k.sit, sc) {
            intent.actions.push(IntentAction::Sit);
        }
        if bound(&k.clap, sc) {
            intent.actions.push(IntentAction::Clap);
        }
        if bound(&k.salute, sc) {
            intent.actions.push(IntentAction::Salute);
        }
        if bound(&k.push_to_talk, sc) {
            intent.actions.push(IntentAction::PushToTalk(true));
        }
    }

    fn on_key_up(&self, sc: Scancode, intent: &mut AvatarIntent) {
        let k = &self.keymap;
        if bound(&k.camera_mode, sc) {
            intent.actions.push(IntentAction::ToggleCameraMode);
        }
        if bound(&k.collision_toggle, sc) {
            intent.actions.push(IntentAction::ToggleCollision);
        }
        if bound(&k.mute, sc) {
            intent.actions.push(IntentAction::ToggleMute);
        }
        if bound(&k.push_to_talk, sc) {
            intent.actions.push(IntentAction::PushToTalk(false));
        }
        if bound(&k.clap, sc) {
            intent.actions.push(IntentAction::EndClap);
        }
        if bound(&k.salute, sc) {
            intent.actions.push(IntentAction::EndSalute);
        }
    }
}

fn ease(current: f32, target: f32, t: f32) -> f32 {
    let next = current + (target - current) * t;
    if (next - target).abs() < AXIS_SNAP {
        target
    } else {
        next
    }
}

impl InputHandler for KeyboardInput {
    fn kind(&self) -> InputKind {
        InputKind::Keyboard
    }

    fn attach_control(&mut self) {
        self.attached = true;
        self.down.clear();
        self.axis = Vec3::ZERO;
    }

    fn detach_control(&mut self) {
        self.attached = false;
        self.down.clear();
        self.axis = Vec3::ZERO;
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn handle_inputs(&mut self, input: &InputState, dt: f32, intent: &mut AvatarIntent) {
        if !self.attached {
            return;
        }

        for event in &input.events {
            match *event {
                InputEvent::KeyPressed(sc) => {
                    self.down.insert(sc);
                    self.on_key_down(sc, intent);
                }
                InputEvent::KeyReleased(sc) => {
                    self.down.remove(&sc);
                    self.on_key_up(sc, intent);
                }
            }
        }

        let k = &self.keymap;
        let target = Vec3::new(
            self.key_axis(&k.left, &k.right),
            self.key_axis(&k.descend, &k.ascend),
            self.key_axis(&k.backward, &k.forward),
        );
        let t = self.axis_smoothing;
        self.axis = Vec3::new(
            ease(self.axis.x, target.x, t),
            // Vertical flight is not smoothed.
            target.y,
            ease(self.axis.z, target.z, t),
        );
        intent.move_dir = self.axis;
        intent.running = self.held(&k.run);

        intent.turn = self.key_axis(&k.turn_left, &k.turn_right);
        intent.camera_yaw += intent.turn * self.camera_speed * dt
            + input.mouse_dx * MOUSE_SENSITIVITY;
        intent.camera_pitch += input.mouse_dy * MOUSE_SENSITIVITY;
        intent.zoom += input.scroll_dy * ZOOM_STEP;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attached() -> KeyboardInput {
        let mut kb = KeyboardInput::new(&InputSettings::default()).unwrap();
        kb.attach_control();
        kb
    }

    fn frame(kb: &mut KeyboardInput, input: &mut InputState, intent: &mut AvatarIntent) {
        intent.begin_frame();
        kb.handle_inputs(input, 1.0 / 60.0, intent);
        input.begin_frame();
    }

    #[test]
    fn axis_eases_toward_held_direction() {
        let mut kb = attached();
        let mut input = InputState::new();
        let mut intent = AvatarIntent::default();

        input.press(Scancode::W);
        frame(&mut kb, &mut input, &mut intent);
        assert!((intent.move_dir.z - 0.2).abs() < 1e-6);
        frame(&mut kb, &mut input, &mut intent);
        assert!((intent.move_dir.z - 0.36).abs() < 1e-6);

        for _ in 0..40 {
            frame(&mut kb, &mut input, &mut intent);
        }
        assert_eq!(intent.move_dir.z, 1.0);

        input.release(Scancode::W);
        for _ in 0..40 {
            frame(&mut kb, &mut input, &mut intent);
        }
        assert_eq!(intent.move_dir.z, 0.0);
    }

    #[test]
    fn key_down_edges_raise_actions_once() {
        let mut kb = attached();
        let mut input = InputState::new();
        let mut intent = AvatarIntent::default();

        input.press(Scancode::Space);
        input.press(Scancode::LShift);
        frame(&mut kb, &mut input, &mut intent);
        assert_eq!(intent.actions, vec![IntentAction::Jump]);
        assert!(intent.running);

        frame(&mut kb, &mut input, &mut intent);
        assert!(intent.actions.is_empty());
        assert!(intent.running);
    }

    #[test]
    fn key_up_edges_toggle_modes() {
        let mut kb = attached();
        let mut input = InputState::new();
        let mut intent = AvatarIntent::default();

        input.press(Scancode::V);
        input.press(Scancode::Num1);
        frame(&mut kb, &mut input, &mut intent);
        assert_eq!(intent.actions, vec![IntentAction::Clap]);

        input.release(Scancode::V);
        input.release(Scancode::Num1);
        frame(&mut kb, &mut input, &mut intent);
        assert_eq!(
            intent.actions,
            vec![IntentAction::ToggleCameraMode, IntentAction::EndClap]
        );
    }

    #[test]
    fn detached_handler_is_silent() {
        let mut kb = attached();
        kb.detach_control();
        let mut input = InputState::new();
        let mut intent = AvatarIntent::default();
        input.press(Scancode::Space);
        frame(&mut kb, &mut input, &mut intent);
        assert!(intent.actions.is_empty());
        assert_eq!(intent.move_dir, Vec3::ZERO);
    }

    #[test]
    fn turn_keys_rotate_camera() {
        let mut kb = attached();
        let mut input = InputState::new();
        let mut intent = AvatarIntent::default();
        input.press(Scancode::Right);
        frame(&mut kb, &mut input, &mut intent);
        assert_eq!(intent.turn, 1.0);
        assert!((intent.camera_yaw - 1.5 / 60.0).abs() < 1e-6);
    }
}
