//! Device input turned into avatar intent.
//!
//! Exactly one [`InputHandler`] is live at a time. [`InputRouter`] owns it and
//! detaches the old handler before attaching a replacement.

pub mod joystick;
pub mod keyboard;

pub use joystick::JoystickInput;
pub use keyboard::KeyboardInput;

use glam::Vec3;
use tracing::info;

use crate::config::InputSettings;
use crate::engine::input::InputState;
use crate::error::ConfigError;

/// Discrete requests raised by a handler during one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentAction {
    Jump,
    ToggleFly,
    Sit,
    Clap,
    Salute,
    /// The key holding a clap or salute was released.
    EndClap,
    EndSalute,
    ToggleCameraMode,
    ToggleCollision,
    ToggleMute,
    PushToTalk(bool),
}

/// Normalized per-frame intent, identical in shape for every device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvatarIntent {
    /// x strafe right, y up (fly), z forward. Each in [-1, 1].
    pub move_dir: Vec3,
    pub running: bool,
    /// Turn keys: -1 left, 1 right.
    pub turn: f32,
    /// Direct camera rotation this frame, radians. Positive yaw turns right,
    /// positive pitch looks down.
    pub camera_yaw: f32,
    pub camera_pitch: f32,
    /// Camera rotation fed through the camera's inertia.
    pub inertial_yaw: f32,
    pub inertial_pitch: f32,
    pub zoom: f32,
    pub actions: Vec<IntentAction>,
}

impl AvatarIntent {
    /// Clear the one-frame parts, keeping the held movement state.
    pub fn begin_frame(&mut self) {
        self.camera_yaw = 0.0;
        self.camera_pitch = 0.0;
        self.inertial_yaw = 0.0;
        self.inertial_pitch = 0.0;
        self.zoom = 0.0;
        self.actions.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Keyboard,
    Joystick,
}

pub trait InputHandler {
    fn kind(&self) -> InputKind;

    fn attach_control(&mut self);

    /// Stop producing intent and forget any held state.
    fn detach_control(&mut self);

    fn is_attached(&self) -> bool;

    /// Read this frame's input into `intent`. Does nothing while detached.
    fn handle_inputs(&mut self, input: &InputState, dt: f32, intent: &mut AvatarIntent);
}

/// Mobile user agents get the virtual joystick.
pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    ["android", "iphone", "ipad", "ipod", "mobile"]
        .iter()
        .any(|needle| ua.contains(needle))
}

pub fn kind_for_user_agent(user_agent: &str) -> InputKind {
    if is_mobile_user_agent(user_agent) {
        InputKind::Joystick
    } else {
        InputKind::Keyboard
    }
}

pub fn create_handler(
    kind: InputKind,
    settings: &InputSettings,
) -> Result<Box<dyn InputHandler>, ConfigError> {
    Ok(match kind {
        InputKind::Keyboard => Box::new(KeyboardInput::new(settings)?),
        InputKind::Joystick => Box::new(JoystickInput::new(settings)),
    })
}

/// Owns the single live input handler.
pub struct InputRouter {
    handler: Box<dyn InputHandler>,
    settings: InputSettings,
}

impl InputRouter {
    pub fn new(kind: InputKind, settings: &InputSettings) -> Result<Self, ConfigError> {
        let mut handler = create_handler(kind, settings)?;
        handler.attach_control();
        info!(?kind, "input attached");
        Ok(Self {
            handler,
            settings: settings.clone(),
        })
    }

    pub fn kind(&self) -> InputKind {
        self.handler.kind()
    }

    pub fn handler(&self) -> &dyn InputHandler {
        self.handler.as_ref()
    }

    /// Replace the live handler. No-op if it is already of `kind`.
    pub fn switch(&mut self, kind: InputKind) -> Result<(), ConfigError> {
        if self.handler.kind() == kind {
            return Ok(());
        }
        let mut next = create_handler(kind, &self.settings)?;
        self.handler.detach_control();
        next.attach_control();
        info!(from = ?self.handler.kind(), to = ?kind, "input handler switched");
        self.handler = next;
        Ok(())
    }

    pub fn handle_inputs(&mut self, input: &InputState, dt: f32, intent: &mut AvatarIntent) {
        self.handler.handle_inputs(input, dt, intent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_heuristic() {
        assert!(is_mobile_user_agent(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)"
        ));
        assert!(is_mobile_user_agent("Mozilla/5.0 (Linux; Android 14; Pixel 8)"));
        assert!(!is_mobile_user_agent("Mozilla/5.0 (X11; Linux x86_64)"));
        assert_eq!(kind_for_user_agent("desktop"), InputKind::Keyboard);
    }

    #[test]
    fn switching_replaces_the_live_handler() {
        let settings = InputSettings::default();
        let mut router = InputRouter::new(InputKind::Keyboard, &settings).unwrap();
        assert!(router.handler().is_attached());
        router.switch(InputKind::Joystick).unwrap();
        assert_eq!(router.kind(), InputKind::Joystick);
        assert!(router.handler().is_attached());
        router.switch(InputKind::Joystick).unwrap();
        assert_eq!(router.kind(), InputKind::Joystick);
    }

    #[test]
    fn begin_frame_keeps_held_movement() {
        let mut intent = AvatarIntent {
            move_dir: Vec3::Z,
            running: true,
            zoom: 1.0,
            actions: vec![IntentAction::Jump],
            ..Default::default()
        };
        intent.begin_frame();
        assert_eq!(intent.move_dir, Vec3::Z);
        assert!(intent.running);
        assert_eq!(intent.zoom, 0.0);
        assert!(intent.actions.is_empty());
    }
}
