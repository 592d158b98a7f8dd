//! Per-frame controllers, driven through [`ScriptComponent`](crate::engine::lifecycle::ScriptComponent).

pub mod camera_rig;
pub mod my_avatar;
pub mod script_avatar;

pub use camera_rig::CameraRigController;
pub use my_avatar::MyAvatarController;
pub use script_avatar::ScriptAvatarController;

use hecs::World;

use crate::camera::CameraMode;
use crate::config::CameraSettings;
use crate::engine::signal::InputStateProperty;
use crate::input::{AvatarIntent, InputKind};
use crate::systems::avatar::CameraView;
use crate::systems::physics::PhysicsBackend;

/// Voice flags. Device handling lives elsewhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioState {
    pub muted: bool,
    /// Push-to-talk key held.
    pub push_to_talk: bool,
}

impl AudioState {
    /// Push-to-talk opens the mic even while muted.
    pub fn transmitting(&self) -> bool {
        !self.muted || self.push_to_talk
    }
}

/// State shared between controllers and the outside (UI, audio).
#[derive(Debug)]
pub struct SharedState {
    pub camera_mode: InputStateProperty<CameraMode>,
    pub collision_checking: InputStateProperty<bool>,
    pub elastic_camera: InputStateProperty<bool>,
    pub input_mode: InputStateProperty<InputKind>,
    /// Written by the camera controller, read by the avatar next frame.
    pub camera_view: CameraView,
    /// The controlled avatar is in a pose.
    pub interacting: bool,
    pub audio: AudioState,
}

impl SharedState {
    pub fn new(camera: &CameraSettings, input_mode: InputKind) -> Self {
        Self {
            camera_mode: InputStateProperty::new(CameraMode::ThirdPerson),
            collision_checking: InputStateProperty::new(camera.collision_checking),
            elastic_camera: InputStateProperty::new(camera.elastic_camera),
            input_mode: InputStateProperty::new(input_mode),
            camera_view: CameraView::default(),
            interacting: false,
            audio: AudioState::default(),
        }
    }

    /// Flush change notifications. Once per frame, after every controller ran.
    pub fn update(&mut self) -> usize {
        [
            self.camera_mode.update(),
            self.collision_checking.update(),
            self.elastic_camera.update(),
            self.input_mode.update(),
        ]
        .into_iter()
        .filter(|&fired| fired)
        .count()
    }
}

/// What every controller gets each frame.
pub struct FrameContext<'a> {
    pub world: &'a mut World,
    pub physics: &'a mut dyn PhysicsBackend,
    pub intent: &'a AvatarIntent,
    pub shared: &'a mut SharedState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_to_talk_overrides_mute() {
        let mut audio = AudioState { muted: true, push_to_talk: false };
        assert!(!audio.transmitting());
        audio.push_to_talk = true;
        assert!(audio.transmitting());
    }

    #[test]
    fn shared_update_counts_notifications() {
        let mut shared = SharedState::new(&CameraSettings::default(), InputKind::Keyboard);
        shared.camera_mode.set(CameraMode::FirstPerson);
        shared.collision_checking.set(true);
        assert_eq!(shared.update(), 1);
        assert_eq!(shared.update(), 0);
    }
}
