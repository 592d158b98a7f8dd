use glam::Vec3;

use crate::config::AvatarSettings;
use crate::fsm::StateMachine;

// ---------------------------------------------------------------------------
// Locomotion enums
// ---------------------------------------------------------------------------

/// Top-level locomotion states. Exactly one handler runs per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocomotionState {
    Idle,
    Move,
    Jump,
    Fly,
    Teleport,
    /// Forced-idle lock set from outside (UI/store).
    Stop,
    /// Sitting, clapping, saluting.
    Pose,
}

/// What the avatar is doing, as far as animation selection is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Idle,
    WalkForward,
    WalkBackward,
    WalkLeft,
    WalkRight,
    TurnLeft,
    TurnRight,
    RunForward,
    Jump,
    Land,
    Fly,
    FlyFast,
    /// Seated on an interactable object.
    Sit,
    SitOnGround,
    Clap,
    Salute,
}

impl Action {
    pub fn is_pose(self) -> bool {
        matches!(self, Self::Sit | Self::SitOnGround | Self::Clap | Self::Salute)
    }
}

/// Phases nested inside [`LocomotionState::Jump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpSubstate {
    None,
    Start,
    Jumping,
    Rising,
    Falling,
    Landing,
}

// ---------------------------------------------------------------------------
// Per-avatar record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionSpeeds {
    pub walk: f32,
    pub run: f32,
    pub land: f32,
    pub fly: f32,
    pub fast_fly: f32,
    pub ascend: f32,
    pub fast_ascend: f32,
}

impl From<&AvatarSettings> for LocomotionSpeeds {
    fn from(s: &AvatarSettings) -> Self {
        Self {
            walk: s.walk_speed,
            run: s.run_speed,
            land: s.land_speed,
            fly: s.fly_speed,
            fast_fly: s.fast_fly_speed,
            ascend: s.ascend_speed,
            fast_ascend: s.fast_ascend_speed,
        }
    }
}

/// Mutable locomotion record of the controlled avatar.
///
/// Written by the input handlers (intent) and the state machine (everything
/// else). `fsm.elapsed` is the time spent in the current top-level state.
#[derive(Debug, Clone)]
pub struct AvatarState {
    pub fsm: StateMachine<LocomotionState>,
    pub action: Action,
    pub jump_substate: JumpSubstate,
    /// Movement intent: x strafe, y vertical (fly), z forward. Each in [-1, 1].
    pub move_dir: Vec3,
    pub angular_velocity: Vec3,
    pub current_speed: f32,
    /// Run modifier latched from input.
    pub is_running: bool,
    pub speeds: LocomotionSpeeds,
    pub jump_impulse: f32,
    /// One impulse per jump cycle.
    pub can_impulse: bool,
    pub landing_duration: f32,
    pub jump_in_place: bool,
    /// Latched at Start -> Jumping; picks the airborne speed.
    pub jumped_while_running: bool,
    pub previous_pos_y: f32,
    /// Set by the animation layer when the land clip reached its end.
    pub land_animation_done: bool,
    /// The key holding the current pose was released.
    pub pose_released: bool,
}

impl AvatarState {
    pub fn new(settings: &AvatarSettings) -> Self {
        Self {
            fsm: StateMachine::new(LocomotionState::Idle),
            action: Action::Idle,
            jump_substate: JumpSubstate::None,
            move_dir: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            current_speed: 0.0,
            is_running: false,
            speeds: LocomotionSpeeds::from(settings),
            jump_impulse: settings.jump_impulse,
            can_impulse: true,
            landing_duration: 0.0,
            jump_in_place: false,
            jumped_while_running: false,
            previous_pos_y: 0.0,
            land_animation_done: false,
            pose_released: false,
        }
    }

    pub fn state(&self) -> LocomotionState {
        self.fsm.state
    }

    /// Horizontal movement intent present.
    pub fn has_move_input(&self) -> bool {
        self.move_dir.x != 0.0 || self.move_dir.z != 0.0
    }

    /// Target speed for the current action.
    pub fn target_speed(&self) -> f32 {
        match self.action {
            Action::Idle => 0.0,
            Action::RunForward => self.speeds.run,
            Action::Jump => {
                if self.jumped_while_running {
                    self.speeds.run
                } else {
                    self.speeds.walk
                }
            }
            Action::Land => self.speeds.land,
            Action::Fly => self.speeds.fly,
            Action::FlyFast => self.speeds.fast_fly,
            _ => self.speeds.walk,
        }
    }

    /// Clear everything belonging to a jump cycle.
    pub fn reset_jump(&mut self) {
        self.jump_substate = JumpSubstate::None;
        self.can_impulse = true;
        self.landing_duration = 0.0;
        self.jump_in_place = false;
        self.jumped_while_running = false;
        self.land_animation_done = false;
    }
}
