//! Locomotion state machine of the controlled avatar.
//!
//! One call to [`update_locomotion`] per frame: tick the state timer, run the
//! handler of the current state, then pick the animation for the resulting
//! action.

use glam::{EulerRot, Quat, Vec3};
use hecs::{Entity, World};
use tracing::debug;

use crate::components::{Action, AvatarState, JumpSubstate, LocalTransform, LocomotionState};
use crate::systems::animation::{AnimationBlender, AnimationEvent};
use crate::systems::physics::PhysicsBackend;

/// Per-tick lerp factor toward the target speed. Frame-rate coupled.
pub const SPEED_BLEND: f32 = 0.1;
/// Vertical movement below this per tick counts as resting.
pub const REST_EPSILON: f32 = 0.001;
/// Ground probe length below the body while falling.
pub const LANDING_PROBE: f32 = 0.1;
pub const LANDING_SETTLE: f32 = 0.15;
pub const LANDING_CEILING: f32 = 2.2;
pub const TELEPORT_HOLD: f32 = 1.0;
pub const STOP_HOLD: f32 = 5.0;
pub const POSE_MIN: f32 = 0.5;

/// What the state machine needs to know about the camera this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraView {
    /// Heading of the camera's view direction around +Y, radians.
    pub yaw: f32,
    /// Pitch offset from the default camera angle. Positive looks down.
    pub pitch: f32,
    pub first_person: bool,
}

/// Borrowed world access for one locomotion tick.
pub struct LocomotionCtx<'a> {
    pub world: &'a mut World,
    pub physics: &'a mut dyn PhysicsBackend,
    /// The avatar root: a physics body carrying the `LocalTransform`.
    pub body: Entity,
    pub camera: CameraView,
}

impl LocomotionCtx<'_> {
    fn transform(&self) -> Option<LocalTransform> {
        self.world.get::<&LocalTransform>(self.body).map(|t| *t).ok()
    }

    fn set_rotation(&mut self, rotation: Quat) {
        if let Ok(mut t) = self.world.get::<&mut LocalTransform>(self.body) {
            t.rotation = rotation;
        }
    }

    fn translate(&mut self, offset: Vec3) {
        if let Ok(mut t) = self.world.get::<&mut LocalTransform>(self.body) {
            t.position += offset;
        }
    }

    fn vertical_velocity(&self) -> f32 {
        self.physics.linear_velocity(&*self.world, self.body).y
    }
}

/// `lerp(|current|, target, SPEED_BLEND)`, once per tick.
pub fn smooth_speed(current: f32, target: f32) -> f32 {
    current.abs() + (target - current.abs()) * SPEED_BLEND
}

/// Heading of `rotation` around +Y, ignoring pitch and roll.
pub fn yaw_of(rotation: Quat) -> f32 {
    let forward = rotation * Vec3::Z;
    forward.x.atan2(forward.z)
}

/// Signed angle from world forward to the horizontal move direction.
pub fn move_heading(move_dir: Vec3) -> f32 {
    let flat = Vec3::new(move_dir.x, 0.0, move_dir.z).normalize_or_zero();
    flat.x.atan2(flat.z)
}

// ---------------------------------------------------------------------------
// Outside triggers
// ---------------------------------------------------------------------------

/// Enter the jump cycle on a jump key edge. Ignored while flying or already
/// jumping.
pub fn request_jump(state: &mut AvatarState) -> bool {
    match state.state() {
        LocomotionState::Idle | LocomotionState::Move => {
            state.reset_jump();
            state.jump_substate = JumpSubstate::Start;
            state.fsm.go(LocomotionState::Jump);
            debug!("jump requested");
            true
        }
        _ => false,
    }
}

/// Toggle flying. Gravity is off while in Fly.
pub fn toggle_fly(
    state: &mut AvatarState,
    physics: &mut dyn PhysicsBackend,
    world: &mut World,
    body: Entity,
) {
    if state.state() == LocomotionState::Fly {
        physics.set_gravity_enabled(world, body, true);
        state.fsm.go(LocomotionState::Idle);
        state.action = Action::Idle;
    } else {
        physics.set_gravity_enabled(world, body, false);
        state.reset_jump();
        state.current_speed = 0.0;
        state.fsm.go(LocomotionState::Fly);
        state.action = Action::Fly;
    }
    debug!(state = ?state.state(), "fly toggled");
}

/// Enter a pose (sit, clap, salute...).
pub fn enter_pose(state: &mut AvatarState, action: Action) {
    if !action.is_pose() || state.state() == LocomotionState::Fly {
        return;
    }
    state.reset_jump();
    state.current_speed = 0.0;
    state.pose_released = false;
    state.action = action;
    state.fsm.force_go(LocomotionState::Pose);
}

/// Release of the key holding `action`. Ends the pose once the minimum hold
/// has passed.
pub fn release_pose(state: &mut AvatarState, action: Action) {
    if state.state() == LocomotionState::Pose && state.action == action {
        state.pose_released = true;
    }
}

pub fn set_teleported(state: &mut AvatarState, teleported: bool) {
    if teleported {
        state.fsm.force_go(LocomotionState::Teleport);
    } else if state.state() == LocomotionState::Teleport {
        state.fsm.go(LocomotionState::Idle);
    }
}

pub fn set_stopped(state: &mut AvatarState, stopped: bool) {
    if stopped {
        state.fsm.force_go(LocomotionState::Stop);
    } else if state.state() == LocomotionState::Stop {
        state.fsm.go(LocomotionState::Idle);
    }
}

// ---------------------------------------------------------------------------
// Per-frame update
// ---------------------------------------------------------------------------

pub fn update_locomotion(
    state: &mut AvatarState,
    ctx: &mut LocomotionCtx,
    animator: &mut AnimationBlender,
    dt: f32,
) {
    state.fsm.tick(dt);
    let before = state.state();

    match before {
        LocomotionState::Idle => idle(state, ctx),
        LocomotionState::Move => moving(state, ctx, dt),
        LocomotionState::Jump => jump(state, ctx, dt),
        LocomotionState::Fly => fly(state, ctx, dt),
        LocomotionState::Teleport => hold_until_input(state, ctx, TELEPORT_HOLD),
        LocomotionState::Stop => hold_until_input(state, ctx, STOP_HOLD),
        LocomotionState::Pose => pose(state),
    }

    if state.state() != before {
        debug!(from = ?before, to = ?state.state(), action = ?state.action, "locomotion");
    }

    animator.play(state.action);
    for event in animator.advance(dt) {
        let AnimationEvent::ClipEnded(name) = event;
        if state.action == Action::Land && name == "land" {
            state.land_animation_done = true;
        }
    }
}

fn idle(state: &mut AvatarState, ctx: &mut LocomotionCtx) {
    state.current_speed = 0.0;
    let Some(transform) = ctx.transform() else {
        return;
    };

    let yaw = if ctx.camera.first_person {
        ctx.camera.yaw
    } else {
        yaw_of(transform.rotation)
    };
    ctx.set_rotation(Quat::from_rotation_y(yaw));

    state.action = if state.angular_velocity.y > 0.0 {
        Action::TurnRight
    } else if state.angular_velocity.y < 0.0 {
        Action::TurnLeft
    } else {
        Action::Idle
    };

    if state.has_move_input() {
        state.fsm.go(LocomotionState::Move);
    }
}

/// Walking or running. Third person faces the move direction and walks
/// forward; first person keeps facing the camera and steps in the input
/// direction.
fn moving(state: &mut AvatarState, ctx: &mut LocomotionCtx, dt: f32) {
    if !state.has_move_input() {
        state.current_speed = 0.0;
        state.action = Action::Idle;
        state.fsm.go(LocomotionState::Idle);
        return;
    }
    if ctx.transform().is_none() {
        return;
    }

    let first_person = ctx.camera.first_person;
    state.action = if state.is_running && state.move_dir.z >= 0.0 {
        Action::RunForward
    } else if !first_person {
        Action::WalkForward
    } else {
        directional_walk(state.move_dir)
    };
    state.current_speed = smooth_speed(state.current_speed, state.target_speed());

    let (rotation, heading) = if first_person {
        let rotation = Quat::from_rotation_y(ctx.camera.yaw);
        let step = Vec3::new(state.move_dir.x, 0.0, state.move_dir.z).normalize_or_zero();
        (rotation, rotation * step)
    } else {
        let rotation = Quat::from_rotation_y(ctx.camera.yaw + move_heading(state.move_dir));
        (rotation, rotation * Vec3::Z)
    };
    ctx.set_rotation(rotation);
    ctx.translate(heading * state.current_speed * dt);
}

fn directional_walk(move_dir: Vec3) -> Action {
    if move_dir.z.abs() >= move_dir.x.abs() {
        if move_dir.z >= 0.0 {
            Action::WalkForward
        } else {
            Action::WalkBackward
        }
    } else if move_dir.x > 0.0 {
        Action::WalkRight
    } else {
        Action::WalkLeft
    }
}

fn jump(state: &mut AvatarState, ctx: &mut LocomotionCtx, dt: f32) {
    let Some(transform) = ctx.transform() else {
        return;
    };
    let y = transform.position.y;

    match state.jump_substate {
        JumpSubstate::None => {
            // Entered Jump without a key edge: nothing to run.
            state.fsm.go(LocomotionState::Idle);
            return;
        }
        JumpSubstate::Start => {
            state.jumped_while_running = state.is_running && state.has_move_input();
            state.jump_in_place = !state.has_move_input();
            state.action = Action::Jump;
            state.jump_substate = JumpSubstate::Jumping;
        }
        JumpSubstate::Jumping => {
            if state.can_impulse {
                let impulse = Vec3::Y * state.jump_impulse;
                ctx.physics.apply_impulse(ctx.world, ctx.body, impulse);
                state.can_impulse = false;
            }
            state.jump_substate = JumpSubstate::Rising;
        }
        JumpSubstate::Rising => {
            if ctx.vertical_velocity() < 0.0 {
                state.previous_pos_y = y;
                state.jump_substate = JumpSubstate::Falling;
            }
        }
        JumpSubstate::Falling => {
            let on_ground = ctx.physics.ground_probe(&*ctx.world, ctx.body, LANDING_PROBE);
            if on_ground || (y - state.previous_pos_y).abs() <= REST_EPSILON {
                state.landing_duration = 0.0;
                state.land_animation_done = false;
                state.action = Action::Land;
                state.jump_substate = JumpSubstate::Landing;
            } else {
                state.previous_pos_y = y;
            }
        }
        JumpSubstate::Landing => {
            state.landing_duration += dt;
            let settled = state.has_move_input() && state.landing_duration > LANDING_SETTLE;
            if settled || state.landing_duration >= LANDING_CEILING || state.land_animation_done {
                let next = if state.has_move_input() {
                    LocomotionState::Move
                } else {
                    LocomotionState::Idle
                };
                state.reset_jump();
                state.action = Action::Idle;
                state.fsm.go(next);
                return;
            }
        }
    }

    // Air control along the heading the jump started with.
    if !state.jump_in_place && state.has_move_input() {
        state.current_speed = smooth_speed(state.current_speed, state.target_speed());
        let rotation = Quat::from_rotation_y(ctx.camera.yaw + move_heading(state.move_dir));
        ctx.set_rotation(rotation);
        ctx.translate(rotation * Vec3::Z * state.current_speed * dt);
    }
}

/// Rotation follows the camera directly. Horizontal motion is added to the
/// position, vertical motion goes through the collision-aware move.
fn fly(state: &mut AvatarState, ctx: &mut LocomotionCtx, dt: f32) {
    if ctx.transform().is_none() {
        return;
    }
    let yaw = ctx.camera.yaw;
    ctx.set_rotation(Quat::from_euler(EulerRot::YXZ, yaw, ctx.camera.pitch, 0.0));

    state.action = if state.is_running { Action::FlyFast } else { Action::Fly };
    let target = if state.has_move_input() { state.target_speed() } else { 0.0 };
    state.current_speed = smooth_speed(state.current_speed, target);

    let heading = Quat::from_rotation_y(yaw);
    let planar = heading * Vec3::new(state.move_dir.x, 0.0, state.move_dir.z);
    let planar = planar.normalize_or_zero();
    ctx.translate(planar * state.current_speed * dt);

    if state.move_dir.y != 0.0 {
        let rate = if state.is_running {
            state.speeds.fast_ascend
        } else {
            state.speeds.ascend
        };
        let rise = Vec3::Y * state.move_dir.y.signum() * rate * dt;
        ctx.physics.move_with_collisions(ctx.world, ctx.body, rise);
    }
}

/// Teleport and Stop: frozen until the hold time has passed and the user
/// asks to move.
fn hold_until_input(state: &mut AvatarState, ctx: &mut LocomotionCtx, hold: f32) {
    state.current_speed = 0.0;
    state.angular_velocity = Vec3::ZERO;
    state.action = Action::Idle;
    if let Some(transform) = ctx.transform() {
        ctx.set_rotation(Quat::from_rotation_y(yaw_of(transform.rotation)));
    }
    if state.fsm.elapsed >= hold && state.has_move_input() {
        state.fsm.go(LocomotionState::Idle);
    }
}

fn pose(state: &mut AvatarState) {
    state.current_speed = 0.0;
    if state.fsm.elapsed < POSE_MIN {
        return;
    }
    if state.has_move_input() || state.pose_released {
        state.pose_released = false;
        state.action = Action::Idle;
        state.fsm.go(LocomotionState::Idle);
    }
}
