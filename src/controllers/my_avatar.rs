use std::cell::Cell;
use std::rc::Rc;

use glam::{Quat, Vec3};
use hecs::{Entity, World};
use tracing::{debug, info};

use crate::camera::CameraMode;
use crate::components::{set_subtree_hidden, Action, AvatarState, LocalTransform, LocomotionState, Velocity};
use crate::config::Settings;
use crate::engine::lifecycle::ScriptComponent;
use crate::input::IntentAction;
use crate::systems::animation::{AnimationBlender, ClipLibrary};
use crate::systems::avatar::{self, LocomotionCtx};
use crate::systems::interaction::find_sit_target;
use crate::systems::physics::PhysicsBackend;
use crate::systems::skeleton::SkeletonSync;
use crate::wire::pose_mapper::{quat_to_wire, vec_to_wire};
use crate::wire::AvatarData;

use super::FrameContext;

/// Drives the controlled avatar: intent in, locomotion, pose out to the wire.
pub struct MyAvatarController {
    body: Entity,
    state: AvatarState,
    animator: AnimationBlender,
    skeleton: SkeletonSync,
    data: AvatarData,
    sit_radius: f32,
    /// Seated on an object, gravity off until the pose ends.
    seated: bool,
    camera_mode_change: Rc<Cell<Option<CameraMode>>>,
}

impl MyAvatarController {
    pub fn new(body: Entity, settings: &Settings, clips: ClipLibrary) -> Self {
        Self {
            body,
            state: AvatarState::new(&settings.avatar),
            animator: AnimationBlender::new(clips, &settings.animation),
            skeleton: SkeletonSync::new(body),
            data: AvatarData::new(),
            sit_radius: settings.interaction.sit_radius,
            seated: false,
            camera_mode_change: Rc::new(Cell::new(None)),
        }
    }

    pub fn body(&self) -> Entity {
        self.body
    }

    pub fn state(&self) -> &AvatarState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AvatarState {
        &mut self.state
    }

    pub fn animator(&self) -> &AnimationBlender {
        &self.animator
    }

    pub fn data(&self) -> &AvatarData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut AvatarData {
        &mut self.data
    }

    pub fn skeleton(&self) -> &SkeletonSync {
        &self.skeleton
    }

    // -- UI accessors ------------------------------------------------------

    pub fn walk_speed(&self) -> f32 {
        self.state.speeds.walk
    }

    pub fn set_walk_speed(&mut self, speed: f32) {
        self.state.speeds.walk = speed;
    }

    pub fn run_speed(&self) -> f32 {
        self.state.speeds.run
    }

    pub fn set_run_speed(&mut self, speed: f32) {
        self.state.speeds.run = speed;
    }

    pub fn land_speed(&self) -> f32 {
        self.state.speeds.land
    }

    pub fn set_land_speed(&mut self, speed: f32) {
        self.state.speeds.land = speed;
    }

    pub fn fly_speed(&self) -> f32 {
        self.state.speeds.fly
    }

    pub fn set_fly_speed(&mut self, speed: f32) {
        self.state.speeds.fly = speed;
    }

    pub fn teleported(&self) -> bool {
        self.state.state() == LocomotionState::Teleport
    }

    /// Setting re-arms the teleport timer.
    pub fn set_teleported(&mut self, teleported: bool) {
        avatar::set_teleported(&mut self.state, teleported);
    }

    pub fn stopped(&self) -> bool {
        self.state.state() == LocomotionState::Stop
    }

    /// Setting re-arms the stop timer.
    pub fn set_stopped(&mut self, stopped: bool) {
        avatar::set_stopped(&mut self.state, stopped);
    }

    /// Move the avatar and enter Teleport.
    pub fn teleport_to(&mut self, world: &mut World, physics: &mut dyn PhysicsBackend, position: Vec3) {
        if let Ok(mut t) = world.get::<&mut LocalTransform>(self.body) {
            t.position = position;
        }
        if let Ok(mut v) = world.get::<&mut Velocity>(self.body) {
            v.0 = Vec3::ZERO;
        }
        self.stand_up(world, physics);
        self.set_teleported(true);
        info!(?position, "teleported");
    }

    // ----------------------------------------------------------------------

    fn apply_intent(&mut self, ctx: &mut FrameContext) {
        let intent = ctx.intent;
        self.state.move_dir = intent.move_dir;
        self.state.is_running = intent.running;
        self.state.angular_velocity = Vec3::new(0.0, intent.turn, 0.0);

        for &action in &intent.actions {
            match action {
                IntentAction::Jump => {
                    avatar::request_jump(&mut self.state);
                }
                IntentAction::ToggleFly => {
                    self.stand_up(ctx.world, ctx.physics);
                    avatar::toggle_fly(&mut self.state, ctx.physics, ctx.world, self.body);
                }
                IntentAction::Sit => self.sit(ctx.world, ctx.physics),
                IntentAction::Clap => avatar::enter_pose(&mut self.state, Action::Clap),
                IntentAction::Salute => avatar::enter_pose(&mut self.state, Action::Salute),
                IntentAction::EndClap => avatar::release_pose(&mut self.state, Action::Clap),
                IntentAction::EndSalute => avatar::release_pose(&mut self.state, Action::Salute),
                IntentAction::ToggleCameraMode => {
                    let next = match ctx.shared.camera_mode.get() {
                        CameraMode::FirstPerson => CameraMode::ThirdPerson,
                        CameraMode::ThirdPerson => CameraMode::FirstPerson,
                    };
                    ctx.shared.camera_mode.set(next);
                }
                IntentAction::ToggleCollision => {
                    let enabled = !*ctx.shared.collision_checking.get();
                    ctx.shared.collision_checking.set(enabled);
                }
                IntentAction::ToggleMute => {
                    ctx.shared.audio.muted = !ctx.shared.audio.muted;
                    debug!(muted = ctx.shared.audio.muted, "mute toggled");
                }
                IntentAction::PushToTalk(held) => ctx.shared.audio.push_to_talk = held,
            }
        }
    }

    /// Sit on the nearest interactable in reach, else on the ground.
    fn sit(&mut self, world: &mut World, physics: &mut dyn PhysicsBackend) {
        if self.state.state() == LocomotionState::Fly {
            return;
        }
        let Some(position) = world.get::<&LocalTransform>(self.body).map(|t| t.position).ok() else {
            return;
        };
        match find_sit_target(world, position, self.sit_radius) {
            Some(target) => {
                if let Ok(mut t) = world.get::<&mut LocalTransform>(self.body) {
                    t.position = target.seat;
                    t.rotation = Quat::from_rotation_y(target.yaw);
                }
                physics.set_gravity_enabled(world, self.body, false);
                self.seated = true;
                avatar::enter_pose(&mut self.state, Action::Sit);
                debug!(seat = ?target.entity, "sitting");
            }
            None => avatar::enter_pose(&mut self.state, Action::SitOnGround),
        }
    }

    fn stand_up(&mut self, world: &mut World, physics: &mut dyn PhysicsBackend) {
        if self.seated {
            self.seated = false;
            physics.set_gravity_enabled(world, self.body, true);
        }
    }

    fn publish(&mut self, world: &World) {
        if let Ok(t) = world.get::<&LocalTransform>(self.body) {
            self.data.set_position(vec_to_wire(t.position));
            self.data.set_orientation(quat_to_wire(t.rotation));
        }
        self.skeleton.publish(world, &mut self.data);
    }
}

impl<'a> ScriptComponent<FrameContext<'a>> for MyAvatarController {
    fn name(&self) -> &str {
        "MyAvatarController"
    }

    fn on_initialize(&mut self, ctx: &mut FrameContext<'a>) {
        let inbox = self.camera_mode_change.clone();
        ctx.shared.camera_mode.connect(move |mode| inbox.set(Some(*mode)));
        let joints = self.skeleton.rebuild(ctx.world);
        info!(joints, "controlled avatar attached");
    }

    fn on_start(&mut self, _ctx: &mut FrameContext<'a>) {
        self.animator.play(Action::Idle);
    }

    fn on_update(&mut self, ctx: &mut FrameContext<'a>, dt: f32) {
        if ctx.world.get::<&LocalTransform>(self.body).is_err() {
            return;
        }
        if let Some(mode) = self.camera_mode_change.take() {
            set_subtree_hidden(ctx.world, self.body, mode == CameraMode::FirstPerson);
        }

        self.apply_intent(ctx);

        let mut loco = LocomotionCtx {
            world: &mut *ctx.world,
            physics: &mut *ctx.physics,
            body: self.body,
            camera: ctx.shared.camera_view,
        };
        avatar::update_locomotion(&mut self.state, &mut loco, &mut self.animator, dt);

        if self.state.state() != LocomotionState::Pose {
            self.stand_up(ctx.world, ctx.physics);
        }
        ctx.shared.interacting = self.state.state() == LocomotionState::Pose;

        self.publish(ctx.world);
    }

    fn on_stop(&mut self, ctx: &mut FrameContext<'a>) {
        self.stand_up(ctx.world, ctx.physics);
        ctx.shared.interacting = false;
        info!("controlled avatar detached");
    }
}
