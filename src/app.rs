use anyhow::{anyhow, Result};
use glam::Vec3;
use hecs::{Entity, World};
use sdl2::controller::GameController;
use sdl2::keyboard::Scancode;
use sdl2::Sdl;
use tracing::{info, warn};

use crate::config::Settings;
use crate::controllers::{
    CameraRigController, FrameContext, MyAvatarController, ScriptAvatarController, SharedState,
};
use crate::engine::input::{InputEvent, InputState};
use crate::engine::lifecycle::Script;
use crate::engine::time::FrameTimer;
use crate::engine::window::GameWindow;
use crate::error::ConfigError;
use crate::input::{AvatarIntent, InputKind, InputRouter};
use crate::scene::prefabs::spawn_remote_avatar;
use crate::scene::test_scene::load_test_scene;
use crate::systems::animation::ClipLibrary;
use crate::systems::physics::{EcsPhysics, PhysicsBackend};
use crate::systems::transform_propagation_system;
use crate::wire::AvatarLink;

/// Seconds between window title refreshes.
const TITLE_INTERVAL: f32 = 0.25;

/// The avatar runtime: one controlled avatar, its camera, any number of
/// remote avatars, all ticked in a fixed order.
pub struct AvatarApp {
    world: World,
    physics: Box<dyn PhysicsBackend>,
    input: InputRouter,
    intent: AvatarIntent,
    shared: SharedState,
    avatar: Script<MyAvatarController>,
    camera: Script<CameraRigController>,
    remotes: Vec<Script<ScriptAvatarController>>,
    frames: u64,
}

impl AvatarApp {
    /// Load the test scene with `remote_count` remote avatars.
    pub fn new(settings: &Settings, input_kind: InputKind, remote_count: usize) -> Result<Self, ConfigError> {
        let mut world = World::new();
        let scene = load_test_scene(&mut world, remote_count);
        transform_propagation_system(&mut world);

        let input = InputRouter::new(input_kind, &settings.input)?;
        let avatar = MyAvatarController::new(scene.avatar, settings, ClipLibrary::standard());
        let camera = CameraRigController::new(scene.avatar, &settings.camera);
        let remotes = scene
            .remotes
            .iter()
            .map(|&root| Script::new(ScriptAvatarController::new(root)))
            .collect();

        info!(remotes = remote_count, input = ?input_kind, "avatar app ready");
        Ok(Self {
            world,
            physics: Box::new(EcsPhysics::new()),
            input,
            intent: AvatarIntent::default(),
            shared: SharedState::new(&settings.camera, input_kind),
            avatar: Script::new(avatar),
            camera: Script::new(camera),
            remotes,
            frames: 0,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn avatar(&self) -> &MyAvatarController {
        &self.avatar
    }

    pub fn avatar_mut(&mut self) -> &mut MyAvatarController {
        &mut self.avatar
    }

    pub fn camera(&self) -> &CameraRigController {
        &self.camera
    }

    pub fn shared(&self) -> &SharedState {
        &self.shared
    }

    pub fn shared_mut(&mut self) -> &mut SharedState {
        &mut self.shared
    }

    pub fn intent(&self) -> &AvatarIntent {
        &self.intent
    }

    pub fn input_kind(&self) -> InputKind {
        self.input.kind()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn remotes(&self) -> &[Script<ScriptAvatarController>] {
        &self.remotes
    }

    pub fn remote_link(&self, index: usize) -> Option<AvatarLink> {
        self.remotes.get(index).map(|r| r.link())
    }

    /// Spawn another remote avatar and hand back its network link.
    pub fn add_remote(&mut self, position: Vec3) -> (Entity, AvatarLink) {
        let root = spawn_remote_avatar(&mut self.world, position);
        let remote = ScriptAvatarController::new(root);
        let link = remote.link();
        self.remotes.push(Script::new(remote));
        info!(?root, "remote avatar added");
        (root, link)
    }

    /// Move the controlled avatar and snap the camera after it.
    pub fn teleport(&mut self, position: Vec3) {
        self.avatar
            .teleport_to(&mut self.world, self.physics.as_mut(), position);
        self.camera.rig_mut().reset_follow(position);
    }

    /// One tick.
    ///
    /// Order: staged updates, input, controlled avatar, physics, camera,
    /// remote avatars, transform propagation, change notifications.
    pub fn frame(&mut self, input: &InputState, dt: f32) {
        self.avatar.data_mut().apply_pending();

        let requested = *self.shared.input_mode.get();
        if requested != self.input.kind() {
            if let Err(e) = self.input.switch(requested) {
                warn!(error = %e, "input switch failed");
                self.shared.input_mode.set(self.input.kind());
            }
        }
        self.intent.begin_frame();
        self.input.handle_inputs(input, dt, &mut self.intent);

        {
            let mut ctx = FrameContext {
                world: &mut self.world,
                physics: self.physics.as_mut(),
                intent: &self.intent,
                shared: &mut self.shared,
            };
            self.avatar.update(&mut ctx, dt);
        }

        self.physics.step(&mut self.world, dt);

        {
            let mut ctx = FrameContext {
                world: &mut self.world,
                physics: self.physics.as_mut(),
                intent: &self.intent,
                shared: &mut self.shared,
            };
            self.camera.update(&mut ctx, dt);
            for remote in &mut self.remotes {
                remote.update(&mut ctx, dt);
            }
        }

        transform_propagation_system(&mut self.world);
        self.shared.update();
        self.frames += 1;
    }

    /// Run without a window for `seconds` of simulated time at a fixed `dt`.
    /// `script` gets the frame number and may press and release keys before
    /// each frame.
    pub fn run_headless(
        &mut self,
        seconds: f32,
        dt: f32,
        mut script: impl FnMut(u64, &mut InputState),
    ) -> u64 {
        let total = (seconds / dt).round() as u64;
        let mut input = InputState::new();
        for frame in 0..total {
            input.begin_frame();
            script(frame, &mut input);
            self.frame(&input, dt);
        }
        info!(frames = total, state = ?self.avatar.state().state(), "headless run finished");
        total
    }

    /// Windowed loop. Escape or closing the window quits.
    pub fn run(&mut self, sdl: &Sdl, window: &mut GameWindow) -> Result<()> {
        sdl.mouse().set_relative_mouse_mode(true);
        let mut event_pump = sdl.event_pump().map_err(|e| anyhow!("event pump: {e}"))?;
        let _controller = open_first_controller(sdl);
        let mut input = InputState::new();
        let mut timer = FrameTimer::new();
        let mut title_timer = 0.0;

        loop {
            timer.tick();
            input.update(&mut event_pump);
            if input.should_quit() || input.events.contains(&InputEvent::KeyPressed(Scancode::Escape)) {
                break;
            }

            self.frame(&input, timer.dt);

            title_timer += timer.dt;
            if title_timer >= TITLE_INTERVAL {
                title_timer = 0.0;
                let state = self.avatar.state();
                window.set_title(&format!(
                    "avatar-rig | {:?} / {:?} | {:?} camera",
                    state.state(),
                    state.action,
                    self.shared.camera_mode.get(),
                ));
            }
        }
        info!(frames = self.frames, "window closed");
        Ok(())
    }
}

/// First attached game controller, kept open for the run so its axis events
/// reach the pump.
fn open_first_controller(sdl: &Sdl) -> Option<GameController> {
    let subsystem = match sdl.game_controller() {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "game controller subsystem unavailable");
            return None;
        }
    };
    let count = subsystem.num_joysticks().ok()?;
    (0..count)
        .filter(|&i| subsystem.is_game_controller(i))
        .find_map(|i| match subsystem.open(i) {
            Ok(controller) => {
                info!(name = %controller.name(), "game controller opened");
                Some(controller)
            }
            Err(e) => {
                warn!(index = i, error = %e, "failed to open game controller");
                None
            }
        })
}
