use avatar_rig::app::AvatarApp;
use avatar_rig::camera::CameraMode;
use avatar_rig::components::{Children, Hidden, LocalTransform, LocomotionState};
use avatar_rig::config::Settings;
use avatar_rig::engine::input::InputState;
use avatar_rig::input::InputKind;
use sdl2::keyboard::Scancode;

const DT: f32 = 1.0 / 60.0;

fn app() -> AvatarApp {
    AvatarApp::new(&Settings::default(), InputKind::Keyboard, 0).unwrap()
}

fn run(app: &mut AvatarApp, input: &mut InputState, frames: usize) {
    for _ in 0..frames {
        app.frame(input, DT);
        input.begin_frame();
    }
}

fn body_position(app: &AvatarApp) -> glam::Vec3 {
    app.world()
        .get::<&LocalTransform>(app.avatar().body())
        .unwrap()
        .position
}

#[test]
fn walking_forward_moves_along_camera_heading() {
    let mut app = app();
    let mut input = InputState::new();
    let start = body_position(&app);

    input.press(Scancode::W);
    run(&mut app, &mut input, 60);
    assert_eq!(app.avatar().state().state(), LocomotionState::Move);

    let moved = body_position(&app) - start;
    assert!(moved.z > 0.3, "moved {moved:?}");
    assert!(moved.x.abs() < 1e-3);

    // The camera target tracks the body horizontally.
    let target = app.camera().rig().camera.target;
    assert!((target.z - body_position(&app).z).abs() < 1e-4);

    input.release(Scancode::W);
    run(&mut app, &mut input, 60);
    assert_eq!(app.avatar().state().state(), LocomotionState::Idle);
}

#[test]
fn jump_cycle_returns_to_idle() {
    let mut app = app();
    let mut input = InputState::new();
    run(&mut app, &mut input, 30);

    input.press(Scancode::Space);
    run(&mut app, &mut input, 1);
    assert_eq!(app.avatar().state().state(), LocomotionState::Jump);
    input.release(Scancode::Space);

    let mut peak: f32 = 0.0;
    for _ in 0..240 {
        run(&mut app, &mut input, 1);
        peak = peak.max(body_position(&app).y);
    }
    assert!(peak > 1.5, "peak {peak}");
    assert_eq!(app.avatar().state().state(), LocomotionState::Idle);
    assert!(app.avatar().state().can_impulse);
}

#[test]
fn camera_key_switches_to_first_person_and_hides_the_body() {
    let mut app = app();
    let mut input = InputState::new();
    let body = app.avatar().body();
    let hips = app.world().get::<&Children>(body).unwrap().0[0];

    input.press(Scancode::V);
    run(&mut app, &mut input, 1);
    input.release(Scancode::V);
    run(&mut app, &mut input, 1);
    assert_eq!(*app.shared().camera_mode.get(), CameraMode::FirstPerson);
    assert!(app.camera().rig().is_first_person());

    run(&mut app, &mut input, 1);
    assert!(app.world().get::<&Hidden>(hips).is_ok());
    assert!(app.shared().camera_view.first_person);
}

#[test]
fn input_mode_switch_goes_through_shared_state() {
    let mut app = app();
    app.shared_mut().input_mode.set(InputKind::Joystick);
    run(&mut app, &mut InputState::new(), 1);
    assert_eq!(app.input_kind(), InputKind::Joystick);
}

#[test]
fn stop_lock_holds_then_releases() {
    let mut app = app();
    let mut input = InputState::new();
    app.avatar_mut().set_stopped(true);
    input.press(Scancode::W);
    run(&mut app, &mut input, 60);
    assert!(app.avatar().stopped());
    let held = body_position(&app);
    assert!(held.z.abs() < 1e-4);

    app.avatar_mut().set_stopped(false);
    run(&mut app, &mut input, 30);
    assert_eq!(app.avatar().state().state(), LocomotionState::Move);
}

#[test]
fn headless_script_sees_every_frame_once() {
    let mut app = app();
    let mut seen = Vec::new();
    let frames = app.run_headless(2.5, DT, |frame, input| {
        seen.push(frame);
        if frame == 120 {
            input.press(Scancode::Space);
        }
    });
    assert_eq!(frames, 150);
    assert_eq!(app.frames(), 150);
    assert_eq!(seen, (0..150).collect::<Vec<u64>>());
    // The jump keyed at a whole frame number fired.
    assert_ne!(app.avatar().state().state(), LocomotionState::Idle);
}
