use std::collections::HashMap;

use tracing::{debug, warn};

use crate::components::Action;
use crate::config::AnimationSettings;

/// Frame rate the clip windows below are authored at.
pub const REFERENCE_FPS: f32 = 30.0;

/// Clip played when an action's own clip is missing.
pub const FALLBACK_CLIP: &str = "idle02";

// ---------------------------------------------------------------------------
// Action -> clip table
// ---------------------------------------------------------------------------

/// How one action is animated. `window` is `(from, to)` in reference frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipEntry {
    pub name: &'static str,
    pub looping: bool,
    pub window: Option<(f32, f32)>,
}

const fn looped(name: &'static str) -> ClipEntry {
    ClipEntry { name, looping: true, window: None }
}

const fn once(name: &'static str, from: f32, to: f32) -> ClipEntry {
    ClipEntry { name, looping: false, window: Some((from, to)) }
}

pub fn clip_for(action: Action) -> ClipEntry {
    match action {
        Action::Idle => looped("idle02"),
        Action::WalkForward => looped("walk_fwd"),
        Action::WalkBackward => looped("walk_bwd"),
        Action::WalkLeft => looped("walk_left"),
        Action::WalkRight => looped("walk_right"),
        Action::TurnLeft => looped("turn_left"),
        Action::TurnRight => looped("turn_right"),
        Action::RunForward => looped("run_fwd"),
        Action::Jump => once("jump", 8.0, 32.0),
        Action::Land => once("land", 4.0, 40.0),
        Action::Fly => looped("fly"),
        Action::FlyFast => looped("fly_fast"),
        Action::Sit => looped("sit"),
        Action::SitOnGround => looped("sit_ground"),
        Action::Clap => ClipEntry { name: "clap", looping: true, window: Some((0.0, 24.0)) },
        Action::Salute => once("salute", 0.0, 45.0),
    }
}

// ---------------------------------------------------------------------------
// Clip library
// ---------------------------------------------------------------------------

/// Named clips available on an avatar model, with their lengths in
/// reference frames.
#[derive(Debug, Clone, Default)]
pub struct ClipLibrary {
    clips: HashMap<String, f32>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every clip the action table refers to.
    pub fn standard() -> Self {
        let mut library = Self::new();
        for (name, frames) in [
            ("idle02", 120.0),
            ("walk_fwd", 32.0),
            ("walk_bwd", 32.0),
            ("walk_left", 36.0),
            ("walk_right", 36.0),
            ("turn_left", 28.0),
            ("turn_right", 28.0),
            ("run_fwd", 22.0),
            ("jump", 40.0),
            ("land", 48.0),
            ("fly", 60.0),
            ("fly_fast", 60.0),
            ("sit", 90.0),
            ("sit_ground", 90.0),
            ("clap", 48.0),
            ("salute", 60.0),
        ] {
            library.insert(name, frames);
        }
        library
    }

    pub fn insert(&mut self, name: impl Into<String>, frames: f32) {
        self.clips.insert(name.into(), frames);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    pub fn frames(&self, name: &str) -> Option<f32> {
        self.clips.get(name).copied()
    }
}

// ---------------------------------------------------------------------------
// Blender
// ---------------------------------------------------------------------------

/// One clip being played, in engine frames.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPlayback {
    pub name: String,
    pub from: f32,
    pub to: f32,
    pub frame: f32,
    pub looping: bool,
    pub weight: f32,
    ended: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnimationEvent {
    ClipEnded(String),
}

/// Cross-fades from the previous clip to the current one.
///
/// The incoming clip's weight rises linearly by `blend_speed * dt` until it
/// reaches 1, the outgoing clip gets the rest. Windows authored at
/// [`REFERENCE_FPS`] are rescaled to the engine tick rate.
#[derive(Debug, Clone)]
pub struct AnimationBlender {
    library: ClipLibrary,
    engine_fps: f32,
    blend_speed: f32,
    action: Option<Action>,
    current: Option<ClipPlayback>,
    previous: Option<ClipPlayback>,
}

impl AnimationBlender {
    pub fn new(library: ClipLibrary, settings: &AnimationSettings) -> Self {
        Self {
            library,
            engine_fps: settings.engine_fps,
            blend_speed: settings.blend_speed,
            action: None,
            current: None,
            previous: None,
        }
    }

    pub fn action(&self) -> Option<Action> {
        self.action
    }

    pub fn current(&self) -> Option<&ClipPlayback> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&ClipPlayback> {
        self.previous.as_ref()
    }

    /// Reference-rate frame remapped to engine frames.
    pub fn to_engine_frames(&self, reference_frames: f32) -> f32 {
        reference_frames * self.engine_fps / REFERENCE_FPS
    }

    /// Switch to the clip for `action`. Re-selecting the playing action is a
    /// no-op.
    pub fn play(&mut self, action: Action) {
        if self.action == Some(action) {
            return;
        }
        let entry = clip_for(action);
        let name = if self.library.contains(entry.name) {
            entry.name
        } else {
            warn!(clip = entry.name, ?action, fallback = FALLBACK_CLIP, "missing animation clip");
            FALLBACK_CLIP
        };
        self.action = Some(action);

        let Some(length) = self.library.frames(name) else {
            self.previous = self.current.take();
            return;
        };
        // A fallback clip plays whole and looped.
        let (from, to, looping) = match (name == entry.name, entry.window) {
            (true, Some((from, to))) => (from, to.min(length), entry.looping),
            (true, None) => (0.0, length, entry.looping),
            (false, _) => (0.0, length, true),
        };

        debug!(?action, clip = name, "animation switch");
        let incoming = ClipPlayback {
            name: name.to_string(),
            from: self.to_engine_frames(from),
            to: self.to_engine_frames(to),
            frame: self.to_engine_frames(from),
            looping,
            weight: if self.current.is_some() { 0.0 } else { 1.0 },
            ended: false,
        };
        self.previous = self.current.replace(incoming);
    }

    /// Advance playback and blend weights by `dt` seconds.
    pub fn advance(&mut self, dt: f32) -> Vec<AnimationEvent> {
        let mut events = Vec::new();
        let step = self.engine_fps * dt;

        if let Some(current) = self.current.as_mut() {
            current.weight = (current.weight + self.blend_speed * dt).min(1.0);
            if advance_clip(current, step) {
                events.push(AnimationEvent::ClipEnded(current.name.clone()));
            }
        }
        let incoming_weight = self.current.as_ref().map_or(1.0, |c| c.weight);
        if let Some(previous) = self.previous.as_mut() {
            previous.weight = 1.0 - incoming_weight;
            advance_clip(previous, step);
        }
        if incoming_weight >= 1.0 {
            self.previous = None;
        }
        events
    }
}

/// Returns `true` the first time a one-shot clip reaches its end.
fn advance_clip(clip: &mut ClipPlayback, frames: f32) -> bool {
    let span = clip.to - clip.from;
    if span <= 0.0 {
        return false;
    }
    clip.frame += frames;
    if clip.frame < clip.to {
        return false;
    }
    if clip.looping {
        clip.frame = clip.from + (clip.frame - clip.from) % span;
        false
    } else {
        clip.frame = clip.to;
        !std::mem::replace(&mut clip.ended, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(fps: f32) -> AnimationSettings {
        AnimationSettings { engine_fps: fps, blend_speed: 4.0 }
    }

    #[test]
    fn windows_rescale_to_engine_rate() {
        let mut blender = AnimationBlender::new(ClipLibrary::standard(), &settings(60.0));
        blender.play(Action::Land);
        let land = blender.current().unwrap();
        assert_eq!(land.name, "land");
        assert_eq!((land.from, land.to), (8.0, 80.0));
        assert!(!land.looping);
    }

    #[test]
    fn missing_clip_falls_back_to_idle() {
        let mut library = ClipLibrary::new();
        library.insert("idle02", 120.0);
        let mut blender = AnimationBlender::new(library, &settings(30.0));
        blender.play(Action::Salute);
        let clip = blender.current().unwrap();
        assert_eq!(clip.name, FALLBACK_CLIP);
        assert!(clip.looping);
        assert_eq!(blender.action(), Some(Action::Salute));
    }

    #[test]
    fn weight_rises_linearly_then_drops_previous() {
        let mut blender = AnimationBlender::new(ClipLibrary::standard(), &settings(30.0));
        blender.play(Action::Idle);
        assert_eq!(blender.current().unwrap().weight, 1.0);

        blender.play(Action::WalkForward);
        blender.advance(0.125);
        assert_eq!(blender.current().unwrap().weight, 0.5);
        assert_eq!(blender.previous().unwrap().weight, 0.5);

        blender.advance(0.125);
        assert_eq!(blender.current().unwrap().weight, 1.0);
        assert!(blender.previous().is_none());
    }

    #[test]
    fn replaying_same_action_keeps_progress() {
        let mut blender = AnimationBlender::new(ClipLibrary::standard(), &settings(30.0));
        blender.play(Action::Idle);
        blender.advance(0.5);
        let frame = blender.current().unwrap().frame;
        blender.play(Action::Idle);
        assert_eq!(blender.current().unwrap().frame, frame);
    }

    #[test]
    fn one_shot_clip_ends_once() {
        let mut blender = AnimationBlender::new(ClipLibrary::standard(), &settings(30.0));
        blender.play(Action::Land);
        // 36 reference frames at 30fps.
        let mut ended = 0;
        for _ in 0..20 {
            ended += blender
                .advance(0.25)
                .iter()
                .filter(|e| **e == AnimationEvent::ClipEnded("land".into()))
                .count();
        }
        assert_eq!(ended, 1);
        assert_eq!(blender.current().unwrap().frame, 40.0);
    }

    #[test]
    fn looping_clip_wraps_inside_window() {
        let mut blender = AnimationBlender::new(ClipLibrary::standard(), &settings(30.0));
        blender.play(Action::Clap);
        let events = blender.advance(1.0);
        assert!(events.is_empty());
        let clip = blender.current().unwrap();
        assert_eq!(clip.frame, 6.0);
    }
}
