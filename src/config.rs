use std::f32::consts::PI;
use std::fs;
use std::path::Path;

use sdl2::keyboard::Scancode;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// All tunables for the avatar controllers. Passed into constructors; nothing
/// reads settings from a global.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub avatar: AvatarSettings,
    pub camera: CameraSettings,
    pub interaction: InteractionSettings,
    pub input: InputSettings,
    pub animation: AnimationSettings,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = toml::from_str(&text)?;
        // Surface bad key names at load time rather than on first keypress.
        settings.input.bindings.resolve()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Missing file means defaults; a present but broken file is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            Some(p) => {
                tracing::info!("config {} not found, using defaults", p.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }
}

/// Locomotion speeds in m/s and the jump impulse in N·s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarSettings {
    pub walk_speed: f32,
    pub run_speed: f32,
    pub land_speed: f32,
    pub fly_speed: f32,
    pub fast_fly_speed: f32,
    pub ascend_speed: f32,
    pub fast_ascend_speed: f32,
    pub jump_impulse: f32,
}

impl Default for AvatarSettings {
    fn default() -> Self {
        Self {
            walk_speed: 1.8,
            run_speed: 4.5,
            land_speed: 0.5,
            fly_speed: 5.0,
            fast_fly_speed: 12.0,
            ascend_speed: 2.0,
            fast_ascend_speed: 6.0,
            jump_impulse: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Orbit angle around +Y, radians. `-PI/2` puts the camera behind the avatar.
    pub default_alpha: f32,
    /// Polar angle from +Y, radians.
    pub default_beta: f32,
    pub default_radius: f32,
    /// Radius used when switching into first person.
    pub first_person_radius: f32,
    /// In third person, radius at or below this switches to first person.
    pub first_person_enter_radius: f32,
    /// In first person, radius must exceed this to switch back.
    pub first_person_exit_radius: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    pub min_beta: f32,
    pub max_beta: f32,
    /// Height of the follow target above the avatar root.
    pub follow_height: f32,
    /// Decay rate of the follow-height smoother, 1/s.
    pub follow_smoothing: f32,
    /// Follow the raw root height so the camera bobs with the avatar.
    pub camera_bobbing: bool,
    pub collision_checking: bool,
    pub elastic_camera: bool,
    pub obstacle_probe_interval: f32,
    /// Distance kept from an obstruction along its surface normal.
    pub hit_normal_offset: f32,
    /// Fraction of inertial rotation kept per tick.
    pub inertia: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            default_alpha: -PI / 2.0,
            default_beta: 1.35,
            default_radius: 3.5,
            first_person_radius: 0.1,
            first_person_enter_radius: 0.6,
            first_person_exit_radius: 1.0,
            min_radius: 0.1,
            max_radius: 12.0,
            min_beta: 0.1,
            max_beta: PI - 0.1,
            follow_height: 1.6,
            follow_smoothing: 6.0,
            camera_bobbing: false,
            collision_checking: true,
            elastic_camera: true,
            obstacle_probe_interval: 0.5,
            hit_normal_offset: 0.2,
            inertia: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionSettings {
    /// Sit targets further than this from the avatar are ignored.
    pub sit_radius: f32,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self { sit_radius: 2.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    pub bindings: KeyBindings,
    /// Per-tick lerp factor for keyboard movement axes.
    pub axis_smoothing: f32,
    pub joystick_dead_zone: f32,
    /// Camera rotation rate from the right stick at full deflection, rad/s.
    pub joystick_camera_speed: f32,
    /// Camera rotation rate from the camera-rotation keys, rad/s.
    pub key_camera_speed: f32,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            bindings: KeyBindings::default(),
            axis_smoothing: 0.2,
            joystick_dead_zone: 0.15,
            joystick_camera_speed: 2.0,
            key_camera_speed: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Engine tick rate. Clip windows authored at 30 fps are rescaled to it.
    pub engine_fps: f32,
    /// Cross-fade weight gained per second.
    pub blend_speed: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            engine_fps: 60.0,
            blend_speed: 4.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Key bindings
// ---------------------------------------------------------------------------

/// Key names as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub forward: Vec<String>,
    pub backward: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub turn_left: Vec<String>,
    pub turn_right: Vec<String>,
    pub ascend: Vec<String>,
    pub descend: Vec<String>,
    pub jump: Vec<String>,
    pub fly: Vec<String>,
    pub run: Vec<String>,
    pub sit: Vec<String>,
    pub clap: Vec<String>,
    pub salute: Vec<String>,
    pub camera_mode: Vec<String>,
    pub collision_toggle: Vec<String>,
    pub mute: Vec<String>,
    pub push_to_talk: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: names(&["W", "Up"]),
            backward: names(&["S", "Down"]),
            left: names(&["A"]),
            right: names(&["D"]),
            turn_left: names(&["Left"]),
            turn_right: names(&["Right"]),
            ascend: names(&["E", "PageUp"]),
            descend: names(&["Q", "PageDown"]),
            jump: names(&["Space"]),
            fly: names(&["F"]),
            run: names(&["AnyShift"]),
            sit: names(&["C"]),
            clap: names(&["1"]),
            salute: names(&["2"]),
            camera_mode: names(&["V"]),
            collision_toggle: names(&["K"]),
            mute: names(&["M"]),
            push_to_talk: names(&["T"]),
        }
    }
}

/// A resolved binding: one physical key, or either shift key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyBinding {
    Key(Scancode),
    AnyShift,
}

impl KeyBinding {
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        if name.eq_ignore_ascii_case("AnyShift") {
            return Ok(Self::AnyShift);
        }
        // SDL key names, matched case-insensitively ("Left Shift", "F11", "Keypad 5").
        Scancode::from_name(name.trim())
            .map(Self::Key)
            .ok_or_else(|| ConfigError::UnknownKey(name.to_string()))
    }

    pub fn matches(&self, sc: Scancode) -> bool {
        match self {
            Self::Key(k) => *k == sc,
            Self::AnyShift => matches!(sc, Scancode::LShift | Scancode::RShift),
        }
    }
}

/// Bindings resolved to scancodes, ready for the keyboard handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Keymap {
    pub forward: Vec<KeyBinding>,
    pub backward: Vec<KeyBinding>,
    pub left: Vec<KeyBinding>,
    pub right: Vec<KeyBinding>,
    pub turn_left: Vec<KeyBinding>,
    pub turn_right: Vec<KeyBinding>,
    pub ascend: Vec<KeyBinding>,
    pub descend: Vec<KeyBinding>,
    pub jump: Vec<KeyBinding>,
    pub fly: Vec<KeyBinding>,
    pub run: Vec<KeyBinding>,
    pub sit: Vec<KeyBinding>,
    pub clap: Vec<KeyBinding>,
    pub salute: Vec<KeyBinding>,
    pub camera_mode: Vec<KeyBinding>,
    pub collision_toggle: Vec<KeyBinding>,
    pub mute: Vec<KeyBinding>,
    pub push_to_talk: Vec<KeyBinding>,
}

pub fn bound(bindings: &[KeyBinding], sc: Scancode) -> bool {
    bindings.iter().any(|b| b.matches(sc))
}

impl KeyBindings {
    pub fn resolve(&self) -> Result<Keymap, ConfigError> {
        let r = |list: &[String]| -> Result<Vec<KeyBinding>, ConfigError> {
            list.iter().map(|n| KeyBinding::parse(n)).collect()
        };
        Ok(Keymap {
            forward: r(&self.forward)?,
            backward: r(&self.backward)?,
            left: r(&self.left)?,
            right: r(&self.right)?,
            turn_left: r(&self.turn_left)?,
            turn_right: r(&self.turn_right)?,
            ascend: r(&self.ascend)?,
            descend: r(&self.descend)?,
            jump: r(&self.jump)?,
            fly: r(&self.fly)?,
            run: r(&self.run)?,
            sit: r(&self.sit)?,
            clap: r(&self.clap)?,
            salute: r(&self.salute)?,
            camera_mode: r(&self.camera_mode)?,
            collision_toggle: r(&self.collision_toggle)?,
            mute: r(&self.mute)?,
            push_to_talk: r(&self.push_to_talk)?,
        })
    }
}

impl Default for Keymap {
    fn default() -> Self {
        use KeyBinding::{AnyShift, Key};
        Self {
            forward: vec![Key(Scancode::W), Key(Scancode::Up)],
            backward: vec![Key(Scancode::S), Key(Scancode::Down)],
            left: vec![Key(Scancode::A)],
            right: vec![Key(Scancode::D)],
            turn_left: vec![Key(Scancode::Left)],
            turn_right: vec![Key(Scancode::Right)],
            ascend: vec![Key(Scancode::E), Key(Scancode::PageUp)],
            descend: vec![Key(Scancode::Q), Key(Scancode::PageDown)],
            jump: vec![Key(Scancode::Space)],
            fly: vec![Key(Scancode::F)],
            run: vec![AnyShift],
            sit: vec![Key(Scancode::C)],
            clap: vec![Key(Scancode::Num1)],
            salute: vec![Key(Scancode::Num2)],
            camera_mode: vec![Key(Scancode::V)],
            collision_toggle: vec![Key(Scancode::K)],
            mute: vec![Key(Scancode::M)],
            push_to_talk: vec![Key(Scancode::T)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve() {
        let keymap = Keymap::default();
        assert!(bound(&keymap.forward, Scancode::W));
        assert!(bound(&keymap.run, Scancode::RShift));
        assert!(bound(&keymap.run, Scancode::LShift));
        assert!(!bound(&keymap.run, Scancode::W));
    }

    #[test]
    fn default_names_resolve_to_default_keymap() {
        assert_eq!(KeyBindings::default().resolve().unwrap(), Keymap::default());
    }

    #[test]
    fn any_sdl_key_name_binds() {
        assert_eq!(KeyBinding::parse("F11").unwrap(), KeyBinding::Key(Scancode::F11));
        assert_eq!(KeyBinding::parse("anyshift").unwrap(), KeyBinding::AnyShift);
        assert!(KeyBinding::parse("Keypad 5").is_ok());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut bindings = KeyBindings::default();
        bindings.jump = vec!["Hyperspace".into()];
        assert!(matches!(
            bindings.resolve(),
            Err(ConfigError::UnknownKey(name)) if name == "Hyperspace"
        ));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let text = r#"
            [avatar]
            walk_speed = 2.5

            [input.bindings]
            run = ["Left Shift"]
        "#;
        let settings: Settings = toml::from_str(text).unwrap();
        assert_eq!(settings.avatar.walk_speed, 2.5);
        assert_eq!(settings.avatar.run_speed, AvatarSettings::default().run_speed);
        let keymap = settings.input.bindings.resolve().unwrap();
        assert_eq!(keymap.run, vec![KeyBinding::Key(Scancode::LShift)]);
        assert_eq!(keymap.jump, vec![KeyBinding::Key(Scancode::Space)]);
    }

    #[test]
    fn settings_survive_a_toml_round_trip() {
        let mut settings = Settings::default();
        settings.camera.camera_bobbing = true;
        let text = toml::to_string_pretty(&settings).unwrap();
        let back: Settings = toml::from_str(&text).unwrap();
        assert_eq!(back, settings);
    }
}
