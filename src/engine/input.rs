use glam::Vec2;
use sdl2::controller::Axis;
use sdl2::event::Event;
use sdl2::keyboard::Scancode;
use sdl2::EventPump;
use std::collections::HashSet;

/// Discrete input edges collected during one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyPressed(Scancode),
    KeyReleased(Scancode),
}

/// Raw per-frame input snapshot filled from the SDL event pump.
///
/// Handlers read `events` for edges and the stick vectors for analog input.
/// Nothing here knows about avatars.
#[derive(Debug, Default)]
pub struct InputState {
    pub keys: HashSet<Scancode>,
    pub events: Vec<InputEvent>,
    pub mouse_dx: f32,
    pub mouse_dy: f32,
    pub scroll_dy: f32,
    /// Left analog stick, x right / y forward, each in [-1, 1].
    pub left_stick: Vec2,
    /// Right analog stick, x right / y up, each in [-1, 1].
    pub right_stick: Vec2,
    quit: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame deltas and edges. Held keys and stick positions persist.
    pub fn begin_frame(&mut self) {
        self.events.clear();
        self.mouse_dx = 0.0;
        self.mouse_dy = 0.0;
        self.scroll_dy = 0.0;
    }

    pub fn update(&mut self, event_pump: &mut EventPump) {
        self.begin_frame();
        for event in event_pump.poll_iter() {
            self.apply_event(&event);
        }
    }

    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::Quit { .. } => self.quit = true,
            Event::KeyDown {
                scancode: Some(sc),
                repeat: false,
                ..
            } => self.press(*sc),
            Event::KeyUp {
                scancode: Some(sc), ..
            } => self.release(*sc),
            Event::MouseMotion { xrel, yrel, .. } => {
                self.mouse_dx += *xrel as f32;
                self.mouse_dy += *yrel as f32;
            }
            Event::MouseWheel { y, .. } => self.scroll_dy += *y as f32,
            Event::ControllerAxisMotion { axis, value, .. } => {
                let v = normalize_axis(*value);
                match axis {
                    Axis::LeftX => self.left_stick.x = v,
                    // SDL reports y growing downward.
                    Axis::LeftY => self.left_stick.y = -v,
                    Axis::RightX => self.right_stick.x = v,
                    Axis::RightY => self.right_stick.y = -v,
                    _ => {}
                }
            }
            _ => {}
        }
    }

    pub fn press(&mut self, sc: Scancode) {
        if self.keys.insert(sc) {
            self.events.push(InputEvent::KeyPressed(sc));
        }
    }

    pub fn release(&mut self, sc: Scancode) {
        if self.keys.remove(&sc) {
            self.events.push(InputEvent::KeyReleased(sc));
        }
    }

    pub fn is_key_held(&self, sc: Scancode) -> bool {
        self.keys.contains(&sc)
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }
}

fn normalize_axis(value: i16) -> f32 {
    (value as f32 / i16::MAX as f32).clamp(-1.0, 1.0)
}
