use std::time::Instant;

/// Wall-clock frame timer. `dt` is clamped so a stall (window drag, debugger)
/// does not feed one huge step into the state machine timers.
pub struct FrameTimer {
    last: Instant,
    pub dt: f32,
    pub max_dt: f32,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            dt: 0.0,
            max_dt: 0.1,
        }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        self.dt = now.duration_since(self.last).as_secs_f32().min(self.max_dt);
        self.last = now;
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}
