use anyhow::{anyhow, Result};
use sdl2::video::Window;
use sdl2::Sdl;

/// Plain SDL window used as the input focus target. Drawing is the
/// renderer's job and lives outside this crate.
pub struct GameWindow {
    window: Window,
}

impl GameWindow {
    pub fn new(sdl: &Sdl, title: &str, width: u32, height: u32) -> Result<Self> {
        let video = sdl.video().map_err(|e| anyhow!("failed to init SDL2 video: {e}"))?;
        let window = video
            .window(title, width, height)
            .position_centered()
            .resizable()
            .build()?;
        Ok(Self { window })
    }

    pub fn set_title(&mut self, title: &str) {
        // Only fails on interior NUL bytes, which our titles never contain.
        let _ = self.window.set_title(title);
    }

    pub fn size(&self) -> (u32, u32) {
        self.window.size()
    }
}
