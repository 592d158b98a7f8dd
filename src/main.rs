use std::path::PathBuf;

use anyhow::{Context, Result};
use avatar_rig::app::AvatarApp;
use avatar_rig::config::Settings;
use avatar_rig::engine::window::GameWindow;
use avatar_rig::input::kind_for_user_agent;
use avatar_rig::logging::init_logging;
use clap::Parser;
use sdl2::keyboard::Scancode;
use tracing::info;

/// Fixed step for headless runs.
const HEADLESS_DT: f32 = 1.0 / 60.0;

#[derive(Parser)]
#[command(name = "avatar-rig", about = "Avatar locomotion and replication sandbox")]
struct Args {
    /// TOML settings file. Missing file means defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Picks keyboard or virtual joystick input.
    #[arg(long, default_value = "desktop")]
    user_agent: String,

    /// Run without a window for this many seconds of a scripted walk.
    #[arg(long)]
    headless: Option<f32>,

    /// Remote avatars to spawn.
    #[arg(long, default_value_t = 2)]
    remotes: usize,

    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write the effective settings to this path and exit.
    #[arg(long)]
    dump_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let settings = Settings::load_or_default(args.config.as_deref())?;
    if let Some(path) = &args.dump_config {
        settings.save(path)?;
        info!("settings written to {}", path.display());
        return Ok(());
    }

    let kind = kind_for_user_agent(&args.user_agent);
    let mut app = AvatarApp::new(&settings, kind, args.remotes)?;

    if let Some(seconds) = args.headless {
        // Walk forward, jump once, stop.
        let at = |secs: f32| (secs / HEADLESS_DT).round() as u64;
        let (jump, land, stop) = (at(2.0), at(2.5), at(4.0));
        app.run_headless(seconds, HEADLESS_DT, |frame, input| {
            if frame == 0 {
                input.press(Scancode::W);
            } else if frame == jump {
                input.press(Scancode::Space);
            } else if frame == land {
                input.release(Scancode::Space);
            } else if frame == stop {
                input.release(Scancode::W);
            }
        });
        return Ok(());
    }

    let sdl = sdl2::init()
        .map_err(anyhow::Error::msg)
        .context("failed to init SDL2")?;
    let mut window = GameWindow::new(&sdl, "avatar-rig", 1280, 720)?;
    app.run(&sdl, &mut window)
}
