//! Neon Arcade entry point
//!
//! On the web this only sets up logging; pages mount games through
//! `ArcadeMount`. Natively it plays every game headless with a scripted
//! autopilot and logs how each one ends.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("logger init failed: {e}").into());
    }
    neon_arcade::platform::web::init_site();
    log::info!("Neon Arcade ready");
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Neon Arcade (native) - headless run of every game");
    log::info!("Build for wasm32 to play in a browser");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(7);

    for kind in neon_arcade::GameKind::ALL {
        match headless::play(kind, seed) {
            Ok(report) => println!("{report}"),
            Err(e) => eprintln!("{}: {e}", kind.id()),
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::sync::Arc;

    use glam::Vec2;
    use neon_arcade::consts::{DEFAULT_CANVAS_HEIGHT, MIN_CANVAS_WIDTH, TICKS_PER_SECOND};
    use neon_arcade::driver::LoopDriver;
    use neon_arcade::games::ControlScheme;
    use neon_arcade::platform::ManualScheduler;
    use neon_arcade::renderer::RecordingSurface;
    use neon_arcade::sim::{ObjectKind, PlatformKind, Session};
    use neon_arcade::{GameKind, Result, SiteSettings};

    /// Give up on games that never end on their own
    const MAX_SECONDS: u32 = 180;

    pub fn play(kind: GameKind, seed: u64) -> Result<String> {
        let config = Arc::new(kind.config()?);
        let viewport = Vec2::new(MIN_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT);
        let mut driver = LoopDriver::new(
            config,
            viewport,
            seed,
            ManualScheduler::new(),
            SiteSettings::default(),
        );
        let mut surface = RecordingSurface::new(viewport);
        driver.start()?;

        let mut frame: u32 = 0;
        let mut events = 0usize;
        while driver.scheduler_mut().take_frame() && frame < MAX_SECONDS * TICKS_PER_SECOND {
            steer(&mut driver, frame);
            surface.reset();
            events += driver.on_frame(frame as f64 * 1000.0 / 60.0, Some(&mut surface)).len();
            frame += 1;
            if frame % TICKS_PER_SECOND == 0 {
                events += driver.on_second().len();
            }
        }
        driver.stop();

        let s = driver.session();
        Ok(format!(
            "{:<14} {:?} after {:>5} frames  score {:>5}  collected {:>3}  deaths {:>2}  events {events}",
            kind.id(),
            s.phase,
            frame,
            s.score,
            s.collected,
            s.deaths,
        ))
    }

    fn steer(driver: &mut LoopDriver<ManualScheduler>, frame: u32) {
        let config = driver.session().config.clone();
        let session = driver.session();
        match &config.controls {
            ControlScheme::TopDown { .. } => {
                let goal = nearest(session, |k| matches!(k, ObjectKind::Collectible));
                let delta = goal.map_or(Vec2::ZERO, |g| g - session.player.center());
                let input = driver.input_mut();
                for (code, on) in [
                    ("ArrowLeft", delta.x < -2.0),
                    ("ArrowRight", delta.x > 2.0),
                    ("ArrowUp", delta.y < -2.0),
                    ("ArrowDown", delta.y > 2.0),
                ] {
                    if on {
                        input.key_down(code, "");
                    } else {
                        input.key_up(code, "");
                    }
                }
            }
            ControlScheme::Platformer(_) => {
                let input = driver.input_mut();
                input.key_down("ArrowRight", "");
                if frame % 40 == 0 {
                    input.key_down("Space", "");
                } else if frame % 40 == 10 {
                    input.key_up("Space", "");
                }
            }
            ControlScheme::Pointer { .. } => {
                let target = nearest(session, |k| matches!(k, ObjectKind::Target { .. }));
                let input = driver.input_mut();
                match (frame % 12, target) {
                    (0, Some(at)) => input.pointer_down(at),
                    (1, _) => input.pointer_up(None),
                    (_, Some(at)) => input.pointer_move(at),
                    _ => {}
                }
            }
            ControlScheme::DragDrop { .. } => {
                let Some((from, to)) = next_placement(session) else {
                    return;
                };
                let input = driver.input_mut();
                match frame % 6 {
                    0 => input.pointer_down(from),
                    2 => input.pointer_move(to),
                    4 => input.pointer_up(Some(to)),
                    _ => {}
                }
            }
        }
    }

    fn nearest(session: &Session, wanted: impl Fn(&ObjectKind) -> bool) -> Option<Vec2> {
        let me = session.player.center();
        session
            .objects
            .iter()
            .filter(|o| o.active && wanted(&o.kind))
            .map(|o| o.pos)
            .min_by(|a, b| a.distance_squared(me).total_cmp(&b.distance_squared(me)))
    }

    /// First unplaced tool and the centre of the slot that takes it
    fn next_placement(session: &Session) -> Option<(Vec2, Vec2)> {
        session.objects.iter().find_map(|o| {
            let ObjectKind::Draggable { tool, placed: false } = &o.kind else {
                return None;
            };
            session.platforms.iter().find_map(|p| match &p.kind {
                PlatformKind::Slot {
                    accepts,
                    filled: None,
                } if accepts == tool => Some((o.pos, p.rect.center())),
                _ => None,
            })
        })
    }
}
