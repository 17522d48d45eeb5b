//! Simulation loop driver
//!
//! Owns one session and runs it: one tick plus one render per display frame,
//! the game clock once per second. Generic over the scheduler so the same
//! loop runs in the browser, in the native runner and in tests.

use std::sync::Arc;

use glam::Vec2;
use serde::Serialize;

use crate::error::Result;
use crate::games::GameConfig;
use crate::platform::{FrameScheduler, InputRouter};
use crate::renderer::{self, Surface};
use crate::settings::{QualityPreset, SiteSettings};
use crate::sim::{self, Effect, GameEvent, GamePhase, Session};

/// Frames in a row without a surface before the loop gives up
const MAX_MISSED_SURFACES: u32 = 60;

/// Host-facing copy of the numbers the page shows next to the canvas
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub phase: GamePhase,
    pub time_left: Option<u32>,
    pub score: u32,
    pub collected: u32,
    pub total: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub deaths: u32,
    pub checkpoint: usize,
    pub checkpoints: usize,
    pub effects: Vec<Effect>,
}

impl HudSnapshot {
    pub fn of(session: &Session) -> Self {
        let (collected, total) = if session.config.win == crate::games::WinCondition::FillSlots {
            let (filled, total) = session.slots_filled();
            (filled as u32, total as u32)
        } else {
            (session.collected, session.total_collectibles)
        };
        Self {
            phase: session.phase,
            time_left: session.time_left,
            score: session.score,
            collected,
            total,
            combo: session.combo,
            max_combo: session.max_combo,
            deaths: session.deaths,
            checkpoint: session.current_checkpoint,
            checkpoints: session.checkpoints.len(),
            effects: session.player.effects.active(),
        }
    }
}

pub struct LoopDriver<S: FrameScheduler> {
    session: Session,
    input: InputRouter,
    scheduler: S,
    settings: SiteSettings,
    hud: HudSnapshot,
    running: bool,
    clock_running: bool,
    missed_surfaces: u32,
}

impl<S: FrameScheduler> LoopDriver<S> {
    pub fn new(
        config: Arc<GameConfig>,
        viewport: Vec2,
        seed: u64,
        scheduler: S,
        settings: SiteSettings,
    ) -> Self {
        let input = InputRouter::new(&config.controls);
        let mut session = Session::new(config, viewport, seed);
        session.set_max_particles(settings.max_particles());
        let hud = HudSnapshot::of(&session);
        Self {
            session,
            input,
            scheduler,
            settings,
            hud,
            running: false,
            clock_running: false,
            missed_surfaces: 0,
        }
    }

    /// Begin frame and clock callbacks; no-op when already running
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            return Ok(());
        }
        self.scheduler.request_frame()?;
        self.running = true;
        if self.session.time_left.is_some() && !self.session.phase.is_terminal() {
            if let Err(e) = self.scheduler.start_clock() {
                self.stop();
                return Err(e);
            }
            self.clock_running = true;
        }
        log::info!("Loop started: {}", self.session.config.name);
        Ok(())
    }

    /// Cancel frame and clock callbacks; safe to call repeatedly
    pub fn stop(&mut self) {
        if self.running {
            self.scheduler.cancel_frame();
            self.running = false;
        }
        self.stop_clock();
    }

    fn stop_clock(&mut self) {
        if self.clock_running {
            self.scheduler.stop_clock();
            self.clock_running = false;
        }
    }

    /// One display frame: tick, particles, render, schedule the next frame.
    /// Returns the events the tick produced.
    pub fn on_frame(&mut self, time_ms: f64, surface: Option<&mut dyn Surface>) -> Vec<GameEvent> {
        if !self.running {
            return Vec::new();
        }

        let input = self.input.tick_input(self.session.viewport);
        sim::tick(&mut self.session, &input);
        self.input.end_frame();
        renderer::advance_particles(&mut self.session.particles, self.session.config.particles.fade);

        let events = self.session.drain_events();
        self.after_events(&events);

        match surface {
            Some(surface) => {
                if self.missed_surfaces > 0 {
                    log::info!("Drawing surface back");
                    self.missed_surfaces = 0;
                }
                renderer::render_frame(surface, &self.session, &self.settings, time_ms);
            }
            None => {
                if self.missed_surfaces == 0 {
                    log::warn!("Drawing surface unavailable, skipping render");
                }
                self.missed_surfaces += 1;
                if self.missed_surfaces >= MAX_MISSED_SURFACES {
                    log::warn!("Drawing surface gone, loop stopped");
                    self.stop();
                    return events;
                }
            }
        }

        if self.session.phase.is_terminal() {
            // final overlay is on screen
            self.stop();
        } else if let Err(e) = self.scheduler.request_frame() {
            log::warn!("Frame request failed, loop halted: {e}");
            self.stop();
        }
        events
    }

    /// One wall-clock second
    pub fn on_second(&mut self) -> Vec<GameEvent> {
        if !self.running || !self.clock_running {
            return Vec::new();
        }
        sim::tick_second(&mut self.session);
        let events = self.session.drain_events();
        self.after_events(&events);
        self.hud = HudSnapshot::of(&self.session);
        events
    }

    fn after_events(&mut self, events: &[GameEvent]) {
        for event in events {
            log::debug!("{event:?}");
        }
        if events
            .iter()
            .any(|e| matches!(e, GameEvent::Transition { .. }))
        {
            self.hud = HudSnapshot::of(&self.session);
            self.stop_clock();
        }
    }

    /// Fresh session with a new seed, then restart the loop
    pub fn replay(&mut self, seed: u64) -> Result<()> {
        self.stop();
        let config = self.session.config.clone();
        let viewport = self.session.viewport;
        self.session = Session::new(config, viewport, seed);
        self.session.set_max_particles(self.settings.max_particles());
        self.input.reset();
        self.missed_surfaces = 0;
        self.hud = HudSnapshot::of(&self.session);
        log::info!("Replay: {}", self.session.config.name);
        self.start()
    }

    /// Render without advancing (resize, surface regained)
    pub fn redraw(&self, surface: &mut dyn Surface, time_ms: f64) {
        renderer::render_frame(surface, &self.session, &self.settings, time_ms);
    }

    pub fn resize(&mut self, viewport: Vec2) {
        self.session.set_viewport(viewport);
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.settings.sound_enabled = enabled;
    }

    /// Switch quality mid-game; surplus particles are dropped at once
    pub fn set_quality(&mut self, quality: QualityPreset) {
        self.settings.quality = quality;
        self.session.set_max_particles(self.settings.max_particles());
        log::info!("Quality: {}", quality.as_str());
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn hud(&self) -> &HudSnapshot {
        &self.hud
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn settings(&self) -> &SiteSettings {
        &self.settings
    }

    pub fn input(&self) -> &InputRouter {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputRouter {
        &mut self.input
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

impl<S: FrameScheduler> Drop for LoopDriver<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
