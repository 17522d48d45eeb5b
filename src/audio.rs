//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed!
//! Silent unless the site's sound setting is on.

use crate::sim::{GameEvent, GamePhase};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Collectible picked up
    Collect,
    /// Power-up taken or struck
    PowerUp,
    /// Hazard contact
    Hit,
    /// Target destroyed
    Squash,
    /// Jump started
    Jump,
    /// Tool dropped on its slot
    Place,
    /// Tool snapped back home
    Reject,
    /// Checkpoint activated
    Checkpoint,
    /// Fell and respawned
    Respawn,
    /// Game won
    Win,
    /// Game lost
    Lose,
    /// UI button press
    Click,
    /// UI button hover
    Hover,
}

impl SoundEffect {
    /// Sound for a simulation event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Collected { .. } => Some(SoundEffect::Collect),
            GameEvent::PowerUp { .. } => Some(SoundEffect::PowerUp),
            GameEvent::HazardHit { .. } => Some(SoundEffect::Hit),
            GameEvent::Struck { .. } => Some(SoundEffect::Squash),
            GameEvent::Jumped => Some(SoundEffect::Jump),
            GameEvent::Placed { .. } => Some(SoundEffect::Place),
            GameEvent::Rejected { .. } => Some(SoundEffect::Reject),
            GameEvent::CheckpointReached { .. } => Some(SoundEffect::Checkpoint),
            GameEvent::Respawned { .. } => Some(SoundEffect::Respawn),
            GameEvent::Transition { to, .. } => match to {
                GamePhase::Won => Some(SoundEffect::Win),
                GamePhase::Lost => Some(SoundEffect::Lose),
                GamePhase::Playing => None,
            },
            GameEvent::Missed
            | GameEvent::Split { .. }
            | GameEvent::Landed
            | GameEvent::ParticleBurst { .. } => None,
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::SoundEffect;
    use crate::sim::GameEvent;

    /// Audio manager for one mounted game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
        enabled: bool,
    }

    impl AudioManager {
        pub fn new(enabled: bool) -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.8,
                enabled,
            }
        }

        pub fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
            if enabled {
                self.resume();
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn play_events(&self, events: &[GameEvent]) {
            for effect in events.iter().filter_map(SoundEffect::for_event) {
                self.play(effect);
            }
        }

        /// Play a sound effect
        pub fn play(&self, effect: SoundEffect) {
            if !self.enabled {
                return;
            }
            let vol = self.master_volume;
            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Collect => self.arpeggio(ctx, vol, &[600.0, 800.0, 1000.0], 0.08, OscillatorType::Sine),
                SoundEffect::PowerUp => self.sweep(ctx, vol * 0.3, 300.0, 900.0, 0.25, OscillatorType::Triangle),
                SoundEffect::Hit => self.sweep(ctx, vol * 0.4, 200.0, 60.0, 0.2, OscillatorType::Square),
                SoundEffect::Squash => self.sweep(ctx, vol * 0.3, 500.0, 120.0, 0.1, OscillatorType::Triangle),
                SoundEffect::Jump => self.sweep(ctx, vol * 0.2, 200.0, 600.0, 0.15, OscillatorType::Triangle),
                SoundEffect::Place => self.arpeggio(ctx, vol, &[500.0, 750.0], 0.06, OscillatorType::Triangle),
                SoundEffect::Reject => self.sweep(ctx, vol * 0.3, 220.0, 110.0, 0.2, OscillatorType::Sawtooth),
                SoundEffect::Checkpoint => self.arpeggio(ctx, vol, &[400.0, 600.0, 800.0], 0.06, OscillatorType::Triangle),
                SoundEffect::Respawn => self.sweep(ctx, vol * 0.4, 300.0, 40.0, 0.5, OscillatorType::Sine),
                SoundEffect::Win => self.arpeggio(ctx, vol, &[400.0, 500.0, 600.0, 800.0], 0.1, OscillatorType::Triangle),
                SoundEffect::Lose => self.arpeggio(ctx, vol, &[400.0, 350.0, 300.0, 200.0], 0.2, OscillatorType::Sine),
                SoundEffect::Click => self.blip(ctx, 420.0, 0.06, 0.05),
                SoundEffect::Hover => self.blip(ctx, 880.0, 0.03, 0.04),
            }
        }

        // === Sound generators ===

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Single pitch glide with a fast decay
        fn sweep(&self, ctx: &AudioContext, gain_level: f32, from: f32, to: f32, secs: f64, osc_type: OscillatorType) {
            let Some((osc, gain)) = self.create_osc(ctx, from, osc_type) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(gain_level, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + secs)
                .ok();
            osc.frequency().set_value_at_time(from, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(to, t + secs)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + secs + 0.05).ok();
        }

        /// Notes one after another
        fn arpeggio(&self, ctx: &AudioContext, vol: f32, notes: &[f32], step: f64, osc_type: OscillatorType) {
            for (i, freq) in notes.iter().enumerate() {
                let delay = i as f64 * step;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, osc_type) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.25, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.2)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.25).ok();
                }
            }
        }

        /// Quiet UI tick at a fixed gain
        fn blip(&self, ctx: &AudioContext, freq: f32, gain_level: f32, secs: f64) {
            let Some((osc, gain)) = self.create_osc(ctx, freq, OscillatorType::Sine) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(gain_level, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.001, t + secs)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + secs).ok();
        }
    }
}
