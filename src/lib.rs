//! Neon Arcade - small canvas mini-games on one shared engine
//!
//! Core modules:
//! - `sim`: Simulation (world model, rule engine, tick, state machine)
//! - `games`: Data-driven game definitions (one JSON file per game)
//! - `driver`: Frame/clock loop driver
//! - `renderer`: 2D drawing surface abstraction and render pass
//! - `platform`: Input routing, scheduling and browser glue
//! - `settings`: Site-wide preferences passed in at mount

pub mod audio;
pub mod driver;
pub mod error;
pub mod games;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{ArcadeError, Result};
pub use games::{GameConfig, GameKind};
pub use settings::{QualityPreset, SettingsProvider, SiteSettings};

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Engine-wide constants
pub mod consts {
    /// Simulation rate the per-tick tuning values assume (one tick per display frame)
    pub const TICKS_PER_SECOND: u32 = 60;
    /// Milliseconds per tick at the nominal rate
    pub const TICK_MS: f32 = 1000.0 / TICKS_PER_SECOND as f32;

    /// Canvas never shrinks below this width
    pub const MIN_CANVAS_WIDTH: f32 = 500.0;
    /// Canvas height when the container reports none
    pub const DEFAULT_CANVAS_HEIGHT: f32 = 320.0;

    /// Hard particle cap (quality presets may lower it)
    pub const MAX_PARTICLES: usize = 500;
    /// Default particle life lost per tick
    pub const PARTICLE_FADE: f32 = 0.015;

    /// Checkpoint trigger box
    pub const CHECKPOINT_WIDTH: f32 = 20.0;
    pub const CHECKPOINT_HEIGHT: f32 = 40.0;

    /// Ticks a player is immune after an unshielded hazard hit
    pub const HAZARD_COOLDOWN_TICKS: u32 = 30;
    /// Combo survives this many ticks without a new hit
    pub const COMBO_WINDOW_TICKS: u32 = 120;
}

/// Convert a millisecond interval to whole ticks (at least one)
#[inline]
pub fn ms_to_ticks(ms: f32) -> u32 {
    ((ms / consts::TICK_MS).round() as u32).max(1)
}

/// Replace a non-finite value with `fallback`
#[inline]
pub fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

/// Replace a vector with any non-finite component with `fallback`
#[inline]
pub fn finite_vec_or(value: Vec2, fallback: Vec2) -> Vec2 {
    if value.is_finite() { value } else { fallback }
}

/// Packed 0xRRGGBB colour, written as `"#rrggbb"` in game data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xffffff);
    pub const BLACK: Color = Color(0x000000);

    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xff) as u8,
            ((self.0 >> 8) & 0xff) as u8,
            (self.0 & 0xff) as u8,
        )
    }

    /// CSS colour string; opaque colours use hex, translucent ones `rgba()`
    pub fn to_css(self, alpha: f32) -> String {
        let alpha = finite_or(alpha, 1.0).clamp(0.0, 1.0);
        if alpha >= 1.0 {
            return self.to_string();
        }
        let (r, g, b) = self.rgb();
        format!("rgba({r},{g},{b},{alpha:.3})")
    }

    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            6 => u32::from_str_radix(hex, 16).ok().map(Color),
            3 => {
                let short = u32::from_str_radix(hex, 16).ok()?;
                let (r, g, b) = ((short >> 8) & 0xf, (short >> 4) & 0xf, short & 0xf);
                Some(Color((r * 17) << 16 | (g * 17) << 8 | (b * 17)))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0 & 0xffffff)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Color::parse(&value).ok_or_else(|| format!("invalid colour {value:?}, expected #rrggbb"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}
