//! 2D rendering module
//!
//! Draws a `Session` onto any `Surface`. The web build implements `Surface`
//! over a Canvas2D context; tests use `RecordingSurface`.
//!
//! Pass order: background, world (platforms, checkpoints, objects, player),
//! particles, HUD, then the end-of-game overlay.

mod background;
mod hud;
mod particles;
pub mod shapes;
mod sprites;

pub use hud::{draw_joystick, hud_lines, overlay_lines};
pub use particles::advance_particles;

use glam::Vec2;

use crate::Color;
use crate::settings::SiteSettings;
use crate::sim::{Aabb, Session};

/// Horizontal text anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub color: Color,
    pub alpha: f32,
    pub align: TextAlign,
    pub bold: bool,
}

impl TextStyle {
    pub fn new(size: f32, color: Color) -> Self {
        Self {
            size,
            color,
            alpha: 1.0,
            align: TextAlign::Left,
            bold: false,
        }
    }

    pub fn centered(mut self) -> Self {
        self.align = TextAlign::Center;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// Immediate-mode 2D drawing target in canvas pixels
pub trait Surface {
    /// Drawable size in pixels
    fn size(&self) -> Vec2;

    fn clear(&mut self, color: Color);

    fn fill_rect(&mut self, rect: Aabb, color: Color, alpha: f32);

    fn stroke_rect(&mut self, rect: Aabb, color: Color, alpha: f32, width: f32);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color, alpha: f32);

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color, alpha: f32, width: f32);

    fn fill_polygon(&mut self, points: &[Vec2], color: Color, alpha: f32);

    fn line(&mut self, from: Vec2, to: Vec2, color: Color, alpha: f32, width: f32);

    fn text(&mut self, text: &str, at: Vec2, style: &TextStyle);

    /// Shadow glow for following draws; `None` turns it off
    fn set_glow(&mut self, color: Option<Color>, blur: f32);
}

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    FillRect { rect: Aabb, color: Color, alpha: f32 },
    StrokeRect { rect: Aabb, color: Color },
    FillCircle { center: Vec2, radius: f32, color: Color, alpha: f32 },
    StrokeCircle { center: Vec2, radius: f32, color: Color },
    Polygon { points: usize, color: Color },
    Line { from: Vec2, to: Vec2, color: Color },
    Text { text: String, at: Vec2 },
    Glow(Option<Color>),
}

/// Surface that records draw calls instead of drawing
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: Vec2,
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_text(&self, needle: &str) -> bool {
        self.texts().iter().any(|t| t.contains(needle))
    }

    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    pub fn reset(&mut self) {
        self.commands.clear();
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill_rect(&mut self, rect: Aabb, color: Color, alpha: f32) {
        self.commands.push(DrawCommand::FillRect { rect, color, alpha });
    }

    fn stroke_rect(&mut self, rect: Aabb, color: Color, _alpha: f32, _width: f32) {
        self.commands.push(DrawCommand::StrokeRect { rect, color });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color, alpha: f32) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            color,
            alpha,
        });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color, _alpha: f32, _width: f32) {
        self.commands.push(DrawCommand::StrokeCircle {
            center,
            radius,
            color,
        });
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Color, _alpha: f32) {
        self.commands.push(DrawCommand::Polygon {
            points: points.len(),
            color,
        });
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Color, _alpha: f32, _width: f32) {
        self.commands.push(DrawCommand::Line { from, to, color });
    }

    fn text(&mut self, text: &str, at: Vec2, _style: &TextStyle) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            at,
        });
    }

    fn set_glow(&mut self, color: Option<Color>, _blur: f32) {
        self.commands.push(DrawCommand::Glow(color));
    }
}

/// Draw one frame of the session. `time_ms` only drives cosmetic animation.
pub fn render_frame(
    surface: &mut dyn Surface,
    session: &Session,
    settings: &SiteSettings,
    time_ms: f64,
) {
    let t = (time_ms * 0.001) as f32;
    background::draw(surface, session, settings, t);
    sprites::draw_world(surface, session, settings.cursor_enabled, t);
    particles::draw(surface, &session.particles, Vec2::new(session.camera_x, 0.0));
    surface.set_glow(None, 0.0);
    hud::draw(surface, session);
    if session.phase.is_terminal() {
        hud::draw_overlay(surface, session);
    }
}

/// Notice shown instead of a game the device cannot play
pub fn render_unavailable(surface: &mut dyn Surface, title: &str, message: &str) {
    let size = surface.size();
    surface.clear(Color(0x0a0a0f));
    let center = size * 0.5;
    surface.text(
        title,
        center - Vec2::new(0.0, 14.0),
        &TextStyle::new(20.0, Color(0x22d3ee)).centered().bold(),
    );
    surface.text(
        message,
        center + Vec2::new(0.0, 14.0),
        &TextStyle::new(14.0, Color(0xcccccc)).centered(),
    );
}
