//! Background: base fill, scrolling grid, parallax layers

use glam::Vec2;

use super::Surface;
use crate::settings::SiteSettings;
use crate::sim::{Aabb, Session};

const GRID_SPACING: f32 = 40.0;
const GRID_ALPHA: f32 = 0.1;
/// Grid scroll in pixels per second
const GRID_SPEED: f32 = 20.0;

/// (scroll factor, alpha, radius) per parallax layer, far to near
const PARALLAX_LAYERS: [(f32, f32, f32); 3] = [(0.1, 0.05, 50.0), (0.2, 0.08, 30.0), (0.3, 0.1, 18.0)];
const PARALLAX_SPACING: f32 = 160.0;

pub(super) fn draw(surface: &mut dyn Surface, session: &Session, settings: &SiteSettings, t: f32) {
    let palette = &session.config.palette;
    let size = surface.size();

    surface.clear(palette.background);
    surface.fill_rect(
        Aabb::new(Vec2::new(0.0, size.y * 0.5), Vec2::new(size.x, size.y * 0.5)),
        palette.background_alt,
        0.6,
    );

    if palette.parallax && settings.parallax_enabled() {
        draw_parallax(surface, session, size);
    }

    let offset = if settings.animate_background() {
        (t * GRID_SPEED + session.camera_x) % GRID_SPACING
    } else {
        0.0
    };
    draw_grid(surface, session, size, offset);
}

fn draw_grid(surface: &mut dyn Surface, session: &Session, size: Vec2, offset: f32) {
    let color = session.config.palette.grid;
    let mut x = -offset;
    while x < size.x + GRID_SPACING {
        surface.line(Vec2::new(x, 0.0), Vec2::new(x, size.y), color, GRID_ALPHA, 1.0);
        x += GRID_SPACING;
    }
    let mut y = -offset;
    while y < size.y + GRID_SPACING {
        surface.line(Vec2::new(0.0, y), Vec2::new(size.x, y), color, GRID_ALPHA, 1.0);
        y += GRID_SPACING;
    }
}

/// Soft orbs that scroll slower than the world
fn draw_parallax(surface: &mut dyn Surface, session: &Session, size: Vec2) {
    let color = session.config.palette.grid;
    for (layer, (factor, alpha, radius)) in PARALLAX_LAYERS.iter().enumerate() {
        let scroll = (session.camera_x * factor) % PARALLAX_SPACING;
        let row = size.y * (0.25 + layer as f32 * 0.2);
        let mut x = -scroll - PARALLAX_SPACING;
        let mut i = 0;
        while x < size.x + PARALLAX_SPACING {
            let bob = if i % 2 == 0 { -radius * 0.5 } else { radius * 0.5 };
            surface.fill_circle(Vec2::new(x, row + bob), *radius, color, *alpha);
            x += PARALLAX_SPACING;
            i += 1;
        }
    }
}
