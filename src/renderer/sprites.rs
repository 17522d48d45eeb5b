//! World layer: platforms, checkpoints, objects and the player

use glam::Vec2;

use super::{Surface, TextStyle, shapes};
use crate::Color;
use crate::games::ControlScheme;
use crate::sim::{
    Aabb, Checkpoint, Effect, InteractiveObject, ObjectKind, Platform, PlatformKind, Session,
};

/// Vanishing platforms blink during their last ticks
const VANISH_WARN_TICKS: u32 = 300;
const ICON_DARK: Color = Color(0x0a0a0c);
const SHIELD_COLOR: Color = Color(0x3b82f6);
const SPEED_COLOR: Color = Color(0xfbbf24);
const CHECKPOINT_ON: Color = Color(0x22c55e);
const CHECKPOINT_OFF: Color = Color(0x6b7280);

pub(super) fn draw_world(surface: &mut dyn Surface, session: &Session, cursor: bool, t: f32) {
    let cam = Vec2::new(session.camera_x, 0.0);

    for platform in &session.platforms {
        draw_platform(surface, session, platform, cam);
    }
    for checkpoint in &session.checkpoints {
        draw_checkpoint(surface, checkpoint, cam);
    }
    for obj in session.objects.iter().filter(|o| o.active) {
        let dragged = session.drag.is_some_and(|d| d.id == obj.id);
        draw_object(surface, session, obj, cam, t, dragged);
    }
    surface.set_glow(None, 0.0);
    draw_player(surface, session, cam, cursor, t);
}

fn offset(rect: Aabb, cam: Vec2) -> Aabb {
    let mut rect = rect;
    rect.translate(-cam);
    rect
}

fn draw_platform(surface: &mut dyn Surface, session: &Session, platform: &Platform, cam: Vec2) {
    let rect = offset(platform.rect, cam);
    let palette = &session.config.palette;

    if let PlatformKind::Slot { filled, .. } = &platform.kind {
        let edge = if filled.is_some() {
            palette.accent
        } else {
            platform.color
        };
        surface.fill_rect(rect, platform.color, 0.2);
        surface.stroke_rect(rect, edge, 0.8, 2.0);
        surface.text(
            &platform.label,
            Vec2::new(rect.center().x, rect.max.y + 14.0),
            &TextStyle::new(10.0, palette.text).centered(),
        );
        return;
    }

    if platform.passable {
        return;
    }
    let alpha = match platform.kind {
        PlatformKind::Vanishing { ticks } if ticks < VANISH_WARN_TICKS && (ticks / 10) % 2 == 1 => 0.3,
        _ => 1.0,
    };
    surface.set_glow(Some(platform.color), 10.0);
    surface.fill_rect(rect, platform.color, alpha);
    surface.set_glow(None, 0.0);
    surface.line(
        rect.min,
        Vec2::new(rect.max.x, rect.min.y),
        Color::WHITE,
        0.3 * alpha,
        1.0,
    );
}

fn draw_checkpoint(surface: &mut dyn Surface, checkpoint: &Checkpoint, cam: Vec2) {
    let rect = offset(checkpoint.rect(), cam);
    let color = if checkpoint.activated {
        CHECKPOINT_ON
    } else {
        CHECKPOINT_OFF
    };
    let pole = rect.min.x + 2.0;
    surface.line(
        Vec2::new(pole, rect.min.y),
        Vec2::new(pole, rect.max.y),
        Color::WHITE,
        0.8,
        2.0,
    );
    if checkpoint.activated {
        surface.set_glow(Some(color), 8.0);
    }
    surface.fill_polygon(
        &shapes::pennant(Vec2::new(pole, rect.min.y), rect.width() - 2.0, 12.0),
        color,
        1.0,
    );
    surface.set_glow(None, 0.0);
}

fn draw_object(
    surface: &mut dyn Surface,
    session: &Session,
    obj: &InteractiveObject,
    cam: Vec2,
    t: f32,
    dragged: bool,
) {
    let alpha = if obj.fade > 0.0 {
        obj.life.clamp(0.0, 1.0)
    } else {
        1.0
    };
    let center = obj.pos - cam;

    match &obj.kind {
        ObjectKind::Draggable { .. } => draw_tool(surface, session, obj, center, dragged),
        ObjectKind::Hazard => draw_hazard(surface, obj, center),
        ObjectKind::Goal => draw_portal(surface, obj, center, t),
        ObjectKind::Collectible | ObjectKind::PowerUp { .. } | ObjectKind::Target { .. } => {
            let bob = match obj.kind {
                ObjectKind::Target { .. } => 0.0,
                _ => (t * 3.0 + obj.phase).sin() * 3.0,
            };
            let at = center + Vec2::new(0.0, bob);
            if !draw_icon(surface, obj, at, alpha, t) {
                draw_placeholder(surface, obj, at, alpha);
            }
        }
    }
}

/// Named icon; false when the sprite is unknown
fn draw_icon(surface: &mut dyn Surface, obj: &InteractiveObject, at: Vec2, alpha: f32, t: f32) -> bool {
    let color = obj.color;
    let spin = t * 2.0 + obj.phase;
    match obj.sprite.as_str() {
        "godot" | "unity" | "react" | "webdev" | "software" | "ai" => {
            let pulse = (t * 3.0).sin() * 0.1 + 1.0;
            surface.set_glow(Some(color), 15.0);
            surface.fill_rect(Aabb::from_center(at, Vec2::splat(22.0 * pulse)), color, 0.4 * alpha);
            surface.set_glow(None, 0.0);
            surface.fill_rect(Aabb::from_center(at, Vec2::splat(16.0)), ICON_DARK, alpha);
            draw_skill_glyph(surface, &obj.sprite, at, color, alpha, spin);
        }
        "bolt" => {
            surface.set_glow(Some(color), 12.0);
            surface.fill_polygon(&shapes::bolt(at, 16.0), color, alpha);
        }
        "shield" => {
            surface.set_glow(Some(color), 12.0);
            surface.fill_circle(at, 6.0, color, alpha);
            surface.stroke_circle(at, 9.0, color, 0.6 * alpha, 2.0);
        }
        "clock" => {
            surface.set_glow(Some(color), 12.0);
            surface.fill_circle(at, 8.0, color, alpha);
            surface.line(at, at + Vec2::new(0.0, -5.0), ICON_DARK, alpha, 2.0);
            surface.line(at, at + Vec2::new(4.0, 0.0), ICON_DARK, alpha, 2.0);
        }
        "bug" => {
            for (from, to) in shapes::bug_legs(at, obj.radius * 0.6, spin * 4.0) {
                surface.line(from, to, color, alpha, 1.5);
            }
            surface.fill_circle(at, obj.radius * 0.7, color, alpha);
            let eye = obj.radius * 0.25;
            surface.fill_circle(at + Vec2::new(-eye, -eye), 2.0, Color::WHITE, alpha);
            surface.fill_circle(at + Vec2::new(eye, -eye), 2.0, Color::WHITE, alpha);
        }
        "nest" => {
            surface.fill_circle(at, obj.radius * 0.8, color, alpha);
            surface.stroke_circle(at, obj.radius, color, 0.5 * alpha, 2.0);
            for i in 0..3 {
                let angle = spin + i as f32 * 2.1;
                let egg = at + Vec2::new(angle.cos(), angle.sin()) * obj.radius * 0.4;
                surface.fill_circle(egg, 2.5, Color::WHITE, alpha);
            }
        }
        "snowflake" => {
            surface.set_glow(Some(color), 12.0);
            surface.fill_circle(at, obj.radius, color, 0.3 * alpha);
            for i in 0..3 {
                let angle = spin * 0.3 + i as f32 * std::f32::consts::PI / 3.0;
                let arm = Vec2::new(angle.cos(), angle.sin()) * obj.radius * 0.7;
                surface.line(at - arm, at + arm, Color::WHITE, alpha, 2.0);
            }
        }
        "x2" => {
            surface.set_glow(Some(color), 12.0);
            surface.fill_circle(at, obj.radius, color, 0.8 * alpha);
            let mut style = TextStyle::new(12.0, Color::WHITE).centered().bold();
            style.alpha = alpha;
            surface.text("2x", at + Vec2::new(0.0, 4.0), &style);
        }
        "laser" => {
            surface.set_glow(Some(color), 12.0);
            surface.fill_circle(at, obj.radius, color, 0.3 * alpha);
            surface.fill_polygon(&shapes::star(at, obj.radius * 0.8, obj.radius * 0.3, 4, spin), color, alpha);
        }
        _ => return false,
    }
    surface.set_glow(None, 0.0);
    true
}

fn draw_skill_glyph(surface: &mut dyn Surface, sprite: &str, at: Vec2, color: Color, alpha: f32, spin: f32) {
    match sprite {
        "godot" => {
            surface.fill_rect(Aabb::from_center(at + Vec2::new(0.0, -2.0), Vec2::new(8.0, 6.0)), color, alpha);
            surface.fill_rect(Aabb::from_center(at + Vec2::new(0.0, 4.0), Vec2::new(8.0, 6.0)), color, alpha);
        }
        "unity" => {
            surface.fill_polygon(&shapes::regular_polygon(at, 6.0, 4, spin), Color::WHITE, alpha);
            surface.fill_polygon(&shapes::regular_polygon(at, 3.0, 4, spin), ICON_DARK, alpha);
        }
        "react" => {
            surface.stroke_circle(at, 6.0, color, alpha, 1.5);
            surface.fill_circle(at, 1.5, color, alpha);
        }
        "webdev" => {
            surface.line(at + Vec2::new(-2.0, -5.0), at + Vec2::new(-6.0, 0.0), color, alpha, 2.0);
            surface.line(at + Vec2::new(-6.0, 0.0), at + Vec2::new(-2.0, 5.0), color, alpha, 2.0);
            surface.line(at + Vec2::new(2.0, -5.0), at + Vec2::new(6.0, 0.0), color, alpha, 2.0);
            surface.line(at + Vec2::new(6.0, 0.0), at + Vec2::new(2.0, 5.0), color, alpha, 2.0);
        }
        "software" => {
            surface.fill_polygon(&shapes::star(at, 7.0, 4.5, 6, spin * 0.5), color, alpha);
            surface.fill_circle(at, 2.0, ICON_DARK, alpha);
        }
        _ => {
            surface.fill_rect(Aabb::from_center(at, Vec2::new(10.0, 8.0)), color, alpha);
            surface.fill_rect(Aabb::from_center(at, Vec2::splat(4.0)), ICON_DARK, alpha);
        }
    }
}

/// Stand-in for a sprite that failed to resolve
fn draw_placeholder(surface: &mut dyn Surface, obj: &InteractiveObject, at: Vec2, alpha: f32) {
    let size = Vec2::splat(obj.radius.max(8.0) * 2.0);
    surface.stroke_rect(Aabb::from_center(at, size), obj.color, alpha, 1.0);
    let mut style = TextStyle::new(12.0, obj.color).centered();
    style.alpha = alpha;
    surface.text("?", at + Vec2::new(0.0, 4.0), &style);
}

fn draw_hazard(surface: &mut dyn Surface, obj: &InteractiveObject, center: Vec2) {
    let rect = Aabb::from_center(center, obj.size);
    surface.set_glow(Some(obj.color), 8.0);
    surface.fill_rect(rect, obj.color, 1.0);
    surface.set_glow(None, 0.0);

    // danger stripes across the short axis
    let mut x = rect.min.x;
    while x < rect.max.x {
        let stripe = Aabb::new(
            Vec2::new(x, rect.min.y),
            Vec2::new(2.0_f32.min(rect.max.x - x), rect.height()),
        );
        surface.fill_rect(stripe, Color::WHITE, 0.6);
        x += 4.0;
    }
}

fn draw_portal(surface: &mut dyn Surface, obj: &InteractiveObject, center: Vec2, t: f32) {
    let radius = obj.size.x.min(obj.size.y) * 0.5;
    surface.set_glow(Some(obj.color), 20.0);
    for ring in 0..3 {
        let pulse = ((t * 4.0) + ring as f32).sin() * 2.0;
        let r = (radius - ring as f32 * 5.0 + pulse).max(2.0);
        surface.stroke_circle(center, r, obj.color, 1.0 - ring as f32 * 0.25, 2.0);
    }
    surface.fill_circle(center, radius * 0.3, Color::WHITE, 0.8);
    surface.set_glow(None, 0.0);
}

fn draw_tool(
    surface: &mut dyn Surface,
    session: &Session,
    obj: &InteractiveObject,
    center: Vec2,
    dragged: bool,
) {
    let rect = Aabb::from_center(center, obj.size);
    surface.set_glow(Some(obj.color), if dragged { 15.0 } else { 6.0 });
    surface.fill_rect(rect, obj.color, 0.9);
    surface.set_glow(None, 0.0);
    if dragged {
        surface.stroke_rect(rect, Color::WHITE, 1.0, 2.0);
    }
    let initial: String = obj.label.chars().take(1).collect();
    surface.text(
        &initial,
        center + Vec2::new(0.0, 5.0),
        &TextStyle::new(14.0, ICON_DARK).centered().bold(),
    );
    surface.text(
        &obj.label,
        Vec2::new(center.x, rect.max.y + 12.0),
        &TextStyle::new(10.0, session.config.palette.text).centered(),
    );
}

/// `cursor` draws the crosshair for pointer games; off, the host cursor is used
fn draw_player(surface: &mut dyn Surface, session: &Session, cam: Vec2, cursor: bool, t: f32) {
    let player = &session.player;
    match &session.config.controls {
        ControlScheme::DragDrop { .. } => {}
        ControlScheme::Pointer { laser_reach } => {
            let center = player.center();
            let color = session.config.player.color;
            if cursor {
                surface.stroke_circle(center, 10.0, color, 0.8, 1.5);
                surface.line(center - Vec2::new(14.0, 0.0), center + Vec2::new(14.0, 0.0), color, 0.8, 1.0);
                surface.line(center - Vec2::new(0.0, 14.0), center + Vec2::new(0.0, 14.0), color, 0.8, 1.0);
            }
            if player.effects.is_active(Effect::Laser) {
                let reach = Aabb::from_center(center, Vec2::splat(*laser_reach * 2.0));
                surface.stroke_rect(reach, session.config.palette.accent, 0.5, 1.0);
            }
        }
        ControlScheme::TopDown { .. } | ControlScheme::Platformer(_) => {
            let rect = offset(player.rect(), cam);
            let color = session.config.player.color;

            if player.effects.is_active(Effect::Shield) {
                surface.stroke_circle(rect.center(), 15.0, SHIELD_COLOR, 1.0, 3.0);
            }
            if player.effects.is_active(Effect::Speed) {
                for i in 0..3 {
                    let mut trail = rect;
                    trail.translate(Vec2::new(-(i as f32) * 4.0, 0.0));
                    surface.fill_rect(trail, SPEED_COLOR, 0.3 - i as f32 * 0.1);
                }
            }

            surface.set_glow(Some(color), 10.0);
            surface.fill_rect(rect, color, 1.0);
            surface.set_glow(None, 0.0);

            // eyes and a bobbing mouth
            let eye = Vec2::splat(2.0);
            let s = player.size / 16.0;
            surface.fill_rect(Aabb::new(rect.min + Vec2::new(4.0, 2.0) * s, eye), Color::WHITE, 1.0);
            surface.fill_rect(Aabb::new(rect.min + Vec2::new(10.0, 2.0) * s, eye), Color::WHITE, 1.0);
            let mouth_y = 8.0 * s.y + (t * 10.0).sin();
            surface.fill_rect(
                Aabb::new(rect.min + Vec2::new(6.0 * s.x, mouth_y), Vec2::new(4.0, 2.0)),
                Color::WHITE,
                1.0,
            );
        }
    }
}
