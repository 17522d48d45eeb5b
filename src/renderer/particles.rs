//! Particle update and draw
//!
//! Particles are cosmetic: they move and fade once per rendered frame and
//! never feed back into the rules.

use glam::Vec2;

use super::Surface;
use crate::sim::{Aabb, Particle};

/// Move every particle and drop the ones that faded out
pub fn advance_particles(particles: &mut Vec<Particle>, fade: f32) {
    let fade = if fade.is_finite() && fade > 0.0 {
        fade
    } else {
        crate::consts::PARTICLE_FADE
    };
    for p in particles.iter_mut() {
        p.pos += p.vel;
        p.life -= fade;
    }
    particles.retain(|p| p.life > 0.0 && p.pos.is_finite());
}

pub(super) fn draw(surface: &mut dyn Surface, particles: &[Particle], cam: Vec2) {
    for p in particles {
        let alpha = p.life.clamp(0.0, 1.0);
        surface.fill_rect(Aabb::new(p.pos - cam, Vec2::splat(p.size)), p.color, alpha);
    }
}
