//! Collision detection and response for axis-aligned geometry
//!
//! Circular proximity for pickups and strikes, AABB overlap for platforms,
//! obstacles, checkpoints and goals.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::Player;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Box from its top-left corner and size
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self::new(center - size * 0.5, size)
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Strict overlap: touching edges do not count
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.min += delta;
        self.max += delta;
    }

    /// Clamp the top-left of a `size` rectangle so it stays inside
    pub fn clamp_rect(&self, pos: Vec2, size: Vec2) -> Vec2 {
        let hi = (self.max - size).max(self.min);
        pos.clamp(self.min, hi)
    }
}

/// Centre-to-centre distance below `radius`
#[inline]
pub fn within_radius(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance_squared(b) < radius * radius
}

/// Both axis offsets below `half_extent`
#[inline]
pub fn within_box(a: Vec2, b: Vec2, half_extent: f32) -> bool {
    let d = (a - b).abs();
    d.x < half_extent && d.y < half_extent
}

/// How the player met a solid platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    None,
    /// Came down onto the top surface
    Landed,
    /// Bumped the underside while rising
    Ceiling,
    /// Pushed out sideways
    Side,
}

/// Resolve an overlap between the player and a solid platform
///
/// Falling onto the top lands, rising into the underside stops the jump,
/// otherwise horizontal motion pushes the player back out of the side.
pub fn resolve_platform(player: &mut Player, platform: &Aabb) -> Contact {
    if !player.rect().overlaps(platform) {
        return Contact::None;
    }

    if player.vel.y > 0.0 && player.pos.y < platform.min.y {
        player.pos.y = platform.min.y - player.size.y;
        player.vel.y = 0.0;
        Contact::Landed
    } else if player.vel.y < 0.0 && player.pos.y > platform.min.y {
        player.pos.y = platform.max.y;
        player.vel.y = 0.0;
        Contact::Ceiling
    } else if player.vel.x > 0.0 && player.pos.x < platform.min.x {
        player.pos.x = platform.min.x - player.size.x;
        player.vel.x = 0.0;
        Contact::Side
    } else if player.vel.x < 0.0 && player.pos.x > platform.min.x {
        player.pos.x = platform.max.x;
        player.vel.x = 0.0;
        Contact::Side
    } else {
        Contact::None
    }
}
