//! Point generation for 2D outlines drawn as polygons

use glam::Vec2;
use std::f32::consts::PI;

/// Regular polygon with `sides` corners, first corner at `rotation`
pub fn regular_polygon(center: Vec2, radius: f32, sides: u32, rotation: f32) -> Vec<Vec2> {
    let sides = sides.max(3);
    (0..sides)
        .map(|i| {
            let theta = rotation + (i as f32 / sides as f32) * 2.0 * PI;
            center + Vec2::new(theta.cos(), theta.sin()) * radius
        })
        .collect()
}

/// Star with `points` tips alternating between the two radii
pub fn star(center: Vec2, outer: f32, inner: f32, points: u32, rotation: f32) -> Vec<Vec2> {
    let points = points.max(2);
    let steps = points * 2;
    (0..steps)
        .map(|i| {
            let theta = rotation + (i as f32 / steps as f32) * 2.0 * PI;
            let r = if i % 2 == 0 { outer } else { inner };
            center + Vec2::new(theta.cos(), theta.sin()) * r
        })
        .collect()
}

/// Zig-zag lightning bolt inside a `size` box centred on `center`
pub fn bolt(center: Vec2, size: f32) -> Vec<Vec2> {
    let h = size * 0.5;
    [
        Vec2::new(0.1, -1.0),
        Vec2::new(-0.5, 0.1),
        Vec2::new(-0.05, 0.1),
        Vec2::new(-0.2, 1.0),
        Vec2::new(0.5, -0.2),
        Vec2::new(0.05, -0.2),
    ]
    .iter()
    .map(|p| center + *p * h)
    .collect()
}

/// Flag pennant hanging off a pole top
pub fn pennant(pole_top: Vec2, width: f32, height: f32) -> Vec<Vec2> {
    vec![
        pole_top,
        pole_top + Vec2::new(width, height * 0.5),
        pole_top + Vec2::new(0.0, height),
    ]
}

/// Legs of a bug body as line segments, wiggling with `phase`
pub fn bug_legs(center: Vec2, radius: f32, phase: f32) -> Vec<(Vec2, Vec2)> {
    let wiggle = phase.sin() * 0.2;
    (0..3)
        .flat_map(|i| {
            let angle = -0.6 + i as f32 * 0.6 + wiggle;
            let reach = radius * 1.6;
            let left = Vec2::new(-angle.cos(), angle.sin()) * reach;
            let right = Vec2::new(angle.cos(), angle.sin()) * reach;
            [(center, center + left), (center, center + right)]
        })
        .collect()
}
