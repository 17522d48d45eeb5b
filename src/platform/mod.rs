//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Input events (keyboard, mouse, touch, focus)
//! - Frame and one-second scheduling
//! - Canvas surface and mount handle (web only)

use glam::Vec2;

use crate::consts::{DEFAULT_CANVAS_HEIGHT, MIN_CANVAS_WIDTH};

pub mod input;
pub mod scheduler;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use input::{DeviceClass, InputRouter, Key, cursor_style};
pub use scheduler::{FrameScheduler, ManualScheduler};

/// Canvas size for a container: at least the minimum width, default height
/// when the container reports none
pub fn canvas_size(width: f64, height: f64) -> Vec2 {
    let width = if width.is_finite() { width as f32 } else { 0.0 };
    let height = if height.is_finite() && height > 0.0 {
        height as f32
    } else {
        DEFAULT_CANVAS_HEIGHT
    };
    Vec2::new(width.max(MIN_CANVAS_WIDTH), height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_size() {
        assert_eq!(canvas_size(900.0, 400.0), Vec2::new(900.0, 400.0));
        assert_eq!(canvas_size(320.0, 0.0), Vec2::new(MIN_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT));
        assert_eq!(canvas_size(f64::NAN, f64::INFINITY), Vec2::new(MIN_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT));
    }
}
