//! Input router
//!
//! Collects raw keyboard, mouse and touch events between frames and turns
//! them into one `TickInput` per tick. Knows nothing about the DOM.

use std::collections::HashSet;

use glam::Vec2;

use crate::games::ControlScheme;
use crate::sim::TickInput;

/// Joystick stick travel below this is ignored
const JOYSTICK_DEAD_ZONE: f32 = 10.0;
/// Stick travel is clamped to this radius
const JOYSTICK_MAX: f32 = 50.0;
/// Horizontal share of the stick direction needed to run
const JOYSTICK_COS_THRESHOLD: f32 = 0.3;

/// Logical keys the games read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Jump,
}

impl Key {
    /// Map a DOM `code`/`key` pair (either may be empty)
    pub fn from_dom(code: &str, key: &str) -> Option<Self> {
        let by_code = match code {
            "KeyA" | "ArrowLeft" => Some(Key::Left),
            "KeyD" | "ArrowRight" => Some(Key::Right),
            "KeyW" | "ArrowUp" => Some(Key::Up),
            "KeyS" | "ArrowDown" => Some(Key::Down),
            "Space" => Some(Key::Jump),
            _ => None,
        };
        by_code.or_else(|| match key.to_lowercase().as_str() {
            "a" | "arrowleft" => Some(Key::Left),
            "d" | "arrowright" => Some(Key::Right),
            "w" | "arrowup" => Some(Key::Up),
            "s" | "arrowdown" => Some(Key::Down),
            " " => Some(Key::Jump),
            _ => None,
        })
    }

    /// Keys whose browser default (page scroll) should be suppressed
    pub fn blocks_scroll(self) -> bool {
        matches!(self, Key::Jump | Key::Up | Key::Down)
    }
}

/// Coarse device class from the user agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Desktop,
    Mobile,
}

impl DeviceClass {
    pub fn from_user_agent(ua: &str) -> Self {
        let ua = ua.to_lowercase();
        if ["iphone", "ipad", "ipod", "android"]
            .iter()
            .any(|needle| ua.contains(needle))
        {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }

    pub fn is_mobile(self) -> bool {
        self == DeviceClass::Mobile
    }
}

/// CSS cursor for the canvas; pointer games hide it when the game draws
/// its own crosshair
pub fn cursor_style(controls: &ControlScheme, custom_cursor: bool) -> &'static str {
    match controls {
        ControlScheme::Pointer { .. } if custom_cursor => "none",
        ControlScheme::Pointer { .. } => "crosshair",
        ControlScheme::DragDrop { .. } => "grab",
        ControlScheme::TopDown { .. } | ControlScheme::Platformer(_) => "default",
    }
}

/// How touches are interpreted for the mounted game
#[derive(Debug, Clone, Copy, PartialEq)]
enum TouchMode {
    /// Steer toward the touch, relative to the canvas centre
    Steer { dead_zone: f32 },
    /// Left half is a virtual joystick, right half a jump button
    Pad,
    /// Touch acts as the pointer
    Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Joystick {
    touch_id: i32,
    origin: Vec2,
    stick: Vec2,
}

impl Joystick {
    /// Horizontal direction the stick points at
    fn move_x(&self) -> i8 {
        let offset = self.stick - self.origin;
        let distance = offset.length().min(JOYSTICK_MAX);
        if distance <= JOYSTICK_DEAD_ZONE {
            return 0;
        }
        let cos = offset.x / offset.length();
        if cos < -JOYSTICK_COS_THRESHOLD {
            -1
        } else if cos > JOYSTICK_COS_THRESHOLD {
            1
        } else {
            0
        }
    }
}

/// Per-mount input state
#[derive(Debug, Clone)]
pub struct InputRouter {
    mode: TouchMode,
    keys: HashSet<Key>,
    pointer: Option<Vec2>,
    pointer_down: bool,
    pressed: bool,
    released: bool,
    steer: Option<Vec2>,
    joystick: Option<Joystick>,
    jump_touch: Option<i32>,
}

impl InputRouter {
    pub fn new(scheme: &ControlScheme) -> Self {
        let mode = match scheme {
            ControlScheme::TopDown { touch_dead_zone, .. } => TouchMode::Steer {
                dead_zone: *touch_dead_zone,
            },
            ControlScheme::Platformer(_) => TouchMode::Pad,
            ControlScheme::Pointer { .. } | ControlScheme::DragDrop { .. } => TouchMode::Pointer,
        };
        Self {
            mode,
            keys: HashSet::new(),
            pointer: None,
            pointer_down: false,
            pressed: false,
            released: false,
            steer: None,
            joystick: None,
            jump_touch: None,
        }
    }

    /// Returns the logical key when it is one the games use
    pub fn key_down(&mut self, code: &str, key: &str) -> Option<Key> {
        let mapped = Key::from_dom(code, key)?;
        self.keys.insert(mapped);
        Some(mapped)
    }

    pub fn key_up(&mut self, code: &str, key: &str) {
        if let Some(mapped) = Key::from_dom(code, key) {
            self.keys.remove(&mapped);
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    /// Focus lost: nothing stays held
    pub fn blur(&mut self) {
        self.keys.clear();
        self.steer = None;
        self.joystick = None;
        self.jump_touch = None;
        if self.pointer_down {
            self.pointer_down = false;
            self.released = true;
        }
    }

    pub fn pointer_down(&mut self, pos: Vec2) {
        if !pos.is_finite() {
            return;
        }
        self.pointer = Some(pos);
        if !self.pointer_down {
            self.pointer_down = true;
            self.pressed = true;
        }
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        if pos.is_finite() {
            self.pointer = Some(pos);
        }
    }

    pub fn pointer_up(&mut self, pos: Option<Vec2>) {
        if let Some(pos) = pos.filter(|p| p.is_finite()) {
            self.pointer = Some(pos);
        }
        if self.pointer_down {
            self.pointer_down = false;
            self.released = true;
        }
    }

    /// Pointer left the canvas
    pub fn pointer_leave(&mut self) {
        self.pointer_up(None);
    }

    pub fn touch_start(&mut self, id: i32, pos: Vec2, viewport: Vec2) {
        match self.mode {
            TouchMode::Steer { .. } => self.steer = Some(pos),
            TouchMode::Pointer => self.pointer_down(pos),
            TouchMode::Pad => {
                if pos.x < viewport.x * 0.5 {
                    if self.joystick.is_none() {
                        self.joystick = Some(Joystick {
                            touch_id: id,
                            origin: pos,
                            stick: pos,
                        });
                    }
                } else {
                    self.jump_touch = Some(id);
                }
            }
        }
    }

    pub fn touch_move(&mut self, id: i32, pos: Vec2) {
        match self.mode {
            TouchMode::Steer { .. } => self.steer = Some(pos),
            TouchMode::Pointer => self.pointer_move(pos),
            TouchMode::Pad => {
                if let Some(joystick) = self.joystick.as_mut().filter(|j| j.touch_id == id) {
                    joystick.stick = pos;
                }
            }
        }
    }

    pub fn touch_end(&mut self, id: i32) {
        match self.mode {
            TouchMode::Steer { .. } => self.steer = None,
            TouchMode::Pointer => self.pointer_up(None),
            TouchMode::Pad => {
                if self.joystick.is_some_and(|j| j.touch_id == id) {
                    self.joystick = None;
                }
                if self.jump_touch == Some(id) {
                    self.jump_touch = None;
                }
            }
        }
    }

    /// Joystick origin and clamped stick position, for drawing
    pub fn joystick(&self) -> Option<(Vec2, Vec2)> {
        self.joystick.map(|j| {
            let offset = (j.stick - j.origin).clamp_length_max(JOYSTICK_MAX);
            (j.origin, j.origin + offset)
        })
    }

    /// Snapshot for the next tick
    pub fn tick_input(&self, viewport: Vec2) -> TickInput {
        let axis = |neg: Key, pos: Key| -> i8 {
            self.is_held(pos) as i8 - self.is_held(neg) as i8
        };
        let mut move_x = axis(Key::Left, Key::Right);
        let mut move_y = axis(Key::Up, Key::Down);
        let mut action = self.is_held(Key::Jump);

        match self.mode {
            TouchMode::Steer { dead_zone } => {
                if let Some(touch) = self.steer {
                    let offset = touch - viewport * 0.5;
                    if offset.x.abs() > dead_zone {
                        move_x = offset.x.signum() as i8;
                    }
                    if offset.y.abs() > dead_zone {
                        move_y = offset.y.signum() as i8;
                    }
                }
            }
            TouchMode::Pad => {
                action |= self.is_held(Key::Up) || self.jump_touch.is_some();
                if let Some(joystick) = &self.joystick {
                    let stick = joystick.move_x();
                    if stick != 0 {
                        move_x = stick;
                    }
                }
            }
            TouchMode::Pointer => {}
        }

        TickInput {
            move_x,
            move_y,
            action,
            pointer: self.pointer,
            pressed: self.pressed,
            released: self.released,
        }
    }

    /// Clear the press/release edges once a tick consumed them
    pub fn end_frame(&mut self) {
        self.pressed = false;
        self.released = false;
    }

    /// Forget everything (replay)
    pub fn reset(&mut self) {
        self.keys.clear();
        self.pointer = None;
        self.pointer_down = false;
        self.pressed = false;
        self.released = false;
        self.steer = None;
        self.joystick = None;
        self.jump_touch = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::GameKind;

    const VIEWPORT: Vec2 = Vec2::new(500.0, 320.0);

    fn router(kind: GameKind) -> InputRouter {
        InputRouter::new(&kind.config().unwrap().controls)
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(Key::from_dom("KeyA", "a"), Some(Key::Left));
        assert_eq!(Key::from_dom("", "D"), Some(Key::Right));
        assert_eq!(Key::from_dom("ArrowUp", ""), Some(Key::Up));
        assert_eq!(Key::from_dom("Space", " "), Some(Key::Jump));
        assert_eq!(Key::from_dom("KeyQ", "q"), None);
        assert!(Key::Jump.blocks_scroll());
        assert!(!Key::Left.blocks_scroll());
    }

    #[test]
    fn test_wasd_directions() {
        let mut r = router(GameKind::CodeQuest);
        r.key_down("KeyW", "w");
        r.key_down("KeyD", "d");
        let input = r.tick_input(VIEWPORT);
        assert_eq!((input.move_x, input.move_y), (1, -1));

        r.key_down("KeyA", "a");
        assert_eq!(r.tick_input(VIEWPORT).move_x, 0);
        r.key_up("KeyD", "d");
        assert_eq!(r.tick_input(VIEWPORT).move_x, -1);
    }

    #[test]
    fn test_blur_releases_keys() {
        let mut r = router(GameKind::CodeQuest);
        r.key_down("KeyD", "d");
        r.blur();
        assert_eq!(r.tick_input(VIEWPORT), TickInput::default());
    }

    #[test]
    fn test_touch_steer_dead_zone() {
        let mut r = router(GameKind::CodeQuest);
        r.touch_start(0, Vec2::new(270.0, 200.0), VIEWPORT);
        let input = r.tick_input(VIEWPORT);
        assert_eq!((input.move_x, input.move_y), (0, 1));

        r.touch_move(0, Vec2::new(100.0, 160.0));
        let input = r.tick_input(VIEWPORT);
        assert_eq!((input.move_x, input.move_y), (-1, 0));

        r.touch_end(0);
        assert_eq!(r.tick_input(VIEWPORT).move_x, 0);
    }

    #[test]
    fn test_platformer_jump_sources() {
        let mut r = router(GameKind::NeonJump);
        r.key_down("KeyW", "w");
        assert!(r.tick_input(VIEWPORT).action);
        r.key_up("KeyW", "w");
        r.key_down("Space", " ");
        assert!(r.tick_input(VIEWPORT).action);
        r.key_up("Space", " ");
        assert!(!r.tick_input(VIEWPORT).action);

        r.touch_start(3, Vec2::new(400.0, 250.0), VIEWPORT);
        assert!(r.tick_input(VIEWPORT).action);
        r.touch_end(3);
        assert!(!r.tick_input(VIEWPORT).action);
    }

    #[test]
    fn test_joystick() {
        let mut r = router(GameKind::NeonJump);
        r.touch_start(1, Vec2::new(60.0, 260.0), VIEWPORT);
        r.touch_move(1, Vec2::new(65.0, 262.0));
        assert_eq!(r.tick_input(VIEWPORT).move_x, 0);

        r.touch_move(1, Vec2::new(140.0, 270.0));
        assert_eq!(r.tick_input(VIEWPORT).move_x, 1);
        let (origin, stick) = r.joystick().unwrap();
        assert!((stick - origin).length() <= JOYSTICK_MAX + 1e-3);

        // mostly vertical
        r.touch_move(1, Vec2::new(65.0, 200.0));
        assert_eq!(r.tick_input(VIEWPORT).move_x, 0);

        r.touch_move(1, Vec2::new(0.0, 260.0));
        assert_eq!(r.tick_input(VIEWPORT).move_x, -1);

        // another finger does not steal the stick
        r.touch_move(2, Vec2::new(200.0, 260.0));
        assert_eq!(r.tick_input(VIEWPORT).move_x, -1);

        r.touch_end(1);
        assert_eq!(r.tick_input(VIEWPORT).move_x, 0);
    }

    #[test]
    fn test_pointer_edges() {
        let mut r = router(GameKind::DebugDash);
        r.pointer_move(Vec2::new(10.0, 10.0));
        r.pointer_down(Vec2::new(20.0, 30.0));
        let input = r.tick_input(VIEWPORT);
        assert!(input.pressed);
        assert!(!input.released);
        assert_eq!(input.pointer, Some(Vec2::new(20.0, 30.0)));

        r.end_frame();
        assert!(!r.tick_input(VIEWPORT).pressed);

        r.pointer_up(None);
        assert!(r.tick_input(VIEWPORT).released);
        r.end_frame();
        assert!(!r.tick_input(VIEWPORT).released);
    }

    #[test]
    fn test_press_and_release_in_one_frame() {
        let mut r = router(GameKind::AiAssembly);
        r.touch_start(0, Vec2::new(50.0, 260.0), VIEWPORT);
        r.touch_end(0);
        let input = r.tick_input(VIEWPORT);
        assert!(input.pressed && input.released);
    }

    #[test]
    fn test_non_finite_pointer_dropped() {
        let mut r = router(GameKind::DebugDash);
        r.pointer_down(Vec2::new(f32::NAN, 0.0));
        assert_eq!(r.tick_input(VIEWPORT).pointer, None);
        assert!(!r.tick_input(VIEWPORT).pressed);
    }

    #[test]
    fn test_device_class() {
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
        let android = "Mozilla/5.0 (Linux; ANDROID 14; Pixel 8)";
        let desktop = "Mozilla/5.0 (X11; Linux x86_64) Firefox/130.0";
        assert_eq!(DeviceClass::from_user_agent(iphone), DeviceClass::Mobile);
        assert_eq!(DeviceClass::from_user_agent(android), DeviceClass::Mobile);
        assert_eq!(DeviceClass::from_user_agent(desktop), DeviceClass::Desktop);
    }

    #[test]
    fn test_cursor_style() {
        let dash = GameKind::DebugDash.config().unwrap().controls;
        assert_eq!(cursor_style(&dash, true), "none");
        assert_eq!(cursor_style(&dash, false), "crosshair");
        let quest = GameKind::CodeQuest.config().unwrap().controls;
        assert_eq!(cursor_style(&quest, true), "default");
    }
}
