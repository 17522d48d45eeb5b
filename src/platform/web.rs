//! Browser glue
//!
//! Canvas2D surface, `requestAnimationFrame`/`setInterval` scheduling, DOM
//! listeners and the `ArcadeMount` handle the page holds per mounted game.

use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;
use std::sync::Arc;

use glam::Vec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, CanvasRenderingContext2d, Event, EventTarget, HtmlCanvasElement,
    KeyboardEvent, MouseEvent, TouchEvent, Window,
};

use super::canvas_size;
use super::{DeviceClass, cursor_style};
use super::scheduler::FrameScheduler;
use crate::Color;
use crate::audio::{AudioManager, SoundEffect};
use crate::driver::LoopDriver;
use crate::error::{ArcadeError, Result};
use crate::games::{GameKind, catalogue};
use crate::renderer::{self, Surface, TextAlign, TextStyle};
use crate::settings::{QualityPreset, SettingsProvider, SiteSettings};
use crate::sim::{Aabb, GameEvent};

thread_local! {
    static SETTINGS: RefCell<SettingsProvider> =
        RefCell::new(SettingsProvider::new(SiteSettings::default()));
}

/// Create the page-wide settings provider; called once by the page entry
pub fn init_site() {
    SETTINGS.with(|s| log::info!("Site settings: {:?}", s.borrow().snapshot()));
}

/// Replace the page-wide settings every later mount starts from
#[wasm_bindgen]
pub fn configure_site(settings_json: &str) -> std::result::Result<(), JsValue> {
    let provider = SettingsProvider::from_json(settings_json)?;
    SETTINGS.with(|s| *s.borrow_mut() = provider);
    Ok(())
}

/// Change the quality preset (`low`, `medium`, `high`) for later mounts
#[wasm_bindgen]
pub fn set_site_quality(name: &str) -> std::result::Result<(), JsValue> {
    let quality = parse_quality(name)?;
    SETTINGS.with(|s| s.borrow_mut().set_quality(quality));
    Ok(())
}

fn parse_quality(name: &str) -> std::result::Result<QualityPreset, JsValue> {
    QualityPreset::from_str(name)
        .ok_or_else(|| JsValue::from_str(&format!("unknown quality preset {name:?}")))
}

/// Catalogue for a game selector, as JSON
#[wasm_bindgen]
pub fn catalogue_json() -> std::result::Result<String, JsValue> {
    let entries = catalogue()?;
    serde_json::to_string(&entries).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| ArcadeError::SurfaceUnavailable("no window".into()))
}

// === Surface ===

/// `Surface` over a canvas 2D context
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
            .ok_or_else(|| ArcadeError::SurfaceUnavailable("no 2d context".into()))?;
        Ok(Self {
            canvas: canvas.clone(),
            ctx,
        })
    }

    /// Still attached to the document
    pub fn is_live(&self) -> bool {
        self.canvas.is_connected()
    }

    fn circle_path(&self, center: Vec2, radius: f32) {
        self.ctx.begin_path();
        let _ = self
            .ctx
            .arc(center.x as f64, center.y as f64, radius.max(0.0) as f64, 0.0, TAU);
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> Vec2 {
        Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    fn clear(&mut self, color: Color) {
        let size = self.size();
        self.ctx.set_global_alpha(1.0);
        self.ctx.set_fill_style_str(&color.to_css(1.0));
        self.ctx.fill_rect(0.0, 0.0, size.x as f64, size.y as f64);
    }

    fn fill_rect(&mut self, rect: Aabb, color: Color, alpha: f32) {
        self.ctx.set_fill_style_str(&color.to_css(alpha));
        self.ctx.fill_rect(
            rect.min.x as f64,
            rect.min.y as f64,
            rect.width() as f64,
            rect.height() as f64,
        );
    }

    fn stroke_rect(&mut self, rect: Aabb, color: Color, alpha: f32, width: f32) {
        self.ctx.set_stroke_style_str(&color.to_css(alpha));
        self.ctx.set_line_width(width as f64);
        self.ctx.stroke_rect(
            rect.min.x as f64,
            rect.min.y as f64,
            rect.width() as f64,
            rect.height() as f64,
        );
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color, alpha: f32) {
        self.ctx.set_fill_style_str(&color.to_css(alpha));
        self.circle_path(center, radius);
        self.ctx.fill();
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color, alpha: f32, width: f32) {
        self.ctx.set_stroke_style_str(&color.to_css(alpha));
        self.ctx.set_line_width(width as f64);
        self.circle_path(center, radius);
        self.ctx.stroke();
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Color, alpha: f32) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.ctx.set_fill_style_str(&color.to_css(alpha));
        self.ctx.begin_path();
        self.ctx.move_to(first.x as f64, first.y as f64);
        for p in rest {
            self.ctx.line_to(p.x as f64, p.y as f64);
        }
        self.ctx.close_path();
        self.ctx.fill();
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Color, alpha: f32, width: f32) {
        self.ctx.set_stroke_style_str(&color.to_css(alpha));
        self.ctx.set_line_width(width as f64);
        self.ctx.begin_path();
        self.ctx.move_to(from.x as f64, from.y as f64);
        self.ctx.line_to(to.x as f64, to.y as f64);
        self.ctx.stroke();
    }

    fn text(&mut self, text: &str, at: Vec2, style: &TextStyle) {
        let weight = if style.bold { "bold " } else { "" };
        self.ctx
            .set_font(&format!("{weight}{}px monospace", style.size.round()));
        self.ctx.set_text_align(match style.align {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        });
        self.ctx.set_fill_style_str(&style.color.to_css(style.alpha));
        let _ = self.ctx.fill_text(text, at.x as f64, at.y as f64);
    }

    fn set_glow(&mut self, color: Option<Color>, blur: f32) {
        match color {
            Some(color) => {
                self.ctx.set_shadow_color(&color.to_css(1.0));
                self.ctx.set_shadow_blur(blur as f64);
            }
            None => self.ctx.set_shadow_blur(0.0),
        }
    }
}

// === Scheduling ===

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;
type ClockCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// `requestAnimationFrame` + `setInterval(1000)`
pub struct WebScheduler {
    window: Window,
    frame_cb: FrameCallback,
    clock_cb: ClockCallback,
    frame_id: Option<i32>,
    interval_id: Option<i32>,
}

impl WebScheduler {
    fn new(window: Window, frame_cb: FrameCallback, clock_cb: ClockCallback) -> Self {
        Self {
            window,
            frame_cb,
            clock_cb,
            frame_id: None,
            interval_id: None,
        }
    }
}

impl FrameScheduler for WebScheduler {
    fn request_frame(&mut self) -> Result<()> {
        let cb = self.frame_cb.borrow();
        let cb = cb
            .as_ref()
            .ok_or_else(|| ArcadeError::Scheduler("frame callback released".into()))?;
        let id = self
            .window
            .request_animation_frame(cb.as_ref().unchecked_ref())
            .map_err(|e| ArcadeError::Scheduler(format!("{e:?}")))?;
        self.frame_id = Some(id);
        Ok(())
    }

    fn cancel_frame(&mut self) {
        if let Some(id) = self.frame_id.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
    }

    fn start_clock(&mut self) -> Result<()> {
        if self.interval_id.is_some() {
            return Ok(());
        }
        let cb = self.clock_cb.borrow();
        let cb = cb
            .as_ref()
            .ok_or_else(|| ArcadeError::Scheduler("clock callback released".into()))?;
        let id = self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), 1000)
            .map_err(|e| ArcadeError::Scheduler(format!("{e:?}")))?;
        self.interval_id = Some(id);
        Ok(())
    }

    fn stop_clock(&mut self) {
        if let Some(id) = self.interval_id.take() {
            self.window.clear_interval_with_handle(id);
        }
    }
}

// === Mount ===

struct MountState {
    driver: LoopDriver<WebScheduler>,
    surface: CanvasSurface,
    audio: AudioManager,
}

impl MountState {
    fn frame(&mut self, time: f64) {
        if !self.surface.is_live() {
            // canvas removed without unmount; it never comes back
            log::warn!("Canvas detached, stopping {}", self.driver.session().config.name);
            self.driver.stop();
            return;
        }
        let events = self.driver.on_frame(time, Some(&mut self.surface));
        if let Some((origin, stick)) = self.driver.input().joystick() {
            renderer::draw_joystick(&mut self.surface, origin, stick);
        }
        self.play(&events);
    }

    /// Resize canvas and session to `size`, then repaint
    fn fit(&mut self, size: Vec2) {
        self.surface.canvas.set_width(size.x as u32);
        self.surface.canvas.set_height(size.y as u32);
        self.driver.resize(size);
        self.driver.redraw(&mut self.surface, js_sys::Date::now());
    }

    fn second(&mut self) {
        let events = self.driver.on_second();
        self.play(&events);
    }

    fn play(&self, events: &[GameEvent]) {
        if self.driver.settings().sound_enabled {
            self.audio.play_events(events);
        }
    }

    /// Canvas-pixel position of a client coordinate
    fn canvas_point(&self, client_x: f64, client_y: f64) -> Vec2 {
        let rect = self.surface.canvas.get_bounding_client_rect();
        let size = self.surface.size();
        let scale_x = if rect.width() > 0.0 {
            size.x as f64 / rect.width()
        } else {
            1.0
        };
        let scale_y = if rect.height() > 0.0 {
            size.y as f64 / rect.height()
        } else {
            1.0
        };
        Vec2::new(
            ((client_x - rect.left()) * scale_x) as f32,
            ((client_y - rect.top()) * scale_y) as f32,
        )
    }
}

struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

/// Handle for one game mounted on a canvas
#[wasm_bindgen]
pub struct ArcadeMount {
    state: Option<Rc<RefCell<MountState>>>,
    canvas: HtmlCanvasElement,
    frame_cb: FrameCallback,
    clock_cb: ClockCallback,
    listeners: Vec<Listener>,
    on_game_end: js_sys::Function,
    available: bool,
}

#[wasm_bindgen]
impl ArcadeMount {
    /// Mount `game_id` on the canvas with id `canvas_id` and start playing.
    /// `on_game_end` is called when the player exits.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas_id: &str,
        game_id: &str,
        on_game_end: js_sys::Function,
        settings_json: Option<String>,
    ) -> std::result::Result<ArcadeMount, JsValue> {
        Ok(Self::mount(canvas_id, game_id, on_game_end, settings_json)?)
    }

    /// Restart the same game with a fresh seed
    pub fn replay(&self) -> std::result::Result<(), JsValue> {
        if let Some(state) = &self.state {
            let mut st = state.borrow_mut();
            st.audio.play(SoundEffect::Click);
            st.driver.replay(js_sys::Date::now() as u64)?;
        }
        Ok(())
    }

    /// Leave the game: stop everything and tell the host
    pub fn exit(&mut self) {
        self.unmount();
        log::info!("Game exited");
        if let Err(e) = self.on_game_end.call0(&JsValue::NULL) {
            log::warn!("on_game_end failed: {e:?}");
        }
    }

    /// Container resized; width never drops below the minimum
    pub fn resize(&self, width: f64, height: f64) {
        let size = canvas_size(width, height);
        match &self.state {
            Some(state) => state.borrow_mut().fit(size),
            None => {
                self.canvas.set_width(size.x as u32);
                self.canvas.set_height(size.y as u32);
            }
        }
    }

    /// Switch quality (`low`, `medium`, `high`) for this game and later mounts
    pub fn set_quality(&self, name: &str) -> std::result::Result<(), JsValue> {
        let quality = parse_quality(name)?;
        SETTINGS.with(|s| s.borrow_mut().set_quality(quality));
        if let Some(state) = &self.state {
            state.borrow_mut().driver.set_quality(quality);
        }
        Ok(())
    }

    pub fn set_sound_enabled(&self, enabled: bool) {
        SETTINGS.with(|s| s.borrow_mut().set_sound_enabled(enabled));
        if let Some(state) = &self.state {
            let mut st = state.borrow_mut();
            st.driver.set_sound_enabled(enabled);
            st.audio.set_enabled(enabled);
        }
    }

    /// False when the game cannot run on this device
    pub fn available(&self) -> bool {
        self.available
    }

    /// Latest HUD snapshot as JSON
    pub fn hud_json(&self) -> String {
        self.state
            .as_ref()
            .and_then(|s| serde_json::to_string(s.borrow().driver.hud()).ok())
            .unwrap_or_else(|| "null".to_string())
    }

    /// UI feedback for host buttons
    pub fn play_click(&self) {
        self.play_ui(SoundEffect::Click);
    }

    pub fn play_hover(&self) {
        self.play_ui(SoundEffect::Hover);
    }

    /// Stop the loop and remove every listener; safe to call twice
    pub fn unmount(&mut self) {
        if let Some(state) = self.state.take() {
            state.borrow_mut().driver.stop();
        }
        for listener in self.listeners.drain(..) {
            let _ = listener.target.remove_event_listener_with_callback(
                listener.kind,
                listener.closure.as_ref().unchecked_ref(),
            );
        }
        // break the closure -> state -> scheduler -> closure cycle
        self.frame_cb.borrow_mut().take();
        self.clock_cb.borrow_mut().take();
    }
}

impl ArcadeMount {
    fn mount(
        canvas_id: &str,
        game_id: &str,
        on_game_end: js_sys::Function,
        settings_json: Option<String>,
    ) -> Result<Self> {
        let window = window()?;
        let document = window
            .document()
            .ok_or_else(|| ArcadeError::SurfaceUnavailable("no document".into()))?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(canvas_id)
            .and_then(|el| el.dyn_into().ok())
            .ok_or_else(|| ArcadeError::SurfaceUnavailable(format!("no canvas #{canvas_id}")))?;

        let kind =
            GameKind::from_id(game_id).ok_or_else(|| ArcadeError::UnknownGame(game_id.to_string()))?;
        let config = kind.config()?;
        let settings = match settings_json {
            Some(json) => SiteSettings::from_json(&json)?,
            None => SETTINGS.with(|s| s.borrow().snapshot()),
        };

        let size = container_size(&canvas);
        canvas.set_width(size.x as u32);
        canvas.set_height(size.y as u32);
        let mut surface = CanvasSurface::new(&canvas)?;

        let frame_cb: FrameCallback = Rc::new(RefCell::new(None));
        let clock_cb: ClockCallback = Rc::new(RefCell::new(None));

        let ua = window.navigator().user_agent().unwrap_or_default();
        if config.desktop_only && DeviceClass::from_user_agent(&ua).is_mobile() {
            log::warn!("{} is desktop only", config.name);
            let err = ArcadeError::Unsupported(config.name.clone());
            renderer::render_unavailable(&mut surface, &format!("{} is desktop only", config.name), &err.to_string());
            return Ok(Self {
                state: None,
                canvas,
                frame_cb,
                clock_cb,
                listeners: Vec::new(),
                on_game_end,
                available: false,
            });
        }

        let cursor = cursor_style(&config.controls, settings.cursor_enabled);
        if let Err(e) = canvas.style().set_property("cursor", cursor) {
            log::warn!("Could not set cursor: {e:?}");
        }

        let seed = js_sys::Date::now() as u64;
        let scheduler = WebScheduler::new(window.clone(), frame_cb.clone(), clock_cb.clone());
        let audio = AudioManager::new(settings.sound_enabled);
        let driver = LoopDriver::new(Arc::new(config), size, seed, scheduler, settings);
        let state = Rc::new(RefCell::new(MountState {
            driver,
            surface,
            audio,
        }));

        {
            let state = state.clone();
            *frame_cb.borrow_mut() = Some(Closure::<dyn FnMut(f64)>::new(move |time: f64| {
                if let Ok(mut st) = state.try_borrow_mut() {
                    st.frame(time);
                }
            }));
        }
        {
            let state = state.clone();
            *clock_cb.borrow_mut() = Some(Closure::<dyn FnMut()>::new(move || {
                if let Ok(mut st) = state.try_borrow_mut() {
                    st.second();
                }
            }));
        }

        let mut mount = Self {
            state: Some(state.clone()),
            canvas: canvas.clone(),
            frame_cb,
            clock_cb,
            listeners: Vec::new(),
            on_game_end,
            available: true,
        };
        mount.attach_listeners(&window, &canvas, state.clone());

        state.borrow_mut().driver.start()?;
        log::info!("Mounted {} on #{canvas_id} (seed {seed})", kind.id());
        Ok(mount)
    }

    fn play_ui(&self, effect: SoundEffect) {
        if let Some(state) = &self.state {
            let st = state.borrow();
            if st.driver.settings().sound_enabled {
                st.audio.play(effect);
            }
        }
    }

    fn listen(
        &mut self,
        target: &EventTarget,
        kind: &'static str,
        passive: bool,
        handler: impl FnMut(Event) + 'static,
    ) {
        let closure = Closure::<dyn FnMut(Event)>::new(handler);
        let opts = AddEventListenerOptions::new();
        opts.set_passive(passive);
        let _ = target.add_event_listener_with_callback_and_add_event_listener_options(
            kind,
            closure.as_ref().unchecked_ref(),
            &opts,
        );
        self.listeners.push(Listener {
            target: target.clone(),
            kind,
            closure,
        });
    }

    fn attach_listeners(
        &mut self,
        window: &Window,
        canvas: &HtmlCanvasElement,
        state: Rc<RefCell<MountState>>,
    ) {
        let window: &EventTarget = window.as_ref();
        let canvas: &EventTarget = canvas.as_ref();

        // Keyboard
        {
            let state = state.clone();
            self.listen(window, "keydown", false, move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else { return };
                let Ok(mut st) = state.try_borrow_mut() else { return };
                st.audio.resume();
                if let Some(key) = st.driver.input_mut().key_down(&event.code(), &event.key())
                    && key.blocks_scroll()
                    && st.driver.is_running()
                {
                    event.prevent_default();
                }
            });
        }
        {
            let state = state.clone();
            self.listen(window, "keyup", true, move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else { return };
                if let Ok(mut st) = state.try_borrow_mut() {
                    st.driver.input_mut().key_up(&event.code(), &event.key());
                }
            });
        }
        {
            let state = state.clone();
            self.listen(window, "blur", true, move |_event| {
                if let Ok(mut st) = state.try_borrow_mut() {
                    st.driver.input_mut().blur();
                }
            });
        }

        {
            let state = state.clone();
            self.listen(window, "resize", true, move |_event| {
                if let Ok(mut st) = state.try_borrow_mut() {
                    let size = container_size(&st.surface.canvas);
                    st.fit(size);
                }
            });
        }

        // Mouse
        {
            let state = state.clone();
            self.listen(canvas, "mousedown", true, move |event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else { return };
                let Ok(mut st) = state.try_borrow_mut() else { return };
                st.audio.resume();
                let pos = st.canvas_point(event.client_x() as f64, event.client_y() as f64);
                st.driver.input_mut().pointer_down(pos);
            });
        }
        {
            let state = state.clone();
            self.listen(canvas, "mousemove", true, move |event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else { return };
                let Ok(mut st) = state.try_borrow_mut() else { return };
                let pos = st.canvas_point(event.client_x() as f64, event.client_y() as f64);
                st.driver.input_mut().pointer_move(pos);
            });
        }
        {
            let state = state.clone();
            self.listen(canvas, "mouseup", true, move |event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else { return };
                let Ok(mut st) = state.try_borrow_mut() else { return };
                let pos = st.canvas_point(event.client_x() as f64, event.client_y() as f64);
                st.driver.input_mut().pointer_up(Some(pos));
            });
        }
        {
            let state = state.clone();
            self.listen(canvas, "mouseleave", true, move |_event| {
                if let Ok(mut st) = state.try_borrow_mut() {
                    st.driver.input_mut().pointer_leave();
                }
            });
        }

        // Touch
        for kind in ["touchstart", "touchmove", "touchend", "touchcancel"] {
            let state = state.clone();
            self.listen(canvas, kind, false, move |event| {
                let Some(event) = event.dyn_ref::<TouchEvent>() else { return };
                event.prevent_default();
                let Ok(mut st) = state.try_borrow_mut() else { return };
                if kind == "touchstart" {
                    st.audio.resume();
                }
                let touches = event.changed_touches();
                let viewport = st.surface.size();
                for i in 0..touches.length() {
                    let Some(touch) = touches.get(i) else { continue };
                    let id = touch.identifier();
                    let pos = st.canvas_point(touch.client_x() as f64, touch.client_y() as f64);
                    let input = st.driver.input_mut();
                    match kind {
                        "touchstart" => input.touch_start(id, pos, viewport),
                        "touchmove" => input.touch_move(id, pos),
                        _ => input.touch_end(id),
                    }
                }
            });
        }
    }
}

impl Drop for ArcadeMount {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Canvas size for the canvas's parent element
fn container_size(canvas: &HtmlCanvasElement) -> Vec2 {
    let (width, height) = canvas
        .parent_element()
        .map(|p| (p.client_width() as f64, p.client_height() as f64))
        .unwrap_or((0.0, 0.0));
    canvas_size(width, height)
}
