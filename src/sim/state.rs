//! Game session and core simulation types
//!
//! Everything a playthrough mutates lives in one `Session`.

use std::sync::Arc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use crate::Color;
use crate::consts::*;
use crate::games::{ControlScheme, GameConfig};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Terminal: win condition met
    Won,
    /// Terminal: out of time or otherwise failed
    Lost,
}

impl GamePhase {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GamePhase::Playing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GamePhase::Playing => "playing",
            GamePhase::Won => "won",
            GamePhase::Lost => "lost",
        }
    }
}

/// Timed status effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Hazards pass harmlessly
    Shield,
    /// Movement speed boost
    Speed,
    /// Targets stop moving and fading
    Freeze,
    /// Target points doubled
    DoublePoints,
    /// Strikes hit anything in a wide box
    Laser,
}

impl Effect {
    pub const ALL: [Effect; 5] = [
        Effect::Shield,
        Effect::Speed,
        Effect::Freeze,
        Effect::DoublePoints,
        Effect::Laser,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Effect::Shield => "Shield",
            Effect::Speed => "Speed",
            Effect::Freeze => "Freeze",
            Effect::DoublePoints => "2x Points",
            Effect::Laser => "Laser",
        }
    }
}

/// Remaining ticks per effect (0 = inactive)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub shield: u32,
    pub speed: u32,
    pub freeze: u32,
    pub double_points: u32,
    pub laser: u32,
}

impl ActiveEffects {
    fn slot_mut(&mut self, effect: Effect) -> &mut u32 {
        match effect {
            Effect::Shield => &mut self.shield,
            Effect::Speed => &mut self.speed,
            Effect::Freeze => &mut self.freeze,
            Effect::DoublePoints => &mut self.double_points,
            Effect::Laser => &mut self.laser,
        }
    }

    pub fn remaining(&self, effect: Effect) -> u32 {
        match effect {
            Effect::Shield => self.shield,
            Effect::Speed => self.speed,
            Effect::Freeze => self.freeze,
            Effect::DoublePoints => self.double_points,
            Effect::Laser => self.laser,
        }
    }

    pub fn is_active(&self, effect: Effect) -> bool {
        self.remaining(effect) > 0
    }

    /// Start (or restart) an effect
    pub fn grant(&mut self, effect: Effect, ticks: u32) {
        *self.slot_mut(effect) = ticks;
    }

    pub fn decay(&mut self) {
        for effect in Effect::ALL {
            let slot = self.slot_mut(effect);
            *slot = slot.saturating_sub(1);
        }
    }

    pub fn active(&self) -> Vec<Effect> {
        Effect::ALL.into_iter().filter(|e| self.is_active(*e)).collect()
    }
}

/// What a power-up does when picked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PowerUpEffect {
    Grant { effect: Effect, ticks: u32 },
    AddTime { seconds: u32 },
}

/// The one player entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub on_ground: bool,
    /// Ticks left in which a jump still succeeds after leaving ground
    pub coyote_ticks: u32,
    /// Ticks left in which a pressed jump is remembered
    pub jump_buffer_ticks: u32,
    /// Jump key was down last tick (press edge detection)
    pub jump_held: bool,
    /// Immunity after an unshielded hazard hit
    pub hit_cooldown: u32,
    pub effects: ActiveEffects,
}

impl Player {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            size,
            on_ground: false,
            coyote_ticks: 0,
            jump_buffer_ticks: 0,
            jump_held: false,
            hit_cooldown: 0,
            effects: ActiveEffects::default(),
        }
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    pub fn rect(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }
}

/// Visual/rule category of an interactive object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectKind {
    /// Touched by the player for points
    Collectible,
    /// Touched or struck for a timed effect
    PowerUp { effect: PowerUpEffect },
    /// Penalizes the player on contact
    Hazard,
    /// Struck by the pointer; `split` names the spawner table entry whose
    /// children appear when it is destroyed
    Target {
        #[serde(default)]
        split: Option<usize>,
    },
    /// Reaching it wins
    Goal,
    /// Dragged into the slot that accepts `tool`
    Draggable {
        tool: String,
        #[serde(default)]
        placed: bool,
    },
}

/// Per-tick movement pattern
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Motion {
    #[default]
    Still,
    /// Back and forth along the long axis, bouncing at the viewport edges
    Patrol { dir: f32 },
    /// Random jitter
    Wander,
    /// Straight toward the viewport centre
    Seek,
    /// Slow circular drift
    Drift { rate: f32, scale: f32 },
}

/// Collectible, hazard, power-up, target, goal or draggable tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractiveObject {
    pub id: u32,
    pub kind: ObjectKind,
    /// Centre
    pub pos: Vec2,
    pub size: Vec2,
    /// Proximity radius for circular tests
    pub radius: f32,
    pub speed: f32,
    pub motion: Motion,
    pub points: u32,
    pub color: Color,
    pub sprite: String,
    pub label: String,
    /// Cleared on collection; never set again
    pub active: bool,
    /// 1.0 at spawn; objects with `fade > 0` expire at zero
    pub life: f32,
    pub fade: f32,
    /// Animation offset
    pub phase: f32,
    /// Return position for draggables
    pub home: Vec2,
    /// Particles emitted when collected or destroyed
    pub burst: usize,
    /// Spawned at runtime; removed by compaction once inactive
    pub transient: bool,
}

impl InteractiveObject {
    pub fn rect(&self) -> Aabb {
        Aabb::from_center(self.pos, self.size)
    }
}

/// Platform behaviour
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlatformKind {
    #[default]
    Static,
    /// Oscillates horizontally between `origin_x` and `origin_x + range`
    Moving {
        speed: f32,
        range: f32,
        dir: f32,
        #[serde(default)]
        origin_x: f32,
    },
    /// Solid until the countdown reaches zero, then passable for good
    Vanishing { ticks: u32 },
    /// Drop target for the draggable whose tool matches `accepts`
    Slot {
        accepts: String,
        #[serde(default)]
        filled: Option<u32>,
    },
}

/// Solid geometry or drop slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: u32,
    pub rect: Aabb,
    pub kind: PlatformKind,
    pub passable: bool,
    pub color: Color,
    pub label: String,
}

impl Platform {
    pub fn is_solid(&self) -> bool {
        !self.passable && !matches!(self.kind, PlatformKind::Slot { .. })
    }
}

/// Respawn anchor; activation is one-way
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Top-left of the flag
    pub pos: Vec2,
    pub activated: bool,
}

impl Checkpoint {
    pub fn rect(&self) -> Aabb {
        Aabb::new(self.pos, Vec2::new(CHECKPOINT_WIDTH, CHECKPOINT_HEIGHT))
    }
}

/// A particle for visual effects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: Color,
    pub life: f32, // decreases toward 0
    pub size: f32,
}

/// In-progress pointer drag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Drag {
    pub id: u32,
    pub offset: Vec2,
}

/// Things that happened during a tick, drained by the driver
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Collected { id: u32, points: u32 },
    PowerUp { id: u32, effect: PowerUpEffect },
    HazardHit { id: u32 },
    Struck { id: u32, points: u32 },
    Missed,
    Split { parent: u32, spawned: usize },
    Placed { id: u32, slot: u32 },
    Rejected { id: u32 },
    Jumped,
    Landed,
    CheckpointReached { index: usize },
    Respawned { deaths: u32 },
    ParticleBurst { at: Vec2, count: usize },
    Transition { from: GamePhase, to: GamePhase },
}

/// One playthrough
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub config: Arc<GameConfig>,
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Canvas size in CSS pixels
    pub viewport: Vec2,
    /// Playable area the player is clamped to
    pub bounds: Aabb,
    /// Seconds; `None` for untimed games
    pub time_left: Option<u32>,
    pub score: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub combo_ticks: u32,
    pub collected: u32,
    pub total_collectibles: u32,
    pub deaths: u32,
    pub tick_count: u64,
    pub player: Player,
    pub spawn_point: Vec2,
    /// Creation order; compaction preserves it
    pub objects: Vec<InteractiveObject>,
    pub platforms: Vec<Platform>,
    pub checkpoints: Vec<Checkpoint>,
    pub current_checkpoint: usize,
    pub goal_reached: bool,
    pub camera_x: f32,
    pub drag: Option<Drag>,
    pub target_spawn_ticks: u32,
    pub power_up_spawn_ticks: u32,
    pub particles: Vec<Particle>,
    pub max_particles: usize,
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl Session {
    pub fn new(config: Arc<GameConfig>, viewport: Vec2, seed: u64) -> Self {
        let player_size = config.player.size;
        let mut session = Self {
            config,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Playing,
            viewport,
            bounds: Aabb::new(Vec2::ZERO, viewport),
            time_left: None,
            score: 0,
            combo: 0,
            max_combo: 0,
            combo_ticks: 0,
            collected: 0,
            total_collectibles: 0,
            deaths: 0,
            tick_count: 0,
            player: Player::new(Vec2::ZERO, player_size),
            spawn_point: Vec2::ZERO,
            objects: Vec::new(),
            platforms: Vec::new(),
            checkpoints: Vec::new(),
            current_checkpoint: 0,
            goal_reached: false,
            camera_x: 0.0,
            drag: None,
            target_spawn_ticks: 0,
            power_up_spawn_ticks: 0,
            particles: Vec::new(),
            max_particles: MAX_PARTICLES,
            events: Vec::new(),
            next_id: 1,
        };
        session.reset_for_level();
        log::info!(
            "Session created: {} (seed {}, {}x{})",
            session.config.name,
            seed,
            viewport.x,
            viewport.y
        );
        session
    }

    /// Full re-creation from the same config, viewport and seed
    pub fn reset(&mut self) {
        *self = Session::new(self.config.clone(), self.viewport, self.seed);
    }

    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Populate player, objects, platforms and checkpoints from the layout
    /// and clear every timer, counter and particle.
    pub fn reset_for_level(&mut self) {
        let config = self.config.clone();
        let height = self.viewport.y;

        self.phase = GamePhase::Playing;
        self.time_left = config.time_limit;
        self.score = 0;
        self.combo = 0;
        self.max_combo = 0;
        self.combo_ticks = 0;
        self.collected = 0;
        self.deaths = 0;
        self.tick_count = 0;
        self.current_checkpoint = 0;
        self.goal_reached = false;
        self.camera_x = 0.0;
        self.drag = None;
        self.target_spawn_ticks = 0;
        self.power_up_spawn_ticks = 0;
        self.particles.clear();
        self.events.clear();
        self.next_id = 1;
        self.bounds = world_bounds(&config, self.viewport);

        self.spawn_point = config.player.start.resolve(height);
        self.player = Player::new(self.spawn_point, config.player.size);

        self.objects.clear();
        for spec in &config.objects {
            let id = self.next_entity_id();
            let pos = spec.at.resolve(height);
            self.objects.push(InteractiveObject {
                id,
                kind: spec.kind.clone(),
                pos,
                size: spec.size,
                radius: spec.radius,
                speed: spec.speed,
                motion: spec.motion,
                points: spec.points,
                color: spec.color,
                sprite: spec.sprite.clone(),
                label: spec.label.clone(),
                active: true,
                life: 1.0,
                fade: 0.0,
                phase: id as f32 * 0.7,
                home: pos,
                burst: spec.burst,
                transient: false,
            });
        }
        self.total_collectibles = self
            .objects
            .iter()
            .filter(|o| matches!(o.kind, ObjectKind::Collectible))
            .count() as u32;

        self.platforms.clear();
        for spec in &config.platforms {
            let id = self.next_entity_id();
            let rect = Aabb::new(spec.at.resolve(height), spec.size);
            let mut kind = spec.kind.clone();
            if let PlatformKind::Moving { origin_x, .. } = &mut kind {
                *origin_x = rect.min.x;
            }
            self.platforms.push(Platform {
                id,
                rect,
                kind,
                passable: false,
                color: spec.color,
                label: spec.label.clone(),
            });
        }

        self.checkpoints = config
            .checkpoints
            .iter()
            .map(|c| Checkpoint {
                pos: c.at.resolve(height),
                activated: c.activated,
            })
            .collect();
    }

    /// Track a canvas resize; layout stays where it was, bounds follow
    pub fn set_viewport(&mut self, viewport: Vec2) {
        if !viewport.is_finite() || viewport.x <= 0.0 || viewport.y <= 0.0 {
            return;
        }
        self.viewport = viewport;
        self.bounds = world_bounds(&self.config, viewport);
        self.clamp_player();
    }

    pub fn set_max_particles(&mut self, max: usize) {
        self.max_particles = max.min(MAX_PARTICLES);
        self.particles.truncate(self.max_particles);
    }

    /// Move to a terminal phase. Only fires from `Playing`; returns whether it did.
    pub fn transition(&mut self, to: GamePhase) -> bool {
        if self.phase != GamePhase::Playing || to == GamePhase::Playing {
            return false;
        }
        let from = self.phase;
        self.phase = to;
        self.drag = None;
        log::info!(
            "{}: {} -> {} (score {}, tick {})",
            self.config.name,
            from.as_str(),
            to.as_str(),
            self.score,
            self.tick_count
        );
        self.events.push(GameEvent::Transition { from, to });
        true
    }

    /// Clamp the player rectangle into the playable bounds
    pub fn clamp_player(&mut self) {
        self.player.pos = self.bounds.clamp_rect(self.player.pos, self.player.size);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Register a point-scoring hit on the combo counter
    pub fn bump_combo(&mut self) {
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.combo_ticks = self.config.combo.window_ticks;
    }

    pub fn break_combo(&mut self) {
        self.combo = 0;
        self.combo_ticks = 0;
    }

    /// Queue a radial particle burst
    pub fn burst(&mut self, at: Vec2, count: usize, color: Color, speed: f32, life: f32) {
        if count == 0 {
            return;
        }
        for _ in 0..count {
            if self.particles.len() >= self.max_particles {
                break;
            }
            let vel = Vec2::new(
                (self.rng.random::<f32>() - 0.5) * speed * 2.0,
                (self.rng.random::<f32>() - 0.5) * speed * 2.0,
            );
            self.particles.push(Particle {
                pos: at,
                vel,
                color,
                life,
                size: 3.0,
            });
        }
        self.events.push(GameEvent::ParticleBurst { at, count });
    }

    pub fn object(&self, id: u32) -> Option<&InteractiveObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// (filled, total) drop slots
    pub fn slots_filled(&self) -> (usize, usize) {
        let slots = self
            .platforms
            .iter()
            .filter_map(|p| match &p.kind {
                PlatformKind::Slot { filled, .. } => Some(filled.is_some()),
                _ => None,
            })
            .collect::<Vec<_>>();
        (slots.iter().filter(|f| **f).count(), slots.len())
    }
}

/// Player bounds for a config: the canvas, or the scrolling world with room
/// above the screen and below it for the pit.
pub fn world_bounds(config: &GameConfig, viewport: Vec2) -> Aabb {
    match &config.controls {
        ControlScheme::Platformer(physics) => {
            let width = config.world_width.unwrap_or(viewport.x).max(viewport.x);
            Aabb {
                min: Vec2::new(0.0, -viewport.y),
                max: Vec2::new(
                    width,
                    viewport.y + physics.fall_margin + config.player.size.y,
                ),
            }
        }
        _ => Aabb::new(Vec2::ZERO, viewport),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::GameKind;

    fn session(kind: GameKind) -> Session {
        let config = Arc::new(kind.config().unwrap());
        Session::new(config, Vec2::new(500.0, 320.0), 42)
    }

    #[test]
    fn test_new_session_layout() {
        let s = session(GameKind::CodeQuest);
        assert_eq!(s.phase, GamePhase::Playing);
        assert_eq!(s.time_left, Some(45));
        assert_eq!(s.total_collectibles, 6);
        assert_eq!(s.player.pos, Vec2::new(30.0, 152.0));
        assert!(s.objects.iter().all(|o| o.active));
    }

    #[test]
    fn test_entity_ids_unique_and_ordered() {
        let s = session(GameKind::NeonJump);
        let mut ids: Vec<u32> = s.objects.iter().map(|o| o.id).collect();
        ids.extend(s.platforms.iter().map(|p| p.id));
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids.len(), sorted.len());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut a = session(GameKind::DebugDash);
        a.score = 999;
        a.transition(GamePhase::Won);
        a.reset();
        let mut b = a.clone();
        b.reset();
        assert_eq!(a, b);
        assert_eq!(a.phase, GamePhase::Playing);
        assert_eq!(a.score, 0);
    }

    #[test]
    fn test_transition_only_from_playing() {
        let mut s = session(GameKind::CodeQuest);
        assert!(s.transition(GamePhase::Won));
        assert!(!s.transition(GamePhase::Lost));
        assert!(!s.transition(GamePhase::Won));
        assert_eq!(s.phase, GamePhase::Won);
        let transitions = s
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::Transition { .. }))
            .count();
        assert_eq!(transitions, 1);
    }

    #[test]
    fn test_moving_platform_origin() {
        let s = session(GameKind::NeonJump);
        for p in &s.platforms {
            if let PlatformKind::Moving { origin_x, .. } = p.kind {
                assert_eq!(origin_x, p.rect.min.x);
            }
        }
    }

    #[test]
    fn test_effects_grant_and_decay() {
        let mut fx = ActiveEffects::default();
        fx.grant(Effect::Shield, 2);
        assert!(fx.is_active(Effect::Shield));
        fx.decay();
        fx.decay();
        fx.decay();
        assert!(!fx.is_active(Effect::Shield));
        assert_eq!(fx.remaining(Effect::Shield), 0);
        assert!(fx.active().is_empty());
    }

    #[test]
    fn test_particle_cap() {
        let mut s = session(GameKind::CodeQuest);
        s.set_max_particles(10);
        s.burst(Vec2::ZERO, 50, Color::WHITE, 3.0, 1.0);
        assert_eq!(s.particles.len(), 10);
    }

    #[test]
    fn test_world_bounds_platformer() {
        let s = session(GameKind::NeonJump);
        assert_eq!(s.bounds.min.x, 0.0);
        assert_eq!(s.bounds.max.x, 1550.0);
        assert!(s.bounds.max.y > s.viewport.y);
    }
}
