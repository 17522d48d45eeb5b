//! Data-driven game definitions
//!
//! Each game is one JSON document embedded at compile time. The engine
//! never branches on which game is running, only on the config.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{ArcadeError, Result};
use crate::sim::state::{GamePhase, Motion, ObjectKind, PlatformKind, PowerUpEffect};
use crate::{Color, ms_to_ticks};

/// The built-in games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameKind {
    CodeQuest,
    DebugDash,
    NeonJump,
    AiAssembly,
}

impl GameKind {
    pub const ALL: [GameKind; 4] = [
        GameKind::CodeQuest,
        GameKind::DebugDash,
        GameKind::NeonJump,
        GameKind::AiAssembly,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            GameKind::CodeQuest => "code-quest",
            GameKind::DebugDash => "debug-dash",
            GameKind::NeonJump => "neon-jump",
            GameKind::AiAssembly => "ai-assembly",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id() == id.trim().to_lowercase())
    }

    fn source(&self) -> &'static str {
        match self {
            GameKind::CodeQuest => include_str!("data/code_quest.json"),
            GameKind::DebugDash => include_str!("data/debug_dash.json"),
            GameKind::NeonJump => include_str!("data/neon_jump.json"),
            GameKind::AiAssembly => include_str!("data/ai_assembly.json"),
        }
    }

    /// Parse the embedded game data
    pub fn config(&self) -> Result<GameConfig> {
        serde_json::from_str(self.source()).map_err(|source| ArcadeError::InvalidConfig {
            game: self.id(),
            source,
        })
    }
}

/// Selector card for one game
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogueEntry {
    pub id: &'static str,
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub desktop_only: bool,
}

/// Everything a game selector page needs to list the games
pub fn catalogue() -> Result<Vec<CatalogueEntry>> {
    GameKind::ALL
        .into_iter()
        .map(|kind| {
            let config = kind.config()?;
            Ok(CatalogueEntry {
                id: kind.id(),
                name: config.name,
                description: config.description,
                difficulty: config.difficulty,
                tags: config.tags,
                desktop_only: config.desktop_only,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// What running out of time means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryPolicy {
    /// Surviving until the end wins
    Won,
    #[default]
    Lost,
}

impl ExpiryPolicy {
    pub fn outcome(self) -> GamePhase {
        match self {
            ExpiryPolicy::Won => GamePhase::Won,
            ExpiryPolicy::Lost => GamePhase::Lost,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinCondition {
    /// Every collectible picked up
    CollectAll,
    /// Goal object touched
    ReachGoal,
    /// Every slot holds its tool
    FillSlots,
    /// Only the clock decides
    Survive,
}

/// How input turns into movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlScheme {
    /// Free eight-way movement
    TopDown {
        speed: f32,
        #[serde(default = "default_boost")]
        boost: f32,
        /// Touch steering ignores offsets from the canvas centre below this
        #[serde(default = "default_touch_dead_zone")]
        touch_dead_zone: f32,
    },
    /// Gravity, jumping and a scrolling camera
    Platformer(PlatformerPhysics),
    /// Click/tap to strike targets
    Pointer {
        /// Half-size of the strike box while the laser is active
        #[serde(default = "default_laser_reach")]
        laser_reach: f32,
    },
    /// Drag tools into slots
    DragDrop {
        #[serde(default = "default_grab_radius")]
        grab_radius: f32,
    },
}

fn default_boost() -> f32 {
    1.8
}
fn default_touch_dead_zone() -> f32 {
    30.0
}
fn default_laser_reach() -> f32 {
    50.0
}
fn default_grab_radius() -> f32 {
    15.0
}

/// Platformer tuning, per tick at 60 Hz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformerPhysics {
    pub gravity: f32,
    pub friction: f32,
    pub run_speed: f32,
    pub jump_power: f32,
    pub coyote_ticks: u32,
    pub jump_buffer_ticks: u32,
    /// Player sits this fraction of the viewport from the left edge
    #[serde(default = "default_camera_lead")]
    pub camera_lead: f32,
    #[serde(default = "default_camera_ease")]
    pub camera_ease: f32,
    /// Falling this far below the canvas is a death
    #[serde(default = "default_fall_margin")]
    pub fall_margin: f32,
    /// Respawn this far above the checkpoint
    #[serde(default = "default_respawn_lift")]
    pub respawn_lift: f32,
}

fn default_camera_lead() -> f32 {
    1.0 / 3.0
}
fn default_camera_ease() -> f32 {
    0.1
}
fn default_fall_margin() -> f32 {
    50.0
}
fn default_respawn_lift() -> f32 {
    20.0
}

/// Which canvas edge a layout y coordinate is measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    #[default]
    Top,
    Center,
    Bottom,
}

/// Layout position that follows the canvas height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub from: Edge,
}

impl Anchor {
    pub fn resolve(&self, height: f32) -> Vec2 {
        let y = match self.from {
            Edge::Top => self.y,
            Edge::Center => height * 0.5 + self.y,
            Edge::Bottom => height - self.y,
        };
        Vec2::new(self.x, y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSpec {
    /// Top-left at spawn
    pub start: Anchor,
    pub size: Vec2,
    pub color: Color,
}

/// Cost of touching a hazard without a shield
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardPenalty {
    #[serde(default)]
    pub seconds: u32,
    #[serde(default)]
    pub knockback: f32,
    #[serde(default)]
    pub respawn: bool,
    #[serde(default = "default_hazard_cooldown")]
    pub cooldown_ticks: u32,
}

fn default_hazard_cooldown() -> u32 {
    HAZARD_COOLDOWN_TICKS
}

impl Default for HazardPenalty {
    fn default() -> Self {
        Self {
            seconds: 0,
            knockback: 0.0,
            respawn: false,
            cooldown_ticks: HAZARD_COOLDOWN_TICKS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboRules {
    #[serde(default = "default_combo_window")]
    pub window_ticks: u32,
    /// Extra points per current combo step
    #[serde(default)]
    pub bonus_per_step: u32,
    /// A strike that hits nothing resets the combo
    #[serde(default)]
    pub miss_resets: bool,
}

fn default_combo_window() -> u32 {
    COMBO_WINDOW_TICKS
}

impl Default for ComboRules {
    fn default() -> Self {
        Self {
            window_ticks: COMBO_WINDOW_TICKS,
            bonus_per_step: 0,
            miss_resets: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleRules {
    /// Life lost per tick
    #[serde(default = "default_particle_fade")]
    pub fade: f32,
    /// Background sparks rising from the bottom edge
    #[serde(default)]
    pub ambient: Option<AmbientSparks>,
}

fn default_particle_fade() -> f32 {
    PARTICLE_FADE
}

impl Default for ParticleRules {
    fn default() -> Self {
        Self {
            fade: PARTICLE_FADE,
            ambient: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientSparks {
    /// Chance per tick of one new spark
    pub chance: f32,
    pub colors: Vec<Color>,
}

/// One entry of the initial object layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpec {
    pub kind: ObjectKind,
    /// Centre
    pub at: Anchor,
    #[serde(default)]
    pub size: Vec2,
    #[serde(default)]
    pub radius: f32,
    #[serde(default)]
    pub speed: f32,
    #[serde(default)]
    pub motion: Motion,
    #[serde(default)]
    pub points: u32,
    pub color: Color,
    #[serde(default)]
    pub sprite: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_burst")]
    pub burst: usize,
}

fn default_burst() -> usize {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSpec {
    /// Top-left
    pub at: Anchor,
    pub size: Vec2,
    pub color: Color,
    #[serde(default)]
    pub kind: PlatformKind,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointSpec {
    /// Top-left of the flag
    pub at: Anchor,
    #[serde(default)]
    pub activated: bool,
}

/// Runtime spawning of targets and power-ups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnerSpec {
    pub targets: Vec<TargetTemplate>,
    pub interval: SpawnInterval,
    /// Targets spawn at least this far from the canvas edges
    #[serde(default = "default_target_margin")]
    pub margin: f32,
    #[serde(default)]
    pub power_ups: Vec<PowerUpTemplate>,
    #[serde(default)]
    pub power_up_interval_ms: f32,
    #[serde(default)]
    pub power_up_jitter_ms: f32,
    #[serde(default = "default_power_up_margin")]
    pub power_up_margin: f32,
}

fn default_target_margin() -> f32 {
    20.0
}
fn default_power_up_margin() -> f32 {
    15.0
}

impl SpawnerSpec {
    /// Weighted pick; `roll` in [0, 1)
    pub fn pick_target(&self, roll: f32) -> Option<usize> {
        let total: u32 = self.targets.iter().map(|t| t.weight).sum();
        if total == 0 {
            return None;
        }
        let mut remaining = roll.clamp(0.0, 1.0) * total as f32;
        for (i, t) in self.targets.iter().enumerate() {
            remaining -= t.weight as f32;
            if remaining <= 0.0 {
                return Some(i);
            }
        }
        Some(self.targets.len() - 1)
    }
}

/// Spawn period that shrinks as the clock runs down
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnInterval {
    pub base_ms: f32,
    #[serde(default)]
    pub per_second_left_ms: f32,
    pub min_ms: f32,
}

impl SpawnInterval {
    /// `max(min, base - per_second_left * time_left)`, in ticks
    pub fn ticks(&self, time_left: u32) -> u32 {
        let ms = (self.base_ms - self.per_second_left_ms * time_left as f32).max(self.min_ms);
        ms_to_ticks(ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetTemplate {
    pub name: String,
    #[serde(default)]
    pub weight: u32,
    /// Hit radius
    pub size: f32,
    #[serde(default)]
    pub size_jitter: f32,
    pub speed: f32,
    pub points: u32,
    pub color: Color,
    #[serde(default)]
    pub motion: Motion,
    /// Life lost per tick
    #[serde(default)]
    pub fade: f32,
    #[serde(default = "default_burst")]
    pub burst: usize,
    #[serde(default)]
    pub sprite: String,
    /// Children spawned when destroyed (one level only)
    #[serde(default)]
    pub split: Option<SplitRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRule {
    pub count: u32,
    /// Children land within this many pixels of the parent on each axis
    pub spread: f32,
    pub child: Box<TargetTemplate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpTemplate {
    pub effect: PowerUpEffect,
    pub color: Color,
    #[serde(default = "default_power_up_radius")]
    pub radius: f32,
    #[serde(default)]
    pub fade: f32,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub sprite: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_power_up_burst")]
    pub burst: usize,
}

fn default_power_up_radius() -> f32 {
    15.0
}
fn default_power_up_burst() -> usize {
    8
}

/// HUD line items, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HudField {
    Time,
    Score,
    Collected,
    Combo,
    MaxCombo,
    Deaths,
    Checkpoint,
    Effects,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub background: Color,
    pub background_alt: Color,
    pub grid: Color,
    pub text: Color,
    pub accent: Color,
    pub won: Color,
    pub lost: Color,
    /// Draw the scrolling parallax layers
    #[serde(default)]
    pub parallax: bool,
}

/// Complete description of one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub instructions: String,
    /// Seconds; absent for untimed games
    #[serde(default)]
    pub time_limit: Option<u32>,
    #[serde(default)]
    pub on_expire: ExpiryPolicy,
    pub win: WinCondition,
    pub controls: ControlScheme,
    #[serde(default)]
    pub desktop_only: bool,
    /// Scrolling world width (platformer)
    #[serde(default)]
    pub world_width: Option<f32>,
    pub player: PlayerSpec,
    #[serde(default)]
    pub hazard: HazardPenalty,
    #[serde(default)]
    pub combo: ComboRules,
    #[serde(default)]
    pub particles: ParticleRules,
    #[serde(default)]
    pub objects: Vec<ObjectSpec>,
    #[serde(default)]
    pub platforms: Vec<PlatformSpec>,
    #[serde(default)]
    pub checkpoints: Vec<CheckpointSpec>,
    #[serde(default)]
    pub spawner: Option<SpawnerSpec>,
    #[serde(default)]
    pub hud: Vec<HudField>,
    pub palette: Palette,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_games_parse() {
        for kind in GameKind::ALL {
            let config = kind.config();
            assert!(config.is_ok(), "{}: {:?}", kind.id(), config.err());
        }
    }

    #[test]
    fn test_from_id() {
        assert_eq!(GameKind::from_id("neon-jump"), Some(GameKind::NeonJump));
        assert_eq!(GameKind::from_id(" Debug-Dash "), Some(GameKind::DebugDash));
        assert_eq!(GameKind::from_id("pong"), None);
        for kind in GameKind::ALL {
            assert_eq!(GameKind::from_id(kind.id()), Some(kind));
        }
    }

    #[test]
    fn test_expiry_policies() {
        let quest = GameKind::CodeQuest.config().unwrap();
        let dash = GameKind::DebugDash.config().unwrap();
        let jump = GameKind::NeonJump.config().unwrap();
        let assembly = GameKind::AiAssembly.config().unwrap();
        assert_eq!(quest.on_expire.outcome(), GamePhase::Lost);
        assert_eq!(dash.on_expire.outcome(), GamePhase::Won);
        assert_eq!(jump.on_expire.outcome(), GamePhase::Lost);
        assert_eq!(quest.time_limit, Some(45));
        assert_eq!(dash.time_limit, Some(30));
        assert_eq!(jump.time_limit, Some(60));
        assert_eq!(assembly.time_limit, None);
        assert!(dash.desktop_only);
    }

    #[test]
    fn test_catalogue() {
        let entries = catalogue().unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].name, "Code Quest");
        assert_eq!(entries[0].difficulty, Difficulty::Easy);
        assert_eq!(entries[1].difficulty, Difficulty::Medium);
        assert_eq!(entries[2].difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_anchor_resolve() {
        let a = Anchor { x: 10.0, y: 20.0, from: Edge::Bottom };
        assert_eq!(a.resolve(320.0), Vec2::new(10.0, 300.0));
        let c = Anchor { x: 30.0, y: -8.0, from: Edge::Center };
        assert_eq!(c.resolve(320.0), Vec2::new(30.0, 152.0));
    }

    #[test]
    fn test_spawn_interval() {
        let interval = SpawnInterval {
            base_ms: 1500.0,
            per_second_left_ms: 30.0,
            min_ms: 500.0,
        };
        // 30 s left: max(500, 600) = 600 ms
        assert_eq!(interval.ticks(30), 36);
        // 0 s left: 1500 ms
        assert_eq!(interval.ticks(0), 90);
        // never below the floor
        assert_eq!(interval.ticks(100), 30);
    }

    #[test]
    fn test_weighted_pick() {
        let dash = GameKind::DebugDash.config().unwrap();
        let spawner = dash.spawner.unwrap();
        assert_eq!(spawner.pick_target(0.0), Some(0));
        assert_eq!(spawner.pick_target(0.49), Some(0));
        assert_eq!(spawner.pick_target(0.6), Some(1));
        assert_eq!(spawner.pick_target(0.8), Some(2));
        assert_eq!(spawner.pick_target(0.95), Some(3));
        assert!(spawner.targets[3].split.is_some());
    }
}
