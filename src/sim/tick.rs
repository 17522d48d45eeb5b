//! Simulation tick
//!
//! One call = one display frame: input, physics and timers, rules, then
//! clamping. The one-second clock runs separately through `tick_second`.

use glam::Vec2;
use rand::Rng;

use super::collision::{Contact, resolve_platform};
use super::rules;
use super::state::{Effect, GameEvent, Motion, ObjectKind, Particle, PlatformKind, Session};
use crate::consts::*;
use crate::games::{ControlScheme, PlatformerPhysics};
use crate::{finite_vec_or, ms_to_ticks};

const LANDING_BURST: usize = 5;
const JUMP_BURST: usize = 5;

/// Input for a single tick, already normalized by the input router
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// -1, 0 or 1
    pub move_x: i8,
    /// -1, 0 or 1 (down is positive)
    pub move_y: i8,
    /// Jump/action button held
    pub action: bool,
    /// Pointer position in canvas pixels
    pub pointer: Option<Vec2>,
    /// Pointer went down since the last tick
    pub pressed: bool,
    /// Pointer went up since the last tick
    pub released: bool,
}

impl TickInput {
    pub fn direction(&self) -> Vec2 {
        Vec2::new(self.move_x.signum() as f32, self.move_y.signum() as f32)
    }
}

/// Advance the session by one tick
pub fn tick(session: &mut Session, input: &TickInput) {
    if session.phase.is_terminal() {
        return;
    }
    session.tick_count += 1;

    let config = session.config.clone();
    advance_platforms(session);
    match &config.controls {
        ControlScheme::TopDown { speed, boost, .. } => step_top_down(session, input, *speed, *boost),
        ControlScheme::Platformer(physics) => step_platformer(session, input, physics),
        ControlScheme::Pointer { .. } => step_pointer(session, input),
        ControlScheme::DragDrop { grab_radius } => step_drag(session, input, *grab_radius),
    }
    run_spawner(session);
    advance_objects(session);

    match &config.controls {
        ControlScheme::TopDown { .. } => rules::touch_objects(session),
        ControlScheme::Platformer(_) => {
            rules::touch_objects(session);
            rules::touch_checkpoints(session);
        }
        ControlScheme::Pointer { .. } | ControlScheme::DragDrop { .. } => {}
    }

    rules::decay_combo(session);
    session.player.effects.decay();
    session.player.hit_cooldown = session.player.hit_cooldown.saturating_sub(1);
    emit_ambient(session);
    rules::compact(session);

    sanitize(session);
    session.clamp_player();
    rules::check_outcome(session);
}

/// One wall-clock second elapsed
pub fn tick_second(session: &mut Session) {
    if session.phase.is_terminal() {
        return;
    }
    let Some(left) = session.time_left else {
        return;
    };
    let left = left.saturating_sub(1);
    session.time_left = Some(left);
    if left == 0 {
        let outcome = session.config.on_expire.outcome();
        session.transition(outcome);
    }
}

fn step_top_down(session: &mut Session, input: &TickInput, speed: f32, boost: f32) {
    let player = &mut session.player;
    let speed = if player.effects.is_active(Effect::Speed) {
        speed * boost
    } else {
        speed
    };
    player.vel = input.direction() * speed;
    player.pos += player.vel;
    session.clamp_player();
}

fn step_platformer(session: &mut Session, input: &TickInput, physics: &PlatformerPhysics) {
    let player = &mut session.player;

    // Horizontal
    if input.move_x < 0 {
        player.vel.x = -physics.run_speed;
    } else if input.move_x > 0 {
        player.vel.x = physics.run_speed;
    } else {
        player.vel.x *= physics.friction;
    }

    // Jump on the press edge only
    if input.action {
        if !player.jump_held {
            player.jump_held = true;
            player.jump_buffer_ticks = physics.jump_buffer_ticks;
        }
    } else {
        player.jump_held = false;
    }

    let mut jumped = false;
    if player.jump_buffer_ticks > 0 && (player.on_ground || player.coyote_ticks > 0) {
        player.vel.y = -physics.jump_power;
        player.on_ground = false;
        player.coyote_ticks = 0;
        player.jump_buffer_ticks = 0;
        jumped = true;
    }
    player.jump_buffer_ticks = player.jump_buffer_ticks.saturating_sub(1);
    player.coyote_ticks = player.coyote_ticks.saturating_sub(1);

    player.vel.y += physics.gravity;
    player.pos += player.vel;

    if jumped {
        let feet = Vec2::new(player.center().x, player.pos.y + player.size.y);
        let color = session.config.player.color;
        session.burst(feet, JUMP_BURST, color, 2.0, 0.5);
        session.events.push(GameEvent::Jumped);
    }

    // Camera
    let target = session.player.pos.x - session.viewport.x * physics.camera_lead;
    session.camera_x += (target - session.camera_x) * physics.camera_ease;
    let max_camera = (session.bounds.max.x - session.viewport.x).max(0.0);
    session.camera_x = session.camera_x.clamp(0.0, max_camera);

    // Pit
    if session.player.pos.y > session.viewport.y + physics.fall_margin {
        rules::respawn(session);
    }

    // Platforms
    let was_on_ground = session.player.on_ground;
    session.player.on_ground = false;
    let mut landed_on = None;
    for platform in session.platforms.iter().filter(|p| p.is_solid()) {
        if resolve_platform(&mut session.player, &platform.rect) == Contact::Landed {
            session.player.on_ground = true;
            session.player.coyote_ticks = physics.coyote_ticks;
            landed_on = Some(platform.color);
        }
    }
    if let Some(color) = landed_on
        && !was_on_ground
    {
        let player = &session.player;
        let feet = Vec2::new(player.center().x, player.pos.y + player.size.y);
        session.burst(feet, LANDING_BURST, color, 2.0, 0.5);
        session.events.push(GameEvent::Landed);
    }
}

fn step_pointer(session: &mut Session, input: &TickInput) {
    let Some(pointer) = input.pointer else { return };
    follow_pointer(session, pointer);
    if input.pressed {
        rules::strike_at(session, pointer);
    }
}

fn step_drag(session: &mut Session, input: &TickInput, grab_radius: f32) {
    if let Some(pointer) = input.pointer {
        follow_pointer(session, pointer);
        if input.pressed {
            rules::grab_at(session, pointer, grab_radius);
        }
        rules::drag_to(session, pointer);
    }
    if input.released {
        rules::release(session);
    }
}

/// Pointer games keep the player as a cursor marker
fn follow_pointer(session: &mut Session, pointer: Vec2) {
    if pointer.is_finite() {
        session.player.pos = pointer - session.player.size * 0.5;
    }
}

fn advance_platforms(session: &mut Session) {
    for platform in &mut session.platforms {
        match &mut platform.kind {
            PlatformKind::Moving {
                speed,
                range,
                dir,
                origin_x,
            } => {
                platform.rect.translate(Vec2::new(*speed * *dir, 0.0));
                if platform.rect.min.x <= *origin_x {
                    *dir = dir.abs();
                } else if platform.rect.min.x >= *origin_x + *range {
                    *dir = -dir.abs();
                }
            }
            PlatformKind::Vanishing { ticks } => {
                *ticks = ticks.saturating_sub(1);
                if *ticks == 0 {
                    platform.passable = true;
                }
            }
            PlatformKind::Static | PlatformKind::Slot { .. } => {}
        }
    }
}

/// Object motion and fading; targets hold still while frozen
fn advance_objects(session: &mut Session) {
    let frozen = session.player.effects.is_active(Effect::Freeze);
    let viewport = session.viewport;
    let time_ms = session.tick_count as f32 * TICK_MS;
    let rng = &mut session.rng;

    for obj in session.objects.iter_mut().filter(|o| o.active) {
        let is_target = matches!(obj.kind, ObjectKind::Target { .. });
        if frozen && is_target {
            continue;
        }

        match obj.motion {
            Motion::Still => {}
            Motion::Patrol { dir } => {
                let horizontal = obj.size.x > obj.size.y;
                let mut dir = dir;
                if horizontal {
                    obj.pos.x += obj.speed * dir;
                    let rect = obj.rect();
                    if rect.min.x <= 0.0 {
                        dir = dir.abs();
                    } else if rect.max.x >= viewport.x {
                        dir = -dir.abs();
                    }
                } else {
                    obj.pos.y += obj.speed * dir;
                    let rect = obj.rect();
                    if rect.min.y <= 0.0 {
                        dir = dir.abs();
                    } else if rect.max.y >= viewport.y {
                        dir = -dir.abs();
                    }
                }
                obj.motion = Motion::Patrol { dir };
            }
            Motion::Wander => {
                let jitter = Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5);
                obj.pos += jitter * obj.speed;
            }
            Motion::Seek => {
                let heading = (viewport * 0.5 - obj.pos).normalize_or_zero();
                obj.pos += heading * obj.speed;
            }
            Motion::Drift { rate, scale } => {
                let angle = time_ms * rate + obj.id as f32;
                obj.pos += Vec2::new(angle.sin(), angle.cos()) * obj.speed * scale;
            }
        }

        if is_target {
            obj.pos = rules::clamp_inside(obj.pos, obj.radius, viewport);
        }

        if obj.fade > 0.0 {
            obj.life -= obj.fade;
            if obj.life <= 0.0 {
                obj.life = 0.0;
                obj.active = false;
            }
        }
    }
}

/// Timed target and power-up spawning
fn run_spawner(session: &mut Session) {
    let config = session.config.clone();
    let Some(spawner) = config.spawner.as_ref() else {
        return;
    };
    let viewport = session.viewport;

    if session.target_spawn_ticks == 0 {
        let roll = session.rng.random::<f32>();
        if let Some(index) = spawner.pick_target(roll) {
            let template = &spawner.targets[index];
            let pos = random_point(session, spawner.margin, viewport);
            let split = template.split.as_ref().map(|_| index);
            rules::spawn_target(session, template, pos, split);
        }
        session.target_spawn_ticks = spawner.interval.ticks(session.time_left.unwrap_or(0));
    } else {
        session.target_spawn_ticks -= 1;
    }

    if spawner.power_ups.is_empty() {
        return;
    }
    if session.power_up_spawn_ticks == 0 {
        let index = session.rng.random_range(0..spawner.power_ups.len());
        let pos = random_point(session, spawner.power_up_margin, viewport);
        rules::spawn_power_up(session, &spawner.power_ups[index], pos);
        let delay = spawner.power_up_interval_ms
            + session.rng.random::<f32>() * spawner.power_up_jitter_ms;
        session.power_up_spawn_ticks = ms_to_ticks(delay);
    } else {
        session.power_up_spawn_ticks -= 1;
    }
}

fn random_point(session: &mut Session, margin: f32, viewport: Vec2) -> Vec2 {
    let span = (viewport - Vec2::splat(margin * 2.0)).max(Vec2::ZERO);
    Vec2::new(
        margin + session.rng.random::<f32>() * span.x,
        margin + session.rng.random::<f32>() * span.y,
    )
}

/// Cosmetic sparks rising from the bottom edge
fn emit_ambient(session: &mut Session) {
    let config = session.config.clone();
    let Some(ambient) = config.particles.ambient.as_ref() else {
        return;
    };
    if ambient.colors.is_empty() || session.particles.len() >= session.max_particles {
        return;
    }
    if session.rng.random::<f32>() >= ambient.chance {
        return;
    }
    let rng = &mut session.rng;
    let pos = Vec2::new(rng.random::<f32>() * session.viewport.x, session.viewport.y + 10.0);
    let vel = Vec2::new(rng.random::<f32>() - 0.5, -rng.random::<f32>() * 3.0 - 1.0);
    let color = ambient.colors[rng.random_range(0..ambient.colors.len())];
    session.particles.push(Particle {
        pos,
        vel,
        color,
        life: 1.0,
        size: 3.0,
    });
}

/// Replace non-finite state before it can spread
fn sanitize(session: &mut Session) {
    let player = &mut session.player;
    if !player.pos.is_finite() || !player.vel.is_finite() {
        log::warn!("Non-finite player state {:?}/{:?}, resetting", player.pos, player.vel);
        player.pos = finite_vec_or(player.pos, session.spawn_point);
        player.vel = Vec2::ZERO;
    }
    if !session.camera_x.is_finite() {
        session.camera_x = 0.0;
    }
    for obj in &mut session.objects {
        if !obj.pos.is_finite() {
            obj.pos = obj.home;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use super::*;
    use crate::games::GameKind;
    use crate::sim::state::GamePhase;

    const VIEWPORT: Vec2 = Vec2::new(500.0, 320.0);

    fn session(kind: GameKind) -> Session {
        Session::new(Arc::new(kind.config().unwrap()), VIEWPORT, 12345)
    }

    fn hazard_index(s: &Session) -> usize {
        s.objects
            .iter()
            .position(|o| matches!(o.kind, ObjectKind::Hazard))
            .unwrap()
    }

    fn stand_on_hazard(s: &mut Session) -> usize {
        let index = hazard_index(s);
        s.objects[index].speed = 0.0;
        s.player.pos = s.objects[index].pos - s.player.size * 0.5;
        index
    }

    fn bursts(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::ParticleBurst { .. }))
            .count()
    }

    #[test]
    fn test_collect_scenario() {
        let mut s = session(GameKind::CodeQuest);
        s.player.pos = Vec2::new(40.0, 150.0);
        s.objects[0].pos = Vec2::new(48.0, 154.0);
        s.objects[0].radius = 20.0;
        let points = s.objects[0].points;

        tick(&mut s, &TickInput::default());

        assert!(!s.objects[0].active);
        assert_eq!(s.score, points);
        assert_eq!(s.collected, 1);
        let events = s.drain_events();
        assert_eq!(bursts(&events), 1);
        assert!(events.contains(&GameEvent::Collected {
            id: s.objects[0].id,
            points
        }));
    }

    #[test]
    fn test_collected_stays_collected() {
        let mut s = session(GameKind::CodeQuest);
        s.player.pos = Vec2::new(100.0, 60.0);
        tick(&mut s, &TickInput::default());
        assert!(!s.objects[0].active);
        let score = s.score;
        for _ in 0..10 {
            tick(&mut s, &TickInput::default());
        }
        assert!(!s.objects[0].active);
        assert_eq!(s.score, score);
        assert_eq!(s.collected, 1);
    }

    #[test]
    fn test_collect_all_wins() {
        let mut s = session(GameKind::CodeQuest);
        let spots: Vec<Vec2> = s
            .objects
            .iter()
            .filter(|o| matches!(o.kind, ObjectKind::Collectible))
            .map(|o| o.pos)
            .collect();
        for spot in spots {
            s.player.pos = spot - s.player.size * 0.5;
            tick(&mut s, &TickInput::default());
        }
        assert_eq!(s.collected, 6);
        assert_eq!(s.phase, GamePhase::Won);
    }

    #[test]
    fn test_time_expiry_loses() {
        let mut s = session(GameKind::CodeQuest);
        s.time_left = Some(1);
        tick_second(&mut s);
        assert_eq!(s.phase, GamePhase::Lost);
        assert_eq!(s.time_left, Some(0));
        // clock stops once terminal
        tick_second(&mut s);
        assert_eq!(s.time_left, Some(0));
    }

    #[test]
    fn test_time_expiry_wins_by_policy() {
        let mut s = session(GameKind::DebugDash);
        s.time_left = Some(1);
        tick_second(&mut s);
        assert_eq!(s.phase, GamePhase::Won);
        assert_eq!(s.time_left, Some(0));
    }

    #[test]
    fn test_untimed_game_ignores_clock() {
        let mut s = session(GameKind::AiAssembly);
        for _ in 0..100 {
            tick_second(&mut s);
        }
        assert_eq!(s.phase, GamePhase::Playing);
        assert_eq!(s.time_left, None);
    }

    #[test]
    fn test_hazard_penalty_clamps_time() {
        let mut s = session(GameKind::CodeQuest);
        s.time_left = Some(3);
        stand_on_hazard(&mut s);
        tick(&mut s, &TickInput::default());
        assert_eq!(s.time_left, Some(0));
        assert_eq!(s.phase, GamePhase::Lost);
    }

    #[test]
    fn test_hazard_resets_combo_and_knocks_back() {
        let mut s = session(GameKind::CodeQuest);
        s.combo = 3;
        s.combo_ticks = 100;
        stand_on_hazard(&mut s);
        let x = s.player.pos.x;
        tick(&mut s, &TickInput::default());
        assert_eq!(s.combo, 0);
        assert_eq!(s.time_left, Some(40));
        assert_eq!(s.player.pos.x, x - 20.0);
        assert!(s.player.hit_cooldown > 0);
    }

    #[test]
    fn test_hazard_cooldown_prevents_repeat() {
        let mut s = session(GameKind::CodeQuest);
        let index = stand_on_hazard(&mut s);
        tick(&mut s, &TickInput::default());
        s.player.pos = s.objects[index].pos - s.player.size * 0.5;
        tick(&mut s, &TickInput::default());
        assert_eq!(s.time_left, Some(40));
    }

    #[test]
    fn test_shield_blocks_hazard() {
        let mut s = session(GameKind::CodeQuest);
        s.combo = 2;
        s.combo_ticks = 100;
        s.player.effects.grant(Effect::Shield, 600);
        stand_on_hazard(&mut s);
        tick(&mut s, &TickInput::default());
        assert_eq!(s.time_left, Some(45));
        assert_eq!(s.combo, 2);
    }

    #[test]
    fn test_speed_boost() {
        let mut s = session(GameKind::CodeQuest);
        s.player.pos = Vec2::new(200.0, 280.0);
        let input = TickInput {
            move_x: 1,
            ..Default::default()
        };
        tick(&mut s, &input);
        assert_eq!(s.player.pos.x, 203.0);
        s.player.effects.grant(Effect::Speed, 300);
        tick(&mut s, &input);
        assert!((s.player.pos.x - 208.4).abs() < 1e-3);
    }

    #[test]
    fn test_obstacle_patrol_bounces() {
        let mut s = session(GameKind::CodeQuest);
        let index = hazard_index(&s);
        s.objects[index].pos.y = 300.0;
        tick(&mut s, &TickInput::default());
        assert!(matches!(s.objects[index].motion, Motion::Patrol { dir } if dir < 0.0));
    }

    #[test]
    fn test_single_win_fire() {
        let mut s = session(GameKind::NeonJump);
        let goal = s
            .objects
            .iter()
            .find(|o| matches!(o.kind, ObjectKind::Goal))
            .unwrap()
            .pos;
        let mut transitions = 0;
        for _ in 0..10 {
            s.player.pos = goal - s.player.size * 0.5;
            tick(&mut s, &TickInput::default());
            transitions += s
                .drain_events()
                .iter()
                .filter(|e| matches!(e, GameEvent::Transition { .. }))
                .count();
        }
        assert_eq!(transitions, 1);
        assert_eq!(s.phase, GamePhase::Won);
    }

    #[test]
    fn test_terminal_tick_is_noop() {
        let mut s = session(GameKind::CodeQuest);
        s.transition(GamePhase::Lost);
        let before = s.clone();
        tick(
            &mut s,
            &TickInput {
                move_x: 1,
                ..Default::default()
            },
        );
        assert_eq!(s, before);
    }

    #[test]
    fn test_vanishing_platform_becomes_passable() {
        let mut s = session(GameKind::NeonJump);
        let index = s
            .platforms
            .iter()
            .position(|p| matches!(p.kind, PlatformKind::Vanishing { .. }))
            .unwrap();
        s.platforms[index].kind = PlatformKind::Vanishing { ticks: 2 };
        tick(&mut s, &TickInput::default());
        assert!(!s.platforms[index].passable);
        tick(&mut s, &TickInput::default());
        assert!(s.platforms[index].passable);
        for _ in 0..5 {
            tick(&mut s, &TickInput::default());
        }
        assert!(s.platforms[index].passable);
    }

    #[test]
    fn test_fall_through_vanished_platform() {
        let mut s = session(GameKind::NeonJump);
        let index = s
            .platforms
            .iter()
            .position(|p| matches!(p.kind, PlatformKind::Vanishing { .. }))
            .unwrap();
        s.platforms[index].passable = true;
        s.platforms[index].kind = PlatformKind::Vanishing { ticks: 0 };
        let top = s.platforms[index].rect.min;
        s.player.pos = Vec2::new(top.x + 10.0, top.y - 17.0);
        s.player.vel = Vec2::new(0.0, 2.0);
        tick(&mut s, &TickInput::default());
        assert!(!s.player.on_ground);
    }

    #[test]
    fn test_moving_platform_turns_around() {
        let mut s = session(GameKind::NeonJump);
        let index = s
            .platforms
            .iter()
            .position(|p| matches!(p.kind, PlatformKind::Moving { .. }))
            .unwrap();
        let PlatformKind::Moving { origin_x, range, .. } = s.platforms[index].kind else {
            unreachable!()
        };
        let shift = origin_x + range - s.platforms[index].rect.min.x;
        s.platforms[index].rect.translate(Vec2::new(shift, 0.0));
        tick(&mut s, &TickInput::default());
        assert!(matches!(s.platforms[index].kind, PlatformKind::Moving { dir, .. } if dir < 0.0));
    }

    fn settle_on_ground(s: &mut Session) {
        s.player.pos = Vec2::new(50.0, 280.0);
        for _ in 0..10 {
            tick(s, &TickInput::default());
        }
        assert!(s.player.on_ground);
    }

    #[test]
    fn test_jump_from_ground() {
        let mut s = session(GameKind::NeonJump);
        settle_on_ground(&mut s);
        let jump = TickInput {
            action: true,
            ..Default::default()
        };
        tick(&mut s, &jump);
        assert!(s.player.vel.y < -13.0);
        assert!(s.drain_events().contains(&GameEvent::Jumped));

        // holding the key does not jump again
        for _ in 0..3 {
            tick(&mut s, &jump);
        }
        assert!(s.player.vel.y > -13.0);
    }

    #[test]
    fn test_coyote_time() {
        let mut s = session(GameKind::NeonJump);
        s.player.pos = Vec2::new(170.0, 200.0);
        s.player.on_ground = false;
        s.player.coyote_ticks = 3;
        tick(
            &mut s,
            &TickInput {
                action: true,
                ..Default::default()
            },
        );
        assert!(s.player.vel.y < -13.0);
    }

    #[test]
    fn test_no_jump_in_air() {
        let mut s = session(GameKind::NeonJump);
        s.player.pos = Vec2::new(170.0, 200.0);
        tick(
            &mut s,
            &TickInput {
                action: true,
                ..Default::default()
            },
        );
        assert!(s.player.vel.y > 0.0);
    }

    #[test]
    fn test_jump_buffer() {
        let mut s = session(GameKind::NeonJump);
        s.player.pos = Vec2::new(50.0, 270.0);
        s.player.vel = Vec2::new(0.0, 2.0);
        tick(
            &mut s,
            &TickInput {
                action: true,
                ..Default::default()
            },
        );
        assert!(s.player.vel.y > 0.0);

        let mut jumped = false;
        for _ in 0..5 {
            tick(&mut s, &TickInput::default());
            if s.player.vel.y < 0.0 {
                jumped = true;
                break;
            }
        }
        assert!(jumped);
    }

    #[test]
    fn test_pit_respawns_at_checkpoint() {
        let mut s = session(GameKind::NeonJump);
        s.player.pos = Vec2::new(170.0, 320.0 + 60.0);
        tick(&mut s, &TickInput::default());
        assert_eq!(s.deaths, 1);
        let checkpoint = s.checkpoints[0].pos;
        assert!((s.player.pos.x - checkpoint.x).abs() < 1e-3);
        assert!(s.player.pos.y < 320.0);
        assert!(
            s.drain_events()
                .contains(&GameEvent::Respawned { deaths: 1 })
        );
    }

    #[test]
    fn test_checkpoint_activation_is_monotonic() {
        let mut s = session(GameKind::NeonJump);
        assert!(s.checkpoints[0].activated);
        assert!(!s.checkpoints[1].activated);
        s.player.pos = s.checkpoints[1].pos + Vec2::new(2.0, 10.0);
        tick(&mut s, &TickInput::default());
        assert!(s.checkpoints[1].activated);
        assert_eq!(s.current_checkpoint, 1);

        s.player.pos = Vec2::new(50.0, 100.0);
        for _ in 0..5 {
            tick(&mut s, &TickInput::default());
        }
        assert!(s.checkpoints[1].activated);
        assert_eq!(s.current_checkpoint, 1);
    }

    #[test]
    fn test_camera_follows_player() {
        let mut s = session(GameKind::NeonJump);
        s.player.pos = Vec2::new(900.0, 100.0);
        for _ in 0..60 {
            s.player.pos.x = 900.0;
            tick(&mut s, &TickInput::default());
        }
        let expected = 900.0 - VIEWPORT.x / 3.0;
        assert!((s.camera_x - expected).abs() < 5.0);
    }

    #[test]
    fn test_targets_spawn_and_fade() {
        let mut s = session(GameKind::DebugDash);
        tick(&mut s, &TickInput::default());
        let targets = s
            .objects
            .iter()
            .filter(|o| matches!(o.kind, ObjectKind::Target { .. }))
            .count();
        assert_eq!(targets, 1);
        let power_ups = s
            .objects
            .iter()
            .filter(|o| matches!(o.kind, ObjectKind::PowerUp { .. }))
            .count();
        assert_eq!(power_ups, 1);

        for obj in &mut s.objects {
            obj.life = obj.fade * 0.5;
        }
        tick(&mut s, &TickInput::default());
        assert!(s.objects.is_empty());
    }

    #[test]
    fn test_freeze_holds_targets() {
        let mut s = session(GameKind::DebugDash);
        tick(&mut s, &TickInput::default());
        s.player.effects.grant(Effect::Freeze, 180);
        let before: Vec<_> = s
            .objects
            .iter()
            .filter(|o| matches!(o.kind, ObjectKind::Target { .. }))
            .map(|o| (o.id, o.pos, o.life))
            .collect();
        tick(&mut s, &TickInput::default());
        for (id, pos, life) in before {
            let obj = s.object(id).unwrap();
            assert_eq!(obj.pos, pos);
            assert_eq!(obj.life, life);
        }
    }

    #[test]
    fn test_pointer_strike_through_tick() {
        let mut s = session(GameKind::DebugDash);
        tick(&mut s, &TickInput::default());
        let target = s
            .objects
            .iter()
            .find(|o| matches!(o.kind, ObjectKind::Target { .. }))
            .unwrap()
            .clone();
        s.player.effects.grant(Effect::Freeze, 10);
        tick(
            &mut s,
            &TickInput {
                pointer: Some(target.pos),
                pressed: true,
                ..Default::default()
            },
        );
        assert!(s.score >= target.points);
        assert!(s.object(target.id).is_none());
    }

    #[test]
    fn test_drag_drop_through_tick() {
        let mut s = session(GameKind::AiAssembly);
        let home = s.objects[0].pos;
        let slot = s.platforms[0].rect.center();
        tick(
            &mut s,
            &TickInput {
                pointer: Some(home),
                pressed: true,
                ..Default::default()
            },
        );
        assert!(s.drag.is_some());
        tick(
            &mut s,
            &TickInput {
                pointer: Some(slot),
                released: true,
                ..Default::default()
            },
        );
        assert!(s.drag.is_none());
        assert_eq!(s.slots_filled(), (1, 5));
    }

    #[test]
    fn test_tap_without_move_keeps_combo() {
        let mut s = session(GameKind::AiAssembly);
        s.combo = 3;
        let home = s.objects[0].pos;
        tick(
            &mut s,
            &TickInput {
                pointer: Some(home),
                pressed: true,
                released: true,
                ..Default::default()
            },
        );
        assert!(s.drag.is_none());
        assert_eq!(s.objects[0].pos, home);
        assert!(s.combo > 0);
        assert!(!s.drain_events().iter().any(|e| matches!(e, GameEvent::Rejected { .. })));
    }

    #[test]
    fn test_non_finite_state_is_reset() {
        for kind in [GameKind::NeonJump, GameKind::CodeQuest] {
            let mut s = session(kind);
            s.player.vel = Vec2::new(f32::NAN, f32::INFINITY);
            s.player.pos.x = f32::NAN;
            s.camera_x = f32::NAN;
            for _ in 0..3 {
                tick(&mut s, &TickInput::default());
                assert!(s.player.pos.is_finite(), "{kind:?} pos {:?}", s.player.pos);
                assert!(s.player.vel.is_finite(), "{kind:?} vel {:?}", s.player.vel);
                assert!(s.camera_x.is_finite(), "{kind:?} camera");
            }
            assert!(s.bounds.contains(s.player.pos), "{kind:?} outside bounds");
        }
    }

    #[test]
    fn test_non_finite_pointer_ignored() {
        let mut s = session(GameKind::DebugDash);
        tick(
            &mut s,
            &TickInput {
                pointer: Some(Vec2::new(f32::NAN, 10.0)),
                pressed: true,
                ..Default::default()
            },
        );
        assert!(s.player.pos.is_finite());
    }

    #[test]
    fn test_determinism() {
        let inputs: Vec<TickInput> = (0..120)
            .map(|i| TickInput {
                move_x: (i % 3) as i8 - 1,
                action: i % 20 < 3,
                ..Default::default()
            })
            .collect();
        let mut a = session(GameKind::NeonJump);
        let mut b = session(GameKind::NeonJump);
        for input in &inputs {
            tick(&mut a, input);
            tick(&mut b, input);
        }
        assert_eq!(a, b);

        let mut c = session(GameKind::DebugDash);
        let mut d = session(GameKind::DebugDash);
        for _ in 0..300 {
            tick(&mut c, &TickInput::default());
            tick(&mut d, &TickInput::default());
        }
        assert_eq!(c, d);
    }

    fn arb_input() -> impl Strategy<Value = TickInput> {
        (-1i8..=1, -1i8..=1, any::<bool>()).prop_map(|(move_x, move_y, action)| TickInput {
            move_x,
            move_y,
            action,
            ..Default::default()
        })
    }

    proptest! {
        #[test]
        fn prop_player_stays_in_bounds(
            inputs in prop::collection::vec(arb_input(), 1..200),
            game in 0usize..2,
        ) {
            let kind = [GameKind::CodeQuest, GameKind::NeonJump][game];
            let mut s = session(kind);
            for input in &inputs {
                tick(&mut s, input);
                let rect = s.player.rect();
                prop_assert!(rect.min.x >= s.bounds.min.x && rect.max.x <= s.bounds.max.x);
                prop_assert!(rect.min.y >= s.bounds.min.y && rect.max.y <= s.bounds.max.y);
            }
        }

        #[test]
        fn prop_collection_is_monotonic(inputs in prop::collection::vec(arb_input(), 1..300)) {
            let mut s = session(GameKind::CodeQuest);
            let mut gone = std::collections::HashSet::new();
            for input in &inputs {
                tick(&mut s, input);
                for obj in &s.objects {
                    prop_assert!(!(obj.active && gone.contains(&obj.id)));
                    if !obj.active {
                        gone.insert(obj.id);
                    }
                }
            }
        }

        #[test]
        fn prop_time_only_grows_from_power_ups(
            inputs in prop::collection::vec(arb_input(), 1..300),
            seconds_every in 1usize..60,
        ) {
            let mut s = session(GameKind::CodeQuest);
            for (i, input) in inputs.iter().enumerate() {
                let before = s.time_left;
                tick(&mut s, input);
                if i % seconds_every == 0 {
                    tick_second(&mut s);
                }
                let events = s.drain_events();
                let bonus = events.iter().any(|e| matches!(
                    e,
                    GameEvent::PowerUp { effect: crate::sim::state::PowerUpEffect::AddTime { .. }, .. }
                ));
                if !bonus {
                    prop_assert!(s.time_left <= before);
                }
            }
        }
    }
}
