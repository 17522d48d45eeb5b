//! Rule engine: contacts, strikes, drops and outcomes
//!
//! Everything here is called from `tick` (or directly by tests) and is a
//! no-op once the session has left `Playing`.

use glam::Vec2;
use rand::Rng;

use super::collision::{within_box, within_radius};
use super::state::{
    Drag, Effect, GameEvent, GamePhase, InteractiveObject, ObjectKind, PlatformKind,
    PowerUpEffect, Session,
};
use crate::Color;
use crate::games::{ControlScheme, PowerUpTemplate, TargetTemplate, WinCondition};

const PICKUP_BURST_SPEED: f32 = 3.0;
const STRIKE_BURST_SPEED: f32 = 4.0;
const DROP_BURST_SPEED: f32 = 2.0;
const CHECKPOINT_COLOR: Color = Color(0x22c55e);
const RESPAWN_COLOR: Color = Color(0xef4444);
const RESPAWN_BURST: usize = 15;
const CHECKPOINT_BURST: usize = 10;
/// A drop closer than this to the tool's home is a tap, not a move
const TAP_SLOP: f32 = 2.0;

/// Player contact with collectibles, power-ups, hazards and goals
///
/// Objects are visited in creation order and each is handled at most once
/// per tick.
pub fn touch_objects(session: &mut Session) {
    if session.phase.is_terminal() {
        return;
    }
    for index in 0..session.objects.len() {
        let player_center = session.player.center();
        let player_rect = session.player.rect();
        let obj = &session.objects[index];
        if !obj.active {
            continue;
        }
        match obj.kind {
            ObjectKind::Collectible => {
                if within_radius(player_center, obj.pos, obj.radius) {
                    collect(session, index);
                }
            }
            ObjectKind::PowerUp { effect } => {
                if within_radius(player_center, obj.pos, obj.radius) {
                    take_power_up(session, index, effect);
                }
            }
            ObjectKind::Hazard => {
                if player_rect.overlaps(&obj.rect()) {
                    hit_hazard(session, index);
                }
            }
            ObjectKind::Goal => {
                if player_rect.overlaps(&obj.rect()) {
                    reach_goal(session, index);
                }
            }
            ObjectKind::Target { .. } | ObjectKind::Draggable { .. } => {}
        }
    }
}

fn collect(session: &mut Session, index: usize) {
    let obj = &mut session.objects[index];
    obj.active = false;
    let (id, points, pos, color, burst) = (obj.id, obj.points, obj.pos, obj.color, obj.burst);

    session.score += points;
    session.collected += 1;
    session.bump_combo();
    session.burst(pos, burst, color, PICKUP_BURST_SPEED, 1.0);
    session.events.push(GameEvent::Collected { id, points });
    log::debug!(
        "Collected {} ({}/{})",
        session.objects[index].label,
        session.collected,
        session.total_collectibles
    );
}

fn take_power_up(session: &mut Session, index: usize, effect: PowerUpEffect) {
    let obj = &mut session.objects[index];
    obj.active = false;
    let (id, points, pos, color, burst) = (obj.id, obj.points, obj.pos, obj.color, obj.burst);

    session.score += points;
    apply_effect(session, effect);
    session.burst(pos, burst, color, PICKUP_BURST_SPEED, 1.0);
    session.events.push(GameEvent::PowerUp { id, effect });
    log::debug!("Power-up {:?}", effect);
}

/// Start a timed effect or extend the clock
pub fn apply_effect(session: &mut Session, effect: PowerUpEffect) {
    match effect {
        PowerUpEffect::Grant { effect, ticks } => session.player.effects.grant(effect, ticks),
        PowerUpEffect::AddTime { seconds } => {
            if let Some(left) = session.time_left {
                session.time_left = Some(left.saturating_add(seconds));
            }
        }
    }
}

fn hit_hazard(session: &mut Session, index: usize) {
    if session.player.effects.is_active(Effect::Shield) || session.player.hit_cooldown > 0 {
        return;
    }
    let penalty = session.config.hazard.clone();
    let (id, color, burst) = {
        let obj = &session.objects[index];
        (obj.id, obj.color, obj.burst)
    };

    if let Some(left) = session.time_left {
        session.time_left = Some(left.saturating_sub(penalty.seconds));
    }
    if penalty.knockback > 0.0 {
        session.player.pos.x = (session.player.pos.x - penalty.knockback).max(session.bounds.min.x);
    }
    session.player.hit_cooldown = penalty.cooldown_ticks;
    session.break_combo();

    let center = session.player.center();
    session.burst(center, burst, color, PICKUP_BURST_SPEED, 0.6);
    session.events.push(GameEvent::HazardHit { id });
    log::debug!("Hazard hit, {:?}s left", session.time_left);

    if penalty.respawn {
        respawn(session);
    }
}

fn reach_goal(session: &mut Session, index: usize) {
    if session.goal_reached {
        return;
    }
    session.goal_reached = true;
    let obj = &session.objects[index];
    let (pos, color, burst) = (obj.pos, obj.color, obj.burst);
    session.burst(pos, burst, color, 5.0, 1.5);
}

/// Put the player back at the current checkpoint (or spawn) and count a death
pub fn respawn(session: &mut Session) {
    let lift = match &session.config.controls {
        ControlScheme::Platformer(physics) => physics.respawn_lift,
        _ => 0.0,
    };
    let anchor = session
        .checkpoints
        .get(session.current_checkpoint)
        .map(|c| c.pos - Vec2::new(0.0, lift))
        .unwrap_or(session.spawn_point);

    let player = &mut session.player;
    player.pos = anchor;
    player.vel = Vec2::ZERO;
    player.on_ground = false;
    player.coyote_ticks = 0;
    player.jump_buffer_ticks = 0;

    session.deaths += 1;
    session.break_combo();
    let center = session.player.center();
    session.burst(center, RESPAWN_BURST, RESPAWN_COLOR, 4.0, 1.0);
    session.events.push(GameEvent::Respawned {
        deaths: session.deaths,
    });
    log::debug!("Respawned at checkpoint {}", session.current_checkpoint);
}

/// Activate any checkpoint the player touches; activation is one-way
pub fn touch_checkpoints(session: &mut Session) {
    if session.phase.is_terminal() {
        return;
    }
    let rect = session.player.rect();
    for index in 0..session.checkpoints.len() {
        let checkpoint = session.checkpoints[index];
        if checkpoint.activated || !rect.overlaps(&checkpoint.rect()) {
            continue;
        }
        session.checkpoints[index].activated = true;
        session.current_checkpoint = index;
        session.burst(
            checkpoint.rect().center(),
            CHECKPOINT_BURST,
            CHECKPOINT_COLOR,
            PICKUP_BURST_SPEED,
            1.0,
        );
        session.events.push(GameEvent::CheckpointReached { index });
        log::debug!("Checkpoint {} reached", index + 1);
    }
}

/// Pointer strike: power-ups first, then targets; topmost match of each wins
pub fn strike_at(session: &mut Session, point: Vec2) -> bool {
    if session.phase.is_terminal() || !point.is_finite() {
        return false;
    }
    let mut hit = false;

    let power_up = session.objects.iter().rposition(|o| {
        o.active && matches!(o.kind, ObjectKind::PowerUp { .. }) && within_radius(point, o.pos, o.radius)
    });
    if let Some(index) = power_up {
        if let ObjectKind::PowerUp { effect } = session.objects[index].kind {
            take_power_up(session, index, effect);
        }
        hit = true;
    }

    let laser_reach = match &session.config.controls {
        ControlScheme::Pointer { laser_reach } if session.player.effects.is_active(Effect::Laser) => {
            Some(*laser_reach)
        }
        _ => None,
    };
    let target = session.objects.iter().rposition(|o| {
        o.active
            && matches!(o.kind, ObjectKind::Target { .. })
            && (within_radius(point, o.pos, o.radius)
                || laser_reach.is_some_and(|reach| within_box(point, o.pos, reach)))
    });
    if let Some(index) = target {
        destroy_target(session, index);
        hit = true;
    }

    if !hit && session.config.combo.miss_resets {
        session.break_combo();
        session.events.push(GameEvent::Missed);
    }
    hit
}

fn destroy_target(session: &mut Session, index: usize) {
    let obj = &mut session.objects[index];
    obj.active = false;
    let (id, base, pos, color, burst) = (obj.id, obj.points, obj.pos, obj.color, obj.burst);
    let split = match obj.kind {
        ObjectKind::Target { split } => split,
        _ => None,
    };

    let mut points = base;
    if session.player.effects.is_active(Effect::DoublePoints) {
        points *= 2;
    }
    points += session.combo * session.config.combo.bonus_per_step;
    session.score += points;
    session.bump_combo();
    session.events.push(GameEvent::Struck { id, points });

    if let Some(template) = split {
        spawn_split(session, template, id, pos);
    }
    session.burst(pos, burst, color, STRIKE_BURST_SPEED, 1.0);
}

/// Children of a destroyed spawner; they never split again
fn spawn_split(session: &mut Session, template: usize, parent: u32, at: Vec2) {
    let config = session.config.clone();
    let Some(rule) = config
        .spawner
        .as_ref()
        .and_then(|s| s.targets.get(template))
        .and_then(|t| t.split.as_ref())
    else {
        return;
    };

    for _ in 0..rule.count {
        let offset = Vec2::new(
            (session.rng.random::<f32>() - 0.5) * 2.0 * rule.spread,
            (session.rng.random::<f32>() - 0.5) * 2.0 * rule.spread,
        );
        spawn_target(session, &rule.child, at + offset, None);
    }
    session.events.push(GameEvent::Split {
        parent,
        spawned: rule.count as usize,
    });
}

/// Add a runtime target, kept inside the viewport
pub fn spawn_target(
    session: &mut Session,
    template: &TargetTemplate,
    at: Vec2,
    split: Option<usize>,
) -> u32 {
    let id = session.next_entity_id();
    let radius = template.size + session.rng.random::<f32>() * template.size_jitter;
    let pos = clamp_inside(at, radius, session.viewport);
    let phase = session.rng.random::<f32>() * std::f32::consts::TAU;
    session.objects.push(InteractiveObject {
        id,
        kind: ObjectKind::Target { split },
        pos,
        size: Vec2::splat(radius * 2.0),
        radius,
        speed: template.speed,
        motion: template.motion,
        points: template.points,
        color: template.color,
        sprite: template.sprite.clone(),
        label: template.name.clone(),
        active: true,
        life: 1.0,
        fade: template.fade,
        phase,
        home: pos,
        burst: template.burst,
        transient: true,
    });
    id
}

/// Add a runtime power-up
pub fn spawn_power_up(session: &mut Session, template: &PowerUpTemplate, at: Vec2) -> u32 {
    let id = session.next_entity_id();
    let phase = session.rng.random::<f32>() * std::f32::consts::TAU;
    session.objects.push(InteractiveObject {
        id,
        kind: ObjectKind::PowerUp {
            effect: template.effect,
        },
        pos: at,
        size: Vec2::splat(template.radius * 2.0),
        radius: template.radius,
        speed: 0.0,
        motion: Default::default(),
        points: template.points,
        color: template.color,
        sprite: template.sprite.clone(),
        label: template.label.clone(),
        active: true,
        life: 1.0,
        fade: template.fade,
        phase,
        home: at,
        burst: template.burst,
        transient: true,
    });
    id
}

/// Keep a circle of `radius` inside the viewport
pub fn clamp_inside(pos: Vec2, radius: f32, viewport: Vec2) -> Vec2 {
    let lo = Vec2::splat(radius);
    let hi = (viewport - lo).max(lo);
    pos.clamp(lo, hi)
}

/// Start dragging the topmost unplaced tool under the pointer
pub fn grab_at(session: &mut Session, point: Vec2, grab_radius: f32) -> bool {
    if session.phase.is_terminal() || session.drag.is_some() || !point.is_finite() {
        return false;
    }
    let found = session.objects.iter().rev().find(|o| {
        o.active
            && matches!(o.kind, ObjectKind::Draggable { placed: false, .. })
            && within_box(point, o.pos, grab_radius)
    });
    match found {
        Some(obj) => {
            session.drag = Some(Drag {
                id: obj.id,
                offset: obj.pos - point,
            });
            true
        }
        None => false,
    }
}

/// Move the dragged tool with the pointer
pub fn drag_to(session: &mut Session, point: Vec2) {
    let Some(drag) = session.drag else { return };
    if !point.is_finite() {
        return;
    }
    if let Some(obj) = session.objects.iter_mut().find(|o| o.id == drag.id) {
        obj.pos = point + drag.offset;
    }
}

/// Drop the dragged tool: into the first empty slot under it if that slot
/// accepts it, otherwise back home. A tool released where it was picked up
/// is put back without penalty.
pub fn release(session: &mut Session) -> bool {
    let Some(drag) = session.drag.take() else {
        return false;
    };
    let Some(index) = session.objects.iter().position(|o| o.id == drag.id) else {
        return false;
    };
    let (tool, pos) = match &session.objects[index].kind {
        ObjectKind::Draggable { tool, .. } => (tool.clone(), session.objects[index].pos),
        _ => return false,
    };
    let home = session.objects[index].home;
    if pos.distance_squared(home) < TAP_SLOP * TAP_SLOP {
        session.objects[index].pos = home;
        return false;
    }

    let slot = session.platforms.iter().position(|p| {
        matches!(p.kind, PlatformKind::Slot { filled: None, .. }) && p.rect.contains(pos)
    });
    let accepted = slot.filter(|&s| {
        matches!(&session.platforms[s].kind, PlatformKind::Slot { accepts, .. } if *accepts == tool)
    });

    let Some(slot_index) = accepted else {
        let obj = &mut session.objects[index];
        obj.pos = obj.home;
        let id = obj.id;
        session.break_combo();
        session.events.push(GameEvent::Rejected { id });
        return false;
    };

    let slot = &mut session.platforms[slot_index];
    let slot_id = slot.id;
    let center = slot.rect.center();
    let obj = &mut session.objects[index];
    if let PlatformKind::Slot { filled, .. } = &mut slot.kind {
        *filled = Some(obj.id);
    }
    obj.pos = center;
    obj.kind = ObjectKind::Draggable { tool, placed: true };
    let (id, points, color, burst) = (obj.id, obj.points, obj.color, obj.burst);

    session.score += points;
    session.collected += 1;
    session.bump_combo();
    session.burst(center, burst, color, DROP_BURST_SPEED, 1.0);
    session.events.push(GameEvent::Placed { id, slot: slot_id });
    log::debug!("Placed {} in slot {}", id, slot_id);
    true
}

/// Combo falls back to zero once its window runs out
pub fn decay_combo(session: &mut Session) {
    if session.combo_ticks > 0 {
        session.combo_ticks -= 1;
        if session.combo_ticks == 0 {
            session.combo = 0;
        }
    }
}

/// Drop runtime-spawned objects that are no longer active
pub fn compact(session: &mut Session) {
    session.objects.retain(|o| o.active || !o.transient);
}

/// Win check, then clock expiry; both go through the guarded transition
pub fn check_outcome(session: &mut Session) {
    if session.phase.is_terminal() {
        return;
    }
    let won = match session.config.win {
        WinCondition::CollectAll => {
            session.total_collectibles > 0 && session.collected >= session.total_collectibles
        }
        WinCondition::ReachGoal => session.goal_reached,
        WinCondition::FillSlots => {
            let (filled, total) = session.slots_filled();
            total > 0 && filled == total
        }
        WinCondition::Survive => false,
    };
    if won {
        session.transition(GamePhase::Won);
        return;
    }
    if session.time_left == Some(0) {
        let outcome = session.config.on_expire.outcome();
        session.transition(outcome);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::games::GameKind;

    fn session(kind: GameKind) -> Session {
        Session::new(Arc::new(kind.config().unwrap()), Vec2::new(500.0, 320.0), 7)
    }

    fn template(session: &Session, index: usize) -> TargetTemplate {
        session.config.spawner.as_ref().unwrap().targets[index].clone()
    }

    #[test]
    fn test_spawner_expands_one_level() {
        let mut s = session(GameKind::DebugDash);
        let nest = template(&s, 3);
        let id = spawn_target(&mut s, &nest, Vec2::new(250.0, 160.0), Some(3));
        let at = s.object(id).unwrap().pos;

        assert!(strike_at(&mut s, at));
        let children: Vec<_> = s
            .objects
            .iter()
            .filter(|o| o.active && o.id != id)
            .collect();
        assert_eq!(children.len(), 3);
        for child in &children {
            assert_eq!(child.kind, ObjectKind::Target { split: None });
            assert_eq!(child.points, 15);
            assert!((child.pos - at).abs().max_element() <= 30.0 + 0.01);
        }
        assert!(!s.object(id).unwrap().active);
        assert_eq!(s.score, 50);

        // striking a child spawns nothing further
        let child_pos = children[0].pos;
        let before = s.objects.len();
        assert!(strike_at(&mut s, child_pos));
        assert_eq!(s.objects.len(), before);
    }

    #[test]
    fn test_miss_resets_combo() {
        let mut s = session(GameKind::DebugDash);
        s.combo = 4;
        s.combo_ticks = 50;
        assert!(!strike_at(&mut s, Vec2::new(10.0, 10.0)));
        assert_eq!(s.combo, 0);
        assert!(s.drain_events().contains(&GameEvent::Missed));
    }

    #[test]
    fn test_combo_bonus_and_double_points() {
        let mut s = session(GameKind::DebugDash);
        let normal = template(&s, 0);
        let id = spawn_target(&mut s, &normal, Vec2::new(100.0, 100.0), None);
        s.combo = 2;
        s.player.effects.grant(Effect::DoublePoints, 10);
        assert!(strike_at(&mut s, Vec2::new(100.0, 100.0)));
        // 10 * 2 + 2 * 5
        assert_eq!(s.score, 30);
        assert_eq!(s.combo, 3);
        assert_eq!(s.max_combo, 3);
        assert_eq!(s.combo_ticks, 120);
        assert!(s.drain_events().contains(&GameEvent::Struck { id, points: 30 }));
    }

    #[test]
    fn test_laser_widens_strike() {
        let mut s = session(GameKind::DebugDash);
        let normal = template(&s, 0);
        spawn_target(&mut s, &normal, Vec2::new(100.0, 100.0), None);
        assert!(!strike_at(&mut s, Vec2::new(140.0, 140.0)));
        s.player.effects.grant(Effect::Laser, 10);
        assert!(strike_at(&mut s, Vec2::new(140.0, 140.0)));
    }

    #[test]
    fn test_strike_hits_power_up_then_target() {
        let mut s = session(GameKind::DebugDash);
        let freeze = s.config.spawner.as_ref().unwrap().power_ups[0].clone();
        let normal = template(&s, 0);
        spawn_target(&mut s, &normal, Vec2::new(200.0, 200.0), None);
        spawn_power_up(&mut s, &freeze, Vec2::new(200.0, 200.0));
        assert!(strike_at(&mut s, Vec2::new(200.0, 200.0)));
        assert!(s.player.effects.is_active(Effect::Freeze));
        assert!(s.objects.iter().all(|o| !o.active));
    }

    #[test]
    fn test_strike_ignored_after_game_over() {
        let mut s = session(GameKind::DebugDash);
        let normal = template(&s, 0);
        spawn_target(&mut s, &normal, Vec2::new(100.0, 100.0), None);
        s.transition(GamePhase::Won);
        assert!(!strike_at(&mut s, Vec2::new(100.0, 100.0)));
        assert_eq!(s.score, 0);
    }

    #[test]
    fn test_drop_in_matching_slot() {
        let mut s = session(GameKind::AiAssembly);
        let tool = s.objects[0].clone();
        let slot = s.platforms[0].rect.center();
        assert!(grab_at(&mut s, tool.pos + Vec2::new(5.0, -5.0), 15.0));
        drag_to(&mut s, slot + Vec2::new(5.0, -5.0));
        assert!(release(&mut s));
        assert_eq!(s.objects[0].pos, slot);
        assert_eq!(s.slots_filled(), (1, 5));
        assert_eq!(s.score, 100);
        // placed tools cannot be picked up again
        assert!(!grab_at(&mut s, slot, 15.0));
    }

    #[test]
    fn test_drop_in_wrong_slot_returns_home() {
        let mut s = session(GameKind::AiAssembly);
        let tool = s.objects[1].clone();
        assert!(grab_at(&mut s, tool.pos, 15.0));
        let target = s.platforms[0].rect.center();
        drag_to(&mut s, target);
        assert!(!release(&mut s));
        assert_eq!(s.objects[1].pos, tool.home);
        assert_eq!(s.slots_filled(), (0, 5));
        assert!(s.drain_events().contains(&GameEvent::Rejected { id: tool.id }));
    }

    #[test]
    fn test_tap_on_tool_is_cancelled() {
        let mut s = session(GameKind::AiAssembly);
        let tool = s.objects[2].clone();
        s.combo = 2;
        assert!(grab_at(&mut s, tool.pos, 15.0));
        drag_to(&mut s, tool.pos);
        assert!(!release(&mut s));
        assert!(s.drag.is_none());
        assert_eq!(s.objects[2].pos, tool.home);
        assert_eq!(s.combo, 2);
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_fill_all_slots_wins() {
        let mut s = session(GameKind::AiAssembly);
        for i in 0..5 {
            let home = s.objects[i].pos;
            let slot = s.platforms[i].rect.center();
            assert!(grab_at(&mut s, home, 15.0));
            drag_to(&mut s, slot);
            assert!(release(&mut s));
        }
        check_outcome(&mut s);
        assert_eq!(s.phase, GamePhase::Won);
    }

    #[test]
    fn test_combo_decays() {
        let mut s = session(GameKind::DebugDash);
        s.combo = 3;
        s.combo_ticks = 2;
        decay_combo(&mut s);
        assert_eq!(s.combo, 3);
        decay_combo(&mut s);
        assert_eq!(s.combo, 0);
    }

    #[test]
    fn test_compact_keeps_layout_objects() {
        let mut s = session(GameKind::CodeQuest);
        s.objects[0].active = false;
        let normal = {
            let dash = GameKind::DebugDash.config().unwrap();
            dash.spawner.unwrap().targets[0].clone()
        };
        let id = spawn_target(&mut s, &normal, Vec2::new(100.0, 100.0), None);
        s.objects.last_mut().unwrap().active = false;
        compact(&mut s);
        assert!(!s.objects[0].active);
        assert!(s.object(id).is_none());
    }

    #[test]
    fn test_add_time_untimed_is_noop() {
        let mut s = session(GameKind::AiAssembly);
        apply_effect(&mut s, PowerUpEffect::AddTime { seconds: 10 });
        assert_eq!(s.time_left, None);
        let mut q = session(GameKind::CodeQuest);
        apply_effect(&mut q, PowerUpEffect::AddTime { seconds: 10 });
        assert_eq!(q.time_left, Some(55));
    }
}
