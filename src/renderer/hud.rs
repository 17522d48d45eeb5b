//! HUD text, end-of-game overlay and touch joystick

use glam::Vec2;

use super::{Surface, TextStyle};
use crate::Color;
use crate::consts::TICKS_PER_SECOND;
use crate::games::{HudField, WinCondition};
use crate::sim::{Aabb, GamePhase, Session};

const HUD_LINE_HEIGHT: f32 = 16.0;
const HUD_FONT: f32 = 12.0;

/// HUD text lines in the game's configured order
pub fn hud_lines(session: &Session) -> Vec<String> {
    session
        .config
        .hud
        .iter()
        .filter_map(|field| hud_line(session, *field))
        .collect()
}

fn hud_line(session: &Session, field: HudField) -> Option<String> {
    match field {
        HudField::Time => session.time_left.map(|t| format!("Time: {t}s")),
        HudField::Score => Some(format!("Score: {}", session.score)),
        HudField::Collected => Some(if session.config.win == WinCondition::FillSlots {
            let (filled, total) = session.slots_filled();
            format!("Placed: {filled}/{total}")
        } else {
            format!(
                "Collected: {}/{}",
                session.collected, session.total_collectibles
            )
        }),
        HudField::Combo => (session.combo > 1).then(|| format!("Combo: x{}", session.combo)),
        HudField::MaxCombo => Some(format!("Max Combo: x{}", session.max_combo)),
        HudField::Deaths => Some(format!("Deaths: {}", session.deaths)),
        HudField::Checkpoint => (!session.checkpoints.is_empty()).then(|| {
            format!(
                "Checkpoint: {}/{}",
                session.current_checkpoint + 1,
                session.checkpoints.len()
            )
        }),
        HudField::Effects => {
            let effects = &session.player.effects;
            let active: Vec<String> = effects
                .active()
                .into_iter()
                .map(|e| {
                    let secs = effects.remaining(e).div_ceil(TICKS_PER_SECOND);
                    format!("{} {secs}s", e.label())
                })
                .collect();
            (!active.is_empty()).then(|| active.join("  "))
        }
    }
}

pub(super) fn draw(surface: &mut dyn Surface, session: &Session) {
    let lines = hud_lines(session);
    if lines.is_empty() {
        return;
    }
    let palette = &session.config.palette;
    let height = lines.len() as f32 * HUD_LINE_HEIGHT + 8.0;
    surface.fill_rect(
        Aabb::new(Vec2::new(4.0, 4.0), Vec2::new(150.0, height)),
        Color::BLACK,
        0.4,
    );
    let style = TextStyle::new(HUD_FONT, palette.text);
    for (i, line) in lines.iter().enumerate() {
        let at = Vec2::new(10.0, 18.0 + i as f32 * HUD_LINE_HEIGHT);
        surface.text(line, at, &style);
    }
}

/// Title and summary shown once the game is over
pub fn overlay_lines(session: &Session) -> Vec<String> {
    let title = match session.phase {
        GamePhase::Playing => return Vec::new(),
        GamePhase::Won => match session.config.win {
            WinCondition::Survive => "Time's Up!",
            WinCondition::ReachGoal => "Level Complete!",
            WinCondition::CollectAll | WinCondition::FillSlots => "You Win!",
        },
        GamePhase::Lost if session.time_left == Some(0) => "Time's Up!",
        GamePhase::Lost => "Game Over",
    };

    let mut lines = vec![title.to_string(), format!("Final Score: {}", session.score)];
    if session.config.hud.contains(&HudField::MaxCombo) {
        lines.push(format!("Max Combo: x{}", session.max_combo));
    }
    if session.config.hud.contains(&HudField::Deaths) {
        lines.push(format!("Deaths: {}", session.deaths));
    }
    lines.push("Press Replay to play again".to_string());
    lines
}

pub(super) fn draw_overlay(surface: &mut dyn Surface, session: &Session) {
    let size = surface.size();
    let palette = &session.config.palette;
    surface.fill_rect(Aabb::new(Vec2::ZERO, size), Color::BLACK, 0.7);

    let title_color = if session.phase == GamePhase::Won {
        palette.won
    } else {
        palette.lost
    };
    let lines = overlay_lines(session);
    let top = size.y * 0.5 - lines.len() as f32 * 12.0;
    for (i, line) in lines.iter().enumerate() {
        let style = if i == 0 {
            TextStyle::new(24.0, title_color).centered().bold()
        } else {
            TextStyle::new(14.0, palette.text).centered()
        };
        let y = top + i as f32 * 24.0 + if i == 0 { 0.0 } else { 8.0 };
        surface.text(line, Vec2::new(size.x * 0.5, y), &style);
    }
}

/// Virtual joystick ring and knob for touch play
pub fn draw_joystick(surface: &mut dyn Surface, origin: Vec2, stick: Vec2) {
    surface.fill_circle(origin, 50.0, Color::BLACK, 0.2);
    surface.stroke_circle(origin, 50.0, Color(0x6b7280), 0.5, 2.0);
    surface.fill_circle(stick, 20.0, Color::WHITE, 0.3);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::games::GameKind;
    use crate::sim::Effect;

    fn session(kind: GameKind) -> Session {
        Session::new(Arc::new(kind.config().unwrap()), Vec2::new(500.0, 320.0), 3)
    }

    #[test]
    fn test_debug_dash_hud() {
        let mut s = session(GameKind::DebugDash);
        s.combo = 3;
        s.max_combo = 4;
        s.player.effects.grant(Effect::Freeze, 61);
        let lines = hud_lines(&s);
        assert_eq!(
            lines,
            vec!["Time: 30s", "Score: 0", "Combo: x3", "Max Combo: x4", "Freeze 2s"]
        );
    }

    #[test]
    fn test_combo_hidden_below_two() {
        let mut s = session(GameKind::DebugDash);
        s.combo = 1;
        assert!(!hud_lines(&s).iter().any(|l| l.starts_with("Combo")));
    }

    #[test]
    fn test_slots_hud() {
        let s = session(GameKind::AiAssembly);
        assert_eq!(hud_lines(&s), vec!["Score: 0", "Placed: 0/5"]);
    }

    #[test]
    fn test_platformer_hud() {
        let s = session(GameKind::NeonJump);
        assert_eq!(hud_lines(&s), vec!["Time: 60s", "Deaths: 0", "Checkpoint: 1/4"]);
    }

    #[test]
    fn test_overlay_titles() {
        let mut s = session(GameKind::DebugDash);
        assert!(overlay_lines(&s).is_empty());
        s.time_left = Some(0);
        s.transition(GamePhase::Won);
        let lines = overlay_lines(&s);
        assert_eq!(lines[0], "Time's Up!");
        assert!(lines.contains(&"Max Combo: x0".to_string()));

        let mut s = session(GameKind::CodeQuest);
        s.transition(GamePhase::Lost);
        assert_eq!(overlay_lines(&s)[0], "Game Over");

        let mut s = session(GameKind::NeonJump);
        s.transition(GamePhase::Won);
        let lines = overlay_lines(&s);
        assert_eq!(lines[0], "Level Complete!");
        assert!(lines.contains(&"Deaths: 0".to_string()));
    }
}
