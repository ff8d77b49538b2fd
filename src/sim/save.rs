/// Autosave: a flat snapshot of the play session.
///
/// ## File format
///   Key-value lines in `save.dat`:
///
///   ```text
///   variant=junior
///   points=12
///   students=10
///   position=1,6
///   box_opened=0
///   program=right,right,up
///   hero=vector          (one line per acquired hero, order preserved)
///   available=right,up   (informational; ignored on load, recomputed)
///   ```
///
/// Loading is merge-tolerant: whatever fails to parse falls back to the
/// fresh default session for the resolved variant. A snapshot naming an
/// unresolvable variant is discarded by the caller (the variant id must
/// resolve before the rest of the snapshot means anything).

use std::path::PathBuf;

use crate::domain::board::Pos;
use crate::sim::variant::VariantDef;
use crate::sim::world::SessionState;

const SAVE_FILE: &str = "save.dat";

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

fn save_dir() -> PathBuf {
    // Prefer the exe directory (portable installs), if writable.
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let probe = parent.join(".write_test_robocourse");
            if std::fs::write(&probe, "").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return parent.to_path_buf();
            }
        }
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn save_path() -> PathBuf {
    save_dir().join(SAVE_FILE)
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Raw fields recovered from a save file. Everything is optional so that a
/// partial or legacy snapshot still loads.
#[derive(Clone, Debug, Default)]
pub struct SavedSession {
    pub variant: Option<String>,
    pub points: Option<u32>,
    pub students: Option<u32>,
    pub position: Option<(i32, i32)>,
    pub box_opened: Option<bool>,
    pub program: Option<Vec<String>>,
    pub heroes: Vec<String>,
}

pub fn save_session(session: &SessionState) -> Result<(), String> {
    let content = serialize(session);
    std::fs::write(save_path(), content).map_err(|e| format!("Save failed: {e}"))
}

pub fn load_session() -> Option<SavedSession> {
    let content = std::fs::read_to_string(save_path()).ok()?;
    Some(parse_save(&content))
}

pub fn delete_save() {
    let _ = std::fs::remove_file(save_path());
}

/// Overlay a parsed snapshot onto the fresh default session for its
/// variant. Missing or invalid fields keep the defaults; a persisted
/// position that is not on the variant's path snaps back to the start.
pub fn merge_session(saved: &SavedSession, variant: &VariantDef) -> SessionState {
    let mut session = SessionState::fresh(variant);

    if let Some(points) = saved.points {
        session.points = points;
    }
    if let Some(students) = saved.students {
        session.students = students;
    }
    if let Some((x, y)) = saved.position {
        let pos = Pos::new(x, y);
        if variant.board.is_walkable(pos) {
            session.position = pos;
        }
    }
    if let Some(opened) = saved.box_opened {
        session.box_opened = opened;
    }
    if let Some(program) = &saved.program {
        session.program = program.clone();
    }
    for id in &saved.heroes {
        if !session.acquired_heroes.contains(id) {
            session.acquired_heroes.push(id.clone());
        }
    }

    // The available set is always derived, never trusted from storage.
    session.recompute_available(variant);
    session
}

// ══════════════════════════════════════════════════════════════
// Serialization
// ══════════════════════════════════════════════════════════════

fn serialize(session: &SessionState) -> String {
    let mut out = String::with_capacity(512);
    if let Some(variant) = &session.variant_id {
        out.push_str(&format!("variant={variant}\n"));
    }
    out.push_str(&format!("points={}\n", session.points));
    out.push_str(&format!("students={}\n", session.students));
    out.push_str(&format!("position={},{}\n", session.position.x, session.position.y));
    out.push_str(&format!("box_opened={}\n", if session.box_opened { 1 } else { 0 }));
    out.push_str(&format!("program={}\n", session.program.join(",")));
    for hero in &session.acquired_heroes {
        out.push_str(&format!("hero={hero}\n"));
    }
    let available: Vec<&str> = session.available_commands.iter().map(|s| s.as_str()).collect();
    out.push_str(&format!("available={}\n", available.join(",")));
    out
}

fn parse_save(content: &str) -> SavedSession {
    let mut saved = SavedSession::default();

    for line in content.lines() {
        let line = line.trim();
        if let Some(val) = line.strip_prefix("variant=") {
            if !val.is_empty() {
                saved.variant = Some(val.to_string());
            }
        } else if let Some(val) = line.strip_prefix("points=") {
            saved.points = val.parse().ok();
        } else if let Some(val) = line.strip_prefix("students=") {
            saved.students = val.parse().ok();
        } else if let Some(val) = line.strip_prefix("position=") {
            let parts: Vec<&str> = val.split(',').collect();
            if parts.len() == 2 {
                if let (Ok(x), Ok(y)) = (parts[0].trim().parse(), parts[1].trim().parse()) {
                    saved.position = Some((x, y));
                }
            }
        } else if let Some(val) = line.strip_prefix("box_opened=") {
            saved.box_opened = Some(val == "1");
        } else if let Some(val) = line.strip_prefix("program=") {
            let program: Vec<String> = val
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            saved.program = Some(program);
        } else if let Some(val) = line.strip_prefix("hero=") {
            if !val.is_empty() {
                saved.heroes.push(val.to_string());
            }
        }
        // "available=" and anything unrecognized: ignored
    }

    saved
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::board::{Board, HeroDef};
    use crate::domain::command::{CommandDef, CommandKind, MoveDir};
    use crate::domain::gate::{CostRule, StageRule, StageTable};

    fn test_variant() -> VariantDef {
        let board = Board::new(
            vec![Pos::new(0, 0), Pos::new(1, 0), Pos::new(2, 0)],
            Pos::new(0, 0),
            None,
            Some(Pos::new(2, 0)),
            None,
            vec![HeroDef {
                id: "scout".into(),
                label: "Scout".into(),
                position: Pos::new(1, 0),
            }],
        );
        VariantDef {
            id: "track".into(),
            name: "Track".into(),
            board,
            commands: vec![CommandDef {
                id: "right".into(),
                label: "Right".into(),
                kind: CommandKind::Move(MoveDir::Right),
            }],
            cost: Some(CostRule::Staged(StageTable {
                stage1: StageRule { coefficient: 1.0, commands: vec!["right".into()] },
                hero: StageRule { coefficient: 2.0, commands: vec![] },
                final_stage: StageRule { coefficient: 3.0, commands: vec![] },
            })),
        }
    }

    #[test]
    fn snapshot_round_trips() {
        let variant = test_variant();
        let mut session = SessionState::fresh(&variant);
        session.points = 30;
        session.students = 7;
        session.position = Pos::new(1, 0);
        session.box_opened = true;
        session.program = vec!["right".into(), "right".into()];
        session.acquired_heroes = vec!["scout".into()];
        session.recompute_available(&variant);

        let restored = merge_session(&parse_save(&serialize(&session)), &variant);
        assert_eq!(restored.points, session.points);
        assert_eq!(restored.students, session.students);
        assert_eq!(restored.position, session.position);
        assert_eq!(restored.box_opened, session.box_opened);
        assert_eq!(restored.program, session.program);
        assert_eq!(restored.acquired_heroes, session.acquired_heroes);
        // derived, recomputed, still equal
        assert_eq!(restored.available_commands, session.available_commands);
    }

    #[test]
    fn partial_snapshot_fills_from_defaults() {
        let variant = test_variant();
        let saved = parse_save("points=12\n");
        let session = merge_session(&saved, &variant);
        assert_eq!(session.points, 12);
        assert_eq!(session.students, 10); // default
        assert_eq!(session.position, variant.board.start);
        assert!(!session.box_opened);
        assert!(session.program.is_empty());
        assert!(session.acquired_heroes.is_empty());
    }

    #[test]
    fn garbled_fields_fall_back_individually() {
        let variant = test_variant();
        let saved = parse_save(
            "points=twelve\nstudents=5\nposition=9\nbox_opened=maybe\nprogram=\n",
        );
        let session = merge_session(&saved, &variant);
        assert_eq!(session.points, 0);
        assert_eq!(session.students, 5);
        assert_eq!(session.position, variant.board.start);
        assert!(!session.box_opened);
        assert!(session.program.is_empty());
    }

    #[test]
    fn off_path_position_snaps_to_start() {
        let variant = test_variant();
        let saved = parse_save("position=5,5\n");
        let session = merge_session(&saved, &variant);
        assert_eq!(session.position, variant.board.start);
    }

    #[test]
    fn available_commands_are_recomputed_not_trusted() {
        let variant = test_variant();
        // snapshot claims an unlock the numbers do not support
        let saved = parse_save("points=0\nstudents=10\navailable=right\n");
        let session = merge_session(&saved, &variant);
        assert!(session.available_commands.is_empty());
    }

    #[test]
    fn duplicate_hero_lines_collapse() {
        let variant = test_variant();
        let saved = parse_save("hero=scout\nhero=scout\n");
        let session = merge_session(&saved, &variant);
        assert_eq!(session.acquired_heroes, vec!["scout".to_string()]);
    }
}
