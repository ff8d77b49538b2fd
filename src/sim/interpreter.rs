/// The command interpreter: applies one command id to the session.
///
/// Processing discipline:
///   - every position mutation is validated against the board's path
///     before commit — the robot never leaves the path
///   - illegal applications (off-path move, move into the stone, action on
///     the wrong cell, unknown command id) are silent no-ops; the
///     interpreter has no failure channel, absence of effect is the signal
///   - events describe what happened, for the presentation layer only
///
/// Gating is not re-checked here: the UI only offers unlocked commands,
/// and the program buffer trusts its caller.

use crate::domain::board::Pos;
use crate::domain::command::{self, CommandKind, MoveDir};
use crate::sim::event::GameEvent;
use crate::sim::variant::VariantDef;
use crate::sim::world::SessionState;

/// Apply one command to the session. Returns the events it produced
/// (empty when the command had no effect).
pub fn apply(session: &mut SessionState, variant: &VariantDef, command_id: &str) -> Vec<GameEvent> {
    let def = match command::find_command(&variant.commands, command_id) {
        Some(d) => d,
        None => return vec![],
    };

    match def.kind {
        CommandKind::Move(dir) => apply_move(session, variant, dir),
        CommandKind::Jump => apply_jump(session, variant),
        CommandKind::Hero => apply_hero(session, variant),
        CommandKind::Storage => apply_storage(session, variant),
        CommandKind::Box => apply_box(session, variant),
    }
}

fn apply_move(session: &mut SessionState, variant: &VariantDef, dir: MoveDir) -> Vec<GameEvent> {
    let from = session.position;
    let (dx, dy) = dir.delta();
    let next = from.offset(dx, dy);

    // The stone blocks entry to its cell even when the cell is on the path.
    if variant.board.stone_at(next) {
        return vec![];
    }
    if !variant.board.is_walkable(next) {
        return vec![];
    }
    session.position = next;
    vec![GameEvent::RobotMoved { from, to: next }]
}

/// Jump over the stone: the first direction (up, down, left, right) whose
/// adjacent cell holds the stone and whose two-step landing cell is
/// walkable wins. First match only — on a single-stone board at most one
/// direction can ever qualify.
fn apply_jump(session: &mut SessionState, variant: &VariantDef) -> Vec<GameEvent> {
    let from = session.position;
    for dir in MoveDir::JUMP_ORDER {
        let (dx, dy) = dir.delta();
        let over = from.offset(dx, dy);
        let landing = from.offset(dx * 2, dy * 2);
        if variant.board.stone_at(over) && variant.board.is_walkable(landing) {
            session.position = landing;
            return vec![GameEvent::RobotJumped { from, to: landing }];
        }
    }
    vec![]
}

fn apply_hero(session: &mut SessionState, variant: &VariantDef) -> Vec<GameEvent> {
    let hero = match variant.board.hero_at(session.position) {
        Some(h) => h,
        None => return vec![],
    };
    if session.acquired_heroes.iter().any(|id| id == &hero.id) {
        return vec![]; // already recruited — idempotent
    }
    session.acquired_heroes.push(hero.id.clone());
    vec![GameEvent::HeroAcquired { id: hero.id.clone(), label: hero.label.clone() }]
}

/// Storage is a narrative gate: a message-only event when standing on the
/// lock cell, no state change. The box command does not require it.
fn apply_storage(session: &mut SessionState, variant: &VariantDef) -> Vec<GameEvent> {
    if variant.board.lock_at(session.position) {
        vec![GameEvent::StorageUnlocked]
    } else {
        vec![]
    }
}

fn apply_box(session: &mut SessionState, variant: &VariantDef) -> Vec<GameEvent> {
    if !variant.board.box_at(session.position) {
        return vec![];
    }
    if session.box_opened {
        return vec![]; // one-way, idempotent
    }
    session.box_opened = true;
    vec![GameEvent::BoxOpened]
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
