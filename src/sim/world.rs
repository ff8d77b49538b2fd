/// WorldState: everything the game loop owns for one running session.
///
/// ## Layering
///
/// Two layers, composed at runtime:
///   - `variant` — the resolved VariantDef (board + commands + cost rule).
///     **Never mutated** after selection.
///   - `session` — the mutable play state (robot, program, heroes, box,
///     points/students). Recreated fresh on variant select or reset,
///     restored from the autosave when a matching snapshot exists.
///
/// All position mutations go through the interpreter, which validates
/// against the variant's path before committing. `available_commands` is a
/// cache of the unlock gate's output, recomputed whenever points, students
/// or the variant change — it is never authoritative.

use std::collections::BTreeSet;

use crate::domain::board::Pos;
use crate::domain::gate;
use crate::sim::variant::VariantDef;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Menu,
    Playing,
    ConfirmReset,
}

/// Mutable play state for the selected variant.
/// This is the persisted snapshot shape (see `sim::save`).
#[derive(Clone, Debug)]
pub struct SessionState {
    pub position: Pos,
    pub program: Vec<String>,
    pub acquired_heroes: Vec<String>,
    pub box_opened: bool,
    pub points: u32,
    pub students: u32,
    /// Derived cache of the unlock gate. Recomputed, never trusted from disk.
    pub available_commands: BTreeSet<String>,
    pub variant_id: Option<String>,
}

impl SessionState {
    /// Fresh session for a variant: empty program, robot at start,
    /// no heroes, box closed.
    pub fn fresh(variant: &VariantDef) -> Self {
        let mut session = SessionState {
            position: variant.board.start,
            program: vec![],
            acquired_heroes: vec![],
            box_opened: false,
            points: 0,
            students: 10,
            available_commands: BTreeSet::new(),
            variant_id: Some(variant.id.clone()),
        };
        session.recompute_available(variant);
        session
    }

    /// Refresh the available-commands cache from the unlock gate.
    pub fn recompute_available(&mut self, variant: &VariantDef) {
        self.available_commands =
            gate::compute_unlocked(self.points, self.students, variant.cost.as_ref());
    }

    pub fn is_unlocked(&self, command_id: &str) -> bool {
        self.available_commands.contains(command_id)
    }
}

/// Playback state of the scheduler. See `sim::runner`.
#[derive(Clone, Debug)]
pub struct RunnerState {
    /// Index of the next program entry to execute.
    pub pointer: usize,
    /// True while a full run is in flight. Guards against re-entry.
    pub running: bool,
    /// Ticks left before the running playback applies its next command.
    pub delay_remaining: u32,
}

impl RunnerState {
    pub fn new() -> Self {
        RunnerState { pointer: 0, running: false, delay_remaining: 0 }
    }
}

pub struct WorldState {
    pub phase: Phase,
    pub variant: Option<VariantDef>,
    pub session: SessionState,
    pub runner: RunnerState,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
    pub menu_cursor: usize,
    pub menu_entries: Vec<MenuEntry>,
    pub anim_tick: u32,
}

/// One selectable variant on the menu screen.
#[derive(Clone, Debug)]
pub struct MenuEntry {
    pub id: String,
    pub name: String,
}

impl WorldState {
    pub fn new() -> Self {
        WorldState {
            phase: Phase::Menu,
            variant: None,
            session: SessionState {
                position: Pos::new(0, 0),
                program: vec![],
                acquired_heroes: vec![],
                box_opened: false,
                points: 0,
                students: 10,
                available_commands: BTreeSet::new(),
                variant_id: None,
            },
            runner: RunnerState::new(),
            message: String::new(),
            message_timer: 0,
            menu_cursor: 0,
            menu_entries: vec![],
            anim_tick: 0,
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Tick the transient message timer. Duration 0 means "sticky".
    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }
}
