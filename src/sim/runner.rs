/// Program buffer operations and the playback scheduler.
///
/// Two mutually exclusive execution modes share one program counter:
///
///   **Run** — timed sequential playback. Starting a run resets the counter
///   to 0 and snaps the robot to the variant's start cell (a full replay
///   always restarts geometry), then the main loop's fixed tick drives one
///   command per pacing interval until the program end. While running,
///   further run or step requests are ignored. On completion the counter
///   returns to 0 and the running flag drops.
///
///   **Step** — one command per invocation, from wherever the robot
///   currently sits; the counter wraps to 0 past the program end.
///
/// Program edits (clear, remove-last) invalidate any in-flight playback:
/// counter to 0, running flag off, robot snapped back to the start cell.
///
/// Appending never re-validates against the unlock gate — the UI only
/// offers unlocked commands, and the buffer trusts its caller.

use crate::sim::event::GameEvent;
use crate::sim::interpreter;
use crate::sim::world::WorldState;

/// Append a command id to the program.
pub fn append(world: &mut WorldState, command_id: &str) {
    world.session.program.push(command_id.to_string());
}

/// Clear the whole program and invalidate playback.
pub fn clear_program(world: &mut WorldState) {
    world.session.program.clear();
    reset_playback(world);
}

/// Drop the last program entry. No-op on an empty program.
pub fn remove_last(world: &mut WorldState) {
    if world.session.program.pop().is_some() {
        reset_playback(world);
    }
}

fn reset_playback(world: &mut WorldState) {
    world.runner.pointer = 0;
    world.runner.running = false;
    world.runner.delay_remaining = 0;
    if let Some(variant) = &world.variant {
        world.session.position = variant.board.start;
    }
}

/// Begin a full run. Rejected (returns false) while a run is in flight or
/// when the program is empty.
pub fn start_run(world: &mut WorldState) -> bool {
    if world.runner.running || world.session.program.is_empty() {
        return false;
    }
    let variant = match &world.variant {
        Some(v) => v,
        None => return false,
    };
    world.session.position = variant.board.start;
    world.runner.pointer = 0;
    world.runner.delay_remaining = 0; // first command on the next tick
    world.runner.running = true;
    true
}

/// Advance an in-flight run by one main-loop tick. Applies one command per
/// `pacing_ticks` ticks. Returns the events of the command it applied, plus
/// `RunFinished` when the program end is reached.
pub fn tick(world: &mut WorldState, pacing_ticks: u32) -> Vec<GameEvent> {
    if !world.runner.running {
        return vec![];
    }
    if world.runner.delay_remaining > 0 {
        world.runner.delay_remaining -= 1;
        return vec![];
    }

    let variant = match &world.variant {
        Some(v) => v,
        None => {
            world.runner.running = false;
            return vec![];
        }
    };

    let command_id = match world.session.program.get(world.runner.pointer) {
        Some(id) => id.clone(),
        None => {
            // program shrank under us; treat as completion
            world.runner.running = false;
            world.runner.pointer = 0;
            return vec![GameEvent::RunFinished];
        }
    };

    let mut events = interpreter::apply(&mut world.session, variant, &command_id);
    world.runner.pointer += 1;

    if world.runner.pointer >= world.session.program.len() {
        world.runner.running = false;
        world.runner.pointer = 0;
        events.push(GameEvent::RunFinished);
    } else {
        world.runner.delay_remaining = pacing_ticks.saturating_sub(1);
    }

    events
}

/// Execute a single program step. Rejected while a run is in flight or when
/// the program is empty. Wraps to the program start past the end; does NOT
/// reset the robot's position.
pub fn step_once(world: &mut WorldState) -> Vec<GameEvent> {
    if world.runner.running || world.session.program.is_empty() {
        return vec![];
    }
    let variant = match &world.variant {
        Some(v) => v,
        None => return vec![],
    };

    if world.runner.pointer >= world.session.program.len() {
        world.runner.pointer = 0;
    }
    let command_id = world.session.program[world.runner.pointer].clone();
    let events = interpreter::apply(&mut world.session, variant, &command_id);
    world.runner.pointer += 1;
    events
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
