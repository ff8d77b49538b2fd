/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use sim::event::GameEvent;
use sim::runner;
use sim::save;
use sim::variant::resolve_variant;
use sim::world::{Phase, SessionState, WorldState};
use ui::input::InputState;
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Transient message lifetime, in simulation ticks.
const MSG_TICKS: u32 = 40;

fn main() {
    let config = GameConfig::load();

    let mut world = WorldState::new();
    world.menu_entries = sim::variant::scan_variants(&config);

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing RoboCourse!");
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.tick_rate_ms);
    let pacing = config.run_pacing_ticks();

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() {
            persist(world);
            break;
        }

        let quit = match world.phase {
            Phase::Menu => handle_menu(world, &kb, config),
            Phase::Playing => handle_playing(world, &kb),
            Phase::ConfirmReset => handle_confirm_reset(world, &kb),
        };
        if quit {
            persist(world);
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            if world.phase == Phase::Playing && world.runner.running {
                let events = runner::tick(world, pacing);
                process_events(world, &events);
            }

            world.anim_tick = world.anim_tick.wrapping_add(1);
            world.tick_message();
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('k')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('j')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];
const KEYS_RUN: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_STEP: &[KeyCode] = &[KeyCode::Char('s'), KeyCode::Char('S'), KeyCode::Char(' ')];
const KEYS_CLEAR: &[KeyCode] = &[KeyCode::Char('c'), KeyCode::Char('C')];
const KEYS_YES: &[KeyCode] = &[KeyCode::Char('y'), KeyCode::Char('Y')];
const KEYS_POINTS_UP: &[KeyCode] = &[KeyCode::Char('+'), KeyCode::Char('=')];
const KEYS_POINTS_DOWN: &[KeyCode] = &[KeyCode::Char('-')];
const KEYS_STUDENTS_UP: &[KeyCode] = &[KeyCode::Char(']')];
const KEYS_STUDENTS_DOWN: &[KeyCode] = &[KeyCode::Char('[')];

// ── Menu ──

/// Returns true when the player asked to quit.
fn handle_menu(world: &mut WorldState, kb: &InputState, config: &GameConfig) -> bool {
    if kb.any_pressed(KEYS_QUIT) || kb.was_pressed(KeyCode::Esc) {
        return true;
    }

    let total = world.menu_entries.len();
    if total > 0 {
        if kb.any_pressed(KEYS_UP) {
            world.menu_cursor = (world.menu_cursor + total - 1) % total;
        }
        if kb.any_pressed(KEYS_DOWN) {
            world.menu_cursor = (world.menu_cursor + 1) % total;
        }
        if kb.any_pressed(KEYS_CONFIRM) {
            let id = world.menu_entries[world.menu_cursor].id.clone();
            select_variant(world, &id, config);
        }
    }

    false
}

/// Resolve a variant and enter it, restoring the autosave when its snapshot
/// belongs to the same variant.
fn select_variant(world: &mut WorldState, id: &str, config: &GameConfig) {
    let variant = match resolve_variant(id, config) {
        Some(v) => v,
        None => {
            world.set_message("That course failed to load.", MSG_TICKS);
            return;
        }
    };

    let saved = save::load_session();
    world.session = match &saved {
        Some(snapshot) if snapshot.variant.as_deref() == Some(id) => {
            save::merge_session(snapshot, &variant)
        }
        _ => SessionState::fresh(&variant),
    };

    world.variant = Some(variant);
    world.runner = sim::world::RunnerState::new();
    world.phase = Phase::Playing;
    world.message.clear();
    world.message_timer = 0;
}

// ── Playing ──

fn handle_playing(world: &mut WorldState, kb: &InputState) -> bool {
    if kb.was_pressed(KeyCode::Esc) {
        persist(world);
        world.phase = Phase::Menu;
        return false;
    }
    if kb.was_pressed(KeyCode::F(2)) {
        world.phase = Phase::ConfirmReset;
        return false;
    }

    // Program editing
    for digit in kb.digits_pressed() {
        append_by_index(world, digit as usize);
    }
    if kb.was_pressed(KeyCode::Backspace) {
        runner::remove_last(world);
        persist(world);
    }
    if kb.any_pressed(KEYS_CLEAR) {
        runner::clear_program(world);
        world.set_message("Program cleared.", MSG_TICKS);
        persist(world);
    }

    // Playback
    if kb.any_pressed(KEYS_RUN) && !runner::start_run(world) && !world.runner.running {
        world.set_message("Nothing to run yet.", MSG_TICKS);
    }
    if kb.any_pressed(KEYS_STEP) {
        let events = runner::step_once(world);
        process_events(world, &events);
    }

    // Points and students
    let mut gate_input_changed = false;
    if kb.any_pressed(KEYS_POINTS_UP) {
        world.session.points = world.session.points.saturating_add(1);
        gate_input_changed = true;
    }
    if kb.any_pressed(KEYS_POINTS_DOWN) {
        world.session.points = world.session.points.saturating_sub(1);
        gate_input_changed = true;
    }
    if kb.any_pressed(KEYS_STUDENTS_UP) {
        world.session.students = world.session.students.saturating_add(1);
        gate_input_changed = true;
    }
    if kb.any_pressed(KEYS_STUDENTS_DOWN) {
        world.session.students = world.session.students.saturating_sub(1);
        gate_input_changed = true;
    }
    if gate_input_changed {
        if let Some(variant) = &world.variant {
            world.session.recompute_available(variant);
        }
        persist(world);
    }

    false
}

/// Append the catalog entry shown at 1-based palette index `digit`, if the
/// unlock gate allows it.
fn append_by_index(world: &mut WorldState, digit: usize) {
    let variant = match &world.variant {
        Some(v) => v,
        None => return,
    };
    if digit == 0 {
        return;
    }
    let def = match variant.commands.get(digit - 1) {
        Some(d) => d,
        None => return,
    };
    if world.session.is_unlocked(&def.id) {
        let id = def.id.clone();
        runner::append(world, &id);
        persist(world);
    } else {
        let msg = format!("{} is still locked. Earn more points!", def.label);
        world.set_message(&msg, MSG_TICKS);
    }
}

// ── Reset confirmation ──

fn handle_confirm_reset(world: &mut WorldState, kb: &InputState) -> bool {
    if kb.any_pressed(KEYS_YES) {
        save::delete_save();
        if let Some(variant) = &world.variant {
            world.session = SessionState::fresh(variant);
        }
        world.runner = sim::world::RunnerState::new();
        world.phase = Phase::Playing;
        world.set_message("Progress reset.", MSG_TICKS);
        return false;
    }
    if kb.was_pressed(KeyCode::Esc) || kb.any_pressed(&[KeyCode::Char('n'), KeyCode::Char('N')]) {
        world.phase = Phase::Playing;
    }
    false
}

// ── Events and persistence ──

fn process_events(world: &mut WorldState, events: &[GameEvent]) {
    let mut save_worthy = false;
    for event in events {
        match event {
            GameEvent::HeroAcquired { label, .. } => {
                let msg = format!("Recruited {label}!");
                world.set_message(&msg, MSG_TICKS);
                save_worthy = true;
            }
            GameEvent::StorageUnlocked => {
                world.set_message("Storage unlocked! The box can now be opened.", MSG_TICKS);
            }
            GameEvent::BoxOpened => {
                world.set_message("The box is open!", MSG_TICKS);
                save_worthy = true;
            }
            GameEvent::RunFinished => {
                world.set_message("Run finished.", MSG_TICKS);
                save_worthy = true;
            }
            GameEvent::RobotMoved { .. } | GameEvent::RobotJumped { .. } => {}
        }
    }
    if save_worthy {
        persist(world);
    }
}

/// Write the autosave for the current session. Only meaningful once a
/// variant has been selected.
fn persist(world: &mut WorldState) {
    if world.variant.is_none() {
        return;
    }
    if let Err(e) = save::save_session(&world.session) {
        world.set_message(&e, MSG_TICKS);
    }
}
