/// Variant resolution.
///
/// ## Sources (priority order):
///   1. Built-in embedded variants
///   2. `variants/` directory (individual `.toml` files, id = file stem)
///
/// A variant id resolves only when its whole definition validates: board
/// geometry, a command catalog with unique ids, and at most one cost rule
/// form. Anything else makes the id unresolvable and the caller stays in
/// the "no variant selected" state — resolution never fails hard.
///
/// ## Embedded board diagrams
///
/// Built-in boards are authored as string diagrams:
///   '.' = path          'S' = start (path)    'O' = stone (path)
///   'B' = box (path)    'L' = storage lock (path)
///   '1'..'9' = hero (path, index into the hero list)
///   ' ' = off-path

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::config::GameConfig;
use crate::domain::board::{Board, HeroDef, Pos};
use crate::domain::command::{CommandDef, CommandKind, MoveDir};
use crate::domain::gate::{CostRule, StageRule, StageTable};
use crate::sim::world::MenuEntry;

/// One fully resolved, immutable variant: board + catalog + cost rule.
#[derive(Clone, Debug)]
pub struct VariantDef {
    pub id: String,
    pub name: String,
    pub board: Board,
    pub commands: Vec<CommandDef>,
    pub cost: Option<CostRule>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Resolve a variant id to its definition, or None if unknown/invalid.
pub fn resolve_variant(id: &str, config: &GameConfig) -> Option<VariantDef> {
    if let Some(v) = embedded_variants().into_iter().find(|v| v.id == id) {
        return Some(v);
    }
    let path = config.variants_dir.join(format!("{id}.toml"));
    let content = std::fs::read_to_string(&path).ok()?;
    match variant_from_toml(id, &content) {
        Some(v) => Some(v),
        None => {
            eprintln!("Warning: invalid variant file {}", path.display());
            None
        }
    }
}

/// List all selectable variants for the menu: embedded first, then the
/// variants directory in filename order.
pub fn scan_variants(config: &GameConfig) -> Vec<MenuEntry> {
    let mut entries: Vec<MenuEntry> = embedded_variants()
        .into_iter()
        .map(|v| MenuEntry { id: v.id, name: v.name })
        .collect();

    let mut files: Vec<PathBuf> = match std::fs::read_dir(&config.variants_dir) {
        Ok(dir) => dir
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |e| e == "toml"))
            .collect(),
        Err(_) => vec![],
    };
    files.sort();

    for path in files {
        let id = match path.file_stem() {
            Some(stem) => stem.to_string_lossy().to_string(),
            None => continue,
        };
        if entries.iter().any(|e| e.id == id) {
            continue; // embedded ids shadow files
        }
        if let Ok(content) = std::fs::read_to_string(&path) {
            if let Some(v) = variant_from_toml(&id, &content) {
                entries.push(MenuEntry { id: v.id, name: v.name });
            }
        }
    }

    entries
}

// ══════════════════════════════════════════════════════════════
// TOML schema
// ══════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug)]
struct TomlVariant {
    name: Option<String>,
    board: TomlBoard,
    #[serde(default)]
    commands: Vec<TomlCommand>,
    cost: Option<TomlCost>,
}

#[derive(Deserialize, Debug)]
struct TomlBoard {
    path: Vec<[i32; 2]>,
    start: [i32; 2],
    stone: Option<[i32; 2]>,
    #[serde(rename = "box")]
    box_pos: Option<[i32; 2]>,
    lock: Option<[i32; 2]>,
    #[serde(default)]
    heroes: Vec<TomlHero>,
}

#[derive(Deserialize, Debug)]
struct TomlHero {
    id: String,
    label: Option<String>,
    position: [i32; 2],
}

#[derive(Deserialize, Debug)]
struct TomlCommand {
    id: String,
    label: Option<String>,
    kind: String,
    direction: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TomlCost {
    direct: Option<BTreeMap<String, f64>>,
    staged: Option<TomlStaged>,
}

#[derive(Deserialize, Debug)]
struct TomlStaged {
    stage1: TomlStage,
    hero: TomlStage,
    #[serde(rename = "final")]
    final_stage: TomlStage,
}

#[derive(Deserialize, Debug)]
struct TomlStage {
    coefficient: f64,
    #[serde(default)]
    commands: Vec<String>,
}

/// Parse and validate one variant file. None on any structural problem.
fn variant_from_toml(id: &str, content: &str) -> Option<VariantDef> {
    let raw: TomlVariant = toml::from_str(content).ok()?;

    let pos = |p: [i32; 2]| Pos::new(p[0], p[1]);

    let mut hero_ids: Vec<&str> = vec![];
    let mut heroes = vec![];
    for h in &raw.board.heroes {
        if hero_ids.contains(&h.id.as_str()) {
            return None; // hero ids must be unique
        }
        hero_ids.push(&h.id);
        heroes.push(HeroDef {
            id: h.id.clone(),
            label: h.label.clone().unwrap_or_else(|| h.id.clone()),
            position: pos(h.position),
        });
    }

    let board = Board::new(
        raw.board.path.iter().map(|&p| pos(p)).collect(),
        pos(raw.board.start),
        raw.board.stone.map(pos),
        raw.board.box_pos.map(pos),
        raw.board.lock.map(pos),
        heroes,
    );
    if board.path().is_empty() {
        return None;
    }
    // The session seats the robot on `start` (fresh, reset, run snap-back),
    // so an off-path start would break path membership from the first
    // frame. Hero pickup likewise needs the hero's cell to be reachable.
    if !board.is_walkable(board.start) {
        return None;
    }
    if board.heroes.iter().any(|h| !board.is_walkable(h.position)) {
        return None;
    }
    // The renderer draws rows 0..extent; negative coordinates never show.
    let off_grid = |p: Pos| p.x < 0 || p.y < 0;
    if board.path().iter().copied().any(off_grid)
        || board.stone.map_or(false, off_grid)
        || board.box_pos.map_or(false, off_grid)
        || board.lock.map_or(false, off_grid)
    {
        return None;
    }

    let mut commands = vec![];
    for c in &raw.commands {
        if commands.iter().any(|d: &CommandDef| d.id == c.id) {
            return None; // command ids must be unique
        }
        let kind = match c.kind.as_str() {
            "move" => CommandKind::Move(MoveDir::parse(c.direction.as_deref()?)?),
            "jump" => CommandKind::Jump,
            "hero" => CommandKind::Hero,
            "storage" => CommandKind::Storage,
            "box" => CommandKind::Box,
            _ => return None,
        };
        commands.push(CommandDef {
            id: c.id.clone(),
            label: c.label.clone().unwrap_or_else(|| c.id.clone()),
            kind,
        });
    }
    if commands.is_empty() {
        commands = standard_commands();
    }

    let cost = match raw.cost {
        None => None,
        Some(TomlCost { direct: Some(_), staged: Some(_) }) => return None, // one form only
        Some(TomlCost { direct: Some(table), staged: None }) => Some(CostRule::Direct(table)),
        Some(TomlCost { direct: None, staged: Some(s) }) => {
            let stage = |t: &TomlStage| StageRule {
                coefficient: t.coefficient,
                commands: t.commands.clone(),
            };
            Some(CostRule::Staged(StageTable {
                stage1: stage(&s.stage1),
                hero: stage(&s.hero),
                final_stage: stage(&s.final_stage),
            }))
        }
        Some(TomlCost { direct: None, staged: None }) => None,
    };

    Some(VariantDef {
        id: id.to_string(),
        name: raw.name.unwrap_or_else(|| id.to_string()),
        board,
        commands,
        cost,
    })
}

// ══════════════════════════════════════════════════════════════
// Embedded variants
// ══════════════════════════════════════════════════════════════

/// The canonical eight-command catalog shared by the built-in variants.
fn standard_commands() -> Vec<CommandDef> {
    let def = |id: &str, label: &str, kind: CommandKind| CommandDef {
        id: id.to_string(),
        label: label.to_string(),
        kind,
    };
    vec![
        def("up", "Up", CommandKind::Move(MoveDir::Up)),
        def("down", "Down", CommandKind::Move(MoveDir::Down)),
        def("left", "Left", CommandKind::Move(MoveDir::Left)),
        def("right", "Right", CommandKind::Move(MoveDir::Right)),
        def("jump", "Jump", CommandKind::Jump),
        def("hero", "Recruit hero", CommandKind::Hero),
        def("storage", "Open storage", CommandKind::Storage),
        def("box", "Open box", CommandKind::Box),
    ]
}

fn staged_cost(stage1: f64, hero: f64, final_: f64) -> CostRule {
    CostRule::Staged(StageTable {
        stage1: StageRule {
            coefficient: stage1,
            commands: vec!["up".into(), "down".into(), "left".into(), "right".into()],
        },
        hero: StageRule { coefficient: hero, commands: vec!["hero".into()] },
        final_stage: StageRule {
            coefficient: final_,
            commands: vec!["jump".into(), "storage".into(), "box".into()],
        },
    })
}

/// The classic course: a looping path with six heroes, a stone gap in front
/// of the locked box, and the storage lock above the box.
const COURSE_DIAGRAM: [&str; 7] = [
    "          ",
    "          ",
    "  1.2. L. ",
    "  .  .OB. ",
    "  .  4 .. ",
    "  53..    ",
    " S..6.    ",
];

const COURSE_HEROES: [(&str, &str); 6] = [
    ("vector", "Vector"),
    ("codeman", "Codeman"),
    ("supermark", "Supermark"),
    ("cyberjinn", "Cyberjinn"),
    ("robozeka", "Robozeka"),
    ("flashcone", "Flashcone"),
];

/// A short straight track priced per command instead of per stage.
const SPRINT_DIAGRAM: [&str; 1] = ["S1.OLB"];

const SPRINT_HEROES: [(&str, &str); 1] = [("scout", "Scout")];

fn embedded_variants() -> Vec<VariantDef> {
    let mut sprint_costs = BTreeMap::new();
    for (id, cost) in [
        ("up", 1.0),
        ("down", 1.0),
        ("left", 1.0),
        ("right", 1.0),
        ("hero", 2.0),
        ("jump", 3.0),
        ("storage", 4.0),
        ("box", 5.0),
    ] {
        let _ = sprint_costs.insert(id.to_string(), cost);
    }

    vec![
        make_embedded(
            "junior",
            "Junior Course",
            &COURSE_DIAGRAM,
            &COURSE_HEROES,
            Some(staged_cost(1.0, 2.5, 4.0)),
        ),
        make_embedded(
            "senior",
            "Senior Course",
            &COURSE_DIAGRAM,
            &COURSE_HEROES,
            Some(staged_cost(2.0, 5.0, 8.0)),
        ),
        make_embedded(
            "sprint",
            "Sprint Track",
            &SPRINT_DIAGRAM,
            &SPRINT_HEROES,
            Some(CostRule::Direct(sprint_costs)),
        ),
    ]
}

fn make_embedded(
    id: &str,
    name: &str,
    diagram: &[&str],
    heroes: &[(&str, &str)],
    cost: Option<CostRule>,
) -> VariantDef {
    VariantDef {
        id: id.to_string(),
        name: name.to_string(),
        board: board_from_diagram(diagram, heroes),
        commands: standard_commands(),
        cost,
    }
}

fn board_from_diagram(diagram: &[&str], heroes: &[(&str, &str)]) -> Board {
    let mut path = vec![];
    let mut start = Pos::new(0, 0);
    let mut stone = None;
    let mut box_pos = None;
    let mut lock = None;
    let mut hero_defs = vec![];

    for (y, row) in diagram.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            if ch == ' ' {
                continue;
            }
            let pos = Pos::new(x as i32, y as i32);
            path.push(pos);
            match ch {
                'S' => start = pos,
                'O' => stone = Some(pos),
                'B' => box_pos = Some(pos),
                'L' => lock = Some(pos),
                d if d.is_ascii_digit() => {
                    let index = (d as u8 - b'1') as usize;
                    if let Some(&(id, label)) = heroes.get(index) {
                        hero_defs.push(HeroDef {
                            id: id.to_string(),
                            label: label.to_string(),
                            position: pos,
                        });
                    }
                }
                _ => {}
            }
        }
    }

    Board::new(path, start, stone, box_pos, lock, hero_defs)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_course_geometry_is_stable() {
        let junior = embedded_variants().into_iter().find(|v| v.id == "junior").unwrap();
        let b = &junior.board;
        assert_eq!(b.start, Pos::new(1, 6));
        assert_eq!(b.stone, Some(Pos::new(6, 3)));
        assert_eq!(b.box_pos, Some(Pos::new(7, 3)));
        assert_eq!(b.lock, Some(Pos::new(7, 2)));
        assert_eq!(b.path().len(), 24);
        assert_eq!(b.heroes.len(), 6);
        assert_eq!(
            b.hero_at(Pos::new(5, 4)).map(|h| h.id.as_str()),
            Some("cyberjinn")
        );
        // the stone's cell is itself a path member; only the stone rule blocks it
        assert!(b.is_walkable(Pos::new(6, 3)));
    }

    #[test]
    fn embedded_catalogs_have_unique_ids() {
        for v in embedded_variants() {
            for (i, c) in v.commands.iter().enumerate() {
                assert!(
                    !v.commands[..i].iter().any(|d| d.id == c.id),
                    "duplicate command id {} in {}",
                    c.id,
                    v.id
                );
            }
        }
    }

    #[test]
    fn toml_variant_parses() {
        let text = r#"
            name = "Test Track"
            [board]
            path = [[0,0],[1,0],[1,0],[2,0]]
            start = [0,0]
            stone = [1,0]
            [[board.heroes]]
            id = "a"
            position = [2,0]
            [[commands]]
            id = "right"
            kind = "move"
            direction = "right"
            [cost.direct]
            right = 1.5
        "#;
        let v = variant_from_toml("test", text).unwrap();
        assert_eq!(v.name, "Test Track");
        assert_eq!(v.board.path().len(), 3); // duplicate cell collapsed
        assert_eq!(v.commands.len(), 1);
        assert!(matches!(v.cost, Some(CostRule::Direct(_))));
    }

    #[test]
    fn toml_variant_defaults_catalog_and_staged_cost() {
        let text = r#"
            [board]
            path = [[0,0]]
            start = [0,0]
            [cost.staged.stage1]
            coefficient = 1.0
            commands = ["up"]
            [cost.staged.hero]
            coefficient = 2.0
            commands = ["hero"]
            [cost.staged.final]
            coefficient = 3.0
            commands = ["box"]
        "#;
        let v = variant_from_toml("plain", text).unwrap();
        assert_eq!(v.name, "plain");
        assert_eq!(v.commands.len(), 8); // standard catalog filled in
        match v.cost {
            Some(CostRule::Staged(ref t)) => assert_eq!(t.final_stage.coefficient, 3.0),
            _ => panic!("expected staged rule"),
        }
    }

    #[test]
    fn invalid_variants_are_unresolvable() {
        // duplicate command ids
        let dup = r#"
            [board]
            path = [[0,0]]
            start = [0,0]
            [[commands]]
            id = "x"
            kind = "jump"
            [[commands]]
            id = "x"
            kind = "box"
        "#;
        assert!(variant_from_toml("dup", dup).is_none());

        // move command without a direction
        let nodir = r#"
            [board]
            path = [[0,0]]
            start = [0,0]
            [[commands]]
            id = "m"
            kind = "move"
        "#;
        assert!(variant_from_toml("nodir", nodir).is_none());

        // both cost forms at once
        let both = r#"
            [board]
            path = [[0,0]]
            start = [0,0]
            [cost.direct]
            up = 1.0
            [cost.staged.stage1]
            coefficient = 1.0
            [cost.staged.hero]
            coefficient = 1.0
            [cost.staged.final]
            coefficient = 1.0
        "#;
        assert!(variant_from_toml("both", both).is_none());

        // empty path
        let empty = r#"
            [board]
            path = []
            start = [0,0]
        "#;
        assert!(variant_from_toml("empty", empty).is_none());

        // not TOML at all
        assert!(variant_from_toml("garbage", "{ not toml").is_none());
    }

    #[test]
    fn off_path_start_is_unresolvable() {
        // a start outside the path would seat the robot off the path
        // before any command runs
        let lost = r#"
            [board]
            path = [[0,0],[1,0]]
            start = [5,5]
        "#;
        assert!(variant_from_toml("lost", lost).is_none());
    }

    #[test]
    fn off_path_hero_is_unresolvable() {
        let stranded = r#"
            [board]
            path = [[0,0],[1,0]]
            start = [0,0]
            [[board.heroes]]
            id = "ghost"
            position = [9,9]
        "#;
        assert!(variant_from_toml("stranded", stranded).is_none());
    }

    #[test]
    fn negative_coordinates_are_unresolvable() {
        let below = r#"
            [board]
            path = [[-1,0],[0,0]]
            start = [0,0]
        "#;
        assert!(variant_from_toml("below", below).is_none());

        let stone_out = r#"
            [board]
            path = [[0,0],[1,0]]
            start = [0,0]
            stone = [0,-2]
        "#;
        assert!(variant_from_toml("stone_out", stone_out).is_none());
    }

    #[test]
    fn resolved_variants_seat_the_robot_on_the_path() {
        let text = r#"
            [board]
            path = [[0,0],[1,0],[2,0]]
            start = [1,0]
        "#;
        let v = variant_from_toml("seated", text).unwrap();
        let session = crate::sim::world::SessionState::fresh(&v);
        assert!(v.board.is_walkable(session.position));
    }

    #[test]
    fn missing_cost_table_means_nothing_unlocks() {
        let text = r#"
            [board]
            path = [[0,0]]
            start = [0,0]
        "#;
        let v = variant_from_toml("free", text).unwrap();
        assert!(v.cost.is_none());
        let unlocked = crate::domain::gate::compute_unlocked(1000, 1, v.cost.as_ref());
        assert!(unlocked.is_empty());
    }
}
