/// Command catalog types.
/// A variant supplies an ordered list of CommandDef; command ids are
/// free-form strings chosen by the variant author, kinds fix the semantics.

/// The four unit directions a move command can carry.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Up,
    Down,
    Left,
    Right,
}

impl MoveDir {
    /// Unit delta for this direction. Y grows downward (screen rows).
    pub fn delta(self) -> (i32, i32) {
        match self {
            MoveDir::Up => (0, -1),
            MoveDir::Down => (0, 1),
            MoveDir::Left => (-1, 0),
            MoveDir::Right => (1, 0),
        }
    }

    /// Fixed evaluation order used by the jump command.
    pub const JUMP_ORDER: [MoveDir; 4] =
        [MoveDir::Up, MoveDir::Down, MoveDir::Left, MoveDir::Right];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "up" => Some(MoveDir::Up),
            "down" => Some(MoveDir::Down),
            "left" => Some(MoveDir::Left),
            "right" => Some(MoveDir::Right),
            _ => None,
        }
    }
}

/// What a command does when interpreted.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CommandKind {
    Move(MoveDir),
    Jump,
    Hero,
    Storage,
    Box,
}

/// One entry of a variant's command catalog.
#[derive(Clone, Debug)]
pub struct CommandDef {
    pub id: String,
    pub label: String,
    pub kind: CommandKind,
}

/// Find a command definition by id. Ids are unique within a catalog.
pub fn find_command<'a>(catalog: &'a [CommandDef], id: &str) -> Option<&'a CommandDef> {
    catalog.iter().find(|c| c.id == id)
}
