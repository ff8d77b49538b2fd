/// Board geometry: the walkable path and fixed feature positions.
///
/// The board is not a filled rectangle. Walkability is pure membership in
/// the path set — there is no separate bounds check, cells off the path are
/// simply not walkable. Feature lookups are exact equality tests against
/// the variant's fixed positions.

/// Integer grid position. Y grows downward.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub fn new(x: i32, y: i32) -> Self {
        Pos { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Pos { x: self.x + dx, y: self.y + dy }
    }
}

/// A hero placed on the board. Ids are unique within a variant.
#[derive(Clone, Debug)]
pub struct HeroDef {
    pub id: String,
    pub label: String,
    pub position: Pos,
}

/// Immutable board geometry for one variant.
#[derive(Clone, Debug)]
pub struct Board {
    path: Vec<Pos>,
    pub start: Pos,
    pub stone: Option<Pos>,
    pub box_pos: Option<Pos>,
    pub lock: Option<Pos>,
    pub heroes: Vec<HeroDef>,
}

impl Board {
    /// Build a board, collapsing duplicate path cells (first occurrence wins).
    pub fn new(
        path: Vec<Pos>,
        start: Pos,
        stone: Option<Pos>,
        box_pos: Option<Pos>,
        lock: Option<Pos>,
        heroes: Vec<HeroDef>,
    ) -> Self {
        let mut deduped: Vec<Pos> = Vec::with_capacity(path.len());
        for cell in path {
            if !deduped.contains(&cell) {
                deduped.push(cell);
            }
        }
        Board { path: deduped, start, stone, box_pos, lock, heroes }
    }

    pub fn path(&self) -> &[Pos] {
        &self.path
    }

    /// Is this cell a member of the walkable path?
    pub fn is_walkable(&self, pos: Pos) -> bool {
        self.path.contains(&pos)
    }

    pub fn stone_at(&self, pos: Pos) -> bool {
        self.stone == Some(pos)
    }

    pub fn box_at(&self, pos: Pos) -> bool {
        self.box_pos == Some(pos)
    }

    pub fn lock_at(&self, pos: Pos) -> bool {
        self.lock == Some(pos)
    }

    /// First hero standing on this cell, if any. Hero ids are unique, so in
    /// well-formed variants at most one hero matches.
    pub fn hero_at(&self, pos: Pos) -> Option<&HeroDef> {
        self.heroes.iter().find(|h| h.position == pos)
    }

    /// Extent of the path in cells: (columns, rows). Used by the renderer
    /// to size the board view.
    pub fn extent(&self) -> (i32, i32) {
        let max_x = self.path.iter().map(|p| p.x).max().unwrap_or(0);
        let max_y = self.path.iter().map(|p| p.y).max().unwrap_or(0);
        (max_x + 1, max_y + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: build a Board from a string diagram.
    /// Legend:  '.'=path  'S'=start(path)  'O'=stone(path)  'B'=box(path)
    ///          'L'=lock(path)  '1'..'9'=hero(path)  ' '=off-path
    fn board_from(rows: &[&str]) -> Board {
        let mut path = vec![];
        let mut start = Pos::new(0, 0);
        let mut stone = None;
        let mut box_pos = None;
        let mut lock = None;
        let mut heroes = vec![];
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let pos = Pos::new(x as i32, y as i32);
                if ch == ' ' {
                    continue;
                }
                path.push(pos);
                match ch {
                    'S' => start = pos,
                    'O' => stone = Some(pos),
                    'B' => box_pos = Some(pos),
                    'L' => lock = Some(pos),
                    d if d.is_ascii_digit() => heroes.push(HeroDef {
                        id: format!("hero{d}"),
                        label: format!("Hero {d}"),
                        position: pos,
                    }),
                    _ => {}
                }
            }
        }
        Board::new(path, start, stone, box_pos, lock, heroes)
    }

    #[test]
    fn walkable_is_exact_path_membership() {
        let b = board_from(&[
            "S..",
            "  .",
        ]);
        assert!(b.is_walkable(Pos::new(0, 0)));
        assert!(b.is_walkable(Pos::new(2, 1)));
        assert!(!b.is_walkable(Pos::new(0, 1)));
        assert!(!b.is_walkable(Pos::new(3, 0)));
        assert!(!b.is_walkable(Pos::new(-1, 0)));
    }

    #[test]
    fn duplicate_path_cells_collapse() {
        let cell = Pos::new(1, 1);
        let b = Board::new(vec![cell, cell, cell], cell, None, None, None, vec![]);
        assert_eq!(b.path().len(), 1);
        assert!(b.is_walkable(cell));
    }

    #[test]
    fn feature_lookups_are_equality_tests() {
        let b = board_from(&[
            "S.OB",
            "L...",
        ]);
        assert!(b.stone_at(Pos::new(2, 0)));
        assert!(!b.stone_at(Pos::new(1, 0)));
        assert!(b.box_at(Pos::new(3, 0)));
        assert!(b.lock_at(Pos::new(0, 1)));
    }

    #[test]
    fn hero_at_finds_the_occupant() {
        let b = board_from(&[
            "S1.2",
        ]);
        assert_eq!(b.hero_at(Pos::new(1, 0)).map(|h| h.id.as_str()), Some("hero1"));
        assert_eq!(b.hero_at(Pos::new(3, 0)).map(|h| h.id.as_str()), Some("hero2"));
        assert!(b.hero_at(Pos::new(2, 0)).is_none());
    }

    #[test]
    fn missing_features_never_match() {
        let b = board_from(&["S.."]);
        assert!(b.stone.is_none());
        assert!(!b.stone_at(Pos::new(1, 0)));
        assert!(!b.box_at(Pos::new(1, 0)));
        assert!(!b.lock_at(Pos::new(1, 0)));
    }
}
