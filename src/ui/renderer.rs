/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// inter-row gap color matches the cell color on VTE-based terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn as_str(&self) -> &str {
        if self.ch_len == 0 {
            return "";
        }
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or(" ")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            cx += 1;
        }
    }

    fn fill_row(&mut self, y: usize, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', fg, bg));
        }
    }
}

// ── Renderer ──

/// Each board cell = 2 terminal columns, so the course reads roughly square.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

// Palette
const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const GREEN: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const CYAN: Color = Color::Rgb { r: 100, g: 200, b: 255 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const PATH_FG: Color = Color::Rgb { r: 90, g: 90, b: 120 };
const PATH_BG: Color = Color::Rgb { r: 32, g: 32, b: 50 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Detect phase change → clear for clean transition
        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.front.clear();

        match world.phase {
            Phase::Menu => self.compose_menu(world),
            Phase::Playing => self.compose_game(world),
            Phase::ConfirmReset => {
                self.compose_game(world);
                self.compose_reset_overlay(world);
            }
        }

        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Set explicit base colors at start of frame. Not ResetColor: the
        // terminal's native default may differ from BASE_BG and cause
        // line artifacts.
        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Playing screen ──

    fn compose_game(&mut self, w: &WorldState) {
        let variant = match &w.variant {
            Some(v) => v,
            None => return,
        };
        let s = &w.session;

        // ── HUD row ──
        let hud = format!(
            " {}   Points:{:<5} Students:{:<4} Unlocked:{}/{} ",
            variant.name,
            s.points,
            s.students,
            s.available_commands.len(),
            variant.commands.len(),
        );
        self.front.fill_row(HUD_ROW, Color::White, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Board ──
        let (bw, bh) = variant.board.extent();
        for y in 0..bh {
            let row = MAP_ROW + y as usize;
            if row >= self.front.height {
                break;
            }
            for x in 0..bw {
                let col = x as usize * CELL_W;
                self.compose_board_cell(w, x, y, col, row);
            }
        }

        // ── Command palette (right of the board) ──
        let pal_x = (bw as usize * CELL_W + 4).min(self.front.width.saturating_sub(1));
        self.front.put_str(pal_x, MAP_ROW, "Commands", GOLD, Color::Reset);
        for (i, def) in variant.commands.iter().enumerate().take(9) {
            let row = MAP_ROW + 1 + i;
            if row >= self.front.height {
                break;
            }
            if s.is_unlocked(&def.id) {
                let line = format!("{}. {}", i + 1, def.label);
                self.front.put_str(pal_x, row, &line, GREEN, Color::Reset);
            } else {
                let line = format!("{}. {}  (locked)", i + 1, def.label);
                self.front.put_str(pal_x, row, &line, Color::DarkGrey, Color::Reset);
            }
        }

        // ── Hero roster ──
        let roster_row = MAP_ROW + bh as usize + 1;
        if roster_row < self.front.height {
            let mut line = format!(
                "Heroes {}/{}: ",
                s.acquired_heroes.len(),
                variant.board.heroes.len()
            );
            for hero in &variant.board.heroes {
                if s.acquired_heroes.contains(&hero.id) {
                    line.push_str(&hero.label);
                    line.push(' ');
                }
            }
            self.front.put_str(0, roster_row, &line, CYAN, Color::Reset);
        }

        // ── Program buffer ──
        let prog_row = roster_row + 2;
        if prog_row < self.front.height {
            self.front.put_str(0, prog_row, "Program:", GOLD, Color::Reset);
            let mut cx = 9;
            for (i, id) in s.program.iter().enumerate() {
                let label = variant
                    .commands
                    .iter()
                    .find(|d| &d.id == id)
                    .map(|d| d.label.as_str())
                    .unwrap_or(id.as_str());
                // highlight the entry the scheduler executes next
                let (fg, bg) = if w.runner.running && i == w.runner.pointer {
                    (Color::Black, GREEN)
                } else if !w.runner.running && i == w.runner.pointer && w.runner.pointer > 0 {
                    (GOLD, Color::Reset)
                } else {
                    (Color::White, Color::Reset)
                };
                let entry = format!("{} ", label);
                if cx + entry.len() >= self.front.width {
                    break;
                }
                self.front.put_str(cx, prog_row, &entry, fg, bg);
                cx += entry.len();
            }
            if s.program.is_empty() {
                self.front.put_str(9, prog_row, "(empty)", Color::DarkGrey, Color::Reset);
            }
        }

        // ── Message bar ──
        let msg_row = prog_row + 2;
        if msg_row < self.front.height && !w.message.is_empty() {
            let msg = format!(" ◈ {} ", w.message);
            self.front.fill_row(msg_row, Color::Black, MSG_BG);
            self.front.put_str(0, msg_row, &msg, Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help_row = msg_row + 2;
        if help_row < self.front.height {
            let help = " 1-8:Add  Bksp:Undo  C:Clear  R:Run  S/Space:Step  +/-:Points  ]/[:Students  F2:Reset  ESC:Menu";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    /// Write the visual for board cell (x, y) into the front buffer.
    /// Each board cell = 2 terminal columns.
    fn compose_board_cell(&mut self, w: &WorldState, x: i32, y: i32, col: usize, row: usize) {
        let variant = match &w.variant {
            Some(v) => v,
            None => return,
        };
        let s = &w.session;
        let pos = crate::domain::board::Pos::new(x, y);

        // Robot first: it covers whatever it stands on.
        if s.position == pos {
            self.front.set(col, row, Cell::from_char('@', GREEN, PATH_BG));
            self.front.set(col + 1, row, Cell::from_char(' ', GREEN, PATH_BG));
            return;
        }

        if variant.board.stone_at(pos) {
            self.front.set(col, row, Cell::from_char('▓', Color::Grey, Color::Rgb { r: 60, g: 60, b: 60 }));
            self.front.set(col + 1, row, Cell::from_char('▓', Color::Grey, Color::Rgb { r: 60, g: 60, b: 60 }));
            return;
        }

        if let Some(hero) = variant.board.hero_at(pos) {
            let acquired = s.acquired_heroes.contains(&hero.id);
            let initial = hero.label.chars().next().unwrap_or('?');
            let fg = if acquired { Color::DarkGrey } else { GOLD };
            self.front.set(col, row, Cell::from_char(initial, fg, PATH_BG));
            self.front.set(col + 1, row, Cell::from_char(' ', fg, PATH_BG));
            return;
        }

        if variant.board.box_at(pos) {
            let (ch, fg) = if s.box_opened { ('▢', Color::DarkGrey) } else { ('▣', GOLD) };
            self.front.set(col, row, Cell::from_char(ch, fg, PATH_BG));
            self.front.set(col + 1, row, Cell::from_char(' ', fg, PATH_BG));
            return;
        }

        if variant.board.lock_at(pos) {
            self.front.set(col, row, Cell::from_char('◈', CYAN, PATH_BG));
            self.front.set(col + 1, row, Cell::from_char(' ', CYAN, PATH_BG));
            return;
        }

        if variant.board.is_walkable(pos) {
            let ch = if pos == variant.board.start { '◦' } else { '·' };
            self.front.set(col, row, Cell::from_char(ch, PATH_FG, PATH_BG));
            self.front.set(col + 1, row, Cell::from_char(' ', PATH_FG, PATH_BG));
        } else {
            self.front.set(col, row, Cell::BLANK);
            self.front.set(col + 1, row, Cell::BLANK);
        }
    }

    // ── Menu screen ──

    fn compose_menu(&mut self, w: &WorldState) {
        let title = [
            r"  ___       _           ___                           ",
            r" | _ \ ___ | |__  ___  / __| ___  _  _  _ _  ___ ___  ",
            r" |   // _ \| '_ \/ _ \| (__ / _ \| || || '_|(_-</ -_) ",
            r" |_|_\\___/|_.__/\___/ \___|\___/ \_,_||_|  /__/\___| ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 1 + i, line, GOLD, Color::Reset);
        }

        let subtitle = "◈◈  Program the robot, earn the commands  ◈◈";
        self.front.put_str(6, 6, subtitle, GREEN, Color::Reset);

        // Variant list
        let list_top = 9;
        let cursor_bg = Color::Rgb { r: 30, g: 60, b: 30 };
        self.front.put_str(4, list_top - 1, "Select a course:", Color::White, Color::Reset);

        for (i, entry) in w.menu_entries.iter().enumerate() {
            let row = list_top + i;
            if row >= self.front.height {
                break;
            }
            let line = format!("{:>2}. {}", i + 1, entry.name);
            if i == w.menu_cursor {
                let blink = (w.anim_tick / 5) % 2 == 0;
                let arrow = if blink { "▸" } else { " " };
                for x in 0..44.min(self.front.width) {
                    self.front.set(x, row, Cell::from_char(' ', Color::White, cursor_bg));
                }
                self.front.put_str(4, row, arrow, GREEN, cursor_bg);
                self.front.put_str(6, row, &line, GREEN, cursor_bg);
            } else {
                self.front.put_str(6, row, &line, Color::White, Color::Reset);
            }
        }

        if w.menu_entries.is_empty() {
            self.front.put_str(6, list_top, "(no courses found)", Color::DarkGrey, Color::Reset);
        }

        // Footer
        let footer_row = list_top + w.menu_entries.len().max(1) + 2;
        if footer_row < self.front.height {
            self.front.put_str(
                4,
                footer_row,
                "ENTER: Start   ↑↓: Select   Q: Quit",
                Color::DarkGrey,
                Color::Reset,
            );
            if footer_row + 1 < self.front.height {
                self.front.put_str(
                    4,
                    footer_row + 1,
                    "Progress is saved automatically.",
                    Color::Rgb { r: 80, g: 80, b: 100 },
                    Color::Reset,
                );
            }
        }

        // Message bar (load warnings, etc.)
        if !w.message.is_empty() {
            let msg_row = self.front.height.saturating_sub(1);
            let msg = format!(" ◈ {} ", w.message);
            self.front.fill_row(msg_row, Color::Black, MSG_BG);
            self.front.put_str(0, msg_row, &msg, Color::Black, MSG_BG);
        }
    }

    // ── Reset confirmation overlay ──

    fn compose_reset_overlay(&mut self, w: &WorldState) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let box_w = 40_usize.min(self.front.width);
        let box_h = 7_usize.min(self.front.height);
        let box_x = self.front.width.saturating_sub(box_w) / 2;
        let box_y = self.front.height.saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::from_char(' ', Color::Reset, dim));
            }
        }

        let blink = (w.anim_tick / 8) % 2 == 0;
        let label = if blink { "> RESET PROGRESS? <" } else { "  RESET PROGRESS?  " };
        let label_x = box_x + box_w.saturating_sub(label.len()) / 2;
        self.front.put_str(label_x, box_y + 1, label, GOLD, dim);
        self.front.put_str(
            box_x + 3,
            box_y + 3,
            "Deletes the saved session for good.",
            Color::White,
            dim,
        );
        self.front.put_str(box_x + 3, box_y + 5, "Y: Reset    ESC: Cancel", CYAN, dim);
    }
}
