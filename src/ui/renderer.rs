/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each world cell is two terminal columns wide. Layers are painted in
/// order tiles, props, ghosts, projectiles, player, so the live actor is
/// always visible.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{Facing, PropKind};
use crate::domain::geom::Vec2;
use crate::domain::tile::{FireDir, Tile};
use crate::sim::ghost::GhostState;
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every cell, so inter-row gaps match.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 18, b: 30 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from every real cell; forces a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = if bg == Color::Reset { Cell::BASE_BG } else { bg };
        Cell { ch, fg, bg }
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

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Glyphs ──

type Glyph = ([char; 2], Color);

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

fn tile_glyph(tile: Tile) -> Option<Glyph> {
    match tile {
        Tile::Empty => None,
        Tile::Ground => Some((['█', '█'], Color::Rgb { r: 120, g: 90, b: 60 })),
        Tile::Spike => Some((['▲', '▲'], Color::Rgb { r: 230, g: 60, b: 60 })),
        Tile::Emitter(dir) => {
            let ch = match dir {
                FireDir::Left => '◀',
                FireDir::Right => '▶',
                FireDir::Down => '▼',
            };
            Some(([ch, ' '], Color::Rgb { r: 255, g: 140, b: 0 }))
        }
        Tile::Goal => Some((['★', ' '], Color::Rgb { r: 255, g: 220, b: 50 })),
    }
}

fn ghost_glyph(state: GhostState, facing: Facing) -> Glyph {
    match state {
        GhostState::Replaying => {
            let pair = if facing == Facing::Right { ['g', '›'] } else { ['‹', 'g'] };
            (pair, Color::Rgb { r: 120, g: 220, b: 255 })
        }
        GhostState::Frozen => (['▓', '▓'], Color::Rgb { r: 90, g: 130, b: 200 }),
        // Destroyed on the same tick; drawn only if a frame catches it.
        GhostState::Transformed(_) => (['·', '·'], Color::DarkGrey),
    }
}

fn prop_glyph(kind: PropKind) -> Glyph {
    match kind {
        PropKind::Reflector(v) => {
            let ch = if v.side() == Facing::Right { '/' } else { '\\' };
            let color = if v.grounded() { Color::Rgb { r: 200, g: 120, b: 255 } } else { Color::Rgb { r: 160, g: 160, b: 255 } };
            ([ch, ch], color)
        }
        PropKind::FallingBody => (['▒', '▒'], Color::Rgb { r: 170, g: 170, b: 170 }),
    }
}

// ── Renderer ──

/// Terminal columns per world cell.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

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
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &mut WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // HUD + gap above, gap + message + help below.
        let reserved_rows = MAP_ROW + 4;
        let max_view_h = self.term_h.saturating_sub(reserved_rows).max(1);
        world.camera.view_w = (self.term_w / CELL_W).min(world.map.width.max(1));
        world.camera.view_h = max_view_h.min(world.map.height.max(1));

        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        let target = world.player.body.position.cell();
        world.camera.follow(target, world.map.width, world.map.height);

        self.front.clear();
        match world.phase {
            Phase::Playing | Phase::LevelComplete => self.compose_game(world),
            Phase::GameComplete => self.compose_game_complete(world),
        }
        if world.phase == Phase::LevelComplete {
            self.compose_banner("ECHO RESOLVED  ▸ ENTER: next level");
        } else if world.paused {
            self.compose_banner("PAUSED  ▸ F1: resume");
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState) {
        let cam = w.camera.clone();

        // ── HUD row ──
        let hp = "♥".repeat(w.player.health.max(0) as usize);
        let stats = w.ghosts.stats();
        let hud = format!(
            " Echo {}/{}  {}  Run {:<3}  {:<5}  Ghosts {}/{} ",
            w.current_level + 1, w.total_levels, w.level_name, w.run, hp,
            stats.count, stats.capacity,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Map ──
        for vy in 0..cam.view_h {
            for vx in 0..cam.view_w {
                let tile = w.map.tile_at(cam.x + vx as i32, cam.y + vy as i32);
                if let Some(glyph) = tile_glyph(tile) {
                    self.put_glyph(vx, vy, glyph);
                }
            }
        }

        // ── Entities ──
        for prop in &w.props.props {
            self.put_at(w, prop.body.position, prop_glyph(prop.kind));
        }
        for ghost in w.ghosts.iter() {
            self.put_at(w, ghost.position(), ghost_glyph(ghost.state(), ghost.facing()));
        }
        for p in &w.projectiles {
            self.put_at(w, p.position, (['•', ' '], Color::Rgb { r: 255, g: 90, b: 40 }));
        }
        let blink = w.player.hit_cooldown > 0 && (w.tick / 3) % 2 == 0;
        let player_color = if blink { Color::DarkGrey } else { Color::Rgb { r: 80, g: 255, b: 80 } };
        let player = if w.player.motion.facing == Facing::Right { ['@', '›'] } else { ['‹', '@'] };
        self.put_at(w, w.player.body.position, (player, player_color));

        // ── Message bar ──
        let msg_row = MAP_ROW + cam.view_h + 1;
        if msg_row < self.front.height && !w.message.is_empty() {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &format!(" ◈ {} ", w.message), Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help_row = MAP_ROW + cam.view_h + 3;
        if help_row < self.front.height {
            let help = " ←→/AD:Move  Space/W:Jump  R:Echo  F2:Restart  F1:Pause  F5:Force  F6:Gates  F7:Stats";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    /// Draw a glyph at a viewport cell.
    fn put_glyph(&mut self, vx: usize, vy: usize, (chars, fg): Glyph) {
        let row = MAP_ROW + vy;
        let col = vx * CELL_W;
        self.front.set(col, row, Cell::new(chars[0], fg, Color::Reset));
        self.front.set(col + 1, row, Cell::new(chars[1], fg, Color::Reset));
    }

    /// Draw a glyph at the cell containing a world position.
    fn put_at(&mut self, w: &WorldState, pos: Vec2, glyph: Glyph) {
        let (cx, cy) = pos.cell();
        if let Some((vx, vy)) = w.camera.world_to_view(cx, cy) {
            self.put_glyph(vx, vy, glyph);
        }
    }

    fn compose_banner(&mut self, text: &str) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let hdr = Color::Rgb { r: 255, g: 220, b: 50 };
        let width = text.chars().count() + 4;
        let x = self.front.width.saturating_sub(width) / 2;
        let y = MAP_ROW + 2;
        for row in y..y + 3 {
            for col in x..x + width {
                self.front.set(col, row, Cell::new(' ', hdr, dim));
            }
        }
        self.front.put_str(x + 2, y + 1, text, hdr, dim);
    }

    fn compose_game_complete(&mut self, w: &WorldState) {
        let gold = Color::Rgb { r: 255, g: 220, b: 50 };
        let green = Color::Rgb { r: 80, g: 255, b: 80 };
        let title = "  ★ EVERY ECHO HAS FALLEN SILENT ★  ";
        let bar = "═".repeat(title.chars().count());
        self.front.put_str(4, 4, &format!("╔{bar}╗"), gold, Color::Reset);
        self.front.put_str(4, 5, &format!("║{title}║"), gold, Color::Reset);
        self.front.put_str(4, 6, &format!("╚{bar}╝"), gold, Color::Reset);
        let levels = format!("◈ All {} levels cleared", w.total_levels);
        self.front.put_str(6, 9, &levels, Color::White, Color::Reset);
        self.front.put_str(6, 11, "▸ ESC / Q: Quit", green, Color::Reset);
    }
}
