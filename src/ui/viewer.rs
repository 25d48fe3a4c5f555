/// Terminal viewer for a replay: double-buffered, diff-based.
///
/// How it works:
///   1. Build the next frame into the `front` buffer
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Layout: status line, the tile grid (two terminal columns per tile),
/// then the held buttons and the rule that produced the current batch.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{Button, Position};
use crate::domain::grid::TileGrid;
use crate::domain::tile::TileCode;

/// Everything one rendered frame needs.
pub struct ViewState<'a> {
    pub trace_name: &'a str,
    pub frame_label: &'a str,
    pub frame_index: usize,
    pub frames_total: usize,
    pub tick: u64,
    pub grid: &'a TileGrid,
    /// Bottom-right cell of the character sprite.
    pub anchor: Option<Position>,
    pub held: &'a [Button],
    pub rule: &'a str,
}

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from any real cell, so every position is diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
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
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Viewer ──

/// Terminal columns per tile.
const CELL_W: usize = 2;

const STATUS_ROW: usize = 0;
const MAP_ROW: usize = 2;

const STATUS_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };

pub struct Viewer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Viewer {
    pub fn new() -> Self {
        Viewer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
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
        // Full repaint on the first frame.
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

    pub fn render(&mut self, view: &ViewState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        compose(&mut self.front, view);
        self.flush_diff()?;
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

        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

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
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

// ── Compose: build front buffer content ──

fn compose(buf: &mut FrameBuffer, view: &ViewState) {
    let status = format!(
        " {}  [{}/{}] {}  tick:{} ",
        view.trace_name,
        view.frame_index + 1,
        view.frames_total,
        view.frame_label,
        view.tick,
    );
    buf.fill_row(STATUS_ROW, STATUS_BG);
    buf.put_str(0, STATUS_ROW, &status, Color::White, STATUS_BG);

    let grid = view.grid;
    for (row, cells) in grid.rows().iter().enumerate() {
        let term_row = MAP_ROW + row;
        if term_row >= buf.height {
            break;
        }
        let y = grid.y_of_row(row);
        for (col, &code) in cells.iter().enumerate() {
            let term_col = col * CELL_W;
            if term_col + 1 >= buf.width {
                break;
            }
            let is_anchor = view.anchor == Some(Position::new(col as i32, y));
            let cell = tile_cell(code, is_anchor);
            buf.set(term_col, term_row, cell);
            buf.set(term_col + 1, term_row, cell);
        }
    }

    let info_row = MAP_ROW + grid.height() + 1;
    if info_row < buf.height {
        let held = if view.held.is_empty() {
            "-".to_string()
        } else {
            view.held.iter().map(|b| b.label()).collect::<Vec<_>>().join("+")
        };
        let rule = if view.rule.is_empty() { "-" } else { view.rule };
        let line = format!(" held: {held:<16} rule: {rule}");
        buf.put_str(0, info_row, &line, Color::Rgb { r: 200, g: 180, b: 50 }, Color::Reset);
    }

    let help_row = info_row + 2;
    if help_row < buf.height {
        buf.put_str(0, help_row, " Q/Esc: stop", Color::DarkGrey, Color::Reset);
    }
}

fn tile_cell(code: TileCode, is_anchor: bool) -> Cell {
    if is_anchor {
        return Cell::new('@', Color::Black, Color::Rgb { r: 255, g: 220, b: 80 });
    }
    let fg = match code {
        TileCode::OPEN => Color::Reset,
        TileCode::CHARACTER => Color::Rgb { r: 255, g: 220, b: 80 },
        TileCode::SOLID => Color::Rgb { r: 120, g: 120, b: 120 },
        TileCode::BREAKABLE => Color::Rgb { r: 180, g: 120, b: 60 },
        TileCode::WALKER | TileCode::SHELLED => Color::Rgb { r: 230, g: 80, b: 80 },
        TileCode::FLYER => Color::Rgb { r: 200, g: 100, b: 220 },
        _ => Color::Rgb { r: 100, g: 200, b: 255 },
    };
    let bg = match code {
        TileCode::SOLID => Color::Rgb { r: 70, g: 70, b: 70 },
        TileCode::BREAKABLE => Color::Rgb { r: 100, g: 65, b: 30 },
        _ => Color::Reset,
    };
    Cell::new(code.glyph(), fg, bg)
}
