/// The perception grid: rows of tile codes, row 0 at the top.
///
/// Two ways to read it:
///   - `code_at(Position)`: bottom-up coordinates (`y = height - 1 - row`)
///   - `raw(row, col)`:     direct row-major lookup, no conversion
///
/// Both return `None` outside the grid; rows may be ragged.

use super::entity::Position;
use super::tile::TileCode;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileGrid {
    rows: Vec<Vec<TileCode>>,
}

impl TileGrid {
    pub fn new(rows: Vec<Vec<TileCode>>) -> Self {
        TileGrid { rows }
    }

    /// All-open grid, `width` x `height`.
    #[cfg(test)]
    pub fn blank(width: usize, height: usize) -> Self {
        TileGrid { rows: vec![vec![TileCode::OPEN; width]; height] }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<TileCode>] {
        &self.rows
    }

    /// Bottom-up y of a row index.
    pub fn y_of_row(&self, row: usize) -> i32 {
        self.rows.len() as i32 - 1 - row as i32
    }

    pub fn raw(&self, row: i32, col: i32) -> Option<TileCode> {
        if row < 0 || col < 0 {
            return None;
        }
        self.rows.get(row as usize)?.get(col as usize).copied()
    }

    pub fn code_at(&self, pos: Position) -> Option<TileCode> {
        self.raw(self.y_of_row(0) - pos.y, pos.x)
    }

    /// Overwrite the cell at `pos`. Out-of-range positions are ignored.
    #[cfg(test)]
    pub fn set(&mut self, pos: Position, code: TileCode) {
        let row = self.y_of_row(0) - pos.y;
        if row < 0 || pos.x < 0 {
            return;
        }
        if let Some(cell) = self
            .rows
            .get_mut(row as usize)
            .and_then(|r| r.get_mut(pos.x as usize))
        {
            *cell = code;
        }
    }

    /// Iterate `(row, col, code)` top-to-bottom, left-to-right.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, TileCode)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, cells)| {
            cells.iter().enumerate().map(move |(col, &code)| (row, col, code))
        })
    }

    /// Draw the 2x2 character sprite whose bottom-right cell is `anchor`.
    #[cfg(test)]
    pub fn place_character(&mut self, anchor: Position) {
        for (dx, dy) in [(-1, 0), (0, 0), (-1, 1), (0, 1)] {
            self.set(Position::new(anchor.x + dx, anchor.y + dy), TileCode::CHARACTER);
        }
    }

    /// Build a grid from a character diagram, one glyph per cell.
    /// Legend: ' ' or '.' open, '@' character, '#' solid, '=' breakable,
    /// 'w' / 's' / 'f' hazards 15 / 16 / 18, anything else code 6.
    #[cfg(test)]
    pub fn from_diagram(rows: &[&str]) -> Self {
        TileGrid {
            rows: rows
                .iter()
                .map(|row| {
                    row.chars()
                        .map(|ch| match ch {
                            ' ' | '.' => TileCode::OPEN,
                            '@' => TileCode::CHARACTER,
                            '#' => TileCode::SOLID,
                            '=' => TileCode::BREAKABLE,
                            'w' => TileCode::WALKER,
                            's' => TileCode::SHELLED,
                            'f' => TileCode::FLYER,
                            _ => TileCode(6),
                        })
                        .collect()
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_row_is_y_zero() {
        let g = TileGrid::from_diagram(&[
            "@..",
            "...",
            "#=.",
        ]);
        assert_eq!(g.code_at(Position::new(0, 0)), Some(TileCode::SOLID));
        assert_eq!(g.code_at(Position::new(1, 0)), Some(TileCode::BREAKABLE));
        assert_eq!(g.code_at(Position::new(0, 2)), Some(TileCode::CHARACTER));
    }

    #[test]
    fn lookups_outside_are_none() {
        let g = TileGrid::blank(3, 2);
        assert_eq!(g.code_at(Position::new(-1, 0)), None);
        assert_eq!(g.code_at(Position::new(0, 2)), None);
        assert_eq!(g.code_at(Position::new(3, 0)), None);
        assert_eq!(g.raw(-1, 0), None);
        assert_eq!(g.raw(2, 0), None);
    }

    #[test]
    fn set_then_read_back() {
        let mut g = TileGrid::blank(20, 16);
        g.set(Position::new(12, 10), TileCode::WALKER);
        assert_eq!(g.code_at(Position::new(12, 10)), Some(TileCode::WALKER));
        assert_eq!(g.raw(5, 12), Some(TileCode::WALKER));
        g.set(Position::new(40, 40), TileCode::SOLID);
        assert!(g.rows().iter().all(|r| r.len() == 20));
        assert_eq!(g.height(), 16);
    }

    #[test]
    fn cells_in_reading_order() {
        let g = TileGrid::from_diagram(&["#.", ".@"]);
        let found: Vec<_> = g.cells().filter(|c| c.2 != TileCode::OPEN).collect();
        assert_eq!(found, vec![(0, 0, TileCode::SOLID), (1, 1, TileCode::CHARACTER)]);
    }
}
