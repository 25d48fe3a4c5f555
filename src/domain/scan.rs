/// Grid scanner: locates the character and classifies nearby cells.
///
/// Two linear passes over the grid:
///   1. **Locate**: first character cell in reading order (top-to-bottom,
///      left-to-right). That cell is the sprite's top-left corner; the anchor
///      used for every distance is the sprite's bottom-right cell.
///   2. **Classify**: every admissible cell becomes an `Entity`, split into
///      hazards and objects, while the nearest of each is tracked.
///
/// ## Admissibility
/// ┌──────────────────────────────┬──────────────────────────────────┐
/// │ Cell                          │ Included when                     │
/// ├──────────────────────────────┼──────────────────────────────────┤
/// │ below the anchor row          │ not character/open/solid/breakable│
/// │ at or above the anchor row    │ not character/open                │
/// │ open, bottom row (y == 0)     │ always (pit)                      │
/// └──────────────────────────────┴──────────────────────────────────┘

use super::entity::{Entity, Position};
use super::grid::TileGrid;
use super::tile::TileCode;

/// Anchor column that triggers the edge escape (sprite in columns 15-16).
pub const EDGE_X: i32 = 16;
/// Anchor row that triggers the edge escape.
pub const EDGE_Y: i32 = 17;

#[derive(Clone, Debug, PartialEq)]
pub enum ScanOutcome {
    /// No character cell anywhere in the grid.
    NoCharacter,
    /// Character anchor touches the boundary; no entity lists were built.
    AtEdge(Position),
    Snapshot(Snapshot),
}

/// Structured view of one grid, relative to the character.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub character: Position,
    pub hazards: Vec<Entity>,
    pub objects: Vec<Entity>,
    /// Index into `hazards` of the smallest absolute distance.
    pub closest_hazard: Option<usize>,
    /// Index into `objects` of the smallest strictly positive distance.
    pub closest_object: Option<usize>,
}

impl Snapshot {
    pub fn closest_hazard(&self) -> Option<&Entity> {
        self.closest_hazard.and_then(|i| self.hazards.get(i))
    }

    pub fn closest_object(&self) -> Option<&Entity> {
        self.closest_object.and_then(|i| self.objects.get(i))
    }
}

pub fn scan(grid: &TileGrid) -> ScanOutcome {
    let character = match locate_character(grid) {
        Some(p) => p,
        None => return ScanOutcome::NoCharacter,
    };
    if character.x == EDGE_X || character.y == EDGE_Y {
        return ScanOutcome::AtEdge(character);
    }
    ScanOutcome::Snapshot(classify(grid, character))
}

/// Pass 1: anchor of the first character sprite found.
pub fn locate_character(grid: &TileGrid) -> Option<Position> {
    let (row, col, _) = grid.cells().find(|&(_, _, code)| code.is_character())?;
    Some(Position::new(col as i32 + 1, grid.y_of_row(row) - 1))
}

/// Pass 2: build the hazard and object lists around `character`.
pub fn classify(grid: &TileGrid, character: Position) -> Snapshot {
    let mut hazards = Vec::new();
    let mut objects = Vec::new();
    let mut nearest_hazard = Nearest::new(Reach::Absolute);
    let mut nearest_object = Nearest::new(Reach::AheadOnly);

    for (row, col, code) in grid.cells() {
        let pos = Position::new(col as i32, grid.y_of_row(row));
        if !is_admissible(code, pos.y, character.y) {
            continue;
        }
        let entity = Entity::new(code, pos, character);
        if code.is_hazard() {
            nearest_hazard.offer(hazards.len(), entity.signed_distance);
            hazards.push(entity);
        } else {
            nearest_object.offer(objects.len(), entity.signed_distance);
            objects.push(entity);
        }
    }

    Snapshot {
        character,
        hazards,
        objects,
        closest_hazard: nearest_hazard.index(),
        closest_object: nearest_object.index(),
    }
}

/// See the admissibility table above.
pub fn is_admissible(code: TileCode, y: i32, anchor_y: i32) -> bool {
    (y < anchor_y && code.is_feature_below())
        || (y >= anchor_y && code.is_feature_level_or_above())
        || (code.is_open() && y == 0)
}

// ── Nearest-entity bookkeeping ──

#[derive(Clone, Copy, Debug)]
enum Reach {
    /// Any side; compare by magnitude.
    Absolute,
    /// Strictly positive signed distances only.
    AheadOnly,
}

/// Running minimum over a list being built. Earliest index wins ties.
#[derive(Clone, Copy, Debug)]
struct Nearest {
    reach: Reach,
    best: Option<(usize, f64)>,
}

impl Nearest {
    fn new(reach: Reach) -> Self {
        Nearest { reach, best: None }
    }

    fn offer(&mut self, index: usize, signed_distance: f64) {
        let d = match self.reach {
            Reach::Absolute => signed_distance.abs(),
            Reach::AheadOnly if signed_distance > 0.0 => signed_distance,
            Reach::AheadOnly => return,
        };
        if self.best.map_or(true, |(_, best)| d < best) {
            self.best = Some((index, d));
        }
    }

    fn index(&self) -> Option<usize> {
        self.best.map(|(i, _)| i)
    }
}
