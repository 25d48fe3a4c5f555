/// Reaction rules, table driven.
///
/// Pure functions over a grid and one entity. Each `Rule` is a named guard
/// plus the timed presses it emits. Tables are evaluated in order and the
/// first matching rule wins.
///
/// Notation below: `d` signed distance, `(ex, ey)` entity, `(mx, my)` anchor,
/// `under` = cell at `(mx, my-1)`, `front_under` = cell at `(mx+1, my-1)`.
/// Buttons: D L R U, A = confirm, B = cancel.
///
/// ### Walker (15)
/// ┌──────────────┬──────────────────────────────────────────────┬─────────────────┐
/// │ Rule          │ Guard                                          │ Presses          │
/// ├──────────────┼──────────────────────────────────────────────┼─────────────────┤
/// │ Attack Right  │ 1<d<4, ey=my, under=10, ex>mx                  │ R6 B6 A2         │
/// │               │ or under=10, d<6, ey<my, ex>mx                 │                  │
/// │               │ or front_under=14, d<6, ey<my, ex>mx           │                  │
/// │ Attack Left   │ same guards with ex<mx                         │ R6 B6 A2         │
/// │ Run Away      │ d<=3, ey>my  or d<2, ey=my  or d<2, ex=mx+1    │ L10 B10          │
/// │ Left On Top   │ ex<mx, ey<my, 1<d<4                            │ L2 B2            │
/// │ Right On Top  │ ex>mx, ey<my, 1<d<4                            │ R2 B2            │
/// └──────────────┴──────────────────────────────────────────────┴─────────────────┘
///
/// ### Shelled (16)
/// ┌──────────────┬──────────────────────────────────────────────┬─────────────────┐
/// │ Attack Right  │ d<4, ey=my, front_under=10, ex>mx              │ B6 R6 A6         │
/// │ Attack Left   │ d<4, ey=my, front_under=10, ex<mx              │ B6 L6 A6         │
/// │ Run Away      │ d<3, ey>my  or d<2, ey=my  or d<2, ex=mx+1     │ L10 B10          │
/// │ Left On Top   │ ex<mx, ey<my, d<3                              │ L3 B3            │
/// │ Right On Top  │ ex>mx, ey<my, d<3                              │ R3 B3            │
/// └──────────────┴──────────────────────────────────────────────┴─────────────────┘
///
/// ### Flyer (18)
/// ┌──────────────┬──────────────────────────────────────────────┬─────────────────┐
/// │ Attack        │ d<3, ey=my, front_under=10                     │ B6 R6 A10        │
/// │ Run Away      │ d<5, ey>my  or d<2, ey=my  or d<2, ex=mx+1     │ L10 B10          │
/// │ Left On Top   │ ex<mx, ey<my, d<3                              │ L3 B3            │
/// │ Right On Top  │ ex>mx, ey<my, d<3                              │ R3 B3            │
/// └──────────────┴──────────────────────────────────────────────┴─────────────────┘
///
/// ### Sweep (every hazard, when nothing above matched and the closest is not a flyer)
/// Left On Top / Right On Top as Shelled, then
/// Drop Down: ex=mx, ey<my, d<3 → D10 L3 R3 B3.
///
/// ### Terrain
/// ┌──────────────┬──────────────────────────────────────────────┬─────────────────┐
/// │ Gap Jump      │ any object: open code, ex=mx+1                 │ B6 R15 A15       │
/// │ Back Off      │ closest=14: d<3, ex>=mx                        │ L20              │
/// │ Step Jump     │ closest=14: d=3                                │ R8 A13           │
/// │ Walk Back     │ closest=10: d<2, ex>=mx, raw(mx,my-1)≠0,       │ L20              │
/// │               │             raw(mx+2,my-2)=10                  │                  │
/// │ Step Jump     │ closest=10: d<3                                │ R8 A13           │
/// └──────────────┴──────────────────────────────────────────────┴─────────────────┘
///
/// Distances are signed everywhere, so "d<2" holds for anything behind.

use super::entity::{Action, Button, Entity, Position};
use super::grid::TileGrid;
use super::tile::{HazardKind, TileCode};

use Button::{Cancel, Confirm, Down, Left, Right};

/// Immutable view of the grid around the anchor for rule guards.
pub struct Probe<'a> {
    grid: &'a TileGrid,
    anchor: Position,
}

impl<'a> Probe<'a> {
    pub fn new(grid: &'a TileGrid, anchor: Position) -> Self {
        Probe { grid, anchor }
    }

    pub fn anchor(&self) -> Position {
        self.anchor
    }

    /// Cell directly below the anchor.
    pub fn under(&self) -> Option<TileCode> {
        self.grid.code_at(Position::new(self.anchor.x, self.anchor.y - 1))
    }

    /// Cell below and one column ahead of the anchor.
    pub fn front_under(&self) -> Option<TileCode> {
        self.grid.code_at(Position::new(self.anchor.x + 1, self.anchor.y - 1))
    }

    /// Unconverted `grid[row][col]`.
    pub fn raw(&self, row: i32, col: i32) -> Option<TileCode> {
        self.grid.raw(row, col)
    }
}

/// One entry in a rule table.
pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&Probe, &Entity) -> bool,
    pub presses: &'static [Action],
}

impl Rule {
    pub fn actions(&self) -> Vec<Action> {
        self.presses.to_vec()
    }
}

/// First rule in `table` whose guard holds for `entity`.
pub fn first_match<'r>(table: &'r [Rule], probe: &Probe, entity: &Entity) -> Option<&'r Rule> {
    table.iter().find(|rule| (rule.applies)(probe, entity))
}

pub fn hazard_table(kind: HazardKind) -> &'static [Rule] {
    match kind {
        HazardKind::Walker => WALKER_RULES,
        HazardKind::Shelled => SHELLED_RULES,
        HazardKind::Flyer => FLYER_RULES,
    }
}

/// Rules keyed on the closest object's code. Other codes have none.
pub fn terrain_table(code: TileCode) -> &'static [Rule] {
    match code {
        TileCode::BREAKABLE => BREAKABLE_RULES,
        TileCode::SOLID => SOLID_RULES,
        _ => &[],
    }
}

// ── Press sequences ──

const WALKER_ATTACK: &[Action] = &[
    Action::new(Right, 6),
    Action::new(Cancel, 6),
    Action::new(Confirm, 2),
];
const RETREAT: &[Action] = &[Action::new(Left, 10), Action::new(Cancel, 10)];
const WALKER_LEFT_ON_TOP: &[Action] = &[Action::new(Left, 2), Action::new(Cancel, 2)];
const WALKER_RIGHT_ON_TOP: &[Action] = &[Action::new(Right, 2), Action::new(Cancel, 2)];
const SHELLED_ATTACK_RIGHT: &[Action] = &[
    Action::new(Cancel, 6),
    Action::new(Right, 6),
    Action::new(Confirm, 6),
];
const SHELLED_ATTACK_LEFT: &[Action] = &[
    Action::new(Cancel, 6),
    Action::new(Left, 6),
    Action::new(Confirm, 6),
];
const FLYER_ATTACK: &[Action] = &[
    Action::new(Cancel, 6),
    Action::new(Right, 6),
    Action::new(Confirm, 10),
];
const LEFT_ON_TOP: &[Action] = &[Action::new(Left, 3), Action::new(Cancel, 3)];
const RIGHT_ON_TOP: &[Action] = &[Action::new(Right, 3), Action::new(Cancel, 3)];
const DROP_DOWN: &[Action] = &[
    Action::new(Down, 10),
    Action::new(Left, 3),
    Action::new(Right, 3),
    Action::new(Cancel, 3),
];
const GAP_JUMP: &[Action] = &[
    Action::new(Cancel, 6),
    Action::new(Right, 15),
    Action::new(Confirm, 15),
];
const WALK_BACK: &[Action] = &[Action::new(Left, 20)];
const STEP_JUMP: &[Action] = &[Action::new(Right, 8), Action::new(Confirm, 13)];

/// Emitted when the anchor sits on the boundary.
pub const EDGE_ESCAPE: &[Action] = &[Action::new(Down, 20)];
/// Emitted when nothing else applies.
pub const STEP_FORWARD: &[Action] = &[Action::new(Right, 1)];

// ── Tables ──

pub static WALKER_RULES: &[Rule] = &[
    Rule { name: "Attack Right", applies: walker_attack_right, presses: WALKER_ATTACK },
    Rule { name: "Attack Left", applies: walker_attack_left, presses: WALKER_ATTACK },
    Rule { name: "Run Away", applies: walker_run_away, presses: RETREAT },
    Rule { name: "Left On Top", applies: walker_left_on_top, presses: WALKER_LEFT_ON_TOP },
    Rule { name: "Right On Top", applies: walker_right_on_top, presses: WALKER_RIGHT_ON_TOP },
];

pub static SHELLED_RULES: &[Rule] = &[
    Rule { name: "Attack Right", applies: shelled_attack_right, presses: SHELLED_ATTACK_RIGHT },
    Rule { name: "Attack Left", applies: shelled_attack_left, presses: SHELLED_ATTACK_LEFT },
    Rule { name: "Run Away", applies: shelled_run_away, presses: RETREAT },
    Rule { name: "Left On Top", applies: left_on_top, presses: LEFT_ON_TOP },
    Rule { name: "Right On Top", applies: right_on_top, presses: RIGHT_ON_TOP },
];

pub static FLYER_RULES: &[Rule] = &[
    Rule { name: "Attack", applies: flyer_attack, presses: FLYER_ATTACK },
    Rule { name: "Run Away", applies: flyer_run_away, presses: RETREAT },
    Rule { name: "Left On Top", applies: left_on_top, presses: LEFT_ON_TOP },
    Rule { name: "Right On Top", applies: right_on_top, presses: RIGHT_ON_TOP },
];

pub static SWEEP_RULES: &[Rule] = &[
    Rule { name: "Left On Top", applies: left_on_top, presses: LEFT_ON_TOP },
    Rule { name: "Right On Top", applies: right_on_top, presses: RIGHT_ON_TOP },
    Rule { name: "Drop Down", applies: drop_down, presses: DROP_DOWN },
];

pub static GAP_RULES: &[Rule] = &[
    Rule { name: "Gap Jump", applies: gap_ahead, presses: GAP_JUMP },
];

pub static BREAKABLE_RULES: &[Rule] = &[
    Rule { name: "Back Off", applies: breakable_too_close, presses: WALK_BACK },
    Rule { name: "Step Jump", applies: breakable_in_reach, presses: STEP_JUMP },
];

pub static SOLID_RULES: &[Rule] = &[
    Rule { name: "Walk Back", applies: solid_walk_back, presses: WALK_BACK },
    Rule { name: "Step Jump", applies: solid_in_reach, presses: STEP_JUMP },
];

// ── Guards: walker ──

fn walker_attack(p: &Probe, e: &Entity, ahead: bool) -> bool {
    let m = p.anchor();
    let d = e.signed_distance;
    let side = if ahead { e.x() > m.x } else { e.x() < m.x };
    let below = e.y() < m.y;
    let on_ground = p.under() == Some(TileCode::SOLID);

    (1.0 < d && d < 4.0 && e.y() == m.y && on_ground && side)
        || (on_ground && d < 6.0 && below && side)
        || (p.front_under() == Some(TileCode::BREAKABLE) && d < 6.0 && below && side)
}

fn walker_attack_right(p: &Probe, e: &Entity) -> bool {
    walker_attack(p, e, true)
}

fn walker_attack_left(p: &Probe, e: &Entity) -> bool {
    walker_attack(p, e, false)
}

fn walker_run_away(p: &Probe, e: &Entity) -> bool {
    (e.signed_distance <= 3.0 && e.y() > p.anchor().y) || crowding(p, e)
}

fn walker_left_on_top(p: &Probe, e: &Entity) -> bool {
    let d = e.signed_distance;
    e.x() < p.anchor().x && e.y() < p.anchor().y && 1.0 < d && d < 4.0
}

fn walker_right_on_top(p: &Probe, e: &Entity) -> bool {
    let d = e.signed_distance;
    e.x() > p.anchor().x && e.y() < p.anchor().y && 1.0 < d && d < 4.0
}

// ── Guards: shelled / flyer ──

fn shelled_attack(p: &Probe, e: &Entity, ahead: bool) -> bool {
    let m = p.anchor();
    let side = if ahead { e.x() > m.x } else { e.x() < m.x };
    e.signed_distance < 4.0 && e.y() == m.y && p.front_under() == Some(TileCode::SOLID) && side
}

fn shelled_attack_right(p: &Probe, e: &Entity) -> bool {
    shelled_attack(p, e, true)
}

fn shelled_attack_left(p: &Probe, e: &Entity) -> bool {
    shelled_attack(p, e, false)
}

fn shelled_run_away(p: &Probe, e: &Entity) -> bool {
    (e.signed_distance < 3.0 && e.y() > p.anchor().y) || crowding(p, e)
}

fn flyer_attack(p: &Probe, e: &Entity) -> bool {
    e.signed_distance < 3.0 && e.y() == p.anchor().y && p.front_under() == Some(TileCode::SOLID)
}

fn flyer_run_away(p: &Probe, e: &Entity) -> bool {
    (e.signed_distance < 5.0 && e.y() > p.anchor().y) || crowding(p, e)
}

// ── Guards: shared ──

/// Level with the anchor, or in the column just ahead, and within 2.
fn crowding(p: &Probe, e: &Entity) -> bool {
    let m = p.anchor();
    e.signed_distance < 2.0 && (e.y() == m.y || e.x() == m.x + 1)
}

fn left_on_top(p: &Probe, e: &Entity) -> bool {
    e.x() < p.anchor().x && e.y() < p.anchor().y && e.signed_distance < 3.0
}

fn right_on_top(p: &Probe, e: &Entity) -> bool {
    e.x() > p.anchor().x && e.y() < p.anchor().y && e.signed_distance < 3.0
}

fn drop_down(p: &Probe, e: &Entity) -> bool {
    e.x() == p.anchor().x && e.y() < p.anchor().y && e.signed_distance < 3.0
}

// ── Guards: terrain ──

fn gap_ahead(p: &Probe, e: &Entity) -> bool {
    e.code.is_open() && e.x() - p.anchor().x == 1
}

fn breakable_too_close(p: &Probe, e: &Entity) -> bool {
    e.signed_distance < 3.0 && e.x() >= p.anchor().x
}

fn breakable_in_reach(_p: &Probe, e: &Entity) -> bool {
    e.signed_distance == 3.0
}

fn solid_walk_back(p: &Probe, e: &Entity) -> bool {
    let m = p.anchor();
    // Probes index row-major with x as the row.
    let behind = p.raw(m.x, m.y - 1).map_or(false, |c| !c.is_open());
    let ledge = p.raw(m.x + 2, m.y - 2) == Some(TileCode::SOLID);
    e.signed_distance < 2.0 && e.x() >= m.x && behind && ledge
}

fn solid_in_reach(_p: &Probe, e: &Entity) -> bool {
    e.signed_distance < 3.0
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
