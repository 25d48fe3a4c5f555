/// Decision engine: grid in, ordered timed presses out.
///
/// Priority order, first group that produces presses wins:
///   1. Edge escape (anchor on the boundary, no scan)
///   2. Closest hazard's own table
///   3. Sweep over every hazard, unless the closest one is a flyer
///   4. Gap ahead, then the closest object's table
///   5. Step forward
///
/// Stateless: every call re-derives everything from the grid.

use super::entity::{Action, Position};
use super::grid::TileGrid;
use super::rules::{self, Probe, Rule};
use super::scan::{self, ScanOutcome, Snapshot};
use super::tile::HazardKind;

pub const EDGE_ESCAPE_RULE: &str = "Edge Escape";
pub const STEP_FORWARD_RULE: &str = "Step Forward";

/// One action batch and the rule that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct Decision {
    pub rule: &'static str,
    pub actions: Vec<Action>,
    /// Character anchor, if one was found.
    pub character: Option<Position>,
}

impl Decision {
    fn from_rule(rule: &Rule, character: Position) -> Self {
        Decision { rule: rule.name, actions: rule.actions(), character: Some(character) }
    }

    pub fn edge_escape(character: Position) -> Self {
        Decision {
            rule: EDGE_ESCAPE_RULE,
            actions: rules::EDGE_ESCAPE.to_vec(),
            character: Some(character),
        }
    }

    pub fn step_forward(character: Option<Position>) -> Self {
        Decision {
            rule: STEP_FORWARD_RULE,
            actions: rules::STEP_FORWARD.to_vec(),
            character,
        }
    }

    /// `(button_index, duration_ticks)` pairs.
    pub fn pairs(&self) -> Vec<(usize, u32)> {
        self.actions.iter().map(Action::as_pair).collect()
    }
}

pub fn choose_actions(grid: &TileGrid) -> Decision {
    match scan::scan(grid) {
        ScanOutcome::NoCharacter => Decision::step_forward(None),
        ScanOutcome::AtEdge(character) => Decision::edge_escape(character),
        ScanOutcome::Snapshot(snapshot) => decide(&snapshot, grid),
    }
}

/// Run the rule cascade over an existing snapshot.
pub fn decide(snapshot: &Snapshot, grid: &TileGrid) -> Decision {
    let probe = Probe::new(grid, snapshot.character);
    hazard_response(&probe, snapshot)
        .or_else(|| terrain_response(&probe, snapshot))
        .map(|rule| Decision::from_rule(rule, snapshot.character))
        .unwrap_or_else(|| Decision::step_forward(Some(snapshot.character)))
}

fn hazard_response(probe: &Probe, snapshot: &Snapshot) -> Option<&'static Rule> {
    let closest = snapshot.closest_hazard()?;
    let kind = closest.code.hazard_kind()?;
    let own = rules::first_match(rules::hazard_table(kind), probe, closest);
    // A flyer's table is final: no sweep behind it.
    if own.is_some() || kind == HazardKind::Flyer {
        return own;
    }
    snapshot
        .hazards
        .iter()
        .find_map(|hazard| rules::first_match(rules::SWEEP_RULES, probe, hazard))
}

fn terrain_response(probe: &Probe, snapshot: &Snapshot) -> Option<&'static Rule> {
    let closest = snapshot.closest_object()?;
    let gap = snapshot
        .objects
        .iter()
        .find_map(|object| rules::first_match(rules::GAP_RULES, probe, object));
    if gap.is_some() {
        return gap;
    }
    rules::first_match(rules::terrain_table(closest.code), probe, closest)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Button::{self, Cancel, Confirm, Down, Left, Right};
    use crate::domain::tile::TileCode;

    /// 20x16 grid with a solid floor row and the character anchored at `anchor`.
    fn level(anchor: Position, cells: &[(i32, i32, TileCode)]) -> TileGrid {
        let mut g = TileGrid::blank(20, 16);
        for x in 0..20 {
            g.set(Position::new(x, 0), TileCode::SOLID);
        }
        g.place_character(anchor);
        for &(x, y, code) in cells {
            g.set(Position::new(x, y), code);
        }
        g
    }

    fn presses(d: &Decision) -> Vec<(Button, u32)> {
        d.actions.iter().map(|a| (a.button, a.duration)).collect()
    }

    const HOME: Position = Position::new(10, 10);

    #[test]
    fn empty_surroundings_step_forward() {
        let d = choose_actions(&level(HOME, &[]));
        assert_eq!(d.rule, STEP_FORWARD_RULE);
        assert_eq!(presses(&d), vec![(Right, 1)]);
        assert_eq!(d.pairs(), vec![(2, 1)]);
        assert_eq!(d.character, Some(HOME));
    }

    #[test]
    fn missing_character_steps_forward() {
        let g = TileGrid::from_diagram(&[
            "....w...",
            "########",
        ]);
        let d = choose_actions(&g);
        assert_eq!(presses(&d), vec![(Right, 1)]);
        assert_eq!(d.character, None);
    }

    #[test]
    fn boundary_escapes_regardless_of_content() {
        // Sprite in columns 15-16.
        let g = level(Position::new(16, 5), &[
            (14, 5, TileCode::WALKER),
            (17, 1, TileCode::OPEN),
            (13, 5, TileCode::BREAKABLE),
        ]);
        let d = choose_actions(&g);
        assert_eq!(d.rule, EDGE_ESCAPE_RULE);
        assert_eq!(presses(&d), vec![(Down, 20)]);

        let mut tall = TileGrid::blank(20, 20);
        tall.place_character(Position::new(4, 17));
        assert_eq!(presses(&choose_actions(&tall)), vec![(Down, 20)]);
    }

    #[test]
    fn walker_ahead_is_attacked() {
        let g = level(HOME, &[(12, 10, TileCode::WALKER), (10, 9, TileCode::SOLID)]);
        let d = choose_actions(&g);
        assert_eq!(d.rule, "Attack Right");
        assert_eq!(presses(&d), vec![(Right, 6), (Cancel, 6), (Confirm, 2)]);
        assert_eq!(d.pairs(), vec![(2, 6), (5, 6), (4, 2)]);
    }

    #[test]
    fn walker_overhead_runs_away() {
        let g = level(HOME, &[(10, 13, TileCode::WALKER)]);
        let d = choose_actions(&g);
        assert_eq!(d.rule, "Run Away");
        assert_eq!(presses(&d), vec![(Left, 10), (Cancel, 10)]);
    }

    #[test]
    fn shelled_behind_is_attacked_left() {
        let g = level(HOME, &[(7, 10, TileCode::SHELLED), (11, 9, TileCode::SOLID)]);
        let d = choose_actions(&g);
        assert_eq!(presses(&d), vec![(Cancel, 6), (Left, 6), (Confirm, 6)]);
    }

    #[test]
    fn flyer_level_is_attacked() {
        let g = level(HOME, &[(12, 10, TileCode::FLYER), (11, 9, TileCode::SOLID)]);
        let d = choose_actions(&g);
        assert_eq!(presses(&d), vec![(Cancel, 6), (Right, 6), (Confirm, 10)]);
    }

    #[test]
    fn sweep_finds_hazard_below_when_closest_has_no_rule() {
        // Shelled below is closest but its own table needs an offset column;
        // the sweep then reaches it through Drop Down.
        let g = level(HOME, &[(13, 10, TileCode::WALKER), (10, 8, TileCode::SHELLED)]);
        let d = choose_actions(&g);
        assert_eq!(d.rule, "Drop Down");
        assert_eq!(presses(&d), vec![(Down, 10), (Left, 3), (Right, 3), (Cancel, 3)]);
    }

    #[test]
    fn sweep_stops_at_first_matching_hazard() {
        // Walker directly below is closest and matches nothing in its own table.
        // The sweep visits hazards in reading order and stops at the left shelled.
        let g = level(HOME, &[
            (10, 9, TileCode::WALKER),
            (8, 9, TileCode::SHELLED),
            (12, 9, TileCode::SHELLED),
        ]);
        let d = choose_actions(&g);
        assert_eq!(d.rule, "Left On Top");
        assert_eq!(presses(&d), vec![(Left, 3), (Cancel, 3)]);
    }

    #[test]
    fn closest_flyer_skips_the_sweep() {
        // Same layout with a flyer closest: its table matches nothing, and the
        // walkers either side are never swept.
        let g = level(HOME, &[
            (10, 9, TileCode::FLYER),
            (8, 9, TileCode::WALKER),
            (12, 9, TileCode::WALKER),
        ]);
        let d = choose_actions(&g);
        assert_eq!(d.rule, STEP_FORWARD_RULE);

        // Terrain still gets its turn.
        let g = level(HOME, &[
            (10, 9, TileCode::FLYER),
            (8, 9, TileCode::WALKER),
            (12, 10, TileCode::SOLID),
        ]);
        assert_eq!(choose_actions(&g).rule, "Step Jump");
    }

    #[test]
    fn unmatched_hazard_falls_through_to_terrain() {
        let g = level(HOME, &[(10, 15, TileCode::WALKER), (13, 10, TileCode::BREAKABLE)]);
        let d = choose_actions(&g);
        assert_eq!(d.rule, "Step Jump");
        assert_eq!(presses(&d), vec![(Right, 8), (Confirm, 13)]);
    }

    #[test]
    fn hazard_presses_are_not_extended_by_terrain() {
        let g = level(HOME, &[
            (12, 10, TileCode::WALKER),
            (10, 9, TileCode::SOLID),
            (11, 10, TileCode::BREAKABLE),
        ]);
        let d = choose_actions(&g);
        assert_eq!(presses(&d), vec![(Right, 6), (Cancel, 6), (Confirm, 2)]);
    }

    #[test]
    fn pit_ahead_is_jumped() {
        let g = level(Position::new(10, 1), &[(11, 0, TileCode::OPEN)]);
        let d = choose_actions(&g);
        assert_eq!(d.rule, "Gap Jump");
        assert_eq!(presses(&d), vec![(Cancel, 6), (Right, 15), (Confirm, 15)]);
    }

    #[test]
    fn pit_two_columns_ahead_is_not_jumped() {
        let g = level(Position::new(10, 1), &[(12, 0, TileCode::OPEN)]);
        assert_eq!(choose_actions(&g).rule, STEP_FORWARD_RULE);
    }

    #[test]
    fn breakable_close_ahead_backs_off() {
        let g = level(HOME, &[(12, 10, TileCode::BREAKABLE)]);
        assert_eq!(presses(&choose_actions(&g)), vec![(Left, 20)]);
    }

    #[test]
    fn solid_in_reach_is_jumped() {
        let g = level(HOME, &[(12, 10, TileCode::SOLID)]);
        let d = choose_actions(&g);
        assert_eq!(d.rule, "Step Jump");
        assert_eq!(presses(&d), vec![(Right, 8), (Confirm, 13)]);
    }

    #[test]
    fn only_objects_behind_step_forward() {
        let g = level(HOME, &[(6, 10, TileCode::SOLID), (7, 12, TileCode(6))]);
        assert_eq!(choose_actions(&g).rule, STEP_FORWARD_RULE);
    }

    #[test]
    fn collectible_closest_has_no_rule() {
        let g = level(HOME, &[(11, 12, TileCode(6)), (13, 10, TileCode::SOLID)]);
        assert_eq!(choose_actions(&g).rule, STEP_FORWARD_RULE);
    }

    #[test]
    fn decisions_are_repeatable() {
        let g = level(HOME, &[(12, 10, TileCode::WALKER), (10, 9, TileCode::SOLID)]);
        assert_eq!(choose_actions(&g), choose_actions(&g));
    }
}
