/// The environment seam: everything the agent needs from a running game.
///
/// Implementations own the simulated world. The agent only reads the tile
/// grid and the terminal flag, and drives the world through raw button
/// primitives plus single-tick advancement.

use serde::Serialize;

use crate::domain::decision::Decision;
use crate::domain::entity::Button;
use crate::domain::grid::TileGrid;
use crate::error::Result;

pub trait Environment {
    /// Current perception snapshot.
    fn tile_grid(&self) -> TileGrid;

    /// Has the episode ended?
    fn is_terminal(&self) -> bool;

    /// Idempotent: pressing a held button keeps it held.
    fn press(&mut self, button: Button);

    /// Idempotent: releasing a free button is a no-op.
    fn release(&mut self, button: Button);

    /// Advance the world by one tick. May block.
    fn advance_tick(&mut self) -> Result<()>;

    /// Reinitialize the episode.
    fn reset(&mut self) -> Result<()>;

    /// Summary of the world, reported when the run ends.
    fn game_state(&self) -> GameState;

    /// Hook for presentation: called once per decision, before the batch runs.
    fn observe_decision(&mut self, _decision: &Decision) {}
}

/// Environment-reported summary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GameState {
    pub source: String,
    pub tick: u64,
    pub frame: usize,
    pub frames_total: usize,
    pub frame_label: String,
    pub held: Vec<Button>,
    pub presses: u64,
    pub releases: u64,
    pub terminal: bool,
}
