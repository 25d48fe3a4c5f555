/// Input events emitted while a batch plays out.
/// The runner folds these into run statistics; tests assert on them.

use crate::domain::entity::Button;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    /// Pressed during the press phase; `order` is the position in the batch.
    Pressed { button: Button, order: usize },
    /// Released on release-phase tick `tick` (first tick is 1).
    Released { button: Button, tick: u32 },
}
