/// Entities seen in a scan, and the timed button presses the agent emits.

use serde::Serialize;

use super::tile::TileCode;

/// Grid coordinates: `x` is the column, `y` counts rows up from the bottom.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    pub fn distance_to(self, other: Position) -> f64 {
        let dx = f64::from(other.x - self.x);
        let dy = f64::from(other.y - self.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// A classified cell near the character.
///
/// `signed_distance` is the Euclidean distance from the character,
/// negated when the entity lies left of it.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Entity {
    pub code: TileCode,
    pub position: Position,
    pub signed_distance: f64,
}

impl Entity {
    pub fn new(code: TileCode, position: Position, from: Position) -> Self {
        let distance = from.distance_to(position);
        let signed_distance = if position.x < from.x { -distance } else { distance };
        Entity { code, position, signed_distance }
    }

    pub fn x(&self) -> i32 {
        self.position.x
    }

    pub fn y(&self) -> i32 {
        self.position.y
    }
}

/// The buttons the agent presses. Discriminants are positions in the
/// six-entry button table; slot 3 (up) is never pressed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    Down = 0,
    Left = 1,
    Right = 2,
    Confirm = 4,
    Cancel = 5,
}

impl Button {
    #[cfg(test)]
    pub const ALL: [Button; 5] = [
        Button::Down,
        Button::Left,
        Button::Right,
        Button::Confirm,
        Button::Cancel,
    ];

    /// Position in the button table.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Button::Down => "DOWN",
            Button::Left => "LEFT",
            Button::Right => "RIGHT",
            Button::Confirm => "A",
            Button::Cancel => "B",
        }
    }
}

/// One button held from the start of a batch until `duration` release-phase
/// ticks have elapsed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct Action {
    pub button: Button,
    pub duration: u32,
}

impl Action {
    pub const fn new(button: Button, duration: u32) -> Self {
        Action { button, duration }
    }

    /// `(button_index, duration_ticks)` pair.
    pub fn as_pair(&self) -> (usize, u32) {
        (self.button.index(), self.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_sign_follows_side() {
        let me = Position::new(10, 10);
        let left = Entity::new(TileCode::SOLID, Position::new(7, 14), me);
        let right = Entity::new(TileCode::SOLID, Position::new(13, 6), me);
        let above = Entity::new(TileCode::SOLID, Position::new(10, 13), me);
        assert_eq!(left.signed_distance, -5.0);
        assert_eq!(right.signed_distance, 5.0);
        assert_eq!(above.signed_distance, 3.0);
    }

    #[test]
    fn button_table_order() {
        let indices: Vec<_> = Button::ALL.iter().map(|b| b.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 4, 5]);
    }

    #[test]
    fn action_pair() {
        assert_eq!(Action::new(Button::Confirm, 2).as_pair(), (4, 2));
    }
}
