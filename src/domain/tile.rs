/// Tile codes and their properties.
/// The perception grid is made of raw integer codes; semantics are
/// queried via methods so every classification lives here.

use serde::Serialize;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct TileCode(pub i32);

/// The three enemy kinds the rule tables distinguish.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HazardKind {
    Walker,  // 15
    Shelled, // 16
    Flyer,   // 18
}

impl TileCode {
    /// Open cell. In the bottom row it marks a pit.
    pub const OPEN: TileCode = TileCode(0);
    pub const CHARACTER: TileCode = TileCode(1);
    /// Ground and pipe surfaces.
    pub const SOLID: TileCode = TileCode(10);
    /// Breakable blocks and steps.
    pub const BREAKABLE: TileCode = TileCode(14);
    pub const WALKER: TileCode = TileCode(15);
    pub const SHELLED: TileCode = TileCode(16);
    pub const FLYER: TileCode = TileCode(18);

    pub fn is_open(self) -> bool {
        self == Self::OPEN
    }

    pub fn is_character(self) -> bool {
        self == Self::CHARACTER
    }

    /// Is this one of the enemy codes?
    pub fn is_hazard(self) -> bool {
        self.hazard_kind().is_some()
    }

    pub fn hazard_kind(self) -> Option<HazardKind> {
        match self {
            Self::WALKER => Some(HazardKind::Walker),
            Self::SHELLED => Some(HazardKind::Shelled),
            Self::FLYER => Some(HazardKind::Flyer),
            _ => None,
        }
    }

    /// Can this cell take part in a scan when it lies strictly below the
    /// character's row? Floors under the character are not features.
    pub fn is_feature_below(self) -> bool {
        !matches!(self, Self::CHARACTER | Self::OPEN | Self::SOLID | Self::BREAKABLE)
    }

    /// Can this cell take part in a scan at or above the character's row?
    pub fn is_feature_level_or_above(self) -> bool {
        !matches!(self, Self::CHARACTER | Self::OPEN)
    }

    /// Glyph used by the terminal viewer.
    pub fn glyph(self) -> char {
        match self {
            Self::OPEN => ' ',
            Self::CHARACTER => '@',
            Self::SOLID => '#',
            Self::BREAKABLE => '=',
            Self::WALKER => 'w',
            Self::SHELLED => 's',
            Self::FLYER => 'f',
            _ => '*',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hazard_codes_are_classified() {
        assert_eq!(TileCode(15).hazard_kind(), Some(HazardKind::Walker));
        assert_eq!(TileCode(16).hazard_kind(), Some(HazardKind::Shelled));
        assert_eq!(TileCode(18).hazard_kind(), Some(HazardKind::Flyer));
        assert!(!TileCode(17).is_hazard());
        assert!(!TileCode::SOLID.is_hazard());
    }

    #[test]
    fn floors_are_not_features_below() {
        assert!(!TileCode::SOLID.is_feature_below());
        assert!(!TileCode::BREAKABLE.is_feature_below());
        assert!(TileCode(6).is_feature_below());
        assert!(TileCode::WALKER.is_feature_below());
    }

    #[test]
    fn floors_are_features_at_or_above() {
        assert!(TileCode::SOLID.is_feature_level_or_above());
        assert!(TileCode::BREAKABLE.is_feature_level_or_above());
        assert!(!TileCode::OPEN.is_feature_level_or_above());
        assert!(!TileCode::CHARACTER.is_feature_level_or_above());
    }
}
