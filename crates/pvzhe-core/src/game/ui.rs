use strum::Display;

/// Screen the game is currently showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum GameUi {
    #[strum(serialize = "main menu")]
    MainMenu,
    #[strum(serialize = "seed select")]
    SeedSelect,
    #[strum(serialize = "playing")]
    Playing,
    #[strum(serialize = "zombies won")]
    ZombiesWon,
    #[strum(serialize = "mode select")]
    ModeSelect,
    #[strum(serialize = "unknown")]
    Unknown(i32),
    /// The game is not running
    #[strum(serialize = "unavailable")]
    Unavailable,
}

impl GameUi {
    pub fn from_raw(value: i32) -> Self {
        match value {
            1 => Self::MainMenu,
            2 => Self::SeedSelect,
            3 => Self::Playing,
            4 => Self::ZombiesWon,
            7 => Self::ModeSelect,
            other => Self::Unknown(other),
        }
    }

    /// Raw screen id, `-1` when unavailable
    pub fn raw(self) -> i32 {
        match self {
            Self::MainMenu => 1,
            Self::SeedSelect => 2,
            Self::Playing => 3,
            Self::ZombiesWon => 4,
            Self::ModeSelect => 7,
            Self::Unknown(value) => value,
            Self::Unavailable => -1,
        }
    }

    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }

    /// Screens during which the save data on disk belongs to a level in
    /// progress, so restoring a backup would be overwritten or corrupt it
    pub fn is_in_level(self) -> bool {
        matches!(self, Self::SeedSelect | Self::Playing | Self::ZombiesWon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw() {
        assert_eq!(GameUi::from_raw(1), GameUi::MainMenu);
        assert_eq!(GameUi::from_raw(3), GameUi::Playing);
        assert_eq!(GameUi::from_raw(7), GameUi::ModeSelect);
        assert_eq!(GameUi::from_raw(5), GameUi::Unknown(5));
    }

    #[test]
    fn test_raw_matches_from_raw() {
        for value in [1, 2, 3, 4, 7, 0, 42] {
            assert_eq!(GameUi::from_raw(value).raw(), value);
        }
        assert_eq!(GameUi::Unavailable.raw(), -1);
    }

    #[test]
    fn test_in_level_screens() {
        assert!(GameUi::SeedSelect.is_in_level());
        assert!(GameUi::Playing.is_in_level());
        assert!(GameUi::ZombiesWon.is_in_level());
        assert!(!GameUi::MainMenu.is_in_level());
        assert!(!GameUi::ModeSelect.is_in_level());
        assert!(!GameUi::Unknown(0).is_in_level());
        assert!(!GameUi::Unavailable.is_in_level());
    }

    #[test]
    fn test_display() {
        assert_eq!(GameUi::Playing.to_string(), "playing");
        assert_eq!(GameUi::Unknown(9).to_string(), "unknown");
    }
}
