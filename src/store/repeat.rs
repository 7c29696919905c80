use std::fmt;

/// What happens when the current track runs out.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RepeatMode {
    /// Advance through the playlist and stop after the last track.
    #[default]
    Off,
    /// Wrap around to the first track.
    All,
    /// Replay the current track.
    One,
}

impl RepeatMode {
    /// `Off -> All -> One -> Off`.
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }

    /// Stored form: `"0"`, `"1"` or `"2"`.
    pub fn as_pref(self) -> &'static str {
        match self {
            Self::Off => "0",
            Self::All => "1",
            Self::One => "2",
        }
    }

    pub fn from_pref(value: &str) -> Option<Self> {
        match value.trim() {
            "0" => Some(Self::Off),
            "1" => Some(Self::All),
            "2" => Some(Self::One),
            _ => None,
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Off => "off",
            Self::All => "all",
            Self::One => "one",
        };
        f.write_str(label)
    }
}
