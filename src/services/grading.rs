use serde::{Deserialize, Serialize};

/// Nine-band letter grade, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub(crate) enum Grade {
    A1,
    B2,
    B3,
    C4,
    C5,
    C6,
    D7,
    E8,
    F9,
}

/// Lower bound (inclusive) of each band, checked from the top.
const BANDS: [(f64, Grade); 8] = [
    (75.0, Grade::A1),
    (70.0, Grade::B2),
    (65.0, Grade::B3),
    (60.0, Grade::C4),
    (55.0, Grade::C5),
    (50.0, Grade::C6),
    (45.0, Grade::D7),
    (40.0, Grade::E8),
];

impl Grade {
    /// Maps a percentage to its band. Values above 100 grade as A1; negative
    /// values and NaN fall through to F9.
    pub(crate) fn from_percentage(percentage: f64) -> Self {
        BANDS
            .iter()
            .find(|(threshold, _)| percentage >= *threshold)
            .map(|(_, grade)| *grade)
            .unwrap_or(Grade::F9)
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::B2 => "B2",
            Self::B3 => "B3",
            Self::C4 => "C4",
            Self::C5 => "C5",
            Self::C6 => "C6",
            Self::D7 => "D7",
            Self::E8 => "E8",
            Self::F9 => "F9",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
