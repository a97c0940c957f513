//! Orders chord-tone cells into a one-note-per-string playing path.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    fretboard::{CellId, Fretboard, STRING_COUNT},
    pattern::PatternSelection,
    theory::{normalise, PitchSet},
    FretboardError, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArpeggioDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl ArpeggioDirection {
    /// Strings in visiting order. Ascending starts on the low E (index 5).
    pub fn string_order(self) -> [usize; STRING_COUNT] {
        match self {
            Self::Ascending => [5, 4, 3, 2, 1, 0],
            Self::Descending => [0, 1, 2, 3, 4, 5],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

impl fmt::Display for ArpeggioDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ArpeggioDirection {
    type Err = FretboardError;

    fn from_str(s: &str) -> Result<Self> {
        match normalise(s).as_str() {
            "asc" | "ascending" | "up" => Ok(Self::Ascending),
            "desc" | "descending" | "down" => Ok(Self::Descending),
            _ => Err(FretboardError::unknown("arpeggio direction", s)),
        }
    }
}

/// Result of one path computation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArpeggioPath {
    /// Picked cells in play order; step number is position + 1.
    pub steps: Vec<CellId>,
    /// Eligible chord-tone cells that were not picked.
    pub muted: Vec<CellId>,
}

impl ArpeggioPath {
    /// 1-based step of the cell, if it was picked.
    pub fn step_of(&self, cell: CellId) -> Option<u8> {
        self.steps
            .iter()
            .position(|picked| *picked == cell)
            .map(|index| index as u8 + 1)
    }

    pub fn is_muted(&self, cell: CellId) -> bool {
        self.muted.contains(&cell)
    }
}

/// Picks one chord tone per string, lowest fret when ascending and highest
/// when descending. Strings without an eligible cell are skipped.
///
/// With `restriction` set, only cells inside the selected patterns are
/// eligible (an empty selection admits every cell).
pub fn sequence(
    board: &Fretboard,
    chord: PitchSet,
    direction: ArpeggioDirection,
    restriction: Option<&PatternSelection>,
) -> ArpeggioPath {
    let eligible = |id: CellId| {
        let cell = board.cell(id);
        chord.contains(cell.pitch)
            && restriction
                .map(|selection| selection.contains_cell(cell.string, cell.fret))
                .unwrap_or(true)
    };

    let mut path = ArpeggioPath::default();
    for string in direction.string_order() {
        let mut candidates = board.string_cells(string).filter(|id| eligible(*id));
        let picked = match direction {
            ArpeggioDirection::Ascending => candidates.next(),
            ArpeggioDirection::Descending => candidates.last(),
        };
        if let Some(id) = picked {
            path.steps.push(id);
        }
    }

    path.muted = board
        .ids()
        .filter(|id| eligible(*id) && !path.steps.contains(id))
        .collect();
    path
}
