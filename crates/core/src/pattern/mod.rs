//! The five CAGED positions as fixed geometric rules.
//!
//! The fret windows and exception cells are hand-tuned to approximate the
//! standard shapes on a board in standard tuning; they cannot be derived from
//! a formula. Cells are addressed as (string, fret) with string 0 = high E.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{FretboardError, Result};

/// Geometric rule of one pattern.
#[derive(Debug, Clone, Copy)]
pub struct PatternRule {
    /// Inclusive fret window covering every string.
    window: Option<(u8, u8)>,
    /// Explicit frets per string index, used instead of a window.
    string_frets: Option<[&'static [u8]; 6]>,
    /// Cells inside the pattern regardless of the window.
    include: &'static [(usize, u8)],
    /// Cells outside the pattern regardless of the window.
    exclude: &'static [(usize, u8)],
    /// Cells inside the pattern that never show as chord tones.
    chord_excluded: &'static [(usize, u8)],
}

const RULES: [PatternRule; 5] = [
    PatternRule {
        window: Some((0, 3)),
        string_frets: None,
        include: &[],
        exclude: &[],
        chord_excluded: &[(5, 0), (0, 3)],
    },
    PatternRule {
        window: Some((2, 6)),
        string_frets: None,
        include: &[],
        exclude: &[],
        chord_excluded: &[(3, 2)],
    },
    PatternRule {
        window: Some((5, 9)),
        string_frets: None,
        include: &[(2, 4)],
        exclude: &[(3, 9), (2, 9)],
        chord_excluded: &[(1, 8)],
    },
    PatternRule {
        window: Some((7, 11)),
        string_frets: None,
        include: &[],
        exclude: &[],
        chord_excluded: &[(4, 7)],
    },
    PatternRule {
        window: None,
        string_frets: Some([
            &[10, 12, 13],
            &[10, 12],
            &[9, 10, 12],
            &[9, 10, 12],
            &[10, 12, 13],
            &[10, 12, 13],
        ]),
        include: &[(1, 13)],
        exclude: &[],
        chord_excluded: &[(2, 9)],
    },
];

impl PatternRule {
    pub fn in_pattern(&self, string: usize, fret: u8) -> bool {
        if self.include.contains(&(string, fret)) {
            return true;
        }
        if self.exclude.contains(&(string, fret)) {
            return false;
        }
        let in_window = self
            .window
            .map(|(low, high)| (low..=high).contains(&fret))
            .unwrap_or(false);
        let in_cells = self
            .string_frets
            .and_then(|frets| frets.get(string).copied())
            .map(|frets| frets.contains(&fret))
            .unwrap_or(false);
        in_window || in_cells
    }

    pub fn chord_allowed(&self, string: usize, fret: u8) -> bool {
        !self.chord_excluded.contains(&(string, fret))
    }
}

/// Identifier of a CAGED position, 1 through 5.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct PatternId(u8);

impl PatternId {
    pub const ALL: [PatternId; 5] = [
        PatternId(1),
        PatternId(2),
        PatternId(3),
        PatternId(4),
        PatternId(5),
    ];

    /// Builds an id from a number already known to be valid.
    ///
    /// # Panics
    /// When `number` is outside 1..=5.
    pub fn new(number: u8) -> Self {
        assert!((1..=5).contains(&number), "pattern {number} does not exist");
        Self(number)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn rule(self) -> &'static PatternRule {
        &RULES[usize::from(self.0 - 1)]
    }

    pub fn in_pattern(self, string: usize, fret: u8) -> bool {
        self.rule().in_pattern(string, fret)
    }

    pub fn chord_allowed(self, string: usize, fret: u8) -> bool {
        self.rule().chord_allowed(string, fret)
    }
}

impl TryFrom<u8> for PatternId {
    type Error = FretboardError;

    fn try_from(value: u8) -> Result<Self> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(FretboardError::OutOfRange {
                kind: "pattern",
                value: i64::from(value),
                min: 1,
                max: 5,
            })
        }
    }
}

impl From<PatternId> for u8 {
    fn from(id: PatternId) -> Self {
        id.0
    }
}

/// The pattern buttons currently pressed.
///
/// An empty selection means "every pattern" for membership tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternSelection(BTreeSet<PatternId>);

impl PatternSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the pattern and returns whether it is now active.
    pub fn toggle(&mut self, id: PatternId) -> bool {
        if self.0.remove(&id) {
            false
        } else {
            self.0.insert(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_active(&self, id: PatternId) -> bool {
        self.0.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = PatternId> + '_ {
        self.0.iter().copied()
    }

    /// Whether the cell lies in any selected pattern, or anywhere when nothing
    /// is selected.
    pub fn contains_cell(&self, string: usize, fret: u8) -> bool {
        self.is_empty() || self.iter().any(|id| id.in_pattern(string, fret))
    }

    /// Whether some selected pattern holds the cell and allows it as a chord
    /// tone. Always false for an empty selection.
    pub fn allows_chord_tone(&self, string: usize, fret: u8) -> bool {
        self.iter()
            .any(|id| id.in_pattern(string, fret) && id.chord_allowed(string, fret))
    }
}

impl FromIterator<PatternId> for PatternSelection {
    fn from_iter<I: IntoIterator<Item = PatternId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
