//! Pitch-class arithmetic and the scale / chord formula tables.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{FretboardError, Result};

/// One of the twelve equal-tempered note names, spelled with sharps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum PitchClass {
    C,
    #[serde(rename = "C#")]
    CSharp,
    D,
    #[serde(rename = "D#")]
    DSharp,
    E,
    F,
    #[serde(rename = "F#")]
    FSharp,
    G,
    #[serde(rename = "G#")]
    GSharp,
    A,
    #[serde(rename = "A#")]
    ASharp,
    B,
}

/// The chromatic cycle starting at C.
pub const CHROMATIC: [PitchClass; 12] = [
    PitchClass::C,
    PitchClass::CSharp,
    PitchClass::D,
    PitchClass::DSharp,
    PitchClass::E,
    PitchClass::F,
    PitchClass::FSharp,
    PitchClass::G,
    PitchClass::GSharp,
    PitchClass::A,
    PitchClass::ASharp,
    PitchClass::B,
];

impl PitchClass {
    /// Position of the note inside [`CHROMATIC`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        CHROMATIC[index % 12]
    }

    /// Moves the note by `semitones`, wrapping around the octave in both
    /// directions.
    pub fn transpose(self, semitones: i32) -> Self {
        let index = (self.index() as i32 + semitones).rem_euclid(12);
        Self::from_index(index as usize)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::C => "C",
            Self::CSharp => "C#",
            Self::D => "D",
            Self::DSharp => "D#",
            Self::E => "E",
            Self::F => "F",
            Self::FSharp => "F#",
            Self::G => "G",
            Self::GSharp => "G#",
            Self::A => "A",
            Self::ASharp => "A#",
            Self::B => "B",
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PitchClass {
    type Err = FretboardError;

    fn from_str(s: &str) -> Result<Self> {
        CHROMATIC
            .iter()
            .copied()
            .find(|note| note.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FretboardError::unknown("note", s))
    }
}

/// Maps every offset to the note that many semitones above `root`.
///
/// Offsets are taken modulo 12, so negative or octave-spanning values are
/// accepted.
pub fn notes_from_formula(root: PitchClass, offsets: &[i32]) -> Vec<PitchClass> {
    offsets.iter().map(|&offset| root.transpose(offset)).collect()
}

/// Compact set of pitch classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PitchSet(u16);

impl PitchSet {
    pub fn insert(&mut self, note: PitchClass) {
        self.0 |= 1 << note.index();
    }

    pub fn contains(self, note: PitchClass) -> bool {
        self.0 & (1 << note.index()) != 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<PitchClass> for PitchSet {
    fn from_iter<I: IntoIterator<Item = PitchClass>>(iter: I) -> Self {
        let mut set = Self::default();
        for note in iter {
            set.insert(note);
        }
        set
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScaleKind {
    Major,
    Minor,
    PentatonicMajor,
    PentatonicMinor,
}

impl ScaleKind {
    pub const ALL: [ScaleKind; 4] = [
        Self::Major,
        Self::Minor,
        Self::PentatonicMajor,
        Self::PentatonicMinor,
    ];

    /// Semitone offsets from the root.
    pub fn offsets(self) -> &'static [i32] {
        match self {
            Self::Major => &[0, 2, 4, 5, 7, 9, 11],
            Self::Minor => &[0, 2, 3, 5, 7, 8, 10],
            Self::PentatonicMajor => &[0, 2, 4, 7, 9],
            Self::PentatonicMinor => &[0, 3, 5, 7, 10],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::PentatonicMajor => "pentatonicMajor",
            Self::PentatonicMinor => "pentatonicMinor",
        }
    }

    pub fn notes(self, root: PitchClass) -> PitchSet {
        notes_from_formula(root, self.offsets()).into_iter().collect()
    }
}

impl FromStr for ScaleKind {
    type Err = FretboardError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = normalise(s);
        Self::ALL
            .into_iter()
            .find(|kind| normalise(kind.name()) == wanted)
            .ok_or_else(|| FretboardError::unknown("scale", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChordKind {
    MajorTriad,
    MinorTriad,
    Dominant7,
    Major7,
    Minor7,
}

impl ChordKind {
    pub const ALL: [ChordKind; 5] = [
        Self::MajorTriad,
        Self::MinorTriad,
        Self::Dominant7,
        Self::Major7,
        Self::Minor7,
    ];

    /// Ordered (semitone offset, degree label) pairs. The order fixes which
    /// label each chord tone receives.
    pub fn formula(self) -> &'static [(i32, &'static str)] {
        match self {
            Self::MajorTriad => &[(0, "1"), (4, "3"), (7, "5")],
            Self::MinorTriad => &[(0, "1"), (3, "b3"), (7, "5")],
            Self::Dominant7 => &[(0, "1"), (4, "3"), (7, "5"), (10, "b7")],
            Self::Major7 => &[(0, "1"), (4, "3"), (7, "5"), (11, "7")],
            Self::Minor7 => &[(0, "1"), (3, "b3"), (7, "5"), (10, "b7")],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::MajorTriad => "majorTriad",
            Self::MinorTriad => "minorTriad",
            Self::Dominant7 => "dominant7",
            Self::Major7 => "major7",
            Self::Minor7 => "minor7",
        }
    }

    pub fn tones(self, root: PitchClass) -> ChordTones {
        let offsets: Vec<i32> = self.formula().iter().map(|(offset, _)| *offset).collect();
        let notes = notes_from_formula(root, &offsets);
        let tones = notes
            .into_iter()
            .zip(self.formula().iter().map(|(_, degree)| *degree))
            .collect();
        ChordTones { root, tones }
    }
}

impl FromStr for ChordKind {
    type Err = FretboardError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = normalise(s);
        Self::ALL
            .into_iter()
            .find(|kind| normalise(kind.name()) == wanted)
            .ok_or_else(|| FretboardError::unknown("chord", s))
    }
}

/// Chord tones of one root/chord combination, each paired with its degree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordTones {
    root: PitchClass,
    tones: Vec<(PitchClass, &'static str)>,
}

impl ChordTones {
    pub fn root(&self) -> PitchClass {
        self.root
    }

    pub fn notes(&self) -> impl Iterator<Item = PitchClass> + '_ {
        self.tones.iter().map(|(note, _)| *note)
    }

    pub fn set(&self) -> PitchSet {
        self.notes().collect()
    }

    pub fn contains(&self, note: PitchClass) -> bool {
        self.tones.iter().any(|(tone, _)| *tone == note)
    }

    /// Degree the note plays in this chord, if it is a chord tone.
    pub fn degree(&self, note: PitchClass) -> Option<&'static str> {
        self.tones
            .iter()
            .find(|(tone, _)| *tone == note)
            .map(|(_, degree)| *degree)
    }
}

/// Lowercases and drops separators so `pentatonic-minor`, `pentatonic_minor`
/// and `pentatonicMinor` all compare equal.
pub(crate) fn normalise(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_notes_keep_cardinality_for_every_root_and_scale() {
        for root in CHROMATIC {
            for scale in ScaleKind::ALL {
                let notes = notes_from_formula(root, scale.offsets());
                assert_eq!(notes.len(), scale.offsets().len());
                assert_eq!(scale.notes(root).len(), scale.offsets().len());
            }
        }
    }

    #[test]
    fn offsets_wrap_modulo_twelve() {
        let notes = notes_from_formula(PitchClass::A, &[0, 3, 12, -1, 25]);
        assert_eq!(
            notes,
            vec![
                PitchClass::A,
                PitchClass::C,
                PitchClass::A,
                PitchClass::GSharp,
                PitchClass::ASharp,
            ]
        );
    }

    #[test]
    fn root_always_labelled_one() {
        for root in CHROMATIC {
            for chord in ChordKind::ALL {
                assert_eq!(chord.tones(root).degree(root), Some("1"));
            }
        }
    }

    #[test]
    fn c_major_triad_is_c_e_g() {
        let tones = ChordKind::MajorTriad.tones(PitchClass::C);
        let notes: Vec<_> = tones.notes().collect();
        assert_eq!(notes, vec![PitchClass::C, PitchClass::E, PitchClass::G]);
        assert_eq!(tones.degree(PitchClass::E), Some("3"));
        assert_eq!(tones.degree(PitchClass::D), None);
    }

    #[test]
    fn degree_labels_follow_current_root() {
        let a_minor7 = ChordKind::Minor7.tones(PitchClass::A);
        assert_eq!(a_minor7.degree(PitchClass::C), Some("b3"));
        assert_eq!(a_minor7.degree(PitchClass::G), Some("b7"));

        let c_major7 = ChordKind::Major7.tones(PitchClass::C);
        assert_eq!(c_major7.degree(PitchClass::C), Some("1"));
    }

    #[test]
    fn parses_names_loosely() {
        assert_eq!("c#".parse::<PitchClass>().unwrap(), PitchClass::CSharp);
        assert_eq!(
            "pentatonic-minor".parse::<ScaleKind>().unwrap(),
            ScaleKind::PentatonicMinor
        );
        assert_eq!("majorTriad".parse::<ChordKind>().unwrap(), ChordKind::MajorTriad);
        let err = "H".parse::<PitchClass>().unwrap_err();
        assert!(format!("{err}").contains("note"));
    }
}
