//! The fixed 6-string board and the per-mode note classification.

use serde::{Deserialize, Serialize};

use crate::{
    arpeggio,
    mode::{Controls, Mode},
    pattern::PatternId,
    render::RenderSink,
    theory::PitchClass,
    FretboardError, Result,
};

pub const STRING_COUNT: usize = 6;
/// Positions per string, open string included (frets 0..=15).
pub const FRET_COUNT: usize = 16;

/// Open-string notes in standard tuning, string 0 is the high E.
pub const OPEN_STRINGS: [PitchClass; STRING_COUNT] = [
    PitchClass::E,
    PitchClass::B,
    PitchClass::G,
    PitchClass::D,
    PitchClass::A,
    PitchClass::E,
];

/// Index of a cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(usize);

impl CellId {
    /// # Panics
    /// When the position is off the board.
    pub fn new(string: usize, fret: u8) -> Self {
        assert!(string < STRING_COUNT, "string {string} is off the board");
        assert!(
            usize::from(fret) < FRET_COUNT,
            "fret {fret} is off the board"
        );
        Self(string * FRET_COUNT + usize::from(fret))
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub string: usize,
    pub fret: u8,
    pub pitch: PitchClass,
}

impl Cell {
    /// CAGED positions whose geometry covers this cell, regardless of which
    /// patterns are selected.
    pub fn patterns(&self) -> impl Iterator<Item = PatternId> + '_ {
        PatternId::ALL
            .into_iter()
            .filter(move |id| id.in_pattern(self.string, self.fret))
    }

    /// Position marker drawn behind the cell.
    pub fn has_inlay(&self) -> bool {
        match self.string {
            2 => matches!(self.fret, 3 | 5 | 7 | 9 | 15),
            1 | 4 => self.fret == 12,
            _ => false,
        }
    }
}

/// The immutable grid of cells, built once at startup.
#[derive(Debug, Clone)]
pub struct Fretboard {
    cells: Vec<Cell>,
}

impl Default for Fretboard {
    fn default() -> Self {
        Self::standard()
    }
}

impl Fretboard {
    /// Board in standard tuning.
    pub fn standard() -> Self {
        let cells = OPEN_STRINGS
            .iter()
            .enumerate()
            .flat_map(|(string, open)| {
                (0..FRET_COUNT as u8).map(move |fret| Cell {
                    string,
                    fret,
                    pitch: open.transpose(i32::from(fret)),
                })
            })
            .collect();
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.index()]
    }

    pub fn at(&self, string: usize, fret: u8) -> &Cell {
        self.cell(CellId::new(string, fret))
    }

    pub fn ids(&self) -> impl Iterator<Item = CellId> {
        (0..self.cells.len()).map(CellId)
    }

    /// Cells of one string, ordered by fret.
    pub fn string_cells(&self, string: usize) -> impl Iterator<Item = CellId> {
        (0..FRET_COUNT as u8).map(move |fret| CellId::new(string, fret))
    }

    /// Computes every facet of every cell for the given mode and controls.
    pub fn classify(&self, mode: Mode, controls: &Controls) -> Classification {
        match mode {
            Mode::Training => self.classify_training(controls),
            Mode::Caged => self.classify_caged(controls),
            Mode::Rhythm => Classification::cleared(self.len()),
        }
    }

    // Display priority: position-filtered chord tones, then the unfiltered
    // arpeggio chord tones, then the plain scale.
    fn classify_training(&self, controls: &Controls) -> Classification {
        let chord = controls.chord.tones(controls.root);
        let scale = controls.scale.notes(controls.root);
        let overlay = BoardOverlay {
            show_scale: controls.scale_on,
            show_chord: controls.chord_tone_on,
            show_arpeggio: controls.arpeggio_on,
            show_caged: false,
        };

        let mut facets: Vec<CellFacets> = self
            .cells
            .iter()
            .map(|cell| {
                let is_chord_tone = chord.contains(cell.pitch);
                let in_scale = if controls.chord_tone_on {
                    is_chord_tone && controls.chord_position.contains(cell.fret)
                } else if controls.arpeggio_on {
                    is_chord_tone
                } else {
                    controls.scale_on && scale.contains(cell.pitch)
                };
                CellFacets {
                    in_scale,
                    is_root: controls.highlight_root && cell.pitch == controls.root,
                    is_chord_tone,
                    degree: chord.degree(cell.pitch),
                    ..CellFacets::default()
                }
            })
            .collect();

        if controls.arpeggio_on {
            let path = arpeggio::sequence(self, chord.set(), controls.arpeggio_direction, None);
            for (index, id) in path.steps.iter().enumerate() {
                facets[id.index()].arpeggio_step = Some(index as u8 + 1);
            }
            for id in &path.muted {
                facets[id.index()].arpeggio_muted = true;
            }
        }

        Classification { overlay, facets }
    }

    fn classify_caged(&self, controls: &Controls) -> Classification {
        let chord = controls.chord.tones(controls.root);
        let scale = controls.scale.notes(controls.root);
        let patterns = &controls.patterns;
        let overlay = BoardOverlay {
            show_caged: controls.caged_on,
            ..BoardOverlay::default()
        };

        let facets = self
            .cells
            .iter()
            .map(|cell| {
                let is_chord_tone = chord.contains(cell.pitch);
                let (in_scale, is_caged_note) = if controls.caged_on {
                    let caged = is_chord_tone
                        && !patterns.is_empty()
                        && patterns.allows_chord_tone(cell.string, cell.fret);
                    (false, caged)
                } else {
                    let in_pattern = patterns.contains_cell(cell.string, cell.fret);
                    (in_pattern && scale.contains(cell.pitch), false)
                };
                CellFacets {
                    in_scale,
                    is_root: controls.highlight_root && cell.pitch == controls.root,
                    is_chord_tone,
                    is_caged_note,
                    degree: chord.degree(cell.pitch),
                    ..CellFacets::default()
                }
            })
            .collect();

        Classification { overlay, facets }
    }
}

/// Contiguous fret window that limits displayed chord tones, 1 through 5.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct ChordPosition(u8);

impl Default for ChordPosition {
    fn default() -> Self {
        Self(1)
    }
}

impl ChordPosition {
    pub fn number(self) -> u8 {
        self.0
    }

    /// Inclusive fret range of the position.
    pub fn range(self) -> (u8, u8) {
        match self.0 {
            1 => (0, 3),
            2 => (2, 6),
            3 => (5, 9),
            4 => (7, 11),
            5 => (9, 13),
            other => unreachable!("chord position {other} escaped the 1..=5 check"),
        }
    }

    pub fn contains(self, fret: u8) -> bool {
        let (low, high) = self.range();
        (low..=high).contains(&fret)
    }
}

impl TryFrom<u8> for ChordPosition {
    type Error = FretboardError;

    fn try_from(value: u8) -> Result<Self> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(FretboardError::OutOfRange {
                kind: "chord position",
                value: i64::from(value),
                min: 1,
                max: 5,
            })
        }
    }
}

impl From<ChordPosition> for u8 {
    fn from(position: ChordPosition) -> Self {
        position.0
    }
}

/// Independent visual facets of one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellFacets {
    pub in_scale: bool,
    pub is_root: bool,
    pub is_chord_tone: bool,
    pub is_caged_note: bool,
    pub arpeggio_step: Option<u8>,
    pub arpeggio_muted: bool,
    pub degree: Option<&'static str>,
}

/// Board-wide display switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardOverlay {
    pub show_scale: bool,
    pub show_chord: bool,
    pub show_arpeggio: bool,
    pub show_caged: bool,
}

/// Output of one recompute pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub overlay: BoardOverlay,
    facets: Vec<CellFacets>,
}

impl Classification {
    fn cleared(len: usize) -> Self {
        Self {
            overlay: BoardOverlay::default(),
            facets: vec![CellFacets::default(); len],
        }
    }

    pub fn facets(&self, id: CellId) -> &CellFacets {
        &self.facets[id.index()]
    }

    pub fn at(&self, string: usize, fret: u8) -> &CellFacets {
        self.facets(CellId::new(string, fret))
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellId, &CellFacets)> {
        self.facets.iter().enumerate().map(|(index, f)| (CellId(index), f))
    }

    /// Pushes the overlay flags and every cell's facets to the sink.
    pub fn apply<S: RenderSink + ?Sized>(&self, board: &Fretboard, sink: &mut S) {
        sink.set_board_overlay_flags(self.overlay);
        for (id, facets) in self.iter() {
            sink.set_cell_facets(board.cell(id), facets);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        arpeggio::ArpeggioDirection,
        pattern::PatternSelection,
        theory::{ChordKind, ScaleKind},
    };

    #[test]
    fn every_chord_position_window_is_inclusive() {
        for (number, low, high) in [(1, 0, 3), (2, 2, 6), (3, 5, 9), (4, 7, 11), (5, 9, 13)] {
            let position = ChordPosition::try_from(number).unwrap();
            assert_eq!(position.range(), (low, high), "position {number}");
            assert!(position.contains(low), "position {number} low end");
            assert!(position.contains(high), "position {number} high end");
            assert!(!position.contains(high + 1), "position {number} above");
            if low > 0 {
                assert!(!position.contains(low - 1), "position {number} below");
            }
        }
        assert!(ChordPosition::try_from(0).is_err());
        assert!(ChordPosition::try_from(6).is_err());
    }

    fn caged_controls(patterns: &[u8], caged_on: bool) -> Controls {
        Controls {
            patterns: patterns.iter().map(|n| PatternId::new(*n)).collect(),
            caged_on,
            ..Controls::default()
        }
    }

    #[test]
    fn builds_standard_tuning() {
        let board = Fretboard::standard();
        assert_eq!(board.len(), STRING_COUNT * FRET_COUNT);
        assert_eq!(board.at(5, 0).pitch, PitchClass::E);
        assert_eq!(board.at(4, 3).pitch, PitchClass::C);
        assert_eq!(board.at(0, 12).pitch, PitchClass::E);
        assert_eq!(board.at(2, 15).pitch, PitchClass::ASharp);
    }

    #[test]
    fn static_decorations() {
        let board = Fretboard::standard();
        assert!(board.at(2, 5).has_inlay());
        assert!(board.at(4, 12).has_inlay());
        assert!(!board.at(0, 12).has_inlay());
        let tags: Vec<u8> = board.at(3, 2).patterns().map(PatternId::number).collect();
        assert_eq!(tags, vec![1, 2]);
    }

    #[test]
    fn training_scale_display() {
        let board = Fretboard::standard();
        let controls = Controls {
            scale_on: true,
            ..Controls::default()
        };
        let result = board.classify(Mode::Training, &controls);

        assert!(result.at(4, 3).in_scale);
        assert!(result.at(4, 3).is_root);
        assert!(!result.at(4, 1).in_scale);
        assert!(result.overlay.show_scale);
        assert_eq!(result.at(5, 0).degree, Some("3"));
        assert_eq!(result.at(5, 1).degree, None);
    }

    #[test]
    fn training_scale_hidden_when_toggle_off() {
        let board = Fretboard::standard();
        let result = board.classify(Mode::Training, &Controls::default());
        assert!(result.iter().all(|(_, facets)| !facets.in_scale));
        assert!(result.at(4, 3).is_root);
    }

    #[test]
    fn chord_tones_restricted_to_position() {
        let board = Fretboard::standard();
        let controls = Controls {
            chord_tone_on: true,
            chord_position: ChordPosition::try_from(2).unwrap(),
            scale_on: true,
            ..Controls::default()
        };
        let result = board.classify(Mode::Training, &controls);

        // G on the low E string: fret 3 is inside 2..=6, fret 15 is not.
        assert!(result.at(5, 3).in_scale);
        assert!(result.at(5, 15).is_chord_tone);
        assert!(!result.at(5, 15).in_scale);
        // Scale-only notes are hidden while chord tones are shown.
        assert!(!result.at(5, 5).in_scale);
    }

    #[test]
    fn chord_tone_display_takes_priority_over_arpeggio() {
        let board = Fretboard::standard();
        let controls = Controls {
            chord_tone_on: true,
            arpeggio_on: true,
            ..Controls::default()
        };
        let result = board.classify(Mode::Training, &controls);

        assert!(!result.at(5, 15).in_scale);
        assert!(result.at(5, 0).in_scale);
        assert_eq!(result.at(5, 0).arpeggio_step, Some(1));
    }

    #[test]
    fn arpeggio_marks_steps_and_muted_cells() {
        let board = Fretboard::standard();
        let controls = Controls {
            root: PitchClass::A,
            chord: ChordKind::MinorTriad,
            arpeggio_on: true,
            arpeggio_direction: ArpeggioDirection::Ascending,
            ..Controls::default()
        };
        let result = board.classify(Mode::Training, &controls);

        assert!(result.overlay.show_arpeggio);
        assert!(result.at(5, 12).in_scale);
        let mut steps: Vec<u8> = result.iter().filter_map(|(_, f)| f.arpeggio_step).collect();
        steps.sort_unstable();
        assert_eq!(steps, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(result.at(5, 0).arpeggio_step, Some(1));
        assert!(result.at(5, 5).arpeggio_muted);
        assert!(!result.at(5, 1).arpeggio_muted);
    }

    #[test]
    fn caged_without_selection_shows_whole_scale() {
        let board = Fretboard::standard();
        let result = board.classify(Mode::Caged, &caged_controls(&[], false));

        assert!(result.at(0, 15).in_scale);
        assert!(!result.at(0, 2).in_scale);
        assert!(result.iter().all(|(_, facets)| !facets.is_caged_note));
    }

    #[test]
    fn caged_scale_limited_to_selected_patterns() {
        let board = Fretboard::standard();
        let result = board.classify(Mode::Caged, &caged_controls(&[1], false));

        assert!(result.at(0, 3).in_scale);
        assert!(!result.at(0, 5).in_scale);
    }

    #[test]
    fn caged_overlay_respects_chord_exceptions() {
        let board = Fretboard::standard();
        let result = board.classify(Mode::Caged, &caged_controls(&[1], true));

        let cell = board.at(0, 3);
        assert_eq!(cell.pitch, PitchClass::G);
        assert!(result.at(0, 3).is_chord_tone);
        assert!(!result.at(0, 3).is_caged_note);
        assert!(result.at(1, 1).is_caged_note);
        assert!(!result.at(1, 1).in_scale);
        assert!(result.overlay.show_caged);
    }

    #[test]
    fn caged_overlay_needs_a_selection() {
        let board = Fretboard::standard();
        let result = board.classify(Mode::Caged, &caged_controls(&[], true));
        assert!(result.iter().all(|(_, facets)| !facets.is_caged_note && !facets.in_scale));
    }

    #[test]
    fn overlapping_patterns_union_their_chord_cells() {
        let board = Fretboard::standard();
        // (0, 3) is blocked by pattern 1 but allowed by pattern 2.
        let result = board.classify(Mode::Caged, &caged_controls(&[1, 2], true));
        assert!(result.at(0, 3).is_caged_note);
    }

    #[test]
    fn rhythm_mode_is_inert() {
        let board = Fretboard::standard();
        let controls = Controls {
            scale_on: true,
            patterns: PatternSelection::new(),
            scale: ScaleKind::Minor,
            ..Controls::default()
        };
        let result = board.classify(Mode::Rhythm, &controls);
        assert_eq!(result.overlay, BoardOverlay::default());
        assert!(result.iter().all(|(_, facets)| *facets == CellFacets::default()));
    }
}
