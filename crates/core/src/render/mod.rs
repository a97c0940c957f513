use crate::{
    fretboard::{BoardOverlay, Cell, CellFacets},
    rhythm::RhythmLight,
};

/// Presentation layer the core pushes its results into. The core never reads
/// anything back from it.
pub trait RenderSink {
    fn set_cell_facets(&mut self, cell: &Cell, facets: &CellFacets);

    fn set_board_overlay_flags(&mut self, overlay: BoardOverlay);

    /// Resets every cell and the overlay to their blank state.
    fn clear_all_facets(&mut self);

    /// Replaces the rhythm light strip with a fresh layout.
    fn build_rhythm_lights(&mut self, lights: &[RhythmLight]);

    /// Highlights one light of the strip, or none.
    fn activate_light(&mut self, step: Option<usize>);

    fn set_status_text(&mut self, text: &str);
}

/// In-memory sink that keeps the latest state and a short history of what was
/// pushed.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub cells: std::collections::BTreeMap<(usize, u8), CellFacets>,
    pub overlay: BoardOverlay,
    pub clears: usize,
    pub lights: Vec<RhythmLight>,
    pub active_light: Option<usize>,
    pub light_history: Vec<Option<usize>>,
    pub status: String,
    pub status_history: Vec<String>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn facets(&self, string: usize, fret: u8) -> CellFacets {
        self.cells.get(&(string, fret)).copied().unwrap_or_default()
    }
}

#[cfg(test)]
impl RenderSink for RecordingSink {
    fn set_cell_facets(&mut self, cell: &Cell, facets: &CellFacets) {
        self.cells.insert((cell.string, cell.fret), *facets);
    }

    fn set_board_overlay_flags(&mut self, overlay: BoardOverlay) {
        self.overlay = overlay;
    }

    fn clear_all_facets(&mut self) {
        self.cells.clear();
        self.overlay = BoardOverlay::default();
        self.clears += 1;
    }

    fn build_rhythm_lights(&mut self, lights: &[RhythmLight]) {
        self.lights = lights.to_vec();
        self.active_light = None;
    }

    fn activate_light(&mut self, step: Option<usize>) {
        self.active_light = step;
        self.light_history.push(step);
    }

    fn set_status_text(&mut self, text: &str) {
        self.status = text.to_string();
        self.status_history.push(self.status.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fretboard::Fretboard;

    #[test]
    fn clear_resets_cells_and_overlay() {
        let board = Fretboard::standard();
        let mut sink = RecordingSink::new();
        let facets = CellFacets {
            in_scale: true,
            ..CellFacets::default()
        };
        sink.set_cell_facets(board.at(0, 0), &facets);
        sink.set_board_overlay_flags(BoardOverlay {
            show_scale: true,
            ..BoardOverlay::default()
        });
        assert!(sink.facets(0, 0).in_scale);

        sink.clear_all_facets();
        assert!(!sink.facets(0, 0).in_scale);
        assert!(!sink.overlay.show_scale);
        assert_eq!(sink.clears, 1);
    }
}
