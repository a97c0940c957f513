use std::{cell::Cell as Shared, fmt::Write as _, rc::Rc};

use fretboard_trainer_core::{
    AudioOutput, BoardOverlay, Cell, CellFacets, CellId, ClickTone, Fretboard, RenderSink,
    RhythmLight,
};

/// Sink that keeps the board for text drawing and echoes rhythm events.
#[derive(Debug)]
pub struct TextSink {
    cells: Vec<CellFacets>,
    overlay: BoardOverlay,
    lights: Vec<RhythmLight>,
    active: Option<usize>,
    status: String,
}

impl TextSink {
    pub fn new(board: &Fretboard) -> Self {
        Self {
            cells: vec![CellFacets::default(); board.len()],
            overlay: BoardOverlay::default(),
            lights: Vec::new(),
            active: None,
            status: String::new(),
        }
    }

    /// One row per string, high E on top.
    pub fn draw_board(&self, board: &Fretboard, degrees: bool) -> String {
        let mut out = String::from("    ");
        for fret in 0..16 {
            let _ = write!(out, "{fret:^5}");
        }
        out.push('\n');

        for string in 0..6 {
            let open = board.at(string, 0).pitch;
            let _ = write!(out, "{:<3}|", open.name());
            for id in board.string_cells(string) {
                let cell = board.cell(id);
                let facets = &self.cells[id.index()];
                let label = if degrees {
                    facets.degree.unwrap_or("").to_string()
                } else {
                    cell.pitch.name().to_string()
                };
                let _ = write!(out, "{:^5}", glyph(cell, facets, &label));
            }
            out.push('\n');
        }

        let flags = [
            ("scale", self.overlay.show_scale),
            ("chord", self.overlay.show_chord),
            ("arpeggio", self.overlay.show_arpeggio),
            ("caged", self.overlay.show_caged),
        ];
        let shown: Vec<&str> = flags
            .iter()
            .filter(|(_, on)| *on)
            .map(|(name, _)| *name)
            .collect();
        let _ = write!(out, "overlay: {}", shown.join(", "));
        out
    }

    pub fn draw_lights(&self) -> String {
        self.lights
            .iter()
            .enumerate()
            .map(|(index, light)| match (self.active == Some(index), light.beat) {
                (true, _) => '#',
                (false, true) => 'o',
                (false, false) => '.',
            })
            .collect()
    }
}

fn glyph(cell: &Cell, facets: &CellFacets, label: &str) -> String {
    if let Some(step) = facets.arpeggio_step {
        return format!("[{step}]");
    }
    if facets.is_caged_note {
        return format!("<{label}>");
    }
    if facets.in_scale && facets.is_root {
        return format!("({label})");
    }
    if facets.in_scale {
        return label.to_string();
    }
    if facets.arpeggio_muted {
        return ".".to_string();
    }
    if cell.has_inlay() {
        return "*".to_string();
    }
    "-".to_string()
}

impl RenderSink for TextSink {
    fn set_cell_facets(&mut self, cell: &Cell, facets: &CellFacets) {
        self.cells[CellId::new(cell.string, cell.fret).index()] = *facets;
    }

    fn set_board_overlay_flags(&mut self, overlay: BoardOverlay) {
        self.overlay = overlay;
    }

    fn clear_all_facets(&mut self) {
        self.cells.fill(CellFacets::default());
        self.overlay = BoardOverlay::default();
    }

    fn build_rhythm_lights(&mut self, lights: &[RhythmLight]) {
        self.lights = lights.to_vec();
        self.active = None;
    }

    fn activate_light(&mut self, step: Option<usize>) {
        self.active = step;
    }

    fn set_status_text(&mut self, text: &str) {
        if text != self.status {
            println!("{:<10} {text}", self.draw_lights());
            self.status = text.to_string();
        }
    }
}

/// Audio output that prints what it would play. The clock is shared with
/// the simulation loop.
#[derive(Debug, Clone, Default)]
pub struct ConsoleAudio {
    clock: Rc<Shared<f64>>,
}

impl ConsoleAudio {
    pub fn new(clock: Rc<Shared<f64>>) -> Self {
        Self { clock }
    }
}

impl AudioOutput for ConsoleAudio {
    fn current_time(&self) -> f64 {
        self.clock.get()
    }

    fn play_click(&mut self, tone: ClickTone) {
        let kind = if tone == ClickTone::ACCENT { "ACCENT" } else { "click" };
        println!(
            "{:>8.3}s  {kind} {:.0} Hz",
            self.clock.get(),
            tone.frequency_hz
        );
    }

    fn play_pulse(&mut self, at: f64, tone: ClickTone) {
        println!(
            "{:>8.3}s  pulse at {at:.3}s {:.0} Hz",
            self.clock.get(),
            tone.frequency_hz
        );
    }
}
