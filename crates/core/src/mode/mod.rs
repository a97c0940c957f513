//! Training / CAGED / rhythm mode machine and the control values it owns.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    arpeggio::ArpeggioDirection,
    fretboard::ChordPosition,
    pattern::{PatternId, PatternSelection},
    theory::{normalise, ChordKind, PitchClass, ScaleKind},
    FretboardError, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    #[default]
    Training,
    Caged,
    Rhythm,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Caged => "caged",
            Self::Rhythm => "rhythm",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = FretboardError;

    fn from_str(s: &str) -> Result<Self> {
        match normalise(s).as_str() {
            "training" => Ok(Self::Training),
            "caged" => Ok(Self::Caged),
            "rhythm" => Ok(Self::Rhythm),
            _ => Err(FretboardError::unknown("mode", s)),
        }
    }
}

/// Current value of every board control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controls {
    pub root: PitchClass,
    pub scale: ScaleKind,
    pub chord: ChordKind,
    pub chord_tone_on: bool,
    pub highlight_root: bool,
    pub arpeggio_on: bool,
    pub arpeggio_direction: ArpeggioDirection,
    pub scale_on: bool,
    pub chord_position: ChordPosition,
    pub patterns: PatternSelection,
    pub caged_on: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Self::from_training(&TrainingSnapshot::default())
    }
}

impl Controls {
    /// Training values from the snapshot, no pattern selected and the CAGED
    /// overlay off.
    pub fn from_training(snapshot: &TrainingSnapshot) -> Self {
        Self {
            root: snapshot.root,
            scale: snapshot.scale,
            chord: snapshot.chord,
            chord_tone_on: snapshot.chord_tone,
            highlight_root: snapshot.highlight_root,
            arpeggio_on: snapshot.arpeggio,
            arpeggio_direction: snapshot.arpeggio_direction,
            scale_on: snapshot.scale_on,
            chord_position: snapshot.chord_position,
            patterns: PatternSelection::new(),
            caged_on: false,
        }
    }

    fn training_snapshot(&self) -> TrainingSnapshot {
        TrainingSnapshot {
            root: self.root,
            scale: self.scale,
            chord: self.chord,
            chord_tone: self.chord_tone_on,
            highlight_root: self.highlight_root,
            arpeggio: self.arpeggio_on,
            arpeggio_direction: self.arpeggio_direction,
            scale_on: self.scale_on,
            chord_position: self.chord_position,
        }
    }
}

/// Training controls saved when leaving training mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrainingSnapshot {
    pub root: PitchClass,
    pub scale: ScaleKind,
    pub chord: ChordKind,
    pub chord_tone: bool,
    pub highlight_root: bool,
    pub arpeggio: bool,
    pub arpeggio_direction: ArpeggioDirection,
    pub scale_on: bool,
    pub chord_position: ChordPosition,
}

impl Default for TrainingSnapshot {
    fn default() -> Self {
        Self {
            root: PitchClass::C,
            scale: ScaleKind::Major,
            chord: ChordKind::MajorTriad,
            chord_tone: false,
            highlight_root: true,
            arpeggio: false,
            arpeggio_direction: ArpeggioDirection::Ascending,
            scale_on: false,
            chord_position: ChordPosition::default(),
        }
    }
}

/// CAGED controls saved when leaving caged mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CagedSnapshot {
    pub patterns: PatternSelection,
    pub caged_on: bool,
}

/// A completed mode change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Mode,
    pub to: Mode,
}

/// Owns the active mode, the live control values and the per-mode
/// snapshots. Each setter is only accepted in the mode whose panel shows
/// the control.
#[derive(Debug, Clone)]
pub struct ModeController {
    mode: Mode,
    controls: Controls,
    training: TrainingSnapshot,
    caged: CagedSnapshot,
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new(TrainingSnapshot::default())
    }
}

impl ModeController {
    /// Starts in training mode with the given control values.
    pub fn new(training: TrainingSnapshot) -> Self {
        Self {
            mode: Mode::Training,
            controls: Controls::from_training(&training),
            training,
            caged: CagedSnapshot::default(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// Snapshot taken the last time training mode was left.
    pub fn training_snapshot(&self) -> &TrainingSnapshot {
        &self.training
    }

    pub fn caged_snapshot(&self) -> &CagedSnapshot {
        &self.caged
    }

    /// Saves the state of the mode being left and loads the state of the
    /// target. Returns `None` when already in `target`.
    pub fn transition(&mut self, target: Mode) -> Option<Transition> {
        let from = self.mode;
        if target == from {
            return None;
        }

        match from {
            Mode::Training => self.training = self.controls.training_snapshot(),
            Mode::Caged => {
                self.caged = CagedSnapshot {
                    patterns: self.controls.patterns.clone(),
                    caged_on: self.controls.caged_on,
                }
            }
            Mode::Rhythm => {}
        }

        self.controls.patterns.clear();
        match target {
            Mode::Caged => {
                let controls = &mut self.controls;
                controls.root = PitchClass::C;
                controls.scale = ScaleKind::Major;
                controls.chord = ChordKind::MajorTriad;
                controls.chord_tone_on = false;
                controls.arpeggio_on = false;
                controls.arpeggio_direction = ArpeggioDirection::Ascending;
                controls.caged_on = self.caged.caged_on;
                controls.patterns = self.caged.patterns.clone();
            }
            Mode::Training => self.controls = Controls::from_training(&self.training),
            Mode::Rhythm => {}
        }

        self.mode = target;
        tracing::info!(%from, to = %target, "mode changed");
        Some(Transition { from, to: target })
    }

    pub fn set_root(&mut self, root: PitchClass) -> Result<()> {
        self.require(Mode::Training, "root")?;
        self.controls.root = root;
        Ok(())
    }

    pub fn set_scale(&mut self, scale: ScaleKind) -> Result<()> {
        self.require(Mode::Training, "scale")?;
        self.controls.scale = scale;
        Ok(())
    }

    pub fn set_chord(&mut self, chord: ChordKind) -> Result<()> {
        self.require(Mode::Training, "chord")?;
        self.controls.chord = chord;
        Ok(())
    }

    pub fn set_scale_on(&mut self, on: bool) -> Result<()> {
        self.require(Mode::Training, "scale display")?;
        self.controls.scale_on = on;
        Ok(())
    }

    pub fn set_chord_tone_on(&mut self, on: bool) -> Result<()> {
        self.require(Mode::Training, "chord tones")?;
        self.controls.chord_tone_on = on;
        Ok(())
    }

    pub fn set_highlight_root(&mut self, on: bool) -> Result<()> {
        self.require(Mode::Training, "root highlight")?;
        self.controls.highlight_root = on;
        Ok(())
    }

    pub fn set_arpeggio_on(&mut self, on: bool) -> Result<()> {
        self.require(Mode::Training, "arpeggio")?;
        self.controls.arpeggio_on = on;
        Ok(())
    }

    pub fn set_arpeggio_direction(&mut self, direction: ArpeggioDirection) -> Result<()> {
        self.require(Mode::Training, "arpeggio direction")?;
        self.controls.arpeggio_direction = direction;
        Ok(())
    }

    pub fn set_chord_position(&mut self, position: ChordPosition) -> Result<()> {
        self.require(Mode::Training, "chord position")?;
        self.controls.chord_position = position;
        Ok(())
    }

    /// Flips one pattern button and returns whether it is now pressed.
    pub fn toggle_pattern(&mut self, id: PatternId) -> Result<bool> {
        self.require(Mode::Caged, "pattern")?;
        Ok(self.controls.patterns.toggle(id))
    }

    pub fn set_caged_on(&mut self, on: bool) -> Result<()> {
        self.require(Mode::Caged, "CAGED overlay")?;
        self.controls.caged_on = on;
        Ok(())
    }

    pub(crate) fn require(&self, mode: Mode, control: &'static str) -> Result<()> {
        if self.mode == mode {
            Ok(())
        } else {
            tracing::warn!(control, mode = %self.mode, "control is locked");
            Err(FretboardError::ControlLocked {
                control,
                mode: self.mode.name(),
            })
        }
    }
}
