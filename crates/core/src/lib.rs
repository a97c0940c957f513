//! Core library for the Fretboard Trainer.
//!
//! The crate holds everything with real rules: pitch-class arithmetic, the
//! CAGED pattern geometry, per-cell classification of the board, arpeggio
//! path ordering, the training / caged / rhythm mode machine and the two
//! timer-driven schedulers. Drawing, sound synthesis and the event loop live
//! behind the [`RenderSink`], [`AudioOutput`] and [`RepeatingTimer`] traits.

pub mod arpeggio;
pub mod audio;
pub mod config;
pub mod error;
pub mod fretboard;
pub mod metronome;
pub mod mode;
pub mod pattern;
pub mod render;
pub mod rhythm;
pub mod theory;
pub mod timeline;
pub mod trainer;

pub use arpeggio::{ArpeggioDirection, ArpeggioPath};
pub use audio::{AudioOutput, ClickTone, LazyAudio};
pub use config::AppConfig;
pub use error::{FretboardError, Result};
pub use fretboard::{
    BoardOverlay, Cell, CellFacets, CellId, ChordPosition, Classification, Fretboard,
};
pub use metronome::{MetronomeConfig, MetronomeScheduler};
pub use mode::{CagedSnapshot, Controls, Mode, ModeController, TrainingSnapshot, Transition};
pub use pattern::{PatternId, PatternSelection};
pub use render::RenderSink;
pub use rhythm::{RhythmConfig, RhythmLight, RhythmScheduler, Signature, Subdivision, Tick};
pub use theory::{notes_from_formula, ChordKind, ChordTones, PitchClass, PitchSet, ScaleKind};
pub use timeline::{Firing, ManualTimer, RepeatingTimer, TimerId};
pub use trainer::{Intent, Trainer};
