//! Application state: one struct owning the board, the mode machine, both
//! schedulers and the collaborators they talk to.

use crate::{
    arpeggio::ArpeggioDirection,
    audio::{AudioOutput, LazyAudio},
    config::AppConfig,
    fretboard::{ChordPosition, Classification, Fretboard},
    metronome::MetronomeScheduler,
    mode::{Controls, Mode, ModeController},
    pattern::PatternId,
    render::RenderSink,
    rhythm::{RhythmConfig, RhythmScheduler, Signature, Subdivision},
    theory::{ChordKind, PitchClass, ScaleKind},
    timeline::{RepeatingTimer, TimerId},
    Result,
};

/// User input accepted by the trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    SetRoot(PitchClass),
    SetScale(ScaleKind),
    SetChord(ChordKind),
    SetScaleOn(bool),
    SetChordToneOn(bool),
    SetHighlightRootOn(bool),
    SetArpeggioOn(bool),
    SetArpeggioDirection(ArpeggioDirection),
    SetChordPosition(ChordPosition),
    TogglePattern(PatternId),
    SetCagedOn(bool),
    SetMode(Mode),
    StartRhythm,
    StopRhythm,
    SetRhythmBpm(u32),
    SetSignature(Signature),
    SetSubdivision(Subdivision),
    SetRhythmSoundOn(bool),
    SetRhythmLightOn(bool),
    StartMetronome,
    StopMetronome,
    SetMetronomeBpm(u32),
}

#[derive(Debug)]
pub struct Trainer<T, A, S> {
    board: Fretboard,
    modes: ModeController,
    rhythm: RhythmScheduler,
    metronome: MetronomeScheduler,
    timer: T,
    audio: LazyAudio<A>,
    sink: S,
    classification: Classification,
}

impl<T, A, S> Trainer<T, A, S>
where
    T: RepeatingTimer,
    A: AudioOutput,
    S: RenderSink,
{
    /// Builds the board, starts in training mode and renders once.
    pub fn new(config: &AppConfig, timer: T, audio: LazyAudio<A>, sink: S) -> Self {
        let board = Fretboard::standard();
        let modes = ModeController::new(config.training.clone());
        let classification = board.classify(modes.mode(), modes.controls());
        let mut trainer = Self {
            board,
            modes,
            rhythm: RhythmScheduler::new(config.rhythm),
            metronome: MetronomeScheduler::new(config.metronome),
            timer,
            audio,
            sink,
            classification,
        };
        trainer.rhythm.rebuild_lights(&mut trainer.sink);
        trainer.sink.clear_all_facets();
        trainer.render();
        trainer
    }

    pub fn board(&self) -> &Fretboard {
        &self.board
    }

    pub fn mode(&self) -> Mode {
        self.modes.mode()
    }

    pub fn controls(&self) -> &Controls {
        self.modes.controls()
    }

    pub fn modes(&self) -> &ModeController {
        &self.modes
    }

    /// Result of the latest recompute.
    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn rhythm(&self) -> &RhythmScheduler {
        &self.rhythm
    }

    pub fn metronome(&self) -> &MetronomeScheduler {
        &self.metronome
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn audio(&self) -> &LazyAudio<A> {
        &self.audio
    }

    /// Applies one intent. Board changes are recomputed and rendered before
    /// this returns.
    pub fn dispatch(&mut self, intent: Intent) -> Result<()> {
        tracing::trace!(?intent, "dispatching");
        let current = *self.rhythm.config();
        let modes = &mut self.modes;
        match intent {
            Intent::SetRoot(root) => modes.set_root(root)?,
            Intent::SetScale(scale) => modes.set_scale(scale)?,
            Intent::SetChord(chord) => modes.set_chord(chord)?,
            Intent::SetScaleOn(on) => modes.set_scale_on(on)?,
            Intent::SetChordToneOn(on) => modes.set_chord_tone_on(on)?,
            Intent::SetHighlightRootOn(on) => modes.set_highlight_root(on)?,
            Intent::SetArpeggioOn(on) => modes.set_arpeggio_on(on)?,
            Intent::SetArpeggioDirection(direction) => modes.set_arpeggio_direction(direction)?,
            Intent::SetChordPosition(position) => modes.set_chord_position(position)?,
            Intent::TogglePattern(id) => {
                modes.toggle_pattern(id)?;
            }
            Intent::SetCagedOn(on) => modes.set_caged_on(on)?,
            Intent::SetMode(mode) => {
                self.set_mode(mode);
                return Ok(());
            }
            Intent::StartRhythm => {
                modes.require(Mode::Rhythm, "rhythm start")?;
                self.rhythm
                    .start(&mut self.timer, &mut self.audio, &mut self.sink);
                return Ok(());
            }
            Intent::StopRhythm => {
                self.rhythm.stop(&mut self.timer, &mut self.sink);
                return Ok(());
            }
            Intent::SetRhythmBpm(bpm) => {
                return self.reconfigure_rhythm(RhythmConfig { bpm, ..current });
            }
            Intent::SetSignature(signature) => {
                return self.reconfigure_rhythm(RhythmConfig { signature, ..current });
            }
            Intent::SetSubdivision(subdivision) => {
                return self.reconfigure_rhythm(RhythmConfig {
                    subdivision,
                    ..current
                });
            }
            Intent::SetRhythmSoundOn(on) => {
                self.rhythm.set_sound_on(on);
                return Ok(());
            }
            Intent::SetRhythmLightOn(on) => {
                self.rhythm.set_light_on(on, &mut self.sink);
                return Ok(());
            }
            Intent::StartMetronome => {
                self.metronome.start(&mut self.timer, &mut self.audio);
                return Ok(());
            }
            Intent::StopMetronome => {
                self.metronome.stop(&mut self.timer);
                return Ok(());
            }
            Intent::SetMetronomeBpm(bpm) => return self.metronome.set_bpm(bpm),
        }
        self.render();
        Ok(())
    }

    fn reconfigure_rhythm(&mut self, config: RhythmConfig) -> Result<()> {
        self.rhythm
            .reconfigure(config, &mut self.timer, &mut self.audio, &mut self.sink)
    }

    /// Switches mode: saves and restores snapshots, stops whichever scheduler
    /// does not belong to the target, resets the board visuals and renders.
    pub fn set_mode(&mut self, target: Mode) {
        if self.modes.transition(target).is_none() {
            return;
        }
        if target == Mode::Rhythm {
            self.metronome.stop(&mut self.timer);
            self.rhythm.rebuild_lights(&mut self.sink);
        } else {
            self.rhythm.stop(&mut self.timer, &mut self.sink);
        }
        self.sink.clear_all_facets();
        self.render();
    }

    /// Routes a timer expiry to the scheduler that owns it.
    pub fn handle_timer(&mut self, id: TimerId) {
        if self
            .rhythm
            .on_timer(id, &mut self.audio, &mut self.sink)
            .is_none()
        {
            self.metronome.on_timer(id, &mut self.audio);
        }
    }

    fn render(&mut self) {
        self.classification = self.board.classify(self.modes.mode(), self.modes.controls());
        self.classification.apply(&self.board, &mut self.sink);
    }
}
