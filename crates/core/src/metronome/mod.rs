//! Look-ahead metronome.
//!
//! A short polling timer wakes up every few milliseconds and hands the audio
//! output every pulse that falls inside a small horizon ahead of the audio
//! clock. Pulses carry exact timestamps, so timer jitter never reaches the
//! audible result.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    audio::{AudioOutput, ClickTone, LazyAudio},
    rhythm::validate_bpm,
    timeline::{RepeatingTimer, TimerId},
    FretboardError, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetronomeConfig {
    pub bpm: u32,
    pub poll_interval_ms: u64,
    /// How far ahead of the audio clock pulses are handed out.
    pub horizon_seconds: f64,
    /// Delay of the first pulse after starting.
    pub start_offset_seconds: f64,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            bpm: 120,
            poll_interval_ms: 25,
            horizon_seconds: 0.1,
            start_offset_seconds: 0.05,
        }
    }
}

impl MetronomeConfig {
    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / f64::from(self.bpm)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        validate_bpm(self.bpm)?;
        if self.poll_interval_ms == 0 {
            return Err(FretboardError::InvalidTiming {
                field: "pollIntervalMs",
                reason: "must be at least 1",
            });
        }
        non_negative("horizonSeconds", self.horizon_seconds)?;
        non_negative("startOffsetSeconds", self.start_offset_seconds)
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FretboardError::InvalidTiming {
            field,
            reason: "must be a finite, non-negative number of seconds",
        })
    }
}

#[derive(Debug, Default)]
pub struct MetronomeScheduler {
    config: MetronomeConfig,
    next_pulse: f64,
    timer: Option<TimerId>,
}

impl MetronomeScheduler {
    pub fn new(config: MetronomeConfig) -> Self {
        Self {
            config,
            next_pulse: 0.0,
            timer: None,
        }
    }

    pub fn config(&self) -> &MetronomeConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Audio-clock time of the next pulse to be handed out.
    pub fn next_pulse(&self) -> f64 {
        self.next_pulse
    }

    /// New tempo applies from the pulse after the next one already computed.
    pub fn set_bpm(&mut self, bpm: u32) -> Result<()> {
        self.config.bpm = validate_bpm(bpm)?;
        Ok(())
    }

    /// Opens the audio output if needed and begins polling. Ignored while
    /// already running.
    pub fn start<T, A>(&mut self, timer: &mut T, audio: &mut LazyAudio<A>) -> bool
    where
        T: RepeatingTimer + ?Sized,
        A: AudioOutput,
    {
        if self.is_running() {
            return false;
        }
        self.next_pulse = audio.get().current_time() + self.config.start_offset_seconds;
        self.timer = Some(timer.start(self.config.poll_interval()));
        tracing::debug!(bpm = self.config.bpm, first = self.next_pulse, "metronome started");
        true
    }

    /// Stops polling. Pulses already handed to the output still play.
    pub fn stop<T: RepeatingTimer + ?Sized>(&mut self, timer: &mut T) {
        if let Some(id) = self.timer.take() {
            timer.cancel(id);
            tracing::debug!("metronome stopped");
        }
    }

    /// Handles a polling expiry and returns how many pulses were scheduled.
    pub fn on_timer<A: AudioOutput>(&mut self, id: TimerId, audio: &mut LazyAudio<A>) -> usize {
        if self.timer != Some(id) {
            return 0;
        }
        let output = audio.get();
        let horizon = output.current_time() + self.config.horizon_seconds;
        let mut scheduled = 0;
        while self.next_pulse < horizon {
            output.play_pulse(self.next_pulse, ClickTone::PULSE);
            self.next_pulse += self.config.seconds_per_beat();
            scheduled += 1;
        }
        scheduled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{audio::RecordingAudio, timeline::ManualTimer};

    fn rig() -> (ManualTimer, LazyAudio<RecordingAudio>, RecordingAudio) {
        let log = RecordingAudio::new();
        let shared = log.clone();
        (ManualTimer::new(), LazyAudio::new(move || shared.clone()), log)
    }

    fn poll_until(
        metronome: &mut MetronomeScheduler,
        timer: &mut ManualTimer,
        audio: &mut LazyAudio<RecordingAudio>,
        log: &RecordingAudio,
        seconds: f64,
    ) {
        let deadline = Duration::from_secs_f64(seconds);
        while let Some(firing) = timer.fire_next(deadline) {
            log.set_time(firing.at.as_secs_f64());
            metronome.on_timer(firing.id, audio);
        }
        timer.settle(deadline);
        log.set_time(seconds);
    }

    #[test]
    fn schedules_pulses_ahead_of_the_clock() {
        let (mut timer, mut audio, log) = rig();
        let mut metronome = MetronomeScheduler::new(MetronomeConfig::default());
        assert!(metronome.start(&mut timer, &mut audio));
        assert!((metronome.next_pulse() - 0.05).abs() < 1e-9);

        poll_until(&mut metronome, &mut timer, &mut audio, &log, 1.0);

        // Pulses at 0.05, 0.55 and 1.05 (the last is inside the horizon).
        let pulses = log.log().pulses;
        assert_eq!(pulses.len(), 3);
        for (index, at) in pulses.iter().enumerate() {
            assert!((at - (0.05 + 0.5 * index as f64)).abs() < 1e-9);
        }
    }

    #[test]
    fn pulses_do_not_depend_on_poll_jitter() {
        let (mut timer, mut audio, log) = rig();
        let mut metronome = MetronomeScheduler::new(MetronomeConfig::default());
        metronome.start(&mut timer, &mut audio);
        let id = timer.advance(Duration::from_millis(25))[0].id;

        // A late poll still schedules every overdue pulse at its exact time.
        log.set_time(1.3);
        assert_eq!(metronome.on_timer(id, &mut audio), 3);
        let pulses = log.log().pulses;
        for (at, expected) in pulses.iter().zip([0.05, 0.55, 1.05]) {
            assert!((at - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn start_twice_and_stop_twice() {
        let (mut timer, mut audio, log) = rig();
        let mut metronome = MetronomeScheduler::new(MetronomeConfig::default());
        assert!(metronome.start(&mut timer, &mut audio));
        assert!(!metronome.start(&mut timer, &mut audio));
        assert_eq!(timer.active_timers(), 1);

        metronome.stop(&mut timer);
        metronome.stop(&mut timer);
        assert!(!metronome.is_running());
        assert_eq!(timer.active_timers(), 0);

        poll_until(&mut metronome, &mut timer, &mut audio, &log, 2.0);
        assert!(log.log().pulses.is_empty());
    }

    #[test]
    fn tempo_change_applies_to_following_pulses() {
        let (mut timer, mut audio, log) = rig();
        let mut metronome = MetronomeScheduler::new(MetronomeConfig::default());
        metronome.start(&mut timer, &mut audio);
        poll_until(&mut metronome, &mut timer, &mut audio, &log, 0.1);
        assert_eq!(log.log().pulses, vec![0.05]);

        metronome.set_bpm(60).unwrap();
        poll_until(&mut metronome, &mut timer, &mut audio, &log, 1.6);

        let pulses = log.log().pulses;
        assert_eq!(pulses.len(), 3);
        assert!((pulses[1] - 0.55).abs() < 1e-9);
        assert!((pulses[2] - 1.55).abs() < 1e-9);
        assert!(metronome.set_bpm(1000).is_err());
    }
}
