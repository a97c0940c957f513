//! Step sequencer behind the rhythm trainer's lights and clicks.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    audio::{AudioOutput, ClickTone, LazyAudio},
    render::RenderSink,
    theory::normalise,
    timeline::{RepeatingTimer, TimerId},
    FretboardError, Result,
};

/// Status line shown while the trainer is stopped.
pub const IDLE_STATUS: &str = "Ready";

pub const MIN_BPM: u32 = 1;
pub const MAX_BPM: u32 = 400;

pub(crate) fn validate_bpm(bpm: u32) -> Result<u32> {
    if (MIN_BPM..=MAX_BPM).contains(&bpm) {
        Ok(bpm)
    } else {
        Err(FretboardError::InvalidBpm(bpm))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Signature {
    #[serde(rename = "3/4")]
    ThreeFour,
    #[default]
    #[serde(rename = "4/4")]
    FourFour,
    #[serde(rename = "6/8")]
    SixEight,
}

impl Signature {
    pub fn beats_per_bar(self) -> usize {
        match self {
            Self::ThreeFour => 3,
            Self::FourFour => 4,
            Self::SixEight => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ThreeFour => "3/4",
            Self::FourFour => "4/4",
            Self::SixEight => "6/8",
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Signature {
    type Err = FretboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "3/4" => Ok(Self::ThreeFour),
            "4/4" => Ok(Self::FourFour),
            "6/8" => Ok(Self::SixEight),
            _ => Err(FretboardError::unknown("time signature", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Subdivision {
    #[default]
    Quarter,
    Eighth,
    Sixteenth,
}

impl Subdivision {
    pub fn steps_per_beat(self) -> usize {
        match self {
            Self::Quarter => 1,
            Self::Eighth => 2,
            Self::Sixteenth => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Quarter => "quarter",
            Self::Eighth => "eighth",
            Self::Sixteenth => "sixteenth",
        }
    }
}

impl FromStr for Subdivision {
    type Err = FretboardError;

    fn from_str(s: &str) -> Result<Self> {
        match normalise(s).as_str() {
            "quarter" | "4" => Ok(Self::Quarter),
            "eighth" | "8" => Ok(Self::Eighth),
            "sixteenth" | "16" => Ok(Self::Sixteenth),
            _ => Err(FretboardError::unknown("subdivision", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RhythmConfig {
    pub signature: Signature,
    pub subdivision: Subdivision,
    pub bpm: u32,
    pub sound_on: bool,
    pub light_on: bool,
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            signature: Signature::FourFour,
            subdivision: Subdivision::Quarter,
            bpm: 90,
            sound_on: true,
            light_on: true,
        }
    }
}

impl RhythmConfig {
    pub fn beats_per_bar(&self) -> usize {
        self.signature.beats_per_bar()
    }

    pub fn steps_per_beat(&self) -> usize {
        self.subdivision.steps_per_beat()
    }

    pub fn total_steps(&self) -> usize {
        self.beats_per_bar() * self.steps_per_beat()
    }

    /// Time between two steps: one beat split into `steps_per_beat` parts.
    pub fn step_interval(&self) -> Duration {
        Duration::from_secs_f64(60.0 / f64::from(self.bpm) / self.steps_per_beat() as f64)
    }

    pub fn validate(&self) -> Result<()> {
        validate_bpm(self.bpm).map(|_| ())
    }

    /// Light strip for this configuration.
    pub fn light_layout(&self) -> Vec<RhythmLight> {
        let steps_per_beat = self.steps_per_beat();
        (0..self.total_steps())
            .map(|index| RhythmLight {
                beat: index % steps_per_beat == 0,
                accent: index == 0,
            })
            .collect()
    }
}

/// One light of the rhythm strip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RhythmLight {
    pub beat: bool,
    pub accent: bool,
}

/// What a single step emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub step: usize,
    /// 1-based beat within the bar.
    pub beat: usize,
    pub accent: bool,
}

/// Fixed-interval step generator. Stopped until [`start`](Self::start), and
/// back at step 0 after every [`stop`](Self::stop).
#[derive(Debug, Default)]
pub struct RhythmScheduler {
    config: RhythmConfig,
    step: usize,
    timer: Option<TimerId>,
}

impl RhythmScheduler {
    pub fn new(config: RhythmConfig) -> Self {
        Self {
            config,
            step: 0,
            timer: None,
        }
    }

    pub fn config(&self) -> &RhythmConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Step the next tick will play.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Emits step 0 immediately and keeps ticking every step interval.
    /// Ignored while already running.
    pub fn start<T, A, S>(
        &mut self,
        timer: &mut T,
        audio: &mut LazyAudio<A>,
        sink: &mut S,
    ) -> Option<Tick>
    where
        T: RepeatingTimer + ?Sized,
        A: AudioOutput,
        S: RenderSink + ?Sized,
    {
        if self.is_running() {
            return None;
        }
        let interval = self.config.step_interval();
        tracing::debug!(
            bpm = self.config.bpm,
            steps = self.config.total_steps(),
            ?interval,
            "rhythm started"
        );
        self.step = 0;
        self.timer = Some(timer.start(interval));
        Some(self.tick(audio, sink))
    }

    /// Cancels the timer, rewinds to step 0 and clears the active light.
    /// Stopping a stopped scheduler does nothing.
    pub fn stop<T, S>(&mut self, timer: &mut T, sink: &mut S)
    where
        T: RepeatingTimer + ?Sized,
        S: RenderSink + ?Sized,
    {
        self.step = 0;
        let Some(id) = self.timer.take() else {
            return;
        };
        timer.cancel(id);
        sink.activate_light(None);
        sink.set_status_text(IDLE_STATUS);
        tracing::debug!("rhythm stopped");
    }

    /// Handles a timer expiry. Expiries of any timer other than the current
    /// one are ignored and return `None`.
    pub fn on_timer<A, S>(
        &mut self,
        id: TimerId,
        audio: &mut LazyAudio<A>,
        sink: &mut S,
    ) -> Option<Tick>
    where
        A: AudioOutput,
        S: RenderSink + ?Sized,
    {
        if self.timer != Some(id) {
            return None;
        }
        Some(self.tick(audio, sink))
    }

    /// Swaps in a new configuration, rebuilds the light strip and restarts
    /// the run if one is active.
    pub fn reconfigure<T, A, S>(
        &mut self,
        config: RhythmConfig,
        timer: &mut T,
        audio: &mut LazyAudio<A>,
        sink: &mut S,
    ) -> Result<()>
    where
        T: RepeatingTimer + ?Sized,
        A: AudioOutput,
        S: RenderSink + ?Sized,
    {
        config.validate()?;
        self.config = config;
        self.rebuild_lights(sink);
        if self.is_running() {
            tracing::debug!("restarting rhythm with new timing");
            self.stop(timer, sink);
            self.start(timer, audio, sink);
        }
        Ok(())
    }

    /// Takes effect from the next tick.
    pub fn set_sound_on(&mut self, on: bool) {
        self.config.sound_on = on;
    }

    pub fn set_light_on<S: RenderSink + ?Sized>(&mut self, on: bool, sink: &mut S) {
        self.config.light_on = on;
        if !on {
            sink.activate_light(None);
        }
    }

    pub fn rebuild_lights<S: RenderSink + ?Sized>(&self, sink: &mut S) {
        sink.build_rhythm_lights(&self.config.light_layout());
        sink.set_status_text(IDLE_STATUS);
    }

    fn tick<A, S>(&mut self, audio: &mut LazyAudio<A>, sink: &mut S) -> Tick
    where
        A: AudioOutput,
        S: RenderSink + ?Sized,
    {
        let steps_per_beat = self.config.steps_per_beat();
        let beats_per_bar = self.config.beats_per_bar();
        let total = self.config.total_steps();

        let step = self.step % total;
        let beat_index = step / steps_per_beat;
        let accent = step % steps_per_beat == 0 && beat_index % beats_per_bar == 0;

        if self.config.sound_on {
            let tone = if accent {
                ClickTone::ACCENT
            } else {
                ClickTone::NORMAL
            };
            audio.get().play_click(tone);
        }
        sink.activate_light(self.config.light_on.then_some(step));
        sink.set_status_text(&format!(
            "Beat {} · Step {}/{}",
            beat_index + 1,
            step + 1,
            total
        ));

        self.step = (step + 1) % total;
        Tick {
            step,
            beat: beat_index + 1,
            accent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::RecordingAudio,
        render::RecordingSink,
        timeline::ManualTimer,
    };

    struct Rig {
        timer: ManualTimer,
        audio: LazyAudio<RecordingAudio>,
        log: RecordingAudio,
        sink: RecordingSink,
    }

    impl Rig {
        fn new() -> Self {
            let log = RecordingAudio::new();
            let shared = log.clone();
            Self {
                timer: ManualTimer::new(),
                audio: LazyAudio::new(move || shared.clone()),
                log,
                sink: RecordingSink::new(),
            }
        }

        fn run(&mut self, scheduler: &mut RhythmScheduler, delta: Duration) -> Vec<Tick> {
            let mut ticks = Vec::new();
            for firing in self.timer.advance(delta) {
                ticks.extend(scheduler.on_timer(firing.id, &mut self.audio, &mut self.sink));
            }
            ticks
        }
    }

    fn eighths_at_120() -> RhythmConfig {
        RhythmConfig {
            subdivision: Subdivision::Eighth,
            bpm: 120,
            ..RhythmConfig::default()
        }
    }

    #[test]
    fn derives_step_counts() {
        let config = eighths_at_120();
        assert_eq!(config.beats_per_bar(), 4);
        assert_eq!(config.steps_per_beat(), 2);
        assert_eq!(config.total_steps(), 8);
        assert_eq!(config.step_interval(), Duration::from_millis(250));

        let waltz = RhythmConfig {
            signature: Signature::ThreeFour,
            subdivision: Subdivision::Sixteenth,
            ..RhythmConfig::default()
        };
        assert_eq!(waltz.total_steps(), 12);
    }

    #[test]
    fn light_layout_marks_beats_and_accent() {
        let lights = eighths_at_120().light_layout();
        let beats: Vec<usize> = (0..lights.len()).filter(|i| lights[*i].beat).collect();
        assert_eq!(beats, vec![0, 2, 4, 6]);
        assert!(lights[0].accent);
        assert!(lights[1..].iter().all(|light| !light.accent));
    }

    #[test]
    fn only_bar_start_is_accented() {
        let mut rig = Rig::new();
        let mut scheduler = RhythmScheduler::new(eighths_at_120());

        let first = scheduler
            .start(&mut rig.timer, &mut rig.audio, &mut rig.sink)
            .unwrap();
        assert_eq!(first, Tick { step: 0, beat: 1, accent: true });

        let ticks = rig.run(&mut scheduler, Duration::from_millis(1_750));
        let steps: Vec<usize> = ticks.iter().map(|t| t.step).collect();
        assert_eq!(steps, vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(ticks.iter().all(|t| !t.accent));
        assert_eq!(ticks[1].beat, 2);

        let more = rig.run(&mut scheduler, Duration::from_millis(250));
        assert_eq!(more, vec![Tick { step: 0, beat: 1, accent: true }]);

        let clicks = rig.log.log().clicks;
        assert_eq!(clicks.len(), 9);
        assert_eq!(clicks.iter().filter(|accent| **accent).count(), 2);
        assert_eq!(rig.sink.status, "Beat 1 · Step 1/8");
    }

    #[test]
    fn start_while_running_is_ignored() {
        let mut rig = Rig::new();
        let mut scheduler = RhythmScheduler::new(RhythmConfig::default());

        assert!(scheduler
            .start(&mut rig.timer, &mut rig.audio, &mut rig.sink)
            .is_some());
        assert!(scheduler
            .start(&mut rig.timer, &mut rig.audio, &mut rig.sink)
            .is_none());
        assert_eq!(rig.timer.active_timers(), 1);
        assert_eq!(rig.log.log().clicks.len(), 1);
    }

    #[test]
    fn stop_twice_is_idempotent() {
        let mut rig = Rig::new();
        let mut scheduler = RhythmScheduler::new(eighths_at_120());
        scheduler.start(&mut rig.timer, &mut rig.audio, &mut rig.sink);
        rig.run(&mut scheduler, Duration::from_millis(500));
        assert_eq!(scheduler.step(), 3);

        scheduler.stop(&mut rig.timer, &mut rig.sink);
        let emitted = rig.sink.light_history.len();
        scheduler.stop(&mut rig.timer, &mut rig.sink);

        assert_eq!(scheduler.step(), 0);
        assert!(!scheduler.is_running());
        assert_eq!(rig.sink.light_history.len(), emitted);
        assert_eq!(rig.sink.active_light, None);
        assert_eq!(rig.sink.status, IDLE_STATUS);
        assert!(rig.run(&mut scheduler, Duration::from_secs(2)).is_empty());
    }

    #[test]
    fn stale_timer_expiries_are_ignored() {
        let mut rig = Rig::new();
        let mut scheduler = RhythmScheduler::new(eighths_at_120());
        scheduler.start(&mut rig.timer, &mut rig.audio, &mut rig.sink);
        let firings = rig.timer.advance(Duration::from_millis(250));
        scheduler.stop(&mut rig.timer, &mut rig.sink);
        scheduler.start(&mut rig.timer, &mut rig.audio, &mut rig.sink);

        let stale = firings[0].id;
        assert!(scheduler
            .on_timer(stale, &mut rig.audio, &mut rig.sink)
            .is_none());
        assert_eq!(scheduler.step(), 1);
    }

    #[test]
    fn reconfigure_restarts_a_running_scheduler() {
        let mut rig = Rig::new();
        let mut scheduler = RhythmScheduler::new(eighths_at_120());
        scheduler.start(&mut rig.timer, &mut rig.audio, &mut rig.sink);
        rig.run(&mut scheduler, Duration::from_millis(750));

        let config = RhythmConfig {
            signature: Signature::ThreeFour,
            subdivision: Subdivision::Quarter,
            bpm: 60,
            ..RhythmConfig::default()
        };
        scheduler
            .reconfigure(config, &mut rig.timer, &mut rig.audio, &mut rig.sink)
            .unwrap();

        assert!(scheduler.is_running());
        assert_eq!(scheduler.step(), 1);
        assert_eq!(rig.sink.lights.len(), 3);
        assert_eq!(rig.timer.active_timers(), 1);

        let ticks = rig.run(&mut scheduler, Duration::from_secs(2));
        let steps: Vec<usize> = ticks.iter().map(|t| t.step).collect();
        assert_eq!(steps, vec![1, 2]);
    }

    #[test]
    fn reconfigure_rejects_bad_tempo() {
        let mut rig = Rig::new();
        let mut scheduler = RhythmScheduler::new(RhythmConfig::default());
        let config = RhythmConfig {
            bpm: 0,
            ..RhythmConfig::default()
        };
        let err = scheduler
            .reconfigure(config, &mut rig.timer, &mut rig.audio, &mut rig.sink)
            .unwrap_err();
        assert!(matches!(err, FretboardError::InvalidBpm(0)));
        assert_eq!(scheduler.config().bpm, 90);
    }

    #[test]
    fn muted_sound_and_dark_lights() {
        let mut rig = Rig::new();
        let mut scheduler = RhythmScheduler::new(RhythmConfig::default());
        scheduler.set_sound_on(false);
        scheduler.start(&mut rig.timer, &mut rig.audio, &mut rig.sink);
        assert_eq!(rig.sink.active_light, Some(0));

        scheduler.set_light_on(false, &mut rig.sink);
        assert_eq!(rig.sink.active_light, None);
        rig.run(&mut scheduler, Duration::from_secs(1));

        assert!(!rig.audio.is_open());
        assert_eq!(rig.sink.active_light, None);
        assert!(rig.sink.status.starts_with("Beat 2"));
    }

    #[test]
    fn parses_names() {
        assert_eq!("6/8".parse::<Signature>().unwrap().beats_per_bar(), 6);
        assert_eq!("sixteenth".parse::<Subdivision>().unwrap().steps_per_beat(), 4);
        assert!("5/4".parse::<Signature>().is_err());
    }
}
