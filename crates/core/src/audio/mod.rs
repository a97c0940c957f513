use std::fmt;
#[cfg(test)]
use std::{cell::RefCell, rc::Rc};

/// Sine click descriptor handed to the audio output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickTone {
    pub frequency_hz: f32,
    pub gain: f32,
    /// Time for the exponential decay down to silence.
    pub decay_seconds: f64,
}

impl ClickTone {
    /// First step of a rhythm bar.
    pub const ACCENT: ClickTone = ClickTone {
        frequency_hz: 1200.0,
        gain: 0.24,
        decay_seconds: 0.08,
    };
    pub const NORMAL: ClickTone = ClickTone {
        frequency_hz: 850.0,
        gain: 0.18,
        decay_seconds: 0.08,
    };
    /// Metronome pulse.
    pub const PULSE: ClickTone = ClickTone {
        frequency_hz: 1000.0,
        gain: 0.3,
        decay_seconds: 0.1,
    };
}

/// Sound playback backend with its own clock.
pub trait AudioOutput {
    /// Seconds on the output's clock.
    fn current_time(&self) -> f64;

    /// Plays a click right away.
    fn play_click(&mut self, tone: ClickTone);

    /// Schedules a click at an exact time on the output's clock.
    fn play_pulse(&mut self, at: f64, tone: ClickTone);
}

/// Audio output opened on first use and then shared by both schedulers.
pub struct LazyAudio<A> {
    open: Box<dyn FnMut() -> A>,
    output: Option<A>,
}

impl<A: AudioOutput> LazyAudio<A> {
    pub fn new(open: impl FnMut() -> A + 'static) -> Self {
        Self {
            open: Box::new(open),
            output: None,
        }
    }

    /// Returns the output, opening it if this is the first request.
    pub fn get(&mut self) -> &mut A {
        let open = &mut self.open;
        self.output.get_or_insert_with(|| {
            tracing::debug!("opening audio output");
            open()
        })
    }

    pub fn is_open(&self) -> bool {
        self.output.is_some()
    }

    pub fn output(&self) -> Option<&A> {
        self.output.as_ref()
    }
}

impl<A> fmt::Debug for LazyAudio<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyAudio")
            .field("open", &self.output.is_some())
            .finish()
    }
}

/// Everything a [`RecordingAudio`] has been asked to play.
#[cfg(test)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioLog {
    pub now: f64,
    /// Accent flag of every immediate click.
    pub clicks: Vec<bool>,
    /// Target time of every scheduled pulse.
    pub pulses: Vec<f64>,
}

/// Output that only records calls. Clones share the same log and clock, so a
/// test can keep one handle while the trainer owns another.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    log: Rc<RefCell<AudioLog>>,
}

#[cfg(test)]
impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_time(&self, seconds: f64) {
        self.log.borrow_mut().now = seconds;
    }

    pub fn log(&self) -> AudioLog {
        self.log.borrow().clone()
    }
}

#[cfg(test)]
impl AudioOutput for RecordingAudio {
    fn current_time(&self) -> f64 {
        self.log.borrow().now
    }

    fn play_click(&mut self, tone: ClickTone) {
        self.log.borrow_mut().clicks.push(tone == ClickTone::ACCENT);
    }

    fn play_pulse(&mut self, at: f64, _tone: ClickTone) {
        self.log.borrow_mut().pulses.push(at);
    }
}
