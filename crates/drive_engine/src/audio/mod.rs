//! Audio cue interface
//!
//! The simulation never loads or plays sound itself. It emits fire-and-forget
//! cues through an [`AudioSink`] the host implements.

use std::cell::RefCell;
use std::rc::Rc;

/// Receiver of audio cues
pub trait AudioSink {
    /// Per-tick engine update; implementations usually retune pitch
    fn update_engine(&mut self, speed: f32, max_speed: f32);

    /// Braking started
    fn play_brake(&mut self);

    /// Braking ended
    fn stop_brake(&mut self);

    /// The vehicle hit something
    fn play_crash(&mut self);
}

/// Engine playback rate for a speed, between 0.8 at rest and 1.6 flat out
pub fn engine_pitch(speed: f32, max_speed: f32) -> f32 {
    if max_speed <= 0.0 {
        return 0.8;
    }
    let ratio = (speed.abs() / max_speed).min(1.0);
    0.8 + ratio * 0.8
}

/// Sink that drops every cue
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn update_engine(&mut self, _speed: f32, _max_speed: f32) {}
    fn play_brake(&mut self) {}
    fn stop_brake(&mut self) {}
    fn play_crash(&mut self) {}
}

/// One-shot cues, as recorded by [`CueRecorder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    /// [`AudioSink::play_brake`]
    BrakeStart,
    /// [`AudioSink::stop_brake`]
    BrakeStop,
    /// [`AudioSink::play_crash`]
    Crash,
}

/// Sink that records one-shot cues and the last engine pitch
///
/// Clones share the same log, so one handle can be boxed into the
/// simulation while another is inspected.
#[derive(Debug, Clone, Default)]
pub struct CueRecorder {
    cues: Rc<RefCell<Vec<AudioCue>>>,
    pitch: Rc<RefCell<Option<f32>>>,
}

impl CueRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Cues recorded so far
    pub fn cues(&self) -> Vec<AudioCue> {
        self.cues.borrow().clone()
    }

    /// How many times `cue` was recorded
    pub fn count(&self, cue: AudioCue) -> usize {
        self.cues.borrow().iter().filter(|c| **c == cue).count()
    }

    /// Pitch computed from the latest engine update
    pub fn last_pitch(&self) -> Option<f32> {
        *self.pitch.borrow()
    }
}

impl AudioSink for CueRecorder {
    fn update_engine(&mut self, speed: f32, max_speed: f32) {
        *self.pitch.borrow_mut() = Some(engine_pitch(speed, max_speed));
    }

    fn play_brake(&mut self) {
        self.cues.borrow_mut().push(AudioCue::BrakeStart);
    }

    fn stop_brake(&mut self) {
        self.cues.borrow_mut().push(AudioCue::BrakeStop);
    }

    fn play_crash(&mut self) {
        log::debug!("Crash cue");
        self.cues.borrow_mut().push(AudioCue::Crash);
    }
}
