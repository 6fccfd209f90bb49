//! Playback control
//!
//! Drives the "speak" action from a speech payload to the output sink.

pub mod speech;

pub use speech::{SpeechOutcome, SpeechPlayer};
