//! Playback sinks
//!
//! A sink is the host-provided end of the decode-then-play path. It runs
//! at a fixed sample rate; callers bring buffers to that rate first (see
//! [`crate::audio::Resampler`]).

use crate::audio::types::DecodedAudioBuffer;
use crate::error::{Error, Result};
use tracing::debug;

/// Destination for decoded audio
pub trait PlaybackSink {
    /// Sample rate the sink consumes, in Hz
    fn sample_rate(&self) -> u32;

    /// Output channel count
    fn channels(&self) -> u16;

    /// Queue a buffer for playback
    ///
    /// The buffer must already be at `sample_rate()`.
    fn play(&mut self, buffer: &DecodedAudioBuffer) -> Result<()>;
}

/// Sink that keeps every buffer it is given
///
/// Used for dry runs (no audio device) and in tests.
#[derive(Debug, Clone)]
pub struct MemorySink {
    sample_rate: u32,
    channels: u16,
    played: Vec<DecodedAudioBuffer>,
}

impl MemorySink {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            played: Vec::new(),
        }
    }

    /// Buffers played so far, in order
    pub fn played(&self) -> &[DecodedAudioBuffer] {
        &self.played
    }

    /// Total frames played across all buffers
    pub fn frames_played(&self) -> usize {
        self.played.iter().map(DecodedAudioBuffer::frame_count).sum()
    }
}

impl PlaybackSink for MemorySink {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn play(&mut self, buffer: &DecodedAudioBuffer) -> Result<()> {
        if buffer.sample_rate() != self.sample_rate {
            return Err(Error::AudioOutput(format!(
                "sink runs at {}Hz, buffer is {}Hz",
                self.sample_rate,
                buffer.sample_rate()
            )));
        }

        debug!("Memory sink received {} frames", buffer.frame_count());
        self.played.push(buffer.clone());
        Ok(())
    }
}
