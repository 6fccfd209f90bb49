//! Speech player
//!
//! One `speak` call is one attempt of the Speak action:
//!
//! 1. Begin the attempt on the shared lifecycle (rejected while another
//!    attempt is pending)
//! 2. Decode the base64 payload with the configured PCM format
//! 3. Resample to the sink's rate when it differs
//! 4. Hand the buffer to the sink
//!
//! Any error marks the attempt Failed with its message and is returned to
//! the caller unchanged. No timeout, no retry.

use crate::audio::output::PlaybackSink;
use crate::audio::pcm::{decode_base64_audio, PcmFormat};
use crate::audio::resampler::Resampler;
use crate::audio::types::DecodedAudioBuffer;
use crate::error::Result;
use crate::state::SharedState;
use std::sync::Arc;
use tangshi_common::events::TangshiEvent;
use tangshi_common::ActionKind;
use tracing::{debug, warn};

/// Summary of one successful speak attempt
#[derive(Debug, Clone)]
pub struct SpeechOutcome {
    /// Decoded buffer at the payload's nominal rate
    pub buffer: DecodedAudioBuffer,
    /// Rate the sink played at
    pub played_rate: u32,
    /// Frames handed to the sink (after resampling)
    pub frames_played: usize,
    /// Whether the buffer had to be resampled for the sink
    pub resampled: bool,
}

/// Decode-then-play driver for speech payloads
pub struct SpeechPlayer<S: PlaybackSink> {
    state: Arc<SharedState>,
    sink: S,
    format: PcmFormat,
}

impl<S: PlaybackSink> SpeechPlayer<S> {
    pub fn new(state: Arc<SharedState>, sink: S, format: PcmFormat) -> Self {
        Self {
            state,
            sink,
            format,
        }
    }

    pub fn format(&self) -> PcmFormat {
        self.format
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Decode a base64 speech payload and play it
    ///
    /// # Errors
    /// - `Lifecycle(Busy)` if a Speak attempt is already pending
    /// - `Decode` for malformed base64
    /// - `InvalidArgument` for a zero rate or channel count in the format
    /// - `Resample` / `AudioOutput` from the playback layer
    pub async fn speak(&mut self, payload: &str) -> Result<SpeechOutcome> {
        let ticket = self.state.begin_action(ActionKind::Speak).await?;

        match self.render(payload) {
            Ok(outcome) => {
                self.state.succeed_action(ticket).await;
                Ok(outcome)
            }
            Err(e) => {
                warn!("Speech playback failed: {}", e);
                self.state.fail_action(ticket, e.to_string()).await;
                Err(e)
            }
        }
    }

    fn render(&mut self, payload: &str) -> Result<SpeechOutcome> {
        let buffer = decode_base64_audio(payload, self.format)?;

        self.state.broadcast_event(TangshiEvent::SpeechDecoded {
            frame_count: buffer.frame_count(),
            sample_rate: buffer.sample_rate(),
            channels: buffer.channel_count(),
            duration_ms: buffer.duration_ms(),
            timestamp: chrono::Utc::now(),
        });

        let target_rate = self.sink.sample_rate();
        let resampled = buffer.sample_rate() != target_rate;
        let frames_played = if resampled {
            let converted = Resampler::resample(&buffer, target_rate)?;
            self.sink.play(&converted)?;
            converted.frame_count()
        } else {
            self.sink.play(&buffer)?;
            buffer.frame_count()
        };

        debug!(
            "Played {} frames at {}Hz (resampled: {})",
            frames_played, target_rate, resampled
        );

        Ok(SpeechOutcome {
            buffer,
            played_rate: target_rate,
            frames_played,
            resampled,
        })
    }
}
