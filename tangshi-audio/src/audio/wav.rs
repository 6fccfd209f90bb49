//! WAV export using hound
//!
//! Writes 16-bit integer PCM at the buffer's own rate and channel count.
//! The f32 → i16 mapping is the inverse of the decoder's scaling
//! (`x * 32768`, rounded and clamped), so decoded speech is written back
//! with its original sample values.

use crate::audio::types::DecodedAudioBuffer;
use crate::error::Result;
use std::path::Path;
use tracing::info;

/// Convert a normalized sample to i16 using the decoder's 32768 scale
pub fn to_pcm16(sample: f32) -> i16 {
    (sample * 32768.0).round().clamp(-32768.0, 32767.0) as i16
}

/// Write a buffer as a 16-bit PCM WAV file
pub fn write_wav<P: AsRef<Path>>(path: P, buffer: &DecodedAudioBuffer) -> Result<()> {
    let spec = hound::WavSpec {
        channels: buffer.channel_count(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path.as_ref(), spec)?;
    for sample in buffer.interleaved() {
        writer.write_sample(to_pcm16(sample))?;
    }
    writer.finalize()?;

    info!(
        "Wrote {} frames ({} ms) to {}",
        buffer.frame_count(),
        buffer.duration_ms(),
        path.as_ref().display()
    );
    Ok(())
}
