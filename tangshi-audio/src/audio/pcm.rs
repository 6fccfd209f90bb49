//! Raw PCM decoder
//!
//! Converts headerless signed 16-bit little-endian PCM into a planar
//! normalized f32 buffer.
//!
//! # Input Format
//!
//! - Samples interleaved by channel: `sample[frame * channels + channel]`
//! - No header; sample rate and channel count come from the caller
//! - The speech provider sends 24 000 Hz mono
//!
//! # Truncation
//!
//! A trailing odd byte and any samples that do not complete a frame across
//! all channels are dropped. This is not an error:
//! `frame_count = byte_len / 2 / channels`.
//!
//! # Scaling
//!
//! Samples are divided by 32768, so -32768 maps to exactly -1.0 and 32767
//! maps to 32767/32768 (never 1.0).

use crate::audio::payload::decode_base64;
use crate::audio::types::DecodedAudioBuffer;
use crate::error::{Error, Result};
use serde::Deserialize;
use tracing::debug;

/// Sample rate of speech provider output
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Channel count of speech provider output
pub const SPEECH_CHANNELS: u16 = 1;

/// Divisor mapping i16 to [-1.0, 1.0)
pub const PCM16_SCALE: f32 = 32768.0;

/// Out-of-band description of a headerless PCM stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PcmFormat {
    /// Nominal sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Interleaved channel count
    #[serde(default = "default_channels")]
    pub channels: u16,
}

fn default_sample_rate() -> u32 {
    SPEECH_SAMPLE_RATE
}

fn default_channels() -> u16 {
    SPEECH_CHANNELS
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            sample_rate: SPEECH_SAMPLE_RATE,
            channels: SPEECH_CHANNELS,
        }
    }
}

impl PcmFormat {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Check that rate and channel count are positive
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::InvalidArgument(
                "sample rate must be positive".to_string(),
            ));
        }
        if self.channels == 0 {
            return Err(Error::InvalidArgument(
                "channel count must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Decode raw 16-bit little-endian PCM into a planar buffer
///
/// # Arguments
/// - `bytes`: interleaved i16 LE samples, no header
/// - `sample_rate`: nominal rate attached to the result (no resampling)
/// - `num_channels`: interleaved channel count
///
/// # Errors
/// `InvalidArgument` if `sample_rate` or `num_channels` is zero. Empty
/// input is valid and yields a zero-frame buffer.
///
/// # Examples
///
/// ```
/// use tangshi_audio::decode_audio;
///
/// let buffer = decode_audio(&[0x00, 0x80, 0xFF, 0x7F], 24000, 1).unwrap();
/// assert_eq!(buffer.channel(0).unwrap(), &[-1.0, 32767.0 / 32768.0]);
/// ```
pub fn decode_audio(
    bytes: &[u8],
    sample_rate: u32,
    num_channels: u16,
) -> Result<DecodedAudioBuffer> {
    PcmFormat::new(sample_rate, num_channels).validate()?;

    let channels = num_channels as usize;
    let frame_bytes = 2 * channels;
    let frame_count = bytes.len() / frame_bytes;

    let mut planar: Vec<Vec<f32>> = (0..channels)
        .map(|_| Vec::with_capacity(frame_count))
        .collect();

    // chunks_exact drops the odd byte and any partial frame
    for frame in bytes.chunks_exact(frame_bytes) {
        for (channel, sample) in planar.iter_mut().zip(frame.chunks_exact(2)) {
            let value = i16::from_le_bytes([sample[0], sample[1]]);
            channel.push(value as f32 / PCM16_SCALE);
        }
    }

    let discarded = bytes.len() - frame_count * frame_bytes;
    if discarded > 0 {
        debug!("Discarded {} trailing bytes (partial frame)", discarded);
    }

    DecodedAudioBuffer::from_planar(planar, sample_rate)
}

/// Decode a base64 speech payload in the given format
pub fn decode_base64_audio(text: &str, format: PcmFormat) -> Result<DecodedAudioBuffer> {
    // Reject bad arguments before doing any work on the payload
    format.validate()?;

    let bytes = decode_base64(text)?;
    let buffer = decode_audio(&bytes, format.sample_rate, format.channels)?;

    debug!(
        "Decoded {} bytes into {} frames ({} ch @ {} Hz, {} ms)",
        bytes.len(),
        buffer.frame_count(),
        buffer.channel_count(),
        buffer.sample_rate(),
        buffer.duration_ms()
    );

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn test_extremes() {
        let buffer = decode_audio(&[0x00, 0x80, 0xFF, 0x7F], 24000, 1).unwrap();

        let samples = buffer.channel(0).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], -1.0);
        assert_eq!(samples[1], 32767.0 / 32768.0);
        assert!(samples[1] < 1.0);
        assert!((samples[1] - 0.999_969_48).abs() < 1e-7);
    }

    #[test]
    fn test_mono_frame_count() {
        let bytes = encode(&[0, 100, -100, 16384, -16384]);
        let buffer = decode_audio(&bytes, 24000, 1).unwrap();

        assert_eq!(buffer.frame_count(), bytes.len() / 2);
        assert_eq!(buffer.channel(0).unwrap(), &[0.0, 100.0 / 32768.0, -100.0 / 32768.0, 0.5, -0.5]);
    }

    #[test]
    fn test_odd_length_drops_last_byte() {
        let mut bytes = encode(&[1000, -2000, 3000]);
        let even = decode_audio(&bytes, 24000, 1).unwrap();

        bytes.push(0x7F);
        let odd = decode_audio(&bytes, 24000, 1).unwrap();

        assert_eq!(odd, even);
        assert_eq!(odd.frame_count(), 3);
    }

    #[test]
    fn test_single_byte_is_empty() {
        let buffer = decode_audio(&[0x12], 24000, 1).unwrap();
        assert_eq!(buffer.frame_count(), 0);
    }

    #[test]
    fn test_stereo_deinterleave() {
        let (l0, r0, l1, r1) = (1000i16, -1000i16, 2000i16, -2000i16);
        let buffer = decode_audio(&encode(&[l0, r0, l1, r1]), 48000, 2).unwrap();

        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frame_count(), 2);
        assert_eq!(
            buffer.channel(0).unwrap(),
            &[l0 as f32 / 32768.0, l1 as f32 / 32768.0]
        );
        assert_eq!(
            buffer.channel(1).unwrap(),
            &[r0 as f32 / 32768.0, r1 as f32 / 32768.0]
        );
    }

    #[test]
    fn test_partial_frame_discarded() {
        // 5 samples in stereo: 2 full frames, 1 left-over sample
        let bytes = encode(&[1, 2, 3, 4, 5]);
        let buffer = decode_audio(&bytes, 48000, 2).unwrap();

        assert_eq!(buffer.frame_count(), 2);
        assert_eq!(buffer.channel(0).unwrap(), &[1.0 / 32768.0, 3.0 / 32768.0]);
        assert_eq!(buffer.channel(1).unwrap(), &[2.0 / 32768.0, 4.0 / 32768.0]);
    }

    #[test]
    fn test_three_channels() {
        // 7 bytes, 3 channels: floor(7 / 2 / 3) = 1 frame
        let mut bytes = encode(&[10, 20, 30]);
        bytes.push(0xAA);
        let buffer = decode_audio(&bytes, 16000, 3).unwrap();

        assert_eq!(buffer.frame_count(), 1);
        assert_eq!(buffer.channel(2).unwrap(), &[30.0 / 32768.0]);
    }

    #[test]
    fn test_empty_input() {
        for channels in 1..=4 {
            let buffer = decode_audio(&[], 24000, channels).unwrap();
            assert_eq!(buffer.frame_count(), 0);
            assert_eq!(buffer.channel_count(), channels);
        }
    }

    #[test]
    fn test_zero_channels_rejected() {
        let result = decode_audio(&[0, 0], 24000, 0);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        let result = decode_audio(&[0, 0], 0, 1);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_sample_rate_passed_through() {
        let buffer = decode_audio(&encode(&[0; 10]), 22050, 1).unwrap();
        assert_eq!(buffer.sample_rate(), 22050);
    }

    #[test]
    fn test_all_samples_in_range() {
        let samples: Vec<i16> = (i16::MIN..=i16::MAX).step_by(97).chain([i16::MAX]).collect();
        let buffer = decode_audio(&encode(&samples), 24000, 1).unwrap();

        assert!(buffer
            .channel(0)
            .unwrap()
            .iter()
            .all(|&s| (-1.0..1.0).contains(&s)));
    }

    #[test]
    fn test_decode_base64_audio() {
        let buffer = decode_base64_audio("AID/fw==", PcmFormat::default()).unwrap();

        assert_eq!(buffer.sample_rate(), SPEECH_SAMPLE_RATE);
        assert_eq!(buffer.channel_count(), SPEECH_CHANNELS);
        assert_eq!(buffer.channel(0).unwrap(), &[-1.0, 32767.0 / 32768.0]);
    }

    #[test]
    fn test_decode_base64_audio_bad_payload() {
        let result = decode_base64_audio("not base64!", PcmFormat::default());
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_decode_base64_audio_bad_format_checked_first() {
        let result = decode_base64_audio("not base64!", PcmFormat::new(24000, 0));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
}
