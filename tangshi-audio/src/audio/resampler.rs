//! Audio resampling using rubato
//!
//! The decoder keeps the payload's nominal rate (24 kHz for speech). Output
//! devices usually run at 44.1 or 48 kHz, so the playback layer converts
//! the buffer to the sink's rate before handing it over.

use crate::audio::types::DecodedAudioBuffer;
use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Smallest chunk handed to rubato; also bounds the number of flush passes
const MIN_CHUNK_FRAMES: usize = 256;

/// Audio resampler using rubato for sample rate conversion.
pub struct Resampler;

impl Resampler {
    /// Resample a planar buffer to `target_rate`.
    ///
    /// # Notes
    /// - Same rate: returns a copy without resampling
    /// - Empty buffer: returns an empty buffer at the target rate
    /// - Otherwise the output has `expected_frames` frames: the interpolator
    ///   delay is trimmed from the start and its tail flushed at the end
    pub fn resample(buffer: &DecodedAudioBuffer, target_rate: u32) -> Result<DecodedAudioBuffer> {
        if target_rate == 0 {
            return Err(Error::InvalidArgument(
                "target sample rate must be positive".to_string(),
            ));
        }

        let input_rate = buffer.sample_rate();
        if input_rate == target_rate {
            debug!("Sample rate already at {}Hz, skipping resample", target_rate);
            return Ok(buffer.clone());
        }

        if buffer.is_empty() {
            return DecodedAudioBuffer::empty(buffer.channel_count(), target_rate);
        }

        debug!(
            "Resampling from {}Hz to {}Hz ({} channels)",
            input_rate,
            target_rate,
            buffer.channel_count()
        );

        let input_frames = buffer.frame_count();
        let chunk_size = input_frames.max(MIN_CHUNK_FRAMES);
        let mut resampler =
            Self::create_resampler(input_rate, target_rate, buffer.channel_count(), chunk_size)?;

        let delay = resampler.output_delay();
        let expected = Self::expected_frames(input_frames, input_rate, target_rate);
        let needed = delay + expected;

        // Whole buffer as one (zero-padded) chunk
        let mut planar: Vec<Vec<f32>> = resampler
            .process_partial(Some(buffer.channels()), None)
            .map_err(|e| Error::Resample(format!("Resampling failed: {}", e)))?;

        // Flush the interpolator until the delayed tail has come out
        while planar.first().map_or(0, Vec::len) < needed {
            let tail = resampler
                .process_partial(None::<&[Vec<f32>]>, None)
                .map_err(|e| Error::Resample(format!("Flushing resampler failed: {}", e)))?;
            if tail.first().map_or(true, Vec::is_empty) {
                break;
            }
            for (channel, chunk) in planar.iter_mut().zip(tail) {
                channel.extend(chunk);
            }
        }

        // Drop the leading delay and the zero-padded tail
        let trimmed: Vec<Vec<f32>> = planar
            .into_iter()
            .map(|channel| {
                let end = needed.min(channel.len());
                channel[delay.min(end)..end].to_vec()
            })
            .collect();

        let output = DecodedAudioBuffer::from_planar(trimmed, target_rate)?;

        debug!(
            "Resampled {} input frames to {} output frames (delay {})",
            input_frames,
            output.frame_count(),
            delay
        );

        Ok(output)
    }

    /// Output length for `frames` input frames: `round(frames * target / input)`
    pub fn expected_frames(frames: usize, input_rate: u32, target_rate: u32) -> usize {
        let input_rate = input_rate as u64;
        ((frames as u64 * target_rate as u64 + input_rate / 2) / input_rate) as usize
    }

    /// Create a rubato resampler.
    ///
    /// FastFixedIn with a septic polynomial: good quality for speech at low
    /// CPU cost.
    fn create_resampler(
        input_rate: u32,
        output_rate: u32,
        channels: u16,
        chunk_size: usize,
    ) -> Result<FastFixedIn<f32>> {
        FastFixedIn::<f32>::new(
            output_rate as f64 / input_rate as f64,
            1.0, // max_relative_ratio (no runtime changes)
            PolynomialDegree::Septic,
            chunk_size,
            channels as usize,
        )
        .map_err(|e| Error::Resample(format!("Failed to create resampler: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(rate: u32, frames: usize, channels: usize) -> DecodedAudioBuffer {
        let wave: Vec<f32> = (0..frames)
            .map(|i| {
                let t = i as f32 / rate as f32;
                (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
            })
            .collect();
        DecodedAudioBuffer::from_planar(vec![wave; channels], rate).unwrap()
    }

    #[test]
    fn test_resample_same_rate() {
        let input = sine(48000, 100, 2);
        let output = Resampler::resample(&input, 48000).unwrap();

        // Should return copy when already at target rate
        assert_eq!(output, input);
    }

    #[test]
    fn test_resample_speech_to_48k() {
        let input = sine(24000, 2400, 1);
        let output = Resampler::resample(&input, 48000).unwrap();

        assert_eq!(output.sample_rate(), 48000);
        assert_eq!(output.channel_count(), 1);

        // Output should be roughly twice the input length
        let expected = 4800usize;
        let got = output.frame_count();
        assert!(
            got >= expected - expected / 20 && got <= expected + expected / 20,
            "Expected ~{} frames, got {}",
            expected,
            got
        );
    }

    #[test]
    fn test_resample_stereo_keeps_channels_equal() {
        let input = sine(48000, 1000, 2);
        let output = Resampler::resample(&input, 44100).unwrap();

        assert_eq!(output.channel_count(), 2);
        assert_eq!(
            output.channel(0).unwrap().len(),
            output.channel(1).unwrap().len()
        );
    }

    #[test]
    fn test_resample_empty() {
        let input = DecodedAudioBuffer::empty(1, 24000).unwrap();
        let output = Resampler::resample(&input, 44100).unwrap();

        assert!(output.is_empty());
        assert_eq!(output.sample_rate(), 44100);
    }

    #[test]
    fn test_resample_zero_target_rejected() {
        let input = sine(24000, 10, 1);
        assert!(matches!(
            Resampler::resample(&input, 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    fn constant(rate: u32, frames: usize, value: f32) -> DecodedAudioBuffer {
        DecodedAudioBuffer::from_planar(vec![vec![value; frames]], rate).unwrap()
    }

    #[test]
    fn test_expected_frames() {
        assert_eq!(Resampler::expected_frames(2400, 24000, 48000), 4800);
        assert_eq!(Resampler::expected_frames(1, 24000, 44100), 2);
        assert_eq!(Resampler::expected_frames(3, 48000, 16000), 1);
        assert_eq!(Resampler::expected_frames(1, 48000, 16000), 0);
    }

    #[test]
    fn test_resample_tiny_buffers_keep_all_audio() {
        for frames in [1usize, 3, 8] {
            let input = constant(24000, frames, 0.5);

            let doubled = Resampler::resample(&input, 48000).unwrap();
            assert_eq!(doubled.frame_count(), frames * 2, "{} frames at 1:2", frames);

            let eightfold = Resampler::resample(&input, 192000).unwrap();
            assert_eq!(eightfold.frame_count(), frames * 8, "{} frames at 1:8", frames);
        }
    }

    #[test]
    fn test_resample_exact_length_one_to_eight() {
        let input = constant(24000, 2400, 0.5);
        let output = Resampler::resample(&input, 192000).unwrap();

        assert_eq!(output.frame_count(), 19200);
    }

    #[test]
    fn test_resample_constant_body_preserved() {
        let input = constant(24000, 2400, 0.5);
        let output = Resampler::resample(&input, 48000).unwrap();
        let samples = output.channel(0).unwrap();

        for &s in &samples[64..samples.len() - 64] {
            assert!((s - 0.5).abs() < 0.01, "sample {} far from 0.5", s);
        }
    }
}
