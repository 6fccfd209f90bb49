//! Core audio data types
//!
//! Defines the decoded buffer and the stereo frame used by the output
//! stage.

use crate::error::{Error, Result};

/// DecodedAudioBuffer holds normalized planar audio ready for playback.
///
/// **Format:**
/// - Samples are f32, normalized to [-1.0, 1.0]
/// - Planar: one `Vec<f32>` per channel, all of equal length
/// - `sample_rate` is the nominal rate the samples were produced at; the
///   buffer itself never resamples
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudioBuffer {
    /// One sample array per channel
    channels: Vec<Vec<f32>>,

    /// Nominal sample rate in Hz
    sample_rate: u32,
}

impl DecodedAudioBuffer {
    /// Build a buffer from planar channel data
    ///
    /// # Errors
    /// `InvalidArgument` if there are no channels, the sample rate is zero,
    /// or the channels differ in length.
    pub fn from_planar(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidArgument(
                "sample rate must be positive".to_string(),
            ));
        }
        if channels.is_empty() {
            return Err(Error::InvalidArgument(
                "buffer needs at least one channel".to_string(),
            ));
        }
        if channels.len() > u16::MAX as usize {
            return Err(Error::InvalidArgument(format!(
                "too many channels: {}",
                channels.len()
            )));
        }

        let frames = channels[0].len();
        if let Some((idx, ch)) = channels.iter().enumerate().find(|(_, ch)| ch.len() != frames) {
            return Err(Error::InvalidArgument(format!(
                "channel {} has {} frames, expected {}",
                idx,
                ch.len(),
                frames
            )));
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Create a zero-length buffer
    pub fn empty(channel_count: u16, sample_rate: u32) -> Result<Self> {
        Self::from_planar(vec![Vec::new(); channel_count as usize], sample_rate)
    }

    /// Nominal sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    /// Number of frames (samples per channel)
    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    /// Sample data for one channel
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// All channels, planar
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Get duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        (self.frame_count() as u64 * 1000) / self.sample_rate as u64
    }

    /// Get duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.frame_count() as f32 / self.sample_rate as f32
    }

    /// Get the stereo output frame at a frame index
    ///
    /// Mono is duplicated to both sides; channels past the second are
    /// ignored.
    pub fn frame(&self, frame_index: usize) -> Option<AudioFrame> {
        match self.channels.as_slice() {
            [mono] => mono.get(frame_index).map(|&s| AudioFrame::from_mono(s)),
            [left, right, ..] => Some(AudioFrame::from_stereo(
                *left.get(frame_index)?,
                *right.get(frame_index)?,
            )),
            [] => None,
        }
    }

    /// Interleave channels: [c0, c1, ..., c0, c1, ...]
    pub fn interleaved(&self) -> Vec<f32> {
        let num_channels = self.channels.len();
        let num_frames = self.frame_count();
        let mut interleaved = Vec::with_capacity(num_frames * num_channels);

        for frame_idx in 0..num_frames {
            for channel in &self.channels {
                interleaved.push(channel[frame_idx]);
            }
        }

        interleaved
    }
}

/// AudioFrame represents a single stereo sample (one frame of audio).
///
/// Used for passing audio data to the output device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFrame {
    /// Left channel sample
    pub left: f32,

    /// Right channel sample
    pub right: f32,
}

impl AudioFrame {
    /// Create a silent frame (0.0, 0.0)
    pub fn zero() -> Self {
        AudioFrame { left: 0.0, right: 0.0 }
    }

    /// Create a frame from mono sample (duplicate to both channels)
    pub fn from_mono(sample: f32) -> Self {
        AudioFrame { left: sample, right: sample }
    }

    /// Create a frame from left and right samples
    pub fn from_stereo(left: f32, right: f32) -> Self {
        AudioFrame { left, right }
    }

    /// Apply volume scaling to both channels
    pub fn apply_volume(&mut self, volume: f32) {
        self.left *= volume;
        self.right *= volume;
    }

    /// Clamp samples to valid range [-1.0, 1.0] to prevent clipping
    pub fn clamp(&mut self) {
        self.left = self.left.clamp(-1.0, 1.0);
        self.right = self.right.clamp(-1.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_from_planar() {
        let buffer =
            DecodedAudioBuffer::from_planar(vec![vec![0.5, 0.25], vec![-0.5, -0.25]], 24000)
                .unwrap();

        assert_eq!(buffer.sample_rate(), 24000);
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frame_count(), 2);
        assert_eq!(buffer.channel(1), Some(&[-0.5, -0.25][..]));
        assert!(buffer.channel(2).is_none());
    }

    #[test]
    fn test_buffer_rejects_unequal_channels() {
        let result = DecodedAudioBuffer::from_planar(vec![vec![0.0; 3], vec![0.0; 2]], 24000);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_buffer_rejects_bad_shape() {
        assert!(matches!(
            DecodedAudioBuffer::from_planar(vec![], 24000),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            DecodedAudioBuffer::from_planar(vec![vec![0.0]], 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_buffer_duration() {
        // 24000 frames = 1 second at 24kHz
        let buffer = DecodedAudioBuffer::from_planar(vec![vec![0.0; 24000]], 24000).unwrap();
        assert_eq!(buffer.duration_ms(), 1000);
        assert_eq!(buffer.duration_seconds(), 1.0);

        let half = DecodedAudioBuffer::from_planar(vec![vec![0.0; 12000]], 24000).unwrap();
        assert_eq!(half.duration_ms(), 500);
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = DecodedAudioBuffer::empty(2, 48000).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.duration_ms(), 0);
        assert!(buffer.frame(0).is_none());
        assert!(buffer.interleaved().is_empty());
    }

    #[test]
    fn test_frame_mono_duplicates() {
        let buffer = DecodedAudioBuffer::from_planar(vec![vec![0.1, 0.2]], 24000).unwrap();

        assert_eq!(buffer.frame(1), Some(AudioFrame::from_mono(0.2)));
        assert!(buffer.frame(2).is_none());
    }

    #[test]
    fn test_frame_multichannel_uses_first_two() {
        let buffer = DecodedAudioBuffer::from_planar(
            vec![vec![0.1, 0.4], vec![0.2, 0.5], vec![0.3, 0.6]],
            48000,
        )
        .unwrap();

        let frame = buffer.frame(1).unwrap();
        assert_eq!(frame.left, 0.4);
        assert_eq!(frame.right, 0.5);
    }

    #[test]
    fn test_interleaved() {
        let buffer =
            DecodedAudioBuffer::from_planar(vec![vec![1.0, 3.0, 5.0], vec![2.0, 4.0, 6.0]], 48000)
                .unwrap();

        assert_eq!(buffer.interleaved(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_audio_frame_apply_volume() {
        let mut frame = AudioFrame::from_stereo(0.5, -0.5);
        frame.apply_volume(0.5);
        assert_eq!(frame.left, 0.25);
        assert_eq!(frame.right, -0.25);
    }

    #[test]
    fn test_audio_frame_clamp() {
        let mut frame = AudioFrame::from_stereo(1.5, -1.5);
        frame.clamp();
        assert_eq!(frame, AudioFrame::from_stereo(1.0, -1.0));
        assert_eq!(AudioFrame::zero(), AudioFrame::from_mono(0.0));
    }
}
