//! Audio device output using cpal
//!
//! Opens an output stream on the default (or a named) device at the
//! device's native configuration. `play` appends frames to a queue that the
//! audio callback drains; the callback outputs silence when the queue is
//! empty.

use crate::audio::output::PlaybackSink;
use crate::audio::types::{AudioFrame, DecodedAudioBuffer};
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, warn};

type FrameQueue = Arc<Mutex<VecDeque<AudioFrame>>>;

/// Audio output using cpal.
pub struct DeviceOutput {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
    queue: FrameQueue,
    volume: Arc<Mutex<f32>>,
    /// Set by the stream error callback
    error_flag: Arc<AtomicBool>,
}

impl DeviceOutput {
    /// List available audio output devices.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();

        let devices: Vec<String> = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    /// Open an output device and start its stream.
    ///
    /// # Arguments
    /// - `device_name`: Optional device name (None = default device). An
    ///   unknown name falls back to the default device.
    /// - `volume`: Shared master volume, read by the audio callback on every
    ///   period so later changes apply to audio already queued
    pub fn open(device_name: Option<&str>, volume: Arc<Mutex<f32>>) -> Result<Self> {
        let host = cpal::default_host();

        let device = match device_name {
            Some(name) => {
                let mut devices = host.output_devices().map_err(|e| {
                    Error::AudioOutput(format!("Failed to enumerate devices: {}", e))
                })?;

                match devices.find(|d| d.name().ok().as_deref() == Some(name)) {
                    Some(dev) => {
                        info!("Found requested audio device: {}", name);
                        dev
                    }
                    None => {
                        warn!(
                            "Requested device '{}' not found, falling back to default device",
                            name
                        );
                        host.default_output_device().ok_or_else(|| {
                            Error::AudioOutput(format!(
                                "Device '{}' not found and no default device available",
                                name
                            ))
                        })?
                    }
                }
            }
            None => host
                .default_output_device()
                .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?,
        };

        info!(
            "Using audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported = device
            .default_output_config()
            .map_err(|e| Error::AudioOutput(format!("Failed to get default config: {}", e)))?;
        let sample_format = supported.sample_format();
        let config = supported.config();

        debug!(
            "Audio config: sample_rate={}, channels={}, format={:?}",
            config.sample_rate.0, config.channels, sample_format
        );

        let mut output = Self {
            device,
            config,
            sample_format,
            stream: None,
            queue: Arc::new(Mutex::new(VecDeque::new())),
            volume,
            error_flag: Arc::new(AtomicBool::new(false)),
        };
        output.start()?;

        Ok(output)
    }

    fn start(&mut self) -> Result<()> {
        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32>()?,
            SampleFormat::I16 => self.build_stream::<i16>()?,
            SampleFormat::U16 => self.build_stream::<u16>()?,
            sample_format => {
                return Err(Error::AudioOutput(format!(
                    "Unsupported sample format: {:?}",
                    sample_format
                )));
            }
        };

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;
        self.stream = Some(stream);

        info!("Audio stream started");
        Ok(())
    }

    fn build_stream<T>(&self) -> Result<Stream>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = self.config.channels as usize;
        let queue = Arc::clone(&self.queue);
        let volume = Arc::clone(&self.volume);
        let error_flag = Arc::clone(&self.error_flag);

        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let current_volume = volume.lock().map(|v| *v).unwrap_or(0.0);
                    let mut queue = match queue.lock() {
                        Ok(queue) => queue,
                        Err(_) => {
                            data.fill(T::EQUILIBRIUM);
                            return;
                        }
                    };

                    for frame in data.chunks_mut(channels) {
                        let mut audio_frame = queue.pop_front().unwrap_or_else(AudioFrame::zero);
                        audio_frame.apply_volume(current_volume);
                        audio_frame.clamp();

                        frame[0] = T::from_sample(audio_frame.left);
                        if channels > 1 {
                            frame[1] = T::from_sample(audio_frame.right);
                        }
                        for extra in frame.iter_mut().skip(2) {
                            *extra = T::EQUILIBRIUM;
                        }
                    }
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                    error_flag.store(true, Ordering::SeqCst);
                },
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
    }

    /// Frames queued but not yet played
    pub fn queued_frames(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }

    /// Block until the queue is empty or the stream reports an error
    pub fn wait_until_drained(&self, poll: Duration) -> Result<()> {
        while self.queued_frames() > 0 {
            if self.has_error() {
                return Err(Error::AudioOutput(
                    "Audio stream failed during playback".to_string(),
                ));
            }
            std::thread::sleep(poll);
        }
        Ok(())
    }

    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown".to_string())
    }

    /// Whether the stream error callback has fired
    pub fn has_error(&self) -> bool {
        self.error_flag.load(Ordering::SeqCst)
    }

    /// Stop audio playback and drop anything still queued.
    pub fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            info!("Stopping audio stream");
            stream
                .pause()
                .map_err(|e| Error::AudioOutput(format!("Failed to pause stream: {}", e)))?;
        }
        if let Ok(mut queue) = self.queue.lock() {
            queue.clear();
        }
        Ok(())
    }
}

impl PlaybackSink for DeviceOutput {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn channels(&self) -> u16 {
        self.config.channels
    }

    fn play(&mut self, buffer: &DecodedAudioBuffer) -> Result<()> {
        if buffer.sample_rate() != self.sample_rate() {
            return Err(Error::AudioOutput(format!(
                "device runs at {}Hz, buffer is {}Hz",
                self.sample_rate(),
                buffer.sample_rate()
            )));
        }
        if self.stream.is_none() {
            return Err(Error::AudioOutput("Audio stream is stopped".to_string()));
        }

        let mut queue = self
            .queue
            .lock()
            .map_err(|_| Error::AudioOutput("Frame queue poisoned".to_string()))?;
        queue.extend((0..buffer.frame_count()).filter_map(|i| buffer.frame(i)));

        debug!("Queued {} frames ({} pending)", buffer.frame_count(), queue.len());
        Ok(())
    }
}

impl Drop for DeviceOutput {
    fn drop(&mut self) {
        // Ensure stream is stopped on drop
        let _ = self.stop();
    }
}
