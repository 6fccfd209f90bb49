//! Audio subsystem
//!
//! Speech payload decoding, buffer types, resampling, playback sinks and
//! WAV export.

pub mod output;
pub mod payload;
pub mod pcm;
pub mod resampler;
pub mod types;
pub mod wav;

#[cfg(feature = "device")]
pub mod device;

pub use output::{MemorySink, PlaybackSink};
pub use payload::{decode_base64, strip_whitespace};
pub use pcm::{decode_audio, decode_base64_audio, PcmFormat};
pub use resampler::Resampler;
pub use types::{AudioFrame, DecodedAudioBuffer};

#[cfg(feature = "device")]
pub use device::DeviceOutput;
