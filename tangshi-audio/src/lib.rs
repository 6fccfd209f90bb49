//! # Tangshi Speech Audio Library (tangshi-audio)
//!
//! Decode-then-play path for poem recitations.
//!
//! **Purpose:** Turn the speech provider's base64 payload (headerless
//! little-endian 16-bit PCM) into a planar f32 buffer, bring it to the
//! output rate, and hand it to a playback sink. Decoded buffers can also be
//! exported as WAV files.
//!
//! **Architecture:** base64 → PCM decoder → rubato resampler → sink
//! (cpal device or in-memory), with each speak request tracked by the
//! shared action lifecycle from `tangshi-common`.

pub mod audio;
pub mod config;
pub mod error;
pub mod playback;
pub mod state;

pub use audio::{decode_audio, decode_base64, decode_base64_audio, DecodedAudioBuffer, PcmFormat};
pub use error::{Error, Result};
pub use state::SharedState;
