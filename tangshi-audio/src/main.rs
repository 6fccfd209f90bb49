//! tangshi-speak - play or export a poem recitation
//!
//! Reads the speech provider's base64 PCM payload from a file or stdin,
//! decodes it, and plays it on an audio device and/or writes it as a WAV
//! file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tangshi_audio::audio::{strip_whitespace, wav, MemorySink, PlaybackSink};
use tangshi_audio::config::{ConfigOverrides, TomlConfig, APP_NAME};
use tangshi_audio::playback::{SpeechOutcome, SpeechPlayer};
use tangshi_audio::SharedState;
use tangshi_common::config::ConfigResolver;
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for tangshi-speak
#[derive(Parser, Debug)]
#[command(name = "tangshi-speak")]
#[command(about = "Decode and play a base64 PCM poem recitation")]
#[command(version)]
struct Args {
    /// File holding the base64 payload ("-" for stdin)
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Config file (overrides TANGSHI_CONFIG and the per-user config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the decoded audio to this WAV file
    #[arg(short, long)]
    wav: Option<PathBuf>,

    /// Play on an audio device (requires the `device` feature)
    #[arg(short, long)]
    play: bool,

    /// Output device name
    #[arg(long, env = "TANGSHI_DEVICE")]
    device: Option<String>,

    /// Payload sample rate in Hz
    #[arg(long, env = "TANGSHI_SAMPLE_RATE")]
    sample_rate: Option<u32>,

    /// Payload channel count
    #[arg(long, env = "TANGSHI_CHANNELS")]
    channels: Option<u16>,

    /// List output devices and exit (requires the `device` feature)
    #[arg(long)]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(
        args.config.as_deref(),
        ConfigOverrides {
            sample_rate: args.sample_rate,
            channels: args.channels,
            device: args.device.clone(),
        },
    )
    .context("Failed to load configuration")?;

    // Initialize tracing (RUST_LOG wins over the configured level)
    let level = &config.logging.level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("tangshi_audio={level},tangshi_common={level},tangshi_speak={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match ConfigResolver::new(APP_NAME).resolve(args.config.as_deref()) {
        Some((path, source)) => info!("Config: {} ({:?})", path.display(), source),
        None => info!("Config: built-in defaults"),
    }
    info!(
        "Speech format: {} Hz, {} channel(s)",
        config.speech.sample_rate, config.speech.channels
    );

    if args.list_devices {
        for name in list_devices()? {
            println!("{}", name);
        }
        return Ok(());
    }

    let payload = read_payload(&args.input)
        .await
        .with_context(|| format!("Failed to read payload from {}", args.input))?;

    let state = Arc::new(SharedState::new());
    state.set_volume(config.output.volume);

    let outcome = if args.play {
        play_on_device(Arc::clone(&state), &config, &payload).await?
    } else {
        // Dry run: the memory sink keeps the payload's rate unless configured
        let rate = config.output.sample_rate.unwrap_or(config.speech.sample_rate);
        let sink = MemorySink::new(rate, config.speech.channels);
        speak(state, sink, &config, &payload).await?.0
    };

    info!(
        "Decoded {} frames ({} ms), played {} frames at {} Hz",
        outcome.buffer.frame_count(),
        outcome.buffer.duration_ms(),
        outcome.frames_played,
        outcome.played_rate
    );

    if let Some(path) = args.wav.as_deref() {
        export(path, &outcome)?;
    }

    Ok(())
}

async fn read_payload(input: &str) -> Result<String> {
    let raw = if input == "-" {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        text
    } else {
        tokio::fs::read_to_string(input).await?
    };

    Ok(strip_whitespace(&raw))
}

async fn speak<S: PlaybackSink>(
    state: Arc<SharedState>,
    sink: S,
    config: &TomlConfig,
    payload: &str,
) -> Result<(SpeechOutcome, S)> {
    let mut player = SpeechPlayer::new(state, sink, config.speech);
    let outcome = player
        .speak(payload)
        .await
        .context("Speech playback failed")?;
    Ok((outcome, player.into_sink()))
}

#[cfg(feature = "device")]
async fn play_on_device(
    state: Arc<SharedState>,
    config: &TomlConfig,
    payload: &str,
) -> Result<SpeechOutcome> {
    use std::time::Duration;
    use tangshi_audio::audio::DeviceOutput;

    let device = DeviceOutput::open(config.output.device.as_deref(), state.get_volume_arc())
        .context("Failed to open audio device")?;
    info!("Playing on {}", device.device_name());

    let (outcome, device) = speak(state, device, config, payload).await?;
    device
        .wait_until_drained(Duration::from_millis(50))
        .context("Playback did not finish")?;

    Ok(outcome)
}

#[cfg(not(feature = "device"))]
async fn play_on_device(
    _state: Arc<SharedState>,
    _config: &TomlConfig,
    _payload: &str,
) -> Result<SpeechOutcome> {
    anyhow::bail!("--play needs tangshi-speak built with the `device` feature")
}

#[cfg(feature = "device")]
fn list_devices() -> Result<Vec<String>> {
    tangshi_audio::audio::DeviceOutput::list_devices().context("Failed to list audio devices")
}

#[cfg(not(feature = "device"))]
fn list_devices() -> Result<Vec<String>> {
    anyhow::bail!("--list-devices needs tangshi-speak built with the `device` feature")
}

fn export(path: &Path, outcome: &SpeechOutcome) -> Result<()> {
    wav::write_wav(path, &outcome.buffer)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Saved recitation to {}", path.display());
    Ok(())
}
