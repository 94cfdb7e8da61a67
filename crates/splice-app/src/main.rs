//! Splice - playback demo
//!
//! Builds a small audio workspace and a video workspace, plays the audio
//! through a device, and renders video frames in sync with the player's
//! presentation clock while stepping through a few play speeds.
//!
//! Usage: `splice [config.json]`

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use splice_audio::{
    ClockControl, DevicePlayer, PlaybackDevice, PlayerConfig, PresentationClock, ToneSource,
};
use splice_core::{
    ns_to_frame, AudioSourceRef, Box2i, KeyframeFunction, Param, Rational, Rgba, VideoFrame,
    VideoSource, VideoSourceRef,
};
use splice_video::{SolidColorSource, VideoMixFilter};
use splice_workspace::{AudioWorkspace, Item, VideoWorkspace};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const VIDEO_RATE: Rational = Rational::from_integer(25);

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match std::env::args().nth(1) {
        Some(path) => PlayerConfig::from_json_file(&path)
            .with_context(|| format!("loading player config from {path}"))?,
        None => PlayerConfig::default(),
    };
    info!(?config, "Splice starting...");

    #[cfg(feature = "cpal")]
    let device = splice_audio::CpalDevice::open(&config.device, config.buffer_frames)?;
    #[cfg(not(feature = "cpal"))]
    let device = splice_audio::VirtualDevice::new(&config.device, config.buffer_frames)?;

    run(device, &config)
}

/// Two overlapping tones: A for the first two seconds, B from one to three.
fn build_audio(sample_rate: u32) -> Result<AudioWorkspace> {
    let rate = i64::from(sample_rate);
    let workspace = AudioWorkspace::new();
    let a: AudioSourceRef = Arc::new(ToneSource::new(440.0, 0.2, sample_rate));
    let b: AudioSourceRef = Arc::new(ToneSource::new(660.0, 0.2, sample_rate));
    workspace.add(Item::new(a, 0, 2 * rate))?;
    workspace.add(Item::new(b, rate, 2 * rate).with_z(1))?;
    Ok(workspace)
}

/// A black background under a red-to-blue crossfade that runs for three seconds.
fn build_video() -> Result<VideoWorkspace> {
    let workspace = VideoWorkspace::new();
    let background: VideoSourceRef = Arc::new(SolidColorSource::new(Param::color(Rgba::BLACK)));

    let fade = KeyframeFunction::ramp(0, 0.0, 75, 1.0);
    let red: VideoSourceRef = Arc::new(SolidColorSource::new(Param::color(Rgba::rgb(1.0, 0.0, 0.0))));
    let blue: VideoSourceRef = Arc::new(
        SolidColorSource::new(Param::color(Rgba::rgb(0.0, 0.0, 1.0)))
            .with_window(Param::window(Box2i::new(16, 9, 47, 26))),
    );
    let mix: VideoSourceRef =
        Arc::new(VideoMixFilter::crossfade(red, blue, Param::function(Arc::new(fade))));

    workspace.add(Item::new(background, 0, 100))?;
    workspace.add(Item::new(mix, 0, 100).with_z(1))?;
    Ok(workspace)
}

fn run<D: PlaybackDevice>(device: D, config: &PlayerConfig) -> Result<()> {
    let player = DevicePlayer::new(device, None, config)?;
    let negotiated = player.device_config();
    player.set_source(Some(Arc::new(build_audio(negotiated.sample_rate)?)));
    let video = build_video()?;

    let steps = [
        (Rational::ONE, 1_000),
        (Rational::new(2, 1), 500),
        (Rational::new(1, 2), 500),
        (Rational::new(-1, 1), 500),
    ];

    let mut frame = VideoFrame::new(Box2i::from_size(64, 36));
    for (speed, millis) in steps {
        player.play(speed);
        info!(%speed, "playing");
        for _ in 0..millis / 100 {
            thread::sleep(Duration::from_millis(100));
            let time = player.presentation_time();
            let index = ns_to_frame(VIDEO_RATE, time);
            video.get_frame(index, &mut frame)?;
            let center = frame.pixel(32, 18);
            info!(
                time_ms = time / 1_000_000,
                frame = index,
                r = center.r,
                g = center.g,
                b = center.b,
                "presented"
            );
        }
    }

    player.stop();
    info!(time_ms = player.presentation_time() / 1_000_000, "stopped");
    Ok(())
}
