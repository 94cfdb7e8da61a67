//! Integration tests for the device playback engine on a simulated device.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use splice_audio::{
    ClockControl, DevicePlayer, PlayerConfig, PresentationClock, ToneSource, VirtualDevice,
};
use splice_core::{ns_to_frame, AudioFrame, AudioSource, AudioSourceRef, Rational, Result};
use splice_workspace::{AudioWorkspace, Item};

const MS: i64 = 1_000_000;

fn config() -> PlayerConfig {
    PlayerConfig {
        device: "virtual".into(),
        sample_rate: Some(8_000),
        channels: Some(1),
        period_frames: 128,
        buffer_frames: 512,
    }
}

fn tone() -> ToneSource {
    ToneSource::new(250.0, 0.5, 8_000)
}

/// Writes each sample's own index. Once armed, the next pull sleeps for
/// `stall` before returning.
struct Sluggish {
    stall: Duration,
    armed: AtomicBool,
    stalling: AtomicBool,
    /// First sample of the pull that stalled.
    stalled_at: AtomicI64,
}

impl Sluggish {
    fn new(stall: Duration) -> Arc<Self> {
        Arc::new(Self {
            stall,
            armed: AtomicBool::new(false),
            stalling: AtomicBool::new(false),
            stalled_at: AtomicI64::new(i64::MIN),
        })
    }

    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    fn wait_until_stalling(&self) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !self.stalling.load(Ordering::SeqCst) {
            assert!(Instant::now() < deadline, "source was never pulled");
            thread::sleep(Duration::from_millis(1));
        }
    }
}

impl AudioSource for Sluggish {
    fn get_frame(&self, frame: &mut AudioFrame) -> Result<()> {
        let range = frame.full;
        let channels = frame.channels();
        for (i, chunk) in frame.samples_mut(range).chunks_exact_mut(channels).enumerate() {
            chunk.fill((range.min + i as i64) as f32);
        }
        frame.current = range;

        if self.armed.swap(false, Ordering::SeqCst) {
            self.stalled_at.store(range.min, Ordering::SeqCst);
            self.stalling.store(true, Ordering::SeqCst);
            thread::sleep(self.stall);
            self.stalling.store(false, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[test]
fn first_block_reaches_the_device_unchanged() {
    let mut device = VirtualDevice::new("virtual", 512).unwrap();
    let tap = device.capture_tap();
    let source: AudioSourceRef = Arc::new(tone());
    let player = DevicePlayer::new(device, Some(source), &config()).unwrap();

    player.play(Rational::ONE);
    thread::sleep(Duration::from_millis(300));
    player.stop();

    let captured = tap.lock().clone();
    assert!(captured.len() >= 128, "captured {} samples", captured.len());
    let reference = tone();
    for (k, &s) in captured.iter().take(128).enumerate() {
        assert_eq!(s, reference.value_at(k as i64), "sample {k}");
    }
}

#[test]
fn presentation_time_follows_the_device() {
    let device = VirtualDevice::new("virtual", 512).unwrap();
    let player = DevicePlayer::new(device, Some(Arc::new(tone())), &config()).unwrap();

    player.play(Rational::ONE);
    thread::sleep(Duration::from_millis(300));
    let t = player.presentation_time();
    assert!(t > 100 * MS && t < 700 * MS, "presentation time {t}");
    assert_eq!(player.speed(), Rational::ONE);
}

#[test]
fn stop_freezes_presentation_time() {
    let device = VirtualDevice::new("virtual", 512).unwrap();
    let player = DevicePlayer::new(device, Some(Arc::new(tone())), &config()).unwrap();

    player.play(Rational::ONE);
    thread::sleep(Duration::from_millis(100));
    player.stop();

    let first = player.presentation_time();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(player.presentation_time(), first);
    assert!(!player.is_playing());
}

#[test]
fn double_speed_advances_twice_as_fast() {
    let device = VirtualDevice::new("virtual", 512).unwrap();
    let player = DevicePlayer::new(device, Some(Arc::new(tone())), &config()).unwrap();

    player.play(Rational::new(2, 1));
    thread::sleep(Duration::from_millis(300));
    let t = player.presentation_time();
    assert!(t > 300 * MS && t < 1_400 * MS, "presentation time {t}");
}

#[test]
fn reverse_playback_runs_backwards() {
    let device = VirtualDevice::new("virtual", 512).unwrap();
    let player = DevicePlayer::new(device, Some(Arc::new(tone())), &config()).unwrap();

    player.seek(2_000 * MS);
    player.play(Rational::new(-1, 1));
    thread::sleep(Duration::from_millis(200));
    let t = player.presentation_time();
    assert!(t < 2_000 * MS && t > 1_400 * MS, "presentation time {t}");
}

#[test]
fn plays_a_workspace() {
    let workspace = Arc::new(AudioWorkspace::new());
    workspace
        .add(Item::new(Arc::new(tone()) as AudioSourceRef, 0, 8_000))
        .unwrap();

    let mut device = VirtualDevice::new("virtual", 512).unwrap();
    let tap = device.capture_tap();
    let player = DevicePlayer::new(device, Some(workspace), &config()).unwrap();

    player.play(Rational::ONE);
    thread::sleep(Duration::from_millis(200));
    player.stop();

    let captured = tap.lock().clone();
    let reference = tone();
    assert!(captured.len() >= 128);
    assert_eq!(captured[7], reference.value_at(7));
}

#[test]
fn drop_while_playing_joins_the_thread() {
    let device = VirtualDevice::new("virtual", 512).unwrap();
    let player = DevicePlayer::new(device, Some(Arc::new(tone())), &config()).unwrap();
    player.play(Rational::ONE);
    thread::sleep(Duration::from_millis(30));
    drop(player);
}

#[test]
fn recovers_from_an_underrun_and_keeps_playing() {
    // The device holds 64 ms; a 150 ms pull runs it dry.
    let source = Sluggish::new(Duration::from_millis(150));
    let mut device = VirtualDevice::new("virtual", 512).unwrap();
    let tap = device.capture_tap();
    let player =
        DevicePlayer::new(device, Some(source.clone() as AudioSourceRef), &config()).unwrap();

    player.play(Rational::ONE);
    thread::sleep(Duration::from_millis(100));
    source.arm();
    source.wait_until_stalling();
    thread::sleep(Duration::from_millis(350));

    assert!(player.is_playing());
    let before = tap.lock().len();
    thread::sleep(Duration::from_millis(100));
    let after = tap.lock().len();
    assert!(after > before, "capture stalled at {before} samples");

    player.stop();
    let t = player.presentation_time();
    assert!(t > 250 * MS && t < 800 * MS, "presentation time {t}");

    // Output resumed from the clock, so what played last is what the clock
    // reports as playing.
    let last = *tap.lock().last().unwrap() as i64;
    let position = ns_to_frame(Rational::from_integer(8_000), t);
    assert!((position - last).abs() < 800, "played {last}, clock at {position}");
}

#[test]
fn seek_during_a_slow_pull_discards_the_stale_block() {
    let source = Sluggish::new(Duration::from_millis(100));
    let mut device = VirtualDevice::new("virtual", 512).unwrap();
    let tap = device.capture_tap();
    let player =
        DevicePlayer::new(device, Some(source.clone() as AudioSourceRef), &config()).unwrap();

    player.play(Rational::ONE);
    thread::sleep(Duration::from_millis(100));
    source.arm();
    source.wait_until_stalling();
    player.seek(10_000 * MS);
    thread::sleep(Duration::from_millis(300));
    player.stop();

    let stale = source.stalled_at.load(Ordering::SeqCst);
    assert!(stale >= 0);
    let captured = tap.lock().clone();
    assert!(
        captured.iter().all(|&s| (s as i64) < stale || s as i64 >= 80_000),
        "stale block starting at {stale} was played"
    );
    assert!(captured.iter().any(|&s| s as i64 >= 80_000), "never played past the seek");
}
