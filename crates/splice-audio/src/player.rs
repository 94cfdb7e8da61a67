//! Device playback engine.
//!
//! A [`DevicePlayer`] owns a background thread that pulls audio from a
//! source graph, converts it for the current play speed, and writes it to a
//! [`PlaybackDevice`]. It is also the presentation clock for everything
//! that plays in sync with it, and re-anchors that clock from the device's
//! own position after every write so reported time includes output latency.
//!
//! Two locks are involved. The state lock guards the clock, the stop/quit
//! flags, the render cursor and the source; it is never held across a pull
//! or a device call. The device lock guards the device and its negotiated
//! configuration and is held across writes. When both are needed the device
//! lock is taken first.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use splice_core::{
    frame_to_ns, ns_to_frame, AudioFrame, AudioSourceRef, Rational, Result, SpliceError,
};
use tracing::{debug, error, info, trace, warn};

use crate::clock::{monotonic_ns, ClockControl, ClockState, PresentationClock};
use crate::config::PlayerConfig;
use crate::device::{DeviceConfig, DeviceState, PlaybackDevice, WriteError};
use crate::mix;
use crate::resample;

// ── Shared state ────────────────────────────────────────────────

struct Shared {
    clock: ClockState,
    /// First source sample of the next block (last sample when reversing).
    next_sample: i64,
    quit: bool,
    /// Bumped by every control call so an in-flight cycle can tell its
    /// cursor went stale.
    epoch: u64,
    sample_rate: u32,
    channels: u16,
    source: Option<AudioSourceRef>,
}

impl Shared {
    #[inline]
    fn rate(&self) -> Rational {
        Rational::from_integer(self.sample_rate as i64)
    }

    /// Park the clock and cursor on the sample boundary at or before `time`.
    fn snap_to(&mut self, time: i64) {
        let rate = self.rate();
        self.next_sample = ns_to_frame(rate, time);
        self.clock.seek_time = frame_to_ns(rate, self.next_sample);
    }
}

struct Inner<D> {
    state: Mutex<Shared>,
    wake: Condvar,
    device: Mutex<D>,
    period_frames: usize,
}

/// Where the playback thread is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaybackState {
    /// Stopped; parked on the condition variable.
    Waiting,
    /// Priming the device before streaming.
    Preparing,
    Streaming,
    /// Quit was requested; the thread is exiting.
    Terminated,
}

// ── Player ──────────────────────────────────────────────────────

/// Real-time audio player and presentation clock.
///
/// Starts stopped at time zero. Dropping the player stops the thread and
/// waits for it to exit.
pub struct DevicePlayer<D: PlaybackDevice> {
    inner: Arc<Inner<D>>,
    thread: Option<JoinHandle<()>>,
}

impl<D: PlaybackDevice> DevicePlayer<D> {
    /// Negotiate `device` per `config` and start the playback thread.
    ///
    /// Negotiation failures are returned here; the thread is only started
    /// once the device is configured.
    pub fn new(mut device: D, source: Option<AudioSourceRef>, config: &PlayerConfig) -> Result<Self> {
        config.validate()?;

        let preferred = device.config();
        let negotiated = device.configure(
            config.sample_rate.unwrap_or(preferred.sample_rate),
            config.channels.unwrap_or(preferred.channels),
        )?;
        if negotiated.buffer_frames < config.period_frames {
            return Err(SpliceError::Negotiation {
                parameter: "buffer size".into(),
                reason: format!(
                    "device buffer of {} frames can't hold a {}-frame period",
                    negotiated.buffer_frames, config.period_frames
                ),
            });
        }
        info!(
            device = device.name(),
            sample_rate = negotiated.sample_rate,
            channels = negotiated.channels,
            buffer_frames = negotiated.buffer_frames,
            "playback device negotiated"
        );

        let now = monotonic_ns();
        let rate = Rational::from_integer(negotiated.sample_rate as i64);
        let inner = Arc::new(Inner {
            state: Mutex::new(Shared {
                clock: ClockState::stopped_at(frame_to_ns(rate, 0), now),
                next_sample: 0,
                quit: false,
                epoch: 0,
                sample_rate: negotiated.sample_rate,
                channels: negotiated.channels,
                source,
            }),
            wake: Condvar::new(),
            device: Mutex::new(device),
            period_frames: config.period_frames,
        });

        let worker = Arc::clone(&inner);
        let thread = thread::Builder::new()
            .name("splice-playback".into())
            .spawn(move || worker.run())?;

        Ok(Self {
            inner,
            thread: Some(thread),
        })
    }

    /// Negotiated device configuration.
    pub fn device_config(&self) -> DeviceConfig {
        self.inner.device.lock().config()
    }

    /// Renegotiate the device. `None` keeps the currently negotiated value.
    /// Returns the negotiated `(sample_rate, channels)`.
    ///
    /// Serialized with in-flight writes; the presentation time is kept
    /// across the change.
    pub fn set_config(&self, sample_rate: Option<u32>, channels: Option<u16>) -> Result<(u32, u16)> {
        let mut device = self.inner.device.lock();
        let current = device.config();
        let negotiated = device.configure(
            sample_rate.unwrap_or(current.sample_rate),
            channels.unwrap_or(current.channels),
        )?;

        let mut state = self.inner.state.lock();
        let time = state.clock.presentation_time(monotonic_ns());
        state.sample_rate = negotiated.sample_rate;
        state.channels = negotiated.channels;
        state.clock.base_time = monotonic_ns();
        state.snap_to(time);
        state.epoch += 1;

        info!(
            sample_rate = negotiated.sample_rate,
            channels = negotiated.channels,
            "playback device reconfigured"
        );
        Ok((negotiated.sample_rate, negotiated.channels))
    }

    /// Replace the audio graph. The next cycle pulls from the new source.
    pub fn set_source(&self, source: Option<AudioSourceRef>) {
        let mut state = self.inner.state.lock();
        state.source = source;
    }

    pub fn is_playing(&self) -> bool {
        !self.inner.state.lock().clock.stopped
    }

    /// Snapshot of the clock fields.
    pub fn clock_state(&self) -> ClockState {
        self.inner.state.lock().clock
    }
}

impl<D: PlaybackDevice> PresentationClock for DevicePlayer<D> {
    fn presentation_time(&self) -> i64 {
        let clock = self.inner.state.lock().clock;
        clock.presentation_time(monotonic_ns())
    }

    fn speed(&self) -> Rational {
        self.inner.state.lock().clock.speed
    }
}

impl<D: PlaybackDevice> ClockControl for DevicePlayer<D> {
    /// A zero speed leaves the player stopped at `time`; any other speed
    /// starts it.
    fn set(&self, speed: Rational, time: i64) {
        let mut state = self.inner.state.lock();
        state.clock.base_time = monotonic_ns();
        state.clock.speed = speed;
        state.clock.stopped = speed.is_zero();
        state.snap_to(time);
        state.epoch += 1;
        if !state.clock.stopped {
            self.inner.wake.notify_all();
        }
        debug!(speed = %speed, time = state.clock.seek_time, "player set");
    }

    fn seek(&self, time: i64) {
        let mut state = self.inner.state.lock();
        state.clock.base_time = monotonic_ns();
        state.snap_to(time);
        state.epoch += 1;
    }

    /// Playing at zero speed is the same as [`stop`](ClockControl::stop).
    fn play(&self, speed: Rational) {
        if speed.is_zero() {
            self.stop();
            return;
        }
        let mut state = self.inner.state.lock();
        let now = monotonic_ns();
        let time = state.clock.presentation_time(now);
        state.snap_to(time);
        state.clock.base_time = now;
        state.clock.speed = speed;
        state.clock.stopped = false;
        state.epoch += 1;
        self.inner.wake.notify_all();
        info!(speed = %speed, time = state.clock.seek_time, "playback started");
    }

    fn stop(&self) {
        let mut state = self.inner.state.lock();
        let now = monotonic_ns();
        let time = state.clock.presentation_time(now);
        state.clock.base_time = now;
        state.clock.speed = Rational::ZERO;
        state.clock.stopped = true;
        state.snap_to(time);
        state.epoch += 1;
        info!(time = state.clock.seek_time, "playback stopped");
    }
}

impl<D: PlaybackDevice> Drop for DevicePlayer<D> {
    fn drop(&mut self) {
        {
            let mut state = self.inner.state.lock();
            state.quit = true;
            self.inner.wake.notify_all();
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("playback thread panicked");
            }
        }
    }
}

// ── Playback thread ─────────────────────────────────────────────

/// One block planned under the state lock.
struct Block {
    cursor: i64,
    epoch: u64,
    speed: Rational,
    rate: Rational,
    channels: usize,
    source: Option<AudioSourceRef>,
}

/// Per-thread scratch buffers, reused across cycles.
#[derive(Default)]
struct Scratch {
    frame: Option<AudioFrame>,
    out: Vec<f32>,
}

impl<D: PlaybackDevice> Inner<D> {
    fn run(&self) {
        info!(period_frames = self.period_frames, "playback thread started");
        let mut scratch = Scratch::default();
        let mut playback = PlaybackState::Waiting;

        loop {
            playback = match playback {
                PlaybackState::Waiting => self.wait_for_play(),
                PlaybackState::Preparing => self.prepare(),
                PlaybackState::Streaming => self.stream_block(&mut scratch),
                PlaybackState::Terminated => break,
            };
        }

        self.device.lock().drop_pending();
        info!("playback thread exited");
    }

    /// Drop whatever the device still holds and sleep until play or quit.
    fn wait_for_play(&self) -> PlaybackState {
        self.device.lock().drop_pending();

        let mut state = self.state.lock();
        while !state.quit && state.clock.stopped {
            self.wake.wait(&mut state);
        }
        if state.quit {
            PlaybackState::Terminated
        } else {
            PlaybackState::Preparing
        }
    }

    fn prepare(&self) -> PlaybackState {
        let mut device = self.device.lock();
        let current = device.state();
        match current {
            DeviceState::Setup | DeviceState::Underrun => {
                if let Err(e) = device.prepare() {
                    error!(error = %e, "failed to prepare playback device");
                    drop(device);
                    thread::sleep(Duration::from_millis(10));
                    return self.after_device_error();
                }
                debug!("playback device prepared");
            }
            DeviceState::Prepared | DeviceState::Running => {}
        }
        PlaybackState::Streaming
    }

    /// Where to go when the device misbehaved: keep trying unless told to stop.
    fn after_device_error(&self) -> PlaybackState {
        let state = self.state.lock();
        if state.quit {
            PlaybackState::Terminated
        } else if state.clock.stopped {
            PlaybackState::Waiting
        } else {
            PlaybackState::Preparing
        }
    }

    /// Plan, pull, convert and write one period.
    fn stream_block(&self, scratch: &mut Scratch) -> PlaybackState {
        let Some(block) = self.plan_block() else {
            return self.after_device_error();
        };

        let len = resample::source_len(self.period_frames, block.speed);
        let range = resample::source_range(block.cursor, len, block.speed);

        let frame = match scratch.frame.take() {
            Some(mut f) if f.channels() == block.channels && f.full.len() == len => {
                f.shift(range.min - f.full.min);
                f.clear_current();
                f
            }
            _ => AudioFrame::new(range, block.channels),
        };
        let mut frame = frame;

        if let Some(source) = &block.source {
            if let Err(e) = mix::pull_shifted(source.as_ref(), &mut frame, 0) {
                warn!(error = %e, "audio source failed; playing silence");
                frame.clear_current();
            }
        }

        scratch.out.resize(self.period_frames * block.channels, 0.0);
        resample::resample(&frame, block.speed, &mut scratch.out);
        scratch.frame = Some(frame);

        self.write_block(&block, &scratch.out)
    }

    /// Reserve the next block under the state lock.
    fn plan_block(&self) -> Option<Block> {
        let mut state = self.state.lock();
        if state.quit || state.clock.stopped {
            return None;
        }

        let speed = state.clock.speed;
        let len = resample::source_len(self.period_frames, speed) as i64;
        let cursor = state.next_sample;
        if speed.is_negative() {
            state.next_sample -= len;
        } else {
            state.next_sample += len;
        }

        trace!(cursor, len, "planned block");
        Some(Block {
            cursor,
            epoch: state.epoch,
            speed,
            rate: state.rate(),
            channels: state.channels as usize,
            source: state.source.clone(),
        })
    }

    fn write_block(&self, block: &Block, out: &[f32]) -> PlaybackState {
        let mut written = 0;
        let total = out.len() / block.channels;

        while written < total {
            let mut device = self.device.lock();

            // Re-anchor the clock from the hardware position, unless a control
            // call invalidated this block while it was being rendered.
            {
                let mut state = self.state.lock();
                if state.quit || state.clock.stopped || state.epoch != block.epoch {
                    trace!("abandoning stale block");
                    return self.after_device_error_locked(&state);
                }
                if device.config().channels as usize != block.channels {
                    return PlaybackState::Streaming;
                }

                let ts = device.timestamp();
                let queued = device.config().buffer_frames.saturating_sub(ts.avail_frames);
                let position = block.cursor + block.speed.scale(written as i64)
                    - block.speed.scale(queued as i64);
                state.clock.base_time = ts.time_ns;
                state.clock.seek_time = frame_to_ns(block.rate, position);
            }

            if device.state() == DeviceState::Setup {
                if let Err(e) = device.prepare() {
                    error!(error = %e, "failed to prepare playback device");
                    return PlaybackState::Preparing;
                }
            }

            let result = device.write(&out[written * block.channels..]);
            match result {
                Ok(n) => written += n,
                Err(WriteError::WouldBlock) => {
                    drop(device);
                    thread::sleep(self.retry_delay(block.rate));
                }
                Err(WriteError::Underrun) => {
                    warn!("playback underrun");
                    if let Err(e) = device.prepare() {
                        error!(error = %e, "failed to re-prime playback device");
                    }
                    drop(device);
                    self.resync_after_underrun(block.epoch);
                    return PlaybackState::Streaming;
                }
                Err(WriteError::Device(e)) => {
                    error!(error = %e, "playback device write failed");
                    drop(device);
                    thread::sleep(Duration::from_millis(10));
                    return self.after_device_error();
                }
            }
        }

        PlaybackState::Streaming
    }

    fn after_device_error_locked(&self, state: &Shared) -> PlaybackState {
        if state.quit {
            PlaybackState::Terminated
        } else if state.clock.stopped {
            PlaybackState::Waiting
        } else {
            PlaybackState::Streaming
        }
    }

    /// Restart rendering from the authoritative presentation time rather
    /// than the cursor the lost blocks were predicted from.
    fn resync_after_underrun(&self, epoch: u64) {
        let mut state = self.state.lock();
        if state.epoch != epoch {
            return;
        }
        let now = monotonic_ns();
        let time = state.clock.presentation_time(now);
        state.clock.base_time = now;
        state.snap_to(time);
        debug!(next_sample = state.next_sample, "resynchronized after underrun");
    }

    /// A quarter of a period, so a full buffer is re-checked several times
    /// per period of playback.
    fn retry_delay(&self, rate: Rational) -> Duration {
        let period_ns = frame_to_ns(rate, self.period_frames as i64);
        Duration::from_nanos((period_ns / 4).max(100_000) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tone::ToneSource;
    use crate::virtual_device::VirtualDevice;

    fn small_config() -> PlayerConfig {
        PlayerConfig {
            sample_rate: Some(8_000),
            channels: Some(1),
            period_frames: 128,
            buffer_frames: 512,
            ..Default::default()
        }
    }

    #[test]
    fn test_starts_stopped_at_zero() {
        let device = VirtualDevice::new("v", 512).unwrap();
        let player = DevicePlayer::new(device, None, &small_config()).unwrap();
        assert!(!player.is_playing());
        assert_eq!(player.speed(), Rational::ZERO);
        // Parked one nanosecond into sample zero.
        assert_eq!(player.presentation_time(), 1);
    }

    #[test]
    fn test_rejects_period_larger_than_device_buffer() {
        let device = VirtualDevice::new("v", 64).unwrap();
        let result = DevicePlayer::new(device, None, &small_config());
        assert!(matches!(result, Err(SpliceError::Negotiation { .. })));
    }

    #[test]
    fn test_seek_snaps_to_sample_boundary() {
        let device = VirtualDevice::new("v", 512).unwrap();
        let player = DevicePlayer::new(device, None, &small_config()).unwrap();
        // 8 kHz: one sample is 125 us.
        player.seek(1_000_100);
        assert_eq!(player.presentation_time(), 1_000_001);
    }

    #[test]
    fn test_set_config_rederives_missing_values() {
        let device = VirtualDevice::new("v", 512).unwrap();
        let player = DevicePlayer::new(device, None, &small_config()).unwrap();
        assert_eq!(player.set_config(Some(16_000), None).unwrap(), (16_000, 1));
        assert_eq!(player.set_config(None, Some(2)).unwrap(), (16_000, 2));
        assert_eq!(player.device_config().channels, 2);
    }

    #[test]
    fn test_zero_speed_means_stopped() {
        let device = VirtualDevice::new("v", 512).unwrap();
        let player = DevicePlayer::new(device, None, &small_config()).unwrap();

        player.play(Rational::ONE);
        assert!(player.is_playing());
        player.play(Rational::ZERO);
        assert!(!player.is_playing());
        assert!(player.clock_state().stopped);
        assert_eq!(player.speed(), Rational::ZERO);

        let parked = player.presentation_time();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(player.presentation_time(), parked);
    }

    #[test]
    fn test_set_starts_or_stops_by_speed() {
        let device = VirtualDevice::new("v", 512).unwrap();
        let player = DevicePlayer::new(device, None, &small_config()).unwrap();

        player.set(Rational::ONE, 0);
        assert!(player.is_playing());
        player.set(Rational::ZERO, 250_000_000);
        assert!(!player.is_playing());
        assert_eq!(player.presentation_time(), 250_000_001);
    }

    #[test]
    fn test_set_source_while_stopped() {
        let device = VirtualDevice::new("v", 512).unwrap();
        let player = DevicePlayer::new(device, None, &small_config()).unwrap();
        player.set_source(Some(Arc::new(ToneSource::new(440.0, 0.1, 8_000))));
        player.play(Rational::ONE);
        thread::sleep(Duration::from_millis(20));
        player.stop();
        assert!(!player.is_playing());
    }
}
