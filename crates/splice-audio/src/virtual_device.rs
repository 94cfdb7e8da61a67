//! Simulated playback device clocked by the monotonic clock.
//!
//! Frames leave the device buffer at the configured sample rate from the
//! moment the first write after `prepare` lands, exactly as a real PCM
//! would drain them. Running dry flags an underrun. An optional capture tap
//! records every frame as it is "played".

use std::sync::Arc;

use parking_lot::Mutex;
use splice_core::{ns_to_frame, Rational, Result, SpliceError};
use tracing::{debug, info};

use crate::clock::monotonic_ns;
use crate::device::{DeviceConfig, DeviceState, HwTimestamp, PlaybackDevice, WriteError};
use crate::ring_buffer::SampleRing;

/// Lowest and highest sample rates the simulated hardware supports.
pub const VIRTUAL_RATE_RANGE: (u32, u32) = (8_000, 192_000);

/// Highest channel count the simulated hardware supports.
pub const VIRTUAL_MAX_CHANNELS: u16 = 8;

/// Samples captured from a [`VirtualDevice`], shared with the test or tool
/// that asked for them.
pub type CaptureTap = Arc<Mutex<Vec<f32>>>;

pub struct VirtualDevice {
    name: String,
    config: DeviceConfig,
    state: DeviceState,
    ring: SampleRing,
    /// Monotonic time playback started, while running.
    started_at: i64,
    /// Frames drained since `started_at`.
    played: i64,
    capture: Option<CaptureTap>,
}

impl VirtualDevice {
    /// Create a device with room for `buffer_frames` frames. It prefers
    /// 48 kHz stereo until configured otherwise.
    pub fn new(name: impl Into<String>, buffer_frames: usize) -> Result<Self> {
        let name = name.into();
        if buffer_frames == 0 {
            return Err(SpliceError::DeviceOpen {
                device: name,
                reason: "buffer must hold at least one frame".into(),
            });
        }
        let config = DeviceConfig {
            sample_rate: 48_000,
            channels: 2,
            buffer_frames,
        };
        info!(device = %name, buffer_frames, "virtual playback device opened");
        Ok(Self {
            name,
            config,
            state: DeviceState::Setup,
            ring: SampleRing::new(buffer_frames * config.channels as usize),
            started_at: 0,
            played: 0,
            capture: None,
        })
    }

    /// Start recording played frames and return the shared buffer.
    pub fn capture_tap(&mut self) -> CaptureTap {
        self.capture
            .get_or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
            .clone()
    }

    #[inline]
    fn channels(&self) -> usize {
        self.config.channels as usize
    }

    fn queued_frames(&self) -> usize {
        self.ring.occupied() / self.channels()
    }

    /// Drain whatever the simulated hardware has played by `now`.
    fn advance(&mut self, now: i64) {
        if self.state != DeviceState::Running {
            return;
        }

        let rate = Rational::from_integer(self.config.sample_rate as i64);
        let due = ns_to_frame(rate, now - self.started_at) - self.played;
        if due <= 0 {
            return;
        }

        let queued = self.queued_frames() as i64;
        let take = due.min(queued);
        let channels = self.channels();
        let consumed = match &self.capture {
            Some(tap) => {
                let mut tap = tap.lock();
                self.ring
                    .consume(take as usize * channels, |s| tap.extend_from_slice(s))
            }
            None => self.ring.consume(take as usize * channels, |_| {}),
        };
        self.played += (consumed / channels) as i64;

        if due > queued {
            debug!(device = %self.name, short = due - queued, "virtual device ran dry");
            self.state = DeviceState::Underrun;
        }
    }
}

impl PlaybackDevice for VirtualDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> DeviceConfig {
        self.config
    }

    fn configure(&mut self, sample_rate: u32, channels: u16) -> Result<DeviceConfig> {
        let (lo, hi) = VIRTUAL_RATE_RANGE;
        self.config.sample_rate = sample_rate.clamp(lo, hi);
        self.config.channels = channels.clamp(1, VIRTUAL_MAX_CHANNELS);
        self.ring = SampleRing::new(self.config.buffer_frames * self.channels());
        self.state = DeviceState::Setup;
        info!(
            device = %self.name,
            sample_rate = self.config.sample_rate,
            channels = self.config.channels,
            "virtual device configured"
        );
        Ok(self.config)
    }

    fn state(&mut self) -> DeviceState {
        self.advance(monotonic_ns());
        self.state
    }

    fn prepare(&mut self) -> Result<()> {
        self.ring.clear();
        self.played = 0;
        self.state = DeviceState::Prepared;
        Ok(())
    }

    fn drop_pending(&mut self) {
        self.advance(monotonic_ns());
        self.ring.clear();
        self.state = DeviceState::Setup;
    }

    fn write(&mut self, interleaved: &[f32]) -> std::result::Result<usize, WriteError> {
        let now = monotonic_ns();
        self.advance(now);

        match self.state {
            DeviceState::Setup => {
                return Err(WriteError::Device(format!(
                    "{} is not prepared for writing",
                    self.name
                )))
            }
            DeviceState::Underrun => return Err(WriteError::Underrun),
            DeviceState::Prepared | DeviceState::Running => {}
        }

        let channels = self.channels();
        let offered = interleaved.len() / channels;
        let fits = offered.min(self.ring.vacant() / channels);
        if fits == 0 {
            return if offered == 0 {
                Ok(0)
            } else {
                Err(WriteError::WouldBlock)
            };
        }
        self.ring.push(&interleaved[..fits * channels]);

        if self.state == DeviceState::Prepared {
            self.state = DeviceState::Running;
            self.started_at = now;
            self.played = 0;
        }
        Ok(fits)
    }

    fn timestamp(&mut self) -> HwTimestamp {
        let now = monotonic_ns();
        self.advance(now);
        HwTimestamp {
            avail_frames: self.config.buffer_frames - self.queued_frames(),
            time_ns: now,
        }
    }
}
