//! Playback device abstraction.
//!
//! Models a PCM output the way the playback engine needs it: a negotiated
//! configuration, a small prepare/run/underrun state machine, a
//! non-blocking interleaved write, and a hardware timestamp that says how
//! much of the device buffer is free at a given monotonic time.

use serde::{Deserialize, Serialize};
use splice_core::Result;
use thiserror::Error;

/// Negotiated hardware configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Device buffer capacity in frames.
    pub buffer_frames: usize,
}

/// PCM state as seen by the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Configured but not primed; writes are refused.
    Setup,
    /// Primed and accepting writes; playback starts on the first write.
    Prepared,
    Running,
    /// The device ran dry. Needs `prepare` before it accepts data again.
    Underrun,
}

/// Outcome of a write that didn't take any frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    /// The device buffer is full; try again shortly.
    #[error("device buffer full")]
    WouldBlock,

    /// The device ran out of data before this write.
    #[error("buffer underrun")]
    Underrun,

    #[error("device error: {0}")]
    Device(String),
}

/// Hardware position report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwTimestamp {
    /// Frames of free space in the device buffer.
    pub avail_frames: usize,
    /// Monotonic time (see [`monotonic_ns`](crate::clock::monotonic_ns))
    /// at which `avail_frames` was sampled.
    pub time_ns: i64,
}

/// An audio output the playback engine can drive.
pub trait PlaybackDevice: Send + 'static {
    /// Device name as opened.
    fn name(&self) -> &str;

    /// Current configuration. Before the first `configure` this is the
    /// device's preferred configuration.
    fn config(&self) -> DeviceConfig;

    /// Negotiate interleaved f32 output at the closest supported rate and
    /// channel count. Leaves the device in [`DeviceState::Setup`].
    fn configure(&mut self, sample_rate: u32, channels: u16) -> Result<DeviceConfig>;

    fn state(&mut self) -> DeviceState;

    /// Prime the device for writes, discarding anything queued.
    fn prepare(&mut self) -> Result<()>;

    /// Stop playback immediately and discard queued frames. Leaves the
    /// device in [`DeviceState::Setup`].
    fn drop_pending(&mut self);

    /// Queue interleaved frames without blocking. Returns the number of
    /// frames taken, which may be fewer than offered.
    fn write(&mut self, interleaved: &[f32]) -> std::result::Result<usize, WriteError>;

    fn timestamp(&mut self) -> HwTimestamp;
}
