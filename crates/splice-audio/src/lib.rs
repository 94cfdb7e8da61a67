//! Splice Audio - Mixing, clocks and real-time playback
//!
//! Architecture:
//! - `mix`: sample-accurate copy/attenuate/mix kernels over ranged frames
//! - `clock`: presentation clock traits and the wall-clock implementation
//! - `device`: the `PlaybackDevice` contract, with a simulated
//!   `VirtualDevice` and (feature `cpal`) a hardware `CpalDevice`
//! - `resample`: play-speed conversion by nearest-sample decimation
//! - `player`: `DevicePlayer`, the playback thread and device-paced clock
//! - `SampleRing`: lock-free SPSC buffer between writer and device

pub mod clock;
pub mod config;
pub mod device;
pub mod mix;
pub mod passthrough;
pub mod player;
pub mod resample;
pub mod ring_buffer;
pub mod tone;
pub mod virtual_device;

#[cfg(feature = "cpal")]
pub mod cpal_device;

pub use clock::{monotonic_ns, ClockControl, ClockState, PresentationClock, SystemPresentationClock};
pub use config::PlayerConfig;
#[cfg(feature = "cpal")]
pub use cpal_device::CpalDevice;
pub use device::{DeviceConfig, DeviceState, HwTimestamp, PlaybackDevice, WriteError};
pub use passthrough::AudioPassThroughFilter;
pub use player::DevicePlayer;
pub use ring_buffer::SampleRing;
pub use tone::ToneSource;
pub use virtual_device::{CaptureTap, VirtualDevice};
