//! Hardware output through cpal.
//!
//! cpal pulls audio from a callback, while the playback engine pushes with
//! blocking-write semantics. The two meet in a [`SampleRing`]: `write`
//! pushes into it and the output callback pops from it, padding with
//! silence and flagging an underrun when it runs short.
//!
//! cpal streams can't move between threads on every platform, so each
//! device keeps its stream on a dedicated thread and talks to it over a
//! channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use splice_core::{Result, SpliceError};
use tracing::{debug, error, info, warn};

use crate::clock::monotonic_ns;
use crate::device::{DeviceConfig, DeviceState, HwTimestamp, PlaybackDevice, WriteError};
use crate::ring_buffer::SampleRing;

/// Flags shared with the output callback.
struct CallbackFlags {
    running: AtomicBool,
    underrun: AtomicBool,
}

enum Command {
    Configure {
        sample_rate: u32,
        channels: u16,
        buffer_frames: usize,
        reply: Sender<Result<(DeviceConfig, Arc<SampleRing>)>>,
    },
    Shutdown,
}

pub struct CpalDevice {
    name: String,
    config: DeviceConfig,
    state: DeviceState,
    ring: Arc<SampleRing>,
    flags: Arc<CallbackFlags>,
    commands: Sender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl CpalDevice {
    /// Open the output device called `name` on the default host
    /// (`"default"` for the host's default output), with a ring of
    /// `buffer_frames` frames between the writer and the callback.
    pub fn open(name: &str, buffer_frames: usize) -> Result<Self> {
        if buffer_frames == 0 {
            return Err(SpliceError::DeviceOpen {
                device: name.to_string(),
                reason: "buffer must hold at least one frame".into(),
            });
        }

        let flags = Arc::new(CallbackFlags {
            running: AtomicBool::new(false),
            underrun: AtomicBool::new(false),
        });
        let (commands, inbox) = bounded::<Command>(4);
        let (opened_tx, opened_rx) = bounded::<Result<(u32, u16)>>(1);

        let worker_name = name.to_string();
        let worker_flags = Arc::clone(&flags);
        let worker = thread::Builder::new()
            .name("splice-cpal".into())
            .spawn(move || stream_thread(worker_name, worker_flags, inbox, opened_tx))?;

        let (sample_rate, channels) = opened_rx.recv().map_err(|_| SpliceError::DeviceOpen {
            device: name.to_string(),
            reason: "stream thread exited during open".into(),
        })??;

        info!(device = name, sample_rate, channels, "cpal output device opened");
        Ok(Self {
            name: name.to_string(),
            config: DeviceConfig {
                sample_rate,
                channels,
                buffer_frames,
            },
            state: DeviceState::Setup,
            ring: Arc::new(SampleRing::new(buffer_frames * channels as usize)),
            flags,
            commands,
            worker: Some(worker),
        })
    }

    #[inline]
    fn channels(&self) -> usize {
        self.config.channels as usize
    }
}

impl PlaybackDevice for CpalDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> DeviceConfig {
        self.config
    }

    fn configure(&mut self, sample_rate: u32, channels: u16) -> Result<DeviceConfig> {
        self.flags.running.store(false, Ordering::Release);

        let gone = || SpliceError::Device(format!("{}: stream thread is gone", self.name));
        let (reply, answer) = bounded(1);
        self.commands
            .send(Command::Configure {
                sample_rate,
                channels,
                buffer_frames: self.config.buffer_frames,
                reply,
            })
            .map_err(|_| gone())?;
        let (negotiated, ring) = answer.recv().map_err(|_| gone())??;

        self.ring = ring;
        self.config = negotiated;
        self.state = DeviceState::Setup;
        Ok(negotiated)
    }

    fn state(&mut self) -> DeviceState {
        if self.state == DeviceState::Running && self.flags.underrun.load(Ordering::Acquire) {
            self.state = DeviceState::Underrun;
        }
        self.state
    }

    fn prepare(&mut self) -> Result<()> {
        self.flags.running.store(false, Ordering::Release);
        self.ring.request_discard();

        // The callback honors the request on its next run.
        let deadline = Instant::now() + Duration::from_millis(200);
        while self.ring.discard_pending() {
            if Instant::now() > deadline {
                return Err(SpliceError::Device(format!(
                    "{}: output callback stopped running",
                    self.name
                )));
            }
            thread::sleep(Duration::from_millis(1));
        }

        self.flags.underrun.store(false, Ordering::Release);
        self.state = DeviceState::Prepared;
        Ok(())
    }

    fn drop_pending(&mut self) {
        self.flags.running.store(false, Ordering::Release);
        self.ring.request_discard();
        self.state = DeviceState::Setup;
    }

    fn write(&mut self, interleaved: &[f32]) -> std::result::Result<usize, WriteError> {
        match self.state() {
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
            self.flags.running.store(true, Ordering::Release);
        }
        Ok(fits)
    }

    fn timestamp(&mut self) -> HwTimestamp {
        let queued = self.ring.occupied() / self.channels();
        HwTimestamp {
            avail_frames: self.config.buffer_frames.saturating_sub(queued),
            time_ns: monotonic_ns(),
        }
    }
}

impl Drop for CpalDevice {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!(device = %self.name, "cpal stream thread panicked");
            }
        }
    }
}

// ── Stream thread ───────────────────────────────────────────────

fn find_device(host: &cpal::Host, name: &str) -> Result<cpal::Device> {
    let not_found = || SpliceError::DeviceOpen {
        device: name.to_string(),
        reason: "no such output device".into(),
    };
    if name == "default" {
        return host.default_output_device().ok_or_else(not_found);
    }
    host.output_devices()
        .map_err(|e| SpliceError::DeviceOpen {
            device: name.to_string(),
            reason: e.to_string(),
        })?
        .find(|d| d.name().ok().as_deref() == Some(name))
        .ok_or_else(not_found)
}

/// Closest supported f32 configuration to the request.
fn negotiate(device: &cpal::Device, sample_rate: u32, channels: u16) -> Result<StreamConfig> {
    let ranges: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| SpliceError::Negotiation {
            parameter: "output configuration".into(),
            reason: e.to_string(),
        })?
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .collect();

    let best = ranges
        .iter()
        .min_by_key(|c| {
            let rate_miss = if sample_rate < c.min_sample_rate().0 {
                c.min_sample_rate().0 - sample_rate
            } else {
                sample_rate.saturating_sub(c.max_sample_rate().0)
            };
            (c.channels().abs_diff(channels), rate_miss)
        })
        .ok_or_else(|| SpliceError::Negotiation {
            parameter: "sample format".into(),
            reason: "device offers no interleaved f32 output".into(),
        })?;

    let rate = sample_rate.clamp(best.min_sample_rate().0, best.max_sample_rate().0);
    if rate != sample_rate || best.channels() != channels {
        warn!(
            requested_rate = sample_rate,
            requested_channels = channels,
            rate,
            channels = best.channels(),
            "using closest supported output configuration"
        );
    }

    Ok(StreamConfig {
        channels: best.channels(),
        sample_rate: SampleRate(rate),
        buffer_size: cpal::BufferSize::Default,
    })
}

fn build_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    ring: Arc<SampleRing>,
    flags: Arc<CallbackFlags>,
) -> Result<cpal::Stream> {
    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                if !flags.running.load(Ordering::Acquire) {
                    ring.pop(&mut []);
                    data.fill(0.0);
                    return;
                }
                let n = ring.pop(data);
                if n < data.len() {
                    data[n..].fill(0.0);
                    flags.underrun.store(true, Ordering::Release);
                }
            },
            move |err| {
                error!(error = %err, "cpal output stream error");
            },
            None,
        )
        .map_err(|e| SpliceError::Device(e.to_string()))?;
    stream
        .play()
        .map_err(|e| SpliceError::Device(e.to_string()))?;
    Ok(stream)
}

fn stream_thread(
    name: String,
    flags: Arc<CallbackFlags>,
    inbox: Receiver<Command>,
    opened: Sender<Result<(u32, u16)>>,
) {
    let host = cpal::default_host();
    let device = match find_device(&host, &name) {
        Ok(device) => device,
        Err(e) => {
            let _ = opened.send(Err(e));
            return;
        }
    };
    let preferred = match device.default_output_config() {
        Ok(c) => (c.sample_rate().0, c.channels()),
        Err(e) => {
            let _ = opened.send(Err(SpliceError::DeviceOpen {
                device: name,
                reason: e.to_string(),
            }));
            return;
        }
    };
    let _ = opened.send(Ok(preferred));

    // Dropping the stream stops it.
    let mut active: Option<cpal::Stream> = None;

    for command in inbox.iter() {
        match command {
            Command::Configure {
                sample_rate,
                channels,
                buffer_frames,
                reply,
            } => {
                active = None;
                let result = negotiate(&device, sample_rate, channels).and_then(|config| {
                    let ring = Arc::new(SampleRing::new(buffer_frames * config.channels as usize));
                    let stream =
                        build_stream(&device, &config, Arc::clone(&ring), Arc::clone(&flags))?;
                    active = Some(stream);
                    let negotiated = DeviceConfig {
                        sample_rate: config.sample_rate.0,
                        channels: config.channels,
                        buffer_frames,
                    };
                    Ok((negotiated, ring))
                });
                debug!(device = %name, ok = result.is_ok(), "cpal stream configured");
                let _ = reply.send(result);
            }
            Command::Shutdown => break,
        }
    }
    drop(active);
}
