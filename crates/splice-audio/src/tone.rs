//! Sine tone generator.

use std::f64::consts::TAU;

use splice_core::{AudioFrame, AudioSource, Result, SampleRange};

/// A sine wave written identically to every channel.
#[derive(Debug, Clone)]
pub struct ToneSource {
    frequency: f64,
    amplitude: f32,
    sample_rate: u32,
    /// Samples the tone exists at; silent (empty current range) elsewhere.
    span: SampleRange,
}

impl ToneSource {
    /// An endless tone.
    pub fn new(frequency: f64, amplitude: f32, sample_rate: u32) -> Self {
        Self {
            frequency,
            amplitude,
            sample_rate,
            span: SampleRange::new(i64::MIN, i64::MAX),
        }
    }

    /// Limit the tone to `span`.
    pub fn bounded(mut self, span: SampleRange) -> Self {
        self.span = span;
        self
    }

    /// Value at `sample`.
    pub fn value_at(&self, sample: i64) -> f32 {
        let cycles = sample as f64 * self.frequency / self.sample_rate as f64;
        (cycles.fract() * TAU).sin() as f32 * self.amplitude
    }
}

impl AudioSource for ToneSource {
    fn get_frame(&self, frame: &mut AudioFrame) -> Result<()> {
        let range = frame.full.intersect(&self.span);
        if range.is_empty() {
            frame.clear_current();
            return Ok(());
        }

        let channels = frame.channels();
        let samples = frame.samples_mut(range);
        for (i, chunk) in samples.chunks_exact_mut(channels).enumerate() {
            chunk.fill(self.value_at(range.min + i as i64));
        }
        frame.current = range;
        Ok(())
    }
}
