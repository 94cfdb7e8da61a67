//! Frame buffers for audio and video in CPU memory.
//!
//! The caller allocates a frame sized to its *full* window and hands it to a
//! source. The source writes only inside the frame's *current* window, which
//! it sets (and may shrink) to report what it actually produced.

use crate::color::Rgba;
use crate::error::{Result, SpliceError};
use crate::window::{Box2i, SampleRange};

/// Interleaved 32-bit float audio, addressed by `(sample, channel)`.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    data: Vec<f32>,
    channels: usize,
    /// Samples the buffer has room for.
    pub full: SampleRange,
    /// Samples holding valid data. Always inside `full`.
    pub current: SampleRange,
}

impl AudioFrame {
    /// Allocate a zeroed frame covering `full`. The current range starts empty.
    pub fn new(full: SampleRange, channels: usize) -> Self {
        Self {
            data: vec![0.0; full.len() * channels],
            channels,
            full,
            current: SampleRange::EMPTY,
        }
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    #[inline]
    fn offset_of(&self, sample: i64) -> usize {
        debug_assert!(
            sample >= self.full.min && sample <= self.full.max + 1,
            "sample {sample} outside full range {:?}",
            self.full
        );
        (sample - self.full.min) as usize * self.channels
    }

    #[inline]
    pub fn sample(&self, sample: i64, channel: usize) -> f32 {
        self.data[self.offset_of(sample) + channel]
    }

    #[inline]
    pub fn sample_mut(&mut self, sample: i64, channel: usize) -> &mut f32 {
        let i = self.offset_of(sample) + channel;
        &mut self.data[i]
    }

    /// Interleaved samples of `range`, which must lie inside the full range.
    pub fn samples(&self, range: SampleRange) -> &[f32] {
        if range.is_empty() {
            return &[];
        }
        let start = self.offset_of(range.min);
        &self.data[start..start + range.len() * self.channels]
    }

    /// Mutable interleaved samples of `range`, which must lie inside the full range.
    pub fn samples_mut(&mut self, range: SampleRange) -> &mut [f32] {
        if range.is_empty() {
            return &mut [];
        }
        let start = self.offset_of(range.min);
        let end = start + range.len() * self.channels;
        &mut self.data[start..end]
    }

    /// Mark the frame as holding no data.
    #[inline]
    pub fn clear_current(&mut self) {
        self.current = SampleRange::EMPTY;
    }

    /// Move both windows by `delta` samples without touching the data.
    ///
    /// Used to present the frame to a source in that source's own
    /// coordinates and to translate the result back afterwards.
    pub fn shift(&mut self, delta: i64) {
        self.full = self.full.shift(delta);
        if !self.current.is_empty() {
            self.current = self.current.shift(delta);
        }
    }

    /// Check the buffer and window bookkeeping a source handed back.
    pub fn validate(&self) -> Result<()> {
        if self.data.len() != self.full.len() * self.channels {
            return Err(SpliceError::SourceContract(format!(
                "audio buffer holds {} values, full range {:?} x {} channels needs {}",
                self.data.len(),
                self.full,
                self.channels,
                self.full.len() * self.channels
            )));
        }
        if !self.full.contains_range(&self.current) {
            return Err(SpliceError::SourceContract(format!(
                "current range {:?} escapes full range {:?}",
                self.current, self.full
            )));
        }
        Ok(())
    }
}

/// 2D buffer of [`Rgba`] pixels addressed relative to `full.min`.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    data: Vec<Rgba>,
    stride: usize,
    /// Pixels the buffer has room for.
    pub full: Box2i,
    /// Pixels holding valid data. Always inside `full`.
    pub current: Box2i,
}

impl VideoFrame {
    /// Allocate a zeroed, tightly packed frame covering `full`.
    pub fn new(full: Box2i) -> Self {
        let stride = full.width();
        Self {
            data: vec![Rgba::TRANSPARENT; stride * full.height()],
            stride,
            full,
            current: Box2i::EMPTY,
        }
    }

    /// Allocate a zeroed frame with rows padded to `stride` pixels.
    pub fn with_stride(full: Box2i, stride: usize) -> Result<Self> {
        if stride < full.width() {
            return Err(SpliceError::InvalidParameter(format!(
                "stride {stride} is narrower than the frame width {}",
                full.width()
            )));
        }
        Ok(Self {
            data: vec![Rgba::TRANSPARENT; stride * full.height()],
            stride,
            full,
            current: Box2i::EMPTY,
        })
    }

    /// Row length in pixels.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn data(&self) -> &[Rgba] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [Rgba] {
        &mut self.data
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        debug_assert!(self.full.contains(x, y), "({x}, {y}) outside {:?}", self.full);
        (y as i64 - self.full.min.y as i64) as usize * self.stride
            + (x as i64 - self.full.min.x as i64) as usize
    }

    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> Rgba {
        self.data[self.index(x, y)]
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: i32, y: i32) -> &mut Rgba {
        let i = self.index(x, y);
        &mut self.data[i]
    }

    /// Pixels `x0..=x1` of row `y`.
    pub fn row(&self, y: i32, x0: i32, x1: i32) -> &[Rgba] {
        if x1 < x0 {
            return &[];
        }
        let start = self.index(x0, y);
        &self.data[start..start + (x1 - x0) as usize + 1]
    }

    /// Mutable pixels `x0..=x1` of row `y`.
    pub fn row_mut(&mut self, y: i32, x0: i32, x1: i32) -> &mut [Rgba] {
        if x1 < x0 {
            return &mut [];
        }
        let start = self.index(x0, y);
        &mut self.data[start..start + (x1 - x0) as usize + 1]
    }

    /// Paint `window` (clipped to the full window) with `color`.
    pub fn fill(&mut self, window: Box2i, color: Rgba) {
        let window = window.intersect(&self.full);
        if window.is_empty() {
            return;
        }
        for y in window.min.y..=window.max.y {
            self.row_mut(y, window.min.x, window.max.x).fill(color);
        }
    }

    #[inline]
    pub fn clear_current(&mut self) {
        self.current = Box2i::EMPTY;
    }

    /// Grow the current window to `window`, zero-filling every pixel of
    /// `window` that the old current window didn't cover.
    ///
    /// `window` is clipped to the full window and should contain the
    /// current window.
    pub fn expand_to(&mut self, window: Box2i) {
        let window = window.intersect(&self.full);
        if window.is_empty() {
            self.current = Box2i::EMPTY;
            return;
        }

        let cur = self.current.intersect(&window);

        for y in window.min.y..=window.max.y {
            if cur.is_empty() || y < cur.min.y || y > cur.max.y {
                self.row_mut(y, window.min.x, window.max.x)
                    .fill(Rgba::TRANSPARENT);
                continue;
            }
            if cur.min.x > window.min.x {
                self.row_mut(y, window.min.x, cur.min.x - 1)
                    .fill(Rgba::TRANSPARENT);
            }
            if cur.max.x < window.max.x {
                self.row_mut(y, cur.max.x + 1, window.max.x)
                    .fill(Rgba::TRANSPARENT);
            }
        }

        self.current = window;
    }

    /// Check the buffer and window bookkeeping a source handed back.
    pub fn validate(&self) -> Result<()> {
        if self.stride < self.full.width() {
            return Err(SpliceError::SourceContract(format!(
                "stride {} narrower than full width {}",
                self.stride,
                self.full.width()
            )));
        }
        if self.data.len() < self.stride * self.full.height() {
            return Err(SpliceError::SourceContract(format!(
                "video buffer holds {} pixels, {:?} at stride {} needs {}",
                self.data.len(),
                self.full,
                self.stride,
                self.stride * self.full.height()
            )));
        }
        if !self.full.contains_box(&self.current) {
            return Err(SpliceError::SourceContract(format!(
                "current window {:?} escapes full window {:?}",
                self.current, self.full
            )));
        }
        Ok(())
    }
}
