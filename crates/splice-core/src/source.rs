//! Pull-based source contracts.
//!
//! Every producer in the graph (decoders, generators, filters, workspaces)
//! implements one of these traits and is shared behind an `Arc`, so the same
//! source can feed several consumers at once.

use std::fmt;
use std::sync::Arc;

use crate::color::Rgba;
use crate::error::Result;
use crate::frame::{AudioFrame, VideoFrame};
use crate::window::Box2i;

/// Produces audio for a requested sample range.
///
/// The callee reads `frame.full`, writes samples only inside the range it
/// reports in `frame.current`, and must never touch anything outside
/// `frame.full`. Reporting an empty current range is how a source says it
/// has nothing there.
pub trait AudioSource: Send + Sync {
    fn get_frame(&self, frame: &mut AudioFrame) -> Result<()>;
}

/// Produces video for a frame index, with the same windowing contract as
/// [`AudioSource`] applied to `frame.full` / `frame.current`.
pub trait VideoSource: Send + Sync {
    fn get_frame(&self, frame_index: i64, frame: &mut VideoFrame) -> Result<()>;
}

/// Shared handle to an audio source.
pub type AudioSourceRef = Arc<dyn AudioSource>;

/// Shared handle to a video source.
pub type VideoSourceRef = Arc<dyn VideoSource>;

/// A time-varying vector value sampled at frame indices.
///
/// Used for blend factors, colors and windows that may change per frame.
pub trait FrameFunction: Send + Sync {
    /// Evaluate at each of `indices`. Component `c` of the value at
    /// `indices[i]` goes to `out[i * stride + c]`; functions with fewer than
    /// `stride` components leave the remaining slots untouched.
    fn get_values(&self, indices: &[i64], stride: usize, out: &mut [f64]);
}

/// Adapts a closure `frame -> scalar` into a [`FrameFunction`].
pub struct FnFrameFunction<F>(pub F);

impl<F> FrameFunction for FnFrameFunction<F>
where
    F: Fn(i64) -> f64 + Send + Sync,
{
    fn get_values(&self, indices: &[i64], stride: usize, out: &mut [f64]) {
        for (i, &index) in indices.iter().enumerate() {
            out[i * stride] = (self.0)(index);
        }
    }
}

/// A parameter that is either a constant or a shared frame function.
#[derive(Clone)]
pub enum Param {
    Constant([f64; 4]),
    Function(Arc<dyn FrameFunction>),
}

impl Param {
    /// Scalar constant.
    pub fn constant(value: f64) -> Self {
        Self::Constant([value, 0.0, 0.0, 0.0])
    }

    /// Color constant.
    pub fn color(color: Rgba) -> Self {
        Self::Constant(color.to_array().map(f64::from))
    }

    /// Window constant, stored as `[min.x, min.y, max.x, max.y]`.
    pub fn window(window: Box2i) -> Self {
        Self::Constant([
            window.min.x as f64,
            window.min.y as f64,
            window.max.x as f64,
            window.max.y as f64,
        ])
    }

    pub fn function(f: Arc<dyn FrameFunction>) -> Self {
        Self::Function(f)
    }

    /// Wrap a scalar closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(i64) -> f64 + Send + Sync + 'static,
    {
        Self::Function(Arc::new(FnFrameFunction(f)))
    }

    /// All four components at `index`. Components a function doesn't
    /// produce fall back to the value of the constant slot (zero).
    pub fn values(&self, index: i64) -> [f64; 4] {
        match self {
            Self::Constant(v) => *v,
            Self::Function(f) => {
                let mut out = [0.0; 4];
                f.get_values(&[index], 4, &mut out);
                out
            }
        }
    }

    pub fn scalar(&self, index: i64) -> f64 {
        self.values(index)[0]
    }

    pub fn rgba(&self, index: i64) -> Rgba {
        Rgba::from_array(self.values(index).map(|v| v as f32))
    }

    /// Window at `index`. Components are floored and saturate to `i32`.
    pub fn box2i(&self, index: i64) -> Box2i {
        let v = self.values(index).map(|c| c.floor() as i32);
        Box2i::new(v[0], v[1], v[2], v[3])
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}
