//! Keyframed frame functions with Bézier easing.
//!
//! A [`KeyframeFunction`] maps frame indices to a vector of up to four
//! components, interpolating between keyframes. It backs animated blend
//! factors, colors and crop windows.

use serde::{Deserialize, Serialize};

use crate::source::FrameFunction;

// ── Easing curves ───────────────────────────────────────────────

/// Cubic Bézier control points for easing (x1, y1, x2, y2).
/// The curve goes from (0,0) to (1,1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl CubicBezier {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[inline]
    fn curve(p1: f64, p2: f64, t: f64) -> f64 {
        let mt = 1.0 - t;
        3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t
    }

    #[inline]
    fn curve_dt(p1: f64, p2: f64, t: f64) -> f64 {
        let mt = 1.0 - t;
        3.0 * mt * mt * p1 + 6.0 * mt * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
    }

    /// Eased progress for linear progress `x` in `[0, 1]`.
    pub fn evaluate(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }

        // Newton-Raphson for t where curve_x(t) == x
        let mut t = x;
        for _ in 0..8 {
            let err = Self::curve(self.x1, self.x2, t) - x;
            if err.abs() < 1e-10 {
                break;
            }
            let dx = Self::curve_dt(self.x1, self.x2, t);
            if dx.abs() < 1e-12 {
                break;
            }
            t = (t - err / dx).clamp(0.0, 1.0);
        }

        Self::curve(self.y1, self.y2, t)
    }

    pub const LINEAR: Self = Self::new(0.0, 0.0, 1.0, 1.0);
    pub const EASE_IN: Self = Self::new(0.42, 0.0, 1.0, 1.0);
    pub const EASE_OUT: Self = Self::new(0.0, 0.0, 0.58, 1.0);
    pub const EASE_IN_OUT: Self = Self::new(0.42, 0.0, 0.58, 1.0);
}

/// How to get from one keyframe to the next.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum EasingCurve {
    /// Hold the value until the next keyframe.
    Hold,
    #[default]
    Linear,
    Bezier(CubicBezier),
}

impl EasingCurve {
    fn apply(self, t: f64) -> Option<f64> {
        match self {
            Self::Hold => None,
            Self::Linear => Some(t),
            Self::Bezier(b) => Some(b.evaluate(t)),
        }
    }
}

// ── Keyframes ───────────────────────────────────────────────────

/// A value pinned at a frame index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub frame: i64,
    pub value: [f64; 4],
    /// Easing used on the way to the next keyframe.
    pub easing: EasingCurve,
}

/// Frame function defined by sorted keyframes.
///
/// Before the first keyframe the first value holds, after the last the last
/// value holds. With no keyframes every component is zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyframeFunction {
    keyframes: Vec<Keyframe>,
}

impl KeyframeFunction {
    pub fn new() -> Self {
        Self::default()
    }

    /// A linear ramp of a scalar from `(start, from)` to `(end, to)`.
    pub fn ramp(start: i64, from: f64, end: i64, to: f64) -> Self {
        let mut f = Self::new();
        f.set_scalar(start, from, EasingCurve::Linear);
        f.set_scalar(end, to, EasingCurve::Linear);
        f
    }

    /// Insert or replace the keyframe at `frame`.
    pub fn set(&mut self, frame: i64, value: [f64; 4], easing: EasingCurve) {
        match self.keyframes.binary_search_by_key(&frame, |kf| kf.frame) {
            Ok(i) => {
                self.keyframes[i].value = value;
                self.keyframes[i].easing = easing;
            }
            Err(i) => self.keyframes.insert(
                i,
                Keyframe {
                    frame,
                    value,
                    easing,
                },
            ),
        }
    }

    pub fn set_scalar(&mut self, frame: i64, value: f64, easing: EasingCurve) {
        self.set(frame, [value, 0.0, 0.0, 0.0], easing);
    }

    /// Remove the keyframe at `frame`, returning whether one existed.
    pub fn remove(&mut self, frame: i64) -> bool {
        match self.keyframes.binary_search_by_key(&frame, |kf| kf.frame) {
            Ok(i) => {
                self.keyframes.remove(i);
                true
            }
            Err(_) => false,
        }
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Value at `frame`.
    pub fn evaluate(&self, frame: i64) -> [f64; 4] {
        let (first, last) = match (self.keyframes.first(), self.keyframes.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return [0.0; 4],
        };
        if frame <= first.frame {
            return first.value;
        }
        if frame >= last.frame {
            return last.value;
        }

        let idx = self.keyframes.partition_point(|kf| kf.frame <= frame) - 1;
        let a = &self.keyframes[idx];
        let b = &self.keyframes[idx + 1];

        let t = (frame - a.frame) as f64 / (b.frame - a.frame) as f64;
        match a.easing.apply(t) {
            None => a.value,
            Some(t) => std::array::from_fn(|c| a.value[c] + (b.value[c] - a.value[c]) * t),
        }
    }
}

impl FrameFunction for KeyframeFunction {
    fn get_values(&self, indices: &[i64], stride: usize, out: &mut [f64]) {
        let width = stride.min(4);
        for (i, &index) in indices.iter().enumerate() {
            let value = self.evaluate(index);
            out[i * stride..i * stride + width].copy_from_slice(&value[..width]);
        }
    }
}
