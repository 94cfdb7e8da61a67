//! Two-layer pixel compositing over mismatched windows.
//!
//! The bottom layer lives in the output frame; the top layer is a second
//! frame whose current window may be larger, smaller or offset. The output's
//! current window grows to the union of both, zero-filling what neither
//! layer covered, and every pixel of the union is combined. Top-layer pixels
//! outside its current window count as transparent black.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use splice_core::{Rgba, VideoFrame};

/// How the top layer combines with the bottom one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixMode {
    /// Alpha-over of the top layer, scaled by the factor.
    #[default]
    Blend,
    /// Adds the top layer's color weighted by its alpha. Bottom alpha is kept.
    Add,
    /// Linear interpolation of all four channels.
    Crossfade,
}

impl MixMode {
    /// Combine one bottom pixel `a` with one top pixel `b`.
    #[inline]
    pub fn combine(self, a: Rgba, b: Rgba, factor: f32) -> Rgba {
        match self {
            Self::Add => {
                let w = b.a * factor;
                Rgba::new(a.r + b.r * w, a.g + b.g * w, a.b + b.b * w, a.a)
            }
            Self::Blend => {
                let w = b.a * factor;
                let keep = 1.0 - w;
                Rgba::new(
                    a.r * keep + b.r * w,
                    a.g * keep + b.g * w,
                    a.b * keep + b.b * w,
                    a.a + b.a * (1.0 - a.a) * factor,
                )
            }
            Self::Crossfade => a.lerp(b, factor),
        }
    }
}

/// Clamp a blend factor to `[0, 1]`. NaN maps to 0.
#[inline]
pub fn clamp_factor(factor: f64) -> f32 {
    clamp_unit(factor as f32)
}

#[inline]
fn clamp_unit(factor: f32) -> f32 {
    if factor.is_nan() {
        0.0
    } else {
        factor.clamp(0.0, 1.0)
    }
}

/// Composite `top` onto `out` in place.
///
/// The result's current window is `out.current ∪ top.current`, clipped to
/// `out.full`. Pixels outside it are left untouched.
pub fn composite(out: &mut VideoFrame, top: &VideoFrame, mode: MixMode, factor: f32) {
    let factor = clamp_unit(factor);

    let union = out.current.union(&top.current).intersect(&out.full);
    out.expand_to(union);
    if union.is_empty() {
        return;
    }

    let top_window = top.current.intersect(&union);
    let full = out.full;
    let stride = out.stride();
    let x0 = (union.min.x as i64 - full.min.x as i64) as usize;
    let y0 = (union.min.y as i64 - full.min.y as i64) as usize;
    let width = union.width();

    out.data_mut()
        .par_chunks_mut(stride)
        .skip(y0)
        .take(union.height())
        .enumerate()
        .for_each(|(row, pixels)| {
            let y = union.min.y + row as i32;
            let dst = &mut pixels[x0..x0 + width];

            let covered = !top_window.is_empty()
                && y >= top_window.min.y
                && y <= top_window.max.y;
            if !covered {
                // Only crossfade changes a pixel under a transparent top.
                if mode == MixMode::Crossfade {
                    for px in dst.iter_mut() {
                        *px = mode.combine(*px, Rgba::TRANSPARENT, factor);
                    }
                }
                return;
            }

            let src = top.row(y, top_window.min.x, top_window.max.x);
            let start = (top_window.min.x as i64 - union.min.x as i64) as usize;
            for (i, px) in dst.iter_mut().enumerate() {
                let b = if i >= start && i - start < src.len() {
                    src[i - start]
                } else {
                    Rgba::TRANSPARENT
                };
                *px = mode.combine(*px, b, factor);
            }
        });
}
