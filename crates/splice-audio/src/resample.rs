//! Play-speed rate conversion for the playback engine.
//!
//! Converts a block of source samples into a block of device frames by
//! nearest-sample decimation or duplication. The ratio of source samples
//! consumed to device frames produced is exactly `|speed|`; a negative
//! speed plays the block back to front.

use splice_core::{AudioFrame, Rational, SampleRange};

/// Source samples needed to render `frames` device frames at `speed`.
///
/// Rounds up so every device frame has a source sample to draw from. Zero
/// for a zero speed.
pub fn source_len(frames: usize, speed: Rational) -> usize {
    if speed.is_zero() || frames == 0 {
        return 0;
    }
    let speed = speed.abs();
    let n = frames as i128 * speed.numer() as i128;
    let d = speed.denom() as i128;
    ((n + d - 1) / d).max(1) as usize
}

/// Source range to pull for a block that starts at `cursor`.
///
/// Forward blocks run `[cursor, cursor + len)`. Reverse blocks end at
/// `cursor` and extend backwards.
pub fn source_range(cursor: i64, len: usize, speed: Rational) -> SampleRange {
    if len == 0 {
        return SampleRange::EMPTY;
    }
    if speed.is_negative() {
        SampleRange::new(cursor - len as i64 + 1, cursor)
    } else {
        SampleRange::with_len(cursor, len)
    }
}

/// Render `out.len() / channels` device frames from `input` at `speed`.
///
/// `input.full` must be the range returned by [`source_range`]. Samples
/// outside `input.current` play as silence. `channels` must equal the
/// input's channel count.
pub fn resample(input: &AudioFrame, speed: Rational, out: &mut [f32]) {
    let channels = input.channels();
    let frames = out.len() / channels;
    let full = input.full;
    let current = input.current;

    if speed.is_one() && full.len() == frames && current == full {
        out.copy_from_slice(input.samples(full));
        return;
    }
    if speed.is_zero() || full.is_empty() {
        out.fill(0.0);
        return;
    }

    let step = speed.abs();
    let last = full.len() as i64 - 1;
    let reverse = speed.is_negative();

    for (k, dst) in out.chunks_exact_mut(channels).enumerate() {
        let off = step.scale(k as i64).min(last);
        let s = if reverse { full.max - off } else { full.min + off };
        if current.contains(s) {
            dst.copy_from_slice(input.samples(SampleRange::new(s, s)));
        } else {
            dst.fill(0.0);
        }
    }
}
