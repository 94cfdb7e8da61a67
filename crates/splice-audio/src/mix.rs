//! Sample-accurate mixing kernels over ranged audio frames.
//!
//! All kernels work on 32-bit float samples and never clip. An `offset`
//! makes output sample `s` read input sample `s + offset`. Everything written
//! is clipped to the output's full range, and the output's current range is
//! set to exactly what was written.

use splice_core::{AudioFrame, AudioSource, Result, SampleRange};

/// Range of `out.full` that `input` covers when read at `s + offset`, in
/// output coordinates.
#[inline]
fn landing_range(out: &AudioFrame, input: &AudioFrame, offset: i64) -> SampleRange {
    if input.current.is_empty() {
        return SampleRange::EMPTY;
    }
    let r = input.current.shift(-offset).intersect(&out.full);
    if r.is_empty() {
        SampleRange::EMPTY
    } else {
        r
    }
}

/// Write `input[s + offset] * factor` into `out[s]` for every `s` in
/// `range`. Output channels the input lacks are filled with silence.
fn write_scaled(out: &mut AudioFrame, input: &AudioFrame, range: SampleRange, offset: i64, factor: f32) {
    let out_ch = out.channels();
    let in_ch = input.channels();
    let src = input.samples(range.shift(offset));
    let dst = out.samples_mut(range);

    if out_ch == in_ch {
        if factor == 1.0 {
            dst.copy_from_slice(src);
        } else {
            for (d, s) in dst.iter_mut().zip(src) {
                *d = s * factor;
            }
        }
        return;
    }

    let shared = out_ch.min(in_ch);
    for (d, s) in dst.chunks_exact_mut(out_ch).zip(src.chunks_exact(in_ch)) {
        for c in 0..shared {
            d[c] = s[c] * factor;
        }
        d[shared..].fill(0.0);
    }
}

/// Copy the part of `input` that overlaps `out`'s full range.
pub fn copy(out: &mut AudioFrame, input: &AudioFrame, offset: i64) {
    let range = landing_range(out, input, offset);
    if !range.is_empty() {
        write_scaled(out, input, range, offset, 1.0);
    }
    out.current = range;
}

/// Copy scaled by `factor`. A zero factor leaves `out` untouched except
/// for reporting an empty current range.
pub fn copy_attenuate(out: &mut AudioFrame, input: &AudioFrame, factor: f32, offset: i64) {
    if factor == 0.0 {
        out.clear_current();
        return;
    }
    if factor == 1.0 {
        copy(out, input, offset);
        return;
    }
    let range = landing_range(out, input, offset);
    if !range.is_empty() {
        write_scaled(out, input, range, offset, factor);
    }
    out.current = range;
}

/// Scale the current range in place.
pub fn attenuate(frame: &mut AudioFrame, factor: f32) {
    if factor == 1.0 {
        return;
    }
    if factor == 0.0 {
        frame.clear_current();
        return;
    }
    let current = frame.current;
    for s in frame.samples_mut(current) {
        *s *= factor;
    }
}

/// `out = out * mix_out + a * mix_a`, over the union of both ranges.
///
/// Parts of the union covered by neither input are zero afterwards. With
/// `mix_out == 0` this is [`copy_attenuate`] of `a`.
pub fn mix_add(out: &mut AudioFrame, mix_out: f32, a: &AudioFrame, mix_a: f32, offset: i64) {
    if mix_out == 0.0 {
        copy_attenuate(out, a, mix_a, offset);
        return;
    }

    let a_range = landing_range(out, a, offset);
    attenuate(out, mix_out);

    let old = out.current;
    let union = old.union(&a_range);
    if union.is_empty() {
        out.current = SampleRange::EMPTY;
        return;
    }

    // Silence everything in the union the old content didn't cover.
    if old.is_empty() {
        out.samples_mut(union).fill(0.0);
    } else {
        if union.min < old.min {
            out.samples_mut(SampleRange::new(union.min, old.min - 1)).fill(0.0);
        }
        if union.max > old.max {
            out.samples_mut(SampleRange::new(old.max + 1, union.max)).fill(0.0);
        }
    }

    if !a_range.is_empty() {
        let out_ch = out.channels();
        let in_ch = a.channels();
        let shared = out_ch.min(in_ch);
        let src = a.samples(a_range.shift(offset));
        let dst = out.samples_mut(a_range);
        if out_ch == in_ch {
            for (d, s) in dst.iter_mut().zip(src) {
                *d += s * mix_a;
            }
        } else {
            for (d, s) in dst.chunks_exact_mut(out_ch).zip(src.chunks_exact(in_ch)) {
                for c in 0..shared {
                    d[c] += s[c] * mix_a;
                }
            }
        }
    }

    out.current = union;
}

/// Pull `source` into `out` so that `out` sample `s` holds `source` sample
/// `s + offset`.
///
/// The frame is presented to the source in its own coordinates and shifted
/// back afterwards, so no copy is needed.
pub fn pull_shifted(source: &dyn AudioSource, out: &mut AudioFrame, offset: i64) -> Result<()> {
    out.clear_current();
    out.shift(offset);
    let pulled = source.get_frame(out);
    out.shift(-offset);
    pulled?;
    out.validate()
}

/// Pull and mix two sources into `out`.
///
/// A source with zero weight is never pulled. When only one source
/// contributes it is pulled straight into `out`; a scratch frame is only
/// allocated when both do.
pub fn mix_add_pull(
    out: &mut AudioFrame,
    source_a: &dyn AudioSource,
    offset_a: i64,
    mix_a: f32,
    source_b: &dyn AudioSource,
    offset_b: i64,
    mix_b: f32,
) -> Result<()> {
    match (mix_a != 0.0, mix_b != 0.0) {
        (false, false) => {
            out.clear_current();
            Ok(())
        }
        (true, false) => {
            pull_shifted(source_a, out, offset_a)?;
            attenuate(out, mix_a);
            Ok(())
        }
        (false, true) => {
            pull_shifted(source_b, out, offset_b)?;
            attenuate(out, mix_b);
            Ok(())
        }
        (true, true) => {
            pull_shifted(source_a, out, offset_a)?;

            let mut temp = AudioFrame::new(out.full, out.channels());
            pull_shifted(source_b, &mut temp, offset_b)?;

            mix_add(out, mix_a, &temp, mix_b, 0);
            Ok(())
        }
    }
}
