//! Integration tests for the audio mixing kernels and filters.

use std::sync::Arc;

use splice_audio::{mix, AudioPassThroughFilter, ToneSource};
use splice_core::{AudioFrame, AudioSource, AudioSourceRef, SampleRange};

fn pulled(source: &dyn AudioSource, full: SampleRange, channels: usize) -> AudioFrame {
    let mut frame = AudioFrame::new(full, channels);
    source.get_frame(&mut frame).unwrap();
    frame
}

#[test]
fn mix_add_with_silent_output_is_copy() {
    let tone = ToneSource::new(440.0, 0.8, 48_000).bounded(SampleRange::new(10, 300));
    let a = pulled(&tone, SampleRange::new(0, 511), 2);

    let mut copied = AudioFrame::new(SampleRange::new(100, 611), 2);
    mix::copy(&mut copied, &a, 50);

    let mut mixed = AudioFrame::new(SampleRange::new(100, 611), 2);
    mixed.data_mut().fill(9.0);
    mixed.current = mixed.full;
    mix::mix_add(&mut mixed, 0.0, &a, 1.0, 50);

    assert_eq!(mixed.current, copied.current);
    assert_eq!(
        mixed.samples(mixed.current),
        copied.samples(copied.current)
    );
}

#[test]
fn mix_add_pull_single_weight_is_bit_identical() {
    let a = ToneSource::new(440.0, 0.8, 48_000);
    let b = ToneSource::new(1_000.0, 0.8, 48_000);
    let full = SampleRange::new(-64, 959);

    let direct = pulled(&a, full, 2);

    let mut out = AudioFrame::new(full, 2);
    mix::mix_add_pull(&mut out, &a, 0, 1.0, &b, 0, 0.0).unwrap();

    assert_eq!(out.current, direct.current);
    assert_eq!(out.data(), direct.data());
}

#[test]
fn mix_add_pull_two_sources_sums_with_offsets() {
    let a = ToneSource::new(440.0, 0.5, 48_000);
    let b = ToneSource::new(660.0, 0.5, 48_000).bounded(SampleRange::new(0, 99));
    let mut out = AudioFrame::new(SampleRange::new(0, 255), 1);

    mix::mix_add_pull(&mut out, &a, 0, 0.5, &b, 20, 0.25).unwrap();

    assert_eq!(out.current, SampleRange::new(0, 255));
    // Output sample 30 reads B at 50.
    let expected = a.value_at(30) * 0.5 + b.value_at(50) * 0.25;
    assert!((out.sample(30, 0) - expected).abs() < 1e-6);
    let expected = a.value_at(200) * 0.5;
    assert!((out.sample(200, 0) - expected).abs() < 1e-6);
    // B ends at its sample 99, which lands on output sample 79.
    let expected = a.value_at(80) * 0.5;
    assert!((out.sample(80, 0) - expected).abs() < 1e-6);
}

#[test]
fn copy_attenuate_divided_by_factor_is_copy() {
    let tone = ToneSource::new(330.0, 0.9, 44_100);
    let input = pulled(&tone, SampleRange::new(0, 1023), 2);

    let mut plain = AudioFrame::new(SampleRange::new(0, 1023), 2);
    mix::copy(&mut plain, &input, 0);

    for factor in [0.001f32, 0.3, 0.75, 2.0, -1.5] {
        let mut scaled = AudioFrame::new(SampleRange::new(0, 1023), 2);
        mix::copy_attenuate(&mut scaled, &input, factor, 0);
        assert_eq!(scaled.current, plain.current);
        for (s, p) in scaled.data().iter().zip(plain.data()) {
            assert!((s / factor - p).abs() <= 1e-5 * p.abs().max(1.0));
        }
    }
}

#[test]
fn passthrough_swaps_sources_between_pulls() {
    let low: AudioSourceRef = Arc::new(ToneSource::new(100.0, 1.0, 8_000));
    let high: AudioSourceRef = Arc::new(ToneSource::new(1_000.0, 1.0, 8_000));
    let filter = AudioPassThroughFilter::new(Some(low.clone()));

    let full = SampleRange::new(0, 63);
    assert_eq!(pulled(&filter, full, 1).data(), pulled(low.as_ref(), full, 1).data());

    filter.set_source(Some(high.clone()));
    assert_eq!(pulled(&filter, full, 1).data(), pulled(high.as_ref(), full, 1).data());
}
