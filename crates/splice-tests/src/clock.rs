//! Integration tests for the wall-clock presentation clock.

use std::thread;
use std::time::Duration;

use splice_audio::{ClockControl, PresentationClock, SystemPresentationClock};
use splice_core::Rational;

const MS: i64 = 1_000_000;

#[test]
fn stopped_clock_does_not_advance() {
    let clock = SystemPresentationClock::new();
    clock.set(Rational::ONE, 0);
    clock.stop();

    let first = clock.presentation_time();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(clock.presentation_time(), first);
    assert_eq!(clock.speed(), Rational::ZERO);
}

#[test]
fn playing_clock_tracks_wall_time() {
    let clock = SystemPresentationClock::new();
    clock.set(Rational::ONE, 0);
    clock.stop();
    let start = clock.presentation_time();

    clock.play(Rational::ONE);
    thread::sleep(Duration::from_millis(100));
    let elapsed = clock.presentation_time() - start;

    assert!(elapsed >= 100 * MS, "elapsed {elapsed} ns");
    assert!(elapsed < 400 * MS, "elapsed {elapsed} ns");
}

#[test]
fn zero_speed_returns_seek_time() {
    let clock = SystemPresentationClock::new();
    clock.set(Rational::ZERO, 42 * MS);
    thread::sleep(Duration::from_millis(20));
    assert_eq!(clock.presentation_time(), 42 * MS);
}

#[test]
fn reverse_and_fractional_speeds() {
    let clock = SystemPresentationClock::new();
    clock.set(Rational::new(-1, 1), 1_000 * MS);
    thread::sleep(Duration::from_millis(50));
    let t = clock.presentation_time();
    assert!(t <= 950 * MS && t > 600 * MS, "reverse time {t}");

    clock.set(Rational::new(1, 2), 0);
    thread::sleep(Duration::from_millis(100));
    let t = clock.presentation_time();
    assert!(t >= 50 * MS && t < 250 * MS, "half speed time {t}");
}

#[test]
fn seek_keeps_speed() {
    let clock = SystemPresentationClock::new();
    clock.play(Rational::new(2, 1));
    clock.seek(5_000 * MS);
    assert_eq!(clock.speed(), Rational::new(2, 1));
    assert!(clock.presentation_time() >= 5_000 * MS);
}
