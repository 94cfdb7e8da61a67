//! Integration tests for the workspace: z-order, removal and concurrent edits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use splice_core::{
    AudioFrame, AudioSource, AudioSourceRef, Box2i, Param, Result, Rgba, SampleRange,
    SpliceError, VideoFrame, VideoSource, VideoSourceRef,
};
use splice_video::SolidColorSource;
use splice_workspace::{AudioWorkspace, Item, ItemUpdate, VideoWorkspace};

/// Writes one constant to every sample.
struct Dc(f32);

impl AudioSource for Dc {
    fn get_frame(&self, frame: &mut AudioFrame) -> Result<()> {
        let full = frame.full;
        frame.samples_mut(full).fill(self.0);
        frame.current = full;
        Ok(())
    }
}

fn solid(color: Rgba) -> VideoSourceRef {
    Arc::new(SolidColorSource::new(Param::color(color)))
}

#[test]
fn higher_z_composites_on_top_until_removed() {
    let red = Rgba::rgb(1.0, 0.0, 0.0);
    let green = Rgba::rgb(0.0, 1.0, 0.0);
    let ws = VideoWorkspace::new();
    ws.add(Item::new(solid(red), 0, 100).with_z(1)).unwrap();
    let top = ws.add(Item::new(solid(green), 0, 100).with_z(2)).unwrap();

    let mut frame = VideoFrame::new(Box2i::from_size(4, 4));
    ws.get_frame(50, &mut frame).unwrap();
    assert_eq!(frame.pixel(2, 2), green);

    ws.remove(top).unwrap();
    ws.get_frame(50, &mut frame).unwrap();
    assert_eq!(frame.pixel(2, 2), red);

    assert!(matches!(ws.set_z(top, 5), Err(SpliceError::StaleHandle)));
}

#[test]
fn equal_z_stacks_in_insertion_order() {
    let ws = VideoWorkspace::new();
    ws.add(Item::new(solid(Rgba::BLACK), 0, 10)).unwrap();
    ws.add(Item::new(solid(Rgba::WHITE), 0, 10)).unwrap();

    let mut frame = VideoFrame::new(Box2i::from_size(1, 1));
    ws.get_frame(0, &mut frame).unwrap();
    assert_eq!(frame.pixel(0, 0), Rgba::WHITE);
}

#[test]
fn raising_z_reorders_layers() {
    let ws = VideoWorkspace::new();
    let black = ws.add(Item::new(solid(Rgba::BLACK), 0, 10)).unwrap();
    ws.add(Item::new(solid(Rgba::WHITE), 0, 10)).unwrap();
    ws.update(black, ItemUpdate::new().z(10)).unwrap();

    let mut frame = VideoFrame::new(Box2i::from_size(1, 1));
    ws.get_frame(0, &mut frame).unwrap();
    assert_eq!(frame.pixel(0, 0), Rgba::BLACK);
}

#[test]
fn concurrent_source_swaps_are_never_torn() {
    let ws = Arc::new(AudioWorkspace::new());
    let one: AudioSourceRef = Arc::new(Dc(1.0));
    let two: AudioSourceRef = Arc::new(Dc(2.0));
    let handle = ws.add(Item::new(one.clone(), 0, 4_096)).unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let ws = Arc::clone(&ws);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for i in 0..2_000 {
                let source = if i % 2 == 0 { two.clone() } else { one.clone() };
                ws.set_source(handle, source).unwrap();
            }
            done.store(true, Ordering::Release);
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let ws = Arc::clone(&ws);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut frame = AudioFrame::new(SampleRange::new(0, 1_023), 2);
                let mut reads = 0;
                while !done.load(Ordering::Acquire) || reads < 10 {
                    ws.get_frame(&mut frame).unwrap();
                    assert_eq!(frame.current, frame.full);
                    let first = frame.data()[0];
                    assert!(first == 1.0 || first == 2.0);
                    assert!(frame.data().iter().all(|&s| s == first));
                    reads += 1;
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn concurrent_adds_and_removes_keep_handles_distinct() {
    let ws = Arc::new(AudioWorkspace::new());
    let workers: Vec<_> = (0..4)
        .map(|t| {
            let ws = Arc::clone(&ws);
            thread::spawn(move || {
                let mut live = Vec::new();
                for i in 0..200 {
                    let source: AudioSourceRef = Arc::new(Dc(t as f32));
                    live.push(ws.add(Item::new(source, i, 10)).unwrap());
                    if i % 3 == 0 {
                        let gone = live.remove(0);
                        ws.remove(gone).unwrap();
                        assert!(!ws.contains(gone));
                    }
                }
                live
            })
        })
        .collect();

    let mut all = Vec::new();
    for worker in workers {
        all.extend(worker.join().unwrap());
    }
    assert_eq!(ws.len(), all.len());
    for handle in &all {
        assert!(ws.contains(*handle));
    }
    let mut sorted = all.clone();
    sorted.sort_by_key(|h| h.to_string());
    sorted.dedup();
    assert_eq!(sorted.len(), all.len());
}
