//! Lock-free single-producer single-consumer sample ring.
//!
//! Sits between the playback thread (producer, blocking-write semantics)
//! and a device that consumes samples at its own pace: the simulated clock
//! of [`VirtualDevice`](crate::VirtualDevice) or a cpal output callback.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A SPSC ring of interleaved f32 samples.
pub struct SampleRing {
    slots: Box<[UnsafeCell<f32>]>,
    /// One more than the usable capacity, so full and empty differ.
    len: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
    /// Set by the producer to ask the consumer to discard everything queued.
    discard: AtomicBool,
}

// SAFETY: head is only advanced by the consumer and tail only by the
// producer. Each side touches only the slots the other side has published
// to it through a Release store, so the regions never alias.
#[allow(unsafe_code)]
unsafe impl Send for SampleRing {}
#[allow(unsafe_code)]
unsafe impl Sync for SampleRing {}

impl SampleRing {
    /// Create a ring holding up to `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        let len = capacity + 1;
        Self {
            slots: (0..len).map(|_| UnsafeCell::new(0.0)).collect(),
            len,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            discard: AtomicBool::new(false),
        }
    }

    #[inline]
    fn base(&self) -> *mut f32 {
        UnsafeCell::raw_get(self.slots.as_ptr())
    }

    /// Usable capacity in samples.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.len - 1
    }

    /// Samples queued for the consumer.
    pub fn occupied(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        if tail >= head {
            tail - head
        } else {
            self.len - head + tail
        }
    }

    /// Samples the producer can still push.
    #[inline]
    pub fn vacant(&self) -> usize {
        self.capacity() - self.occupied()
    }

    /// Producer side: append as much of `data` as fits. Returns the count taken.
    pub fn push(&self, data: &[f32]) -> usize {
        let count = data.len().min(self.vacant());
        if count == 0 {
            return 0;
        }

        let tail = self.tail.load(Ordering::Relaxed);
        let first = (self.len - tail).min(count);
        let ptr = self.base();

        // SAFETY: [tail, tail + count) modulo len is free space the consumer
        // won't read until the tail store below publishes it.
        #[allow(unsafe_code)]
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), ptr.add(tail), first);
            if count > first {
                std::ptr::copy_nonoverlapping(data[first..].as_ptr(), ptr, count - first);
            }
        }

        self.tail.store((tail + count) % self.len, Ordering::Release);
        count
    }

    /// Consumer side: fill `out` from the front of the ring. Returns the
    /// count read; the rest of `out` is left as is.
    pub fn pop(&self, out: &mut [f32]) -> usize {
        self.honor_discard();

        let count = out.len().min(self.occupied());
        if count == 0 {
            return 0;
        }

        let head = self.head.load(Ordering::Relaxed);
        let first = (self.len - head).min(count);
        let ptr = self.base() as *const f32;

        // SAFETY: [head, head + count) modulo len was published by the
        // producer's Release store and won't be rewritten until head moves.
        #[allow(unsafe_code)]
        unsafe {
            std::ptr::copy_nonoverlapping(ptr.add(head), out.as_mut_ptr(), first);
            if count > first {
                std::ptr::copy_nonoverlapping(ptr, out[first..].as_mut_ptr(), count - first);
            }
        }

        self.head.store((head + count) % self.len, Ordering::Release);
        count
    }

    /// Consumer side: drop up to `count` samples, optionally handing them to
    /// `tap` in order. Returns the count consumed.
    pub fn consume(&self, count: usize, mut tap: impl FnMut(&[f32])) -> usize {
        self.honor_discard();

        let count = count.min(self.occupied());
        if count == 0 {
            return 0;
        }

        let head = self.head.load(Ordering::Relaxed);
        let first = (self.len - head).min(count);
        let ptr = self.base() as *const f32;

        // SAFETY: same published region as in `pop`; the slices don't
        // outlive this call.
        #[allow(unsafe_code)]
        unsafe {
            tap(std::slice::from_raw_parts(ptr.add(head), first));
            if count > first {
                tap(std::slice::from_raw_parts(ptr, count - first));
            }
        }

        self.head.store((head + count) % self.len, Ordering::Release);
        count
    }

    /// Producer side: ask the consumer to drop everything queued. Takes
    /// effect on the consumer's next `pop` or `consume`.
    pub fn request_discard(&self) {
        self.discard.store(true, Ordering::Release);
    }

    /// True while a discard request waits for the consumer.
    pub fn discard_pending(&self) -> bool {
        self.discard.load(Ordering::Acquire)
    }

    /// Drop everything queued. Only sound when no consumer runs
    /// concurrently, e.g. while the device that owns the consumer is paused.
    pub fn clear(&self) {
        self.discard.store(false, Ordering::Relaxed);
        self.head
            .store(self.tail.load(Ordering::Acquire), Ordering::Release);
    }

    fn honor_discard(&self) {
        if self.discard.swap(false, Ordering::AcqRel) {
            self.head
                .store(self.tail.load(Ordering::Acquire), Ordering::Release);
        }
    }
}
