//! Integer windows: 2D pixel boxes and 1D sample ranges.
//!
//! Every frame carries two of these. The *full* window is the extent the
//! caller allocated; the *current* window is the part a source actually
//! populated, and is always contained in the full window. Both kinds are
//! inclusive on both ends; a window with `max < min` is empty.

use serde::{Deserialize, Serialize};

/// 2D integer point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct V2i {
    pub x: i32,
    pub y: i32,
}

impl V2i {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned integer box with inclusive corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Box2i {
    pub min: V2i,
    pub max: V2i,
}

impl Box2i {
    /// The canonical empty box.
    pub const EMPTY: Self = Self {
        min: V2i::new(0, 0),
        max: V2i::new(-1, -1),
    };

    /// A box covering every representable pixel.
    pub const UNBOUNDED: Self = Self {
        min: V2i::new(i32::MIN, i32::MIN),
        max: V2i::new(i32::MAX, i32::MAX),
    };

    /// Create a box from inclusive corner coordinates.
    #[inline]
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min: V2i::new(min_x, min_y),
            max: V2i::new(max_x, max_y),
        }
    }

    /// Create a box at the origin with the given size.
    #[inline]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width - 1, height - 1)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y
    }

    #[inline]
    pub fn width(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.max.x as i64 - self.min.x as i64 + 1) as usize
        }
    }

    #[inline]
    pub fn height(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.max.y as i64 - self.min.y as i64 + 1) as usize
        }
    }

    /// Size in pixels; zero on both axes for an empty box.
    #[inline]
    pub fn size(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min.x && x <= self.max.x && y >= self.min.y && y <= self.max.y
    }

    /// True if `other` lies entirely inside `self`. An empty box is inside anything.
    pub fn contains_box(&self, other: &Self) -> bool {
        other.is_empty()
            || (other.min.x >= self.min.x
                && other.min.y >= self.min.y
                && other.max.x <= self.max.x
                && other.max.y <= self.max.y)
    }

    /// Intersection. May be empty.
    pub fn intersect(&self, other: &Self) -> Self {
        Self::new(
            self.min.x.max(other.min.x),
            self.min.y.max(other.min.y),
            self.max.x.min(other.max.x),
            self.max.y.min(other.max.y),
        )
    }

    /// Bounding box of both. Empty boxes don't contribute.
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self::new(
            self.min.x.min(other.min.x),
            self.min.y.min(other.min.y),
            self.max.x.max(other.max.x),
            self.max.y.max(other.max.y),
        )
    }
}

impl Default for Box2i {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Inclusive range of sample indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleRange {
    pub min: i64,
    pub max: i64,
}

impl SampleRange {
    /// The canonical empty range.
    pub const EMPTY: Self = Self { min: 0, max: -1 };

    #[inline]
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Range of `count` samples starting at `start`.
    #[inline]
    pub const fn with_len(start: i64, count: usize) -> Self {
        Self {
            min: start,
            max: start + count as i64 - 1,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max < self.min
    }

    #[inline]
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.max - self.min + 1) as usize
        }
    }

    #[inline]
    pub fn contains(&self, sample: i64) -> bool {
        sample >= self.min && sample <= self.max
    }

    pub fn contains_range(&self, other: &Self) -> bool {
        other.is_empty() || (other.min >= self.min && other.max <= self.max)
    }

    /// Both ends moved by `delta`. Empty ranges stay empty.
    #[inline]
    pub fn shift(&self, delta: i64) -> Self {
        Self::new(self.min + delta, self.max + delta)
    }

    pub fn intersect(&self, other: &Self) -> Self {
        Self::new(self.min.max(other.min), self.max.min(other.max))
    }

    /// Smallest range covering both. Empty ranges don't contribute.
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }
}

impl Default for SampleRange {
    fn default() -> Self {
        Self::EMPTY
    }
}
