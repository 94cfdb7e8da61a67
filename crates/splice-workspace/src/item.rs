//! Workspace items, handles and partial updates.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use splice_core::SampleRange;

/// Opaque user data attached to an item.
pub type Tag = Arc<dyn Any + Send + Sync>;

/// Names one item of one workspace.
///
/// A handle stays valid until its item is removed. A slot freed by a
/// removal is reused under a new generation, so an old handle never aliases
/// the item that later lands in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemHandle {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}v{}", self.slot, self.generation)
    }
}

/// A source placed on the workspace timeline.
///
/// Covers positions `x .. x + length`. Position `p` maps to source position
/// `p - x + offset`. Higher `z` composites on top.
#[derive(Clone)]
pub struct Item<S> {
    pub source: S,
    pub x: i64,
    pub length: i64,
    pub z: i32,
    pub offset: i64,
    pub tag: Option<Tag>,
}

impl<S> Item<S> {
    pub fn new(source: S, x: i64, length: i64) -> Self {
        Self {
            source,
            x,
            length,
            z: 0,
            offset: 0,
            tag: None,
        }
    }

    pub fn with_z(mut self, z: i32) -> Self {
        self.z = z;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Positions covered, inclusive. Empty when `length` is zero.
    pub fn span(&self) -> SampleRange {
        if self.length <= 0 {
            return SampleRange::EMPTY;
        }
        SampleRange::new(self.x, self.x.saturating_add(self.length - 1))
    }

    /// True if the item covers position `position`.
    #[inline]
    pub fn covers(&self, position: i64) -> bool {
        self.span().contains(position)
    }

    /// Source position for workspace position `position`.
    #[inline]
    pub fn source_position(&self, position: i64) -> i64 {
        position - self.x + self.offset
    }

    /// Downcast the tag.
    pub fn tag_as<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.tag.as_deref().and_then(|tag| tag.downcast_ref::<T>())
    }
}

impl<S> fmt::Debug for Item<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("x", &self.x)
            .field("length", &self.length)
            .field("z", &self.z)
            .field("offset", &self.offset)
            .field("tagged", &self.tag.is_some())
            .finish_non_exhaustive()
    }
}

/// Fields to change in [`Workspace::update`](crate::Workspace::update).
/// Unset fields keep their value.
pub struct ItemUpdate<S> {
    pub source: Option<S>,
    pub x: Option<i64>,
    pub length: Option<i64>,
    pub z: Option<i32>,
    pub offset: Option<i64>,
    /// `Some(None)` clears the tag.
    pub tag: Option<Option<Tag>>,
}

impl<S> Default for ItemUpdate<S> {
    fn default() -> Self {
        Self {
            source: None,
            x: None,
            length: None,
            z: None,
            offset: None,
            tag: None,
        }
    }
}

impl<S> ItemUpdate<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: S) -> Self {
        self.source = Some(source);
        self
    }

    pub fn x(mut self, x: i64) -> Self {
        self.x = Some(x);
        self
    }

    pub fn length(mut self, length: i64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn z(mut self, z: i32) -> Self {
        self.z = Some(z);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn tag(mut self, tag: Option<Tag>) -> Self {
        self.tag = Some(tag);
        self
    }

    pub(crate) fn apply(self, item: &mut Item<S>) {
        if let Some(source) = self.source {
            item.source = source;
        }
        if let Some(x) = self.x {
            item.x = x;
        }
        if let Some(length) = self.length {
            item.length = length;
        }
        if let Some(z) = self.z {
            item.z = z;
        }
        if let Some(offset) = self.offset {
            item.offset = offset;
        }
        if let Some(tag) = self.tag {
            item.tag = tag;
        }
    }
}
