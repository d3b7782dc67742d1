//! Newtype IDs for type-safe identification of catalogue elements.
//!
//! Things and sprites live in separate ID spaces that are both plain `u32`
//! on disk. Keeping them apart in the type system prevents passing a sprite
//! ID where a thing ID is expected during remapping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for a thing in the catalogue.
///
/// Thing IDs are contiguous across categories: items start at
/// [`ITEM_BASE`](super::ITEM_BASE), and outfits, effects and distance
/// effects follow without gaps.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThingId(pub u32);

impl ThingId {
    /// Creates a new ThingId.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value.
    #[inline]
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// The ID directly above this one.
    #[inline]
    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// The ID directly below this one.
    #[inline]
    pub(crate) fn prev(self) -> Self {
        Self(self.0 - 1)
    }
}

impl fmt::Debug for ThingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ThingId({})", self.0)
    }
}

impl fmt::Display for ThingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ThingId {
    fn from(id: u32) -> Self {
        ThingId::new(id)
    }
}

/// A unique identifier for a sprite in the atlas.
///
/// Sprite IDs are 1-based; `SpriteId(0)` is the blank sprite.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SpriteId(pub u32);

impl SpriteId {
    /// The "no sprite" reference.
    pub const BLANK: SpriteId = SpriteId(0);

    /// Creates a new SpriteId.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value.
    #[inline]
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Returns true for the blank sprite reference.
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for SpriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpriteId({})", self.0)
    }
}

impl fmt::Display for SpriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SpriteId {
    fn from(id: u32) -> Self {
        SpriteId::new(id)
    }
}
