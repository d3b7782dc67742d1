use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::category::ThingCategory;
use super::flags::ThingFlags;
use super::frames::FrameGroup;
use super::ids::{SpriteId, ThingId};

/// A single catalogued object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Thing {
    pub id: ThingId,
    pub category: ThingCategory,
    #[serde(default)]
    pub flags: ThingFlags,
    pub frame_groups: Vec<FrameGroup>,

    /// Byte range of this thing's record in the catalogue it was parsed
    /// from. Only valid while the record is unchanged.
    #[serde(skip)]
    source_span: Option<Range<usize>>,
}

impl Thing {
    /// Creates a thing with no flags and one blank single-tile frame group.
    pub fn new(id: impl Into<ThingId>, category: ThingCategory) -> Self {
        Self {
            id: id.into(),
            category,
            flags: ThingFlags::new(),
            frame_groups: vec![FrameGroup::single_tile()],
            source_span: None,
        }
    }

    /// Sets the flags for this thing.
    pub fn with_flags(mut self, flags: ThingFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the frame groups for this thing.
    pub fn with_frame_groups(mut self, frame_groups: Vec<FrameGroup>) -> Self {
        self.frame_groups = frame_groups;
        self
    }

    /// Byte range of the unmodified source record, if still valid.
    pub fn passthrough(&self) -> Option<Range<usize>> {
        self.source_span.clone()
    }

    pub(crate) fn set_source_span(&mut self, span: Range<usize>) {
        self.source_span = Some(span);
    }

    /// Drops the source record; the next save re-encodes this thing.
    pub(crate) fn invalidate_source(&mut self) {
        self.source_span = None;
    }

    /// Every non-blank sprite referenced by any frame group.
    pub fn referenced_sprites(&self) -> impl Iterator<Item = SpriteId> + '_ {
        self.frame_groups
            .iter()
            .flat_map(FrameGroup::referenced_sprites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ThingFlag;

    #[test]
    fn new_thing_has_blank_group() {
        let thing = Thing::new(100u32, ThingCategory::Item);
        assert_eq!(thing.frame_groups.len(), 1);
        assert_eq!(thing.referenced_sprites().count(), 0);
        assert!(thing.passthrough().is_none());
    }

    #[test]
    fn builder_and_span() {
        let mut thing = Thing::new(100u32, ThingCategory::Item)
            .with_flags(vec![ThingFlag::Pickupable].into());
        assert!(thing.flags.contains(ThingFlag::PICKUPABLE));

        thing.set_source_span(10..20);
        assert_eq!(thing.passthrough(), Some(10..20));
        thing.invalidate_source();
        assert_eq!(thing.passthrough(), None);
    }
}
