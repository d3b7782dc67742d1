//! Catalogue data and category range arithmetic.
//!
//! Thing IDs form one contiguous space split into four ranges. Only the
//! per-category counters are stored; range boundaries are always derived.

use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use super::category::ThingCategory;
use super::container::ContainerInfo;
use super::ids::ThingId;
use super::thing::Thing;
use super::version::ClientVersion;

/// First item ID. Lower IDs are reserved by the client.
pub const ITEM_BASE: u32 = 100;

/// Number of things in each category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub items: u32,
    pub outfits: u32,
    pub effects: u32,
    pub distances: u32,
}

impl CategoryCounts {
    /// Count for one category.
    pub fn get(&self, category: ThingCategory) -> u32 {
        match category {
            ThingCategory::Item => self.items,
            ThingCategory::Outfit => self.outfits,
            ThingCategory::Effect => self.effects,
            ThingCategory::Distance => self.distances,
        }
    }

    pub(crate) fn get_mut(&mut self, category: ThingCategory) -> &mut u32 {
        match category {
            ThingCategory::Item => &mut self.items,
            ThingCategory::Outfit => &mut self.outfits,
            ThingCategory::Effect => &mut self.effects,
            ThingCategory::Distance => &mut self.distances,
        }
    }

    /// Total number of things.
    pub fn total(&self) -> u32 {
        self.items + self.outfits + self.effects + self.distances
    }

    /// First ID of a category, whether or not it has any things.
    fn start(&self, category: ThingCategory) -> u32 {
        ThingCategory::ALL[..category.index()]
            .iter()
            .fold(ITEM_BASE, |start, c| start + self.get(*c))
    }

    /// Inclusive ID range of a category, or `None` when it is empty.
    pub fn range(&self, category: ThingCategory) -> Option<RangeInclusive<ThingId>> {
        let count = self.get(category);
        if count == 0 {
            return None;
        }
        let start = self.start(category);
        Some(ThingId(start)..=ThingId(start + count - 1))
    }

    /// Last ID of a category.
    pub fn last_id(&self, category: ThingCategory) -> Option<ThingId> {
        self.range(category).map(|r| *r.end())
    }

    /// Category whose range contains `id`.
    pub fn category_of(&self, id: ThingId) -> Option<ThingCategory> {
        ThingCategory::ALL
            .into_iter()
            .find(|c| self.range(*c).is_some_and(|r| r.contains(&id)))
    }

    /// ID as presented to users and side metadata.
    ///
    /// Items keep their raw ID; other categories are numbered from 1
    /// within their own range.
    pub fn display_id(&self, id: ThingId) -> Option<u32> {
        let category = self.category_of(id)?;
        match category {
            ThingCategory::Item => Some(id.0),
            _ => Some(id.0 - self.start(category) + 1),
        }
    }

    /// Inverse of [`display_id`](Self::display_id).
    pub fn internal_id(&self, category: ThingCategory, display_id: u32) -> Option<ThingId> {
        let range = self.range(category)?;
        let id = match category {
            ThingCategory::Item => ThingId(display_id),
            _ => ThingId(display_id.checked_sub(1)? + range.start().0),
        };
        range.contains(&id).then_some(id)
    }
}

/// A parsed catalogue container.
#[derive(Clone, Debug)]
pub struct ObjectData {
    pub version: ClientVersion,
    pub counts: CategoryCounts,
    pub things: BTreeMap<ThingId, Thing>,
    pub container: ContainerInfo,

    /// Counters at load time; a change forces a rebuild on save.
    pub(crate) source_counts: CategoryCounts,
    /// The decompressed buffer the catalogue was parsed from.
    pub(crate) source: Vec<u8>,
    /// The compressed input, when the catalogue was loaded compressed.
    pub(crate) original: Vec<u8>,
}

impl ObjectData {
    /// Creates an empty catalogue with a legacy header.
    pub fn new(version: ClientVersion) -> Self {
        Self {
            version,
            counts: CategoryCounts::default(),
            things: BTreeMap::new(),
            container: ContainerInfo::default(),
            source_counts: CategoryCounts::default(),
            source: Vec::new(),
            original: Vec::new(),
        }
    }

    /// Inclusive ID range of a category, or `None` when it is empty.
    pub fn category_range(&self, category: ThingCategory) -> Option<RangeInclusive<ThingId>> {
        self.counts.range(category)
    }

    /// ID as presented to users and side metadata.
    pub fn display_id(&self, id: ThingId) -> Option<u32> {
        self.counts.display_id(id)
    }

    pub fn thing(&self, id: ThingId) -> Option<&Thing> {
        self.things.get(&id)
    }

    /// Things of one category in ID order.
    pub fn things_in(&self, category: ThingCategory) -> impl Iterator<Item = &Thing> {
        self.category_range(category)
            .into_iter()
            .flat_map(move |range| self.things.range(range).map(|(_, thing)| thing))
    }

    /// The buffer this catalogue was parsed from (empty when built in memory).
    pub fn source(&self) -> &[u8] {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts() -> CategoryCounts {
        CategoryCounts {
            items: 5,
            outfits: 3,
            effects: 0,
            distances: 2,
        }
    }

    #[test]
    fn ranges_are_contiguous() {
        let c = counts();
        assert_eq!(c.range(ThingCategory::Item), Some(ThingId(100)..=ThingId(104)));
        assert_eq!(
            c.range(ThingCategory::Outfit),
            Some(ThingId(105)..=ThingId(107))
        );
        assert_eq!(c.range(ThingCategory::Effect), None);
        assert_eq!(
            c.range(ThingCategory::Distance),
            Some(ThingId(108)..=ThingId(109))
        );
        assert_eq!(c.total(), 10);
    }

    #[test]
    fn category_of_respects_boundaries() {
        let c = counts();
        assert_eq!(c.category_of(ThingId(99)), None);
        assert_eq!(c.category_of(ThingId(104)), Some(ThingCategory::Item));
        assert_eq!(c.category_of(ThingId(105)), Some(ThingCategory::Outfit));
        assert_eq!(c.category_of(ThingId(108)), Some(ThingCategory::Distance));
        assert_eq!(c.category_of(ThingId(110)), None);
    }

    #[test]
    fn display_ids() {
        let c = counts();
        assert_eq!(c.display_id(ThingId(102)), Some(102));
        assert_eq!(c.display_id(ThingId(105)), Some(1));
        assert_eq!(c.display_id(ThingId(107)), Some(3));
        assert_eq!(c.display_id(ThingId(109)), Some(2));
        assert_eq!(c.display_id(ThingId(200)), None);
    }

    #[test]
    fn internal_id_inverts_display_id() {
        let c = counts();
        for id in 100..110 {
            let id = ThingId(id);
            let category = c.category_of(id).unwrap();
            let display = c.display_id(id).unwrap();
            assert_eq!(c.internal_id(category, display), Some(id));
        }
        assert_eq!(c.internal_id(ThingCategory::Outfit, 0), None);
        assert_eq!(c.internal_id(ThingCategory::Outfit, 4), None);
        assert_eq!(c.internal_id(ThingCategory::Effect, 1), None);
    }

    #[test]
    fn empty_catalogue_has_no_ranges() {
        let c = CategoryCounts::default();
        for category in ThingCategory::ALL {
            assert_eq!(c.range(category), None);
            assert_eq!(c.last_id(category), None);
        }
    }
}
