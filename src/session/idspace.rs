//! Thing ID allocation and removal.
//!
//! Adding or removing a thing shifts every later thing by one ID so the
//! four category ranges stay contiguous. Records do not store their own
//! IDs, so shifted things keep their passthrough spans.

use std::collections::BTreeSet;

use crate::error::ThingkitError;
use crate::model::{ObjectData, Thing, ThingCategory, ThingId, ITEM_BASE};

/// Largest value any stored counter can take.
const MAX_COUNTER: u32 = u16::MAX as u32;

/// Appends a default thing to the end of `category`'s range.
///
/// Later categories move up by one. Returns the new thing's ID, which is
/// also marked dirty.
pub(crate) fn allocate(
    objects: &mut ObjectData,
    dirty: &mut BTreeSet<ThingId>,
    category: ThingCategory,
) -> Result<ThingId, ThingkitError> {
    let count = objects.counts.get(category);
    let stored = match category {
        ThingCategory::Item => count + ITEM_BASE,
        _ => count + 1,
    };
    if stored > MAX_COUNTER {
        return Err(ThingkitError::Capacity {
            what: match category {
                ThingCategory::Item => "items",
                ThingCategory::Outfit => "outfits",
                ThingCategory::Effect => "effects",
                ThingCategory::Distance => "distance effects",
            },
            count: u64::from(count) + 1,
            max: u64::from(MAX_COUNTER),
        });
    }

    *objects.counts.get_mut(category) += 1;
    let insert_id = objects
        .counts
        .last_id(category)
        .ok_or(ThingkitError::UnknownThing(ThingId(ITEM_BASE)))?;

    // Highest first so no slot is overwritten before it has moved.
    let shifted: Vec<ThingId> = objects.things.range(insert_id..).map(|(id, _)| *id).rev().collect();
    for id in shifted {
        if let Some(mut thing) = objects.things.remove(&id) {
            thing.id = id.next();
            objects.things.insert(thing.id, thing);
        }
    }

    *dirty = dirty
        .iter()
        .map(|id| if *id >= insert_id { id.next() } else { *id })
        .collect();

    objects
        .things
        .insert(insert_id, Thing::new(insert_id, category));
    dirty.insert(insert_id);
    Ok(insert_id)
}

/// Removes the last thing of its category.
///
/// Only the last ID of a category can be removed, so ranges never get
/// holes. Later categories move down by one.
pub(crate) fn remove(
    objects: &mut ObjectData,
    dirty: &mut BTreeSet<ThingId>,
    id: ThingId,
) -> Result<Thing, ThingkitError> {
    let category = objects
        .counts
        .category_of(id)
        .ok_or(ThingkitError::UnknownThing(id))?;
    let last = objects
        .counts
        .last_id(category)
        .ok_or(ThingkitError::UnknownThing(id))?;
    if id != last {
        return Err(ThingkitError::NotLastInCategory { id, category, last });
    }
    if !objects.things.contains_key(&id) {
        return Err(ThingkitError::UnknownThing(id));
    }

    *objects.counts.get_mut(category) -= 1;
    let removed = objects
        .things
        .remove(&id)
        .ok_or(ThingkitError::UnknownThing(id))?;

    // Lowest first.
    let shifted: Vec<ThingId> = objects
        .things
        .range(id.next()..)
        .map(|(id, _)| *id)
        .collect();
    for old in shifted {
        if let Some(mut thing) = objects.things.remove(&old) {
            thing.id = old.prev();
            objects.things.insert(thing.id, thing);
        }
    }

    *dirty = dirty
        .iter()
        .filter(|d| **d != id)
        .map(|d| if *d > id { d.prev() } else { *d })
        .collect();

    Ok(removed)
}
