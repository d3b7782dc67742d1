//! Catalogue container: category counters followed by one record per thing.
//!
//! Layout after the envelope:
//!
//! ```text
//! [max item id u16][outfit count u16][effect count u16][distance count u16]
//! [record × total]    records in ID order, starting at ID 100
//! ```
//!
//! The max item ID is `99 + item count`, so an empty item range stores 99.

use byteorder::{WriteBytesExt, LE};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use super::bytes::ByteReader;
use super::container::{self, FileType};
use super::things::{self, GroupLayout};
use super::LoadOptions;
use crate::error::ThingkitError;
use crate::model::{CategoryCounts, Features, ObjectData, ThingCategory, ThingId, ITEM_BASE};

/// Record layout of one category in a given client version.
pub(crate) fn layout(features: Features, category: ThingCategory) -> GroupLayout {
    let grouped = features.frame_groups && category == ThingCategory::Outfit;
    GroupLayout {
        group_count: grouped,
        group_type: grouped,
        pattern_z: features.pattern_z,
        durations: features.frame_durations,
        wide_sprite_ids: features.extended,
    }
}

/// Parses a catalogue container.
///
/// Every thing remembers the byte span of its record so an unedited thing
/// can be written back verbatim.
pub fn parse(input: &[u8], options: &LoadOptions) -> Result<ObjectData, ThingkitError> {
    let opened = container::open(input, FileType::Catalogue, options)?;
    let features = opened.version.features();
    let mut reader = ByteReader::at(&opened.buffer, opened.body_offset, "catalogue")?;

    let max_item_id = reader.u16()?;
    let items = u32::from(max_item_id)
        .checked_sub(ITEM_BASE - 1)
        .ok_or_else(|| reader.invalid(format!("max item ID {max_item_id} is below 99")))?;
    let counts = CategoryCounts {
        items,
        outfits: u32::from(reader.u16()?),
        effects: u32::from(reader.u16()?),
        distances: u32::from(reader.u16()?),
    };
    debug!(
        version = opened.version.as_u16(),
        items = counts.items,
        outfits = counts.outfits,
        effects = counts.effects,
        distances = counts.distances,
        "parsing catalogue"
    );

    let mut things = BTreeMap::new();
    for category in ThingCategory::ALL {
        let Some(range) = counts.range(category) else {
            continue;
        };
        let layout = layout(features, category);
        for raw in range.start().0..=range.end().0 {
            let id = ThingId(raw);
            let start = reader.position();
            let mut thing = things::read_thing(&mut reader, id, category, layout)?;
            thing.set_source_span(start..reader.position());
            things.insert(id, thing);
        }
    }

    let trailing = reader.len() - reader.position();
    if trailing > 0 {
        warn!(trailing, "ignoring bytes after the last catalogue record");
    }

    Ok(ObjectData {
        version: opened.version,
        counts,
        things,
        container: opened.info,
        source_counts: counts,
        source: opened.buffer,
        original: opened.original,
    })
}

fn write_counts(out: &mut Vec<u8>, counts: &CategoryCounts) -> Result<(), ThingkitError> {
    let max_item_id = counts.items + ITEM_BASE - 1;
    let checked = |what: &'static str, count: u32| {
        u16::try_from(count).map_err(|_| ThingkitError::Capacity {
            what,
            count: u64::from(count),
            max: u64::from(u16::MAX),
        })
    };
    out.write_u16::<LE>(checked("item IDs", max_item_id)?)?;
    out.write_u16::<LE>(checked("outfits", counts.outfits)?)?;
    out.write_u16::<LE>(checked("effects", counts.effects)?)?;
    out.write_u16::<LE>(checked("distance effects", counts.distances)?)?;
    Ok(())
}

/// Serializes a catalogue, re-encoding only the things in `dirty`.
///
/// With nothing dirty and unchanged counters the source buffer is returned
/// as is, apart from a re-derived wrapper feature byte. The result is not
/// compressed; see [`seal`](super::seal).
pub fn assemble(objects: &ObjectData, dirty: &BTreeSet<ThingId>) -> Result<Vec<u8>, ThingkitError> {
    if dirty.is_empty() && objects.counts == objects.source_counts && !objects.source.is_empty() {
        debug!("catalogue unchanged, passing source through");
        return Ok(container::passthrough(
            &objects.source,
            &objects.container,
            objects.version,
        ));
    }

    let features = objects.version.features();
    let mut out = Vec::with_capacity(objects.source.len().max(64));
    container::write_header(&mut out, FileType::Catalogue, objects.version, &objects.container)?;
    write_counts(&mut out, &objects.counts)?;

    let mut copied = 0usize;
    let mut encoded = 0usize;
    for category in ThingCategory::ALL {
        let layout = layout(features, category);
        for id in objects.counts.range(category).into_iter().flat_map(ids) {
            let thing = objects
                .things
                .get(&id)
                .ok_or(ThingkitError::UnknownThing(id))?;
            if thing.category != category {
                return Err(ThingkitError::Format {
                    context: "catalogue",
                    message: format!(
                        "thing {id} is a {} but sits in the {} range",
                        thing.category, category
                    ),
                });
            }

            let span = thing
                .passthrough()
                .filter(|span| !dirty.contains(&id) && span.end <= objects.source.len());
            match span {
                Some(span) => {
                    out.extend_from_slice(&objects.source[span]);
                    copied += 1;
                }
                None => {
                    things::write_thing(&mut out, thing, layout)?;
                    encoded += 1;
                }
            }
        }
    }

    debug!(copied, encoded, bytes = out.len(), "assembled catalogue");
    Ok(out)
}

fn ids(range: std::ops::RangeInclusive<ThingId>) -> impl Iterator<Item = ThingId> {
    (range.start().0..=range.end().0).map(ThingId)
}

/// Serializes a catalogue from scratch, ignoring any source buffer.
pub fn encode(objects: &ObjectData) -> Result<Vec<u8>, ThingkitError> {
    let all: BTreeSet<ThingId> = objects.things.keys().copied().collect();
    let mut fresh = objects.clone();
    fresh.source.clear();
    fresh.original.clear();
    assemble(&fresh, &all)
}

/// Fuzz-only entrypoint for catalogue parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse(data: &[u8]) -> Result<(), ThingkitError> {
    let _ = parse(data, &LoadOptions::default())?;
    Ok(())
}
