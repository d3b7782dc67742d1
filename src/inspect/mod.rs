//! Catalogue inspection and statistics.
//!
//! Produces a structured summary of a catalogue and its sprite atlas:
//! category sizes and ID ranges, frame group totals and sprite usage.

mod report;

pub use report::{CategoryEntry, InspectReport, SpriteStats, SummarySection};

use std::collections::BTreeSet;

use crate::model::{ObjectData, SpriteData, SpriteId, ThingCategory};

/// Options for inspection.
#[derive(Clone, Debug)]
pub struct InspectOptions {
    /// Width of histogram bars (in characters).
    pub bar_width: usize,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self { bar_width: 20 }
    }
}

/// Inspects a catalogue and its atlas.
pub fn inspect(objects: &ObjectData, sprites: &SpriteData, opts: &InspectOptions) -> InspectReport {
    InspectReport {
        summary: compute_summary(objects, sprites),
        categories: ThingCategory::ALL
            .into_iter()
            .map(|category| {
                let range = objects.category_range(category);
                CategoryEntry {
                    category,
                    count: objects.counts.get(category),
                    first_id: range.as_ref().map(|r| *r.start()),
                    last_id: range.as_ref().map(|r| *r.end()),
                    frame_groups: objects
                        .things_in(category)
                        .map(|t| t.frame_groups.len())
                        .sum(),
                }
            })
            .collect(),
        sprites: compute_sprite_stats(objects, sprites),
        bar_width: opts.bar_width,
    }
}

fn compute_summary(objects: &ObjectData, sprites: &SpriteData) -> SummarySection {
    SummarySection {
        client_version: objects.version.as_u16(),
        client_label: objects.version.to_string(),
        things: objects.things.len(),
        frame_groups: objects
            .things
            .values()
            .map(|t| t.frame_groups.len())
            .sum(),
        catalogue_wrapped: objects.container.wrapper.is_some(),
        catalogue_compressed: objects.container.compressed,
        sprites_wrapped: sprites.container.wrapper.is_some(),
        sprites_compressed: sprites.container.compressed,
    }
}

fn compute_sprite_stats(objects: &ObjectData, sprites: &SpriteData) -> SpriteStats {
    let referenced: BTreeSet<SpriteId> = objects
        .things
        .values()
        .flat_map(|t| t.referenced_sprites())
        .collect();
    let in_range = referenced.iter().filter(|id| sprites.contains(**id)).count();
    let total = sprites.sprite_count as usize;

    SpriteStats {
        total,
        referenced: in_range,
        unreferenced: total - in_range,
        blank: (1..=sprites.sprite_count)
            .filter(|raw| sprites.address(SpriteId(*raw)).is_none())
            .count(),
        dangling: referenced.len() - in_range,
        slots: objects
            .things
            .values()
            .flat_map(|t| &t.frame_groups)
            .map(|g| g.sprites.len())
            .sum(),
    }
}
