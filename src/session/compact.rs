//! Sprite atlas compaction.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::info;

use super::Session;
use crate::model::{SpriteId, Thing};

/// Outcome of [`Session::compact_atlas`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CompactReport {
    pub removed: u32,
    pub old_count: u32,
    pub new_count: u32,
}

impl fmt::Display for CompactReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Removed {} sprite(s): {} -> {}",
            self.removed, self.old_count, self.new_count
        )
    }
}

impl Session {
    /// Drops unreferenced empty sprites and renumbers the rest from 1.
    ///
    /// A sprite survives if any frame group references it, if it still has
    /// its original blob and no replacement, or if its replacement has a
    /// visible pixel. References to sprites that did not survive become
    /// blank. Every surviving sprite is re-encoded on the next save.
    ///
    /// When nothing would be removed the session is left untouched.
    pub fn compact_atlas(&mut self) -> CompactReport {
        let old_count = self.sprites.sprite_count;
        let referenced: BTreeSet<SpriteId> = self
            .objects
            .things
            .values()
            .flat_map(Thing::referenced_sprites)
            .collect();

        let mut remap = BTreeMap::new();
        for raw in 1..=old_count {
            let id = SpriteId(raw);
            let keep = referenced.contains(&id)
                || match self.overrides.get(&id) {
                    Some(bitmap) => !bitmap.is_blank(),
                    None => self.sprites.address(id).is_some(),
                };
            if keep {
                let new = SpriteId(remap.len() as u32 + 1);
                remap.insert(id, new);
            }
        }

        let new_count = remap.len() as u32;
        let report = CompactReport {
            removed: old_count - new_count,
            old_count,
            new_count,
        };
        if report.removed == 0 {
            return report;
        }

        let mut rewritten = 0usize;
        for thing in self.objects.things.values_mut() {
            let mut changed = false;
            for group in &mut thing.frame_groups {
                for slot in group.sprites.iter_mut().filter(|s| !s.is_blank()) {
                    let new = remap.get(slot).copied().unwrap_or(SpriteId::BLANK);
                    if new != *slot {
                        *slot = new;
                        changed = true;
                    }
                }
            }
            if changed {
                thing.invalidate_source();
                self.dirty_things.insert(thing.id);
                rewritten += 1;
            }
        }

        self.overrides = std::mem::take(&mut self.overrides)
            .into_iter()
            .filter_map(|(old, bitmap)| remap.get(&old).map(|new| (*new, bitmap)))
            .collect();
        // Old blob offsets are meaningless in the new layout, so every
        // survivor is dirty; this subsumes the remapped dirty set.
        self.dirty_sprites = (1..=new_count).map(SpriteId).collect();

        self.sprites.addresses = remap
            .keys()
            .map(|old| self.sprites.address(*old).unwrap_or(0))
            .collect();
        self.sprites.sprite_count = new_count;
        self.sprite_cache.get_mut().clear();

        info!(
            removed = report.removed,
            old_count,
            new_count,
            things_rewritten = rewritten,
            "compacted sprite atlas"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Bitmap;
    use crate::model::{ClientVersion, FrameGroup, ThingCategory, ThingId};

    fn dot(shade: u8) -> Bitmap {
        let mut bitmap = Bitmap::transparent();
        bitmap.set_pixel(0, 0, [shade, shade, shade, 255]);
        bitmap
    }

    fn reference(session: &mut Session, id: ThingId, sprites: Vec<SpriteId>) {
        let mut group = FrameGroup::single_tile();
        group.pattern_x = sprites.len() as u8;
        group.sprites = sprites;
        session.set_frame_groups(id, vec![group]).unwrap();
    }

    #[test]
    fn blank_unreferenced_sprites_are_removed() {
        let mut session = Session::new(ClientVersion::new(1098).unwrap());
        let thing = session.add_thing(ThingCategory::Item).unwrap();
        let a = session.add_sprite(dot(1)).unwrap();
        let blank = session.add_sprite(Bitmap::transparent()).unwrap();
        let c = session.add_sprite(dot(3)).unwrap();
        let unused = session.add_sprite(dot(4)).unwrap();
        reference(&mut session, thing, vec![c, a]);
        assert_eq!((blank, unused), (SpriteId(2), SpriteId(4)));

        let report = session.compact_atlas();
        assert_eq!(
            report,
            CompactReport {
                removed: 1,
                old_count: 4,
                new_count: 3
            }
        );
        assert_eq!(
            session.thing(thing).unwrap().frame_groups[0].sprites,
            vec![SpriteId(2), SpriteId(1)]
        );
        assert_eq!(session.sprite_pixels(SpriteId(2)).unwrap(), dot(3));
        // visible but unreferenced sprites survive
        assert_eq!(session.sprite_pixels(SpriteId(3)).unwrap(), dot(4));
        assert_eq!(session.dirty_sprites().len(), 3);
    }

    #[test]
    fn deleted_sprite_reference_becomes_blank() {
        let mut session = Session::new(ClientVersion::new(1098).unwrap());
        let thing = session.add_thing(ThingCategory::Effect).unwrap();
        let a = session.add_sprite(dot(1)).unwrap();
        let b = session.add_sprite(dot(2)).unwrap();
        reference(&mut session, thing, vec![b]);
        session.delete_sprite(a).unwrap();

        let report = session.compact_atlas();
        assert_eq!(report.removed, 1);
        assert_eq!(
            session.thing(thing).unwrap().frame_groups[0].sprites,
            vec![SpriteId(1)]
        );
        assert_eq!(session.sprite_pixels(SpriteId(1)).unwrap(), dot(2));
    }

    #[test]
    fn noop_leaves_session_untouched() {
        let mut session = Session::new(ClientVersion::new(1098).unwrap());
        session.add_sprite(dot(1)).unwrap();
        let dirty = session.dirty_sprites().clone();
        let before = session.save().unwrap();

        let report = session.compact_atlas();
        assert_eq!(report.removed, 0);
        assert_eq!(report.old_count, report.new_count);
        assert_eq!(session.dirty_sprites(), &dirty);
        assert_eq!(session.save().unwrap(), before);
    }
}
