use std::collections::BTreeSet;

use proptest::prelude::*;
use thingkit::codec::{catalog, Bitmap, LoadOptions};
use thingkit::model::{
    ClientVersion, FrameGroup, ObjectData, SpriteId, Thing, ThingCategory, ThingId,
};
use thingkit::session::Session;

mod proptest_helpers;

/// Packs things into contiguous category ranges starting at 100.
fn catalogue(mut things: Vec<Thing>) -> ObjectData {
    things.sort_by_key(|thing| thing.category);
    let mut objects = ObjectData::new(ClientVersion::new(1098).unwrap());
    for (offset, mut thing) in things.into_iter().enumerate() {
        let counts = &mut objects.counts;
        match thing.category {
            ThingCategory::Item => counts.items += 1,
            ThingCategory::Outfit => counts.outfits += 1,
            ThingCategory::Effect => counts.effects += 1,
            ThingCategory::Distance => counts.distances += 1,
        }
        thing.id = ThingId(100 + offset as u32);
        objects.things.insert(thing.id, thing);
    }
    objects
}

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn catalogue_roundtrip_preserves_things(
        things in prop::collection::vec(proptest_helpers::arb_thing(0, 500), 0..12)
    ) {
        let objects = catalogue(things);
        let bytes = catalog::encode(&objects).expect("encode catalogue");
        let parsed = catalog::parse(&bytes, &LoadOptions::new(1098)).expect("parse catalogue");

        prop_assert_eq!(parsed.counts, objects.counts);
        prop_assert_eq!(parsed.things.len(), objects.things.len());
        for (id, thing) in &objects.things {
            let restored = &parsed.things[id];
            prop_assert_eq!(restored.category, thing.category);
            prop_assert_eq!(&restored.flags, &thing.flags);
            prop_assert_eq!(&restored.frame_groups, &thing.frame_groups);
        }

        // Nothing dirty: the parsed catalogue saves as the same bytes.
        let again = catalog::assemble(&parsed, &BTreeSet::new()).expect("assemble");
        prop_assert_eq!(again, bytes);
    }

    #[test]
    fn adding_then_removing_restores_the_catalogue(
        adds in prop::collection::vec(proptest_helpers::arb_category(), 1..10)
    ) {
        let mut session = Session::new(ClientVersion::new(1098).unwrap());
        for category in ThingCategory::ALL {
            session.add_thing(category).expect("seed thing");
        }
        let before = session.save().expect("save");
        let counts = session.objects().counts;

        let mut added = Vec::new();
        for category in adds {
            let id = session.add_thing(category).expect("add thing");
            prop_assert_eq!(session.thing(id).map(|t| t.category), Some(category));
            added.push(category);
        }
        // Undo in reverse, always removing the current last of each category.
        for category in added.into_iter().rev() {
            let last = session
                .category_range(category)
                .map(|range| *range.end())
                .expect("category has things");
            session.remove_thing(last).expect("remove thing");
        }

        prop_assert_eq!(session.objects().counts, counts);
        prop_assert_eq!(session.save().expect("save"), before);
    }

    #[test]
    fn compaction_leaves_no_dangling_references(
        visible in prop::collection::vec(any::<bool>(), 1..24),
        refs in prop::collection::vec(0u32..30, 1..8),
    ) {
        let mut session = Session::new(ClientVersion::new(1098).unwrap());
        for (i, keep) in visible.iter().enumerate() {
            let mut bitmap = Bitmap::transparent();
            if *keep {
                bitmap.set_pixel(i % 32, 0, [1, 2, 3, 255]);
            }
            session.add_sprite(bitmap).expect("add sprite");
        }
        let count = session.sprite_count();
        let thing = session.add_thing(ThingCategory::Item).expect("add thing");
        let mut group = FrameGroup::single_tile();
        group.pattern_x = refs.len() as u8;
        group.sprites = refs.iter().map(|r| SpriteId(r % (count + 1))).collect();
        session.set_frame_groups(thing, vec![group]).expect("set groups");

        let report = session.compact_atlas();
        prop_assert_eq!(report.old_count, count);
        prop_assert_eq!(report.new_count, session.sprite_count());
        let new_count = session.sprite_count();
        for id in session.thing(thing).unwrap().referenced_sprites() {
            prop_assert!(id.0 <= new_count);
        }

        let saved = session.save().expect("save");
        let again = session.compact_atlas();
        prop_assert_eq!(again.removed, 0);
        prop_assert_eq!(session.save().expect("save"), saved);
    }
}
