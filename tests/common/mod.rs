#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use thingkit::codec::{atlas, catalog, seal, Bitmap, LoadOptions};
use thingkit::model::{
    AnimationMode, ClientVersion, FrameAnimation, FrameDuration, FrameGroup, FrameGroupType,
    MarketInfo, ObjectData, SpriteId, ThingCategory, ThingFlag, ThingId, WrapperInfo,
};
use thingkit::session::Session;

/// A bitmap with a small opaque square whose color encodes `shade`.
pub fn dot(shade: u8) -> Bitmap {
    let mut bitmap = Bitmap::transparent();
    for y in 4..8 {
        for x in 4..8 {
            bitmap.set_pixel(x, y, [shade, 255 - shade, shade / 2, 255]);
        }
    }
    bitmap
}

fn group(sprites: Vec<SpriteId>) -> FrameGroup {
    let mut group = FrameGroup::single_tile();
    group.sprites = sprites;
    group
}

/// A small catalogue with every category populated, built through the
/// session API.
///
/// Things:
/// - 100: sword, sprite 1, market data
/// - 101: animated ground, sprites 2 and 3
/// - 102: 2×2 statue, sprites 4..=6 plus a blank tile
/// - 103: outfit, sprites 7 and 8 (two groups when the version supports it)
/// - 104: effect, sprite 9
/// - 105: distance effect, blank
///
/// Sprites 10 (visible) and 11 (blank) are not referenced.
pub fn build_session(version: u16) -> Session {
    let version = ClientVersion::new(version).expect("supported version");
    let mut session = Session::new(version);

    for category in [
        ThingCategory::Item,
        ThingCategory::Item,
        ThingCategory::Item,
        ThingCategory::Outfit,
        ThingCategory::Effect,
        ThingCategory::Distance,
    ] {
        session.add_thing(category).expect("add thing");
    }
    for shade in 1..=10u8 {
        session.add_sprite(dot(shade * 20)).expect("add sprite");
    }
    session
        .add_sprite(Bitmap::transparent())
        .expect("add blank sprite");

    session
        .update_flags(
            ThingId(100),
            vec![
                ThingFlag::Pickupable,
                ThingFlag::MultiUse,
                ThingFlag::Light { level: 3, color: 215 },
                ThingFlag::Market(MarketInfo {
                    category: 17,
                    trade_as: 100,
                    show_as: 100,
                    name: "épée".into(),
                    vocation: 0,
                    level: 8,
                }),
            ]
            .into(),
        )
        .expect("sword flags");
    session
        .set_frame_groups(ThingId(100), vec![group(vec![SpriteId(1)])])
        .expect("sword groups");

    let mut ground = group(vec![SpriteId(2), SpriteId(3)]);
    ground.frames = 2;
    ground.animation = Some(FrameAnimation::uniform(2, 500));
    session
        .update_flags(
            ThingId(101),
            vec![ThingFlag::Ground { speed: 150 }, ThingFlag::Minimap { color: 86 }].into(),
        )
        .expect("ground flags");
    session
        .set_frame_groups(ThingId(101), vec![ground])
        .expect("ground groups");

    let mut statue = group(vec![SpriteId(4), SpriteId(5), SpriteId::BLANK, SpriteId(6)]);
    statue.width = 2;
    statue.height = 2;
    statue.exact_size = 64;
    session
        .update_flags(
            ThingId(102),
            vec![
                ThingFlag::Unpassable,
                ThingFlag::Offset { x: -8, y: -8 },
                ThingFlag::Elevation { height: 16 },
            ]
            .into(),
        )
        .expect("statue flags");
    session
        .set_frame_groups(ThingId(102), vec![statue])
        .expect("statue groups");

    let idle = group(vec![SpriteId(7)]);
    let mut walking = group(vec![SpriteId(7), SpriteId(8)]);
    walking.group_type = FrameGroupType::Walking;
    walking.frames = 2;
    walking.animation = Some(FrameAnimation {
        mode: AnimationMode::Sync,
        loop_count: 0,
        start_frame: 0,
        durations: vec![FrameDuration { min: 100, max: 200 }, FrameDuration::fixed(150)],
    });
    let outfit_groups = if version.features().frame_groups {
        vec![idle, walking]
    } else {
        vec![walking]
    };
    session
        .set_frame_groups(ThingId(103), outfit_groups)
        .expect("outfit groups");

    session
        .set_frame_groups(ThingId(104), vec![group(vec![SpriteId(9)])])
        .expect("effect groups");

    session
}

/// Legacy, uncompressed container pair for [`build_session`].
pub fn container_pair(version: u16) -> (Vec<u8>, Vec<u8>) {
    let saved = build_session(version).save().expect("save");
    (saved.catalogue, saved.sprites)
}

/// Like [`container_pair`] but with chosen framing.
pub fn framed_pair(version: u16, wrapped: bool, compressed: bool) -> (Vec<u8>, Vec<u8>) {
    let (cat, spr) = container_pair(version);
    let options = LoadOptions::new(version);

    let mut objects = catalog::parse(&cat, &options).expect("parse catalogue");
    let mut sprites = atlas::parse(&spr, &options).expect("parse sprites");
    for info in [&mut objects.container, &mut sprites.container] {
        info.wrapper = wrapped.then(WrapperInfo::default);
        info.compressed = compressed;
    }

    let catalogue = catalog::encode(&objects).expect("encode catalogue");
    let all: BTreeSet<SpriteId> = (1..=sprites.sprite_count).map(SpriteId).collect();
    let sprite_bytes = atlas::assemble(&sprites, &BTreeMap::new(), &all).expect("encode sprites");

    (
        seal(catalogue, &objects.container).expect("seal catalogue"),
        seal(sprite_bytes, &sprites.container).expect("seal sprites"),
    )
}

/// Writes a container pair into `dir` and returns the two paths.
pub fn write_pair(dir: &Path, catalogue: &[u8], sprites: &[u8]) -> (PathBuf, PathBuf) {
    let cat_path = dir.join("things.dat");
    let spr_path = dir.join("sprites.spr");
    fs::write(&cat_path, catalogue).expect("write catalogue");
    fs::write(&spr_path, sprites).expect("write sprites");
    (cat_path, spr_path)
}

/// The legacy catalogue of [`build_session`] after a raw edit that the
/// session API would refuse.
pub fn catalogue_with(version: u16, edit: impl FnOnce(&mut ObjectData)) -> Vec<u8> {
    let (cat, _) = container_pair(version);
    let mut objects = catalog::parse(&cat, &LoadOptions::new(version)).expect("parse catalogue");
    edit(&mut objects);
    catalog::encode(&objects).expect("encode catalogue")
}
