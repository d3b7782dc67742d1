#![allow(dead_code)]

use std::collections::BTreeMap;

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use thingkit::codec::{Bitmap, SPRITE_PIXELS};
use thingkit::model::{
    AnimationMode, FrameAnimation, FrameDuration, FrameGroup, FrameGroupType, MarketInfo,
    SpriteId, Thing, ThingCategory, ThingFlag, ThingFlags, ThingId,
};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// A pixel as the sprite codec returns it: fully zero when transparent.
pub fn arb_pixel() -> impl Strategy<Value = [u8; 4]> {
    prop_oneof![
        3 => Just([0u8; 4]),
        1 => (any::<[u8; 3]>(), 1u8..=255).prop_map(|([r, g, b], a)| [r, g, b, a]),
    ]
}

pub fn arb_bitmap() -> BoxedStrategy<Bitmap> {
    prop::collection::vec(arb_pixel(), SPRITE_PIXELS)
        .prop_map(|pixels| {
            Bitmap::from_rgba(pixels.concat()).expect("bitmap is exactly one sprite")
        })
        .boxed()
}

fn arb_market() -> impl Strategy<Value = MarketInfo> {
    (
        any::<u16>(),
        100u16..200,
        100u16..200,
        "[a-zA-Z àéöü]{0,16}",
        any::<u16>(),
        any::<u16>(),
    )
        .prop_map(|(category, trade_as, show_as, name, vocation, level)| MarketInfo {
            category,
            trade_as,
            show_as,
            name,
            vocation,
            level,
        })
}

pub fn arb_flag() -> BoxedStrategy<ThingFlag> {
    prop_oneof![
        any::<u16>().prop_map(|speed| ThingFlag::Ground { speed }),
        Just(ThingFlag::OnBottom),
        Just(ThingFlag::Container),
        Just(ThingFlag::Stackable),
        Just(ThingFlag::Pickupable),
        Just(ThingFlag::Unpassable),
        Just(ThingFlag::Usable),
        any::<u16>().prop_map(|max_length| ThingFlag::Writable { max_length }),
        (any::<u16>(), any::<u16>()).prop_map(|(level, color)| ThingFlag::Light { level, color }),
        (any::<i16>(), any::<i16>()).prop_map(|(x, y)| ThingFlag::Offset { x, y }),
        any::<u16>().prop_map(|height| ThingFlag::Elevation { height }),
        any::<u16>().prop_map(|color| ThingFlag::Minimap { color }),
        any::<u16>().prop_map(|slot| ThingFlag::Cloth { slot }),
        arb_market().prop_map(ThingFlag::Market),
        any::<u16>().prop_map(|action| ThingFlag::DefaultAction { action }),
    ]
    .boxed()
}

pub fn arb_flags() -> BoxedStrategy<ThingFlags> {
    prop::collection::vec(arb_flag(), 0..8)
        .prop_map(|flags| flags.into_iter().collect())
        .boxed()
}

fn arb_animation(frames: u8) -> impl Strategy<Value = FrameAnimation> {
    (
        prop_oneof![Just(AnimationMode::Async), Just(AnimationMode::Sync)],
        -3i32..10,
        -1i8..3,
        prop::collection::vec((0u32..2000, 0u32..500), frames as usize),
    )
        .prop_map(|(mode, loop_count, start_frame, raw)| FrameAnimation {
            mode,
            loop_count,
            start_frame,
            durations: raw
                .into_iter()
                .map(|(min, extra)| FrameDuration {
                    min,
                    max: min + extra,
                })
                .collect(),
        })
}

/// A well-formed frame group referencing sprites up to `max_sprite`.
pub fn arb_frame_group(max_sprite: u32, group_type: FrameGroupType) -> BoxedStrategy<FrameGroup> {
    (
        (1u8..=2, 1u8..=2, any::<u8>()),
        (1u8..=2, 1u8..=2, 1u8..=2, 1u8..=2),
        1u8..=3,
    )
        .prop_flat_map(
            move |((width, height, exact), (layers, pattern_x, pattern_y, pattern_z), frames)| {
                let base = FrameGroup {
                    group_type,
                    width,
                    height,
                    exact_size: if width > 1 || height > 1 { exact } else { 32 },
                    layers,
                    pattern_x,
                    pattern_y,
                    pattern_z,
                    frames,
                    animation: None,
                    sprites: Vec::new(),
                };
                let slots = base.sprite_count();
                let animation = if frames > 1 {
                    arb_animation(frames).prop_map(Some).boxed()
                } else {
                    Just(None).boxed()
                };
                (
                    Just(base),
                    animation,
                    prop::collection::vec((0..=max_sprite).prop_map(SpriteId), slots),
                )
            },
        )
        .prop_map(|(mut group, animation, sprites)| {
            group.animation = animation;
            group.sprites = sprites;
            group
        })
        .boxed()
}

pub fn arb_category() -> impl Strategy<Value = ThingCategory> {
    prop_oneof![
        Just(ThingCategory::Item),
        Just(ThingCategory::Outfit),
        Just(ThingCategory::Effect),
        Just(ThingCategory::Distance),
    ]
}

/// A thing whose frame groups fit a client with frame group support.
pub fn arb_thing(id: u32, max_sprite: u32) -> BoxedStrategy<Thing> {
    arb_category()
        .prop_flat_map(move |category| {
            let groups = if category == ThingCategory::Outfit {
                prop::collection::vec(
                    prop_oneof![Just(FrameGroupType::Default), Just(FrameGroupType::Walking)]
                        .prop_flat_map(move |t| arb_frame_group(max_sprite, t)),
                    1..=3,
                )
                .boxed()
            } else {
                arb_frame_group(max_sprite, FrameGroupType::Default)
                    .prop_map(|group| vec![group])
                    .boxed()
            };
            (Just(category), arb_flags(), groups)
        })
        .prop_map(move |(category, flags, groups)| {
            Thing::new(ThingId(id), category)
                .with_flags(flags)
                .with_frame_groups(groups)
        })
        .boxed()
}

/// Pixels for every non-blank sprite a thing references.
pub fn arb_pixels_for(thing: &Thing) -> BoxedStrategy<BTreeMap<SpriteId, Bitmap>> {
    let ids: Vec<SpriteId> = thing
        .referenced_sprites()
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    prop::collection::vec(arb_bitmap(), ids.len())
        .prop_map(move |bitmaps| ids.iter().copied().zip(bitmaps).collect())
        .boxed()
}
