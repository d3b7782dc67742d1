use std::collections::BTreeMap;

use proptest::prelude::*;
use thingkit::codec::interchange::{decode, encode};
use thingkit::model::{ClientVersion, Thing, ThingCategory};

mod proptest_helpers;

fn version() -> ClientVersion {
    ClientVersion::new(1098).unwrap()
}

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn interchange_roundtrip_preserves_thing_and_pixels(
        (thing, pixels) in proptest_helpers::arb_thing(100, 40)
            .prop_flat_map(|thing| {
                let pixels = proptest_helpers::arb_pixels_for(&thing);
                (Just(thing), pixels)
            })
    ) {
        let bytes = encode(&thing, &pixels, version()).expect("encode interchange");
        let decoded = decode(&bytes).expect("decode interchange");

        prop_assert_eq!(decoded.client_version, version());
        prop_assert_eq!(decoded.category, thing.category);
        prop_assert_eq!(decoded.flags, thing.flags);
        prop_assert_eq!(decoded.frame_groups, thing.frame_groups);
        prop_assert_eq!(decoded.pixels, pixels);
    }

    #[test]
    fn outfit_without_groups_round_trips(flags in proptest_helpers::arb_flags()) {
        let thing = Thing::new(103u32, ThingCategory::Outfit)
            .with_flags(flags)
            .with_frame_groups(Vec::new());
        let bytes = encode(&thing, &BTreeMap::new(), version()).expect("encode interchange");
        let decoded = decode(&bytes).expect("decode interchange");

        prop_assert_eq!(decoded.category, ThingCategory::Outfit);
        prop_assert_eq!(decoded.flags, thing.flags);
        prop_assert!(decoded.frame_groups.is_empty());
        prop_assert!(decoded.pixels.is_empty());
    }

    #[test]
    fn missing_pixels_are_rejected(thing in proptest_helpers::arb_thing(100, 40)) {
        let result = encode(&thing, &BTreeMap::new(), version());
        prop_assert_eq!(result.is_ok(), thing.referenced_sprites().next().is_none());
    }

    #[test]
    fn decode_never_panics_on_inflated_garbage(
        tag in prop_oneof![Just(200u16), Just(300u16)],
        body in prop::collection::vec(any::<u8>(), 0..128),
    ) {
        use std::io::Write;

        let mut raw = tag.to_le_bytes().to_vec();
        raw.extend_from_slice(&1098u16.to_le_bytes());
        raw.push(u8::from(ThingCategory::Item));
        raw.extend_from_slice(&body);

        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
        encoder.write_all(&raw).unwrap();
        let _ = decode(&encoder.finish().unwrap());
    }
}

#[test]
fn uncompressed_input_is_a_compression_error() {
    let err = decode(&[0x2C, 0x01, 0x4A, 0x04]).unwrap_err();
    assert!(matches!(
        err,
        thingkit::error::ThingkitError::Compression { .. }
    ));
}
