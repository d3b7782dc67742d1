use proptest::prelude::*;
use thingkit::codec::sprite::{blob_len, decode, encode};
use thingkit::codec::{Bitmap, SPRITE_PIXELS};

mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn sprite_roundtrip_is_lossless(bitmap in proptest_helpers::arb_bitmap()) {
        let blob = encode(&bitmap);
        let decoded = decode(&blob, 0).expect("decode encoded sprite");

        prop_assert_eq!(decoded, bitmap);
    }

    #[test]
    fn blob_len_covers_exactly_the_encoded_blob(
        bitmap in proptest_helpers::arb_bitmap(),
        prefix in prop::collection::vec(any::<u8>(), 0..16),
    ) {
        let blob = encode(&bitmap);
        let mut payload = prefix.clone();
        payload.extend_from_slice(&blob);
        payload.extend_from_slice(&[0xAA; 7]);

        prop_assert_eq!(blob_len(&payload, prefix.len()).expect("blob length"), blob.len());
        prop_assert_eq!(decode(&payload, prefix.len()).expect("decode at offset"), bitmap);
    }

    #[test]
    fn encoded_size_is_bounded(bitmap in proptest_helpers::arb_bitmap()) {
        let visible = bitmap.as_rgba().chunks_exact(4).filter(|p| p[3] != 0).count();
        let blob = encode(&bitmap);

        // Header, then at most one skip/run pair per visible pixel.
        prop_assert!(blob.len() <= 5 + visible * 8);
        prop_assert!(blob.len() >= 5 + visible * 4);
        prop_assert_eq!(bitmap.is_blank(), blob.len() == 5);
    }

    #[test]
    fn decode_never_panics_on_garbage(
        payload in prop::collection::vec(any::<u8>(), 0..256),
        offset in 0usize..16,
    ) {
        if let Ok(bitmap) = decode(&payload, offset) {
            prop_assert_eq!(bitmap.as_rgba().len(), SPRITE_PIXELS * 4);
        }
    }
}

#[test]
fn fully_opaque_sprite_is_one_run() {
    let bitmap = Bitmap::from_rgba(vec![0x7F; SPRITE_PIXELS * 4]).unwrap();
    let blob = encode(&bitmap);
    assert_eq!(blob.len(), 5 + 4 + SPRITE_PIXELS * 4);
    assert_eq!(decode(&blob, 0).unwrap(), bitmap);
}
