//! Single-thing interchange files.
//!
//! An interchange file carries one thing with its flags, frame groups and
//! the raw pixels of every sprite it references, so it can be moved
//! between catalogues. The whole file is zlib-compressed.
//!
//! The current layout (tag `300`):
//!
//! ```text
//! u16 300 | u16 client version | u8 category | u32 sprites offset
//! flag tag stream
//! u8 group count                       (outfits only)
//! per group:
//!     type byte, group body (animation block whenever frames > 1)
//!     per sprite slot: u32 id | u32 length (0 or 4096) | ARGB pixels
//! ```
//!
//! The sprites offset points at the first byte after the flag stream.
//! Files tagged `200` are still read. Older files started directly with a
//! client version and are rejected with a request to re-export them.

use byteorder::{WriteBytesExt, LE};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::collections::BTreeMap;
use std::io::{Read, Write};

use super::bytes::ByteReader;
use super::sprite::{Bitmap, BITMAP_LEN};
use super::things::{self, GroupLayout};
use crate::error::ThingkitError;
use crate::model::{ClientVersion, FrameGroup, SpriteId, Thing, ThingCategory, ThingFlags};

/// Layout tag written by [`encode`].
pub const CURRENT_LAYOUT: u16 = 300;
/// Previous layout, still accepted by [`decode`].
pub const PREVIOUS_LAYOUT: u16 = 200;
/// A leading word this large is a client version from a pre-tagged file.
const LEGACY_THRESHOLD: u16 = 710;

const SPRITES_OFFSET_POS: usize = 5;

/// A decoded interchange file.
#[derive(Clone, Debug, PartialEq)]
pub struct InterchangeThing {
    pub client_version: ClientVersion,
    pub category: ThingCategory,
    pub flags: ThingFlags,
    pub frame_groups: Vec<FrameGroup>,
    /// Pixels of every sprite the frame groups reference, keyed by the
    /// sprite ID in the exporting catalogue. Fully transparent sprites are
    /// left out; their slots import as blank.
    pub pixels: BTreeMap<SpriteId, Bitmap>,
}

fn layout(version: ClientVersion, category: ThingCategory, typed: bool) -> GroupLayout {
    GroupLayout {
        group_count: typed && category == ThingCategory::Outfit,
        group_type: typed,
        pattern_z: version.features().pattern_z,
        durations: true,
        wide_sprite_ids: true,
    }
}

/// Encodes a thing and the pixels of its sprites in the current layout.
///
/// `pixels` must hold a bitmap for every non-blank sprite the thing
/// references.
pub fn encode(
    thing: &Thing,
    pixels: &BTreeMap<SpriteId, Bitmap>,
    version: ClientVersion,
) -> Result<Vec<u8>, ThingkitError> {
    let layout = layout(version, thing.category, true);
    let mut out = Vec::new();
    out.write_u16::<LE>(CURRENT_LAYOUT)?;
    out.write_u16::<LE>(version.as_u16())?;
    out.write_u8(thing.category.into())?;
    out.write_u32::<LE>(0)?;
    things::write_flags(&mut out, &thing.flags)?;

    let sprites_offset = out.len() as u32;
    out[SPRITES_OFFSET_POS..SPRITES_OFFSET_POS + 4].copy_from_slice(&sprites_offset.to_le_bytes());

    if layout.group_count {
        let count = u8::try_from(thing.frame_groups.len()).map_err(|_| ThingkitError::Capacity {
            what: "frame groups",
            count: thing.frame_groups.len() as u64,
            max: u64::from(u8::MAX),
        })?;
        out.write_u8(count)?;
    } else if thing.frame_groups.len() != 1 {
        return Err(ThingkitError::Format {
            context: "interchange",
            message: format!(
                "a {} must have exactly one frame group, found {}",
                thing.category,
                thing.frame_groups.len()
            ),
        });
    }

    for group in &thing.frame_groups {
        things::write_group_header(&mut out, group, thing.category, layout)?;
        for id in &group.sprites {
            out.write_u32::<LE>(id.0)?;
            if id.is_blank() {
                out.write_u32::<LE>(0)?;
                continue;
            }
            let bitmap = pixels.get(id).ok_or(ThingkitError::UnknownSprite(*id))?;
            out.write_u32::<LE>(BITMAP_LEN as u32)?;
            out.write_all(&bitmap.to_argb())?;
        }
    }

    let mut encoder = ZlibEncoder::new(Vec::with_capacity(out.len() / 2), Compression::default());
    encoder.write_all(&out)?;
    Ok(encoder.finish()?)
}

fn inflate(input: &[u8]) -> Result<Vec<u8>, ThingkitError> {
    let mut out = Vec::with_capacity(input.len() * 4);
    ZlibDecoder::new(input)
        .read_to_end(&mut out)
        .map_err(|source| ThingkitError::Compression {
            context: "interchange file",
            source,
        })?;
    Ok(out)
}

/// Decodes an interchange file in either supported layout.
pub fn decode(input: &[u8]) -> Result<InterchangeThing, ThingkitError> {
    let buffer = inflate(input)?;
    let mut reader = ByteReader::new(&buffer, "interchange");
    let tag = reader.u16()?;
    match tag {
        CURRENT_LAYOUT => decode_current(&mut reader),
        PREVIOUS_LAYOUT => decode_previous(&mut reader),
        client_version if client_version >= LEGACY_THRESHOLD => {
            Err(ThingkitError::LegacyInterchange { client_version })
        }
        other => Err(reader.invalid(format!("unknown layout tag {other}"))),
    }
}

fn read_header(
    reader: &mut ByteReader<'_>,
) -> Result<(ClientVersion, ThingCategory), ThingkitError> {
    let version = ClientVersion::new(reader.u16()?)?;
    let code = reader.u8()?;
    let category = ThingCategory::try_from(code)
        .map_err(|_| reader.invalid(format!("unknown category code {code}")))?;
    Ok((version, category))
}

fn decode_current(reader: &mut ByteReader<'_>) -> Result<InterchangeThing, ThingkitError> {
    let (client_version, category) = read_header(reader)?;
    let sprites_offset = reader.u32()? as usize;
    let flags = things::read_flags(reader)?;
    if sprites_offset > reader.len() {
        return Err(reader.invalid(format!(
            "sprites offset {sprites_offset} is past the end ({} bytes)",
            reader.len()
        )));
    }
    reader.seek(sprites_offset)?;

    let layout = layout(client_version, category, true);
    let group_count = if layout.group_count { reader.u8()? } else { 1 };
    let mut frame_groups = Vec::with_capacity(group_count as usize);
    let mut pixels = BTreeMap::new();
    for _ in 0..group_count {
        let mut group = things::read_group_header(reader, category, layout)?;
        let slots = group.sprite_count();
        group.sprites = Vec::with_capacity(slots.min(reader.len() / 8));
        for _ in 0..slots {
            let id = SpriteId(reader.u32()?);
            let len = reader.u32()? as usize;
            match len {
                0 => {}
                BITMAP_LEN => {
                    let bitmap = Bitmap::from_argb(reader.bytes(BITMAP_LEN)?)?;
                    if !id.is_blank() && !bitmap.is_blank() {
                        pixels.insert(id, bitmap);
                    }
                }
                other => {
                    return Err(reader.invalid(format!(
                        "sprite {id} has {other} pixel bytes, expected 0 or {BITMAP_LEN}"
                    )))
                }
            }
            group.sprites.push(id);
        }
        frame_groups.push(group);
    }

    Ok(InterchangeThing {
        client_version,
        category,
        flags,
        frame_groups,
        pixels,
    })
}

fn decode_previous(reader: &mut ByteReader<'_>) -> Result<InterchangeThing, ThingkitError> {
    let (client_version, category) = read_header(reader)?;
    let flags = things::read_flags(reader)?;

    let layout = layout(client_version, category, false);
    let mut group = things::read_group_header(reader, category, layout)?;
    let slots = group.sprite_count();
    group.sprites = Vec::with_capacity(slots.min(reader.len() / (4 + BITMAP_LEN)));
    let mut pixels = BTreeMap::new();
    for _ in 0..slots {
        let id = SpriteId(reader.u32()?);
        let bitmap = Bitmap::from_argb(reader.bytes(BITMAP_LEN)?)?;
        if !id.is_blank() && !bitmap.is_blank() {
            pixels.insert(id, bitmap);
        }
        group.sprites.push(id);
    }

    Ok(InterchangeThing {
        client_version,
        category,
        flags,
        frame_groups: vec![group],
        pixels,
    })
}

/// Fuzz-only entrypoint for interchange decoding. Takes the inflated
/// bytes so the fuzzer does not have to produce valid zlib streams.
#[cfg(feature = "fuzzing")]
pub fn fuzz_decode_inflated(data: &[u8]) -> Result<(), ThingkitError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(data)?;
    let _ = decode(&encoder.finish()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FrameGroupType, ThingFlag};

    fn version() -> ClientVersion {
        ClientVersion::new(1098).unwrap()
    }

    fn red() -> Bitmap {
        let mut bitmap = Bitmap::transparent();
        bitmap.set_pixel(0, 0, [255, 0, 0, 255]);
        bitmap
    }

    fn deflate(raw: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(raw).unwrap();
        encoder.finish().unwrap()
    }

    fn item() -> Thing {
        let mut group = FrameGroup::single_tile();
        group.pattern_x = 2;
        group.sprites = vec![SpriteId(7), SpriteId::BLANK];
        Thing::new(100u32, ThingCategory::Item)
            .with_flags(vec![ThingFlag::Pickupable, ThingFlag::Elevation { height: 8 }].into())
            .with_frame_groups(vec![group])
    }

    #[test]
    fn item_round_trips() {
        let thing = item();
        let pixels = BTreeMap::from([(SpriteId(7), red())]);
        let bytes = encode(&thing, &pixels, version()).unwrap();

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.client_version, version());
        assert_eq!(decoded.category, ThingCategory::Item);
        assert_eq!(decoded.flags, thing.flags);
        assert_eq!(decoded.frame_groups, thing.frame_groups);
        assert_eq!(decoded.pixels, pixels);
    }

    #[test]
    fn sprites_offset_points_past_flags() {
        let thing = item();
        let pixels = BTreeMap::from([(SpriteId(7), red())]);
        let raw = inflate(&encode(&thing, &pixels, version()).unwrap()).unwrap();
        // header 9 bytes, flags: 0x11, 0x1A + u16, 0xFF
        let offset = u32::from_le_bytes(raw[5..9].try_into().unwrap());
        assert_eq!(offset, 9 + 1 + 3 + 1);
    }

    #[test]
    fn outfit_groups_keep_their_types() {
        let mut idle = FrameGroup::single_tile();
        idle.sprites = vec![SpriteId(1)];
        let mut walking = FrameGroup::single_tile();
        walking.group_type = FrameGroupType::Walking;
        walking.frames = 2;
        walking.animation = Some(crate::model::FrameAnimation::uniform(2, 300));
        walking.sprites = vec![SpriteId(1), SpriteId(2)];
        let thing = Thing::new(300u32, ThingCategory::Outfit).with_frame_groups(vec![idle, walking]);
        let pixels = BTreeMap::from([(SpriteId(1), red()), (SpriteId(2), Bitmap::transparent())]);

        let decoded = decode(&encode(&thing, &pixels, version()).unwrap()).unwrap();
        assert_eq!(decoded.frame_groups, thing.frame_groups);
        assert_eq!(decoded.pixels.len(), 1);
        assert!(!decoded.pixels.contains_key(&SpriteId(2)));
    }

    #[test]
    fn missing_pixels_are_an_error() {
        let err = encode(&item(), &BTreeMap::new(), version()).unwrap_err();
        assert!(matches!(err, ThingkitError::UnknownSprite(SpriteId(7))));
    }

    #[test]
    fn previous_layout_is_read() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&200u16.to_le_bytes());
        raw.extend_from_slice(&1098u16.to_le_bytes());
        raw.push(3); // effect
        raw.extend_from_slice(&[0x11, 0xFF]);
        // w, h, layers, px, py, pz, frames
        raw.extend_from_slice(&[1, 1, 1, 1, 1, 1, 1]);
        raw.extend_from_slice(&42u32.to_le_bytes());
        raw.extend_from_slice(&red().to_argb());

        let decoded = decode(&deflate(&raw)).unwrap();
        assert_eq!(decoded.category, ThingCategory::Effect);
        assert!(decoded.flags.contains(ThingFlag::PICKUPABLE));
        assert_eq!(decoded.frame_groups.len(), 1);
        assert_eq!(decoded.frame_groups[0].sprites, vec![SpriteId(42)]);
        assert_eq!(decoded.pixels[&SpriteId(42)], red());
    }

    #[test]
    fn legacy_files_ask_for_reexport() {
        let mut raw = 860u16.to_le_bytes().to_vec();
        raw.extend_from_slice(&[0; 16]);
        let err = decode(&deflate(&raw)).unwrap_err();
        assert!(matches!(
            err,
            ThingkitError::LegacyInterchange {
                client_version: 860
            }
        ));
    }

    #[test]
    fn unknown_tag_is_format_error() {
        let raw = 5u16.to_le_bytes();
        assert!(matches!(
            decode(&deflate(&raw)).unwrap_err(),
            ThingkitError::Format { .. }
        ));
    }

    #[test]
    fn sprites_offset_out_of_bounds() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&300u16.to_le_bytes());
        raw.extend_from_slice(&1098u16.to_le_bytes());
        raw.push(1);
        raw.extend_from_slice(&9999u32.to_le_bytes());
        raw.push(0xFF);
        assert!(matches!(
            decode(&deflate(&raw)).unwrap_err(),
            ThingkitError::Format { .. }
        ));
    }

    #[test]
    fn not_zlib_is_compression_error() {
        let err = decode(b"definitely not zlib").unwrap_err();
        assert!(matches!(err, ThingkitError::Compression { .. }));
    }
}
