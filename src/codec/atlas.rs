//! Sprite container: an address table followed by run-length sprite blobs.
//!
//! Layout after the envelope:
//!
//! ```text
//! [count u16 | u32 when extended][address u32 × count][blobs]
//! ```
//!
//! Addresses are absolute offsets into the decompressed buffer, indexed by
//! `sprite id - 1`. Address `0` means the sprite has no blob.

use byteorder::{WriteBytesExt, LE};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::bytes::ByteReader;
use super::container::{self, FileType};
use super::sprite::{self, Bitmap};
use super::LoadOptions;
use crate::error::ThingkitError;
use crate::model::{ClientVersion, SpriteData, SpriteId};

fn count_width(version: ClientVersion) -> usize {
    if version.features().extended {
        4
    } else {
        2
    }
}

/// Largest sprite count a version can store.
pub fn max_sprites(version: ClientVersion) -> u32 {
    if version.features().extended {
        u32::MAX
    } else {
        u32::from(u16::MAX)
    }
}

/// Parses a sprite container. Blobs are not decoded until asked for.
pub fn parse(input: &[u8], options: &LoadOptions) -> Result<SpriteData, ThingkitError> {
    let opened = container::open(input, FileType::Sprites, options)?;
    let mut reader = ByteReader::at(&opened.buffer, opened.body_offset, "sprite container")?;

    let sprite_count = if count_width(opened.version) == 4 {
        reader.u32()?
    } else {
        u32::from(reader.u16()?)
    };

    let table_len = sprite_count as usize * 4;
    if reader.position() + table_len > reader.len() {
        return Err(ThingkitError::Truncated {
            context: "sprite address table",
            offset: reader.len(),
        });
    }
    let mut addresses = Vec::with_capacity(sprite_count as usize);
    for _ in 0..sprite_count {
        addresses.push(reader.u32()?);
    }
    debug!(
        version = opened.version.as_u16(),
        sprite_count,
        blank = addresses.iter().filter(|a| **a == 0).count(),
        "parsed sprite container"
    );

    Ok(SpriteData {
        version: opened.version,
        sprite_count,
        addresses,
        container: opened.info,
        source_count: sprite_count,
        source: opened.buffer,
        original: opened.original,
    })
}

/// Decodes one sprite from the container it was parsed from.
///
/// Sprites without a blob decode as fully transparent.
pub fn decode_sprite(sprites: &SpriteData, id: SpriteId) -> Result<Bitmap, ThingkitError> {
    if !sprites.contains(id) {
        return Err(ThingkitError::UnknownSprite(id));
    }
    match sprites.address(id) {
        Some(address) => sprite::decode(&sprites.source, address as usize),
        None => Ok(Bitmap::transparent()),
    }
}

/// Where the bytes of one output blob come from.
enum Blob<'a> {
    /// Copied verbatim from the source buffer.
    Borrowed(&'a [u8]),
    /// Freshly encoded.
    Owned(Vec<u8>),
    /// No blob; the address is written as 0.
    Empty,
}

impl Blob<'_> {
    fn bytes(&self) -> &[u8] {
        match self {
            Blob::Borrowed(bytes) => bytes,
            Blob::Owned(bytes) => bytes,
            Blob::Empty => &[],
        }
    }
}

/// Serializes a sprite container.
///
/// Sprites in `overrides` are encoded from their bitmap (a blank bitmap
/// gets no blob). Sprites in `dirty` without an override are decoded from
/// the source and encoded again. Everything else is copied verbatim. With
/// no overrides, nothing dirty and an unchanged count the source buffer is
/// returned as is, apart from a re-derived wrapper feature byte.
pub fn assemble(
    sprites: &SpriteData,
    overrides: &BTreeMap<SpriteId, Bitmap>,
    dirty: &BTreeSet<SpriteId>,
) -> Result<Vec<u8>, ThingkitError> {
    if overrides.is_empty()
        && dirty.is_empty()
        && sprites.sprite_count == sprites.source_count
        && !sprites.source.is_empty()
    {
        debug!("sprite container unchanged, passing source through");
        return Ok(container::passthrough(
            &sprites.source,
            &sprites.container,
            sprites.version,
        ));
    }

    let max = max_sprites(sprites.version);
    if sprites.sprite_count > max {
        return Err(ThingkitError::Capacity {
            what: "sprites",
            count: u64::from(sprites.sprite_count),
            max: u64::from(max),
        });
    }

    let mut blobs = Vec::with_capacity(sprites.sprite_count as usize);
    let (mut copied, mut encoded) = (0usize, 0usize);
    for raw in 1..=sprites.sprite_count {
        let id = SpriteId(raw);
        let blob = if let Some(bitmap) = overrides.get(&id) {
            if bitmap.is_blank() {
                Blob::Empty
            } else {
                encoded += 1;
                Blob::Owned(sprite::encode(bitmap))
            }
        } else {
            match sprites.address(id) {
                None => Blob::Empty,
                Some(address) if dirty.contains(&id) => {
                    let bitmap = sprite::decode(&sprites.source, address as usize)?;
                    encoded += 1;
                    Blob::Owned(sprite::encode(&bitmap))
                }
                Some(address) => {
                    let start = address as usize;
                    let len = sprite::blob_len(&sprites.source, start)?;
                    copied += 1;
                    Blob::Borrowed(&sprites.source[start..start + len])
                }
            }
        };
        blobs.push(blob);
    }

    let header_len = container::header_len(&sprites.container);
    let data_start = header_len + count_width(sprites.version) + 4 * blobs.len();
    let total = data_start + blobs.iter().map(|b| b.bytes().len()).sum::<usize>();
    if u32::try_from(total).is_err() {
        return Err(ThingkitError::Capacity {
            what: "sprite container bytes",
            count: total as u64,
            max: u64::from(u32::MAX),
        });
    }

    let mut out = Vec::with_capacity(total);
    container::write_header(&mut out, FileType::Sprites, sprites.version, &sprites.container)?;
    if count_width(sprites.version) == 4 {
        out.write_u32::<LE>(sprites.sprite_count)?;
    } else {
        // Bounded by the capacity check above.
        out.write_u16::<LE>(sprites.sprite_count as u16)?;
    }

    let mut offset = data_start;
    for blob in &blobs {
        match blob {
            Blob::Empty => out.write_u32::<LE>(0)?,
            _ => {
                out.write_u32::<LE>(offset as u32)?;
                offset += blob.bytes().len();
            }
        }
    }
    for blob in &blobs {
        out.extend_from_slice(blob.bytes());
    }

    debug!(copied, encoded, bytes = out.len(), "assembled sprite container");
    Ok(out)
}

/// Fuzz-only entrypoint for sprite container parsing. Also decodes every
/// sprite the table points at.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse(data: &[u8]) -> Result<(), ThingkitError> {
    let sprites = parse(data, &LoadOptions::default())?;
    for raw in 1..=sprites.sprite_count.min(4096) {
        let _ = decode_sprite(&sprites, SpriteId(raw));
    }
    Ok(())
}
