//! Run-length sprite pixel codec.
//!
//! A sprite blob is a 3-byte transparency key, a little-endian `u16` payload
//! length, and a run stream of `(skip: u16, run: u16, run × RGBA)` chunks
//! covering the 32×32 pixels in row-major order. Pixels past the last chunk
//! are transparent.

use serde::{Deserialize, Serialize};

use super::bytes::ByteReader;
use crate::error::ThingkitError;

/// Sprite edge length in pixels.
pub const SPRITE_SIZE: usize = 32;
/// Pixels per sprite.
pub const SPRITE_PIXELS: usize = SPRITE_SIZE * SPRITE_SIZE;
/// Bytes in a raw 32-bit sprite bitmap.
pub const BITMAP_LEN: usize = SPRITE_PIXELS * 4;

/// Written before every blob. Historically the color treated as transparent.
const TRANSPARENCY_KEY: [u8; 3] = [0xFF, 0x00, 0xFF];
const BLOB_HEADER_LEN: usize = 5;

/// A raw 32×32 RGBA sprite image.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Bitmap {
    rgba: Vec<u8>,
}

impl Bitmap {
    /// A fully transparent bitmap.
    pub fn transparent() -> Self {
        Self {
            rgba: vec![0; BITMAP_LEN],
        }
    }

    /// Wraps RGBA bytes; the buffer must be exactly [`BITMAP_LEN`] long.
    pub fn from_rgba(rgba: Vec<u8>) -> Result<Self, ThingkitError> {
        if rgba.len() != BITMAP_LEN {
            return Err(ThingkitError::Format {
                context: "bitmap",
                message: format!("expected {} bytes, got {}", BITMAP_LEN, rgba.len()),
            });
        }
        Ok(Self { rgba })
    }

    /// Converts from big-endian ARGB byte order.
    pub fn from_argb(argb: &[u8]) -> Result<Self, ThingkitError> {
        if argb.len() != BITMAP_LEN {
            return Err(ThingkitError::Format {
                context: "bitmap",
                message: format!("expected {} ARGB bytes, got {}", BITMAP_LEN, argb.len()),
            });
        }
        let rgba = argb
            .chunks_exact(4)
            .flat_map(|p| [p[1], p[2], p[3], p[0]])
            .collect();
        Ok(Self { rgba })
    }

    /// The pixels in big-endian ARGB byte order.
    pub fn to_argb(&self) -> Vec<u8> {
        self.rgba
            .chunks_exact(4)
            .flat_map(|p| [p[3], p[0], p[1], p[2]])
            .collect()
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn into_rgba(self) -> Vec<u8> {
        self.rgba
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        let i = (y * SPRITE_SIZE + x) * 4;
        self.rgba[i..i + 4].copy_from_slice(&rgba);
    }

    /// True when every pixel has zero alpha.
    pub fn is_blank(&self) -> bool {
        self.rgba.chunks_exact(4).all(|p| p[3] == 0)
    }
}

impl Default for Bitmap {
    fn default() -> Self {
        Self::transparent()
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let opaque = self.rgba.chunks_exact(4).filter(|p| p[3] != 0).count();
        write!(f, "Bitmap({opaque} opaque pixels)")
    }
}

impl TryFrom<Vec<u8>> for Bitmap {
    type Error = ThingkitError;

    fn try_from(rgba: Vec<u8>) -> Result<Self, Self::Error> {
        Bitmap::from_rgba(rgba)
    }
}

impl From<Bitmap> for Vec<u8> {
    fn from(bitmap: Bitmap) -> Self {
        bitmap.rgba
    }
}

/// Encodes a bitmap into a complete sprite blob.
///
/// A blank bitmap encodes to an empty run stream.
pub fn encode(bitmap: &Bitmap) -> Vec<u8> {
    let pixels: Vec<&[u8]> = bitmap.rgba.chunks_exact(4).collect();
    let mut runs = Vec::new();
    let mut i = 0;

    while i < SPRITE_PIXELS {
        let skip_start = i;
        while i < SPRITE_PIXELS && pixels[i][3] == 0 {
            i += 1;
        }
        if i == SPRITE_PIXELS {
            break;
        }
        let run_start = i;
        while i < SPRITE_PIXELS && pixels[i][3] != 0 {
            i += 1;
        }

        // Both counts are at most 1024.
        runs.extend_from_slice(&((run_start - skip_start) as u16).to_le_bytes());
        runs.extend_from_slice(&((i - run_start) as u16).to_le_bytes());
        for pixel in &pixels[run_start..i] {
            runs.extend_from_slice(pixel);
        }
    }

    let mut blob = Vec::with_capacity(BLOB_HEADER_LEN + runs.len());
    blob.extend_from_slice(&TRANSPARENCY_KEY);
    // A worst case alternating sprite needs 4096 bytes of runs.
    blob.extend_from_slice(&(runs.len() as u16).to_le_bytes());
    blob.extend_from_slice(&runs);
    blob
}

/// Decodes the blob starting at `offset` in `payload`.
pub fn decode(payload: &[u8], offset: usize) -> Result<Bitmap, ThingkitError> {
    let mut reader = ByteReader::at(payload, offset, "sprite blob")?;
    reader.bytes(TRANSPARENCY_KEY.len())?;
    let size = reader.u16()? as usize;
    let end = reader.position() + size;
    if end > reader.len() {
        return Err(ThingkitError::Truncated {
            context: "sprite blob",
            offset: reader.len(),
        });
    }

    let mut rgba = vec![0u8; BITMAP_LEN];
    let mut pixel = 0usize;

    while reader.position() < end && pixel < SPRITE_PIXELS {
        let skip = reader.u16()? as usize;
        let run = reader.u16()? as usize;
        if pixel + skip + run > SPRITE_PIXELS {
            return Err(reader.invalid(format!(
                "runs cover {} pixels, more than {}",
                pixel + skip + run,
                SPRITE_PIXELS
            )));
        }
        pixel += skip;
        let colored = reader.bytes(run * 4)?;
        rgba[pixel * 4..(pixel + run) * 4].copy_from_slice(colored);
        pixel += run;
    }

    if reader.position() > end {
        return Err(reader.invalid(format!(
            "run stream overruns its declared length of {size} bytes"
        )));
    }

    Ok(Bitmap { rgba })
}

/// Total length of the blob at `offset`, header included.
pub fn blob_len(payload: &[u8], offset: usize) -> Result<usize, ThingkitError> {
    let mut reader = ByteReader::at(payload, offset, "sprite blob")?;
    reader.bytes(TRANSPARENCY_KEY.len())?;
    let size = reader.u16()? as usize;
    let len = BLOB_HEADER_LEN + size;
    if offset + len > payload.len() {
        return Err(ThingkitError::Truncated {
            context: "sprite blob",
            offset: payload.len(),
        });
    }
    Ok(len)
}
