//! Container envelope shared by the catalogue and sprite files.
//!
//! A container is optionally gzip-compressed as a whole. Inside, it either
//! starts with a 16-byte self-describing wrapper header or is a legacy
//! buffer whose content version must be supplied by the caller. Both
//! layouts then continue with a `u32` signature and the body.
//!
//! Wrapper header layout:
//!
//! | offset | size | field |
//! |--------|------|-------|
//! | 0 | 4 | magic `TKIT` |
//! | 4 | 1 | file type (1 catalogue, 2 sprites) |
//! | 5 | 1 | format version (1) |
//! | 6 | 2 | content version |
//! | 8 | 1 | feature flags, derived from the content version |
//! | 9 | 7 | reserved |

use byteorder::{WriteBytesExt, LE};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use tracing::{debug, warn};

use super::bytes::ByteReader;
use super::LoadOptions;
use crate::error::ThingkitError;
use crate::model::{ClientVersion, ContainerInfo, WrapperInfo};

pub const WRAPPER_MAGIC: [u8; 4] = *b"TKIT";
pub const WRAPPER_LEN: usize = 16;
const WRAPPER_FORMAT_VERSION: u8 = 1;
const FEATURES_OFFSET: usize = 8;
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// The two kinds of container file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileType {
    Catalogue = 1,
    Sprites = 2,
}

impl FileType {
    pub fn name(&self) -> &'static str {
        match self {
            FileType::Catalogue => "catalogue",
            FileType::Sprites => "sprite container",
        }
    }
}

/// A container with its envelope removed.
pub(crate) struct Opened {
    /// The decompressed buffer.
    pub buffer: Vec<u8>,
    /// The input as read, kept only when it was compressed.
    pub original: Vec<u8>,
    pub info: ContainerInfo,
    pub version: ClientVersion,
    /// Offset of the first byte after the signature.
    pub body_offset: usize,
}

/// Returns true if the buffer looks gzip-compressed.
pub fn is_compressed(buffer: &[u8]) -> bool {
    buffer.starts_with(&GZIP_MAGIC)
}

/// Returns true if the (decompressed) buffer starts with a wrapper header.
pub fn is_wrapped(buffer: &[u8]) -> bool {
    buffer.starts_with(&WRAPPER_MAGIC)
}

fn decompress(input: &[u8], file_type: FileType) -> Result<Vec<u8>, ThingkitError> {
    let mut out = Vec::with_capacity(input.len() * 4);
    GzDecoder::new(input)
        .read_to_end(&mut out)
        .map_err(|source| ThingkitError::Compression {
            context: file_type.name(),
            source,
        })?;
    Ok(out)
}

/// Strips compression and the header, resolving the content version.
pub(crate) fn open(
    input: &[u8],
    file_type: FileType,
    options: &LoadOptions,
) -> Result<Opened, ThingkitError> {
    let compressed = is_compressed(input);
    let (buffer, original) = if compressed {
        debug!(file_type = file_type.name(), "decompressing container");
        (decompress(input, file_type)?, input.to_vec())
    } else {
        (input.to_vec(), Vec::new())
    };

    let mut reader = ByteReader::new(&buffer, file_type.name());
    let (wrapper, version) = if is_wrapped(&buffer) {
        reader.bytes(WRAPPER_MAGIC.len())?;
        let found = reader.u8()?;
        if found != file_type as u8 {
            return Err(ThingkitError::WrongFileType {
                expected: file_type.name(),
                found,
            });
        }
        let format_version = reader.u8()?;
        if format_version != WRAPPER_FORMAT_VERSION {
            return Err(reader.invalid(format!(
                "unknown wrapper format version {format_version}"
            )));
        }
        let version = ClientVersion::new(reader.u16()?)?;
        let stored_features = reader.u8()?;
        let mut reserved = [0u8; 7];
        let stored_reserved = reader.bytes(reserved.len())?;
        reserved.copy_from_slice(stored_reserved);

        let derived = version.features().to_bits();
        if stored_features != derived {
            warn!(
                stored = stored_features,
                derived, "wrapper feature byte disagrees with content version {}", version
            );
        }
        let wrapper = WrapperInfo {
            format_version,
            stored_features,
            reserved,
        };
        (Some(wrapper), version)
    } else {
        (None, ClientVersion::new(options.client_version)?)
    };

    let signature = reader.u32()?;
    let body_offset = reader.position();

    Ok(Opened {
        buffer,
        original,
        info: ContainerInfo {
            signature,
            wrapper,
            compressed,
        },
        version,
        body_offset,
    })
}

/// Length of the header written by [`write_header`].
pub(crate) fn header_len(info: &ContainerInfo) -> usize {
    if info.wrapper.is_some() {
        WRAPPER_LEN + 4
    } else {
        4
    }
}

/// Writes the optional wrapper header and the signature.
pub(crate) fn write_header(
    out: &mut Vec<u8>,
    file_type: FileType,
    version: ClientVersion,
    info: &ContainerInfo,
) -> Result<(), ThingkitError> {
    if let Some(wrapper) = &info.wrapper {
        out.write_all(&WRAPPER_MAGIC)?;
        out.write_u8(file_type as u8)?;
        out.write_u8(wrapper.format_version)?;
        out.write_u16::<LE>(version.as_u16())?;
        out.write_u8(version.features().to_bits())?;
        out.write_all(&wrapper.reserved)?;
    }
    out.write_u32::<LE>(info.signature)?;
    Ok(())
}

/// The source buffer unchanged, except that a wrapper's feature byte is
/// re-derived from the content version.
pub(crate) fn passthrough(source: &[u8], info: &ContainerInfo, version: ClientVersion) -> Vec<u8> {
    let mut out = source.to_vec();
    if info.wrapper.is_some() && out.len() > FEATURES_OFFSET {
        let derived = version.features().to_bits();
        if out[FEATURES_OFFSET] != derived {
            debug!(
                stored = out[FEATURES_OFFSET],
                derived, "patching wrapper feature byte"
            );
            out[FEATURES_OFFSET] = derived;
        }
    }
    out
}

/// Re-applies whole-buffer compression if the container was loaded
/// compressed.
pub fn seal(buffer: Vec<u8>, info: &ContainerInfo) -> Result<Vec<u8>, ThingkitError> {
    if !info.compressed {
        return Ok(buffer);
    }
    let mut encoder = GzEncoder::new(Vec::with_capacity(buffer.len() / 2), Compression::default());
    encoder.write_all(&buffer)?;
    Ok(encoder.finish()?)
}

/// Like [`seal`], but returns `original` as is when `buffer` is exactly
/// the body it was decompressed to. Another compressor's output then
/// survives an unedited save byte for byte.
pub(crate) fn reseal(
    buffer: Vec<u8>,
    info: &ContainerInfo,
    source: &[u8],
    original: &[u8],
) -> Result<Vec<u8>, ThingkitError> {
    if info.compressed && !original.is_empty() && buffer == source {
        debug!("container body unchanged, reusing compressed input");
        return Ok(original.to_vec());
    }
    seal(buffer, info)
}
