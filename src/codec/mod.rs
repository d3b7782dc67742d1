//! Binary codecs for the catalogue, the sprite atlas and interchange files.
//!
//! Every decoder works on an in-memory buffer and reports malformed input
//! as a [`ThingkitError`](crate::error::ThingkitError) naming what was
//! being read; none of them panic on bad data.
//!
//! Assemblers take the parsed data plus explicit dirty sets and copy
//! unchanged records from the source buffer byte-for-byte, so a load/save
//! cycle without edits reproduces the input.

pub(crate) mod bytes;

pub mod atlas;
pub mod catalog;
pub mod container;
pub mod interchange;
pub mod sprite;
mod things;

pub use container::{seal, FileType};
pub use interchange::InterchangeThing;
pub use sprite::{Bitmap, BITMAP_LEN, SPRITE_PIXELS, SPRITE_SIZE};

/// Client version assumed for containers without a wrapper header.
pub const DEFAULT_CLIENT_VERSION: u16 = 1098;

/// Options for parsing container files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadOptions {
    /// Content version of legacy containers. Wrapped containers declare
    /// their own and ignore this.
    pub client_version: u16,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            client_version: DEFAULT_CLIENT_VERSION,
        }
    }
}

impl LoadOptions {
    pub fn new(client_version: u16) -> Self {
        Self { client_version }
    }
}
