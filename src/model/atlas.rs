use super::container::ContainerInfo;
use super::ids::SpriteId;
use super::version::ClientVersion;

/// A parsed sprite container: the address table plus the buffer it indexes.
#[derive(Clone, Debug)]
pub struct SpriteData {
    pub version: ClientVersion,
    pub sprite_count: u32,
    /// Blob offset per sprite, indexed by `id - 1`. `0` means no blob.
    pub addresses: Vec<u32>,
    pub container: ContainerInfo,

    pub(crate) source_count: u32,
    /// The decompressed buffer; addresses are absolute offsets into it.
    pub(crate) source: Vec<u8>,
    /// The compressed input, when the atlas was loaded compressed.
    pub(crate) original: Vec<u8>,
}

impl SpriteData {
    /// Creates an empty atlas with a legacy header.
    pub fn new(version: ClientVersion) -> Self {
        Self {
            version,
            sprite_count: 0,
            addresses: Vec::new(),
            container: ContainerInfo::default(),
            source_count: 0,
            source: Vec::new(),
            original: Vec::new(),
        }
    }

    /// Returns true if `id` is a valid non-blank sprite ID.
    pub fn contains(&self, id: SpriteId) -> bool {
        !id.is_blank() && id.0 <= self.sprite_count
    }

    /// Offset of the sprite's encoded blob, if it has one.
    pub fn address(&self, id: SpriteId) -> Option<u32> {
        if id.is_blank() {
            return None;
        }
        self.addresses
            .get(id.0 as usize - 1)
            .copied()
            .filter(|addr| *addr != 0)
    }

    /// The buffer this atlas was parsed from (empty when built in memory).
    pub fn source(&self) -> &[u8] {
        &self.source
    }
}
