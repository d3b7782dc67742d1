//! Client content versions and the format features they imply.

use serde::Serialize;
use std::fmt;

use crate::error::ThingkitError;

/// Oldest content version the codecs understand.
pub const MIN_CLIENT_VERSION: u16 = 740;

const PATTERN_Z_SINCE: u16 = 755;
const EXTENDED_SINCE: u16 = 960;
const FRAME_DURATIONS_SINCE: u16 = 1050;
const FRAME_GROUPS_SINCE: u16 = 1057;

/// A client content version such as `1098` (10.98).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ClientVersion(u16);

impl ClientVersion {
    /// Creates a version, rejecting anything older than [`MIN_CLIENT_VERSION`].
    pub fn new(version: u16) -> Result<Self, ThingkitError> {
        if version < MIN_CLIENT_VERSION {
            return Err(ThingkitError::UnsupportedVersion { version });
        }
        Ok(Self(version))
    }

    /// Returns the raw version number.
    #[inline]
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Format features implied by this version.
    pub fn features(&self) -> Features {
        Features {
            pattern_z: self.0 >= PATTERN_Z_SINCE,
            extended: self.0 >= EXTENDED_SINCE,
            frame_durations: self.0 >= FRAME_DURATIONS_SINCE,
            frame_groups: self.0 >= FRAME_GROUPS_SINCE,
        }
    }
}

impl fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Layout switches derived from a [`ClientVersion`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Features {
    /// Frame groups carry a third pattern dimension.
    pub pattern_z: bool,
    /// Sprite counts and sprite IDs are 32-bit.
    pub extended: bool,
    /// Animated frame groups carry per-frame durations.
    pub frame_durations: bool,
    /// Outfits carry multiple typed frame groups.
    pub frame_groups: bool,
}

impl Features {
    const EXTENDED: u8 = 0x01;
    const FRAME_DURATIONS: u8 = 0x02;
    const FRAME_GROUPS: u8 = 0x04;
    const PATTERN_Z: u8 = 0x08;

    /// The feature byte stored in the container wrapper header.
    pub fn to_bits(self) -> u8 {
        let mut bits = 0;
        if self.extended {
            bits |= Self::EXTENDED;
        }
        if self.frame_durations {
            bits |= Self::FRAME_DURATIONS;
        }
        if self.frame_groups {
            bits |= Self::FRAME_GROUPS;
        }
        if self.pattern_z {
            bits |= Self::PATTERN_Z;
        }
        bits
    }
}
