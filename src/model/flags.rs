//! Thing behaviour flags.
//!
//! Each flag is a variant carrying exactly the fields it stores on disk, so
//! the tag stream encoder and decoder can match exhaustively. A thing holds
//! at most one flag per tag; [`ThingFlags`] keeps them sorted by tag, which
//! is also the order they are written in.

use serde::{Deserialize, Serialize};

/// Trade metadata for items sold on the in-game market.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketInfo {
    pub category: u16,
    /// Item ID this item is traded as.
    pub trade_as: u16,
    /// Item ID whose appearance is shown in the market.
    pub show_as: u16,
    /// Display name. Stored as Latin-1 on disk.
    pub name: String,
    /// Vocation restriction bitmask.
    pub vocation: u16,
    pub level: u16,
}

/// A single behaviour flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "flag", rename_all = "snake_case")]
pub enum ThingFlag {
    Ground { speed: u16 },
    GroundBorder,
    OnBottom,
    OnTop,
    Container,
    Stackable,
    ForceUse,
    MultiUse,
    Writable { max_length: u16 },
    WritableOnce { max_length: u16 },
    FluidContainer,
    Fluid,
    Unpassable,
    Unmoveable,
    BlockMissile,
    BlockPathfind,
    NoMoveAnimation,
    Pickupable,
    Hangable,
    HookSouth,
    HookEast,
    Rotatable,
    Light { level: u16, color: u16 },
    DontHide,
    Translucent,
    Offset { x: i16, y: i16 },
    Elevation { height: u16 },
    LyingObject,
    AnimateAlways,
    Minimap { color: u16 },
    LensHelp { id: u16 },
    FullGround,
    IgnoreLook,
    Cloth { slot: u16 },
    Market(MarketInfo),
    DefaultAction { action: u16 },
    Wrappable,
    Unwrappable,
    TopEffect,
    Usable,
}

impl ThingFlag {
    pub const GROUND: u8 = 0x00;
    pub const GROUND_BORDER: u8 = 0x01;
    pub const ON_BOTTOM: u8 = 0x02;
    pub const ON_TOP: u8 = 0x03;
    pub const CONTAINER: u8 = 0x04;
    pub const STACKABLE: u8 = 0x05;
    pub const FORCE_USE: u8 = 0x06;
    pub const MULTI_USE: u8 = 0x07;
    pub const WRITABLE: u8 = 0x08;
    pub const WRITABLE_ONCE: u8 = 0x09;
    pub const FLUID_CONTAINER: u8 = 0x0A;
    pub const FLUID: u8 = 0x0B;
    pub const UNPASSABLE: u8 = 0x0C;
    pub const UNMOVEABLE: u8 = 0x0D;
    pub const BLOCK_MISSILE: u8 = 0x0E;
    pub const BLOCK_PATHFIND: u8 = 0x0F;
    pub const NO_MOVE_ANIMATION: u8 = 0x10;
    pub const PICKUPABLE: u8 = 0x11;
    pub const HANGABLE: u8 = 0x12;
    pub const HOOK_SOUTH: u8 = 0x13;
    pub const HOOK_EAST: u8 = 0x14;
    pub const ROTATABLE: u8 = 0x15;
    pub const LIGHT: u8 = 0x16;
    pub const DONT_HIDE: u8 = 0x17;
    pub const TRANSLUCENT: u8 = 0x18;
    pub const OFFSET: u8 = 0x19;
    pub const ELEVATION: u8 = 0x1A;
    pub const LYING_OBJECT: u8 = 0x1B;
    pub const ANIMATE_ALWAYS: u8 = 0x1C;
    pub const MINIMAP: u8 = 0x1D;
    pub const LENS_HELP: u8 = 0x1E;
    pub const FULL_GROUND: u8 = 0x1F;
    pub const IGNORE_LOOK: u8 = 0x20;
    pub const CLOTH: u8 = 0x21;
    pub const MARKET: u8 = 0x22;
    pub const DEFAULT_ACTION: u8 = 0x23;
    pub const WRAPPABLE: u8 = 0x24;
    pub const UNWRAPPABLE: u8 = 0x25;
    pub const TOP_EFFECT: u8 = 0x26;
    pub const USABLE: u8 = 0xFE;

    /// Terminates the tag stream.
    pub const END: u8 = 0xFF;

    /// The on-disk tag byte of this flag.
    pub fn tag(&self) -> u8 {
        match self {
            ThingFlag::Ground { .. } => Self::GROUND,
            ThingFlag::GroundBorder => Self::GROUND_BORDER,
            ThingFlag::OnBottom => Self::ON_BOTTOM,
            ThingFlag::OnTop => Self::ON_TOP,
            ThingFlag::Container => Self::CONTAINER,
            ThingFlag::Stackable => Self::STACKABLE,
            ThingFlag::ForceUse => Self::FORCE_USE,
            ThingFlag::MultiUse => Self::MULTI_USE,
            ThingFlag::Writable { .. } => Self::WRITABLE,
            ThingFlag::WritableOnce { .. } => Self::WRITABLE_ONCE,
            ThingFlag::FluidContainer => Self::FLUID_CONTAINER,
            ThingFlag::Fluid => Self::FLUID,
            ThingFlag::Unpassable => Self::UNPASSABLE,
            ThingFlag::Unmoveable => Self::UNMOVEABLE,
            ThingFlag::BlockMissile => Self::BLOCK_MISSILE,
            ThingFlag::BlockPathfind => Self::BLOCK_PATHFIND,
            ThingFlag::NoMoveAnimation => Self::NO_MOVE_ANIMATION,
            ThingFlag::Pickupable => Self::PICKUPABLE,
            ThingFlag::Hangable => Self::HANGABLE,
            ThingFlag::HookSouth => Self::HOOK_SOUTH,
            ThingFlag::HookEast => Self::HOOK_EAST,
            ThingFlag::Rotatable => Self::ROTATABLE,
            ThingFlag::Light { .. } => Self::LIGHT,
            ThingFlag::DontHide => Self::DONT_HIDE,
            ThingFlag::Translucent => Self::TRANSLUCENT,
            ThingFlag::Offset { .. } => Self::OFFSET,
            ThingFlag::Elevation { .. } => Self::ELEVATION,
            ThingFlag::LyingObject => Self::LYING_OBJECT,
            ThingFlag::AnimateAlways => Self::ANIMATE_ALWAYS,
            ThingFlag::Minimap { .. } => Self::MINIMAP,
            ThingFlag::LensHelp { .. } => Self::LENS_HELP,
            ThingFlag::FullGround => Self::FULL_GROUND,
            ThingFlag::IgnoreLook => Self::IGNORE_LOOK,
            ThingFlag::Cloth { .. } => Self::CLOTH,
            ThingFlag::Market(_) => Self::MARKET,
            ThingFlag::DefaultAction { .. } => Self::DEFAULT_ACTION,
            ThingFlag::Wrappable => Self::WRAPPABLE,
            ThingFlag::Unwrappable => Self::UNWRAPPABLE,
            ThingFlag::TopEffect => Self::TOP_EFFECT,
            ThingFlag::Usable => Self::USABLE,
        }
    }

    /// Builds a field-less flag from its tag.
    ///
    /// Returns `None` both for unknown tags and for tags whose flag carries
    /// fields; the decoder handles the latter explicitly.
    pub(crate) fn unit_from_tag(tag: u8) -> Option<ThingFlag> {
        let flag = match tag {
            Self::GROUND_BORDER => ThingFlag::GroundBorder,
            Self::ON_BOTTOM => ThingFlag::OnBottom,
            Self::ON_TOP => ThingFlag::OnTop,
            Self::CONTAINER => ThingFlag::Container,
            Self::STACKABLE => ThingFlag::Stackable,
            Self::FORCE_USE => ThingFlag::ForceUse,
            Self::MULTI_USE => ThingFlag::MultiUse,
            Self::FLUID_CONTAINER => ThingFlag::FluidContainer,
            Self::FLUID => ThingFlag::Fluid,
            Self::UNPASSABLE => ThingFlag::Unpassable,
            Self::UNMOVEABLE => ThingFlag::Unmoveable,
            Self::BLOCK_MISSILE => ThingFlag::BlockMissile,
            Self::BLOCK_PATHFIND => ThingFlag::BlockPathfind,
            Self::NO_MOVE_ANIMATION => ThingFlag::NoMoveAnimation,
            Self::PICKUPABLE => ThingFlag::Pickupable,
            Self::HANGABLE => ThingFlag::Hangable,
            Self::HOOK_SOUTH => ThingFlag::HookSouth,
            Self::HOOK_EAST => ThingFlag::HookEast,
            Self::ROTATABLE => ThingFlag::Rotatable,
            Self::DONT_HIDE => ThingFlag::DontHide,
            Self::TRANSLUCENT => ThingFlag::Translucent,
            Self::LYING_OBJECT => ThingFlag::LyingObject,
            Self::ANIMATE_ALWAYS => ThingFlag::AnimateAlways,
            Self::FULL_GROUND => ThingFlag::FullGround,
            Self::IGNORE_LOOK => ThingFlag::IgnoreLook,
            Self::WRAPPABLE => ThingFlag::Wrappable,
            Self::UNWRAPPABLE => ThingFlag::Unwrappable,
            Self::TOP_EFFECT => ThingFlag::TopEffect,
            Self::USABLE => ThingFlag::Usable,
            _ => return None,
        };
        Some(flag)
    }
}

/// The set of flags on one thing, sorted by tag with no duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ThingFlag>", into = "Vec<ThingFlag>")]
pub struct ThingFlags {
    flags: Vec<ThingFlag>,
}

impl ThingFlags {
    /// Creates an empty flag set.
    pub fn new() -> Self {
        Self { flags: Vec::new() }
    }

    /// Inserts a flag, replacing any flag with the same tag.
    ///
    /// Returns the replaced flag, if any.
    pub fn insert(&mut self, flag: ThingFlag) -> Option<ThingFlag> {
        let tag = flag.tag();
        match self.flags.binary_search_by_key(&tag, ThingFlag::tag) {
            Ok(pos) => Some(std::mem::replace(&mut self.flags[pos], flag)),
            Err(pos) => {
                self.flags.insert(pos, flag);
                None
            }
        }
    }

    /// Removes the flag with the given tag.
    pub fn remove(&mut self, tag: u8) -> Option<ThingFlag> {
        self.flags
            .binary_search_by_key(&tag, ThingFlag::tag)
            .ok()
            .map(|pos| self.flags.remove(pos))
    }

    /// Returns the flag with the given tag.
    pub fn get(&self, tag: u8) -> Option<&ThingFlag> {
        self.flags
            .binary_search_by_key(&tag, ThingFlag::tag)
            .ok()
            .map(|pos| &self.flags[pos])
    }

    /// Returns true if a flag with the given tag is present.
    pub fn contains(&self, tag: u8) -> bool {
        self.get(tag).is_some()
    }

    /// Market metadata, if the thing is tradeable.
    pub fn market(&self) -> Option<&MarketInfo> {
        match self.get(ThingFlag::MARKET) {
            Some(ThingFlag::Market(info)) => Some(info),
            _ => None,
        }
    }

    /// Iterates flags in tag order.
    pub fn iter(&self) -> std::slice::Iter<'_, ThingFlag> {
        self.flags.iter()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl FromIterator<ThingFlag> for ThingFlags {
    fn from_iter<I: IntoIterator<Item = ThingFlag>>(iter: I) -> Self {
        let mut flags = ThingFlags::new();
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

impl From<Vec<ThingFlag>> for ThingFlags {
    fn from(flags: Vec<ThingFlag>) -> Self {
        flags.into_iter().collect()
    }
}

impl From<ThingFlags> for Vec<ThingFlag> {
    fn from(flags: ThingFlags) -> Self {
        flags.flags
    }
}

impl<'a> IntoIterator for &'a ThingFlags {
    type Item = &'a ThingFlag;
    type IntoIter = std::slice::Iter<'a, ThingFlag>;

    fn into_iter(self) -> Self::IntoIter {
        self.flags.iter()
    }
}
