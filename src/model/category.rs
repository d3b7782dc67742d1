//! Thing categories and their on-disk codes.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four kinds of thing, in ID-space order.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    TryFromPrimitive,
    IntoPrimitive,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ThingCategory {
    Item = 1,
    Outfit = 2,
    Effect = 3,
    Distance = 4,
}

impl ThingCategory {
    /// All categories in the order their ID ranges appear.
    pub const ALL: [ThingCategory; 4] = [
        ThingCategory::Item,
        ThingCategory::Outfit,
        ThingCategory::Effect,
        ThingCategory::Distance,
    ];

    /// Human-readable name for the category.
    pub fn name(&self) -> &'static str {
        match self {
            ThingCategory::Item => "item",
            ThingCategory::Outfit => "outfit",
            ThingCategory::Effect => "effect",
            ThingCategory::Distance => "distance",
        }
    }

    /// Frame duration in milliseconds assumed when a layout carries none.
    pub fn default_frame_duration(&self) -> u32 {
        match self {
            ThingCategory::Item => 500,
            ThingCategory::Outfit => 300,
            ThingCategory::Effect | ThingCategory::Distance => 100,
        }
    }

    /// Position of this category in [`ThingCategory::ALL`].
    pub(crate) fn index(&self) -> usize {
        match self {
            ThingCategory::Item => 0,
            ThingCategory::Outfit => 1,
            ThingCategory::Effect => 2,
            ThingCategory::Distance => 3,
        }
    }
}

impl fmt::Display for ThingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
