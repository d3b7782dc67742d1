//! In-memory model of a thing catalogue and its sprite atlas.
//!
//! This module is pure data plus range arithmetic. Parsing and assembly live
//! in [`codec`](crate::codec); every mutation goes through a
//! [`Session`](crate::session::Session).
//!
//! # Design Principles
//!
//! 1. **Handles, not pointers**: things refer to sprites by [`SpriteId`],
//!    and the catalogue owns things in an ID-keyed map. Remapping either ID
//!    space is a rewrite of integers, never of object identity.
//!
//! 2. **Derived boundaries**: category ranges are computed from four
//!    counters, so they can never disagree with the counters.
//!
//! 3. **Exhaustive flags**: each flag is a variant carrying its own fields.
//!
//! # Example
//!
//! ```
//! use thingkit::model::{CategoryCounts, ThingCategory, ThingId};
//!
//! let counts = CategoryCounts { items: 3, outfits: 2, effects: 0, distances: 0 };
//! assert_eq!(counts.range(ThingCategory::Outfit), Some(ThingId(103)..=ThingId(104)));
//! assert_eq!(counts.display_id(ThingId(104)), Some(2));
//! ```

mod atlas;
mod catalog;
mod category;
mod container;
mod flags;
mod frames;
mod ids;
mod thing;
mod version;

// Re-export core types for convenient access
pub use atlas::SpriteData;
pub use catalog::{CategoryCounts, ObjectData, ITEM_BASE};
pub use category::ThingCategory;
pub use container::{ContainerInfo, WrapperInfo};
pub use flags::{MarketInfo, ThingFlag, ThingFlags};
pub use frames::{AnimationMode, FrameAnimation, FrameDuration, FrameGroup, FrameGroupType};
pub use ids::{SpriteId, ThingId};
pub use thing::Thing;
pub use version::{ClientVersion, Features, MIN_CLIENT_VERSION};
