//! Frame groups: the sprite grid of one appearance variant.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

use super::ids::SpriteId;

/// Which appearance variant a frame group describes.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    TryFromPrimitive,
    IntoPrimitive,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum FrameGroupType {
    #[default]
    Default = 0,
    Walking = 1,
}

/// How an animated frame group is scheduled.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    TryFromPrimitive,
    IntoPrimitive,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum AnimationMode {
    #[default]
    Async = 0,
    Sync = 1,
}

/// Display time bounds for one frame, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDuration {
    pub min: u32,
    pub max: u32,
}

impl FrameDuration {
    pub fn fixed(ms: u32) -> Self {
        Self { min: ms, max: ms }
    }
}

/// Animation metadata of a frame group with more than one frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameAnimation {
    pub mode: AnimationMode,
    /// `0` loops forever, negative values ping-pong.
    pub loop_count: i32,
    /// `-1` starts on a random frame.
    pub start_frame: i8,
    /// One entry per frame.
    pub durations: Vec<FrameDuration>,
}

impl FrameAnimation {
    /// Default animation for `frames` frames of `ms` each.
    pub fn uniform(frames: u8, ms: u32) -> Self {
        Self {
            mode: AnimationMode::Async,
            loop_count: 0,
            start_frame: 0,
            durations: vec![FrameDuration::fixed(ms); frames as usize],
        }
    }
}

/// One appearance variant of a thing and its sprite grid.
///
/// `sprites` holds one entry per combination of
/// (frame, pattern z, pattern y, pattern x, layer, tile y, tile x), in that
/// nesting order with tile x varying fastest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameGroup {
    #[serde(default)]
    pub group_type: FrameGroupType,
    pub width: u8,
    pub height: u8,
    /// Rendered size in pixels for things larger than one tile.
    pub exact_size: u8,
    pub layers: u8,
    pub pattern_x: u8,
    pub pattern_y: u8,
    pub pattern_z: u8,
    pub frames: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<FrameAnimation>,
    pub sprites: Vec<SpriteId>,
}

impl Default for FrameGroup {
    fn default() -> Self {
        Self::single_tile()
    }
}

impl FrameGroup {
    /// A 1×1, single-frame group referencing the blank sprite.
    pub fn single_tile() -> Self {
        Self {
            group_type: FrameGroupType::Default,
            width: 1,
            height: 1,
            exact_size: 32,
            layers: 1,
            pattern_x: 1,
            pattern_y: 1,
            pattern_z: 1,
            frames: 1,
            animation: None,
            sprites: vec![SpriteId::BLANK],
        }
    }

    /// Number of sprite slots implied by the group's dimensions.
    pub fn sprite_count(&self) -> usize {
        self.width as usize
            * self.height as usize
            * self.layers as usize
            * self.pattern_x as usize
            * self.pattern_y as usize
            * self.pattern_z as usize
            * self.frames as usize
    }

    /// Index into `sprites` for the given coordinates.
    #[allow(clippy::too_many_arguments)]
    pub fn sprite_index(
        &self,
        frame: u8,
        pattern_z: u8,
        pattern_y: u8,
        pattern_x: u8,
        layer: u8,
        tile_y: u8,
        tile_x: u8,
    ) -> usize {
        let mut index = frame as usize;
        index = index * self.pattern_z as usize + pattern_z as usize;
        index = index * self.pattern_y as usize + pattern_y as usize;
        index = index * self.pattern_x as usize + pattern_x as usize;
        index = index * self.layers as usize + layer as usize;
        index = index * self.height as usize + tile_y as usize;
        index * self.width as usize + tile_x as usize
    }

    /// Non-blank sprite references, in slot order.
    pub fn referenced_sprites(&self) -> impl Iterator<Item = SpriteId> + '_ {
        self.sprites.iter().copied().filter(|id| !id.is_blank())
    }
}
