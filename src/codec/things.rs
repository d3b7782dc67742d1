//! Flag tag streams and frame-group records.
//!
//! The catalogue container and the interchange file describe a thing the
//! same way and differ only in which optional fields are present. Those
//! differences are captured by [`GroupLayout`].

use byteorder::{WriteBytesExt, LE};
use std::io::Write;

use super::bytes::ByteReader;
use crate::error::ThingkitError;
use crate::model::{
    AnimationMode, FrameAnimation, FrameDuration, FrameGroup, FrameGroupType, MarketInfo,
    SpriteId, Thing, ThingCategory, ThingFlag, ThingFlags, ThingId,
};

/// Exact size assumed for single-tile groups, which do not store it.
const DEFAULT_EXACT_SIZE: u8 = 32;

/// Which optional fields a frame-group record carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct GroupLayout {
    /// A `u8` group count precedes the groups.
    pub group_count: bool,
    /// Each group starts with its type byte.
    pub group_type: bool,
    pub pattern_z: bool,
    /// Animated groups carry mode, loop count, start frame and durations.
    pub durations: bool,
    /// Sprite IDs are `u32` rather than `u16`.
    pub wide_sprite_ids: bool,
}

// --- flags -------------------------------------------------------------------

pub(crate) fn write_flags(out: &mut Vec<u8>, flags: &ThingFlags) -> Result<(), ThingkitError> {
    for flag in flags {
        out.write_u8(flag.tag())?;
        match flag {
            ThingFlag::Ground { speed } => out.write_u16::<LE>(*speed)?,
            ThingFlag::Writable { max_length } | ThingFlag::WritableOnce { max_length } => {
                out.write_u16::<LE>(*max_length)?
            }
            ThingFlag::Light { level, color } => {
                out.write_u16::<LE>(*level)?;
                out.write_u16::<LE>(*color)?;
            }
            ThingFlag::Offset { x, y } => {
                out.write_i16::<LE>(*x)?;
                out.write_i16::<LE>(*y)?;
            }
            ThingFlag::Elevation { height } => out.write_u16::<LE>(*height)?,
            ThingFlag::Minimap { color } => out.write_u16::<LE>(*color)?,
            ThingFlag::LensHelp { id } => out.write_u16::<LE>(*id)?,
            ThingFlag::Cloth { slot } => out.write_u16::<LE>(*slot)?,
            ThingFlag::Market(market) => write_market(out, market)?,
            ThingFlag::DefaultAction { action } => out.write_u16::<LE>(*action)?,
            ThingFlag::GroundBorder
            | ThingFlag::OnBottom
            | ThingFlag::OnTop
            | ThingFlag::Container
            | ThingFlag::Stackable
            | ThingFlag::ForceUse
            | ThingFlag::MultiUse
            | ThingFlag::FluidContainer
            | ThingFlag::Fluid
            | ThingFlag::Unpassable
            | ThingFlag::Unmoveable
            | ThingFlag::BlockMissile
            | ThingFlag::BlockPathfind
            | ThingFlag::NoMoveAnimation
            | ThingFlag::Pickupable
            | ThingFlag::Hangable
            | ThingFlag::HookSouth
            | ThingFlag::HookEast
            | ThingFlag::Rotatable
            | ThingFlag::DontHide
            | ThingFlag::Translucent
            | ThingFlag::LyingObject
            | ThingFlag::AnimateAlways
            | ThingFlag::FullGround
            | ThingFlag::IgnoreLook
            | ThingFlag::Wrappable
            | ThingFlag::Unwrappable
            | ThingFlag::TopEffect
            | ThingFlag::Usable => {}
        }
    }
    out.write_u8(ThingFlag::END)?;
    Ok(())
}

fn write_market(out: &mut Vec<u8>, market: &MarketInfo) -> Result<(), ThingkitError> {
    out.write_u16::<LE>(market.category)?;
    out.write_u16::<LE>(market.trade_as)?;
    out.write_u16::<LE>(market.show_as)?;
    let name = encode_latin1(&market.name).ok_or_else(|| ThingkitError::Format {
        context: "market flag",
        message: format!("name {:?} is not Latin-1", market.name),
    })?;
    let len = u16::try_from(name.len()).map_err(|_| ThingkitError::Format {
        context: "market flag",
        message: format!("name is {} bytes long", name.len()),
    })?;
    out.write_u16::<LE>(len)?;
    out.write_all(&name)?;
    out.write_u16::<LE>(market.vocation)?;
    out.write_u16::<LE>(market.level)?;
    Ok(())
}

/// Latin-1 bytes of `s`, or `None` if it has characters above U+00FF.
pub(crate) fn encode_latin1(s: &str) -> Option<Vec<u8>> {
    s.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect()
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|b| char::from(*b)).collect()
}

pub(crate) fn read_flags(reader: &mut ByteReader<'_>) -> Result<ThingFlags, ThingkitError> {
    let mut flags = ThingFlags::new();
    loop {
        let offset = reader.position();
        let tag = reader.u8()?;
        if tag == ThingFlag::END {
            return Ok(flags);
        }
        let flag = match tag {
            ThingFlag::GROUND => ThingFlag::Ground {
                speed: reader.u16()?,
            },
            ThingFlag::WRITABLE => ThingFlag::Writable {
                max_length: reader.u16()?,
            },
            ThingFlag::WRITABLE_ONCE => ThingFlag::WritableOnce {
                max_length: reader.u16()?,
            },
            ThingFlag::LIGHT => ThingFlag::Light {
                level: reader.u16()?,
                color: reader.u16()?,
            },
            ThingFlag::OFFSET => ThingFlag::Offset {
                x: reader.i16()?,
                y: reader.i16()?,
            },
            ThingFlag::ELEVATION => ThingFlag::Elevation {
                height: reader.u16()?,
            },
            ThingFlag::MINIMAP => ThingFlag::Minimap {
                color: reader.u16()?,
            },
            ThingFlag::LENS_HELP => ThingFlag::LensHelp {
                id: reader.u16()?,
            },
            ThingFlag::CLOTH => ThingFlag::Cloth {
                slot: reader.u16()?,
            },
            ThingFlag::MARKET => ThingFlag::Market(read_market(reader)?),
            ThingFlag::DEFAULT_ACTION => ThingFlag::DefaultAction {
                action: reader.u16()?,
            },
            other => ThingFlag::unit_from_tag(other)
                .ok_or(ThingkitError::UnknownFlag { tag: other, offset })?,
        };
        if flags.insert(flag).is_some() {
            return Err(reader.invalid(format!(
                "flag 0x{tag:02X} appears twice (offset {offset})"
            )));
        }
    }
}

fn read_market(reader: &mut ByteReader<'_>) -> Result<MarketInfo, ThingkitError> {
    let category = reader.u16()?;
    let trade_as = reader.u16()?;
    let show_as = reader.u16()?;
    let name_len = reader.u16()? as usize;
    let name = decode_latin1(reader.bytes(name_len)?);
    Ok(MarketInfo {
        category,
        trade_as,
        show_as,
        name,
        vocation: reader.u16()?,
        level: reader.u16()?,
    })
}

// --- frame groups ------------------------------------------------------------

/// Writes everything of a group except its sprites.
pub(crate) fn write_group_header(
    out: &mut Vec<u8>,
    group: &FrameGroup,
    category: ThingCategory,
    layout: GroupLayout,
) -> Result<(), ThingkitError> {
    if group.sprites.len() != group.sprite_count() {
        return Err(ThingkitError::Format {
            context: "frame group",
            message: format!(
                "{} sprites listed but dimensions need {}",
                group.sprites.len(),
                group.sprite_count()
            ),
        });
    }
    if !layout.pattern_z && group.pattern_z != 1 {
        return Err(ThingkitError::Format {
            context: "frame group",
            message: format!(
                "pattern z of {} cannot be stored by this client version",
                group.pattern_z
            ),
        });
    }

    if layout.group_type {
        out.write_u8(group.group_type.into())?;
    }
    out.write_u8(group.width)?;
    out.write_u8(group.height)?;
    if group.width > 1 || group.height > 1 {
        out.write_u8(group.exact_size)?;
    }
    out.write_u8(group.layers)?;
    out.write_u8(group.pattern_x)?;
    out.write_u8(group.pattern_y)?;
    if layout.pattern_z {
        out.write_u8(group.pattern_z)?;
    }
    out.write_u8(group.frames)?;

    if group.frames > 1 && layout.durations {
        let fallback;
        let animation = match &group.animation {
            Some(animation) => animation,
            None => {
                fallback = FrameAnimation::uniform(group.frames, category.default_frame_duration());
                &fallback
            }
        };
        if animation.durations.len() != group.frames as usize {
            return Err(ThingkitError::Format {
                context: "frame group",
                message: format!(
                    "{} frame durations for {} frames",
                    animation.durations.len(),
                    group.frames
                ),
            });
        }
        out.write_u8(animation.mode.into())?;
        out.write_i32::<LE>(animation.loop_count)?;
        out.write_i8(animation.start_frame)?;
        for duration in &animation.durations {
            out.write_u32::<LE>(duration.min)?;
            out.write_u32::<LE>(duration.max)?;
        }
    }
    Ok(())
}

/// Reads a group header. The returned group has no sprites yet.
pub(crate) fn read_group_header(
    reader: &mut ByteReader<'_>,
    category: ThingCategory,
    layout: GroupLayout,
) -> Result<FrameGroup, ThingkitError> {
    let group_type = if layout.group_type {
        let byte = reader.u8()?;
        FrameGroupType::try_from(byte)
            .map_err(|_| reader.invalid(format!("unknown frame group type {byte}")))?
    } else {
        FrameGroupType::Default
    };
    let width = reader.u8()?;
    let height = reader.u8()?;
    let exact_size = if width > 1 || height > 1 {
        reader.u8()?
    } else {
        DEFAULT_EXACT_SIZE
    };
    let layers = reader.u8()?;
    let pattern_x = reader.u8()?;
    let pattern_y = reader.u8()?;
    let pattern_z = if layout.pattern_z { reader.u8()? } else { 1 };
    let frames = reader.u8()?;

    let animation = if frames > 1 {
        if layout.durations {
            let mode_byte = reader.u8()?;
            let mode = AnimationMode::try_from(mode_byte)
                .map_err(|_| reader.invalid(format!("unknown animation mode {mode_byte}")))?;
            let loop_count = reader.i32()?;
            let start_frame = reader.i8()?;
            let mut durations = Vec::with_capacity(frames as usize);
            for _ in 0..frames {
                durations.push(FrameDuration {
                    min: reader.u32()?,
                    max: reader.u32()?,
                });
            }
            Some(FrameAnimation {
                mode,
                loop_count,
                start_frame,
                durations,
            })
        } else {
            Some(FrameAnimation::uniform(
                frames,
                category.default_frame_duration(),
            ))
        }
    } else {
        None
    };

    Ok(FrameGroup {
        group_type,
        width,
        height,
        exact_size,
        layers,
        pattern_x,
        pattern_y,
        pattern_z,
        frames,
        animation,
        sprites: Vec::new(),
    })
}

fn write_sprite_ids(
    out: &mut Vec<u8>,
    sprites: &[SpriteId],
    layout: GroupLayout,
) -> Result<(), ThingkitError> {
    for id in sprites {
        if layout.wide_sprite_ids {
            out.write_u32::<LE>(id.0)?;
        } else {
            let narrow = u16::try_from(id.0).map_err(|_| ThingkitError::Capacity {
                what: "sprite ID",
                count: u64::from(id.0),
                max: u64::from(u16::MAX),
            })?;
            out.write_u16::<LE>(narrow)?;
        }
    }
    Ok(())
}

fn read_sprite_ids(
    reader: &mut ByteReader<'_>,
    count: usize,
    layout: GroupLayout,
) -> Result<Vec<SpriteId>, ThingkitError> {
    // Bound the allocation by what the buffer can actually hold.
    let width = if layout.wide_sprite_ids { 4 } else { 2 };
    let remaining = reader.len().saturating_sub(reader.position()) / width;
    let mut sprites = Vec::with_capacity(count.min(remaining));
    for _ in 0..count {
        let id = if layout.wide_sprite_ids {
            reader.u32()?
        } else {
            u32::from(reader.u16()?)
        };
        sprites.push(SpriteId(id));
    }
    Ok(sprites)
}

// --- whole records -----------------------------------------------------------

/// Writes a thing as a catalogue record: flags, then frame groups with
/// inline sprite IDs.
pub(crate) fn write_thing(
    out: &mut Vec<u8>,
    thing: &Thing,
    layout: GroupLayout,
) -> Result<(), ThingkitError> {
    write_flags(out, &thing.flags)?;
    if layout.group_count {
        let count = u8::try_from(thing.frame_groups.len()).map_err(|_| ThingkitError::Capacity {
            what: "frame groups",
            count: thing.frame_groups.len() as u64,
            max: u64::from(u8::MAX),
        })?;
        out.write_u8(count)?;
    } else if thing.frame_groups.len() != 1 {
        return Err(ThingkitError::Format {
            context: "thing",
            message: format!(
                "thing {} has {} frame groups but this layout stores exactly one",
                thing.id,
                thing.frame_groups.len()
            ),
        });
    }
    for group in &thing.frame_groups {
        write_group_header(out, group, thing.category, layout)?;
        write_sprite_ids(out, &group.sprites, layout)?;
    }
    Ok(())
}

/// Reads one catalogue record.
pub(crate) fn read_thing(
    reader: &mut ByteReader<'_>,
    id: ThingId,
    category: ThingCategory,
    layout: GroupLayout,
) -> Result<Thing, ThingkitError> {
    let flags = read_flags(reader)?;
    let group_count = if layout.group_count { reader.u8()? } else { 1 };
    let mut frame_groups = Vec::with_capacity(group_count as usize);
    for _ in 0..group_count {
        let mut group = read_group_header(reader, category, layout)?;
        group.sprites = read_sprite_ids(reader, group.sprite_count(), layout)?;
        frame_groups.push(group);
    }
    Ok(Thing::new(id, category)
        .with_flags(flags)
        .with_frame_groups(frame_groups))
}
