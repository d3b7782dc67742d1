//! Catalogue validation.
//!
//! Two levels of checking:
//! - [`validate_flags`] and [`validate_frame_groups`] gate a single edit and
//!   fail with a [`ValidationError`] naming the offending field.
//! - [`validate_catalog`] walks a whole catalogue and its atlas and
//!   collects every problem into a [`ValidationReport`].

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use crate::error::ValidationError;
use crate::model::{
    ClientVersion, FrameGroup, ObjectData, SpriteData, ThingCategory, ThingFlag, ThingFlags,
    ThingId,
};

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
}

/// Checks a flag set before it replaces a thing's flags.
///
/// Market references must name existing items, writable lengths must be
/// positive and market names must be representable in Latin-1.
pub fn validate_flags(flags: &ThingFlags, objects: &ObjectData) -> Result<(), ValidationError> {
    let items = objects.category_range(ThingCategory::Item);
    let is_item = |raw: u16| {
        items
            .as_ref()
            .is_some_and(|range| range.contains(&ThingId(u32::from(raw))))
    };

    for flag in flags {
        match flag {
            ThingFlag::Writable { max_length } | ThingFlag::WritableOnce { max_length }
                if *max_length == 0 =>
            {
                return Err(ValidationError::new(
                    "max_length",
                    "writable text must allow at least one character",
                ));
            }
            ThingFlag::Market(market) => {
                if market.trade_as == 0 || !is_item(market.trade_as) {
                    return Err(ValidationError::new(
                        "trade_as",
                        format!("{} is not an existing item ID", market.trade_as),
                    ));
                }
                if market.show_as == 0 || !is_item(market.show_as) {
                    return Err(ValidationError::new(
                        "show_as",
                        format!("{} is not an existing item ID", market.show_as),
                    ));
                }
                if let Some(c) = market.name.chars().find(|c| u32::from(*c) > 0xFF) {
                    return Err(ValidationError::new(
                        "name",
                        format!("character {c:?} cannot be stored in Latin-1"),
                    ));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// A structural problem with one frame group (or the group list).
struct GroupProblem {
    code: IssueCode,
    group: Option<usize>,
    message: String,
}

fn group_problems(
    version: ClientVersion,
    category: ThingCategory,
    groups: &[FrameGroup],
    sprite_count: u32,
) -> Vec<GroupProblem> {
    let features = version.features();
    let mut problems = Vec::new();
    let mut problem = |code, group, message: String| {
        problems.push(GroupProblem {
            code,
            group,
            message,
        })
    };

    let grouped = features.frame_groups && category == ThingCategory::Outfit;
    if groups.is_empty() {
        problem(
            IssueCode::MissingFrameGroups,
            None,
            "thing has no frame groups".to_string(),
        );
    } else if !grouped && groups.len() != 1 {
        problem(
            IssueCode::UnsupportedGroupLayout,
            None,
            format!(
                "{} groups but a {} in client {} stores exactly one",
                groups.len(),
                category,
                version
            ),
        );
    } else if groups.len() > usize::from(u8::MAX) {
        problem(
            IssueCode::UnsupportedGroupLayout,
            None,
            format!("{} groups exceed the maximum of 255", groups.len()),
        );
    }

    for (index, group) in groups.iter().enumerate() {
        let at = Some(index);
        let dims = [
            group.width,
            group.height,
            group.layers,
            group.pattern_x,
            group.pattern_y,
            group.pattern_z,
            group.frames,
        ];
        if dims.contains(&0) {
            problem(
                IssueCode::EmptyDimension,
                at,
                "every dimension must be at least 1".to_string(),
            );
        }
        if !features.pattern_z && group.pattern_z != 1 {
            problem(
                IssueCode::UnsupportedGroupLayout,
                at,
                format!("pattern z of {} needs client 7.55 or newer", group.pattern_z),
            );
        }
        if group.sprites.len() != group.sprite_count() {
            problem(
                IssueCode::SpriteCountMismatch,
                at,
                format!(
                    "{} sprites listed but dimensions need {}",
                    group.sprites.len(),
                    group.sprite_count()
                ),
            );
        }
        if let Some(animation) = &group.animation {
            if animation.durations.len() != usize::from(group.frames) {
                problem(
                    IssueCode::DurationCountMismatch,
                    at,
                    format!(
                        "{} durations for {} frames",
                        animation.durations.len(),
                        group.frames
                    ),
                );
            }
            if let Some((frame, d)) = animation
                .durations
                .iter()
                .enumerate()
                .find(|(_, d)| d.min > d.max)
            {
                problem(
                    IssueCode::InvalidDurationRange,
                    at,
                    format!("frame {frame} has min {} > max {}", d.min, d.max),
                );
            }
        }
        if let Some(id) = group.referenced_sprites().find(|id| id.0 > sprite_count) {
            problem(
                IssueCode::SpriteOutOfRange,
                at,
                format!("sprite {id} is beyond the sprite count {sprite_count}"),
            );
        }
    }
    problems
}

/// Checks a frame group list before it replaces a thing's groups.
pub fn validate_frame_groups(
    version: ClientVersion,
    category: ThingCategory,
    groups: &[FrameGroup],
    sprite_count: u32,
) -> Result<(), ValidationError> {
    match group_problems(version, category, groups, sprite_count)
        .into_iter()
        .next()
    {
        Some(p) => Err(ValidationError::new(
            "frame_groups",
            match p.group {
                Some(index) => format!("group {index}: {}", p.message),
                None => p.message,
            },
        )),
        None => Ok(()),
    }
}

/// Validates a catalogue against its sprite atlas and returns a report of
/// all issues found.
pub fn validate_catalog(
    objects: &ObjectData,
    sprites: &SpriteData,
    _opts: &ValidateOptions,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    let items = objects.category_range(ThingCategory::Item);

    for (id, thing) in &objects.things {
        let id = *id;
        if objects.counts.category_of(id) != Some(thing.category) {
            report.add(ValidationIssue::error(
                IssueCode::CategoryMismatch,
                format!("{} outside its category range", thing.category),
                IssueContext::Thing { id },
            ));
        }

        for p in group_problems(
            objects.version,
            thing.category,
            &thing.frame_groups,
            sprites.sprite_count,
        ) {
            let context = match p.group {
                Some(group) => IssueContext::FrameGroup { id, group },
                None => IssueContext::Thing { id },
            };
            let issue = if p.code == IssueCode::MissingFrameGroups {
                ValidationIssue::warning(p.code, p.message, context)
            } else {
                ValidationIssue::error(p.code, p.message, context)
            };
            report.add(issue);
        }

        if let Some(market) = thing.flags.market() {
            for (field, raw) in [("trade_as", market.trade_as), ("show_as", market.show_as)] {
                let exists = items
                    .as_ref()
                    .is_some_and(|r| r.contains(&ThingId(u32::from(raw))));
                if !exists {
                    report.add(ValidationIssue::warning(
                        IssueCode::MissingMarketRef,
                        format!("market {field} refers to missing item {raw}"),
                        IssueContext::Thing { id },
                    ));
                }
            }
        }
    }

    let source_len = sprites.source().len();
    for (index, address) in sprites.addresses.iter().enumerate() {
        if *address != 0 && *address as usize >= source_len {
            report.add(ValidationIssue::error(
                IssueCode::SpriteAddressOutOfBounds,
                format!("address {address} is past the end of the container ({source_len} bytes)"),
                IssueContext::Sprite {
                    id: (index as u32 + 1).into(),
                },
            ));
        }
    }

    report
}
