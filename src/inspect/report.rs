//! Inspect report types and terminal formatting.

use serde::Serialize;
use std::fmt;

use crate::model::{ThingCategory, ThingId};

/// Inner width of the report boxes, in characters.
const BOX_WIDTH: usize = 59;

/// The result of inspecting a catalogue and its sprite atlas.
#[derive(Clone, Debug, Serialize)]
pub struct InspectReport {
    pub summary: SummarySection,
    /// One entry per category, in ID-space order.
    pub categories: Vec<CategoryEntry>,
    pub sprites: SpriteStats,
    #[serde(skip)]
    pub(crate) bar_width: usize,
}

/// Container-level facts.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SummarySection {
    pub client_version: u16,
    /// Content version rendered as `major.minor`.
    pub client_label: String,
    pub things: usize,
    pub frame_groups: usize,
    pub catalogue_wrapped: bool,
    pub catalogue_compressed: bool,
    pub sprites_wrapped: bool,
    pub sprites_compressed: bool,
}

/// Size and ID range of one category.
#[derive(Clone, Debug, Serialize)]
pub struct CategoryEntry {
    pub category: ThingCategory,
    pub count: u32,
    /// First and last ID, when the category is not empty.
    pub first_id: Option<ThingId>,
    pub last_id: Option<ThingId>,
    pub frame_groups: usize,
}

/// Sprite usage statistics.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SpriteStats {
    /// Sprite IDs in the atlas.
    pub total: usize,
    /// Distinct IDs referenced by at least one frame group.
    pub referenced: usize,
    /// IDs in the atlas no frame group references.
    pub unreferenced: usize,
    /// IDs with no stored blob.
    pub blank: usize,
    /// Distinct referenced IDs beyond the sprite count.
    pub dangling: usize,
    /// Sprite slots across all frame groups, blank slots included.
    pub slots: usize,
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "╭{}╮", "─".repeat(BOX_WIDTH))?;
        writeln!(f, "│{:^width$}│", "Catalogue Inspection Report", width = BOX_WIDTH)?;
        writeln!(f, "╰{}╯", "─".repeat(BOX_WIDTH))?;
        writeln!(f)?;

        self.fmt_summary(f)?;
        writeln!(f)?;
        self.fmt_categories(f)?;
        writeln!(f)?;
        self.fmt_sprites(f)?;

        Ok(())
    }
}

impl InspectReport {
    fn fmt_summary(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;
        open_box(f, "Summary")?;
        line(
            f,
            &format!("Client:        {} ({})", s.client_label, s.client_version),
        )?;
        line(f, &format!("Things:        {:>8}", format_number(s.things)))?;
        line(
            f,
            &format!("Frame groups:  {:>8}", format_number(s.frame_groups)),
        )?;
        blank_line(f)?;
        line(
            f,
            &format!(
                "Catalogue:     {}",
                framing(s.catalogue_wrapped, s.catalogue_compressed)
            ),
        )?;
        line(
            f,
            &format!(
                "Sprites:       {}",
                framing(s.sprites_wrapped, s.sprites_compressed)
            ),
        )?;
        close_box(f)
    }

    fn fmt_categories(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        open_box(f, "Categories")?;
        let max = self.categories.iter().map(|c| c.count).max().unwrap_or(0) as usize;
        for entry in &self.categories {
            let range = match (entry.first_id, entry.last_id) {
                (Some(first), Some(last)) => format!("{}-{}", first, last),
                _ => "empty".to_string(),
            };
            line(
                f,
                &format!(
                    "{:<9} {:>7}  {:<12} {}",
                    entry.category.name(),
                    format_number(entry.count as usize),
                    range,
                    render_bar(entry.count as usize, max, self.bar_width)
                ),
            )?;
        }
        close_box(f)
    }

    fn fmt_sprites(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.sprites;
        open_box(f, "Sprites")?;
        line(f, &format!("Total:         {:>8}", format_number(s.total)))?;
        line(
            f,
            &format!(
                "Referenced:    {:>8}  ({})",
                format_number(s.referenced),
                fmt_percent(s.referenced, s.total)
            ),
        )?;
        line(
            f,
            &format!(
                "Unreferenced:  {:>8}  ({})",
                format_number(s.unreferenced),
                fmt_percent(s.unreferenced, s.total)
            ),
        )?;
        line(f, &format!("Blank:         {:>8}", format_number(s.blank)))?;
        line(f, &format!("Slots:         {:>8}", format_number(s.slots)))?;
        if s.dangling > 0 {
            blank_line(f)?;
            line(
                f,
                &format!("⚠ {} referenced ID(s) beyond the sprite count", s.dangling),
            )?;
        }
        close_box(f)
    }
}

fn open_box(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    let used = title.chars().count() + 3;
    writeln!(f, "┌─ {} {}┐", title, "─".repeat(BOX_WIDTH.saturating_sub(used)))?;
    blank_line(f)
}

fn close_box(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    blank_line(f)?;
    writeln!(f, "└{}┘", "─".repeat(BOX_WIDTH))
}

fn blank_line(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "│{}│", " ".repeat(BOX_WIDTH))
}

/// One padded row inside a box.
fn line(f: &mut fmt::Formatter<'_>, content: &str) -> fmt::Result {
    let padding = (BOX_WIDTH - 3).saturating_sub(content.chars().count());
    writeln!(f, "│   {}{}│", content, " ".repeat(padding))
}

fn framing(wrapped: bool, compressed: bool) -> &'static str {
    match (wrapped, compressed) {
        (true, true) => "wrapped, gzip",
        (true, false) => "wrapped",
        (false, true) => "legacy, gzip",
        (false, false) => "legacy",
    }
}

/// Format a number with thousands separators.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Format a percentage, handling zero denominators.
fn fmt_percent(numerator: usize, denominator: usize) -> String {
    if denominator == 0 {
        "n/a".to_string()
    } else {
        format!("{:.1}%", (numerator as f64 / denominator as f64) * 100.0)
    }
}

/// Render a horizontal bar using Unicode block characters.
fn render_bar(count: usize, max_count: usize, width: usize) -> String {
    if max_count == 0 || width == 0 {
        return String::new();
    }
    let filled = ((count * width) / max_count).min(width);
    "█".repeat(filled) + &"░".repeat(width - filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_fmt_percent() {
        assert_eq!(fmt_percent(0, 0), "n/a");
        assert_eq!(fmt_percent(1, 3), "33.3%");
    }

    #[test]
    fn test_render_bar() {
        assert_eq!(render_bar(5, 10, 10), "█████░░░░░");
        assert_eq!(render_bar(0, 0, 10), "");
    }

    #[test]
    fn test_framing() {
        assert_eq!(framing(false, false), "legacy");
        assert_eq!(framing(true, true), "wrapped, gzip");
    }
}
