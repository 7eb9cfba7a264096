//! Row normalization for the mon sheet.
//!
//! The mon sheet is positional. Column A holds a free-text block whose first
//! non-blank line is the name and whose remaining lines are the description,
//! including `Type:` lines. The other columns are moves, abilities, stats,
//! image link, credits and the move sheet link. Everything here is pure.

pub mod image;
pub mod stats;
pub mod text;

use tracing::debug;

use crate::models::{Mon, Roster};
use crate::parse::parse_rows;

pub use image::normalize_image_url;
pub use stats::parse_stats;
pub use text::{extract_tags, slugify, split_lines, strip_tag_lines};

/// Number of positional columns in the mon sheet.
pub const MON_COLUMNS: usize = 7;

/// Convert one sheet row into a mon.
///
/// Missing trailing columns are treated as empty and extra columns are
/// ignored. Returns `None` when column A has no non-blank line.
pub fn normalize_row(fields: &[String]) -> Option<Mon> {
    let col = |idx: usize| fields.get(idx).map(String::as_str).unwrap_or_default();
    let (info, moves, abilities, stats, image, credits, moves_link) =
        (col(0), col(1), col(2), col(3), col(4), col(5), col(6));

    let mut lines = split_lines(info).filter(|l| !l.trim().is_empty());
    let name = lines.next()?.trim().to_string();
    let raw_description = lines.collect::<Vec<_>>().join("\n");
    let raw_description = raw_description.trim();

    Some(Mon {
        id: slugify(&name),
        tags: extract_tags(raw_description),
        description: strip_tag_lines(raw_description),
        stats: parse_stats(stats),
        image_url: normalize_image_url(image),
        credits: credits.trim().to_string(),
        moves_link: moves_link.trim().to_string(),
        raw_moves: moves.to_string(),
        raw_abilities: abilities.to_string(),
        raw_stats: stats.to_string(),
        name,
    })
}

/// Parse a mon sheet export. Row 0 is the header row and is skipped.
pub fn parse_roster(text: &str, delimiter: u8) -> Roster {
    let mons: Vec<Mon> = parse_rows(text, delimiter)
        .iter()
        .skip(1)
        .filter_map(|row| normalize_row(row))
        .inspect(|mon| debug!(mon = %mon.name, image_url = %mon.image_url, "Normalized mon"))
        .collect();
    Roster::from(mons)
}
