use serde::{Deserialize, Serialize};

use super::Stats;

/// A normalized row of the mon sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mon {
    /// Slug derived from `name`; never empty.
    pub id: String,
    pub name: String,
    pub description: String,
    /// Declared types, in declaration order.
    pub tags: Vec<String>,
    pub stats: Stats,
    pub image_url: String,
    pub credits: String,
    /// Link to this mon's move sheet, as pasted by the sheet editor.
    pub moves_link: String,
    pub raw_moves: String,
    pub raw_abilities: String,
    pub raw_stats: String,
}

impl Mon {
    /// Types joined for display, e.g. "Grass / Ghost".
    pub fn tags_display(&self) -> String {
        if self.tags.is_empty() {
            "Untyped".to_string()
        } else {
            self.tags.join(" / ")
        }
    }

    pub fn has_moves_link(&self) -> bool {
        !self.moves_link.trim().is_empty()
    }
}
