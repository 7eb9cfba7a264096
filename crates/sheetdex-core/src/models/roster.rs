use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Mon;

/// Mons in sheet order, with an id index.
///
/// When two rows slug to the same id, both stay in the ordered list and the
/// later row wins id lookups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Mon>", into = "Vec<Mon>")]
pub struct Roster {
    mons: Vec<Mon>,
    by_id: HashMap<String, usize>,
}

impl Roster {
    pub fn mons(&self) -> &[Mon] {
        &self.mons
    }

    pub fn get(&self, id: &str) -> Option<&Mon> {
        self.by_id.get(id).map(|&idx| &self.mons[idx])
    }

    pub fn len(&self) -> usize {
        self.mons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mons.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mon> {
        self.mons.iter()
    }
}

impl From<Vec<Mon>> for Roster {
    fn from(mons: Vec<Mon>) -> Self {
        let by_id = mons
            .iter()
            .enumerate()
            .map(|(idx, mon)| (mon.id.clone(), idx))
            .collect();
        Self { mons, by_id }
    }
}

impl From<Roster> for Vec<Mon> {
    fn from(roster: Roster) -> Self {
        roster.mons
    }
}
