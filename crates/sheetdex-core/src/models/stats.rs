use std::fmt;

use serde::{Deserialize, Serialize};

/// A stat value: the first number found in the cell, or the text itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(i64),
    Text(String),
}

impl StatValue {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            StatValue::Number(n) => Some(*n),
            StatValue::Text(_) => None,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Number(n) => write!(f, "{}", n),
            StatValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub name: String,
    pub value: StatValue,
}

/// Stats in sheet order. Inserting an existing name overwrites its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stats(Vec<Stat>);

impl Stats {
    pub fn insert(&mut self, name: String, value: StatValue) {
        match self.0.iter_mut().find(|s| s.name == name) {
            Some(existing) => existing.value = value,
            None => self.0.push(Stat { name, value }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&StatValue> {
        self.0.iter().find(|s| s.name == name).map(|s| &s.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stat> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of the numeric stats.
    pub fn total(&self) -> i64 {
        self.0.iter().filter_map(|s| s.value.as_number()).sum()
    }
}
