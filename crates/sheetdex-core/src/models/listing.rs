use serde::{Deserialize, Serialize};

/// One category of a grouped listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub label: String,
    pub items: Vec<String>,
}

/// Category label to ordered item names, in header order.
///
/// Categories are never empty: extending with no items leaves the listing unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupedListing(Vec<Group>);

impl GroupedListing {
    /// Append `items` under `label`, creating the category on first use.
    pub fn extend<I>(&mut self, label: &str, items: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut items = items.into_iter().peekable();
        if items.peek().is_none() {
            return;
        }
        match self.0.iter_mut().find(|g| g.label == label) {
            Some(group) => group.items.extend(items),
            None => self.0.push(Group {
                label: label.to_string(),
                items: items.collect(),
            }),
        }
    }

    pub fn get(&self, label: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|g| g.label == label)
            .map(|g| g.items.as_slice())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|g| g.label.as_str())
    }

    pub fn groups(&self) -> &[Group] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
