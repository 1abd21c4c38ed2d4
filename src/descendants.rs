use std::collections::{HashMap, HashSet};

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::normalize::unwrap_envelope;
use crate::tree::{deserialize_optional_id, CategoryArena, CategoryNode, RawId};

/// How a flat listing item points at its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParentRef {
    Id(String),
    Object {
        #[serde(rename = "_id")]
        id: String,
    },
}

impl ParentRef {
    /// The plain parent id, or `None` when it is blank.
    pub fn resolve(&self) -> Option<&str> {
        let id = match self {
            ParentRef::Id(id) | ParentRef::Object { id } => id.as_str(),
        };
        if id.trim().is_empty() {
            None
        } else {
            Some(id)
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawParent {
    Id(RawId),
    Object {
        #[serde(default, rename = "_id", deserialize_with = "deserialize_optional_id")]
        mongo_id: Option<String>,
        #[serde(default, deserialize_with = "deserialize_optional_id")]
        id: Option<String>,
    },
    Other(IgnoredAny),
}

fn deserialize_parent<'de, D>(deserializer: D) -> Result<Option<ParentRef>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawParent>::deserialize(deserializer)? {
        None => None,
        Some(RawParent::Id(id)) => Some(ParentRef::Id(id.into_string())),
        Some(RawParent::Object { mongo_id, id }) => mongo_id.or(id).map(|id| ParentRef::Object { id }),
        Some(RawParent::Other(_)) => None,
    })
}

/// An item of the flat "all categories" listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFlatCategory")]
pub struct FlatCategory {
    pub id: String,
    pub name: Option<String>,
    pub parent: Option<ParentRef>,
}

impl FlatCategory {
    pub fn root(id: impl Into<String>) -> Self {
        FlatCategory {
            id: id.into(),
            name: None,
            parent: None,
        }
    }

    pub fn with_parent(id: impl Into<String>, parent: ParentRef) -> Self {
        FlatCategory {
            id: id.into(),
            name: None,
            parent: Some(parent),
        }
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_ref().and_then(ParentRef::resolve)
    }
}

#[derive(Deserialize)]
struct RawFlatCategory {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    id: Option<String>,
    #[serde(default, rename = "_id", deserialize_with = "deserialize_optional_id")]
    mongo_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_parent")]
    parent: Option<ParentRef>,
}

impl TryFrom<RawFlatCategory> for FlatCategory {
    type Error = &'static str;

    fn try_from(raw: RawFlatCategory) -> Result<Self, Self::Error> {
        Ok(FlatCategory {
            id: raw.id.or(raw.mongo_id).ok_or("category has no id or _id")?,
            name: raw.name,
            parent: raw.parent,
        })
    }
}

/// Parent id to ordered, duplicate-free child ids.
#[derive(Debug, Clone, Default)]
pub struct ParentChildIndex {
    children: HashMap<String, Vec<String>>,
    entries: Vec<(String, Option<String>)>,
}

impl ParentChildIndex {
    pub fn build(items: &[FlatCategory]) -> Self {
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        let mut linked: HashSet<(&str, &str)> = HashSet::new();
        let mut entries = Vec::with_capacity(items.len());

        for item in items {
            let parent = item.parent_id();
            if let Some(parent) = parent {
                if linked.insert((parent, item.id.as_str())) {
                    children
                        .entry(parent.to_string())
                        .or_default()
                        .push(item.id.clone());
                }
            }
            entries.push((item.id.clone(), parent.map(str::to_string)));
        }

        ParentChildIndex { children, entries }
    }

    /// Builds the index from a raw listing payload, using the same envelope
    /// rules as [`crate::normalize`]. Malformed items are skipped.
    pub fn from_json(raw: &Value) -> Self {
        let items: Vec<FlatCategory> = match unwrap_envelope(raw) {
            Some((_, values)) => values
                .iter()
                .enumerate()
                .filter_map(|(index, value)| match FlatCategory::deserialize(value) {
                    Ok(item) => Some(item),
                    Err(err) => {
                        tracing::warn!(index, error = %err, "skipping malformed flat category");
                        None
                    }
                })
                .collect(),
            None => Vec::new(),
        };
        Self::build(&items)
    }

    /// Derives the index from a canonical tree.
    pub fn from_tree(nodes: &[CategoryNode]) -> Self {
        let arena = CategoryArena::new(nodes);
        let items: Vec<FlatCategory> = arena
            .slots()
            .iter()
            .map(|slot| FlatCategory {
                id: slot.node.id.clone(),
                name: Some(slot.node.name.clone()),
                parent: slot
                    .parent
                    .map(|p| ParentRef::Id(arena.slot(p).node.id.clone())),
            })
            .collect();
        Self::build(&items)
    }

    pub fn children_of(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Items with no parent, or whose parent is not in the listing.
    pub fn roots(&self) -> Vec<String> {
        let known: HashSet<&str> = self.entries.iter().map(|(id, _)| id.as_str()).collect();
        self.entries
            .iter()
            .filter(|(_, parent)| match parent {
                Some(parent) => !known.contains(parent.as_str()),
                None => true,
            })
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Every direct and transitive child of `id`, excluding `id` itself, in
    /// depth-first pre-order. Each id is reported once even when duplicate
    /// or cyclic parent links make it reachable more than once.
    pub fn descendants_of(&self, id: &str) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(id);
        let mut result = Vec::new();
        let mut stack: Vec<&str> = self
            .children_of(id)
            .iter()
            .rev()
            .map(String::as_str)
            .collect();

        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            result.push(current.to_string());
            stack.extend(self.children_of(current).iter().rev().map(String::as_str));
        }
        result
    }

    pub fn has_descendants(&self, id: &str) -> bool {
        !self.children_of(id).iter().all(|child| child == id)
    }
}
