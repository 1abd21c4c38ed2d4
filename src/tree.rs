use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::kind_of;

/// A category and its ordered subcategories.
///
/// Deserializes from backend payloads that key the id as either `id` or
/// `_id` (string or integer) and that send `children` as an array, `null`,
/// or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawNode")]
pub struct CategoryNode {
    pub id: String,
    pub name: String,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        CategoryNode {
            id: id.into(),
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn child(mut self, node: CategoryNode) -> Self {
        self.children.push(node);
        self
    }

    pub fn with_children(mut self, nodes: Vec<CategoryNode>) -> Self {
        self.children = nodes;
        self
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// An id as the backend sends it: usually a string, occasionally a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl RawId {
    pub(crate) fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

pub(crate) fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(RawId::into_string))
}

fn resolve_node_id(id: Option<String>, mongo_id: Option<String>, name: &str) -> Result<String, String> {
    id.or(mongo_id)
        .ok_or_else(|| format!("category '{}' has no id or _id", name))
}

#[derive(Deserialize)]
struct RawNode {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    id: Option<String>,
    #[serde(default, rename = "_id", deserialize_with = "deserialize_optional_id")]
    mongo_id: Option<String>,
    name: String,
    #[serde(default)]
    children: Option<Value>,
}

impl TryFrom<RawNode> for CategoryNode {
    type Error = String;

    // Malformed children are dropped one by one so the rest of the branch
    // survives.
    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let id = resolve_node_id(raw.id, raw.mongo_id, &raw.name)?;
        let children = match raw.children {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| match CategoryNode::deserialize(item) {
                    Ok(child) => Some(child),
                    Err(err) => {
                        tracing::warn!(parent = %id, index, error = %err, "skipping malformed category");
                        None
                    }
                })
                .collect(),
            Some(other) => {
                tracing::warn!(parent = %id, found = kind_of(&other), "children is not an array, ignoring");
                Vec::new()
            }
        };
        Ok(CategoryNode {
            id,
            name: raw.name,
            children,
        })
    }
}

/// A [`CategoryNode`] decoded without tolerance: any malformed descendant
/// fails the whole node.
#[derive(Deserialize)]
#[serde(try_from = "StrictRawNode")]
pub(crate) struct StrictNode(pub(crate) CategoryNode);

#[derive(Deserialize)]
struct StrictRawNode {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    id: Option<String>,
    #[serde(default, rename = "_id", deserialize_with = "deserialize_optional_id")]
    mongo_id: Option<String>,
    name: String,
    #[serde(default)]
    children: Option<Vec<StrictNode>>,
}

impl TryFrom<StrictRawNode> for StrictNode {
    type Error = String;

    fn try_from(raw: StrictRawNode) -> Result<Self, Self::Error> {
        Ok(StrictNode(CategoryNode {
            id: resolve_node_id(raw.id, raw.mongo_id, &raw.name)?,
            name: raw.name,
            children: raw
                .children
                .unwrap_or_default()
                .into_iter()
                .map(|child| child.0)
                .collect(),
        }))
    }
}

/// One node of a [`CategoryArena`].
#[derive(Debug, Clone)]
pub struct ArenaSlot<'a> {
    pub node: &'a CategoryNode,
    pub parent: Option<usize>,
    pub depth: usize,
    pub children: Vec<usize>,
}

/// Pre-order, index-addressed view over a borrowed category forest.
///
/// Built with an explicit stack. A node whose id already appears on its own
/// ancestor chain is a back-edge and is dropped along with its subtree, as
/// is anything deeper than `max_depth`. Ids repeated in unrelated branches
/// are kept. Every slot's parent has a smaller index than the slot itself.
#[derive(Debug, Clone, Default)]
pub struct CategoryArena<'a> {
    slots: Vec<ArenaSlot<'a>>,
    roots: Vec<usize>,
}

enum Step<'a> {
    Enter {
        node: &'a CategoryNode,
        parent: Option<usize>,
        depth: usize,
    },
    Exit(&'a str),
}

impl<'a> CategoryArena<'a> {
    pub fn new(nodes: &'a [CategoryNode]) -> Self {
        Self::build(nodes, DEFAULT_MAX_DEPTH)
    }

    pub fn build(nodes: &'a [CategoryNode], max_depth: usize) -> Self {
        let mut slots: Vec<ArenaSlot<'a>> = Vec::new();
        let mut roots = Vec::new();
        let mut on_path: HashSet<&'a str> = HashSet::new();
        let mut stack: Vec<Step<'a>> = nodes
            .iter()
            .rev()
            .map(|node| Step::Enter { node, parent: None, depth: 0 })
            .collect();

        while let Some(step) = stack.pop() {
            let (node, parent, depth) = match step {
                Step::Exit(id) => {
                    on_path.remove(id);
                    continue;
                }
                Step::Enter { node, parent, depth } => (node, parent, depth),
            };

            if depth >= max_depth {
                tracing::warn!(id = %node.id, depth, "category nested past max depth, skipping subtree");
                continue;
            }
            if on_path.contains(node.id.as_str()) {
                tracing::warn!(id = %node.id, "category is its own ancestor, skipping subtree");
                continue;
            }

            let index = slots.len();
            slots.push(ArenaSlot {
                node,
                parent,
                depth,
                children: Vec::new(),
            });
            match parent {
                Some(p) => slots[p].children.push(index),
                None => roots.push(index),
            }

            on_path.insert(node.id.as_str());
            stack.push(Step::Exit(node.id.as_str()));
            for child in node.children.iter().rev() {
                stack.push(Step::Enter {
                    node: child,
                    parent: Some(index),
                    depth: depth + 1,
                });
            }
        }

        CategoryArena { slots, roots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn slot(&self, index: usize) -> &ArenaSlot<'a> {
        &self.slots[index]
    }

    /// Slots in depth-first pre-order.
    pub fn slots(&self) -> &[ArenaSlot<'a>] {
        &self.slots
    }

    /// First slot, in pre-order, carrying `id`.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.node.id == id)
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors(&self, index: usize) -> Ancestors<'_, 'a> {
        Ancestors {
            arena: self,
            next: self.slots[index].parent,
        }
    }
}

pub struct Ancestors<'r, 'a> {
    arena: &'r CategoryArena<'a>,
    next: Option<usize>,
}

impl<'r, 'a> Iterator for Ancestors<'r, 'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = self.arena.slots[current].parent;
        Some(current)
    }
}

pub fn count_nodes(nodes: &[CategoryNode]) -> usize {
    CategoryArena::new(nodes).len()
}

pub fn collect_ids(nodes: &[CategoryNode]) -> Vec<String> {
    CategoryArena::new(nodes)
        .slots()
        .iter()
        .map(|slot| slot.node.id.clone())
        .collect()
}

pub fn find_node<'a>(nodes: &'a [CategoryNode], id: &str) -> Option<&'a CategoryNode> {
    let arena = CategoryArena::new(nodes);
    arena.position(id).map(|index| arena.slot(index).node)
}

pub fn to_json(nodes: &[CategoryNode]) -> String {
    serde_json::to_string_pretty(nodes).unwrap_or_default()
}
