//! Expand/collapse and search state for a searchable category tree.

use std::borrow::Cow;
use std::collections::HashSet;

use serde::Serialize;

use crate::config::CategoryConfig;
use crate::search::{expand_targets_in, filter_arena, highlight, HighlightSegment, SearchQuery};
use crate::tree::{CategoryArena, CategoryNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowState {
    Expanded,
    Collapsed,
    /// No children, so no toggle; always shown revealed.
    Leaf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeRow {
    pub id: String,
    pub depth: usize,
    pub state: RowState,
    pub segments: Vec<HighlightSegment>,
}

impl TreeRow {
    pub fn has_children(&self) -> bool {
        self.state != RowState::Leaf
    }

    /// Name with matched runs wrapped in brackets.
    pub fn label(&self) -> String {
        self.segments
            .iter()
            .map(|segment| {
                if segment.matched {
                    format!("[{}]", segment.text)
                } else {
                    segment.text.clone()
                }
            })
            .collect()
    }

    fn outline_line(&self) -> String {
        let marker = match self.state {
            RowState::Expanded => "▼",
            RowState::Collapsed => "▶",
            RowState::Leaf => "·",
        };
        format!("{}{} {}", "  ".repeat(self.depth), marker, self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum TreeRender {
    /// Nothing to show: no categories at all, or no search matches.
    Empty,
    Rows(Vec<TreeRow>),
}

/// A category tree plus the expanded ids and search query of the view
/// showing it. All nodes start collapsed.
#[derive(Debug, Clone)]
pub struct CategoryTreeView {
    roots: Vec<CategoryNode>,
    config: CategoryConfig,
    query: String,
    expanded: HashSet<String>,
}

impl CategoryTreeView {
    pub fn new(roots: Vec<CategoryNode>) -> Self {
        Self::with_config(roots, CategoryConfig::default())
    }

    pub fn with_config(roots: Vec<CategoryNode>, config: CategoryConfig) -> Self {
        CategoryTreeView {
            roots,
            config,
            query: String::new(),
            expanded: HashSet::new(),
        }
    }

    pub fn tree(&self) -> &[CategoryNode] {
        &self.roots
    }

    /// Swaps in a refetched tree. Expanded ids carry over; an active search
    /// also expands the ancestors of its matches in the new tree.
    pub fn set_tree(&mut self, roots: Vec<CategoryNode>) {
        self.roots = roots;
        self.expand_to_matches();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_searching(&self) -> bool {
        SearchQuery::parse(&self.query).is_some()
    }

    /// Setting a new non-blank query adds the ancestors of its matches to
    /// the expanded set. Nothing is ever collapsed by a query change.
    pub fn set_query(&mut self, query: &str) {
        if self.query == query {
            return;
        }
        self.query = query.to_string();
        self.expand_to_matches();
    }

    pub fn clear_query(&mut self) {
        self.set_query("");
    }

    fn expand_to_matches(&mut self) {
        let Some(query) = SearchQuery::parse(&self.query) else {
            return;
        };
        let targets = expand_targets_in(&self.arena(&self.roots), &query);
        tracing::debug!(query = %self.query, targets = targets.len(), "expanding to search matches");
        self.expanded.extend(targets);
    }

    /// Flips a node that has children in the visible tree. Returns whether
    /// it is expanded afterwards; leaves and unknown ids are left alone.
    pub fn toggle(&mut self, id: &str) -> bool {
        let has_children = {
            let visible = self.visible_tree();
            let arena = self.arena(&visible);
            arena
                .slots()
                .iter()
                .any(|slot| slot.node.id == id && !slot.children.is_empty())
        };
        if !has_children {
            return false;
        }
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_string());
            true
        }
    }

    /// Expands every node with children in the visible tree.
    pub fn expand_all(&mut self) {
        let ids: HashSet<String> = {
            let visible = self.visible_tree();
            let arena = self.arena(&visible);
            arena
                .slots()
                .iter()
                .filter(|slot| !slot.children.is_empty())
                .map(|slot| slot.node.id.clone())
                .collect()
        };
        tracing::debug!(count = ids.len(), "expand all");
        self.expanded = ids;
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn expanded(&self) -> &HashSet<String> {
        &self.expanded
    }

    /// The tree as filtered by the current query.
    pub fn visible_tree(&self) -> Cow<'_, [CategoryNode]> {
        match SearchQuery::parse(&self.query) {
            None => Cow::Borrowed(self.roots.as_slice()),
            Some(query) => Cow::Owned(filter_arena(&self.arena(&self.roots), &query)),
        }
    }

    /// Rows for every visible node whose ancestors are all expanded, in
    /// display order.
    pub fn render(&self) -> TreeRender {
        let visible = self.visible_tree();
        let arena = self.arena(&visible);
        if arena.is_empty() {
            return TreeRender::Empty;
        }

        let mut shown = vec![false; arena.len()];
        let mut rows = Vec::new();
        for (index, slot) in arena.slots().iter().enumerate() {
            shown[index] = match slot.parent {
                None => true,
                Some(parent) => shown[parent] && self.is_expanded(&arena.slot(parent).node.id),
            };
            if !shown[index] {
                continue;
            }

            let state = if slot.children.is_empty() {
                RowState::Leaf
            } else if self.is_expanded(&slot.node.id) {
                RowState::Expanded
            } else {
                RowState::Collapsed
            };
            rows.push(TreeRow {
                id: slot.node.id.clone(),
                depth: slot.depth,
                state,
                segments: highlight(&slot.node.name, &self.query),
            });
        }
        TreeRender::Rows(rows)
    }

    // Produces a plain-text rendering, e.g. while searching "lap":
    // ▼ Electronics
    //   · [Lap]tops
    pub fn outline(&self) -> String {
        match self.render() {
            TreeRender::Empty => "(no categories)".to_string(),
            TreeRender::Rows(rows) => rows
                .iter()
                .map(TreeRow::outline_line)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    fn arena<'a>(&self, nodes: &'a [CategoryNode]) -> CategoryArena<'a> {
        CategoryArena::build(nodes, self.config.max_depth)
    }
}
