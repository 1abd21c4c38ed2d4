use std::borrow::Cow;
use std::collections::HashSet;
use std::ops::Range;

use serde::Serialize;

use crate::tree::{CategoryArena, CategoryNode};

/// A trimmed, lower-cased search needle. Blank input has no query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    needle: Vec<char>,
}

impl SearchQuery {
    pub fn parse(query: &str) -> Option<Self> {
        let needle: Vec<char> = query.trim().chars().flat_map(char::to_lowercase).collect();
        if needle.is_empty() {
            None
        } else {
            Some(SearchQuery { needle })
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        name.char_indices()
            .any(|(start, _)| self.match_len(&name[start..]).is_some())
    }

    /// Byte ranges of every non-overlapping match in `name`, left to right.
    pub fn find_all(&self, name: &str) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut resume = 0;
        for (start, _) in name.char_indices() {
            if start < resume {
                continue;
            }
            if let Some(len) = self.match_len(&name[start..]) {
                ranges.push(start..start + len);
                resume = start + len;
            }
        }
        ranges
    }

    // Length in bytes of the shortest prefix of `haystack` whose lower-cased
    // form starts with the needle.
    fn match_len(&self, haystack: &str) -> Option<usize> {
        let mut matched = 0;
        for (offset, ch) in haystack.char_indices() {
            for lower in ch.to_lowercase() {
                if matched < self.needle.len() {
                    if lower != self.needle[matched] {
                        return None;
                    }
                    matched += 1;
                }
            }
            if matched == self.needle.len() {
                return Some(offset + ch.len_utf8());
            }
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightSegment {
    pub text: String,
    pub matched: bool,
}

impl HighlightSegment {
    fn new(text: &str, matched: bool) -> Self {
        HighlightSegment {
            text: text.to_string(),
            matched,
        }
    }
}

/// Splits `name` into runs, flagging the ones that match `query`.
pub fn highlight(name: &str, query: &str) -> Vec<HighlightSegment> {
    let Some(query) = SearchQuery::parse(query) else {
        return vec![HighlightSegment::new(name, false)];
    };

    let mut segments = Vec::new();
    let mut cursor = 0;
    for range in query.find_all(name) {
        if range.start > cursor {
            segments.push(HighlightSegment::new(&name[cursor..range.start], false));
        }
        segments.push(HighlightSegment::new(&name[range.clone()], true));
        cursor = range.end;
    }
    if cursor < name.len() || segments.is_empty() {
        segments.push(HighlightSegment::new(&name[cursor..], false));
    }
    segments
}

/// Prunes the forest to matching nodes and the ancestors leading to them.
/// A blank query borrows the input back unchanged.
pub fn filter_tree<'a>(nodes: &'a [CategoryNode], query: &str) -> Cow<'a, [CategoryNode]> {
    match SearchQuery::parse(query) {
        None => Cow::Borrowed(nodes),
        Some(query) => Cow::Owned(filter_arena(&CategoryArena::new(nodes), &query)),
    }
}

pub(crate) fn filter_arena(arena: &CategoryArena<'_>, query: &SearchQuery) -> Vec<CategoryNode> {
    let mut built: Vec<Option<CategoryNode>> = vec![None; arena.len()];

    // Children always sit at higher indices than their parent, so a reverse
    // sweep sees every child before its parent.
    for index in (0..arena.len()).rev() {
        let slot = arena.slot(index);
        let children: Vec<CategoryNode> = slot
            .children
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        if !children.is_empty() || query.matches(&slot.node.name) {
            built[index] = Some(CategoryNode {
                id: slot.node.id.clone(),
                name: slot.node.name.clone(),
                children,
            });
        }
    }

    arena
        .roots()
        .iter()
        .filter_map(|&root| built[root].take())
        .collect()
}

/// Ids of every ancestor of a matching node: the nodes that must be
/// expanded for all matches to be visible. Matches themselves are not
/// included unless they are also an ancestor of another match.
pub fn expand_targets(nodes: &[CategoryNode], query: &str) -> HashSet<String> {
    match SearchQuery::parse(query) {
        None => HashSet::new(),
        Some(query) => expand_targets_in(&CategoryArena::new(nodes), &query),
    }
}

pub(crate) fn expand_targets_in(arena: &CategoryArena<'_>, query: &SearchQuery) -> HashSet<String> {
    let mut marked = vec![false; arena.len()];
    let mut targets = HashSet::new();

    for (index, slot) in arena.slots().iter().enumerate() {
        if !query.matches(&slot.node.name) {
            continue;
        }
        for ancestor in arena.ancestors(index) {
            if marked[ancestor] {
                break;
            }
            marked[ancestor] = true;
            targets.insert(arena.slot(ancestor).node.id.clone());
        }
    }
    targets
}
