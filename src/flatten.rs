use serde::{Deserialize, Serialize};

use crate::config::CategoryConfig;
use crate::tree::{CategoryArena, CategoryNode};

/// A select-box entry: the category id, its ancestor-path label and depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatCategoryOption {
    pub id: String,
    pub path: String,
    pub level: usize,
}

impl FlatCategoryOption {
    /// Path label indented two spaces per level, for plain-text selects.
    pub fn indented_label(&self) -> String {
        format!("{}{}", "  ".repeat(self.level), self.path)
    }
}

pub fn flatten(nodes: &[CategoryNode]) -> Vec<FlatCategoryOption> {
    flatten_with(nodes, &CategoryConfig::default())
}

/// Depth-first pre-order. Each path extends the path already built for the
/// node's parent in this walk. Repeated ids are emitted once per occurrence.
pub fn flatten_with(nodes: &[CategoryNode], config: &CategoryConfig) -> Vec<FlatCategoryOption> {
    let arena = CategoryArena::build(nodes, config.max_depth);
    let mut options: Vec<FlatCategoryOption> = Vec::with_capacity(arena.len());

    for slot in arena.slots() {
        let path = match slot.parent {
            Some(parent) => format!(
                "{}{}{}",
                options[parent].path, config.path_separator, slot.node.name
            ),
            None => slot.node.name.clone(),
        };
        options.push(FlatCategoryOption {
            id: slot.node.id.clone(),
            path,
            level: slot.depth,
        });
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_tree() -> Vec<CategoryNode> {
        vec![
            CategoryNode::new("a", "A").child(
                CategoryNode::new("b", "B").child(CategoryNode::new("c", "C")),
            ),
            CategoryNode::new("d", "D").child(CategoryNode::new("e", "E")),
        ]
    }

    #[test]
    fn test_grandchild_path_and_level() {
        let options = flatten(&make_tree());
        let c = options.iter().find(|o| o.id == "c").unwrap();
        assert_eq!(c.path, "A / B / C");
        assert_eq!(c.level, 2);
    }

    #[test]
    fn test_preorder_ordering() {
        let ids: Vec<_> = flatten(&make_tree()).into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_roots_are_level_zero() {
        let options = flatten(&make_tree());
        assert_eq!(options[0].path, "A");
        assert_eq!(options[0].level, 0);
        assert_eq!(options[3].path, "D");
        assert_eq!(options[3].level, 0);
    }

    #[test]
    fn test_custom_separator() {
        let config = CategoryConfig::default().with_separator(" > ");
        let options = flatten_with(&make_tree(), &config);
        assert_eq!(options[4].path, "D > E");
    }

    #[test]
    fn test_empty_input() {
        assert!(flatten(&[]).is_empty());
    }

    #[test]
    fn test_duplicates_are_not_collapsed() {
        let tree = vec![CategoryNode::new("x", "X"), CategoryNode::new("x", "X")];
        assert_eq!(flatten(&tree).len(), 2);
    }

    #[test]
    fn test_self_reference_terminates() {
        let tree = vec![CategoryNode::new("a", "A").child(CategoryNode::new("a", "A"))];
        let options = flatten(&tree);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].path, "A");
    }

    #[test]
    fn test_indented_label() {
        let options = flatten(&make_tree());
        assert_eq!(options[2].indented_label(), "    A / B / C");
    }
}
