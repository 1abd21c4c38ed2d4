use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::descendants::ParentChildIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionState {
    Selected,
    /// Not selected itself, but some descendant is.
    Partial,
    Unselected,
}

/// Category ids picked for a coupon or discount.
///
/// Selecting a category selects its whole subtree; deselecting removes the
/// whole subtree by id, including ids that were individually toggled off
/// and back on in between.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySelection {
    selected: BTreeSet<String>,
}

impl CategorySelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the selection from ids loaded with an existing coupon, without
    /// cascading.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CategorySelection {
            selected: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn select(&mut self, index: &ParentChildIndex, id: &str) {
        self.selected.insert(id.to_string());
        self.selected.extend(index.descendants_of(id));
    }

    pub fn deselect(&mut self, index: &ParentChildIndex, id: &str) {
        self.selected.remove(id);
        for descendant in index.descendants_of(id) {
            self.selected.remove(&descendant);
        }
    }

    /// Returns whether `id` is selected afterwards.
    pub fn toggle(&mut self, index: &ParentChildIndex, id: &str) -> bool {
        if self.selected.contains(id) {
            self.deselect(index, id);
            false
        } else {
            self.select(index, id);
            true
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn state_of(&self, index: &ParentChildIndex, id: &str) -> SelectionState {
        if self.selected.contains(id) {
            SelectionState::Selected
        } else if index
            .descendants_of(id)
            .iter()
            .any(|descendant| self.selected.contains(descendant))
        {
            SelectionState::Partial
        } else {
            SelectionState::Unselected
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    /// The ids to submit with the coupon/discount form, sorted.
    pub fn into_ids(self) -> Vec<String> {
        self.selected.into_iter().collect()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descendants::{FlatCategory, ParentRef};

    fn index() -> ParentChildIndex {
        ParentChildIndex::build(&[
            FlatCategory::root("A"),
            FlatCategory::with_parent("B", ParentRef::Id("A".into())),
            FlatCategory::with_parent("C", ParentRef::Id("B".into())),
            FlatCategory::root("D"),
        ])
    }

    #[test]
    fn test_select_cascades() {
        let mut selection = CategorySelection::new();
        selection.select(&index(), "A");
        assert_eq!(selection.clone().into_ids(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_deselect_cascades() {
        let index = index();
        let mut selection = CategorySelection::new();
        selection.select(&index, "A");
        selection.deselect(&index, "A");
        assert!(selection.is_empty());
    }

    #[test]
    fn test_deselect_removes_children_toggled_back_on() {
        let index = index();
        let mut selection = CategorySelection::new();
        selection.select(&index, "A");
        assert!(!selection.toggle(&index, "C"));
        assert!(selection.toggle(&index, "C"));
        selection.deselect(&index, "A");
        assert!(selection.is_empty());
    }

    #[test]
    fn test_deselect_child_leaves_parent() {
        let index = index();
        let mut selection = CategorySelection::new();
        selection.select(&index, "A");
        selection.deselect(&index, "B");
        assert_eq!(selection.into_ids(), vec!["A"]);
    }

    #[test]
    fn test_toggle_reports_state() {
        let index = index();
        let mut selection = CategorySelection::new();
        assert!(selection.toggle(&index, "D"));
        assert!(selection.is_selected("D"));
        assert!(!selection.toggle(&index, "D"));
        assert!(!selection.is_selected("D"));
    }

    #[test]
    fn test_partial_state() {
        let index = index();
        let mut selection = CategorySelection::new();
        selection.select(&index, "C");
        assert_eq!(selection.state_of(&index, "A"), SelectionState::Partial);
        assert_eq!(selection.state_of(&index, "C"), SelectionState::Selected);
        assert_eq!(selection.state_of(&index, "D"), SelectionState::Unselected);
    }

    #[test]
    fn test_from_ids_does_not_cascade() {
        let selection = CategorySelection::from_ids(["A"]);
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.ids().collect::<Vec<_>>(), vec!["A"]);
    }
}
