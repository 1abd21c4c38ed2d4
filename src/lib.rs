pub mod config;
pub mod descendants;
pub mod error;
pub mod flatten;
pub mod normalize;
pub mod search;
pub mod selection;
pub mod tree;
pub mod view;

pub use config::CategoryConfig;
pub use descendants::{FlatCategory, ParentChildIndex, ParentRef};
pub use error::{ConfigError, ParseError};
pub use flatten::{flatten, flatten_with, FlatCategoryOption};
pub use normalize::{
    detect_envelope, normalize, normalize_str, parse_categories, parse_categories_str, Envelope,
};
pub use search::{expand_targets, filter_tree, highlight, HighlightSegment, SearchQuery};
pub use selection::{CategorySelection, SelectionState};
pub use tree::{collect_ids, count_nodes, find_node, CategoryArena, CategoryNode};
pub use view::{CategoryTreeView, RowState, TreeRender, TreeRow};

#[cfg(feature = "extension-module")]
mod python {
    use pyo3::prelude::*;

    use crate::descendants::ParentChildIndex;
    use crate::tree::{self, CategoryNode};
    use crate::view::CategoryTreeView;
    use crate::{flatten, normalize, search};

    #[pyclass(name = "CategoryTree")]
    pub struct PyCategoryTree {
        inner: Vec<CategoryNode>,
    }

    #[pymethods]
    impl PyCategoryTree {
        /// Accepts a bare array or a `categories`/`data` envelope.
        #[staticmethod]
        fn from_json(json: &str) -> Self {
            PyCategoryTree {
                inner: normalize::normalize_str(json),
            }
        }

        #[staticmethod]
        fn from_json_strict(json: &str) -> PyResult<Self> {
            let inner = normalize::parse_categories_str(json)
                .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))?;
            Ok(PyCategoryTree { inner })
        }

        fn __len__(&self) -> usize {
            tree::count_nodes(&self.inner)
        }

        fn node_ids(&self) -> Vec<String> {
            tree::collect_ids(&self.inner)
        }

        fn flatten(&self) -> Vec<(String, String, usize)> {
            flatten::flatten(&self.inner)
                .into_iter()
                .map(|o| (o.id, o.path, o.level))
                .collect()
        }

        fn filter_json(&self, query: &str) -> String {
            tree::to_json(&search::filter_tree(&self.inner, query))
        }

        fn expand_targets(&self, query: &str) -> Vec<String> {
            let mut ids: Vec<String> = search::expand_targets(&self.inner, query)
                .into_iter()
                .collect();
            ids.sort();
            ids
        }

        fn outline(&self, query: &str) -> String {
            let mut view = CategoryTreeView::new(self.inner.clone());
            view.set_query(query);
            view.outline()
        }

        fn to_json(&self) -> String {
            tree::to_json(&self.inner)
        }
    }

    /// Descendant ids of `id` in a flat `{id, parent}` listing.
    #[pyfunction]
    fn descendants_of(listing_json: &str, id: &str) -> PyResult<Vec<String>> {
        let raw: serde_json::Value = serde_json::from_str(listing_json)
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))?;
        Ok(ParentChildIndex::from_json(&raw).descendants_of(id))
    }

    #[pymodule]
    pub fn category_tree(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_class::<PyCategoryTree>()?;
        m.add_function(wrap_pyfunction!(descendants_of, m)?)?;
        Ok(())
    }
}
