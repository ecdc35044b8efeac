//! Diagnostic rendering of leaves.
//!
//! A leaf renders as `path (Kind<shape><filters>) 'title'`. The filters part
//! is empty for uncompressed leaves, otherwise `, library(level)` followed by
//! `, shuffled` when the shuffle filter is active. The title is read from the
//! attribute set at formatting time; a detached leaf shows `None`.

use std::fmt;

use crate::leaf::Leaf;

/// Quote a title with single quotes, switching to double quotes when the
/// title itself contains a single quote and no double quote.
fn quote(title: &str) -> String {
    if title.contains('\'') && !title.contains('"') {
        return format!("\"{title}\"");
    }
    let mut out = String::with_capacity(title.len() + 2);
    out.push('\'');
    for ch in title.chars() {
        match ch {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}{}", self.path(), self.kind_name(), self.shape())?;
        let compression = self.compression();
        if compression.is_compressed() {
            write!(f, ", {}({})", compression.library, compression.level)?;
            if compression.shuffle {
                f.write_str(", shuffled")?;
            }
        }
        f.write_str(") ")?;
        match self.get_title() {
            Ok(title) => f.write_str(&quote(title.as_deref().unwrap_or(""))),
            Err(_) => f.write_str("None"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use canopy_attrs::InMemoryAttributeStore;
    use canopy_store::{FilterPipeline, InMemoryBackingStore};

    use super::*;
    use crate::leaf::PlainLeaf;
    use crate::tree::Tree;

    fn tree_with_filters(pipeline: Option<FilterPipeline>) -> Tree {
        let mut store = InMemoryBackingStore::new();
        if let Some(pipeline) = pipeline {
            store = store.with_default_filters(pipeline);
        }
        Tree::new(Arc::new(store), Arc::new(InMemoryAttributeStore::new()))
    }

    #[test]
    fn uncompressed_leaf() {
        let mut tree = tree_with_filters(None);
        let root = tree.root();
        let id = tree
            .attach(
                Leaf::create(PlainLeaf::new("Array", vec![3])).with_title("Temperatures"),
                root,
                "temp",
            )
            .unwrap();
        assert_eq!(tree.describe(id).unwrap(), "/temp (Array(3,)) 'Temperatures'");
    }

    #[test]
    fn compressed_and_shuffled_leaf() {
        let mut tree = tree_with_filters(Some(
            FilterPipeline::new().with("shuffle", vec![]).with("lzo", vec![3]),
        ));
        let root = tree.root();
        let id = tree
            .attach(
                Leaf::create(PlainLeaf::new("Table", vec![100, 2])).with_title("readings"),
                root,
                "t",
            )
            .unwrap();
        assert_eq!(
            tree.describe(id).unwrap(),
            "/t (Table(100, 2), lzo(3), shuffled) 'readings'"
        );
    }

    #[test]
    fn compressed_without_shuffle() {
        let mut tree = tree_with_filters(Some(FilterPipeline::new().with("deflate", vec![6])));
        let root = tree.root();
        let id = tree
            .attach(Leaf::create(PlainLeaf::new("Array", vec![2, 2])), root, "z")
            .unwrap();
        assert_eq!(tree.describe(id).unwrap(), "/z (Array(2, 2), zlib(6)) ''");
    }

    #[test]
    fn shuffle_alone_is_not_shown() {
        let mut tree = tree_with_filters(Some(FilterPipeline::new().with("shuffle", vec![])));
        let root = tree.root();
        let id = tree
            .attach(Leaf::create(PlainLeaf::new("Array", vec![1])), root, "s")
            .unwrap();
        assert_eq!(tree.describe(id).unwrap(), "/s (Array(1,)) ''");
    }

    #[test]
    fn title_is_read_live() {
        let mut tree = tree_with_filters(None);
        let root = tree.root();
        let id = tree
            .attach(Leaf::create(PlainLeaf::new("Array", vec![1])), root, "a")
            .unwrap();
        tree.leaf(id).unwrap().set_title("first").unwrap();
        assert!(tree.describe(id).unwrap().ends_with("'first'"));
        tree.leaf(id).unwrap().set_title("second").unwrap();
        assert!(tree.describe(id).unwrap().ends_with("'second'"));
    }

    #[test]
    fn closed_leaf_renders_without_title() {
        let mut tree = tree_with_filters(None);
        let root = tree.root();
        let id = tree
            .attach(Leaf::create(PlainLeaf::new("Array", vec![1])).with_title("t"), root, "a")
            .unwrap();
        let closed = tree.close_leaf(id).unwrap();
        assert_eq!(closed.to_string(), "/a (Array(1,)) None");
    }

    #[test]
    fn quoting() {
        assert_eq!(quote("plain"), "'plain'");
        assert_eq!(quote("it's"), "\"it's\"");
        assert_eq!(quote("both ' and \""), "'both \\' and \"'");
        assert_eq!(quote(""), "''");
    }
}
