//! Checkbox state over a share tree.
//!
//! Directory booleans are derivative: toggling a directory writes the same
//! value to its whole subtree, but toggling a file never recomputes its
//! ancestors. Only file entries decide what gets downloaded.

use std::collections::HashMap;

use crate::tree::{FileNode, ShareTree};

/// Mapping from node id to its checked state. Absent ids are unchecked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    checked: HashMap<String, bool>,
}

impl Selection {
    /// Creates a selection with every node of `tree` present and unchecked.
    #[must_use]
    pub fn seeded(tree: &ShareTree) -> Self {
        Self {
            checked: tree
                .nodes()
                .iter()
                .map(|node| (node.id.clone(), false))
                .collect(),
        }
    }

    #[must_use]
    pub fn is_checked(&self, id: &str) -> bool {
        self.checked.get(id).copied().unwrap_or(false)
    }

    /// Flips `node` and returns its new value.
    ///
    /// For a directory the new value is also written to every descendant,
    /// regardless of what each descendant held before.
    pub fn toggle(&mut self, tree: &ShareTree, node: &FileNode) -> bool {
        let value = !self.is_checked(&node.id);
        if node.is_dir {
            for id in tree.subtree_ids(&node.id) {
                self.checked.insert(id.to_string(), value);
            }
        } else {
            self.checked.insert(node.id.clone(), value);
        }
        value
    }

    /// Checked files in the tree's input order.
    #[must_use]
    pub fn selected_files<'t>(&self, tree: &'t ShareTree) -> Vec<&'t FileNode> {
        tree.files().filter(|node| self.is_checked(&node.id)).collect()
    }

    #[must_use]
    pub fn selected_ids<'t>(&self, tree: &'t ShareTree) -> Vec<&'t str> {
        tree.files()
            .filter(|node| self.is_checked(&node.id))
            .map(|node| node.id.as_str())
            .collect()
    }

    /// Total static size of the checked files.
    #[must_use]
    pub fn selected_size(&self, tree: &ShareTree) -> u64 {
        self.selected_files(tree).iter().map(|node| node.size).sum()
    }

    pub fn clear(&mut self) {
        self.checked.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_tree() -> ShareTree {
        ShareTree::new(vec![
            FileNode::dir("/", "/", None),
            FileNode::dir("/a", "a", Some("/")),
            FileNode::file("/a/f.txt", "f.txt", "/a", 2048),
        ])
    }

    fn nested_tree() -> ShareTree {
        ShareTree::new(vec![
            FileNode::dir("/", "/", None),
            FileNode::dir("/docs", "docs", Some("/")),
            FileNode::dir("/docs/old", "old", Some("/docs")),
            FileNode::file("/docs/old/a.pdf", "a.pdf", "/docs/old", 100),
            FileNode::file("/docs/b.pdf", "b.pdf", "/docs", 200),
            FileNode::file("/c.txt", "c.txt", "/", 300),
            FileNode::dir("/empty", "empty", Some("/")),
        ])
    }

    fn node<'t>(tree: &'t ShareTree, id: &str) -> &'t FileNode {
        tree.get(id).unwrap()
    }

    #[test]
    fn toggling_directory_selects_its_files() {
        let tree = scenario_tree();
        let mut selection = Selection::seeded(&tree);

        assert!(selection.toggle(&tree, node(&tree, "/a")));
        assert!(selection.is_checked("/a"));
        assert!(selection.is_checked("/a/f.txt"));

        let selected = selection.selected_files(&tree);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "/a/f.txt");
        assert_eq!(selected[0].size, 2048);
    }

    #[test]
    fn directory_toggle_overrides_mixed_descendants() {
        let tree = nested_tree();
        let mut selection = Selection::seeded(&tree);
        selection.toggle(&tree, node(&tree, "/docs/b.pdf"));

        // /docs was unchecked, so the whole subtree becomes checked.
        assert!(selection.toggle(&tree, node(&tree, "/docs")));
        for id in ["/docs", "/docs/old", "/docs/old/a.pdf", "/docs/b.pdf"] {
            assert!(selection.is_checked(id), "{id} should be checked");
        }
        assert!(!selection.is_checked("/c.txt"));
    }

    #[test]
    fn double_directory_toggle_restores() {
        let tree = nested_tree();
        let mut selection = Selection::seeded(&tree);
        let before = selection.clone();

        selection.toggle(&tree, node(&tree, "/docs"));
        selection.toggle(&tree, node(&tree, "/docs"));
        assert_eq!(selection, before);
    }

    #[test]
    fn file_toggle_leaves_ancestors_stale() {
        let tree = nested_tree();
        let mut selection = Selection::seeded(&tree);
        selection.toggle(&tree, node(&tree, "/docs"));

        assert!(!selection.toggle(&tree, node(&tree, "/docs/b.pdf")));
        assert!(selection.is_checked("/docs"));
        assert!(selection.is_checked("/docs/old/a.pdf"));
        assert_eq!(selection.selected_ids(&tree), vec!["/docs/old/a.pdf"]);
    }

    #[test]
    fn empty_directory_only_flips_itself() {
        let tree = nested_tree();
        let mut selection = Selection::seeded(&tree);
        selection.toggle(&tree, node(&tree, "/empty"));
        assert!(selection.is_checked("/empty"));
        assert!(selection.selected_files(&tree).is_empty());
    }

    #[test]
    fn root_toggle_selects_everything() {
        let tree = nested_tree();
        let mut selection = Selection::default();
        selection.toggle(&tree, node(&tree, "/"));
        assert_eq!(selection.selected_size(&tree), 600);
        selection.clear();
        assert!(selection.selected_files(&tree).is_empty());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn selected_files_match_checked_file_ids(
                picks in prop::collection::vec(0usize..7, 0..30)
            ) {
                let tree = nested_tree();
                let mut selection = Selection::seeded(&tree);
                for pick in picks {
                    let target = tree.nodes()[pick].clone();
                    selection.toggle(&tree, &target);
                }
                let expected: Vec<&str> = tree
                    .nodes()
                    .iter()
                    .filter(|n| !n.is_dir && selection.is_checked(&n.id))
                    .map(|n| n.id.as_str())
                    .collect();
                prop_assert_eq!(selection.selected_ids(&tree), expected);
            }

            #[test]
            fn file_toggle_changes_only_that_id(
                warmup in prop::collection::vec(0usize..7, 0..10),
                pick in prop::sample::select(vec![3usize, 4, 5])
            ) {
                let tree = nested_tree();
                let mut selection = Selection::seeded(&tree);
                for w in warmup {
                    let target = tree.nodes()[w].clone();
                    selection.toggle(&tree, &target);
                }
                let before = selection.clone();
                let target = tree.nodes()[pick].clone();
                selection.toggle(&tree, &target);
                for n in tree.nodes() {
                    if n.id == target.id {
                        prop_assert_ne!(selection.is_checked(&n.id), before.is_checked(&n.id));
                    } else {
                        prop_assert_eq!(selection.is_checked(&n.id), before.is_checked(&n.id));
                    }
                }
            }

            #[test]
            fn directory_toggle_is_uniform_and_involutive(
                warmup in prop::collection::vec(0usize..7, 0..10),
                pick in prop::sample::select(vec![0usize, 1, 2, 6])
            ) {
                let tree = nested_tree();
                let mut selection = Selection::seeded(&tree);
                for w in warmup {
                    let target = tree.nodes()[w].clone();
                    selection.toggle(&tree, &target);
                }
                let before = selection.clone();
                let target = tree.nodes()[pick].clone();
                let value = selection.toggle(&tree, &target);
                for id in tree.subtree_ids(&target.id) {
                    prop_assert_eq!(selection.is_checked(id), value);
                }
                selection.toggle(&tree, &target);
                let affected = tree.subtree_ids(&target.id);
                let mut restored = before.clone();
                for id in &affected {
                    restored.checked.insert((*id).to_string(), before.is_checked(&target.id));
                }
                prop_assert_eq!(selection, restored);
            }
        }
    }
}
