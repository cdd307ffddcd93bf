//! Share tree reconstruction from a flat node list.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::format::format_bytes;

/// Identifier of the synthetic root node.
pub const ROOT_ID: &str = "/";

/// One entry in the remote share tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    /// Path-like identifier, unique across the tree.
    pub id: String,
    /// Display label.
    pub name: String,
    /// Containing node, `None` for the root.
    #[serde(default)]
    pub parent: Option<String>,
    pub is_dir: bool,
    /// Byte count; only meaningful for files.
    #[serde(default)]
    pub size: u64,
}

impl FileNode {
    /// Creates a directory node.
    #[must_use]
    pub fn dir(id: &str, name: &str, parent: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            parent: parent.map(str::to_string),
            is_dir: true,
            size: 0,
        }
    }

    /// Creates a file node.
    #[must_use]
    pub fn file(id: &str, name: &str, parent: &str, size: u64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            parent: Some(parent.to_string()),
            is_dir: false,
            size,
        }
    }
}

/// A node in traversal order together with its indentation depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeRow<'a> {
    pub node: &'a FileNode,
    pub depth: usize,
}

impl TreeRow<'_> {
    /// Human-readable size for files, `None` for directories.
    #[must_use]
    pub fn size_label(&self) -> Option<String> {
        (!self.node.is_dir).then(|| format_bytes(self.node.size))
    }
}

/// Returns the structural depth of an id: the number of non-empty path
/// segments. The root is at depth 0.
#[must_use]
pub fn depth_of(id: &str) -> usize {
    id.split('/').filter(|segment| !segment.is_empty()).count()
}

/// Parent-indexed view over a resolved node set.
#[derive(Debug, Clone, Default)]
pub struct ShareTree {
    nodes: Vec<FileNode>,
    index: HashMap<String, usize>,
    children: HashMap<String, Vec<String>>,
}

impl ShareTree {
    /// Builds the node and parent → children indexes in a single pass.
    ///
    /// Child lists are sorted by id. When ids repeat, the last node wins.
    #[must_use]
    pub fn new(nodes: Vec<FileNode>) -> Self {
        let mut index = HashMap::with_capacity(nodes.len());
        let mut children: HashMap<String, Vec<String>> = HashMap::new();

        for (position, node) in nodes.iter().enumerate() {
            index.insert(node.id.clone(), position);
            if let Some(parent) = &node.parent {
                children
                    .entry(parent.clone())
                    .or_default()
                    .push(node.id.clone());
            }
        }

        for list in children.values_mut() {
            list.sort();
            list.dedup();
        }

        Self {
            nodes,
            index,
            children,
        }
    }

    /// Parses a JSON array of nodes and builds the tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a valid node array.
    pub fn from_json(payload: &str) -> Result<Self> {
        let nodes: Vec<FileNode> = serde_json::from_str(payload)?;
        Ok(Self::new(nodes))
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&FileNode> {
        self.index.get(id).map(|&position| &self.nodes[position])
    }

    /// All nodes in input order.
    #[must_use]
    pub fn nodes(&self) -> &[FileNode] {
        &self.nodes
    }

    /// Child ids of `id`, sorted by id.
    #[must_use]
    pub fn children(&self, id: &str) -> &[String] {
        self.children.get(id).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Non-directory nodes in input order.
    pub fn files(&self) -> impl Iterator<Item = &FileNode> {
        self.nodes.iter().filter(|node| !node.is_dir)
    }

    /// Static size of a file node. Directories and unknown ids yield `None`.
    #[must_use]
    pub fn size_of(&self, id: &str) -> Option<u64> {
        self.get(id).filter(|node| !node.is_dir).map(|node| node.size)
    }

    /// Depth-first pre-order from the root, siblings in id order.
    ///
    /// Ids missing from the node set are skipped together with their
    /// subtrees.
    #[must_use]
    pub fn ordered(&self) -> Vec<&FileNode> {
        let mut result = Vec::with_capacity(self.nodes.len());
        let mut visited = HashSet::new();
        let mut stack = vec![ROOT_ID];

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(node) = self.get(id) else { continue };
            result.push(node);
            // Reverse so the smallest id is popped first.
            stack.extend(self.children(id).iter().rev().map(String::as_str));
        }

        result
    }

    /// Traversal order paired with indentation depth.
    #[must_use]
    pub fn rows(&self) -> Vec<TreeRow<'_>> {
        self.ordered()
            .into_iter()
            .map(|node| TreeRow {
                node,
                depth: depth_of(&node.id),
            })
            .collect()
    }

    /// Returns `id` followed by every transitive descendant.
    #[must_use]
    pub fn subtree_ids<'a>(&'a self, id: &'a str) -> Vec<&'a str> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            result.push(current);
            stack.extend(self.children(current).iter().map(String::as_str));
        }

        result
    }
}

/// Convenience wrapper returning the render order for a borrowed node set.
#[must_use]
pub fn build_order(nodes: &[FileNode]) -> Vec<FileNode> {
    ShareTree::new(nodes.to_vec())
        .ordered()
        .into_iter()
        .cloned()
        .collect()
}
