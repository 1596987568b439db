//! Index-list addressing into an immutable syntax tree.
//!
//! A [`NodePath`] is an ordered list of named-child indices from the tree
//! root. Paths are cheap immutable values: the parser copies them across
//! recursive calls and re-derives neighbouring positions arithmetically
//! (`parent`, `child`, `sibling`) instead of holding live references into
//! the tree.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("cannot take the parent of the root path")]
    RootParent,

    #[error("cannot take a sibling of the root path")]
    RootSibling,

    #[error("sibling offset {0} moves before the first child")]
    NegativeIndex(isize),
}

/// An immutable path of named-child indices from the root of a syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePath {
    indices: Vec<usize>,
}

impl NodePath {
    /// The path addressing the tree root itself.
    pub fn root() -> Self {
        NodePath {
            indices: Vec::new(),
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// The path with the last index dropped.
    pub fn parent(&self) -> Result<NodePath, PathError> {
        if self.indices.is_empty() {
            return Err(PathError::RootParent);
        }
        Ok(NodePath {
            indices: self.indices[..self.indices.len() - 1].to_vec(),
        })
    }

    /// The path extended by one child index.
    pub fn child(&self, index: usize) -> NodePath {
        let mut indices = self.indices.clone();
        indices.push(index);
        NodePath { indices }
    }

    /// The path with the last index adjusted by `offset`.
    pub fn sibling(&self, offset: isize) -> Result<NodePath, PathError> {
        let Some(&last) = self.indices.last() else {
            return Err(PathError::RootSibling);
        };
        let adjusted = last as isize + offset;
        if adjusted < 0 {
            return Err(PathError::NegativeIndex(offset));
        }
        let mut indices = self.indices.clone();
        *indices.last_mut().unwrap_or(&mut 0) = adjusted as usize;
        Ok(NodePath { indices })
    }

    /// Resolve this path against a tree, following named children.
    ///
    /// Returns `None` when any index is out of range.
    #[cfg(feature = "read-ruby")]
    pub fn resolve<'t>(&self, tree: &'t tree_sitter::Tree) -> Option<tree_sitter::Node<'t>> {
        let mut node = tree.root_node();
        for &index in &self.indices {
            node = node.named_child(index as u32)?;
        }
        Some(node)
    }
}
