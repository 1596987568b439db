//! Dialect emitters.
//!
//! Each emitter serializes a declaration tree into one dialect's concrete
//! syntax. Emission is pure and deterministic; dialect-specific reshaping
//! (block descriptors, dropped constructs) is the converter's job, not the
//! emitters'.

#[cfg(feature = "write-rbi")]
pub mod rbi;
#[cfg(feature = "write-rbs")]
pub mod rbs;

#[cfg(feature = "write-rbi")]
pub use rbi::RbiEmitter;
#[cfg(feature = "write-rbs")]
pub use rbs::RbsEmitter;

#[cfg(any(feature = "write-rbi", feature = "write-rbs"))]
use crate::ir::Node;

/// Reorder the namespace nodes of a sibling list alphabetically. Every
/// other node keeps its position.
#[cfg(any(feature = "write-rbi", feature = "write-rbs"))]
pub(crate) fn sort_namespace_siblings(nodes: &mut [&Node]) {
    let slots: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| matches!(node, Node::Namespace(_)))
        .map(|(index, _)| index)
        .collect();
    let mut namespaces: Vec<&Node> = slots.iter().map(|&slot| nodes[slot]).collect();
    namespaces.sort_by(|a, b| a.name().cmp(b.name()));
    for (slot, namespace) in slots.into_iter().zip(namespaces) {
        nodes[slot] = namespace;
    }
}

/// Formatting knobs shared by all emitters.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Parameter count at which a signature breaks onto multiple lines.
    pub break_params: usize,
    /// Spaces per indentation level.
    pub tab_size: usize,
    /// Emit sibling namespaces sorted by name instead of in insertion
    /// order. Methods, constants, and mixins keep their positions.
    pub sort_namespaces: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        EmitOptions {
            break_params: 4,
            tab_size: 2,
            sort_namespaces: false,
        }
    }
}
