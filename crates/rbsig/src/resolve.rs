//! Sibling conflict resolution.
//!
//! After several parsed trees are unioned under one root, a namespace can
//! hold multiple same-named children. [`resolve_conflicts`] walks the tree
//! depth-first, merging groups that are compatible and escalating every
//! irreconcilable group to a caller-supplied strategy. The resolver itself
//! never rejects a conflict; only the strategy can.
//!
//! Merges build a fresh survivor node from all group members rather than
//! mutating one member in place, so no other reference to an input node
//! can observe the merge.

use crate::ir::{MergeEq, Namespace, NamespaceKind, Node};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The strategy refused to resolve a conflict.
    #[error("conflict resolution aborted: {0}")]
    Aborted(String),
}

/// Decides the fate of an irreconcilable group of same-named siblings.
///
/// Returns `Ok(Some(node))` to insert `node` as the sole survivor at the
/// first member's position, `Ok(None)` to drop the name entirely, or an
/// error to abort the whole pass.
pub trait ResolutionStrategy {
    fn resolve(&mut self, description: &str, candidates: &[Node])
    -> Result<Option<Node>, ResolveError>;
}

impl<F> ResolutionStrategy for F
where
    F: FnMut(&str, &[Node]) -> Result<Option<Node>, ResolveError>,
{
    fn resolve(
        &mut self,
        description: &str,
        candidates: &[Node],
    ) -> Result<Option<Node>, ResolveError> {
        self(description, candidates)
    }
}

/// A strategy that keeps the first candidate of every conflict.
pub fn keep_first(_: &str, candidates: &[Node]) -> Result<Option<Node>, ResolveError> {
    Ok(candidates.first().cloned())
}

/// A strategy that rejects every conflict it is asked about.
pub fn reject_all(description: &str, _: &[Node]) -> Result<Option<Node>, ResolveError> {
    Err(ResolveError::Aborted(description.to_string()))
}

/// Resolve same-named sibling conflicts throughout `namespace`.
///
/// Resolution is idempotent: running it again on the result changes
/// nothing. On error the tree is left partially resolved; retry on a
/// fresh tree.
pub fn resolve_conflicts<S: ResolutionStrategy>(
    namespace: &mut Namespace,
    strategy: &mut S,
) -> Result<(), ResolveError> {
    resolve_level(namespace, strategy)
}

/// Identity under which two siblings compete for a name.
///
/// All namespace kinds share one key, so a class and a module of the same
/// name do conflict. Methods, attributes and constants are additionally
/// split by class level, so `self.x` never competes with `x`. A method
/// and a namespace of the same name never conflict.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Namespace(String),
    Method(String, bool),
    Attribute(String, bool),
    Constant(String, bool),
    Directive(String),
    Arbitrary(String),
}

fn key_of(node: &Node) -> GroupKey {
    match node {
        Node::Namespace(ns) => GroupKey::Namespace(ns.name.clone()),
        Node::Method(m) => GroupKey::Method(m.name.clone(), m.class_level),
        Node::Attribute(a) => GroupKey::Attribute(a.name.clone(), a.class_level),
        Node::Constant(c) => GroupKey::Constant(c.name.clone(), c.class_level),
        Node::Extend(m) | Node::Include(m) => GroupKey::Directive(m.target.clone()),
        Node::Arbitrary(a) => GroupKey::Arbitrary(a.code.clone()),
    }
}

fn resolve_level<S: ResolutionStrategy>(
    namespace: &mut Namespace,
    strategy: &mut S,
) -> Result<(), ResolveError> {
    let mut order: Vec<GroupKey> = Vec::new();
    let mut groups: HashMap<GroupKey, Vec<usize>> = HashMap::new();
    for (index, child) in namespace.children.iter().enumerate() {
        let key = key_of(child);
        let members = groups.entry(key.clone()).or_default();
        if members.is_empty() {
            order.push(key);
        }
        members.push(index);
    }

    // Process each conflicted group against stable slot positions, then
    // compact. The survivor lands at the first member's slot.
    let children = std::mem::take(&mut namespace.children);
    let mut slots: Vec<Option<Node>> = children.into_iter().map(Some).collect();
    for key in order {
        let indices = &groups[&key];
        if indices.len() < 2 {
            continue;
        }
        let members: Vec<Node> = indices.iter().filter_map(|&i| slots[i].take()).collect();
        slots[indices[0]] = merge_group(members, strategy)?;
    }
    namespace.children = slots.into_iter().flatten().collect();

    for child in &mut namespace.children {
        if let Node::Namespace(ns) = child {
            resolve_level(ns, strategy)?;
        }
    }
    Ok(())
}

fn merge_group<S: ResolutionStrategy>(
    members: Vec<Node>,
    strategy: &mut S,
) -> Result<Option<Node>, ResolveError> {
    let name = members[0].name().to_string();

    let uniform = members
        .iter()
        .all(|m| std::mem::discriminant(m) == std::mem::discriminant(&members[0]));
    if !uniform {
        return escalate(
            format!("conflicting node kinds for `{name}`"),
            members,
            strategy,
        );
    }

    match &members[0] {
        Node::Namespace(_) => merge_namespaces(members, strategy),
        Node::Method(first) => {
            let mergeable = members.iter().skip(1).all(|m| match m {
                Node::Method(other) => other.merge_eq(first),
                _ => false,
            });
            keep_first_or_escalate(mergeable, members, strategy)
        }
        Node::Attribute(first) => {
            let mergeable = members.iter().skip(1).all(|m| match m {
                Node::Attribute(other) => other.merge_eq(first),
                _ => false,
            });
            keep_first_or_escalate(mergeable, members, strategy)
        }
        Node::Constant(_) | Node::Extend(_) | Node::Include(_) => {
            let mergeable = members.iter().skip(1).all(|m| *m == members[0]);
            keep_first_or_escalate(mergeable, members, strategy)
        }
        Node::Arbitrary(_) => keep_first_or_escalate(false, members, strategy),
    }
}

fn keep_first_or_escalate<S: ResolutionStrategy>(
    mergeable: bool,
    mut members: Vec<Node>,
    strategy: &mut S,
) -> Result<Option<Node>, ResolveError> {
    if mergeable {
        // Merging identical members is a no-op: the first is kept as-is.
        members.truncate(1);
        return Ok(members.pop());
    }
    let name = members[0].name().to_string();
    escalate(
        format!("conflicting definitions for `{name}`"),
        members,
        strategy,
    )
}

/// Merge a group of same-named namespaces into one fresh survivor, or
/// escalate when their kinds cannot be reconciled.
fn merge_namespaces<S: ResolutionStrategy>(
    members: Vec<Node>,
    strategy: &mut S,
) -> Result<Option<Node>, ResolveError> {
    let views: Vec<&Namespace> = members
        .iter()
        .filter_map(|m| match m {
            Node::Namespace(ns) => Some(ns),
            _ => None,
        })
        .collect();

    let mut kind = NamespaceKind::Plain;
    for view in &views {
        kind = match combine_kinds(kind, &view.kind) {
            Ok(kind) => kind,
            Err(reason) => {
                let name = views[0].name.clone();
                return escalate(
                    format!("cannot merge namespace `{name}`: {reason}"),
                    members,
                    strategy,
                );
            }
        };
    }

    let mut iter = members.into_iter().filter_map(|m| match m {
        Node::Namespace(ns) => Some(ns),
        _ => None,
    });
    let Some(first) = iter.next() else {
        return Ok(None);
    };

    let mut merged = Namespace::new(first.name, kind);
    merged.comments = first.comments;
    merged.children = first.children;
    for target in first.extends {
        merged.add_extend(target);
    }
    for target in first.includes {
        merged.add_include(target);
    }
    for rest in iter {
        merged.children.extend(rest.children);
        for target in rest.extends {
            merged.add_extend(target);
        }
        for target in rest.includes {
            merged.add_include(target);
        }
        for comment in rest.comments {
            if !merged.comments.contains(&comment) {
                merged.comments.push(comment);
            }
        }
    }
    Ok(Some(Node::Namespace(merged)))
}

/// Combine the kinds of two same-named namespaces.
///
/// Plain is absorbed by anything. Class details keep the accumulated
/// side, except that a missing superclass is filled in. Enum and struct
/// members must agree on their enumerator/prop sets once empty sets are
/// absorbed by any non-empty one; the surviving list keeps the first
/// non-empty member's order.
fn combine_kinds(accumulated: NamespaceKind, next: &NamespaceKind) -> Result<NamespaceKind, String> {
    match (accumulated, next) {
        (NamespaceKind::Plain, next) => Ok(next.clone()),
        (accumulated, NamespaceKind::Plain) => Ok(accumulated),
        (NamespaceKind::Class(mut acc), NamespaceKind::Class(other)) => {
            if acc.superclass.is_none() {
                acc.superclass = other.superclass.clone();
            }
            Ok(NamespaceKind::Class(acc))
        }
        (NamespaceKind::Module { interface }, NamespaceKind::Module { .. }) => {
            Ok(NamespaceKind::Module { interface })
        }
        (NamespaceKind::Enum(mut acc), NamespaceKind::Enum(other)) => {
            if acc.enumerators.is_empty() {
                acc.enumerators = other.enumerators.clone();
            } else if !other.enumerators.is_empty()
                && !set_equal(&acc.enumerators, &other.enumerators)
            {
                return Err("enumerator lists disagree".into());
            }
            Ok(NamespaceKind::Enum(acc))
        }
        (NamespaceKind::Struct(mut acc), NamespaceKind::Struct(other)) => {
            if acc.props.is_empty() {
                acc.props = other.props.clone();
            } else if !other.props.is_empty() && !set_equal(&acc.props, &other.props) {
                return Err("prop lists disagree".into());
            }
            Ok(NamespaceKind::Struct(acc))
        }
        (accumulated, next) => Err(format!(
            "a {} cannot merge with a {}",
            accumulated.label(),
            next.label()
        )),
    }
}

fn set_equal<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.contains(x)) && b.iter().all(|x| a.contains(x))
}

fn escalate<S: ResolutionStrategy>(
    description: String,
    members: Vec<Node>,
    strategy: &mut S,
) -> Result<Option<Node>, ResolveError> {
    debug!(%description, candidates = members.len(), "escalating conflict");
    strategy.resolve(&description, &members)
}
