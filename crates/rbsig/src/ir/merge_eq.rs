//! Merge equality for declaration nodes.
//!
//! `merge_eq` compares nodes the way the conflict resolver needs to:
//! exact structural equality except that a parameter or return position
//! carrying no useful type information compares equal regardless of how
//! that absence is spelled.
//!
//! # Normalized positions
//!
//! - `Parameter::ty` - `None`, `Untyped`, and the raw untyped spelling
//!   are interchangeable
//! - Return and attribute positions - `Untyped` and the raw untyped
//!   spelling are interchangeable, but an absent return (`void`) is a
//!   distinct value
//!
//! # Core fields (must match exactly)
//!
//! - All names, kinds, flags, defaults
//! - Parameter order and count

use super::{AttributeNode, MethodNode, MethodSignature, Parameter, TypeExpr};

/// Trait for merge-equality comparison.
///
/// Unlike `PartialEq`, this normalizes the "no type information" spellings
/// that may differ between annotated and unannotated declarations of the
/// same member.
pub trait MergeEq {
    fn merge_eq(&self, other: &Self) -> bool;
}

impl MergeEq for MethodNode {
    fn merge_eq(&self, other: &Self) -> bool {
        self.name == other.name
            && vec_merge_eq(&self.parameters, &other.parameters)
            && return_slot_eq(self.return_type.as_ref(), other.return_type.as_ref())
            && self.is_abstract == other.is_abstract
            && self.implementation == other.implementation
            && self.is_override == other.is_override
            && self.overridable == other.overridable
            && self.is_final == other.is_final
            && self.class_level == other.class_level
            && self.type_parameters == other.type_parameters
            && vec_merge_eq(&self.overloads, &other.overloads)
            && self.block == other.block
    }
}

impl MergeEq for AttributeNode {
    fn merge_eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.class_level == other.class_level
            && type_eq(&self.ty, &other.ty)
    }
}

impl MergeEq for Parameter {
    fn merge_eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.default == other.default
            && self.required == other.required
            && type_slot_eq(self.ty.as_ref(), other.ty.as_ref())
    }
}

impl MergeEq for MethodSignature {
    fn merge_eq(&self, other: &Self) -> bool {
        vec_merge_eq(&self.parameters, &other.parameters)
            && return_slot_eq(self.return_type.as_ref(), other.return_type.as_ref())
            && self.type_parameters == other.type_parameters
    }
}

/// Compare two parameter type slots, treating every spelling of "no useful
/// type" as the same value.
fn type_slot_eq(a: Option<&TypeExpr>, b: Option<&TypeExpr>) -> bool {
    let a_untyped = a.map(TypeExpr::is_untyped).unwrap_or(true);
    let b_untyped = b.map(TypeExpr::is_untyped).unwrap_or(true);
    match (a_untyped, b_untyped) {
        (true, true) => true,
        (false, false) => a == b,
        _ => false,
    }
}

/// Compare two return slots. An absent return means `void` and only equals
/// another absent return; present types normalize the untyped spellings.
fn return_slot_eq(a: Option<&TypeExpr>, b: Option<&TypeExpr>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => type_eq(a, b),
        _ => false,
    }
}

fn type_eq(a: &TypeExpr, b: &TypeExpr) -> bool {
    (a.is_untyped() && b.is_untyped()) || a == b
}

fn vec_merge_eq<T: MergeEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.merge_eq(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::AttributeKind;

    #[test]
    fn test_untyped_spellings_are_interchangeable() {
        let absent = Parameter::new("a", None);
        let untyped = Parameter::new("a", Some(TypeExpr::Untyped));
        let raw = Parameter::new("a", Some(TypeExpr::Raw("T.untyped".into())));

        assert!(absent.merge_eq(&untyped));
        assert!(absent.merge_eq(&raw));
        assert!(untyped.merge_eq(&raw));
        assert_ne!(absent, untyped); // Regular equality still differs
    }

    #[test]
    fn test_real_types_must_match() {
        let string = Parameter::new("a", Some(TypeExpr::Raw("String".into())));
        let integer = Parameter::new("a", Some(TypeExpr::Raw("Integer".into())));
        let absent = Parameter::new("a", None);

        assert!(!string.merge_eq(&integer));
        assert!(!string.merge_eq(&absent));
        assert!(string.merge_eq(&string.clone()));
    }

    #[test]
    fn test_method_merge_eq() {
        let typed = MethodNode::new(
            "foo",
            vec![Parameter::new("a", Some(TypeExpr::Raw("T.untyped".into())))],
            Some(TypeExpr::Untyped),
        );
        let bare = MethodNode::new(
            "foo",
            vec![Parameter::new("a", None)],
            Some(TypeExpr::Raw("T.untyped".into())),
        );
        assert!(typed.merge_eq(&bare));

        let mut class_level = bare.clone();
        class_level.class_level = true;
        assert!(!typed.merge_eq(&class_level));
    }

    #[test]
    fn test_void_return_is_distinct_from_untyped() {
        let void = MethodNode::new("foo", vec![], None);
        let untyped = MethodNode::new("foo", vec![], Some(TypeExpr::Untyped));
        assert!(!void.merge_eq(&untyped));
        assert!(void.merge_eq(&void.clone()));
        assert!(untyped.merge_eq(&MethodNode::new(
            "foo",
            vec![],
            Some(TypeExpr::Raw("T.untyped".into())),
        )));
    }

    #[test]
    fn test_attribute_merge_eq() {
        let a = AttributeNode {
            name: "name".into(),
            comments: vec![],
            kind: AttributeKind::Reader,
            ty: TypeExpr::Untyped,
            class_level: false,
        };
        let mut b = a.clone();
        b.ty = TypeExpr::Raw("T.untyped".into());
        assert!(a.merge_eq(&b));

        b.ty = TypeExpr::Raw("String".into());
        assert!(!a.merge_eq(&b));
    }
}
