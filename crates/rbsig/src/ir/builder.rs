//! Scoped construction API for the declaration tree.
//!
//! Each `create_*` method appends the new node to the receiver's children
//! and hands it back (`&mut`) so construction can continue. Namespace
//! creators additionally run a scoped closure against the new child before
//! returning, which is how nested trees are built without ever aliasing a
//! node from two places:
//!
//! ```
//! use rbsig::ir::{Namespace, Parameter, TypeExpr};
//!
//! let mut root = Namespace::root();
//! root.create_class("Person", |class| {
//!     class.add_include("Comparable");
//!     class.create_method(
//!         "name",
//!         vec![],
//!         Some(TypeExpr::Raw("String".into())),
//!     );
//! });
//! ```

use super::{
    ArbitraryNode, AttributeKind, AttributeNode, ClassDetails, ConstantNode, ConstantValue,
    EnumDetails, MethodNode, Namespace, NamespaceKind, Node, Parameter, StructDetails, TypeExpr,
};

impl Namespace {
    /// Append an already-built node.
    pub fn append(&mut self, node: Node) {
        self.children.push(node);
    }

    fn create_child_namespace(
        &mut self,
        name: impl Into<String>,
        kind: NamespaceKind,
        build: impl FnOnce(&mut Namespace),
    ) -> &mut Namespace {
        self.children
            .push(Node::Namespace(Namespace::new(name, kind)));
        let Some(Node::Namespace(child)) = self.children.last_mut() else {
            unreachable!("just pushed a namespace")
        };
        build(child);
        child
    }

    /// Create a plain (untyped) child namespace.
    pub fn create_namespace(
        &mut self,
        name: impl Into<String>,
        build: impl FnOnce(&mut Namespace),
    ) -> &mut Namespace {
        self.create_child_namespace(name, NamespaceKind::Plain, build)
    }

    /// Create a child class.
    pub fn create_class(
        &mut self,
        name: impl Into<String>,
        build: impl FnOnce(&mut Namespace),
    ) -> &mut Namespace {
        self.create_child_namespace(name, NamespaceKind::Class(ClassDetails::default()), build)
    }

    /// Create a child module.
    pub fn create_module(
        &mut self,
        name: impl Into<String>,
        build: impl FnOnce(&mut Namespace),
    ) -> &mut Namespace {
        self.create_child_namespace(name, NamespaceKind::Module { interface: false }, build)
    }

    /// Create a child enum class.
    pub fn create_enum(
        &mut self,
        name: impl Into<String>,
        build: impl FnOnce(&mut Namespace),
    ) -> &mut Namespace {
        self.create_child_namespace(name, NamespaceKind::Enum(EnumDetails::default()), build)
    }

    /// Create a child struct class.
    pub fn create_struct(
        &mut self,
        name: impl Into<String>,
        build: impl FnOnce(&mut Namespace),
    ) -> &mut Namespace {
        self.create_child_namespace(name, NamespaceKind::Struct(StructDetails::default()), build)
    }

    /// Create a child method.
    pub fn create_method(
        &mut self,
        name: impl Into<String>,
        parameters: Vec<Parameter>,
        return_type: Option<TypeExpr>,
    ) -> &mut MethodNode {
        self.children
            .push(Node::Method(MethodNode::new(name, parameters, return_type)));
        let Some(Node::Method(method)) = self.children.last_mut() else {
            unreachable!("just pushed a method")
        };
        method
    }

    /// Create a child attribute.
    pub fn create_attribute(
        &mut self,
        name: impl Into<String>,
        kind: AttributeKind,
        ty: TypeExpr,
    ) -> &mut AttributeNode {
        self.children.push(Node::Attribute(AttributeNode {
            name: name.into(),
            comments: Vec::new(),
            kind,
            ty,
            class_level: false,
        }));
        let Some(Node::Attribute(attr)) = self.children.last_mut() else {
            unreachable!("just pushed an attribute")
        };
        attr
    }

    pub fn create_attr_reader(
        &mut self,
        name: impl Into<String>,
        ty: TypeExpr,
    ) -> &mut AttributeNode {
        self.create_attribute(name, AttributeKind::Reader, ty)
    }

    pub fn create_attr_writer(
        &mut self,
        name: impl Into<String>,
        ty: TypeExpr,
    ) -> &mut AttributeNode {
        self.create_attribute(name, AttributeKind::Writer, ty)
    }

    pub fn create_attr_accessor(
        &mut self,
        name: impl Into<String>,
        ty: TypeExpr,
    ) -> &mut AttributeNode {
        self.create_attribute(name, AttributeKind::Accessor, ty)
    }

    /// Create a child constant.
    pub fn create_constant(
        &mut self,
        name: impl Into<String>,
        value: ConstantValue,
    ) -> &mut ConstantNode {
        self.children.push(Node::Constant(ConstantNode {
            name: name.into(),
            comments: Vec::new(),
            value,
            class_level: false,
        }));
        let Some(Node::Constant(constant)) = self.children.last_mut() else {
            unreachable!("just pushed a constant")
        };
        constant
    }

    /// Create an explicit `extend` child node.
    pub fn create_extend(&mut self, target: impl Into<String>) {
        self.children.push(Node::Extend(super::MixinNode {
            target: target.into(),
            comments: Vec::new(),
        }));
    }

    /// Create an explicit `include` child node.
    pub fn create_include(&mut self, target: impl Into<String>) {
        self.children.push(Node::Include(super::MixinNode {
            target: target.into(),
            comments: Vec::new(),
        }));
    }

    /// Create an opaque passthrough child.
    pub fn create_arbitrary(&mut self, code: impl Into<String>) {
        self.children.push(Node::Arbitrary(ArbitraryNode {
            code: code.into(),
            comments: Vec::new(),
        }));
    }

    /// Add to the class-level mixin list. First-seen order, duplicates ignored.
    pub fn add_extend(&mut self, target: impl Into<String>) {
        let target = target.into();
        if !self.extends.contains(&target) {
            self.extends.push(target);
        }
    }

    /// Add to the instance-level mixin list. First-seen order, duplicates ignored.
    pub fn add_include(&mut self, target: impl Into<String>) {
        let target = target.into();
        if !self.includes.contains(&target) {
            self.includes.push(target);
        }
    }

    // Kind-specific accessors. Callers that know the namespace kind use
    // these instead of re-matching everywhere.

    pub fn class_details_mut(&mut self) -> Option<&mut ClassDetails> {
        match &mut self.kind {
            NamespaceKind::Class(details) => Some(details),
            NamespaceKind::Enum(details) => Some(&mut details.class),
            NamespaceKind::Struct(details) => Some(&mut details.class),
            NamespaceKind::Plain | NamespaceKind::Module { .. } => None,
        }
    }

    pub fn enum_details_mut(&mut self) -> Option<&mut EnumDetails> {
        match &mut self.kind {
            NamespaceKind::Enum(details) => Some(details),
            _ => None,
        }
    }

    pub fn struct_details_mut(&mut self) -> Option<&mut StructDetails> {
        match &mut self.kind {
            NamespaceKind::Struct(details) => Some(details),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Enumerator;

    #[test]
    fn test_nested_scoped_construction() {
        let mut root = Namespace::root();
        root.create_module("Outer", |outer| {
            outer.create_class("Inner", |inner| {
                inner.create_method("go", vec![], None);
            });
        });

        assert_eq!(root.children.len(), 1);
        let Node::Namespace(outer) = &root.children[0] else {
            panic!("expected namespace");
        };
        assert_eq!(outer.name, "Outer");
        let Node::Namespace(inner) = &outer.children[0] else {
            panic!("expected namespace");
        };
        assert_eq!(inner.name, "Inner");
        assert!(matches!(inner.children[0], Node::Method(_)));
    }

    #[test]
    fn test_mixin_lists_deduplicate() {
        let mut ns = Namespace::root();
        ns.add_include("Enumerable");
        ns.add_include("Comparable");
        ns.add_include("Enumerable");
        assert_eq!(ns.includes, vec!["Enumerable", "Comparable"]);

        ns.add_extend("Helpers");
        ns.add_extend("Helpers");
        assert_eq!(ns.extends, vec!["Helpers"]);
    }

    #[test]
    fn test_enum_details_accessor() {
        let mut root = Namespace::root();
        root.create_enum("Direction", |e| {
            let details = e.enum_details_mut().unwrap();
            details.enumerators.push(Enumerator {
                name: "North".into(),
                serialized: None,
            });
        });
        let Node::Namespace(ns) = &root.children[0] else {
            panic!("expected namespace");
        };
        let NamespaceKind::Enum(details) = &ns.kind else {
            panic!("expected enum");
        };
        assert_eq!(details.enumerators.len(), 1);
    }

    #[test]
    fn test_class_details_through_specializations() {
        let mut root = Namespace::root();
        root.create_struct("Point", |s| {
            s.class_details_mut().unwrap().is_final = true;
        });
        let Node::Namespace(ns) = &root.children[0] else {
            panic!("expected namespace");
        };
        let NamespaceKind::Struct(details) = &ns.kind else {
            panic!("expected struct");
        };
        assert!(details.class.is_final);
    }
}
